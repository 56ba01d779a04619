//! Assignment engine: Duke selection by least current load under a
//! concurrency ceiling, and deterministic round-robin Earl distribution.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::AssignmentConfig;
use crate::ports::RoleDirectory;
use crate::program::{DukeAssignment, EarlAssignment, RoleIdentity};

/// Owns the in-memory load counters. One instance is shared across all
/// concurrently running programs in a service instance; the mutex is the
/// only cross-program shared state in the core.
pub struct AssignmentEngine {
    config: AssignmentConfig,
    loads: Mutex<HashMap<String, u32>>,
}

impl AssignmentEngine {
    pub fn new(config: AssignmentConfig) -> Self {
        Self {
            config,
            loads: Mutex::new(HashMap::new()),
        }
    }

    pub fn current_load(&self, identity_id: &str) -> u32 {
        self.loads.lock().get(identity_id).copied().unwrap_or(0)
    }

    /// Pick the coordinator: lowest current load strictly below the ceiling,
    /// ties broken by directory order. Falls back to the synthetic simulation
    /// identity when nobody qualifies, so the pipeline never stalls.
    pub fn select_duke(&self, directory: &dyn RoleDirectory, program_id: &str) -> DukeAssignment {
        let candidates = directory.get_by_branch(&self.config.administrative_branch);
        let mut loads = self.loads.lock();

        let chosen = candidates
            .iter()
            .map(|identity| (identity, loads.get(&identity.id).copied().unwrap_or(0)))
            .filter(|(_, load)| *load < self.config.max_concurrent_programs)
            .min_by_key(|(_, load)| *load)
            .map(|(identity, _)| identity.clone());

        let identity = match chosen {
            Some(identity) => {
                *loads.entry(identity.id.clone()).or_insert(0) += 1;
                debug!(
                    program_id,
                    duke = %identity.id,
                    load = loads[&identity.id],
                    "duke selected"
                );
                identity
            }
            None => {
                warn!(
                    program_id,
                    candidates = candidates.len(),
                    "no eligible coordinator; falling back to simulation identity"
                );
                RoleIdentity::simulation()
            }
        };

        DukeAssignment {
            identity,
            program_id: program_id.to_string(),
            assigned_at: Utc::now(),
        }
    }

    /// Release a coordinator's slot once their program reaches a terminal
    /// completion status.
    pub fn release_duke(&self, assignment: &DukeAssignment) {
        if assignment.identity.is_simulation() {
            return;
        }
        let mut loads = self.loads.lock();
        if let Some(load) = loads.get_mut(&assignment.identity.id) {
            *load = load.saturating_sub(1);
        }
    }

    /// Distribute pending task ids over the router pool: task index modulo
    /// candidate count, grouped into one assignment per candidate that
    /// received work. Deterministic for a given directory order.
    pub fn distribute_earls(
        &self,
        directory: &dyn RoleDirectory,
        program_id: &str,
        pending_task_ids: &[String],
    ) -> Vec<EarlAssignment> {
        if pending_task_ids.is_empty() {
            return Vec::new();
        }
        let mut candidates = directory.get_by_branch(&self.config.administrative_branch);
        if candidates.is_empty() {
            candidates.push(RoleIdentity::simulation());
        }

        let mut buckets: Vec<Vec<String>> = vec![Vec::new(); candidates.len()];
        for (index, task_id) in pending_task_ids.iter().enumerate() {
            buckets[index % candidates.len()].push(task_id.clone());
        }

        let assigned_at = Utc::now();
        candidates
            .into_iter()
            .zip(buckets)
            .filter(|(_, task_ids)| !task_ids.is_empty())
            .map(|(identity, task_ids)| EarlAssignment {
                identity,
                program_id: program_id.to_string(),
                task_ids,
                assigned_at,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::SimulatedRoleDirectory;

    fn directory(ids: &[&str]) -> SimulatedRoleDirectory {
        SimulatedRoleDirectory::new(
            ids.iter()
                .map(|id| RoleIdentity::new(*id, format!("Role {}", id), "administrative"))
                .collect(),
        )
    }

    fn engine() -> AssignmentEngine {
        AssignmentEngine::new(AssignmentConfig::default())
    }

    #[test]
    fn test_duke_ties_broken_by_directory_order() {
        let engine = engine();
        let directory = directory(&["alpha", "beta"]);
        let duke = engine.select_duke(&directory, "prog-1");
        assert_eq!(duke.identity.id, "alpha");
    }

    #[test]
    fn test_duke_prefers_least_loaded() {
        let engine = engine();
        let directory = directory(&["alpha", "beta"]);
        engine.select_duke(&directory, "prog-1");
        let duke = engine.select_duke(&directory, "prog-2");
        assert_eq!(duke.identity.id, "beta");
    }

    #[test]
    fn test_duke_ceiling_forces_simulation_fallback() {
        let mut config = AssignmentConfig::default();
        config.max_concurrent_programs = 1;
        let engine = AssignmentEngine::new(config);
        let directory = directory(&["alpha"]);

        assert_eq!(engine.select_duke(&directory, "prog-1").identity.id, "alpha");
        let fallback = engine.select_duke(&directory, "prog-2");
        assert!(fallback.identity.is_simulation());
    }

    #[test]
    fn test_empty_directory_falls_back_to_simulation() {
        let engine = engine();
        let directory = SimulatedRoleDirectory::empty();
        let duke = engine.select_duke(&directory, "prog-1");
        assert!(duke.identity.is_simulation());
    }

    #[test]
    fn test_release_duke_frees_slot() {
        let mut config = AssignmentConfig::default();
        config.max_concurrent_programs = 1;
        let engine = AssignmentEngine::new(config);
        let directory = directory(&["alpha"]);

        let duke = engine.select_duke(&directory, "prog-1");
        engine.release_duke(&duke);
        assert_eq!(engine.select_duke(&directory, "prog-2").identity.id, "alpha");
    }

    #[test]
    fn test_earls_round_robin_by_index() {
        let engine = engine();
        let directory = directory(&["alpha", "beta"]);
        let tasks: Vec<String> = ["t1", "t2", "t3", "t4", "t5"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let assignments = engine.distribute_earls(&directory, "prog-1", &tasks);
        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].identity.id, "alpha");
        assert_eq!(assignments[0].task_ids, vec!["t1", "t3", "t5"]);
        assert_eq!(assignments[1].identity.id, "beta");
        assert_eq!(assignments[1].task_ids, vec!["t2", "t4"]);
    }

    #[test]
    fn test_earls_empty_directory_uses_simulation() {
        let engine = engine();
        let directory = SimulatedRoleDirectory::empty();
        let tasks = vec!["t1".to_string(), "t2".to_string()];

        let assignments = engine.distribute_earls(&directory, "prog-1", &tasks);
        assert_eq!(assignments.len(), 1);
        assert!(assignments[0].identity.is_simulation());
        assert_eq!(assignments[0].task_ids.len(), 2);
    }

    #[test]
    fn test_no_pending_tasks_no_assignments() {
        let engine = engine();
        let directory = directory(&["alpha"]);
        assert!(engine.distribute_earls(&directory, "prog-1", &[]).is_empty());
    }
}
