use serde::{Deserialize, Serialize};

use super::request::ActionReversibility;

/// The plan + epics + work packages delivered to the administrative layer.
/// Input to intake and feasibility; the program aggregate records outcomes,
/// the handoff stays the caller's document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionHandoff {
    pub execution_plan_id: String,
    pub motion_id: String,

    #[serde(default)]
    pub epics: Vec<Epic>,

    #[serde(default)]
    pub work_packages: Vec<WorkPackage>,
}

impl ExecutionHandoff {
    pub fn epic(&self, epic_id: &str) -> Option<&Epic> {
        self.epics.iter().find(|e| e.epic_id == epic_id)
    }

    pub fn work_package(&self, work_package_id: &str) -> Option<&WorkPackage> {
        self.work_packages
            .iter()
            .find(|wp| wp.work_package_id == work_package_id)
    }
}

/// An abstract unit of intent the work packages hang off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Epic {
    pub epic_id: String,
    pub title: String,

    #[serde(default)]
    pub summary: String,
}

/// The unit that becomes a tracked task when it passes feasibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkPackage {
    pub work_package_id: String,
    pub epic_id: String,
    pub scope_description: String,

    #[serde(default)]
    pub constraints: Vec<String>,

    #[serde(default)]
    pub success_definition: String,

    #[serde(default)]
    pub required_capabilities: Vec<String>,

    #[serde(default)]
    pub action_reversibility: ActionReversibility,

    /// Executor cluster this package is bound to. Declines retry against the
    /// same cluster; there is no silent substitution.
    #[serde(default = "default_cluster")]
    pub target_cluster_id: String,
}

fn default_cluster() -> String {
    "simulation".to_string()
}

impl WorkPackage {
    pub fn new(
        work_package_id: impl Into<String>,
        epic_id: impl Into<String>,
        scope_description: impl Into<String>,
    ) -> Self {
        Self {
            work_package_id: work_package_id.into(),
            epic_id: epic_id.into(),
            scope_description: scope_description.into(),
            constraints: Vec::new(),
            success_definition: String::new(),
            required_capabilities: Vec::new(),
            action_reversibility: ActionReversibility::default(),
            target_cluster_id: default_cluster(),
        }
    }

    pub fn with_cluster(mut self, cluster_id: impl Into<String>) -> Self {
        self.target_cluster_id = cluster_id.into();
        self
    }

    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.required_capabilities = capabilities;
        self
    }
}
