use serde::{Deserialize, Serialize};

/// Lifecycle stage of an execution program. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProgramStage {
    #[default]
    Intake,
    Feasibility,
    Commit,
    Activation,
    Results,
    ViolationHandling,
}

impl ProgramStage {
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Intake => 0,
            Self::Feasibility => 1,
            Self::Commit => 2,
            Self::Activation => 3,
            Self::Results => 4,
            Self::ViolationHandling => 5,
        }
    }

    pub fn can_advance_to(&self, target: ProgramStage) -> bool {
        target.ordinal() >= self.ordinal()
    }
}

impl std::fmt::Display for ProgramStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Intake => "Intake",
            Self::Feasibility => "Feasibility",
            Self::Commit => "Commit",
            Self::Activation => "Activation",
            Self::Results => "Results",
            Self::ViolationHandling => "Violation Handling",
        };
        write!(f, "{}", s)
    }
}

/// Honest completion verdict for a finished program. Derivation order never
/// reports a clean success while unresolved or failure conditions exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    CompletedClean,
    CompletedWithAcceptedRisks,
    CompletedWithUnresolved,
    Failed,
    Halted,
}

impl std::fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CompletedClean => "Completed Clean",
            Self::CompletedWithAcceptedRisks => "Completed With Accepted Risks",
            Self::CompletedWithUnresolved => "Completed With Unresolved",
            Self::Failed => "Failed",
            Self::Halted => "Halted",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_only_ordering() {
        assert!(ProgramStage::Intake.can_advance_to(ProgramStage::Feasibility));
        assert!(ProgramStage::Feasibility.can_advance_to(ProgramStage::Commit));
        assert!(ProgramStage::Commit.can_advance_to(ProgramStage::Activation));
        assert!(ProgramStage::Activation.can_advance_to(ProgramStage::Results));
        assert!(ProgramStage::Results.can_advance_to(ProgramStage::ViolationHandling));
    }

    #[test]
    fn test_rewind_rejected() {
        assert!(!ProgramStage::Results.can_advance_to(ProgramStage::Intake));
        assert!(!ProgramStage::Commit.can_advance_to(ProgramStage::Feasibility));
    }

    #[test]
    fn test_same_stage_allowed() {
        // Re-entering the current stage is a no-op, not a rewind.
        assert!(ProgramStage::Feasibility.can_advance_to(ProgramStage::Feasibility));
    }

    #[test]
    fn test_violation_reachable_from_anywhere() {
        assert!(ProgramStage::Intake.can_advance_to(ProgramStage::ViolationHandling));
        assert!(ProgramStage::Results.can_advance_to(ProgramStage::ViolationHandling));
    }
}
