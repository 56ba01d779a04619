use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChanceryError {
    #[error("Task not found: {program_id}/{task_id}")]
    TaskNotFound {
        program_id: String,
        task_id: String,
    },

    #[error("Task already settled: {program_id}/{task_id} is {status}")]
    TaskAlreadySettled {
        program_id: String,
        task_id: String,
        status: String,
    },

    #[error("Invalid handoff: {0}")]
    InvalidHandoff(String),

    #[error("Stage may not move backwards: {from} -> {to}")]
    StageRewind { from: String, to: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Executor error: {0}")]
    Executor(String),

    #[error("Audit publish failed: {0}")]
    AuditPublish(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChanceryError>;
