use strikeboard_core::{ConfigError, PassError, UploadError, ValidationError, WarehouseError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("strict mode failed: warnings={warning_count}, errors={error_count}")]
    StrictModeViolation {
        warning_count: usize,
        error_count: usize,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error("reconciliation pass failed: {0}")]
    Pass(#[from] PassError),

    #[error("store error: {0}")]
    Store(#[from] WarehouseError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("failed to initialize logging: {0}")]
    Logging(String),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Command(_) => 2,
            Self::Config(_) => 3,
            Self::Serialization(_) => 4,
            Self::StrictModeViolation { .. } => 5,
            Self::Pass(_) => 6,
            Self::Store(_) => 7,
            Self::Upload(UploadError::Io { .. }) => 10,
            Self::Upload(_) => 2,
            Self::Logging(_) => 10,
            Self::Task(_) => 10,
            Self::Io(_) => 10,
        }
    }
}
