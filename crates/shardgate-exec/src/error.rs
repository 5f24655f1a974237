use shardgate_core::ExecutorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("invalid specification: {0}")]
    InvalidSpec(String),

    #[error("no tokio runtime available: {0}")]
    NoRuntime(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ExecError> for ExecutorError {
    fn from(e: ExecError) -> Self {
        match e {
            ExecError::InvalidSpec(msg) => ExecutorError::InvalidSpec(msg),
            other => ExecutorError::Internal(other.to_string()),
        }
    }
}
