use shardgate_model::JobHandle;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("unknown dependency: {0}")]
    UnknownDependency(JobHandle),

    #[error("handle already submitted: {0}")]
    DuplicateHandle(JobHandle),

    #[error("invalid specification: {0}")]
    InvalidSpec(String),

    #[error("executor is closed")]
    Closed,

    #[error("internal error: {0}")]
    Internal(String),
}
