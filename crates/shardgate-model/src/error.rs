use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown line class: {0}")]
    UnknownLineClass(String),

    #[error("unknown existing-output strategy: {0}")]
    UnknownExistingOutput(String),

    #[error("unknown shard key rule: {0}")]
    UnknownKeyRule(String),

    #[error("invalid shard key: {0}")]
    InvalidShardKey(String),

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("invalid model: {0}")]
    Invalid(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
