use std::{io, path::PathBuf};

use shardgate_model::{ModelError, ShardKey};
use thiserror::Error;

use crate::executor::ExecutorError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("merge requires at least one shard")]
    EmptyInput,

    #[error("duplicate shard key: {0}")]
    DuplicateShardKey(ShardKey),

    #[error("failed to read shard {shard_key}: {source}")]
    ShardRead {
        shard_key: ShardKey,
        #[source]
        source: io::Error,
    },

    #[error("failed to write merged output: {0}")]
    Sink(#[source] io::Error),

    #[error("cannot derive a shard key from file name: {0}")]
    InvalidShardName(String),

    #[error("failed to list shards in {}: {source}", dir.display())]
    Discovery {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid job specification: {0}")]
    InvalidSpec(#[from] ModelError),

    #[error("executor error: {0}")]
    Executor(#[from] ExecutorError),
}
