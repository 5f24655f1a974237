mod env;
pub use env::{Env, EnvVar};

mod handle;
pub use handle::JobHandle;

mod outcome;
pub use outcome::JobOutcome;

mod shard;
pub use shard::{ShardKey, ShardKeyRule};

/// Timeout value in milliseconds.
pub type TimeoutMs = u64;
