pub mod driver;
pub mod error;
pub mod executor;
pub mod gate;
pub mod merge;

pub use driver::{BatchDriver, DriverConfig, DriverSummary, Submission};
pub use error::CoreError;
pub use executor::{Executor, ExecutorError, mint_handle};
pub use gate::ConcurrencyGate;
pub use merge::{
    Classify, FileSource, LineSink, LineSource, MarkerClassifier, MemorySource, MergeReport,
    MergeStream, PartFileSink, Shard, ShardMerger, WriteSink, discover_shards, merge,
};

pub mod prelude {
    pub use crate::driver::{BatchDriver, DriverConfig, Submission};
    pub use crate::error::CoreError;
    pub use crate::executor::{Executor, ExecutorError};
    pub use crate::gate::ConcurrencyGate;
    pub use crate::merge::{Classify, LineSink, LineSource, Shard, ShardMerger};
}
