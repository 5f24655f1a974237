//! Streaming merge of sharded text files that each repeat the same prologue.
//!
//! Shards are ordered by their [`ShardKey`](shardgate_model::ShardKey), never by enumeration order.
//! Structural lines survive from the first shard only; data lines from every shard, in key order.
//! At most one shard is open at any time.
mod classify;
pub use classify::{Classify, MarkerClassifier};

mod discover;
pub use discover::discover_shards;

mod sink;
pub use sink::{LineSink, PartFileSink, WriteSink};

mod source;
pub use source::{FileSource, LineSource, MemorySource, Shard};

mod stream;
pub use stream::{MergeReport, MergeStream, ShardMerger, merge};
