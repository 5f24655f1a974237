mod error;
pub use error::ExecError;

#[cfg(feature = "local")]
pub mod local;
#[cfg(feature = "local")]
pub use local::{ExecutorStats, LocalExecutor, OutputLogConfig};
