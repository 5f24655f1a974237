//! Executor abstraction: the collaborator that actually runs submitted jobs.
//!
//! Concrete executors implement [`Executor`] and are driven by [`crate::BatchDriver`].
mod error;
pub use error::ExecutorError;

mod id;
pub use id::mint_handle;

use shardgate_model::{JobHandle, JobSpec};

/// Collaborator that runs jobs and honours "B depends on A" edges.
///
/// An executor is responsible for:
/// - accepting a job under a handle minted by the caller (`submit`)
/// - not starting that job before every handle in `after` has finished
///
/// Retries, resource shape and what a dependency's failure means for its dependents are the
/// executor's own policy.
pub trait Executor: Send + Sync {
    /// Executor name used in logs and minted handles.
    fn name(&self) -> &'static str;

    /// Submit `spec` under `handle`, to start only after all of `after` finished.
    fn submit(&self, handle: &JobHandle, spec: &JobSpec, after: &[JobHandle])
    -> Result<(), ExecutorError>;
}
