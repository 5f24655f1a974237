mod job;
pub use job::JobSpec;

mod plan;
pub use plan::BatchPlan;
