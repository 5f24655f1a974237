mod domain;
pub use domain::{Env, EnvVar, JobHandle, JobOutcome, ShardKey, ShardKeyRule, TimeoutMs};

mod error;
pub use error::{ModelError, ModelResult};

mod kind;
pub use kind::LineClass;

mod spec;
pub use spec::{BatchPlan, JobSpec};

mod strategy;
pub use strategy::ExistingOutputStrategy;
