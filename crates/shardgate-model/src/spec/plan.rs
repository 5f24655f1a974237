use serde::{Deserialize, Serialize};

use crate::{
    error::{ModelError, ModelResult},
    spec::JobSpec,
    strategy::ExistingOutputStrategy,
};

/// Default admission window when a plan does not set one.
const DEFAULT_MAX_PARALLEL_JOBS: usize = 50;

/// A batch of jobs to submit through a bounded admission window.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPlan {
    /// Maximum number of jobs allowed to be outstanding at once.
    #[serde(default = "default_max_parallel_jobs")]
    pub max_parallel_jobs: usize,
    /// What to do with jobs whose outputs already exist.
    #[serde(default)]
    pub existing_outputs: ExistingOutputStrategy,
    /// Jobs in submission order.
    pub jobs: Vec<JobSpec>,
}

fn default_max_parallel_jobs() -> usize {
    DEFAULT_MAX_PARALLEL_JOBS
}

impl BatchPlan {
    /// Parse a plan from JSON and validate every job.
    pub fn from_json(s: &str) -> ModelResult<Self> {
        let plan: BatchPlan =
            serde_json::from_str(s).map_err(|e| ModelError::InvalidPlan(e.to_string()))?;
        plan.validate()?;
        Ok(plan)
    }

    /// Validate the plan.
    ///
    /// `max_parallel_jobs == 0` is deliberately *not* checked here: the admission gate owns that rule.
    pub fn validate(&self) -> ModelResult<()> {
        for job in &self.jobs {
            job.validate()?;
        }
        Ok(())
    }
}
