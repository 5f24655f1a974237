use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ModelError, ModelResult};

/// Decides what a driver does with a job whose declared outputs already exist.
///
/// Strategies:
/// - `Skip`: do not submit the job; an interrupted batch can be resubmitted and only the missing work runs.
/// - `Rerun`: submit the job regardless and let it overwrite its outputs.
///
/// A job that declares no outputs is always submitted.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExistingOutputStrategy {
    #[default]
    Skip,
    Rerun,
}

impl FromStr for ExistingOutputStrategy {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" | "" => Ok(ExistingOutputStrategy::Skip),
            "rerun" | "overwrite" => Ok(ExistingOutputStrategy::Rerun),
            other => Err(ModelError::UnknownExistingOutput(other.to_string())),
        }
    }
}
