use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal state of an executed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobOutcome {
    /// Job completed successfully.
    Success,
    /// Job failed to spawn or exited unsuccessfully.
    Failure,
    /// Job was canceled before it finished.
    Canceled,
    /// Job exceeded its timeout.
    Timeout,
}

impl JobOutcome {
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            JobOutcome::Success => "success",
            JobOutcome::Failure => "failure",
            JobOutcome::Canceled => "canceled",
            JobOutcome::Timeout => "timeout",
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success)
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
