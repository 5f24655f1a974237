use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{Env, TimeoutMs},
    error::{ModelError, ModelResult},
};

/// Declarative description of one external job.
///
/// `JobSpec` says *what* runs; admission (which earlier job it waits for) is decided by the driver
/// at submission time and is never part of the job itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    /// Human-readable job name (e.g. `"ExpansionHunter:CPG199760 shard 3/20"`).
    ///
    /// Used for logs and as part of the minted job handle.
    pub name: String,
    /// Command to execute.
    pub command: String,
    /// Command-line arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Environment variables for the process.
    #[serde(default, skip_serializing_if = "Env::is_empty")]
    pub env: Env,
    /// Working directory. If `None`, inherits from the submitting process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Hard timeout in milliseconds; `None` means no limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<TimeoutMs>,
    /// Whether a non-zero exit code counts as a failure.
    #[serde(default = "default_fail_on_non_zero")]
    pub fail_on_non_zero: bool,
    /// Files the job is expected to produce.
    ///
    /// Drivers use these to skip work that already finished in an earlier submission.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<PathBuf>,
}

fn default_fail_on_non_zero() -> bool {
    true
}

impl JobSpec {
    /// Minimal spec running `command` with no arguments.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: Env::default(),
            cwd: None,
            timeout_ms: None,
            fail_on_non_zero: true,
            outputs: Vec::new(),
        }
    }

    /// Replace the argument list.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Declare an output path.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(path.into());
        self
    }

    /// Set a timeout in milliseconds.
    pub fn with_timeout_ms(mut self, ms: TimeoutMs) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    /// Validate the job before submission.
    ///
    /// Rules:
    /// - `name` is not empty or whitespace-only;
    /// - `command` is not empty or whitespace-only;
    /// - `timeout_ms`, when present, is non-zero.
    pub fn validate(&self) -> ModelResult<()> {
        if self.name.trim().is_empty() {
            return Err(ModelError::Invalid("job name is empty".into()));
        }
        if self.command.trim().is_empty() {
            return Err(ModelError::Invalid(format!(
                "job '{}' has an empty command",
                self.name
            )));
        }
        if self.timeout_ms == Some(0) {
            return Err(ModelError::Invalid(format!(
                "job '{}' has a zero timeout",
                self.name
            )));
        }
        Ok(())
    }
}
