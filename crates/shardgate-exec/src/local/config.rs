use std::{fmt, path::PathBuf, time::Duration};

use shardgate_model::{Env, JobHandle, JobSpec};
use tracing::trace;

use crate::ExecError;

/// Resolved configuration for one child process.
#[derive(Debug, Clone)]
pub(crate) struct ProcessConfig {
    /// Handle the job was submitted under; used as the log identifier.
    pub(crate) handle: JobHandle,
    /// Command to execute (e.g. `"ExpansionHunter"`, `"/usr/bin/python"`).
    pub(crate) command: String,
    /// Command-line arguments passed to the command.
    pub(crate) args: Vec<String>,
    /// Executor-wide environment merged with the job's own, job entries last.
    pub(crate) env: Env,
    /// Working directory; `None` inherits the executor's.
    pub(crate) cwd: Option<PathBuf>,
    /// Kill the child after this long.
    pub(crate) timeout: Option<Duration>,
    /// Whether non-zero exit codes count as failures.
    pub(crate) fail_on_non_zero: bool,
}

impl ProcessConfig {
    pub(crate) fn resolve(handle: &JobHandle, spec: &JobSpec, base_env: &Env) -> Result<Self, ExecError> {
        let cfg = Self {
            handle: handle.clone(),
            command: spec.command.clone(),
            args: spec.args.clone(),
            env: base_env.merged(&spec.env),
            cwd: spec.cwd.clone(),
            timeout: spec.timeout_ms.map(Duration::from_millis),
            fail_on_non_zero: spec.fail_on_non_zero,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rules:
    /// - `command` is not empty or whitespace-only;
    /// - `timeout`, when set, is non-zero.
    pub(crate) fn validate(&self) -> Result<(), ExecError> {
        if self.command.trim().is_empty() {
            return Err(ExecError::InvalidSpec(format!(
                "job {} has an empty command",
                self.handle
            )));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(ExecError::InvalidSpec(format!(
                "job {} has a zero timeout",
                self.handle
            )));
        }
        Ok(())
    }

    pub(crate) fn trace_state(&self) {
        trace!(
            job = %self.handle,
            command = %self.command,
            args = ?self.args,
            cwd = ?self.cwd,
            env_len = self.env.len(),
            timeout = ?self.timeout,
            fail_on_non_zero = self.fail_on_non_zero,
            "process config resolved"
        );
    }
}

impl fmt::Display for ProcessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ProcessConfig(cmd='{}', args={}, env={}, cwd={:?}, timeout={:?})",
            self.command,
            self.args.len(),
            self.env.len(),
            self.cwd,
            self.timeout,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_env_overrides_base_env() {
        let mut base = Env::new();
        base.push("THREADS", "4");
        base.push("REF", "/ref/hg38.fa");

        let mut spec = JobSpec::new("eh", "ExpansionHunter").with_timeout_ms(1500);
        spec.env.push("THREADS", "16");

        let cfg = ProcessConfig::resolve(&JobHandle::from("local-eh-1"), &spec, &base).unwrap();
        assert_eq!(cfg.env.get("THREADS"), Some("16"));
        assert_eq!(cfg.env.get("REF"), Some("/ref/hg38.fa"));
        assert_eq!(cfg.timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn blank_command_is_invalid() {
        let spec = JobSpec::new("eh", "  ");
        let err = ProcessConfig::resolve(&JobHandle::from("local-eh-2"), &spec, &Env::new());
        assert!(matches!(err, Err(ExecError::InvalidSpec(_))));
    }
}
