use std::process::Stdio;

use shardgate_model::JobOutcome;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::local::{
    config::ProcessConfig,
    output::{OutputLogConfig, Stream, forward_lines},
};

/// Spawn the child described by `cfg` and wait for it, honouring timeout and cancellation.
///
/// Spawn and wait failures are reported as [`JobOutcome::Failure`]; a timed-out or canceled
/// child is killed before returning.
pub(crate) async fn run_process(
    cfg: &ProcessConfig,
    output: OutputLogConfig,
    cancel: &CancellationToken,
) -> JobOutcome {
    cfg.trace_state();

    let mut cmd = Command::new(&cfg.command);
    cmd.args(&cfg.args);
    if let Some(cwd) = &cfg.cwd {
        cmd.current_dir(cwd);
    }
    for kv in cfg.env.iter() {
        cmd.env(&kv.key, &kv.value);
    }
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!(job = %cfg.handle, command = %cfg.command, error = %e, "spawn failed");
            return JobOutcome::Failure;
        }
    };

    let mut pumps = Vec::with_capacity(2);
    if let Some(out) = child.stdout.take() {
        pumps.push(tokio::spawn(forward_lines(out, Stream::Stdout, cfg.handle.clone(), output)));
    }
    if let Some(err) = child.stderr.take() {
        pumps.push(tokio::spawn(forward_lines(err, Stream::Stderr, cfg.handle.clone(), output)));
    }

    let deadline = async {
        match cfg.timeout {
            Some(t) => tokio::time::sleep(t).await,
            None => std::future::pending().await,
        }
    };

    let outcome = tokio::select! {
        res = child.wait() => match res {
            Ok(status) if status.success() || !cfg.fail_on_non_zero => {
                debug!(job = %cfg.handle, code = ?status.code(), "process exited");
                JobOutcome::Success
            }
            Ok(status) => {
                match status.code() {
                    Some(code) => warn!(job = %cfg.handle, code, "process exited with non-zero code"),
                    None => warn!(job = %cfg.handle, "process terminated by signal"),
                }
                JobOutcome::Failure
            }
            Err(e) => {
                warn!(job = %cfg.handle, error = %e, "wait failed");
                JobOutcome::Failure
            }
        },
        _ = deadline => {
            warn!(job = %cfg.handle, timeout = ?cfg.timeout, "timeout elapsed; killing process");
            kill(&mut child, cfg).await;
            JobOutcome::Timeout
        }
        _ = cancel.cancelled() => {
            debug!(job = %cfg.handle, "cancellation requested; killing process");
            kill(&mut child, cfg).await;
            JobOutcome::Canceled
        }
    };

    // A killed child may leave grandchildren holding the pipes open.
    for pump in pumps {
        if matches!(outcome, JobOutcome::Timeout | JobOutcome::Canceled) {
            pump.abort();
        }
        let _ = pump.await;
    }
    outcome
}

async fn kill(child: &mut tokio::process::Child, cfg: &ProcessConfig) {
    if let Err(e) = child.kill().await {
        debug!(job = %cfg.handle, error = %e, "failed to kill process");
    }
}
