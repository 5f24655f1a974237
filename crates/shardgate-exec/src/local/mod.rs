//! In-process executor that runs jobs as OS child processes on a tokio runtime.
//!
//! Every submitted job becomes one tokio task that:
//! 1. waits until each dependency handle reached a terminal outcome;
//! 2. spawns the child via `tokio::process::Command`;
//! 3. races it against its timeout and the executor's cancellation token;
//! 4. publishes its [`JobOutcome`] so dependents may start.
//!
//! A dependency's outcome never blocks its dependents: failure, timeout or a panicked task all
//! release them. Only cancellation is propagated.
mod config;
mod output;
mod process;

pub use output::OutputLogConfig;

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use shardgate_core::{Executor, ExecutorError};
use shardgate_model::{Env, JobHandle, JobOutcome, JobSpec};
use tokio::{runtime::Handle, sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::{ExecError, local::config::ProcessConfig};

/// Snapshot of executor counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    pub submitted: usize,
    /// Jobs whose child process was spawned (or attempted).
    pub started: usize,
    /// Jobs that reached an outcome, including those canceled before they started.
    pub finished: usize,
    /// Highest number of children alive at the same time.
    pub peak_running: usize,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicUsize,
    started: AtomicUsize,
    finished: AtomicUsize,
    running: AtomicUsize,
    peak_running: AtomicUsize,
}

impl Counters {
    fn start(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_running.fetch_max(now, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.running.fetch_sub(1, Ordering::SeqCst);
    }

    fn settle(&self) {
        self.finished.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Default)]
struct State {
    /// Completion signal of every handle ever submitted.
    outcomes: HashMap<JobHandle, watch::Receiver<Option<JobOutcome>>>,
    /// Tasks not yet collected by [`LocalExecutor::wait`], in submission order.
    pending: Vec<(JobHandle, JoinHandle<JobOutcome>)>,
}

/// Executor running each job as a local child process.
pub struct LocalExecutor {
    name: &'static str,
    runtime: Handle,
    base_env: Env,
    output: OutputLogConfig,
    cancel: CancellationToken,
    counters: Arc<Counters>,
    state: Mutex<State>,
}

impl LocalExecutor {
    /// Executor bound to the current tokio runtime.
    ///
    /// Fails with [`ExecError::NoRuntime`] outside a runtime context.
    pub fn new() -> Result<Self, ExecError> {
        let runtime = Handle::try_current().map_err(|e| ExecError::NoRuntime(e.to_string()))?;
        Ok(Self::with_runtime(runtime))
    }

    /// Executor spawning its tasks on `runtime`.
    pub fn with_runtime(runtime: Handle) -> Self {
        Self {
            name: "local",
            runtime,
            base_env: Env::new(),
            output: OutputLogConfig::default(),
            cancel: CancellationToken::new(),
            counters: Arc::new(Counters::default()),
            state: Mutex::new(State::default()),
        }
    }

    /// Environment applied to every job before the job's own entries.
    pub fn with_env(mut self, env: Env) -> Self {
        self.base_env = env;
        self
    }

    pub fn with_output(mut self, output: OutputLogConfig) -> Self {
        self.output = output;
        self
    }

    /// Token canceled by [`LocalExecutor::cancel`]; useful to hook signal handlers.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Kill running children, drop queued jobs and refuse further submissions.
    pub fn cancel(&self) {
        info!(executor = self.name, "canceling all jobs");
        self.cancel.cancel();
    }

    pub fn stats(&self) -> ExecutorStats {
        ExecutorStats {
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            started: self.counters.started.load(Ordering::Relaxed),
            finished: self.counters.finished.load(Ordering::Relaxed),
            peak_running: self.counters.peak_running.load(Ordering::SeqCst),
        }
    }

    /// Wait for every job submitted so far; outcomes come back in submission order.
    ///
    /// Jobs submitted while waiting are left for the next call.
    pub async fn wait(&self) -> Vec<(JobHandle, JobOutcome)> {
        let pending = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut state.pending)
        };

        let mut outcomes = Vec::with_capacity(pending.len());
        for (handle, task) in pending {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) if e.is_cancelled() => JobOutcome::Canceled,
                Err(e) => {
                    warn!(job = %handle, error = %e, "job task panicked");
                    JobOutcome::Failure
                }
            };
            outcomes.push((handle, outcome));
        }
        outcomes
    }
}

impl Executor for LocalExecutor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn submit(
        &self,
        handle: &JobHandle,
        spec: &JobSpec,
        after: &[JobHandle],
    ) -> Result<(), ExecutorError> {
        if self.cancel.is_cancelled() {
            return Err(ExecutorError::Closed);
        }
        let cfg = ProcessConfig::resolve(handle, spec, &self.base_env)?;

        let mut state = self
            .state
            .lock()
            .map_err(|_| ExecutorError::Internal("executor state lock poisoned".into()))?;
        if state.outcomes.contains_key(handle) {
            return Err(ExecutorError::DuplicateHandle(handle.clone()));
        }
        let deps = after
            .iter()
            .map(|dep| {
                state
                    .outcomes
                    .get(dep)
                    .cloned()
                    .map(|rx| (dep.clone(), rx))
                    .ok_or_else(|| ExecutorError::UnknownDependency(dep.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (done, rx) = watch::channel(None);
        state.outcomes.insert(handle.clone(), rx);

        let job = JobTask {
            cfg,
            deps,
            done,
            output: self.output,
            cancel: self.cancel.child_token(),
            counters: Arc::clone(&self.counters),
        };
        let task = self.runtime.spawn(job.run());
        state.pending.push((handle.clone(), task));
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);

        debug!(job = %handle, after = ?after, "job queued");
        Ok(())
    }
}

impl Drop for LocalExecutor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct JobTask {
    cfg: ProcessConfig,
    deps: Vec<(JobHandle, watch::Receiver<Option<JobOutcome>>)>,
    done: watch::Sender<Option<JobOutcome>>,
    output: OutputLogConfig,
    cancel: CancellationToken,
    counters: Arc<Counters>,
}

impl JobTask {
    async fn run(self) -> JobOutcome {
        let outcome = self.execute().await;
        self.counters.settle();
        let _ = self.done.send(Some(outcome));
        outcome
    }

    async fn execute(&self) -> JobOutcome {
        for (dep, rx) in &self.deps {
            tokio::select! {
                outcome = dependency_outcome(rx.clone()) => {
                    trace!(job = %self.cfg.handle, dep = %dep, outcome = ?outcome, "dependency finished");
                }
                _ = self.cancel.cancelled() => {
                    debug!(job = %self.cfg.handle, "canceled while waiting for dependencies");
                    return JobOutcome::Canceled;
                }
            }
        }
        if self.cancel.is_cancelled() {
            return JobOutcome::Canceled;
        }

        self.counters.start();
        info!(job = %self.cfg.handle, "{}", self.cfg);
        let outcome = process::run_process(&self.cfg, self.output, &self.cancel).await;
        self.counters.stop();

        info!(job = %self.cfg.handle, outcome = %outcome, "job finished");
        outcome
    }
}

/// Outcome a dependency settled on; `None` when its task died without reporting.
async fn dependency_outcome(mut rx: watch::Receiver<Option<JobOutcome>>) -> Option<JobOutcome> {
    match rx.wait_for(Option::is_some).await {
        Ok(outcome) => *outcome,
        Err(_) => None,
    }
}
