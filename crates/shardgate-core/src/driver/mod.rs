//! Batch driver: admits jobs through a [`ConcurrencyGate`] and hands them to an [`Executor`].
//! - Owns the gate and the executor for one batch of submissions.
//! - Skips jobs whose outputs already exist (per [`ExistingOutputStrategy`]).
//! - Mints handles and submits every job with its gate dependency.
use shardgate_model::{BatchPlan, ExistingOutputStrategy, JobHandle, JobSpec};
use tracing::{debug, info, instrument};

use crate::{
    error::CoreError,
    executor::{Executor, mint_handle},
    gate::ConcurrencyGate,
};

/// Explicit driver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Admission window; `0` is rejected when the driver is built.
    pub max_parallel_jobs: usize,
    /// What to do with jobs whose outputs already exist.
    pub existing_outputs: ExistingOutputStrategy,
}

impl DriverConfig {
    pub fn new(max_parallel_jobs: usize) -> Self {
        Self {
            max_parallel_jobs,
            existing_outputs: ExistingOutputStrategy::default(),
        }
    }

    /// Take window and strategy from a plan.
    pub fn from_plan(plan: &BatchPlan) -> Self {
        Self {
            max_parallel_jobs: plan.max_parallel_jobs,
            existing_outputs: plan.existing_outputs,
        }
    }

    pub fn with_existing_outputs(mut self, strategy: ExistingOutputStrategy) -> Self {
        self.existing_outputs = strategy;
        self
    }
}

/// Result of a single [`BatchDriver::submit`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Job handed to the executor; it starts only after `after` (if any) finished.
    Queued {
        handle: JobHandle,
        after: Option<JobHandle>,
    },
    /// Job not submitted because all of its outputs already exist.
    Skipped { name: String },
}

/// Counters of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverSummary {
    pub queued: usize,
    pub gated: usize,
    pub skipped: usize,
}

/// Submits a batch of jobs under a bounded admission window.
pub struct BatchDriver<E> {
    gate: ConcurrencyGate<JobHandle>,
    executor: E,
    config: DriverConfig,
    summary: DriverSummary,
}

impl<E: Executor> BatchDriver<E> {
    /// Build a driver; fails with [`CoreError::Configuration`] for a zero window.
    pub fn new(config: DriverConfig, executor: E) -> Result<Self, CoreError> {
        let gate = ConcurrencyGate::new(config.max_parallel_jobs)?;
        info!(
            executor = executor.name(),
            max_parallel_jobs = config.max_parallel_jobs,
            existing_outputs = ?config.existing_outputs,
            "batch driver ready"
        );
        Ok(Self {
            gate,
            executor,
            config,
            summary: DriverSummary::default(),
        })
    }

    /// Validate, admit and submit one job.
    /// Steps:
    /// 1. Validate the job spec.
    /// 2. Skip it if the strategy allows and every declared output exists.
    /// 3. Mint a handle and submit it with the gate's next dependency.
    /// 4. Register the handle only once the executor accepted it, so a rejected job leaves the
    ///    window untouched.
    #[instrument(level = "debug", skip(self, spec), fields(job = %spec.name))]
    pub fn submit(&mut self, spec: &JobSpec) -> Result<Submission, CoreError> {
        spec.validate()?;

        if self.config.existing_outputs == ExistingOutputStrategy::Skip && outputs_exist(spec) {
            info!(job = %spec.name, "outputs already exist; skipping");
            self.summary.skipped += 1;
            return Ok(Submission::Skipped {
                name: spec.name.clone(),
            });
        }

        let handle = mint_handle(self.executor.name(), &spec.name);
        let after = self.gate.next_dependency().cloned();
        self.executor.submit(&handle, spec, after.as_slice())?;
        self.gate.register(handle.clone());

        self.summary.queued += 1;
        if after.is_some() {
            self.summary.gated += 1;
        }
        debug!(handle = %handle, after = ?after, "job submitted");
        Ok(Submission::Queued { handle, after })
    }

    /// Submit every job of `jobs` in order, stopping at the first error.
    pub fn submit_all<'a, I>(&mut self, jobs: I) -> Result<Vec<Submission>, CoreError>
    where
        I: IntoIterator<Item = &'a JobSpec>,
    {
        jobs.into_iter().map(|spec| self.submit(spec)).collect()
    }

    pub fn summary(&self) -> DriverSummary {
        self.summary
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn gate(&self) -> &ConcurrencyGate<JobHandle> {
        &self.gate
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Drop the gate and return the executor (e.g. to wait for completion).
    pub fn into_executor(self) -> E {
        self.executor
    }
}

/// `true` when the job declares outputs and every one of them exists.
fn outputs_exist(spec: &JobSpec) -> bool {
    !spec.outputs.is_empty() && spec.outputs.iter().all(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecutorError;

    use std::sync::Mutex;

    /// Records submissions instead of running anything.
    #[derive(Default)]
    struct RecordingExecutor {
        calls: Mutex<Vec<(JobHandle, String, Vec<JobHandle>)>>,
    }

    impl Executor for RecordingExecutor {
        fn name(&self) -> &'static str {
            "rec"
        }

        fn submit(
            &self,
            handle: &JobHandle,
            spec: &JobSpec,
            after: &[JobHandle],
        ) -> Result<(), ExecutorError> {
            self.calls
                .lock()
                .unwrap()
                .push((handle.clone(), spec.name.clone(), after.to_vec()));
            Ok(())
        }
    }

    struct RejectingExecutor;

    impl Executor for RejectingExecutor {
        fn name(&self) -> &'static str {
            "reject"
        }

        fn submit(&self, _: &JobHandle, _: &JobSpec, _: &[JobHandle]) -> Result<(), ExecutorError> {
            Err(ExecutorError::Closed)
        }
    }

    /// Rejects the job named `bad` and records everything else.
    #[derive(Default)]
    struct PickyExecutor {
        inner: RecordingExecutor,
    }

    impl Executor for PickyExecutor {
        fn name(&self) -> &'static str {
            "picky"
        }

        fn submit(
            &self,
            handle: &JobHandle,
            spec: &JobSpec,
            after: &[JobHandle],
        ) -> Result<(), ExecutorError> {
            if spec.name == "bad" {
                return Err(ExecutorError::InvalidSpec("rejected".into()));
            }
            self.inner.submit(handle, spec, after)
        }
    }

    fn job(name: &str) -> JobSpec {
        JobSpec::new(name, "true")
    }

    #[test]
    fn zero_window_is_rejected() {
        let res = BatchDriver::new(DriverConfig::new(0), RecordingExecutor::default());
        assert!(matches!(res, Err(CoreError::Configuration(_))));
    }

    #[test]
    fn jobs_are_chained_to_the_job_window_slots_earlier() {
        let mut driver =
            BatchDriver::new(DriverConfig::new(2), RecordingExecutor::default()).unwrap();

        let jobs: Vec<_> = ["a", "b", "c", "d"].into_iter().map(job).collect();
        driver.submit_all(&jobs).unwrap();

        let calls = driver.executor().calls.lock().unwrap().clone();
        let handles: Vec<_> = calls.iter().map(|c| c.0.clone()).collect();

        assert!(calls[0].2.is_empty());
        assert!(calls[1].2.is_empty());
        assert_eq!(calls[2].2, vec![handles[0].clone()]);
        assert_eq!(calls[3].2, vec![handles[1].clone()]);
        assert_eq!(
            driver.summary(),
            DriverSummary {
                queued: 4,
                gated: 2,
                skipped: 0
            }
        );
    }

    #[test]
    fn existing_outputs_are_skipped_and_not_registered() {
        let dir = tempfile::tempdir().unwrap();
        let done = dir.path().join("CPG1_eh_shard1.vcf");
        std::fs::write(&done, "").unwrap();

        let mut driver =
            BatchDriver::new(DriverConfig::new(1), RecordingExecutor::default()).unwrap();

        let first = driver.submit(&job("shard1").with_output(&done)).unwrap();
        assert_eq!(
            first,
            Submission::Skipped {
                name: "shard1".into()
            }
        );
        assert!(driver.gate().is_empty());

        let second = driver
            .submit(&job("shard2").with_output(dir.path().join("missing.vcf")))
            .unwrap();
        assert!(matches!(second, Submission::Queued { after: None, .. }));
        assert_eq!(driver.summary().skipped, 1);
    }

    #[test]
    fn rerun_strategy_submits_despite_existing_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let done = dir.path().join("out.tsv");
        std::fs::write(&done, "").unwrap();

        let cfg = DriverConfig::new(4).with_existing_outputs(ExistingOutputStrategy::Rerun);
        let mut driver = BatchDriver::new(cfg, RecordingExecutor::default()).unwrap();

        let res = driver.submit(&job("again").with_output(&done)).unwrap();
        assert!(matches!(res, Submission::Queued { .. }));
    }

    #[test]
    fn invalid_spec_is_rejected_before_admission() {
        let mut driver =
            BatchDriver::new(DriverConfig::new(1), RecordingExecutor::default()).unwrap();

        let err = driver.submit(&JobSpec::new("bad", "")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSpec(_)));
        assert_eq!(driver.gate().registered(), 0);
    }

    #[test]
    fn executor_errors_are_propagated() {
        let mut driver = BatchDriver::new(DriverConfig::new(1), RejectingExecutor).unwrap();
        let err = driver.submit(&job("a")).unwrap_err();
        assert!(matches!(err, CoreError::Executor(ExecutorError::Closed)));
    }

    #[test]
    fn rejected_submission_leaves_the_window_untouched() {
        let mut driver = BatchDriver::new(DriverConfig::new(1), PickyExecutor::default()).unwrap();

        let first = match driver.submit(&job("a")).unwrap() {
            Submission::Queued { handle, .. } => handle,
            other => panic!("expected queued, got {other:?}"),
        };
        assert!(driver.submit(&job("bad")).is_err());
        assert_eq!(driver.gate().window().cloned().collect::<Vec<_>>(), vec![first.clone()]);
        assert_eq!(driver.gate().registered(), 1);

        let third = driver.submit(&job("c")).unwrap();
        assert!(matches!(third, Submission::Queued { after: Some(ref a), .. } if *a == first));

        let calls = driver.executor().inner.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].2, vec![first]);
        assert_eq!(driver.summary().queued, 2);
    }
}
