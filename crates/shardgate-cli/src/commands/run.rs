//! Run command - execute a batch plan under a bounded admission window.

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use shardgate_core::{BatchDriver, DriverConfig, Executor};
use shardgate_exec::LocalExecutor;
use shardgate_model::{BatchPlan, ExistingOutputStrategy, JobOutcome};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Batch plan (JSON).
    #[arg(long)]
    pub plan: PathBuf,

    /// Override the plan's admission window.
    #[arg(long)]
    pub max_parallel_jobs: Option<usize>,

    /// Run jobs even when all of their outputs already exist.
    #[arg(long)]
    pub rerun_existing: bool,
}

impl RunArgs {
    /// Driver configuration from the plan with command-line overrides applied.
    pub fn driver_config(&self, plan: &BatchPlan) -> DriverConfig {
        let mut cfg = DriverConfig::from_plan(plan);
        if let Some(n) = self.max_parallel_jobs {
            cfg.max_parallel_jobs = n;
        }
        if self.rerun_existing {
            cfg = cfg.with_existing_outputs(ExistingOutputStrategy::Rerun);
        }
        cfg
    }
}

pub fn load_plan(path: &Path) -> Result<BatchPlan> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read plan {}", path.display()))?;
    BatchPlan::from_json(&raw).with_context(|| format!("invalid plan {}", path.display()))
}

/// Execute the run command.
///
/// Ctrl-C cancels every job still queued or running.
///
/// # Errors
///
/// Returns an error if the plan cannot be loaded, the window is zero, or a job is rejected at
/// submission. Jobs that fail while running do not error; they turn the exit code non-zero.
pub async fn execute(args: &RunArgs) -> Result<ExitCode> {
    let plan = load_plan(&args.plan)?;
    let config = args.driver_config(&plan);

    let executor = LocalExecutor::new()?;
    let mut driver = BatchDriver::new(config, executor).context("invalid driver configuration")?;
    driver.submit_all(&plan.jobs).context("job submission failed")?;

    let summary = driver.summary();
    info!(
        queued = summary.queued,
        gated = summary.gated,
        skipped = summary.skipped,
        "all jobs submitted"
    );

    let executor = driver.into_executor();
    let token = executor.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; canceling jobs");
            token.cancel();
        }
    });

    let outcomes = executor.wait().await;
    interrupt.abort();

    let mut failed = 0usize;
    for (handle, outcome) in &outcomes {
        if *outcome != JobOutcome::Success {
            failed += 1;
            warn!(job = %handle, outcome = %outcome, "job did not succeed");
        }
    }
    let stats = executor.stats();
    info!(
        executor = executor.name(),
        finished = outcomes.len(),
        failed,
        skipped = summary.skipped,
        peak_running = stats.peak_running,
        "batch finished"
    );

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
