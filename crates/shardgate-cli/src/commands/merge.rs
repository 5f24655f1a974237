//! Merge command - combine shard files into one output.

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::info;

use shardgate_core::{MarkerClassifier, PartFileSink, ShardMerger, discover_shards};
use shardgate_model::ShardKeyRule;

#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Directory holding the shard files.
    #[arg(long)]
    pub input_dir: PathBuf,

    /// Only files ending with this suffix are shards.
    #[arg(long, default_value = ".vcf.gz")]
    pub suffix: String,

    /// How the shard key is read from a file name: `marker:<m>` takes the number right after
    /// `<m>`, `first-number` takes the first number in the name.
    #[arg(long, default_value = "marker:eh_shard")]
    pub key_rule: ShardKeyRule,

    /// Merged output; `.gz`/`.bgz` targets are compressed.
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Fail unless exactly this many shards are found.
    #[arg(long)]
    pub expect_shards: Option<usize>,
}

/// Execute the merge command.
///
/// # Errors
///
/// Returns an error if discovery fails, the shard count does not match `--expect-shards`, or the
/// merge itself fails. No output file is left behind in any of these cases.
pub fn execute(args: &MergeArgs) -> Result<ExitCode> {
    let rule = &args.key_rule;
    let shards = discover_shards(&args.input_dir, &args.suffix, rule).with_context(|| {
        format!("failed to discover shards in {}", args.input_dir.display())
    })?;

    if let Some(expected) = args.expect_shards {
        if shards.len() != expected {
            bail!(
                "expected {expected} shards in {}, found {}",
                args.input_dir.display(),
                shards.len()
            );
        }
    }
    info!(shards = shards.len(), dir = %args.input_dir.display(), rule = %rule, "merging shards");

    let mut sink = PartFileSink::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let report = ShardMerger::new(MarkerClassifier::vcf())
        .merge_into(shards, &mut sink)
        .with_context(|| format!("failed to merge into {}", args.output.display()))?;

    info!(
        output = %args.output.display(),
        shards = report.shards,
        header_lines = report.header_lines,
        data_lines = report.data_lines,
        suppressed_lines = report.suppressed_lines,
        "merge complete"
    );
    Ok(ExitCode::SUCCESS)
}
