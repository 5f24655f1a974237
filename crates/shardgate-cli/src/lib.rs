//! `shardgate` command line.
//!
//! - `shardgate merge` concatenates per-shard outputs into one file, keeping a single header.
//! - `shardgate run` executes a batch plan with a bounded number of jobs in flight.
//!
//! Logging flags are global; `SHARDGATE_LOG` overrides `--log-level`.
pub mod commands;

use clap::{Parser, Subcommand};
use shardgate_observe::{LogConfig, LogFilter, LogFormat, LogResult, LogTimeZone};

#[derive(Debug, Parser)]
#[command(name = "shardgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log output format (text, json, journald).
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LogFormat,

    /// Log filter, e.g. `info` or `shardgate_core=debug,warn`.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: LogFilter,

    /// Timezone of log timestamps (utc, local).
    #[arg(long, global = true, default_value = "utc")]
    pub log_tz: LogTimeZone,

    /// Disable colored log output.
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Logging configuration from the global flags.
    pub fn log_config(&self) -> LogResult<LogConfig> {
        Ok(LogConfig {
            format: self.log_format,
            filter: self.log_level.clone().or_env()?,
            tz: self.log_tz,
            use_color: !self.no_color,
            ..LogConfig::default()
        })
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Merge shard files into one output with a single header.
    Merge(commands::merge::MergeArgs),
    /// Run a batch plan of external jobs.
    Run(commands::run::RunArgs),
}
