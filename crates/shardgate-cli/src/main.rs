use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use shardgate_cli::{Cli, Commands, commands};
use shardgate_observe::{init_local_offset, init_logging};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // 1) timezone, while the process is still single-threaded
    init_local_offset();

    // 2) logger
    init_logging(&cli.log_config()?)?;
    debug!(command = ?cli.command, "shardgate starting");

    // 3) command
    match cli.command {
        Commands::Merge(args) => commands::merge::execute(&args),
        Commands::Run(args) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(commands::run::execute(&args))
        }
    }
}
