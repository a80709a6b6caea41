//! Research Queue CLI - the `research-queue` binary.

use anyhow::{Context, Result};
use clap::Parser;

use research_queue_cli::logging::init_logging;
use research_queue_cli::settings::load_settings;
use research_queue_cli::{run, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli.config_path());

    // Dropping the handle stops logging.
    let _logger = init_logging(&settings.log_level).context("Failed to start logging")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(cli, settings))
}
