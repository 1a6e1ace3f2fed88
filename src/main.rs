use clap::Parser;
use gcal_scheduler::commands::{Cli, Command};
use gcal_scheduler::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    let cli = Cli::parse();
    info!("Starting gcal-scheduler");

    // Load configuration
    let config = startup::load_config()?;

    startup::run(config, cli.command.unwrap_or(Command::Menu)).await?;
    Ok(())
}
