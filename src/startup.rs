use crate::commands::{run_command, Command, CommandContext};
use crate::components::GoogleCalendarHandle;
use crate::config::Config;
use crate::error::{Error, SchedulerResult};
use crate::shutdown;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub fn load_config() -> miette::Result<Arc<Config>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(config)),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Wire up the calendar client and run one command, stopping early on a
/// termination signal
pub async fn run(config: Arc<Config>, command: Command) -> SchedulerResult<()> {
    let calendar = GoogleCalendarHandle::new(Arc::clone(&config))?;
    let ctx = CommandContext::new(config, Arc::new(calendar.clone()))?;

    let result = tokio::select! {
        result = run_command(&ctx, command) => result,
        _ = shutdown::wait_for_signal() => {
            info!("Interrupted, shutting down");
            Ok(())
        }
    };

    if let Err(e) = calendar.shutdown().await {
        error!("Error shutting down Google Calendar actor: {:?}", e);
    }

    result
}
