use gcal_scheduler::components::google_calendar::TokenManager;
use gcal_scheduler::config::Config;
use gcal_scheduler::error::SchedulerResult;
use std::sync::Arc;

#[tokio::main]
async fn main() -> SchedulerResult<()> {
    // Load configuration
    let config = Arc::new(Config::load()?);

    let token_manager = TokenManager::new(Arc::clone(&config));

    println!("Opening browser for Google Calendar authorization...");
    println!(
        "Waiting for the authorization callback on {}",
        config.redirect_uri()
    );

    let token = token_manager.authorize().await?;

    println!(
        "Token successfully saved to {} (valid until unix time {})",
        config.token_file.display(),
        token.expires_at
    );

    Ok(())
}
