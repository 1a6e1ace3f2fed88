use crate::components::recurrence::RecurrenceExpander;
use crate::components::{DateRange, EventService};
use crate::config::Config;
use crate::error::{Error, SchedulerResult};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use inquire::{CustomType, InquireError, Select};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

// Export submodules
pub mod create;
pub mod fetch;
pub mod reschedule;

pub use create::{create_events, CreateSummary};
pub use fetch::{export_events, write_events_csv};
pub use reschedule::{reschedule_events, EventChooser, PromptChooser, RescheduleSummary};

/// Create, export and reschedule Google Calendar events from CSV files
#[derive(Debug, Parser)]
#[command(name = "gcal-scheduler", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create events for every row of the template CSV
    Create {
        /// Template CSV (defaults to INPUT_CSV_FILE)
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Export events in a date range to CSV
    Fetch {
        /// First day, YYYY-MM-DD (prompted if missing)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day, inclusive (prompted if missing)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Destination CSV (defaults to OUTPUT_CSV_FILE)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Move events listed in the reschedule CSV
    Reschedule {
        /// Reschedule CSV (defaults to RESCHEDULE_CSV_FILE)
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Interactive menu
    Menu,
}

/// Shared context for all commands
pub struct CommandContext {
    pub config: Arc<Config>,
    pub service: Arc<dyn EventService>,
    pub expander: RecurrenceExpander,
}

impl CommandContext {
    /// Create a new command context
    pub fn new(config: Arc<Config>, service: Arc<dyn EventService>) -> SchedulerResult<Self> {
        let expander = RecurrenceExpander::new(config.tz()?, config.color_table());
        Ok(Self {
            config,
            service,
            expander,
        })
    }
}

/// Type alias for command result
pub type CommandResult = SchedulerResult<()>;

fn prompt_date(message: &str) -> SchedulerResult<NaiveDate> {
    Ok(CustomType::<NaiveDate>::new(message)
        .with_help_message("YYYY-MM-DD")
        .with_error_message("Please enter a date in YYYY-MM-DD format")
        .prompt()?)
}

async fn run_create(ctx: &CommandContext, input: Option<PathBuf>) -> CommandResult {
    let input = input.unwrap_or_else(|| ctx.config.input_csv_file.clone());
    let summary = create_events(
        ctx.service.as_ref(),
        &ctx.expander,
        &input,
        &ctx.config.output_file,
    )
    .await?;
    println!(
        "Created {} events ({} failed, {} rows rejected)",
        summary.events_created, summary.events_failed, summary.rows_rejected
    );
    Ok(())
}

async fn run_fetch(
    ctx: &CommandContext,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    output: Option<PathBuf>,
) -> CommandResult {
    let from = match from {
        Some(date) => date,
        None => prompt_date("Start date")?,
    };
    let to = match to {
        Some(date) => date,
        None => prompt_date("End date")?,
    };
    let output = output.unwrap_or_else(|| ctx.config.output_csv_file.clone());
    let range = DateRange::new(from, to)?;
    let written = export_events(ctx.service.as_ref(), range, &output).await?;
    println!("{} events written to {}", written, output.display());
    Ok(())
}

async fn run_reschedule(ctx: &CommandContext, input: Option<PathBuf>) -> CommandResult {
    let input = input.unwrap_or_else(|| ctx.config.reschedule_csv_file.clone());
    let summary = reschedule_events(ctx.service.as_ref(), &input, &mut PromptChooser).await?;
    println!(
        "{} events rescheduled, {} skipped, {} failed",
        summary.rescheduled, summary.skipped, summary.failed
    );
    Ok(())
}

/// Run one command to completion
pub async fn run_command(ctx: &CommandContext, command: Command) -> CommandResult {
    match command {
        Command::Create { input } => run_create(ctx, input).await,
        Command::Fetch { from, to, output } => run_fetch(ctx, from, to, output).await,
        Command::Reschedule { input } => run_reschedule(ctx, input).await,
        Command::Menu => run_menu(ctx).await,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    Create,
    Fetch,
    Reschedule,
    Exit,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuItem::Create => "Create new events from CSV file",
            MenuItem::Fetch => "Fetch events from calendar",
            MenuItem::Reschedule => "Reschedule events",
            MenuItem::Exit => "Exit",
        };
        f.write_str(label)
    }
}

/// Menu loop; a failing action is reported and the menu shown again
pub async fn run_menu(ctx: &CommandContext) -> CommandResult {
    let items = vec![
        MenuItem::Create,
        MenuItem::Fetch,
        MenuItem::Reschedule,
        MenuItem::Exit,
    ];

    loop {
        let item = match Select::new("Enter your choice:", items.clone()).prompt() {
            Ok(item) => item,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        let result = match item {
            MenuItem::Create => run_create(ctx, None).await,
            MenuItem::Fetch => run_fetch(ctx, None, None, None).await,
            MenuItem::Reschedule => run_reschedule(ctx, None).await,
            MenuItem::Exit => break,
        };

        match result {
            Ok(()) => {}
            Err(e @ Error::Prompt(_)) => error!("Cancelled: {}", e),
            Err(e) => error!("{:?}", miette::Report::new(e)),
        }
    }

    Ok(())
}
