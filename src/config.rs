use crate::components::recurrence::ColorTable;
use crate::error::{config_error, env_error, SchedulerResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Timezone applied to every created event unless `TIMEZONE` says otherwise
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

/// Port of the local OAuth redirect listener
pub const DEFAULT_REDIRECT_PORT: u16 = 41519;

/// Location of the optional category color overrides
pub const COLORS_FILE: &str = "config/colors.toml";

/// Main configuration structure for the scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Google Calendar API client ID
    pub google_client_id: String,
    /// Google Calendar API client secret
    pub google_client_secret: String,
    /// Calendar that events are written to and read from
    pub google_calendar_id: String,
    /// IANA timezone name applied to event start and end times
    pub timezone: String,
    /// Where the OAuth token is cached between runs
    pub token_file: PathBuf,
    /// Template rows for the create workflow
    pub input_csv_file: PathBuf,
    /// Append-only log of created events
    pub output_file: PathBuf,
    /// Destination of the fetch/export workflow
    pub output_csv_file: PathBuf,
    /// Rows for the reschedule workflow
    pub reschedule_csv_file: PathBuf,
    /// Local port for the OAuth redirect
    pub redirect_port: u16,
    /// Category color overrides merged over the built-in table
    pub colors: HashMap<String, String>,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> SchedulerResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let google_client_id =
            env::var("GOOGLE_CLIENT_ID").map_err(|_| env_error("GOOGLE_CLIENT_ID"))?;
        let google_client_secret =
            env::var("GOOGLE_CLIENT_SECRET").map_err(|_| env_error("GOOGLE_CLIENT_SECRET"))?;
        let google_calendar_id =
            env::var("GOOGLE_CALENDAR_ID").unwrap_or_else(|_| String::from("primary"));

        let timezone = env::var("TIMEZONE").unwrap_or_else(|_| String::from(DEFAULT_TIMEZONE));

        let redirect_port = match env::var("OAUTH_REDIRECT_PORT") {
            Ok(port) => port
                .parse::<u16>()
                .map_err(|_| env_error("Invalid OAUTH_REDIRECT_PORT format"))?,
            Err(_) => DEFAULT_REDIRECT_PORT,
        };

        let colors = match fs::read_to_string(COLORS_FILE) {
            Ok(content) => toml::from_str::<HashMap<String, String>>(&content)?,
            Err(_) => HashMap::new(),
        };

        let config = Config {
            google_client_id,
            google_client_secret,
            google_calendar_id,
            timezone,
            token_file: path_var("TOKEN_FILE", "token.json"),
            input_csv_file: path_var("INPUT_CSV_FILE", "data/input.csv"),
            output_file: path_var("OUTPUT_FILE", "data/output.txt"),
            output_csv_file: path_var("OUTPUT_CSV_FILE", "data/output.csv"),
            reschedule_csv_file: path_var("RESCHEDULE_CSV_FILE", "data/reschedule.csv"),
            redirect_port,
            colors,
        };

        // Fail early on a bad timezone instead of on the first API call
        config.tz()?;

        Ok(config)
    }

    /// Parsed event timezone
    pub fn tz(&self) -> SchedulerResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Unknown timezone: {}", self.timezone)))
    }

    /// Built-in category colors with the configured overrides applied
    pub fn color_table(&self) -> ColorTable {
        ColorTable::default().with_overrides(&self.colors)
    }

    /// Redirect URI registered for the installed-app OAuth flow
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}", self.redirect_port)
    }
}

fn path_var(name: &str, default: &str) -> PathBuf {
    env::var(name)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}
