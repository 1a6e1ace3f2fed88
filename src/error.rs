use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Input format error in row {row}: {message}")]
    #[diagnostic(
        code(gcal_scheduler::input_format),
        help("check the CSV columns and the accepted date, time and weekday formats")
    )]
    InputFormat { row: usize, message: String },

    #[error("Environment error: {0}")]
    #[diagnostic(code(gcal_scheduler::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(gcal_scheduler::config))]
    Config(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(gcal_scheduler::google_calendar))]
    GoogleCalendar(String),

    #[error("Authorization error: {0}")]
    #[diagnostic(
        code(gcal_scheduler::auth),
        help("run `get_calendar_token` to authorize the application again")
    )]
    Auth(String),

    #[error(transparent)]
    #[diagnostic(code(gcal_scheduler::io))]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    #[diagnostic(code(gcal_scheduler::csv))]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    #[diagnostic(code(gcal_scheduler::http))]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(gcal_scheduler::serialization))]
    Serialization(String),

    #[error("Prompt error: {0}")]
    #[diagnostic(code(gcal_scheduler::prompt))]
    Prompt(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(gcal_scheduler::other))]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<inquire::InquireError> for Error {
    fn from(err: inquire::InquireError) -> Self {
        Error::Prompt(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type SchedulerResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create per-row input errors
pub fn input_format_error(row: usize, message: impl Into<String>) -> Error {
    Error::InputFormat {
        row,
        message: message.into(),
    }
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create authorization errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}

impl Error {
    /// Whether the error only affects a single input row
    pub fn is_row_error(&self) -> bool {
        matches!(self, Error::InputFormat { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_format_error_message() {
        let err = input_format_error(3, "unknown weekday 'Fri?'");
        assert_eq!(
            err.to_string(),
            "Input format error in row 3: unknown weekday 'Fri?'"
        );
        assert!(err.is_row_error());
        assert!(!google_calendar_error("boom").is_row_error());
    }
}
