//! CLI error type.

use std::fmt;

use mapfolio::config::ConfigError;
use mapfolio::error::{DiscoveryError, FetchError};
use mapfolio::logging::LoggingError;

/// Errors that end a CLI invocation with a non-zero exit code.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be read or is incomplete.
    Config(String),
    /// The tracing subscriber could not be installed.
    Logging(String),
    /// The HTTP client could not be built.
    Http(String),
    /// The async runtime could not be started.
    Runtime(String),
    /// The discovery engine reported a failure.
    Discovery(DiscoveryError),
    /// The screen did not settle in time.
    Timeout(u64),
    /// Invalid command-line argument.
    InvalidArgument(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Logging(msg) => write!(f, "Logging error: {}", msg),
            CliError::Http(msg) => write!(f, "HTTP client error: {}", msg),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
            CliError::Discovery(e) => write!(f, "{} ({})", e.status_message(), e),
            CliError::Timeout(secs) => write!(f, "No response within {} seconds", secs),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e.to_string())
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        CliError::Http(e.to_string())
    }
}

impl From<DiscoveryError> for CliError {
    fn from(e: DiscoveryError) -> Self {
        CliError::Discovery(e)
    }
}
