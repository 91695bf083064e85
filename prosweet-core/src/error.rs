//! Error types for calendar operations.
//!
//! Every failure is scoped to the single event operation that produced it and is
//! returned to the caller as a value; nothing here is fatal to the process.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while encoding events or talking to the calendar server.
#[derive(Error, Debug)]
pub enum CalendarError {
    /// Bad input shape. Detected locally and never sent over the wire.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Network failure or timeout.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server rejected write (status {status}): {body}")]
    RemoteWrite { status: StatusCode, body: String },

    #[error("Server rejected read (status {status}): {body}")]
    RemoteRead { status: StatusCode, body: String },

    /// The resource changed since its ETag was read. Re-fetch before retrying.
    #[error("Event '{uid}' was modified concurrently")]
    Conflict { uid: String },

    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("Authentication failed (status {0})")]
    Auth(StatusCode),

    /// The server returned no ETag, so a conditional update is impossible.
    #[error("Server did not report an ETag for '{0}'; refusing unconditional update")]
    PreconditionUnavailable(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CalendarError {
    /// Whether re-authenticating could fix this error.
    pub fn is_auth(&self) -> bool {
        matches!(self, CalendarError::Auth(_))
    }
}

impl From<reqwest::Error> for CalendarError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CalendarError::Transport(format!("request timed out: {}", err))
        } else {
            CalendarError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CalendarError {
    fn from(err: serde_json::Error) -> Self {
        CalendarError::Serialization(err.to_string())
    }
}

/// Result type alias for calendar operations.
pub type CalendarResult<T> = Result<T, CalendarError>;
