//! Error types for kisan-chat

use thiserror::Error;

/// Result type alias using kisan-chat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by chat operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the provider layer
    #[error(transparent)]
    Ai(#[from] kisan_ai::Error),

    /// Input rejected before any upstream call
    #[error("{0}")]
    InvalidInput(String),

    /// A response is still streaming; the submission was not accepted
    #[error("Please wait for the current answer to finish.")]
    Busy,

    /// Audio output could not be started
    #[error("{0}")]
    Media(String),

    /// Saving or loading the conversation failed
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Persistence(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Persistence(e.to_string())
    }
}
