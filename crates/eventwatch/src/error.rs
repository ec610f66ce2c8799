use thiserror::Error;

use crate::logging::LoggingError;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("{0}")]
    Message(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
}

impl WatchError {
    pub fn message<T: Into<String>>(message: T) -> Self {
        WatchError::Message(message.into())
    }
}
