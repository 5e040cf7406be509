//! Error types for the signal bot

use crate::types::TimeFrame;

/// Errors raised by calculators, collaborators and configuration
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("Insufficient data on {timeframe}: need {required} bars, got {available}")]
    InsufficientData {
        timeframe: TimeFrame,
        required: usize,
        available: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("External service unavailable: {0}")]
    ExternalUnavailable(String),

    #[error("Malformed response from {source_name}: {message}")]
    MalformedResponse { source_name: String, message: String },
}

impl BotError {
    pub fn insufficient(timeframe: TimeFrame, required: usize, available: usize) -> Self {
        BotError::InsufficientData {
            timeframe,
            required,
            available,
        }
    }

    /// Fatal errors stop the polling loop; everything else is retried
    pub fn is_fatal(&self) -> bool {
        matches!(self, BotError::InvalidConfiguration(_))
    }
}

impl From<reqwest::Error> for BotError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            BotError::MalformedResponse {
                source_name: "bridge".to_string(),
                message: e.to_string(),
            }
        } else {
            BotError::ExternalUnavailable(e.to_string())
        }
    }
}

impl From<config::ConfigError> for BotError {
    fn from(e: config::ConfigError) -> Self {
        BotError::InvalidConfiguration(e.to_string())
    }
}

/// Result type for bot operations
pub type Result<T> = std::result::Result<T, BotError>;
