//! Error types for the currency exchange bot

use thiserror::Error;

/// Result type alias for bot operations
pub type Result<T> = std::result::Result<T, ExchangeBotError>;

#[derive(Error, Debug)]
pub enum ExchangeBotError {

    // =============================
    // Core Errors
    // =============================

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Exchange rates unavailable: {0}")]
    RatesUnavailable(String),

    #[error("Invalid conversation state: {0}")]
    InvalidState(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Dispatcher is not running")]
    DispatcherClosed,

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}
