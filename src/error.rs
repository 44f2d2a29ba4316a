//! Error types and handling for the casino engine

use thiserror::Error;

/// Result type alias for casino operations
pub type Result<T> = std::result::Result<T, Error>;

/// Casino engine error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid wager: {0}")]
    InvalidWager(String),

    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("Invalid cell: {0}")]
    InvalidCell(String),

    #[error("Session conflict: a hazard session is already active for this player")]
    SessionConflict,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    #[error("Render error: {0}")]
    Render(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(format!("sqlite error: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON error: {}", err))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(format!("TOML error: {}", err))
    }
}
