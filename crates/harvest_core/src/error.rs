//! Error types for the game engine.

use thiserror::Error;

/// Domain errors surfaced by the engines.
///
/// Everything here is recoverable at the call boundary: the HTTP layer maps
/// each variant to a status code and the game state stays unchanged.
#[derive(Error, Debug)]
pub enum GameError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("insufficient resource: have {available}, asked to sell {requested}")]
    InsufficientResource { available: i64, requested: i64 },

    #[error("insufficient funds: have {available} coins, upgrade costs {required}")]
    InsufficientFunds { available: i64, required: i64 },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("password hash error: {0}")]
    PasswordHash(String),
}

pub type Result<T> = std::result::Result<T, GameError>;
