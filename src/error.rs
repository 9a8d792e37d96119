/// Crate-wide error type.
///
/// Everything fallible returns `Result<_, GameError>` and bubbles up to
/// `main`, which restores the terminal before reporting.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("config.toml parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("level {index} requested but only {available} levels are loaded")]
    LevelOutOfRange { index: usize, available: usize },

    #[error("invalid level '{name}': {reason}")]
    InvalidLevel { name: String, reason: String },

    #[error("level library is empty")]
    EmptyLibrary,
}

pub type GameResult<T> = Result<T, GameError>;
