use crate::domain::ChatId;

/// Core error type for the bot.
///
/// Adapter crates should map their specific errors into this type so the bot
/// core can handle failures consistently (user-facing message vs logged).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// Rejected user input. The payload is the reply shown to the user.
    #[error("{0}")]
    Validation(String),

    #[error("A study session is already in progress!")]
    Conflict { chat_id: ChatId },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
