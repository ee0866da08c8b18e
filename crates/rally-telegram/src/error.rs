use thiserror::Error;

/// Result type alias for telegram operations.
pub type TelegramResult<T> = std::result::Result<T, TelegramError>;

/// Errors that can occur during Telegram bot operations.
///
/// None of these stop the bot: the dispatcher logs them and moves on to
/// the next update.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Bot token is missing from config and environment.
    #[error(
        "telegram bot token not found: set RALLY_TELEGRAM_BOT_TOKEN, TELEGRAM_APITOKEN or bot_token in rally.yml"
    )]
    MissingBotToken,

    /// Failed to start the Telegram bot (network, auth, etc.).
    #[error("failed to start telegram bot: {0}")]
    Startup(String),

    /// Failed to send a message.
    #[error("failed to send telegram message: {0}")]
    Send(String),

    /// Failed to edit a message.
    #[error("failed to edit telegram message: {0}")]
    Edit(String),

    /// The edit carried the same text and markup the message already has.
    #[error("message is not modified")]
    NotModified,

    /// Failed to delete a message.
    #[error("failed to delete telegram message: {0}")]
    Delete(String),

    /// Failed to answer a callback query.
    #[error("failed to answer callback query: {0}")]
    Callback(String),

    /// Failed to set a reaction.
    #[error("failed to set reaction: {0}")]
    Reaction(String),

    /// Failed to receive updates.
    #[error("failed to receive telegram updates: {0}")]
    Receive(String),
}
