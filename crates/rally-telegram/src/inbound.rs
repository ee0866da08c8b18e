//! Normalised inbound updates.
//!
//! The dispatcher only cares about two kinds of update: a text message in a
//! chat and a button press on one of our messages. Everything else is
//! dropped at the poller.

use teloxide::types::{Update, UpdateKind, User};

/// An update the dispatcher knows how to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A text message.
    Text {
        chat_id: i64,
        /// Forum topic the message was posted in, if any.
        thread_id: Option<i32>,
        message_id: i32,
        sender: String,
        text: String,
    },
    /// A press on an inline button attached to a message.
    Press {
        callback_id: String,
        chat_id: i64,
        message_id: i32,
        actor: String,
        data: String,
        /// Live text of the message the button is attached to.
        message_text: String,
    },
}

impl Inbound {
    /// Normalise a raw Telegram update. Returns `None` for updates the bot
    /// ignores: non-text messages, presses on inaccessible messages, edits,
    /// and so on.
    pub fn from_update(update: &Update) -> Option<Self> {
        match &update.kind {
            UpdateKind::Message(msg) => {
                let text = msg.text()?;
                let sender = msg.from.as_ref().map(display_name).unwrap_or_default();
                let thread_id = if msg.is_topic_message {
                    msg.thread_id.map(|thread| thread.0.0)
                } else {
                    None
                };
                Some(Inbound::Text {
                    chat_id: msg.chat.id.0,
                    thread_id,
                    message_id: msg.id.0,
                    sender,
                    text: text.trim().to_string(),
                })
            }
            UpdateKind::CallbackQuery(query) => {
                let message = query.regular_message()?;
                Some(Inbound::Press {
                    callback_id: query.id.clone(),
                    chat_id: message.chat.id.0,
                    message_id: message.id.0,
                    actor: display_name(&query.from),
                    data: query.data.clone().unwrap_or_default(),
                    message_text: message.text().unwrap_or_default().to_string(),
                })
            }
            _ => None,
        }
    }
}

/// The identity a user is recorded under in a rally.
pub fn display_name(user: &User) -> String {
    identity(
        user.username.as_deref(),
        &user.first_name,
        user.last_name.as_deref(),
    )
}

/// `@username` when set, otherwise `last first` trimmed.
pub fn identity(username: Option<&str>, first_name: &str, last_name: Option<&str>) -> String {
    match username {
        Some(username) if !username.is_empty() => format!("@{username}"),
        _ => format!("{} {}", last_name.unwrap_or_default(), first_name)
            .trim()
            .to_string(),
    }
}
