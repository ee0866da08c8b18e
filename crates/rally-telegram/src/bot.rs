use async_trait::async_trait;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use rally_core::Keyboard;

use crate::error::{TelegramError, TelegramResult};

/// Trait abstracting Telegram bot operations for testability.
///
/// Production code uses [`TelegramBot`]; tests can provide a mock implementation.
/// Every call is awaited to completion before the dispatcher takes the next
/// update; failures are reported, never retried.
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Send a plain-text message, optionally into a forum topic and with an
    /// inline keyboard.
    ///
    /// Returns the Telegram message ID of the sent message.
    async fn send_message(
        &self,
        chat_id: i64,
        thread_id: Option<i32>,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> TelegramResult<i32>;

    /// Replace the text and keyboard of an existing message.
    ///
    /// Returns [`TelegramError::NotModified`] when nothing would change.
    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        keyboard: &Keyboard,
    ) -> TelegramResult<()>;

    /// Delete a message.
    async fn delete_message(&self, chat_id: i64, message_id: i32) -> TelegramResult<()>;

    /// Acknowledge a button press, with an optional toast text.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> TelegramResult<()>;

    /// React to a message with a single emoji.
    async fn set_reaction(&self, chat_id: i64, message_id: i32, emoji: &str)
    -> TelegramResult<()>;
}

/// Wraps a `teloxide::Bot`.
pub struct TelegramBot {
    bot: teloxide::Bot,
}

impl TelegramBot {
    /// Create a new TelegramBot from a bot token.
    pub fn new(token: &str) -> Self {
        Self {
            bot: teloxide::Bot::new(token),
        }
    }

    /// The underlying teloxide client, for polling.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }

    /// Resolve the bot's own username; doubles as a token check.
    pub async fn username(&self) -> TelegramResult<String> {
        use teloxide::prelude::*;

        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| TelegramError::Startup(e.to_string()))?;
        Ok(me.user.username.clone().unwrap_or_default())
    }
}

/// Convert a rally menu into a Telegram inline keyboard.
///
/// The callback payload of each button is the action's wire name.
pub fn inline_keyboard(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.label, button.action.as_str()))
            .collect::<Vec<_>>()
    }))
}

#[async_trait]
impl BotApi for TelegramBot {
    async fn send_message(
        &self,
        chat_id: i64,
        thread_id: Option<i32>,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> TelegramResult<i32> {
        use teloxide::payloads::SendMessageSetters;
        use teloxide::prelude::*;
        use teloxide::types::{MessageId, ThreadId};

        let mut request = self
            .bot
            .send_message(teloxide::types::ChatId(chat_id), text);
        if let Some(thread) = thread_id {
            request = request.message_thread_id(ThreadId(MessageId(thread)));
        }
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(inline_keyboard(keyboard));
        }

        let result = request
            .await
            .map_err(|e| TelegramError::Send(e.to_string()))?;

        Ok(result.id.0)
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        keyboard: &Keyboard,
    ) -> TelegramResult<()> {
        use teloxide::payloads::EditMessageTextSetters;
        use teloxide::prelude::*;
        use teloxide::types::MessageId;
        use teloxide::{ApiError, RequestError};

        let result = self
            .bot
            .edit_message_text(
                teloxide::types::ChatId(chat_id),
                MessageId(message_id),
                text,
            )
            .reply_markup(inline_keyboard(keyboard))
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(RequestError::Api(ApiError::MessageNotModified)) => Err(TelegramError::NotModified),
            Err(e) => Err(TelegramError::Edit(e.to_string())),
        }
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> TelegramResult<()> {
        use teloxide::prelude::*;
        use teloxide::types::MessageId;

        self.bot
            .delete_message(teloxide::types::ChatId(chat_id), MessageId(message_id))
            .await
            .map_err(|e| TelegramError::Delete(e.to_string()))?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> TelegramResult<()> {
        use teloxide::payloads::AnswerCallbackQuerySetters;
        use teloxide::prelude::*;

        let mut request = self.bot.answer_callback_query(callback_id.to_string());
        if let Some(text) = text {
            request = request.text(text);
        }
        request
            .await
            .map_err(|e| TelegramError::Callback(e.to_string()))?;
        Ok(())
    }

    async fn set_reaction(
        &self,
        chat_id: i64,
        message_id: i32,
        emoji: &str,
    ) -> TelegramResult<()> {
        use teloxide::payloads::SetMessageReactionSetters;
        use teloxide::prelude::*;
        use teloxide::types::{MessageId, ReactionType};

        self.bot
            .set_message_reaction(teloxide::types::ChatId(chat_id), MessageId(message_id))
            .reaction(vec![ReactionType::Emoji {
                emoji: emoji.to_string(),
            }])
            .await
            .map_err(|e| TelegramError::Reaction(e.to_string()))?;
        Ok(())
    }
}
