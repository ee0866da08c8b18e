use std::fmt;

use crate::bot::TelegramBot;
use crate::error::{TelegramError, TelegramResult};

/// Environment variables consulted, in order, when the config has no token.
pub const TOKEN_ENV_VARS: [&str; 2] = ["RALLY_TELEGRAM_BOT_TOKEN", "TELEGRAM_APITOKEN"];

/// Holds the resolved bot credentials.
pub struct TelegramService {
    bot_token: String,
    poll_timeout_secs: u32,
}

impl TelegramService {
    /// Create a new TelegramService.
    ///
    /// Resolves the bot token from config or from the variables in
    /// [`TOKEN_ENV_VARS`].
    pub fn new(bot_token: Option<String>, poll_timeout_secs: u32) -> TelegramResult<Self> {
        let resolved_token = bot_token
            .filter(|token| !token.trim().is_empty())
            .or_else(|| {
                TOKEN_ENV_VARS
                    .iter()
                    .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
            })
            .ok_or(TelegramError::MissingBotToken)?;

        Ok(Self {
            bot_token: resolved_token,
            poll_timeout_secs,
        })
    }

    /// Long-poll wait passed to `getUpdates`.
    pub fn poll_timeout_secs(&self) -> u32 {
        self.poll_timeout_secs
    }

    /// A client for the resolved token.
    pub fn bot(&self) -> TelegramBot {
        TelegramBot::new(&self.bot_token)
    }

    /// Get a reference to the bot token (masked for logging).
    pub fn bot_token_masked(&self) -> String {
        if self.bot_token.len() > 8 && self.bot_token.is_ascii() {
            format!(
                "{}...{}",
                &self.bot_token[..4],
                &self.bot_token[self.bot_token.len() - 4..]
            )
        } else {
            "****".to_string()
        }
    }
}

impl fmt::Debug for TelegramService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramService")
            .field("bot_token", &self.bot_token_masked())
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}
