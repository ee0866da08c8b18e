//! # rally-telegram
//!
//! Telegram transport for the Rally sign-up bot.
//!
//! - [`Inbound`]: the two update kinds the bot reacts to
//! - [`RallyHandler`]: turns one update into Bot API effects
//! - [`LiveText`]: the last text rendered into each rally message
//! - [`RallyDaemon`]: poller, bounded queue and single dispatcher
//! - [`TelegramService`]: token resolution and masking

mod bot;
pub mod commands;
pub mod daemon;
mod error;
mod handler;
mod inbound;
mod live_text;
mod service;

pub use bot::{BotApi, TelegramBot, inline_keyboard};
pub use daemon::RallyDaemon;
pub use error::{TelegramError, TelegramResult};
pub use handler::{REACTION_FAIL, REACTION_OK, RallyHandler};
pub use inbound::{Inbound, display_name, identity};
pub use live_text::{LiveText, MessageKey};
pub use service::{TOKEN_ENV_VARS, TelegramService};
