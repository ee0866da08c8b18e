//! # rally-core
//!
//! The sign-up ledger behind the Rally bot.
//!
//! This crate provides:
//! - A text codec that treats a chat message body as the rally record
//! - Instance rules for guest slots (numbering, LIFO removal, FIFO promotion)
//! - A moderation store for bans, one-shot renames and delete-on-cancel
//! - The transition engine that applies one button press to one record
//! - The action menu policy and the creation/admin command grammars
//! - Configuration loading

mod authority;
pub mod codec;
mod command;
mod config;
mod engine;
pub mod instance;
mod keyboard;
mod moderation;
mod name_map;

pub use authority::{Authority, CancelPolicy};
pub use codec::{CANCEL_MARKER, decode, encode};
pub use command::{AdminCommand, CMD_USAGE, CommandError, CreateCommand};
pub use config::{ConfigError, RallyConfig};
pub use engine::{Engine, Notice, Outcome, Render};
pub use keyboard::{Button, Keyboard, menu_for};
pub use moderation::{InMemoryModeration, ModerationStore, scrub_banned};
pub use name_map::NameMap;
