//! # rally-proto
//!
//! Shared types and error definitions for the Rally sign-up bot.
//!
//! This crate provides the value types every other Rally crate speaks:
//! - [`Rally`] and [`Entry`], the decoded form of a sign-up message
//! - [`Action`], the opaque tokens carried by menu buttons
//! - [`ParseError`], raised when a message body is not a valid record
//! - Capacity constants shared by the engine and the command grammar

mod action;
mod error;
mod rally;

pub use action::{Action, UnknownAction};
pub use error::{MissingField, ParseError};
pub use rally::{Entry, ListKind, Rally};

/// Maximum number of slots one identity may hold across all lists.
pub const MAX_PLUS_FRIENDS: u32 = 4;

/// Smallest roster size accepted by the creation command.
pub const LIMIT_MIN: i64 = 2;

/// Largest roster size accepted by the creation command.
pub const LIMIT_MAX: i64 = 30;
