//! Grammars for the text commands: rally creation and admin moderation.

use thiserror::Error;

use rally_proto::{LIMIT_MAX, LIMIT_MIN, Rally};

use crate::moderation::ModerationStore;

pub const CMD_USAGE: &str = "Используйте /сбор <название> <лимит> <дата> [время]";

/// A creation command that failed its grammar. The display text is what
/// the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("{}", CMD_USAGE)]
    Usage,

    #[error("Лимит должен быть от {} до {}", LIMIT_MIN, LIMIT_MAX)]
    LimitOutOfRange(i64),
}

/// A parsed `<prefix> <name...> <limit> <date...>` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCommand {
    pub name: String,
    pub limit: usize,
    pub date: String,
}

impl CreateCommand {
    /// Parse the full command text, prefix included.
    ///
    /// The limit is the rightmost integer token that still leaves at least
    /// one date word after it; at least one name word must precede it.
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() < 4 {
            return Err(CommandError::Usage);
        }

        let (limit_idx, limit) = (1..=words.len() - 2)
            .rev()
            .find_map(|i| words[i].parse::<i64>().ok().map(|n| (i, n)))
            .ok_or(CommandError::Usage)?;
        if limit_idx < 2 {
            return Err(CommandError::Usage);
        }

        let name = words[1..limit_idx].join(" ");
        let date = words[limit_idx + 1..].join(" ");

        if !(LIMIT_MIN..=LIMIT_MAX).contains(&limit) {
            return Err(CommandError::LimitOutOfRange(limit));
        }
        let limit = usize::try_from(limit).map_err(|_| CommandError::LimitOutOfRange(limit))?;

        Ok(Self { name, limit, date })
    }

    /// The empty rally this command creates.
    pub fn into_rally(self, initiator: &str) -> Rally {
        Rally::new(self.name, self.date, self.limit, initiator)
    }
}

/// A moderation command issued by an admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Rename { old: String, new: String },
    Ban(String),
    Unban(String),
    Clear,
    ArmDelete,
}

impl AdminCommand {
    /// Parse text that starts with `prefix`. Returns `None` when the
    /// command is malformed or unknown.
    pub fn parse(text: &str, prefix: &str) -> Option<Self> {
        let body = text.trim().strip_prefix(prefix)?.trim();
        let (verb, rest) = match body.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (body, ""),
        };

        match verb {
            "rn" => {
                let (old, new) = rest.split_once("||")?;
                let old = old.trim();
                if old.is_empty() {
                    return None;
                }
                Some(AdminCommand::Rename {
                    old: old.to_string(),
                    new: new.trim().to_string(),
                })
            }
            "ban" if !rest.is_empty() => Some(AdminCommand::Ban(rest.to_string())),
            "unban" if !rest.is_empty() => Some(AdminCommand::Unban(rest.to_string())),
            "clear" => Some(AdminCommand::Clear),
            "delete" => Some(AdminCommand::ArmDelete),
            _ => None,
        }
    }

    pub fn apply(&self, store: &dyn ModerationStore) {
        match self {
            AdminCommand::Rename { old, new } => store.set_rename(old, new),
            AdminCommand::Ban(identity) => {
                store.ban(identity);
            }
            AdminCommand::Unban(identity) => {
                store.unban(identity);
            }
            AdminCommand::Clear => store.clear(),
            AdminCommand::ArmDelete => store.arm_delete_on_cancel(),
        }
    }
}
