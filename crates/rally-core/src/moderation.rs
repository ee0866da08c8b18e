//! Process-wide moderation state: bans, one-shot renames, and the
//! one-shot delete-on-cancel flag.
//!
//! The store is the only state touched outside the sequential action
//! path (admin commands may arrive from any chat), so each piece sits
//! behind its own reader/writer lock and every critical section is a
//! single operation.

use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock};

use rally_proto::Entry;

/// Moderation state consulted by the transition engine.
pub trait ModerationStore: Send + Sync {
    /// True when `identity` is banned.
    fn is_banned(&self, identity: &str) -> bool;

    /// Ban `identity`. Returns `false` if it was already banned.
    fn ban(&self, identity: &str) -> bool;

    /// Lift a ban. Returns `false` if `identity` was not banned.
    fn unban(&self, identity: &str) -> bool;

    /// Register a one-shot textual rename `old → new`.
    fn set_rename(&self, old: &str, new: &str);

    /// Apply and delete every rename whose `old` text occurs in `text`.
    ///
    /// Contains-check, substitution and deletion happen under one write
    /// lock, so a mapping is applied at most once across all callers.
    fn consume_renames(&self, text: &mut String) -> bool;

    /// Arm the one-shot delete-on-cancel flag.
    fn arm_delete_on_cancel(&self);

    /// Disarm the delete-on-cancel flag, returning whether it was armed.
    fn take_delete_on_cancel(&self) -> bool;

    /// Drop all bans and all pending renames.
    fn clear(&self);
}

/// Drop every entry whose owner is banned. Opaque entries are kept.
pub fn scrub_banned(list: &mut Vec<Entry>, store: &dyn ModerationStore) {
    list.retain(|entry| {
        entry
            .owner()
            .is_none_or(|(identity, _)| !store.is_banned(identity))
    });
}

/// In-memory [`ModerationStore`], created once at startup and shared.
#[derive(Debug, Default)]
pub struct InMemoryModeration {
    bans: RwLock<BTreeSet<String>>,
    renames: RwLock<Vec<(String, String)>>,
    delete_on_cancel: RwLock<bool>,
}

impl InMemoryModeration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current ban set, sorted.
    pub fn banned(&self) -> Vec<String> {
        self.bans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Snapshot of pending renames, in registration order.
    pub fn pending_renames(&self) -> Vec<(String, String)> {
        self.renames
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ModerationStore for InMemoryModeration {
    fn is_banned(&self, identity: &str) -> bool {
        self.bans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(identity)
    }

    fn ban(&self, identity: &str) -> bool {
        self.bans
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.to_string())
    }

    fn unban(&self, identity: &str) -> bool {
        self.bans
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(identity)
    }

    fn set_rename(&self, old: &str, new: &str) {
        let mut renames = self.renames.write().unwrap_or_else(PoisonError::into_inner);
        match renames.iter_mut().find(|(existing, _)| existing == old) {
            Some((_, target)) => *target = new.to_string(),
            None => renames.push((old.to_string(), new.to_string())),
        }
    }

    fn consume_renames(&self, text: &mut String) -> bool {
        let mut renames = self.renames.write().unwrap_or_else(PoisonError::into_inner);
        let mut changed = false;
        renames.retain(|(old, new)| {
            if old.is_empty() || !text.contains(old.as_str()) {
                return true;
            }
            *text = text.replace(old.as_str(), new);
            changed = true;
            false
        });
        changed
    }

    fn arm_delete_on_cancel(&self) {
        *self
            .delete_on_cancel
            .write()
            .unwrap_or_else(PoisonError::into_inner) = true;
    }

    fn take_delete_on_cancel(&self) -> bool {
        std::mem::take(
            &mut *self
                .delete_on_cancel
                .write()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    fn clear(&self) {
        self.bans
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.renames
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
