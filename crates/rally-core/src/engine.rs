//! The transition engine.
//!
//! Every button press is handled the same way: decode the live message
//! text, apply exactly one mutation, scrub banned identities, re-encode,
//! and report whether the message needs editing. The engine holds no
//! rally between presses; callers must feed it presses one at a time so
//! two transitions never start from the same text.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use rally_proto::{Action, ListKind, MAX_PLUS_FRIENDS, ParseError, Rally};

use crate::authority::Authority;
use crate::codec;
use crate::config::RallyConfig;
use crate::instance::{
    add_instance, can_add_instance, is_plain_identity, lowest_pencil_instance,
    remove_highest_instance, seat,
};
use crate::keyboard::{Keyboard, menu_for};
use crate::moderation::{ModerationStore, scrub_banned};
use crate::name_map::NameMap;

/// What should happen to the message after a press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Render {
    /// The re-encoded text equals the live text; leave the message alone.
    Unchanged,
    /// Replace the message text and keyboard.
    Edit { text: String, keyboard: Keyboard },
    /// Delete the message; the rally ceases to exist.
    Delete,
}

/// The acknowledgement shown to the presser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Silent,
    CapReached,
    Cancelled,
    Resumed,
    Deleted,
}

impl Notice {
    /// Callback answer text, or `None` for a silent acknowledgement.
    pub fn text(self) -> Option<String> {
        match self {
            Notice::Silent => None,
            Notice::CapReached => Some(format!(
                "Максимум {MAX_PLUS_FRIENDS} друзей уже записано"
            )),
            Notice::Cancelled => Some("Сбор отменён".to_string()),
            Notice::Resumed => Some("Сбор возобновлён".to_string()),
            Notice::Deleted => Some("Сообщение удалено".to_string()),
        }
    }
}

/// Result of one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub render: Render,
    pub notice: Notice,
}

impl Outcome {
    fn ignored() -> Self {
        Self {
            render: Render::Unchanged,
            notice: Notice::Silent,
        }
    }
}

pub struct Engine {
    moderation: Arc<dyn ModerationStore>,
    authority: Authority,
    ignore_banned_actors: bool,
    name_map_path: Option<PathBuf>,
    name_map: OnceLock<NameMap>,
}

impl Engine {
    pub fn new(moderation: Arc<dyn ModerationStore>, authority: Authority) -> Self {
        Self {
            moderation,
            authority,
            ignore_banned_actors: true,
            name_map_path: None,
            name_map: OnceLock::new(),
        }
    }

    pub fn from_config(config: &RallyConfig, moderation: Arc<dyn ModerationStore>) -> Self {
        let mut engine = Self::new(moderation, config.authority())
            .with_ignore_banned_actors(config.ignore_banned_actors);
        engine.name_map_path.clone_from(&config.name_map_path);
        engine
    }

    /// Whether presses from banned identities are dropped before decoding.
    #[must_use]
    pub fn with_ignore_banned_actors(mut self, ignore: bool) -> Self {
        self.ignore_banned_actors = ignore;
        self
    }

    /// Use the `old:new` file at `path` when resuming. Read on first use.
    #[must_use]
    pub fn with_name_map(mut self, path: PathBuf) -> Self {
        self.name_map_path = Some(path);
        self
    }

    pub fn moderation(&self) -> &dyn ModerationStore {
        self.moderation.as_ref()
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Text and menu for a freshly created rally.
    pub fn render(&self, rally: &Rally) -> (String, Keyboard) {
        (
            codec::encode(rally),
            menu_for(rally, &rally.initiator, &self.authority),
        )
    }

    /// Apply `action` by `actor` to the rally encoded in `current`.
    ///
    /// A `ParseError` means the message is not a rally; nothing changes.
    pub fn apply(&self, actor: &str, action: Action, current: &str) -> Result<Outcome, ParseError> {
        if actor.is_empty() {
            debug!(%action, "ignoring press without identity");
            return Ok(Outcome::ignored());
        }
        if self.ignore_banned_actors && self.moderation.is_banned(actor) {
            debug!(actor, %action, "ignoring press from banned identity");
            return Ok(Outcome::ignored());
        }

        let mut text = current.to_string();
        if self.moderation.consume_renames(&mut text) {
            info!(actor, "applied pending rename");
        }
        let mut rally = codec::decode(&text)?;

        let notice = match action {
            Action::SignUp | Action::Unsign | Action::SignUpPencil if rally.cancelled => {
                debug!(actor, %action, "press on cancelled rally");
                Notice::Silent
            }
            Action::SignUp => sign_up(&mut rally, actor),
            Action::Unsign => {
                if let Some(entry) = remove_highest_instance(&mut rally, actor) {
                    debug!(actor, %entry, "unsigned");
                }
                Notice::Silent
            }
            Action::SignUpPencil => sign_up_pencil(&mut rally, actor),
            Action::Cancel => {
                if !self.authority.can_manage(&rally, actor) {
                    debug!(actor, "unauthorized cancel");
                    Notice::Silent
                } else if self.authority.is_admin(actor) && self.moderation.take_delete_on_cancel()
                {
                    info!(actor, name = %rally.name, "deleting rally on cancel");
                    return Ok(Outcome {
                        render: Render::Delete,
                        notice: Notice::Deleted,
                    });
                } else {
                    info!(actor, name = %rally.name, "rally cancelled");
                    rally.cancelled = true;
                    Notice::Cancelled
                }
            }
            Action::Resume => {
                if !self.authority.can_manage(&rally, actor) || !rally.cancelled {
                    debug!(actor, cancelled = rally.cancelled, "resume ignored");
                    Notice::Silent
                } else {
                    info!(actor, name = %rally.name, "rally resumed");
                    rally = self.resume(&text, rally);
                    Notice::Resumed
                }
            }
        };

        Ok(self.finish(rally, current, notice))
    }

    /// Rebuild an active rally from the cancelled text.
    fn resume(&self, text: &str, fallback: Rally) -> Rally {
        let body = codec::strip_cancel_marker(text);
        let body = match self.name_map() {
            Some(map) => map.apply(body),
            None => body.to_string(),
        };
        let mut rally = codec::decode(&body).unwrap_or_else(|e| {
            warn!(error = %e, "resumed text no longer decodes, keeping previous record");
            fallback
        });
        rally.cancelled = false;
        rally
    }

    fn name_map(&self) -> Option<&NameMap> {
        let path = self.name_map_path.as_ref()?;
        Some(self.name_map.get_or_init(|| match NameMap::load(path) {
            Ok(map) => {
                info!(path = %path.display(), entries = map.len(), "loaded display-name map");
                map
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load display-name map");
                NameMap::default()
            }
        }))
    }

    fn finish(&self, mut rally: Rally, current: &str, notice: Notice) -> Outcome {
        for kind in ListKind::SCAN_ORDER {
            scrub_banned(rally.list_mut(kind), self.moderation.as_ref());
        }

        let text = codec::encode(&rally);
        let render = if same_text(&text, current) {
            Render::Unchanged
        } else {
            Render::Edit {
                keyboard: menu_for(&rally, &rally.initiator, &self.authority),
                text,
            }
        };
        Outcome { render, notice }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("authority", &self.authority)
            .field("ignore_banned_actors", &self.ignore_banned_actors)
            .field("name_map_path", &self.name_map_path)
            .finish_non_exhaustive()
    }
}

/// Telegram drops trailing whitespace from message text.
fn same_text(rendered: &str, current: &str) -> bool {
    rendered.trim_end() == current.trim_end()
}

fn sign_up(rally: &mut Rally, actor: &str) -> Notice {
    if !is_plain_identity(actor) {
        debug!(actor, "identity cannot own an entry");
        return Notice::Silent;
    }
    if let Some(idx) = lowest_pencil_instance(rally, actor) {
        let entry = rally.penciled_in.remove(idx);
        let kind = seat(rally, entry);
        debug!(actor, ?kind, "promoted pencil instance");
        return Notice::Silent;
    }

    if !can_add_instance(rally, actor) {
        debug!(actor, "instance cap reached");
        return Notice::CapReached;
    }
    let target = if rally.has_room() {
        ListKind::Signed
    } else {
        ListKind::Waiting
    };
    add_instance(rally, target, actor);
    debug!(actor, ?target, "signed up");
    Notice::Silent
}

fn sign_up_pencil(rally: &mut Rally, actor: &str) -> Notice {
    if !is_plain_identity(actor) {
        debug!(actor, "identity cannot own an entry");
        return Notice::Silent;
    }
    if !can_add_instance(rally, actor) {
        debug!(actor, "instance cap reached");
        return Notice::CapReached;
    }
    add_instance(rally, ListKind::Pencil, actor);
    Notice::Silent
}
