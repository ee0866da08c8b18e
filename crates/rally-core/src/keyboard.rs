//! Action menu attached to a rally message.
//!
//! Inline keyboards belong to the message, not to whoever looks at it, so
//! the engine always renders the menu as seen by the initiator.

use serde::Serialize;

use rally_proto::{Action, Rally};

use crate::authority::Authority;

pub const SIGN_UP_LABEL: &str = "✍️ Записаться ✍️";
pub const JOIN_WAITING_LABEL: &str = "⏳ В лист ожидания ⏳";
pub const UNSIGN_LABEL: &str = "🧽 Отписаться 🧽";
pub const PENCIL_LABEL: &str = "✏️ Карандашом ✏️";
pub const CANCEL_LABEL: &str = "❌ Отменить ❌";
pub const RESUME_LABEL: &str = "🔄 Возобновить 🔄";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub label: &'static str,
    pub action: Action,
}

impl Button {
    const fn new(label: &'static str, action: Action) -> Self {
        Self { label, action }
    }
}

/// Rows of buttons, top to bottom.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    fn push(&mut self, button: Button) {
        self.rows.push(vec![button]);
    }

    pub fn actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.rows.iter().flatten().map(|button| button.action)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Menu for `rally` as seen by `viewer`.
///
/// An active rally offers sign-up, unsign and pencil to everyone, plus
/// cancel to those allowed to manage it. Once the roster is full the
/// sign-up button says the press lands in the waiting list. A cancelled
/// rally offers only resume, and only to managers.
pub fn menu_for(rally: &Rally, viewer: &str, authority: &Authority) -> Keyboard {
    let mut keyboard = Keyboard::default();
    let manages = authority.can_manage(rally, viewer);

    if rally.cancelled {
        if manages {
            keyboard.push(Button::new(RESUME_LABEL, Action::Resume));
        }
        return keyboard;
    }

    let sign_up_label = if rally.has_room() {
        SIGN_UP_LABEL
    } else {
        JOIN_WAITING_LABEL
    };
    keyboard.push(Button::new(sign_up_label, Action::SignUp));
    keyboard.push(Button::new(UNSIGN_LABEL, Action::Unsign));
    keyboard.push(Button::new(PENCIL_LABEL, Action::SignUpPencil));
    if manages {
        keyboard.push(Button::new(CANCEL_LABEL, Action::Cancel));
    }
    keyboard
}
