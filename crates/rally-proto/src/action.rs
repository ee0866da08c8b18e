use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A button press on a rally message.
///
/// The string form is the callback payload attached to the inline button,
/// so it must stay stable across releases: old messages keep their buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    SignUp,
    Unsign,
    SignUpPencil,
    Cancel,
    Resume,
}

impl Action {
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::SignUp => "sign_up",
            Action::Unsign => "unsign",
            Action::SignUpPencil => "sign_up_pencil",
            Action::Cancel => "cancel",
            Action::Resume => "resume",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback payload that does not name any known [`Action`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action: {0:?}")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sign_up" => Ok(Action::SignUp),
            "unsign" => Ok(Action::Unsign),
            "sign_up_pencil" => Ok(Action::SignUpPencil),
            "cancel" => Ok(Action::Cancel),
            "resume" => Ok(Action::Resume),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payloads_parse_back_to_the_same_action() {
        for action in [
            Action::SignUp,
            Action::Unsign,
            Action::SignUpPencil,
            Action::Cancel,
            Action::Resume,
        ] {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn unknown_payload_is_rejected() {
        let err = "join".parse::<Action>().unwrap_err();
        assert_eq!(err, UnknownAction("join".to_string()));
    }

    #[test]
    fn serde_uses_callback_names() {
        let json = serde_json::to_string(&Action::SignUpPencil).unwrap();
        assert_eq!(json, "\"sign_up_pencil\"");
    }
}
