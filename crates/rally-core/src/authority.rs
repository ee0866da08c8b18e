//! Who may cancel and resume a rally, and who counts as an admin.

use serde::{Deserialize, Serialize};

use rally_proto::Rally;

/// Who besides the initiator may cancel or resume a rally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelPolicy {
    /// Only the initiator.
    InitiatorOnly,
    /// The initiator and any configured admin.
    #[default]
    InitiatorOrAdmin,
}

/// Role checks shared by the engine, the keyboard and admin commands.
#[derive(Debug, Clone, Default)]
pub struct Authority {
    admins: Vec<String>,
    policy: CancelPolicy,
}

impl Authority {
    pub fn new(admins: Vec<String>, policy: CancelPolicy) -> Self {
        Self { admins, policy }
    }

    pub fn is_admin(&self, identity: &str) -> bool {
        !identity.is_empty() && self.admins.iter().any(|admin| admin == identity)
    }

    /// Whether `identity` may cancel or resume `rally`.
    pub fn can_manage(&self, rally: &Rally, identity: &str) -> bool {
        if identity.is_empty() {
            return false;
        }
        identity == rally.initiator
            || (self.policy == CancelPolicy::InitiatorOrAdmin && self.is_admin(identity))
    }
}
