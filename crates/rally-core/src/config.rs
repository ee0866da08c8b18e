//! Bot configuration loaded from `rally.yml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::authority::{Authority, CancelPolicy};

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration. Every field has a default, so an absent file
/// is equivalent to an empty one.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RallyConfig {
    /// Bot token; falls back to environment variables when absent.
    pub bot_token: Option<String>,

    /// Identities with admin rights.
    pub admins: Vec<String>,

    /// Whether admins may cancel and resume rallies they did not start.
    pub cancel_policy: CancelPolicy,

    /// Drop button presses from banned identities before decoding.
    pub ignore_banned_actors: bool,

    /// Command prefixes that create a rally.
    pub creation_prefixes: Vec<String>,

    /// Command prefix for admin commands.
    pub admin_prefix: String,

    /// Optional `old:new` display-name map applied on resume.
    pub name_map_path: Option<PathBuf>,

    /// Long-poll wait passed to `getUpdates`. Must stay below the HTTP
    /// client timeout (17s).
    pub poll_timeout_secs: u32,

    /// Capacity of the inbound update queue.
    pub queue_capacity: usize,
}

impl Default for RallyConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            admins: vec!["@BulatHD".to_string()],
            cancel_policy: CancelPolicy::default(),
            ignore_banned_actors: true,
            creation_prefixes: vec!["/сбор".to_string(), "/party".to_string()],
            admin_prefix: "/sudo".to_string(),
            name_map_path: None,
            poll_timeout_secs: 10,
            queue_capacity: 256,
        }
    }
}

impl std::fmt::Debug for RallyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RallyConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "****"))
            .field("admins", &self.admins)
            .field("cancel_policy", &self.cancel_policy)
            .field("ignore_banned_actors", &self.ignore_banned_actors)
            .field("creation_prefixes", &self.creation_prefixes)
            .field("admin_prefix", &self.admin_prefix)
            .field("name_map_path", &self.name_map_path)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("queue_capacity", &self.queue_capacity)
            .finish()
    }
}

impl RallyConfig {
    /// Load configuration from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid("admin_prefix must not be empty".into()));
        }
        if self.creation_prefixes.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "creation_prefixes must not contain empty entries".into(),
            ));
        }
        if self.poll_timeout_secs >= 17 {
            return Err(ConfigError::Invalid(
                "poll_timeout_secs must be below 17".into(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid("queue_capacity must be positive".into()));
        }
        Ok(())
    }

    pub fn authority(&self) -> Authority {
        Authority::new(self.admins.clone(), self.cancel_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = RallyConfig::load(&dir.path().join("rally.yml")).unwrap();
        assert_eq!(config.admin_prefix, "/sudo");
        assert_eq!(config.cancel_policy, CancelPolicy::InitiatorOrAdmin);
        assert!(config.ignore_banned_actors);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rally.yml");
        std::fs::write(
            &path,
            "admins: [\"@boss\"]\ncancel_policy: initiator_only\nname_map_path: names.txt\n",
        )
        .unwrap();

        let config = RallyConfig::load(&path).unwrap();
        assert_eq!(config.admins, vec!["@boss".to_string()]);
        assert_eq!(config.cancel_policy, CancelPolicy::InitiatorOnly);
        assert_eq!(config.name_map_path, Some(PathBuf::from("names.txt")));
        assert_eq!(config.poll_timeout_secs, 10);
    }

    #[test]
    fn malformed_yaml_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rally.yml");
        std::fs::write(&path, "admins: {unclosed").unwrap();
        assert!(matches!(
            RallyConfig::load(&path),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn zero_queue_capacity_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rally.yml");
        std::fs::write(&path, "queue_capacity: 0\n").unwrap();
        assert!(matches!(
            RallyConfig::load(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn debug_masks_token() {
        let config = RallyConfig {
            bot_token: Some("123456:secret".to_string()),
            ..RallyConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
    }
}
