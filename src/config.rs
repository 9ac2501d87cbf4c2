//! Configuration types for forum-composer

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Forum endpoint and HTTP client settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForumConfig {
    /// Base URL the `*.php` endpoints are resolved against; a missing trailing
    /// slash is added
    /// (default: "https://forums.somethingawful.com/")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Attachment limits enforced locally before upload
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttachmentConfig {
    /// Whether the account may attach files at all (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Largest accepted file in bytes (default: 1 MiB)
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Widest accepted image in pixels (default: 1280)
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    /// Tallest accepted image in pixels (default: 1024)
    #[serde(default = "default_max_height")]
    pub max_height: u32,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_bytes: default_max_bytes(),
            max_width: default_max_width(),
            max_height: default_max_height(),
        }
    }
}

/// Composition session behaviour
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// How long a load failure stays on screen before the session cancels
    /// (default: 3 seconds)
    #[serde(default = "default_load_failure_delay", with = "duration_serde")]
    pub load_failure_delay: Duration,

    /// Characters of draft content shown in the use/discard prompt (default: 140)
    #[serde(default = "default_draft_preview_chars")]
    pub draft_preview_chars: usize,

    /// Capacity of the event broadcast channel (default: 64)
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            load_failure_delay: default_load_failure_delay(),
            draft_preview_chars: default_draft_preview_chars(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// Draft storage settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Database path (default: "forum-drafts.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Main configuration
///
/// Every section has defaults, so `{}` is a valid configuration document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Forum endpoint settings
    #[serde(default)]
    pub forum: ForumConfig,

    /// Attachment limits
    #[serde(default)]
    pub attachment: AttachmentConfig,

    /// Pipeline behaviour
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Draft storage
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Config {
    /// Parse a JSON configuration document and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.forum.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL '{}': {}", self.forum.base_url, e),
            key: Some("forum.base_url".to_string()),
        })?;

        if self.attachment.max_bytes == 0 {
            return Err(Error::Config {
                message: "attachment size limit must be positive".to_string(),
                key: Some("attachment.max_bytes".to_string()),
            });
        }
        if self.attachment.max_width == 0 || self.attachment.max_height == 0 {
            return Err(Error::Config {
                message: "attachment resolution limits must be positive".to_string(),
                key: Some("attachment.max_width".to_string()),
            });
        }
        if self.pipeline.event_capacity == 0 {
            return Err(Error::Config {
                message: "event channel capacity must be positive".to_string(),
                key: Some("pipeline.event_capacity".to_string()),
            });
        }

        Ok(())
    }
}

// Default value functions
fn default_base_url() -> String {
    "https://forums.somethingawful.com/".to_string()
}

fn default_user_agent() -> String {
    concat!("forum-composer/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_true() -> bool {
    true
}

fn default_max_bytes() -> u64 {
    1024 * 1024 // 1 MiB
}

fn default_max_width() -> u32 {
    1280
}

fn default_max_height() -> u32 {
    1024
}

fn default_load_failure_delay() -> Duration {
    Duration::from_secs(3)
}

fn default_draft_preview_chars() -> usize {
    140
}

fn default_event_capacity() -> usize {
    64
}

fn default_database_path() -> PathBuf {
    PathBuf::from("forum-drafts.db")
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config.attachment.max_bytes, 1024 * 1024);
        assert_eq!(config.pipeline.load_failure_delay, Duration::from_secs(3));
        assert_eq!(config.pipeline.draft_preview_chars, 140);
        assert!(config.attachment.enabled);
        assert_eq!(config.forum.base_url, "https://forums.somethingawful.com/");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config =
            Config::from_json(r#"{"attachment": {"max_width": 800}, "pipeline": {"load_failure_delay": 1}}"#)
                .unwrap();
        assert_eq!(config.attachment.max_width, 800);
        assert_eq!(config.attachment.max_height, 1024);
        assert_eq!(config.pipeline.load_failure_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let err = Config::from_json(r#"{"forum": {"base_url": "not a url"}}"#).unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("forum.base_url")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        let mut config = Config::default();
        config.attachment.max_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"persistence": {"database_path": "/tmp/drafts.db"}}"#).unwrap();

        let config = Config::from_json_file(&path).unwrap();
        assert_eq!(
            config.persistence.database_path,
            PathBuf::from("/tmp/drafts.db")
        );
    }
}
