use const_format::concatcp;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, ValidateModel, ValidationError};

pub const CACHE_PREFIX: &str = "calistenia-app-cache";
/// Bump this whenever the asset manifest changes. Activation of the new worker
/// deletes every cache generation with a different name
pub const CACHE_VERSION: u32 = 1;
pub const CACHE_NAME: &str = concatcp!(CACHE_PREFIX, "-v", CACHE_VERSION);

pub const ENTRY_DOCUMENT: &str = "./index.html";

const PLACEHOLDER_BASE: &str = "https://placehold.co";
const PLACEHOLDER_COLOURS: &str = "18181b/ffffff?text=APP";
pub const ICON_192: &str = concatcp!(PLACEHOLDER_BASE, "/192x192/", PLACEHOLDER_COLOURS);
pub const ICON_512: &str = concatcp!(PLACEHOLDER_BASE, "/512x512/", PLACEHOLDER_COLOURS);
pub const BADGE_48: &str = concatcp!(PLACEHOLDER_BASE, "/48x48/", PLACEHOLDER_COLOURS);

const CDNJS: &str = "https://cdnjs.cloudflare.com/ajax/libs";

/// Precached on install
///
/// Cross-origin entries may be stored as opaque responses or fail the whole
/// batch depending on the host's CORS policy
pub const ASSETS: &[&str] = &[
    "./",
    ENTRY_DOCUMENT,
    "./manifest.json",
    "https://cdn.tailwindcss.com",
    concatcp!(CDNJS, "/react/18.2.0/umd/react.production.min.js"),
    concatcp!(CDNJS, "/react-dom/18.2.0/umd/react-dom.production.min.js"),
    concatcp!(CDNJS, "/tone/15.1.22/Tone.min.js"),
    "https://fonts.googleapis.com/css2?family=Inter:wght@400;600;700;800;900&display=swap",
    ICON_192,
    ICON_512,
];

pub const NOTIFICATION_TITLE: &str = "Calistenia App";
pub const NOTIFICATION_BODY: &str = "Tu entrenamiento continua!";
/// Shared by every push notification so a new one replaces the last
pub const NOTIFICATION_TAG: &str = "workout-notification";

/// Everything the agent needs to know about the app it serves
///
/// Fixed for the lifetime of one worker version. Every field has a default so
/// a partial (or empty) json document is valid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Name of the current cache generation
    pub cache_name: String,
    pub assets: Vec<String>,
    /// Opened when a notification is clicked and no app window is open
    pub entry_document: String,
    pub notification: NotificationDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    /// Alert again when a notification replaces one with the same tag
    pub renotify: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            cache_name: CACHE_NAME.to_string(),
            assets: ASSETS.iter().map(|a| a.to_string()).collect(),
            entry_document: ENTRY_DOCUMENT.to_string(),
            notification: NotificationDefaults::default(),
        }
    }
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            body: NOTIFICATION_BODY.to_string(),
            icon: ICON_192.to_string(),
            badge: BADGE_48.to_string(),
            tag: NOTIFICATION_TAG.to_string(),
            renotify: true,
        }
    }
}

impl AgentConfig {
    /// Parses and validates a json config
    pub fn from_json(json: &str) -> Result<Self, AgentError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ValidationError {
            error_messages: vec![format!("config is not valid json: {e}")],
        })?;
        config.validate()?;
        Ok(config)
    }
}

impl ValidateModel for AgentConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut error_messages = Vec::new();

        if self.cache_name.trim().is_empty() {
            error_messages.push("cache_name must not be empty".to_string());
        }
        if self.entry_document.trim().is_empty() {
            error_messages.push("entry_document must not be empty".to_string());
        }
        for (i, asset) in self.assets.iter().enumerate() {
            if asset.trim().is_empty() {
                error_messages.push(format!("assets[{i}] must not be empty"));
            }
        }
        if self.notification.title.is_empty() {
            error_messages.push("notification.title must not be empty".to_string());
        }
        if self.notification.tag.is_empty() {
            error_messages.push("notification.tag must not be empty".to_string());
        }

        if error_messages.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { error_messages })
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cache_name_is_versioned() {
        assert_eq!(CACHE_NAME, "calistenia-app-cache-v1");
    }

    #[test]
    fn test_default_manifest() {
        let config = AgentConfig::default();
        assert_eq!(config.assets.len(), 10);
        assert_eq!(config.assets[0], "./");
        assert_eq!(config.assets[1], "./index.html");
        assert_eq!(
            config.assets[4],
            "https://cdnjs.cloudflare.com/ajax/libs/react/18.2.0/umd/react.production.min.js"
        );
        assert_eq!(config.assets[9], "https://placehold.co/512x512/18181b/ffffff?text=APP");
        assert_eq!(config.notification.badge, "https://placehold.co/48x48/18181b/ffffff?text=APP");
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let json = r#"{ "cache_name": "app-v2", "notification": { "renotify": false } }"#;
        let config = AgentConfig::from_json(json).unwrap();

        assert_eq!(config.cache_name, "app-v2");
        assert_eq!(config.assets, AgentConfig::default().assets);
        assert_eq!(config.notification.title, NOTIFICATION_TITLE);
        assert!(!config.notification.renotify);
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(AgentConfig::from_json("{}").unwrap(), AgentConfig::default());
    }

    #[test]
    fn test_validation_collects_all_problems() {
        let json = r#"{ "cache_name": " ", "assets": ["./", ""], "entry_document": "" }"#;
        let err = AgentConfig::from_json(json).unwrap_err();

        let AgentError::Validation(ValidationError { error_messages }) = &err else {
            panic!("expected a validation error, got {err:?}");
        };
        assert_eq!(
            *error_messages,
            vec![
                "cache_name must not be empty",
                "entry_document must not be empty",
                "assets[1] must not be empty",
            ]
        );
    }

    #[test]
    fn test_malformed_json_is_a_validation_error() {
        assert!(matches!(AgentConfig::from_json("{"), Err(AgentError::Validation(_))));
    }
}
