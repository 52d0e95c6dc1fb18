//! Coordinator startup configuration.
//!
//! The cache version tag, asset baseline, bypass markers, and notification
//! defaults are all configuration inputs, not compiled-in constants. The
//! values in [`SwConfig::default`] match the reference deployment.

use std::path::Path;

use queenclaw_common::{QueenClawError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Offline coordinator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwConfig {
    /// Origin that relative paths resolve against.
    pub origin: Url,

    /// Version tag naming the current cache generation.
    pub cache_version: String,

    /// Static asset baseline fetched and stored during install.
    pub precache: Vec<String>,

    /// URL substrings that bypass interception entirely.
    pub bypass_markers: Vec<String>,

    /// Body of the synthesized 503 offline response.
    pub offline_body: String,

    /// Notification display defaults.
    pub notifications: NotificationConfig,

    /// Outbound network settings.
    pub network: NetworkConfig,
}

/// Notification display defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Icon asset path.
    pub icon: String,

    /// Badge asset path.
    pub badge: String,

    /// Grouping tag applied when a push payload carries none.
    pub default_tag: String,
}

/// Outbound network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// User agent string.
    pub user_agent: String,
}

impl Default for SwConfig {
    fn default() -> Self {
        Self {
            origin: Url::parse("https://queenclaw.app").expect("static origin"),
            cache_version: "queenclaw-v1".to_string(),
            precache: vec![
                "/".to_string(),
                "/en".to_string(),
                "/zh".to_string(),
                "/icon-192x192.png".to_string(),
                "/icon-512x512.png".to_string(),
            ],
            bypass_markers: vec!["/api/".to_string(), "supabase.co".to_string()],
            offline_body: "Offline: QueenClaw needs a network connection for new content."
                .to_string(),
            notifications: NotificationConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            icon: "/icon-192x192.png".to_string(),
            badge: "/icon-192x192.png".to_string(),
            default_tag: "default".to_string(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("QueenClaw/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl SwConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| QueenClawError::config_with_source("invalid config file", e))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| QueenClawError::config_with_source("unserializable config", e))?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Resolve a path or absolute URL against the configured origin.
    pub fn resolve(&self, target: &str) -> Result<Url> {
        let resolved = if target.contains("://") {
            Url::parse(target)
        } else {
            self.origin.join(target)
        };
        resolved.map_err(|e| {
            QueenClawError::InvalidArgument(format!("unresolvable target {target}: {e}"))
        })
    }

    /// Check whether a URL must bypass the cache layer.
    pub fn bypasses(&self, url: &Url) -> bool {
        let raw = url.as_str();
        self.bypass_markers.iter().any(|marker| raw.contains(marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_baseline() {
        let config = SwConfig::default();
        assert!(config.precache.contains(&"/".to_string()));
        assert!(config.precache.contains(&"/en".to_string()));
        assert!(config.precache.contains(&"/zh".to_string()));
        assert_eq!(config.notifications.default_tag, "default");
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let config = SwConfig::default();

        let relative = config.resolve("/en/dashboard").unwrap();
        assert_eq!(relative.as_str(), "https://queenclaw.app/en/dashboard");

        let absolute = config.resolve("https://other.example/x").unwrap();
        assert_eq!(absolute.as_str(), "https://other.example/x");
    }

    #[test]
    fn test_bypass_markers() {
        let config = SwConfig::default();

        let api = Url::parse("https://queenclaw.app/api/feed").unwrap();
        assert!(config.bypasses(&api));

        let store = Url::parse("https://abc.supabase.co/rest/v1/posts").unwrap();
        assert!(config.bypasses(&store));

        let page = Url::parse("https://queenclaw.app/en").unwrap();
        assert!(!config.bypasses(&page));
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sw.json");

        let mut config = SwConfig::default();
        config.cache_version = "queenclaw-v9".to_string();
        config.save(&path).unwrap();

        let loaded = SwConfig::load(&path).unwrap();
        assert_eq!(loaded.cache_version, "queenclaw-v9");
        assert_eq!(loaded.precache, config.precache);
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(SwConfig::load(&path).is_err());
    }
}
