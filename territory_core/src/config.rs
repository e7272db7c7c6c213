//! Configuration for the tile feed.
//!
//! Loaded from `feed_config.json` with support for environment variable overrides.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

pub const BUILTIN_FEED_CONFIG: &str = include_str!("data/feed_config.json");

pub const CONFIG_PATH_ENV: &str = "TERRITORY_CONFIG_PATH";
pub const ENDPOINT_ENV: &str = "TERRITORY_API_URL";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// URL answering `GET` with the tile map.
    pub endpoint: String,
    /// Heading shown above the board.
    pub title: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/api/tiles".to_string(),
            title: "Tile Board".to_string(),
        }
    }
}

impl FeedConfig {
    pub fn builtin() -> Self {
        serde_json::from_str(BUILTIN_FEED_CONFIG).expect("builtin feed config should parse")
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, FeedConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| FeedConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = FeedConfig::from_json_str(&contents)?;
        Ok(config)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Debug, Error)]
pub enum FeedConfigError {
    #[error("failed to parse feed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read feed config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Metadata about where the active configuration came from.
#[derive(Debug, Clone, Default)]
pub struct FeedConfigMetadata {
    path: Option<PathBuf>,
    endpoint_overridden: bool,
}

impl FeedConfigMetadata {
    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    pub fn endpoint_overridden(&self) -> bool {
        self.endpoint_overridden
    }
}

/// Resolve the configuration from an optional file and an optional endpoint.
///
/// A file that fails to load is logged and replaced by the builtin config.
pub fn load_feed_config(
    path: Option<&Path>,
    endpoint_override: Option<String>,
) -> (FeedConfig, FeedConfigMetadata) {
    let mut metadata = FeedConfigMetadata::default();

    let mut config = match path {
        Some(path) => match FeedConfig::from_file(path) {
            Ok(config) => {
                tracing::info!(
                    target: "territory::config",
                    path = %path.display(),
                    "feed_config.loaded=file"
                );
                metadata.path = Some(path.to_path_buf());
                config
            }
            Err(err) => {
                tracing::warn!(
                    target: "territory::config",
                    path = %path.display(),
                    error = %err,
                    "feed_config.load_failed"
                );
                FeedConfig::builtin()
            }
        },
        None => {
            tracing::info!(target: "territory::config", "feed_config.loaded=builtin");
            FeedConfig::builtin()
        }
    };

    if let Some(endpoint) = endpoint_override.filter(|value| !value.trim().is_empty()) {
        tracing::info!(
            target: "territory::config",
            endpoint = %endpoint,
            "feed_config.endpoint_overridden"
        );
        config.endpoint = endpoint;
        metadata.endpoint_overridden = true;
    }

    (config, metadata)
}

/// Load configuration using `TERRITORY_CONFIG_PATH` and `TERRITORY_API_URL`.
pub fn load_feed_config_from_env() -> (FeedConfig, FeedConfigMetadata) {
    let path = env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
    let endpoint = env::var(ENDPOINT_ENV).ok();
    load_feed_config(path.as_deref(), endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config_parses() {
        let config = FeedConfig::builtin();
        assert!(config.endpoint.ends_with("/api/tiles"));
        assert!(!config.title.is_empty());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = FeedConfig::from_json_str(r#"{"endpoint":"http://example.test/tiles"}"#)
            .expect("partial config parses");
        assert_eq!(config.endpoint, "http://example.test/tiles");
        assert_eq!(config.title, FeedConfig::default().title);
    }

    #[test]
    fn endpoint_override_wins() {
        let (config, metadata) =
            load_feed_config(None, Some("http://localhost:9000/tiles".to_string()));
        assert_eq!(config.endpoint, "http://localhost:9000/tiles");
        assert!(metadata.endpoint_overridden());
        assert!(metadata.path().is_none());
    }

    #[test]
    fn blank_override_is_ignored() {
        let (config, metadata) = load_feed_config(None, Some("   ".to_string()));
        assert_eq!(config, FeedConfig::builtin());
        assert!(!metadata.endpoint_overridden());
    }

    #[test]
    fn missing_file_falls_back_to_builtin() {
        let missing = Path::new("/definitely/not/here/feed_config.json");
        let (config, metadata) = load_feed_config(Some(missing), None);
        assert_eq!(config, FeedConfig::builtin());
        assert!(metadata.path().is_none());
    }

    #[test]
    fn read_error_names_the_path() {
        let missing = Path::new("/definitely/not/here/feed_config.json");
        let err = FeedConfig::from_file(missing).unwrap_err();
        assert!(matches!(err, FeedConfigError::Read { .. }));
        assert!(err.to_string().contains("feed_config.json"));
    }
}
