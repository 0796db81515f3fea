//! Where the collection lives.

use serde::{Deserialize, Serialize};

pub const BASE_URL_ENV: &str = "MOVIES_API_BASE_URL";
pub const COLLECTION_ENV: &str = "MOVIES_API_COLLECTION";

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_COLLECTION: &str = "/api/movies";

/// Endpoint configuration for `ResourceClient`.
///
/// Deserializable so a host can embed it in its own config file; unset keys
/// fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub collection_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            collection_path: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_collection(mut self, collection_path: &str) -> Self {
        self.collection_path = collection_path.to_string();
        self
    }

    /// Read `MOVIES_API_BASE_URL` and `MOVIES_API_COLLECTION`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            base_url: non_empty(BASE_URL_ENV).unwrap_or(defaults.base_url),
            collection_path: non_empty(COLLECTION_ENV).unwrap_or(defaults.collection_path),
        }
    }

    /// Full collection URL with exactly one slash at the seam and none at
    /// the end.
    pub fn collection_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.collection_path.trim_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_mock_server() {
        assert_eq!(ClientConfig::default().collection_url(), "http://localhost:3000/api/movies");
    }

    #[test]
    fn lookup_overrides_and_ignores_blank_values() {
        let config = ClientConfig::from_lookup(|key| match key {
            BASE_URL_ENV => Some("https://example.test/".to_string()),
            COLLECTION_ENV => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.base_url, "https://example.test/");
        assert_eq!(config.collection_path, DEFAULT_COLLECTION);
        assert_eq!(config.collection_url(), "https://example.test/api/movies");
    }

    #[test]
    fn slashes_are_normalized() {
        let config = ClientConfig::new("http://h:1//").with_collection("api/Post/");
        assert_eq!(config.collection_url(), "http://h:1/api/Post");
    }

    #[test]
    fn partial_json_config_keeps_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"base_url":"http://x"}"#).unwrap();
        assert_eq!(config.collection_path, DEFAULT_COLLECTION);
    }
}
