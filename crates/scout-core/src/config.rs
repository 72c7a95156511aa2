use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_SEARCH_URL: &str = "http://localhost:3000/integrations/google-search/search";
pub const DEFAULT_COMPLETION_URL: &str = "http://localhost:3000/integrations/google-gemini-1-5/";

const ENV_SEARCH_URL: &str = "SCOUT_SEARCH_URL";
const ENV_COMPLETION_URL: &str = "SCOUT_COMPLETION_URL";
const ENV_MODEL: &str = "SCOUT_MODEL";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub search_url: String,
    pub completion_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub connect_timeout_secs: u64,
    pub stream_idle_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            completion_url: DEFAULT_COMPLETION_URL.to_string(),
            model: None,
            connect_timeout_secs: 10,
            stream_idle_timeout_secs: 60,
        }
    }
}

impl Config {
    /// Load from the user config dir, writing defaults there on first run.
    /// Environment overrides are applied on top of whatever the file says.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            // Not fatal: a read-only config dir still gets a working session.
            if let Err(e) = config.save_to(&config_path) {
                tracing::warn!(path = %config_path.display(), "could not write default config: {e}");
            }
            return config.with_env_overrides().validated();
        }

        Self::load_from(&config_path)?.with_env_overrides().validated()
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        config.validated()
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn stream_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_idle_timeout_secs)
    }

    fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_SEARCH_URL).filter(|v| !v.trim().is_empty()) {
            self.search_url = url;
        }
        if let Some(url) = lookup(ENV_COMPLETION_URL).filter(|v| !v.trim().is_empty()) {
            self.completion_url = url;
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
            self.model = Some(model);
        }
        self
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.search_url.trim().is_empty() {
            return Err(ConfigError::Invalid("search_url is empty".to_string()));
        }
        if self.completion_url.trim().is_empty() {
            return Err(ConfigError::Invalid("completion_url is empty".to_string()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "connect_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.stream_idle_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "stream_idle_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;

        Ok(config_dir.join("scout").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            model: Some("gemini-1.5-flash".to_string()),
            stream_idle_timeout_secs: 30,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"search_url": "http://search.test/q"}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.search_url, "http://search.test/q");
        assert_eq!(loaded.completion_url, DEFAULT_COMPLETION_URL);
        assert_eq!(loaded.model, None);
        assert_eq!(loaded.connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_unset_model_is_not_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        Config::default().save_to(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(!written.contains("model"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"stream_idle_timeout_secs": 0}"#).unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides_take_precedence() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_SEARCH_URL, "http://override/search"),
            (ENV_MODEL, "gemini-pro"),
            (ENV_COMPLETION_URL, "  "),
        ]);

        let config = Config::default().with_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.search_url, "http://override/search");
        assert_eq!(config.model.as_deref(), Some("gemini-pro"));
        // Blank values are ignored
        assert_eq!(config.completion_url, DEFAULT_COMPLETION_URL);
    }
}
