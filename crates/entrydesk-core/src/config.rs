//! Configuration management for entrydesk.
//!
//! Loads configuration from ${ENTRYDESK_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default API root of a locally running server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Environment variable that overrides the configured base URL.
pub const BASE_URL_ENV: &str = "ENTRYDESK_BASE_URL";

pub mod paths {
    //! Path resolution for entrydesk configuration and session data.
    //!
    //! ENTRYDESK_HOME resolution order:
    //! 1. ENTRYDESK_HOME environment variable (if set)
    //! 2. ~/.config/entrydesk (default)

    use std::path::PathBuf;

    /// Returns the entrydesk home directory.
    pub fn entrydesk_home() -> PathBuf {
        if let Ok(home) = std::env::var("ENTRYDESK_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("entrydesk")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        entrydesk_home().join("config.toml")
    }

    /// Returns the path to the persisted session (token + cached user).
    pub fn session_path() -> PathBuf {
        entrydesk_home().join("session.json")
    }
}

/// Where session state is kept between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// `session.json` under the entrydesk home (default)
    #[default]
    File,
    /// Forget everything when the process exits
    Memory,
}

/// Session configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub backend: SessionBackend,
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API root, e.g. `http://localhost:8000/api`
    pub base_url: String,
    pub session: SessionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            session: SessionConfig::default(),
        }
    }
}

fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

impl Config {
    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes the commented default config to `path`.
    ///
    /// # Errors
    /// Fails if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }

    /// Resolves the API base URL with precedence: env > config > default.
    ///
    /// # Errors
    /// Returns an error if the chosen URL is not a valid http(s) URL.
    pub fn resolve_base_url(&self) -> Result<String> {
        let env_url = std::env::var(BASE_URL_ENV).ok();
        pick_base_url(env_url.as_deref(), &self.base_url)
    }
}

fn pick_base_url(env_url: Option<&str>, config_url: &str) -> Result<String> {
    let chosen = [env_url, Some(config_url)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(DEFAULT_BASE_URL);

    validate_url(chosen)?;
    Ok(chosen.trim_end_matches('/').to_string())
}

/// Validates that a URL is well-formed and can carry a path.
fn validate_url(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url).with_context(|| format!("Invalid base URL: {url}"))?;
    if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("Invalid base URL: {url} (expected http:// or https://)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.session.backend, SessionBackend::File);
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "[session]\nbackend = \"memory\"\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.session.backend, SessionBackend::Memory);
    }

    #[test]
    fn test_load_rejects_unknown_backend() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "[session]\nbackend = \"cookie\"\n").unwrap();

        assert!(Config::load_from(&config_path).is_err());
    }

    #[test]
    fn test_init_creates_config_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains(DEFAULT_BASE_URL));

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.session.backend, SessionBackend::File);
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "").unwrap();

        assert!(Config::init(&config_path).is_err());
    }

    #[test]
    fn test_base_url_env_wins_over_config() {
        let url = pick_base_url(Some("http://env.test/api"), "http://config.test/api").unwrap();
        assert_eq!(url, "http://env.test/api");
    }

    #[test]
    fn test_base_url_blank_env_falls_back_to_config() {
        let url = pick_base_url(Some("  "), "http://config.test/api/").unwrap();
        assert_eq!(url, "http://config.test/api");
    }

    #[test]
    fn test_base_url_blank_everywhere_uses_default() {
        let url = pick_base_url(None, "").unwrap();
        assert_eq!(url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_base_url_rejects_garbage() {
        assert!(pick_base_url(Some("not a url"), "").is_err());
        assert!(pick_base_url(Some("mailto:someone@example.com"), "").is_err());
    }
}
