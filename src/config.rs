//! Application configuration.
//!
//! Configuration lives in a JSON file at the OS-specific config path
//! (`~/.config/autoblog/config.json` on Linux). Environment variables
//! override the file at load time but are never written back:
//!
//! - `AUTOBLOG_SYNC_URL`  -> `sync.url`
//! - `AUTOBLOG_TIMEOUT`   -> `sync.timeout_ms` (milliseconds)
//! - `AUTOBLOG_DATA_PATH` -> `storage.data_dir`
//!
//! The same dotted keys drive the CLI `config get`/`config set` commands.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{AutoblogError, Result};

const CONFIG_FILE: &str = "config.json";
const DEFAULT_SYNC_URL: &str = "wss://sync.automerge.org";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Dotted keys accepted by `config get`/`config set`
pub const CONFIG_KEYS: [&str; 3] = ["sync.url", "sync.timeout_ms", "storage.data_dir"];

/// Sync server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// WebSocket URL of the sync server
    pub url: String,
    /// Overall timeout for syncing one document
    pub timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SYNC_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Local storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `.automerge` document files
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Load from the default path with environment overrides applied
    pub async fn load() -> Result<Self> {
        Self::load_from(&Self::file_path()?).await
    }

    /// Load from an explicit path with environment overrides applied
    pub async fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path).await?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load the file contents only, without environment overrides.
    ///
    /// `config set` edits this form so that a transient environment
    /// variable never leaks into the persisted file.
    pub async fn load_file(path: &Path) -> Result<Self> {
        match fs::read_to_string(path).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write this configuration to the default path
    pub async fn save(&self) -> Result<()> {
        self.save_to(&Self::file_path()?).await
    }

    /// Write this configuration as pretty JSON
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw).await?;
        Ok(())
    }

    /// The OS-specific config file location
    pub fn file_path() -> Result<PathBuf> {
        let dirs = project_dirs()?;
        Ok(dirs.config_dir().join(CONFIG_FILE))
    }

    /// Read a dotted key
    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "sync.url" => Ok(self.sync.url.clone()),
            "sync.timeout_ms" => Ok(self.sync.timeout_ms.to_string()),
            "storage.data_dir" => Ok(self.storage.data_dir.display().to_string()),
            other => Err(unknown_key(other)),
        }
    }

    /// Set a dotted key, validating the value
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "sync.url" => {
                if !value.starts_with("ws://") && !value.starts_with("wss://") {
                    return Err(AutoblogError::Config(format!(
                        "sync.url must be a ws:// or wss:// URL, got {value:?}"
                    )));
                }
                self.sync.url = value.to_string();
            }
            "sync.timeout_ms" => {
                self.sync.timeout_ms = value.parse().map_err(|_| {
                    AutoblogError::Config(format!(
                        "sync.timeout_ms must be a number of milliseconds, got {value:?}"
                    ))
                })?;
            }
            "storage.data_dir" => {
                self.storage.data_dir = PathBuf::from(value);
            }
            other => return Err(unknown_key(other)),
        }
        Ok(())
    }

    /// All (key, value) pairs for `config list`
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        CONFIG_KEYS
            .iter()
            .map(|key| {
                let value = self.get(key).unwrap_or_default();
                (*key, value)
            })
            .collect()
    }

    /// Apply environment overrides through an injected lookup
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("AUTOBLOG_SYNC_URL") {
            self.sync.url = url;
        }
        if let Some(raw) = lookup("AUTOBLOG_TIMEOUT") {
            self.sync.timeout_ms = raw.parse().map_err(|_| {
                AutoblogError::Config(format!(
                    "AUTOBLOG_TIMEOUT must be a number of milliseconds, got {raw:?}"
                ))
            })?;
        }
        if let Some(path) = lookup("AUTOBLOG_DATA_PATH") {
            self.storage.data_dir = PathBuf::from(path);
        }
        Ok(())
    }
}

fn unknown_key(key: &str) -> AutoblogError {
    AutoblogError::Config(format!(
        "unknown key {key:?}, expected one of: {}",
        CONFIG_KEYS.join(", ")
    ))
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "autoblog")
        .ok_or_else(|| AutoblogError::Config("could not determine a home directory".into()))
}

fn default_data_dir() -> PathBuf {
    match ProjectDirs::from("", "", "autoblog") {
        Some(dirs) => dirs.data_dir().join("documents"),
        None => PathBuf::from(".autoblog/documents"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.sync.url, DEFAULT_SYNC_URL);
        assert_eq!(config.sync.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_dotted_get_and_set() {
        let mut config = Config::default();
        config.set("sync.url", "ws://localhost:3030").unwrap();
        config.set("sync.timeout_ms", "5000").unwrap();
        config.set("storage.data_dir", "/tmp/blog").unwrap();

        assert_eq!(config.get("sync.url").unwrap(), "ws://localhost:3030");
        assert_eq!(config.get("sync.timeout_ms").unwrap(), "5000");
        assert_eq!(config.get("storage.data_dir").unwrap(), "/tmp/blog");
        assert!(config.get("sync.bogus").is_err());
    }

    #[test]
    fn test_set_validates_values() {
        let mut config = Config::default();
        assert!(config.set("sync.url", "http://not-websocket").is_err());
        assert!(config.set("sync.timeout_ms", "soon").is_err());
        assert!(config.set("made.up.key", "x").is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let mut env = HashMap::new();
        env.insert("AUTOBLOG_SYNC_URL", "ws://peer:1234");
        env.insert("AUTOBLOG_TIMEOUT", "1500");
        env.insert("AUTOBLOG_DATA_PATH", "/var/blog");

        let mut config = Config::default();
        config
            .apply_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.sync.url, "ws://peer:1234");
        assert_eq!(config.sync.timeout_ms, 1500);
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/blog"));
    }

    #[test]
    fn test_invalid_timeout_override_is_an_error() {
        let mut config = Config::default();
        let result = config.apply_overrides(|name| {
            (name == "AUTOBLOG_TIMEOUT").then(|| "forever".to_string())
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.set("sync.url", "ws://localhost:9999").unwrap();
        config.save_to(&path).await.unwrap();

        let loaded = Config::load_file(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let loaded = Config::load_file(&dir.path().join("absent.json")).await.unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_entries_cover_all_keys() {
        let config = Config::default();
        let entries = config.entries();
        assert_eq!(entries.len(), CONFIG_KEYS.len());
        assert!(entries.iter().any(|(k, v)| *k == "sync.url" && v == DEFAULT_SYNC_URL));
    }
}
