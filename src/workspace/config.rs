//! Application configuration stored in `<data-dir>/config.toml`

use crate::error::{Error, Result as StoreResult};
use crate::feed::ReconcileMode;
use crate::query::DISPLAY_CAP;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Name of the configuration file inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Published SCImago journal ranking export
pub const DEFAULT_FEED_URL: &str = "https://www.scimagojr.com/journalrank.php?out=xls";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub import: ImportConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

/// Where and how the ranking feed is downloaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_url")]
    pub url: String,

    /// Single ASCII field separator
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Keep the raw download under `tmp/`
    #[serde(default = "default_keep_download")]
    pub keep_download: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file, relative to the data directory
    #[serde(default = "default_database_file")]
    pub file: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub reconcile: ReconcileMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Searches matching more journals than this are refused
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_delimiter() -> String {
    ";".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_keep_download() -> bool {
    true
}

fn default_database_file() -> String {
    "scimagojr.db".to_string()
}

fn default_max_results() -> usize {
    DISPLAY_CAP
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            delimiter: default_delimiter(),
            timeout_secs: default_timeout_secs(),
            keep_download: default_keep_download(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            file: default_database_file(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
        }
    }
}

impl FeedConfig {
    /// Delimiter as the byte the CSV reader expects
    pub fn delimiter_byte(&self) -> StoreResult<u8> {
        parse_delimiter(&self.delimiter)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Accept exactly one ASCII character; `\t` and `tab` mean a tab
pub fn parse_delimiter(value: &str) -> StoreResult<u8> {
    match value {
        "\\t" | "tab" => return Ok(b'\t'),
        _ => {}
    }
    match value.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(Error::Config(format!(
            "delimiter must be a single ASCII character, got {:?}",
            value
        ))),
    }
}

impl AppConfig {
    /// Load configuration from the data directory or return defaults
    pub fn load_or_default(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            let config: AppConfig = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the data directory
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {:?}", data_dir))?;

        let config_path = data_dir.join(CONFIG_FILE);
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Reject values the importer or query layer cannot use
    pub fn validate(&self) -> StoreResult<()> {
        self.feed.delimiter_byte()?;
        if self.database.file.trim().is_empty() {
            return Err(Error::Config("database.file must not be empty".to_string()));
        }
        if self.search.max_results == 0 {
            return Err(Error::Config("search.max_results must be positive".to_string()));
        }
        Ok(())
    }

    /// Read one setting by its dotted key
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "feed.url" => self.feed.url.clone(),
            "feed.delimiter" => self.feed.delimiter.clone(),
            "feed.timeout_secs" => self.feed.timeout_secs.to_string(),
            "feed.keep_download" => self.feed.keep_download.to_string(),
            "database.file" => self.database.file.clone(),
            "import.reconcile" => self.import.reconcile.to_string(),
            "search.max_results" => self.search.max_results.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Change one setting by its dotted key
    pub fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let invalid = |what: &str| Error::Config(format!("{key}: expected {what}, got {value:?}"));

        match key {
            "feed.url" => self.feed.url = value.to_string(),
            "feed.delimiter" => {
                parse_delimiter(value)?;
                self.feed.delimiter = value.to_string();
            }
            "feed.timeout_secs" => {
                self.feed.timeout_secs = value.parse().map_err(|_| invalid("seconds"))?;
            }
            "feed.keep_download" => {
                self.feed.keep_download = value.parse().map_err(|_| invalid("true or false"))?;
            }
            "database.file" => self.database.file = value.to_string(),
            "import.reconcile" => {
                self.import.reconcile = match value {
                    "per-journal" => ReconcileMode::PerJournal,
                    "snapshot" => ReconcileMode::Snapshot,
                    _ => return Err(invalid("per-journal or snapshot")),
                };
            }
            "search.max_results" => {
                self.search.max_results = value.parse().map_err(|_| invalid("a count"))?;
            }
            _ => return Err(Error::Config(format!("Unknown config key: {key}"))),
        }

        self.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.feed.url, DEFAULT_FEED_URL);
        assert_eq!(config.feed.delimiter_byte().unwrap(), b';');
        assert_eq!(config.database.file, "scimagojr.db");
        assert_eq!(config.import.reconcile, ReconcileMode::PerJournal);
        assert_eq!(config.search.max_results, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[import]\nreconcile = \"snapshot\"\n\n[feed]\ntimeout_secs = 5\n",
        )
        .unwrap();

        let config = AppConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config.import.reconcile, ReconcileMode::Snapshot);
        assert_eq!(config.feed.timeout(), Duration::from_secs(5));
        assert_eq!(config.feed.url, DEFAULT_FEED_URL);
        assert_eq!(config.search.max_results, 1000);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.set("search.max_results", "50").unwrap();
        config.set("feed.delimiter", ",").unwrap();
        config.save(dir.path()).unwrap();

        let loaded = AppConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.get("search.max_results").as_deref(), Some("50"));
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = AppConfig::default();
        assert!(config.set("feed.delimiter", ";;").is_err());
        assert!(config.set("import.reconcile", "sometimes").is_err());
        assert!(config.set("search.max_results", "0").is_err());
        assert!(config.set("no.such.key", "1").is_err());
        assert!(config.get("no.such.key").is_none());
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("é").is_err());
    }
}
