//! Configuration management.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `ARXIV_FETCH_*` environment variables (nested keys joined with `__`).
//!
//! ```toml
//! [api]
//! base_url = "http://export.arxiv.org/api/query"
//! page_size = 100
//! request_interval_ms = 3000
//! timeout_secs = 30
//! sort_by = "lastUpdatedDate"
//! sort_order = "descending"
//!
//! [downloads]
//! directory = "."
//! verify_title = true
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::{SortBy, SortOrder};
use crate::sources::{ARXIV_API_URL, DEFAULT_PAGE_SIZE};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "ARXIV_FETCH";

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "arxiv-fetch.toml";

/// Largest page the API serves in one response
pub const MAX_PAGE_SIZE: usize = 2000;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub downloads: DownloadConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Query endpoint and request behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Entries requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Minimum spacing between requests, including PDF downloads
    #[serde(default = "default_request_interval_ms")]
    pub request_interval_ms: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub sort_by: SortBy,

    #[serde(default)]
    pub sort_order: SortOrder,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            request_interval_ms: default_request_interval_ms(),
            timeout_secs: default_timeout_secs(),
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl ApiConfig {
    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    ARXIV_API_URL.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_request_interval_ms() -> u64 {
    3000
}

fn default_timeout_secs() -> u64 {
    30
}

/// Download configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory PDFs are saved into
    #[serde(default = "default_download_dir")]
    pub directory: PathBuf,

    /// Drop results whose title lacks the title keyword
    #[serde(default = "default_true")]
    pub verify_title: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            directory: default_download_dir(),
            verify_title: true,
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Reject settings no request could be made with
    pub fn validate(&self) -> Result<(), ::config::ConfigError> {
        if self.api.page_size == 0 || self.api.page_size > MAX_PAGE_SIZE {
            return Err(::config::ConfigError::Message(format!(
                "api.page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.api.page_size
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(::config::ConfigError::Message(
                "api.timeout_secs must be positive".to_string(),
            ));
        }
        url::Url::parse(&self.api.base_url).map_err(|e| {
            ::config::ConfigError::Message(format!(
                "api.base_url '{}' is not a valid URL: {}",
                self.api.base_url, e
            ))
        })?;
        Ok(())
    }

    /// Effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// The configuration file to read: `explicit` if given, else the first of
/// `./arxiv-fetch.toml` and `<config dir>/arxiv-fetch/config.toml` that exists.
pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("arxiv-fetch").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Load configuration from defaults, the config file and the process
/// environment.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ::config::ConfigError> {
    let environment = ::config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true);
    build_config(find_config_file(explicit).as_deref(), environment)
}

fn build_config(
    file: Option<&Path>,
    environment: ::config::Environment,
) -> Result<Config, ::config::ConfigError> {
    let mut builder = ::config::Config::builder();
    if let Some(path) = file {
        builder = builder.add_source(
            ::config::File::from(path).format(::config::FileFormat::Toml),
        );
    }

    let config: Config = builder
        .add_source(environment)
        .build()?
        .try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(vars: &[(&str, &str)]) -> ::config::Environment {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ::config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(Some(vars.into_iter().collect()))
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://export.arxiv.org/api/query");
        assert_eq!(config.api.page_size, 100);
        assert_eq!(config.api.request_interval(), Duration::from_secs(3));
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.api.sort_by, SortBy::LastUpdatedDate);
        assert_eq!(config.api.sort_order, SortOrder::Descending);
        assert_eq!(config.downloads.directory, PathBuf::from("."));
        assert!(config.downloads.verify_title);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_sources_give_defaults() {
        let config = build_config(None, env(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[api]
page_size = 50
request_interval_ms = 0
sort_by = "submittedDate"
sort_order = "ascending"

[downloads]
directory = "/tmp/papers"
verify_title = false

[logging]
level = "debug"
"#,
        )
        .unwrap();

        let config = build_config(Some(&path), env(&[])).unwrap();
        assert_eq!(config.api.page_size, 50);
        assert_eq!(config.api.request_interval_ms, 0);
        assert_eq!(config.api.sort_by, SortBy::SubmittedDate);
        assert_eq!(config.api.sort_order, SortOrder::Ascending);
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.downloads.directory, PathBuf::from("/tmp/papers"));
        assert!(!config.downloads.verify_title);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\npage_size = 50\n").unwrap();

        let config = build_config(
            Some(&path),
            env(&[
                ("ARXIV_FETCH_API__PAGE_SIZE", "25"),
                ("ARXIV_FETCH_LOGGING__LEVEL", "warn"),
            ]),
        )
        .unwrap();
        assert_eq!(config.api.page_size, 25);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = load_config(Some(Path::new("/nonexistent/arxiv-fetch.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "[api]\npage_size = 0\n").unwrap();
        assert!(build_config(Some(&path), env(&[])).is_err());

        std::fs::write(&path, "[api]\nbase_url = \"not a url\"\n").unwrap();
        assert!(build_config(Some(&path), env(&[])).is_err());

        std::fs::write(&path, "invalid = toml = content").unwrap();
        assert!(build_config(Some(&path), env(&[])).is_err());
    }

    #[test]
    fn test_to_toml_round_trips() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("[api]"));
        assert!(text.contains("sort_by = \"lastUpdatedDate\""));
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
