use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use url::Url;

/// Development API address used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://192.168.85.29:8080";
/// Search radius, in metres, for the nearby provider lookup.
pub const DEFAULT_PROVIDER_RADIUS_M: u32 = 8080;

pub const ENV_API_URL: &str = "SCREENING_API_URL";
pub const ENV_LOG_LEVEL: &str = "SCREENING_LOG_LEVEL";
pub const ENV_DATA_DIR: &str = "SCREENING_DATA_DIR";

const STORAGE_FILE: &str = "storage.json";

/// Errors raised while resolving a [`ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yml::Error),
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported configuration format for {0}. Use 'yaml' or 'json'.")]
    UnsupportedFormat(PathBuf),
    #[error("invalid API base URL {value:?}: {reason}")]
    InvalidUrl { value: String, reason: String },
}

/// Configuration for the screening client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every endpoint is resolved against.
    pub api_base_url: Url,

    /// Logging level used when `RUST_LOG` is not set.
    pub log_level: String,

    /// Directory holding on-device state. Defaults to the platform config directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Radius, in metres, sent with the nearby provider lookup.
    pub provider_radius_m: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ClientConfig {
    /// Generates a default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            api_base_url: default_api_url(),
            log_level: "info".to_string(),
            data_dir: None,
            provider_radius_m: DEFAULT_PROVIDER_RADIUS_M,
        }
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to a `.yaml`/`.yml` or `.json` file.
    /// * `base_url_override` - Optional API base URL that beats every other source.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or a
    /// base URL is not a usable http(s) URL.
    pub fn load_config(
        config_path: Option<&Path>,
        base_url_override: Option<&str>,
    ) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, base_url_override, |key| env::var(key).ok())
    }

    /// [`ClientConfig::load_config`] with an explicit environment lookup.
    ///
    /// # Errors
    /// See [`ClientConfig::load_config`].
    pub fn load_with_env<F>(
        config_path: Option<&Path>,
        base_url_override: Option<&str>,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::with_defaults();
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => defaults.clone(),
        };

        // Environment only fills what the file left at its default
        if config.api_base_url == defaults.api_base_url {
            if let Some(url) = lookup(ENV_API_URL).filter(|value| !value.trim().is_empty()) {
                config.api_base_url = parse_base_url(&url)?;
            }
        }
        if config.log_level == defaults.log_level {
            if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|value| !value.trim().is_empty()) {
                config.log_level = level;
            }
        }
        if config.data_dir.is_none() {
            if let Some(dir) = lookup(ENV_DATA_DIR).filter(|value| !value.trim().is_empty()) {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }

        if let Some(url) = base_url_override {
            config.api_base_url = parse_base_url(url)?;
        }

        // Re-validate whatever the file supplied
        config.api_base_url = parse_base_url(config.api_base_url.as_str())?;

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        tracing::debug!(path = %path.display(), "loading client configuration");
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Ok(serde_yml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Directory holding on-device state.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            BaseDirs::new()
                .map(|dirs| dirs.config_dir().join("screening"))
                .unwrap_or_else(|| PathBuf::from("./.screening"))
        })
    }

    /// File backing the on-device key-value store.
    #[must_use]
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir().join(STORAGE_FILE)
    }

    /// Serialize in the given format (`yaml` or `json`).
    ///
    /// # Errors
    /// Returns [`ConfigError::UnsupportedFormat`] for any other format name.
    pub fn render(&self, format: &str) -> Result<String, ConfigError> {
        match format {
            "yaml" | "yml" => Ok(serde_yml::to_string(self)?),
            "json" => Ok(serde_json::to_string_pretty(self)?),
            other => Err(ConfigError::UnsupportedFormat(PathBuf::from(other))),
        }
    }
}

/// Joins `base` and `path` with exactly one slash between them.
#[must_use]
pub fn join_endpoint(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn default_api_url() -> Url {
    Url::parse(DEFAULT_API_URL).unwrap_or_else(|_| unreachable!("default API URL is valid"))
}

fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        value: value.to_string(),
        reason,
    };

    let url = Url::parse(value.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("URL has no host".to_string()));
    }
    Ok(url)
}
