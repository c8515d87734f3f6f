//! Configuration management with layered hierarchy
//!
//! Built-in defaults, then the global user file, then the project's
//! `.roomcat/config.yaml`, then `ROOMCAT_*` environment variables.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::core::project::CONFIG_DIR;

pub const DEFAULT_DATA_FILE: &str = "listings.csv";
pub const DEFAULT_WORKSHEET: &str = "data";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;
pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Keys accepted by `config set` / `config unset`, with a description
pub const KEYS: &[(&str, &str)] = &[
    ("data_file", "Local data file, relative to the project root"),
    ("worksheet", "Worksheet name inside the remote spreadsheet"),
    ("cache_ttl_secs", "Seconds a loaded catalog is reused (0 disables)"),
    ("remote.credentials", "Path to the service-account credential bundle"),
    ("remote.sheet_id", "Remote spreadsheet id"),
    ("remote.sheet_url", "Remote spreadsheet URL (used when no id is set)"),
    ("remote.api_base", "Spreadsheet API endpoint"),
    ("remote.timeout_secs", "Remote request timeout in seconds"),
];

/// Remote spreadsheet connection settings
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteSettings {
    pub credentials: Option<PathBuf>,
    pub sheet_id: Option<String>,
    pub sheet_url: Option<String>,
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl RemoteSettings {
    /// Credentials plus a spreadsheet locator are both present
    pub fn is_configured(&self) -> bool {
        let present = |s: &Option<String>| s.as_deref().is_some_and(|v| !v.trim().is_empty());
        self.credentials.is_some() && (present(&self.sheet_id) || present(&self.sheet_url))
    }

    /// Copy with a relative credentials path anchored at `root`
    pub fn resolved(&self, root: &Path) -> Self {
        let mut settings = self.clone();
        if let Some(path) = &self.credentials {
            if path.is_relative() {
                settings.credentials = Some(root.join(path));
            }
        }
        settings
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    fn merge(&mut self, other: RemoteSettings) {
        if other.credentials.is_some() {
            self.credentials = other.credentials;
        }
        if other.sheet_id.is_some() {
            self.sheet_id = other.sheet_id;
        }
        if other.sheet_url.is_some() {
            self.sheet_url = other.sheet_url;
        }
        if other.api_base.is_some() {
            self.api_base = other.api_base;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
    }
}

/// Room catalog configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Local data file (relative paths are under the project root)
    pub data_file: Option<PathBuf>,

    /// Worksheet holding the catalog in the remote spreadsheet
    pub worksheet: Option<String>,

    /// How long a loaded catalog may be served from memory
    pub cache_ttl_secs: Option<u64>,

    pub remote: RemoteSettings,
}

impl Config {
    /// Load configuration for the project at `root`, merging in priority order
    pub fn load_for(root: &Path) -> Self {
        let mut config = Config::default();

        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        if let Some(project) = Self::read_file(&Self::project_config_path(root)) {
            config.merge(project);
        }

        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    /// Parse one config file; unreadable or invalid files are skipped
    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read config file");
                return None;
            }
        };
        let blank = contents.lines().all(|line| {
            let line = line.trim();
            line.is_empty() || line.starts_with('#')
        });
        if blank {
            return None;
        }
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                None
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "roomcat")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    pub fn project_config_path(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR).join("config.yaml")
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.data_file.is_some() {
            self.data_file = other.data_file;
        }
        if other.worksheet.is_some() {
            self.worksheet = other.worksheet;
        }
        if other.cache_ttl_secs.is_some() {
            self.cache_ttl_secs = other.cache_ttl_secs;
        }
        self.remote.merge(other.remote);
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("ROOMCAT_DATA_FILE") {
            self.data_file = Some(PathBuf::from(path));
        }
        if let Some(worksheet) = var("ROOMCAT_WORKSHEET") {
            self.worksheet = Some(worksheet);
        }
        if let Some(path) = var("ROOMCAT_CREDENTIALS") {
            self.remote.credentials = Some(PathBuf::from(path));
        }
        if let Some(id) = var("ROOMCAT_SHEET_ID") {
            self.remote.sheet_id = Some(id);
        }
        if let Some(url) = var("ROOMCAT_SHEET_URL") {
            self.remote.sheet_url = Some(url);
        }
        if let Some(ttl) = var("ROOMCAT_CACHE_TTL") {
            match ttl.trim().parse() {
                Ok(secs) => self.cache_ttl_secs = Some(secs),
                Err(_) => warn!(value = %ttl, "ignoring non-numeric ROOMCAT_CACHE_TTL"),
            }
        }
    }

    /// Absolute path of the local data file
    pub fn data_path(&self, root: &Path) -> PathBuf {
        let file = self
            .data_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE));
        if file.is_relative() {
            root.join(file)
        } else {
            file
        }
    }

    pub fn worksheet(&self) -> &str {
        self.worksheet
            .as_deref()
            .filter(|w| !w.trim().is_empty())
            .unwrap_or(DEFAULT_WORKSHEET)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS))
    }

    /// Effective value of a dotted key, for display
    pub fn get(&self, key: &str) -> Option<String> {
        let path = |p: &Option<PathBuf>| p.as_ref().map(|p| p.display().to_string());
        match key {
            "data_file" => path(&self.data_file),
            "worksheet" => self.worksheet.clone(),
            "cache_ttl_secs" => self.cache_ttl_secs.map(|v| v.to_string()),
            "remote.credentials" => path(&self.remote.credentials),
            "remote.sheet_id" => self.remote.sheet_id.clone(),
            "remote.sheet_url" => self.remote.sheet_url.clone(),
            "remote.api_base" => self.remote.api_base.clone(),
            "remote.timeout_secs" => self.remote.timeout_secs.map(|v| v.to_string()),
            _ => None,
        }
    }
}

/// Errors from editing config files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown configuration key '{0}' (see `roomcat config keys`)")]
    UnknownKey(String),

    #[error("'{key}' expects a whole number, got '{value}'")]
    NotANumber { key: String, value: String },

    #[error("key '{0}' is not set in this file")]
    NotSet(String),

    #[error("config file {path:?} is not valid YAML: {message}")]
    Invalid { path: PathBuf, message: String },

    #[error("cannot access config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn is_numeric_key(key: &str) -> bool {
    matches!(key, "cache_ttl_secs" | "remote.timeout_secs")
}

fn not_a_mapping(path: &Path, key: &str) -> ConfigError {
    ConfigError::Invalid {
        path: path.to_path_buf(),
        message: format!("'{}' is not a mapping", key),
    }
}

fn read_mapping(path: &Path) -> Result<serde_yml::Value, ConfigError> {
    let empty = || serde_yml::Value::Mapping(Default::default());
    if !path.exists() {
        return Ok(empty());
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: serde_yml::Value =
        serde_yml::from_str(&content).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(if parsed.is_mapping() { parsed } else { empty() })
}

fn write_mapping(path: &Path, value: &serde_yml::Value) -> Result<(), ConfigError> {
    let io = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io)?;
    }
    let yaml = serde_yml::to_string(value).map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    fs::write(path, yaml).map_err(io)
}

/// Set a dotted key (e.g. `remote.sheet_id`) in the YAML file at `path`
pub fn set_value(path: &Path, key: &str, value: &str) -> Result<(), ConfigError> {
    if !KEYS.iter().any(|(k, _)| *k == key) {
        return Err(ConfigError::UnknownKey(key.to_string()));
    }
    let scalar = if is_numeric_key(key) {
        let number: u64 = value.trim().parse().map_err(|_| ConfigError::NotANumber {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        serde_yml::Value::Number(number.into())
    } else {
        serde_yml::Value::String(value.to_string())
    };

    let mut root = read_mapping(path)?;
    let mut current = &mut root;
    let parts: Vec<&str> = key.split('.').collect();
    let (last, parents) = match parts.split_last() {
        Some(split) => split,
        None => return Err(ConfigError::UnknownKey(key.to_string())),
    };
    for part in parents {
        let serde_yml::Value::Mapping(map) = current else {
            return Err(not_a_mapping(path, part));
        };
        let name = serde_yml::Value::String(part.to_string());
        let is_mapping = map.get(&name).is_some_and(|v| v.is_mapping());
        if !is_mapping {
            map.insert(name.clone(), serde_yml::Value::Mapping(Default::default()));
        }
        current = match map.get_mut(&name) {
            Some(next) => next,
            None => return Err(not_a_mapping(path, part)),
        };
    }
    match current {
        serde_yml::Value::Mapping(map) => {
            map.insert(serde_yml::Value::String(last.to_string()), scalar);
        }
        _ => return Err(not_a_mapping(path, key)),
    }

    write_mapping(path, &root)
}

/// Remove a dotted key from the YAML file at `path`
pub fn unset_value(path: &Path, key: &str) -> Result<(), ConfigError> {
    if !KEYS.iter().any(|(k, _)| *k == key) {
        return Err(ConfigError::UnknownKey(key.to_string()));
    }
    let mut root = read_mapping(path)?;
    let mut current = &mut root;
    let parts: Vec<&str> = key.split('.').collect();
    let (last, parents) = match parts.split_last() {
        Some(split) => split,
        None => return Err(ConfigError::UnknownKey(key.to_string())),
    };
    for part in parents {
        let next = match current {
            serde_yml::Value::Mapping(map) => {
                map.get_mut(&serde_yml::Value::String(part.to_string()))
            }
            _ => None,
        };
        current = match next {
            Some(next) => next,
            None => return Err(ConfigError::NotSet(key.to_string())),
        };
    }
    let removed = match current {
        serde_yml::Value::Mapping(map) => map
            .remove(&serde_yml::Value::String(last.to_string()))
            .is_some(),
        _ => false,
    };
    if !removed {
        return Err(ConfigError::NotSet(key.to_string()));
    }
    write_mapping(path, &root)
}
