//! Namespaced application configuration with an explicit load/save lifecycle.
//!
//! # Responsibility
//! - Hold namespace/key settings for the resolver and UI layers.
//! - Track the disabled-extensions list consulted before mounting tabs.
//!
//! # Invariants
//! - Mutations stay in memory until `save()`; no ambient global state.
//! - A missing config file loads as empty defaults; malformed files are
//!   reported, not silently replaced.

use log::info;
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default config file in the stock layout.
pub const CONFIG_FILE: &str = "config.json";

const EXTENSIONS_NAMESPACE: &str = "extensions";
const DISABLED_KEY: &str = "disabled";

type Namespaces = BTreeMap<String, BTreeMap<String, Value>>;

/// Config load/save failures.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, cause: io::Error },
    Invalid { path: PathBuf, cause: serde_json::Error },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, cause } => {
                write!(f, "config file I/O failed: {}: {cause}", path.display())
            }
            Self::Invalid { path, cause } => {
                write!(f, "config file invalid JSON: {}: {cause}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { cause, .. } => Some(cause),
            Self::Invalid { cause, .. } => Some(cause),
        }
    }
}

/// Explicit configuration object passed into the layers that need it.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    path: PathBuf,
    namespaces: Namespaces,
}

impl AppConfig {
    /// Loads the config file, treating an absent file as empty defaults.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(cause) if cause.kind() == io::ErrorKind::NotFound => {
                return Ok(Self {
                    path,
                    namespaces: Namespaces::new(),
                })
            }
            Err(cause) => return Err(ConfigError::Io { path, cause }),
        };
        let namespaces =
            serde_json::from_str(&raw).map_err(|cause| ConfigError::Invalid {
                path: path.clone(),
                cause,
            })?;
        Ok(Self { path, namespaces })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persists the full store as pretty JSON.
    pub fn save(&self) -> Result<(), ConfigError> {
        let rendered =
            serde_json::to_string_pretty(&self.namespaces).map_err(|cause| ConfigError::Invalid {
                path: self.path.clone(),
                cause,
            })?;
        fs::write(&self.path, rendered).map_err(|cause| ConfigError::Io {
            path: self.path.clone(),
            cause,
        })?;
        info!(
            "event=config_saved module=config path={} namespaces={}",
            self.path.display(),
            self.namespaces.len()
        );
        Ok(())
    }

    /// Reads one value; `None` when namespace or key is absent.
    pub fn get(&self, namespace: &str, key: &str) -> Option<&Value> {
        self.namespaces.get(namespace)?.get(key)
    }

    /// Sets one value in memory. Persist with [`AppConfig::save`].
    pub fn set(&mut self, namespace: &str, key: &str, value: Value) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Packages the UI must not mount, in stored order.
    pub fn disabled_extensions(&self) -> Vec<String> {
        match self.get(EXTENSIONS_NAMESPACE, DISABLED_KEY) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_extension_disabled(&self, package_name: &str) -> bool {
        self.disabled_extensions()
            .iter()
            .any(|disabled| disabled == package_name)
    }

    /// Adds or removes one package from the disabled list.
    ///
    /// Takes effect for mounting on the next application start; callers are
    /// expected to `save()` and surface a restart hint.
    pub fn set_extension_disabled(&mut self, package_name: &str, disabled: bool) {
        let mut list = self.disabled_extensions();
        if disabled {
            if !list.iter().any(|item| item == package_name) {
                list.push(package_name.to_string());
            }
        } else {
            list.retain(|item| item != package_name);
        }
        self.set(
            EXTENSIONS_NAMESPACE,
            DISABLED_KEY,
            Value::Array(list.into_iter().map(Value::String).collect()),
        );
    }
}
