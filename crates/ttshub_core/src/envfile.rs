//! JSON-backed env store rendering the application `.env` file.
//!
//! # Responsibility
//! - Persist namespaced env vars in a JSON store editable from the UI.
//! - Regenerate the `.env` file deterministically from that store.
//!
//! # Invariants
//! - The `.env` file is a derived artifact; the JSON store is authoritative.
//! - Empty values render commented-out instead of defining empty vars.

use log::info;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default JSON store file in the stock layout.
pub const ENV_STORE_FILE: &str = "env_store.json";
/// Default rendered dotenv file.
pub const DOTENV_FILE: &str = ".env";

const DOTENV_HEADER: &str = "# This file gets updated automatically from the JSON store.\n\
                             # Manual changes will be overwritten.\n\n";

type EnvNamespaces = BTreeMap<String, BTreeMap<String, String>>;

/// Env store load/save failures.
#[derive(Debug)]
pub enum EnvStoreError {
    Io { path: PathBuf, cause: io::Error },
    Invalid { path: PathBuf, cause: serde_json::Error },
}

impl Display for EnvStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, cause } => {
                write!(f, "env store I/O failed: {}: {cause}", path.display())
            }
            Self::Invalid { path, cause } => {
                write!(f, "env store invalid JSON: {}: {cause}", path.display())
            }
        }
    }
}

impl Error for EnvStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { cause, .. } => Some(cause),
            Self::Invalid { cause, .. } => Some(cause),
        }
    }
}

/// Namespaced env-var store with explicit load/save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvStore {
    path: PathBuf,
    namespaces: EnvNamespaces,
}

impl EnvStore {
    /// Loads the store; an absent file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, EnvStoreError> {
        let path = path.into();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(cause) if cause.kind() == io::ErrorKind::NotFound => {
                return Ok(Self {
                    path,
                    namespaces: EnvNamespaces::new(),
                })
            }
            Err(cause) => return Err(EnvStoreError::Io { path, cause }),
        };
        let namespaces =
            serde_json::from_str(&raw).map_err(|cause| EnvStoreError::Invalid {
                path: path.clone(),
                cause,
            })?;
        Ok(Self { path, namespaces })
    }

    pub fn save(&self) -> Result<(), EnvStoreError> {
        let rendered = serde_json::to_string_pretty(&self.namespaces).map_err(|cause| {
            EnvStoreError::Invalid {
                path: self.path.clone(),
                cause,
            }
        })?;
        fs::write(&self.path, rendered).map_err(|cause| EnvStoreError::Io {
            path: self.path.clone(),
            cause,
        })
    }

    /// Merges values into one namespace, creating it when absent.
    pub fn update(&mut self, namespace: &str, values: BTreeMap<String, String>) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .extend(values);
    }

    pub fn delete_namespace(&mut self, namespace: &str) -> bool {
        self.namespaces.remove(namespace).is_some()
    }

    pub fn get(&self, namespace: &str, key: &str) -> Option<&str> {
        self.namespaces.get(namespace)?.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Renders the dotenv text: header, then namespace sections in sorted
    /// order, each variable preceded by its `# namespace.key` comment.
    pub fn render_dotenv(&self) -> String {
        let mut text = String::from(DOTENV_HEADER);
        for (namespace, vars) in &self.namespaces {
            text.push_str(&format!("# --- {} ---\n", namespace.to_uppercase()));
            for (key, value) in vars {
                text.push_str(&env_entry(key, value, &format!("{namespace}.{key}")));
            }
            text.push('\n');
        }
        text
    }

    /// Renders and writes the dotenv file.
    pub fn write_dotenv(&self, path: &Path) -> Result<(), EnvStoreError> {
        fs::write(path, self.render_dotenv()).map_err(|cause| EnvStoreError::Io {
            path: path.to_path_buf(),
            cause,
        })?;
        info!(
            "event=dotenv_written module=envfile path={} namespaces={}",
            path.display(),
            self.namespaces.len()
        );
        Ok(())
    }
}

/// One dotenv line pair: comment, then assignment (commented-out when the
/// value is empty).
fn env_entry(name: &str, value: &str, comment: &str) -> String {
    let disabled = if value.is_empty() { "# " } else { "" };
    format!("# {comment}\n{disabled}{name}={value}\n")
}
