//! Registry source files and fault-tolerant collection reads.
//!
//! # Responsibility
//! - Bind the three registry sources to their on-disk locations.
//! - Turn every read failure into a typed `SourceUnavailable` outcome.
//!
//! # Invariants
//! - Reads never panic and never return partially parsed collections.
//! - A broken optional source must not prevent the base set from loading;
//!   absorption into an empty collection happens in the resolver.

use crate::extension::collection::ExtensionCollection;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Bundled, authoritative baseline manifest file.
pub const DEFAULT_EXTENSIONS_FILE: &str = "extensions.json";
/// User-managed overrides/additions.
pub const EXTERNAL_EXTENSIONS_FILE: &str = "extensions.external.json";
/// Git-synced catalog manifest file, produced by the catalog collaborator.
pub const CATALOG_EXTENSIONS_FILE: &str = "data/extensions-catalog/lib/extensions.json";

/// Registry source identity, in ascending precedence: base < catalog < external.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceName {
    Base,
    Catalog,
    External,
}

impl SourceName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Catalog => "catalog",
            Self::External => "external",
        }
    }
}

impl Display for SourceName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit path configuration for the three registry sources.
///
/// Passed into the resolver instead of living in ambient module state, so
/// tests and relocated installs can point at their own roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryPaths {
    pub base: PathBuf,
    pub catalog: PathBuf,
    pub external: PathBuf,
}

impl RegistryPaths {
    /// Paths relative to the process working directory (stock layout).
    pub fn standard() -> Self {
        Self::with_root(Path::new(""))
    }

    /// Stock layout rooted at `root`.
    pub fn with_root(root: &Path) -> Self {
        Self {
            base: root.join(DEFAULT_EXTENSIONS_FILE),
            catalog: root.join(CATALOG_EXTENSIONS_FILE),
            external: root.join(EXTERNAL_EXTENSIONS_FILE),
        }
    }

    pub fn for_source(&self, source: SourceName) -> &Path {
        match source {
            SourceName::Base => &self.base,
            SourceName::Catalog => &self.catalog,
            SourceName::External => &self.external,
        }
    }
}

impl Default for RegistryPaths {
    fn default() -> Self {
        Self::standard()
    }
}

/// Typed read outcome for one registry source.
///
/// Callers that only want availability semantics treat all three variants as
/// "source absent"; callers that care can distinguish a missing optional file
/// from a permission problem or broken JSON.
#[derive(Debug)]
pub enum SourceUnavailable {
    Missing {
        source: SourceName,
        path: PathBuf,
    },
    Unreadable {
        source: SourceName,
        path: PathBuf,
        cause: io::Error,
    },
    Invalid {
        source: SourceName,
        path: PathBuf,
        cause: serde_json::Error,
    },
}

impl SourceUnavailable {
    pub fn source_name(&self) -> SourceName {
        match self {
            Self::Missing { source, .. }
            | Self::Unreadable { source, .. }
            | Self::Invalid { source, .. } => *source,
        }
    }
}

impl Display for SourceUnavailable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing { source, path } => {
                write!(f, "{source} source missing: {}", path.display())
            }
            Self::Unreadable {
                source,
                path,
                cause,
            } => write!(f, "{source} source unreadable: {}: {cause}", path.display()),
            Self::Invalid {
                source,
                path,
                cause,
            } => write!(f, "{source} source invalid JSON: {}: {cause}", path.display()),
        }
    }
}

impl Error for SourceUnavailable {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Missing { .. } => None,
            Self::Unreadable { cause, .. } => Some(cause),
            Self::Invalid { cause, .. } => Some(cause),
        }
    }
}

/// Reads and parses one source file.
pub fn read_collection(
    source: SourceName,
    path: &Path,
) -> Result<ExtensionCollection, SourceUnavailable> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(cause) if cause.kind() == io::ErrorKind::NotFound => {
            return Err(SourceUnavailable::Missing {
                source,
                path: path.to_path_buf(),
            })
        }
        Err(cause) => {
            return Err(SourceUnavailable::Unreadable {
                source,
                path: path.to_path_buf(),
                cause,
            })
        }
    };

    serde_json::from_str(&raw).map_err(|cause| SourceUnavailable::Invalid {
        source,
        path: path.to_path_buf(),
        cause,
    })
}

/// Creates the external overrides file as an empty skeleton if absent.
///
/// Returns `true` only when the file was created by this call. Write failures
/// are logged and reported as `false`; the caller proceeds as if no file
/// exists.
pub fn create_empty_external_file(path: &Path) -> bool {
    if path.exists() {
        return false;
    }

    let skeleton = match serde_json::to_string_pretty(&ExtensionCollection::empty()) {
        Ok(skeleton) => skeleton,
        Err(err) => {
            warn!(
                "event=external_skeleton_failed module=extension path={} reason={err}",
                path.display()
            );
            return false;
        }
    };

    match fs::write(path, skeleton) {
        Ok(()) => {
            info!(
                "event=external_skeleton_created module=extension path={}",
                path.display()
            );
            true
        }
        Err(err) => {
            warn!(
                "event=external_skeleton_failed module=extension path={} reason={err}",
                path.display()
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        create_empty_external_file, read_collection, RegistryPaths, SourceName, SourceUnavailable,
    };
    use std::path::Path;

    #[test]
    fn standard_paths_match_stock_layout() {
        let paths = RegistryPaths::standard();
        assert_eq!(paths.base, Path::new("extensions.json"));
        assert_eq!(paths.external, Path::new("extensions.external.json"));
        assert_eq!(
            paths.catalog,
            Path::new("data/extensions-catalog/lib/extensions.json")
        );
    }

    #[test]
    fn missing_file_reports_missing_variant() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_collection(SourceName::External, &dir.path().join("absent.json"))
            .expect_err("missing file must not parse");
        assert!(matches!(err, SourceUnavailable::Missing { .. }));
        assert_eq!(err.source_name(), SourceName::External);
    }

    #[test]
    fn malformed_json_reports_invalid_variant() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").expect("write fixture");
        let err =
            read_collection(SourceName::Base, &path).expect_err("malformed file must not parse");
        assert!(matches!(err, SourceUnavailable::Invalid { .. }));
    }

    #[test]
    fn reads_minimal_collection() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("extensions.json");
        std::fs::write(&path, r#"{"tabs": [{"package_name": "a"}]}"#).expect("write fixture");
        let collection = read_collection(SourceName::Base, &path).expect("valid source");
        assert_eq!(collection.tabs.len(), 1);
        assert_eq!(collection.tabs[0].package_name, "a");
    }

    #[test]
    fn external_skeleton_created_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("extensions.external.json");

        assert!(create_empty_external_file(&path));
        let raw = std::fs::read_to_string(&path).expect("skeleton exists");
        let parsed: serde_json::Value = serde_json::from_str(&raw).expect("skeleton is JSON");
        assert_eq!(parsed["tabs"], serde_json::json!([]));
        assert_eq!(parsed["tabsInGroups"], serde_json::json!({}));
        assert_eq!(parsed["decorators"], serde_json::json!([]));

        // Second call must not rewrite the file.
        std::fs::write(&path, r#"{"tabs": [{"package_name": "kept"}]}"#).expect("overwrite");
        assert!(!create_empty_external_file(&path));
        let kept = std::fs::read_to_string(&path).expect("file intact");
        assert!(kept.contains("kept"));
    }
}
