//! In-process extension host: registered-capability table and discovery.
//!
//! Replaces load-by-string-name plugin wiring with an explicit registration
//! step: each extension is bound at startup through a validated adapter, and
//! lookups go through the host's indexes instead of ad-hoc imports.

use crate::extension::manifest::{ExtensionKind, ExtensionManifest, ManifestValidationError};
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Where a registered extension came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionSource {
    Builtin,
    External,
    Catalog,
}

impl ExtensionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Builtin => "builtin",
            Self::External => "external",
            Self::Catalog => "catalog",
        }
    }
}

/// Registered extension snapshot held by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredExtension {
    pub manifest: ExtensionManifest,
    pub source: ExtensionSource,
}

/// Contract an extension fulfils to be hosted.
///
/// Declaration-only: the host binds manifests and indexes them; rendering or
/// invoking an extension is the caller's concern.
pub trait ExtensionAdapter {
    fn manifest(&self) -> &ExtensionManifest;
    fn source(&self) -> ExtensionSource;
}

/// Adapter carrying nothing but a manifest, the common case for entries
/// produced by discovery or registry resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestAdapter {
    manifest: ExtensionManifest,
    source: ExtensionSource,
}

impl ManifestAdapter {
    pub fn new(manifest: ExtensionManifest, source: ExtensionSource) -> Self {
        Self { manifest, source }
    }
}

impl ExtensionAdapter for ManifestAdapter {
    fn manifest(&self) -> &ExtensionManifest {
        &self.manifest
    }

    fn source(&self) -> ExtensionSource {
        self.source
    }
}

/// In-process registry of bound extensions.
#[derive(Debug, Default)]
pub struct ExtensionHost {
    entries: BTreeMap<String, RegisteredExtension>,
    class_index: BTreeMap<String, BTreeSet<String>>,
}

impl ExtensionHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one adapter after manifest validation.
    pub fn register_adapter(&mut self, adapter: &impl ExtensionAdapter) -> Result<(), KernelError> {
        let manifest = adapter.manifest().clone();
        manifest.validate().map_err(KernelError::InvalidManifest)?;

        let package_name = manifest.package_name.clone();
        if self.entries.contains_key(package_name.as_str()) {
            return Err(KernelError::DuplicatePackageName(package_name));
        }

        if !manifest.extension_class.is_empty() {
            self.class_index
                .entry(manifest.extension_class.clone())
                .or_default()
                .insert(package_name.clone());
        }
        self.entries.insert(
            package_name,
            RegisteredExtension {
                manifest,
                source: adapter.source(),
            },
        );
        Ok(())
    }

    /// Registers every adapter, collecting per-adapter failures.
    pub fn register_all(
        &mut self,
        adapters: &[ManifestAdapter],
    ) -> Vec<(String, KernelError)> {
        let mut failures = Vec::new();
        for adapter in adapters {
            if let Err(err) = self.register_adapter(adapter) {
                failures.push((adapter.manifest().package_name.clone(), err));
            }
        }
        failures
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, package_name: &str) -> Option<&RegisteredExtension> {
        self.entries.get(package_name)
    }

    /// Registered extensions with the given class tag.
    pub fn list_by_class(&self, class: &str) -> Vec<&RegisteredExtension> {
        let Some(names) = self.class_index.get(class) else {
            return vec![];
        };
        names
            .iter()
            .filter_map(|name| self.entries.get(name))
            .collect()
    }

    /// Registered extensions of the given kind.
    pub fn list_by_kind(&self, kind: ExtensionKind) -> Vec<&RegisteredExtension> {
        self.entries
            .values()
            .filter(|entry| entry.manifest.kind() == Some(kind))
            .collect()
    }
}

/// Manifest file name expected inside each discovered extension directory.
pub const DISCOVERY_MANIFEST_FILE: &str = "extension.json";

/// Scans one directory level for `<package>/extension.json` manifests.
///
/// The startup discovery step: callers feed the returned adapters into
/// [`ExtensionHost::register_all`]. A missing directory yields an empty set;
/// unparseable or invalid manifests are logged and skipped so one broken
/// extension cannot block the rest.
pub fn discover_extensions(dir: &Path, source: ExtensionSource) -> Vec<ManifestAdapter> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(
                "event=discovery_skipped module=extension dir={} reason={err}",
                dir.display()
            );
            return vec![];
        }
    };

    let mut adapters = Vec::new();
    for entry in entries.flatten() {
        let manifest_path = entry.path().join(DISCOVERY_MANIFEST_FILE);
        if !manifest_path.is_file() {
            continue;
        }
        let raw = match std::fs::read_to_string(&manifest_path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(
                    "event=discovery_manifest_unreadable module=extension path={} reason={err}",
                    manifest_path.display()
                );
                continue;
            }
        };
        let manifest: ExtensionManifest = match serde_json::from_str(&raw) {
            Ok(manifest) => manifest,
            Err(err) => {
                warn!(
                    "event=discovery_manifest_invalid module=extension path={} reason={err}",
                    manifest_path.display()
                );
                continue;
            }
        };
        if let Err(err) = manifest.validate() {
            warn!(
                "event=discovery_manifest_rejected module=extension path={} reason={err}",
                manifest_path.display()
            );
            continue;
        }
        adapters.push(ManifestAdapter::new(manifest, source));
    }

    // read_dir order is platform-dependent; sort for a stable registration order.
    adapters.sort_by(|a, b| a.manifest.package_name.cmp(&b.manifest.package_name));
    adapters
}

/// Host registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    InvalidManifest(ManifestValidationError),
    DuplicatePackageName(String),
}

impl Display for KernelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidManifest(err) => write!(f, "invalid extension manifest: {err}"),
            Self::DuplicatePackageName(value) => {
                write!(f, "extension package already registered: {value}")
            }
        }
    }
}

impl Error for KernelError {}
