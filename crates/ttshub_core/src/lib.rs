//! Core registry and generation-pipeline logic for TTS Hub.
//! This crate is the single source of truth for extension resolution invariants.

pub mod catalog;
pub mod config;
pub mod envfile;
pub mod extension;
pub mod logging;
pub mod pipeline;

pub use catalog::{CatalogSync, CatalogSyncError, SyncAction, SyncReport};
pub use config::{AppConfig, ConfigError};
pub use envfile::{EnvStore, EnvStoreError};
pub use extension::collection::{ExtensionCollection, TabGroups};
pub use extension::ingest::{add_to_external, parse_manifest_input, IngestError, IngestReport};
pub use extension::kernel::{
    discover_extensions, ExtensionAdapter, ExtensionHost, ExtensionSource, KernelError,
    ManifestAdapter, RegisteredExtension,
};
pub use extension::loader::{
    create_empty_external_file, read_collection, RegistryPaths, SourceName, SourceUnavailable,
};
pub use extension::manifest::{
    known_extension_classes, ExtensionKind, ExtensionManifest, ManifestValidationError,
};
pub use extension::resolver::{
    dedupe_by_package_name, filter_by_kind_and_class, flatten_interface_tabs,
    merge_collection_metadata, ExtensionResolver,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use pipeline::{AudioClip, GenerationResult, Pipeline, Stage, StageError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
