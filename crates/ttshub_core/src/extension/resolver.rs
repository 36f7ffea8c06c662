//! Extension registry resolver.
//!
//! # Responsibility
//! - Produce deduplicated, precedence-ordered manifest views across the
//!   base, catalog and external sources.
//! - Offer pure type/class filters over resolved manifest lists.
//!
//! # Invariants
//! - Precedence for overlapping `package_name`s: external > catalog > base,
//!   implemented as concatenation order with keep-first deduplication.
//! - Output order is stable: first occurrence wins, never sorted.
//! - Unavailable sources degrade to empty collections; resolution never fails.
//! - Every call re-reads from disk; results are idempotent for unchanged files.

use crate::extension::collection::ExtensionCollection;
use crate::extension::loader::{read_collection, RegistryPaths, SourceName, SourceUnavailable};
use crate::extension::manifest::{ExtensionKind, ExtensionManifest};
use log::{debug, warn};
use std::collections::BTreeSet;

/// Precedence-aware read-only view over the three registry sources.
pub struct ExtensionResolver {
    paths: RegistryPaths,
}

impl ExtensionResolver {
    pub fn new(paths: RegistryPaths) -> Self {
        Self { paths }
    }

    /// Resolver over the stock working-directory layout.
    pub fn with_standard_paths() -> Self {
        Self::new(RegistryPaths::standard())
    }

    pub fn paths(&self) -> &RegistryPaths {
        &self.paths
    }

    /// Loads one source, absorbing unavailability into an empty collection.
    ///
    /// A missing optional file is routine and logged at debug; anything else
    /// (unreadable, broken JSON) is a warning. Neither propagates.
    pub fn load_collection(&self, source: SourceName) -> ExtensionCollection {
        match read_collection(source, self.paths.for_source(source)) {
            Ok(collection) => collection,
            Err(err @ SourceUnavailable::Missing { .. }) => {
                debug!("event=source_absent module=extension source={source} reason={err}");
                ExtensionCollection::empty()
            }
            Err(err) => {
                warn!("event=source_unavailable module=extension source={source} reason={err}");
                ExtensionCollection::empty()
            }
        }
    }

    /// Ordered, deduplicated interface extensions across all sources.
    pub fn interface_extensions(&self) -> Vec<ExtensionManifest> {
        let base = flatten_interface_tabs(&self.load_collection(SourceName::Base));
        let catalog = flatten_interface_tabs(&self.load_collection(SourceName::Catalog));
        let external = flatten_interface_tabs(&self.load_collection(SourceName::External));

        dedupe_by_package_name(
            external
                .into_iter()
                .chain(catalog)
                .chain(base),
        )
    }

    /// Ordered, deduplicated decorator extensions across all sources.
    pub fn decorator_extensions(&self) -> Vec<ExtensionManifest> {
        self.merged_metadata().decorators
    }

    /// Interface extensions filtered to one class.
    pub fn interface_extensions_by_class(&self, class: &str) -> Vec<ExtensionManifest> {
        filter_by_kind_and_class(
            &self.interface_extensions(),
            ExtensionKind::Interface,
            Some(class),
        )
    }

    /// Decorator extensions filtered to one class.
    pub fn decorator_extensions_by_class(&self, class: &str) -> Vec<ExtensionManifest> {
        filter_by_kind_and_class(
            &self.decorator_extensions(),
            ExtensionKind::Decorator,
            Some(class),
        )
    }

    /// The documentation template entry from the merged view.
    pub fn extension_example(&self) -> Option<ExtensionManifest> {
        self.merged_metadata().example_extension
    }

    /// Base-precedence merged view of collection metadata.
    ///
    /// Tabs and groups are taken from base untouched (interface resolution
    /// flattens per source instead); decorators merge with full precedence;
    /// the example entry and stray keys gap-fill in base, catalog, external
    /// order.
    pub fn merged_metadata(&self) -> ExtensionCollection {
        let base = self.load_collection(SourceName::Base);
        let catalog = self.load_collection(SourceName::Catalog);
        let external = self.load_collection(SourceName::External);

        let mut merged = ExtensionCollection {
            tabs: base.tabs,
            tabs_in_groups: base.tabs_in_groups,
            decorators: dedupe_by_package_name(
                external
                    .decorators
                    .into_iter()
                    .chain(catalog.decorators)
                    .chain(base.decorators),
            ),
            example_extension: base.example_extension,
            extra: base.extra,
        };

        for source in [catalog.example_extension, external.example_extension] {
            if merged.example_extension.is_none() {
                merged.example_extension = source;
            }
        }
        for extra in [catalog.extra, external.extra] {
            for (key, value) in extra {
                merged.extra.entry(key).or_insert(value);
            }
        }

        merged
    }
}

impl Default for ExtensionResolver {
    fn default() -> Self {
        Self::with_standard_paths()
    }
}

/// Flattens one collection's interface tabs into a single deduplicated list.
///
/// Order contract: `tabs` first, then each group's list in group insertion
/// order; keep-first deduplication by `package_name`.
pub fn flatten_interface_tabs(collection: &ExtensionCollection) -> Vec<ExtensionManifest> {
    dedupe_by_package_name(
        collection
            .tabs
            .iter()
            .chain(collection.tabs_in_groups.values().flatten())
            .cloned(),
    )
}

/// Keep-first deduplication by `package_name`.
///
/// Entries with an empty `package_name` are always included: with no identity
/// to match on they are treated as always-novel. Documented tolerance, not a
/// recommended usage pattern.
pub fn dedupe_by_package_name(
    manifests: impl IntoIterator<Item = ExtensionManifest>,
) -> Vec<ExtensionManifest> {
    let mut seen = BTreeSet::<String>::new();
    let mut out = Vec::new();
    for manifest in manifests {
        if manifest.has_package_name() {
            if seen.contains(&manifest.package_name) {
                continue;
            }
            seen.insert(manifest.package_name.clone());
        }
        out.push(manifest);
    }
    out
}

/// Pure filter by kind and (optionally) class. Order is preserved.
pub fn filter_by_kind_and_class(
    manifests: &[ExtensionManifest],
    kind: ExtensionKind,
    class: Option<&str>,
) -> Vec<ExtensionManifest> {
    manifests
        .iter()
        .filter(|manifest| manifest.extension_type == kind.as_str())
        .filter(|manifest| class.map_or(true, |class| manifest.extension_class == class))
        .cloned()
        .collect()
}

/// Pairwise metadata merge of two collections.
///
/// Decorators concatenate (base first) and deduplicate; tabs and groups are
/// never touched here (interface resolution handles those); the example entry
/// and stray keys fill gaps only when base lacks them entirely.
pub fn merge_collection_metadata(
    base: ExtensionCollection,
    additional: ExtensionCollection,
) -> ExtensionCollection {
    let mut merged = ExtensionCollection {
        tabs: base.tabs,
        tabs_in_groups: base.tabs_in_groups,
        decorators: dedupe_by_package_name(
            base.decorators.into_iter().chain(additional.decorators),
        ),
        example_extension: base.example_extension.or(additional.example_extension),
        extra: base.extra,
    };
    for (key, value) in additional.extra {
        merged.extra.entry(key).or_insert(value);
    }
    merged
}
