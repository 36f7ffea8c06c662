//! Extension collection document model.
//!
//! # Responsibility
//! - Mirror the on-disk JSON schema of one registry source.
//! - Preserve group insertion order so flattening stays deterministic.
//!
//! # Invariants
//! - `tabs_in_groups` iterates in JSON document order, never sorted.
//! - Unknown top-level keys are captured, not rejected.

use crate::extension::manifest::ExtensionManifest;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::{self, Formatter};

/// Group-name to manifest-list mapping in document order.
///
/// Group names carry no meaning beyond organization and are dropped when
/// tabs are flattened, but their order decides flattened output order, so a
/// sorted map is not an option.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabGroups(Vec<(String, Vec<ExtensionManifest>)>);

impl TabGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one group, keeping insertion order.
    pub fn insert(&mut self, group: impl Into<String>, tabs: Vec<ExtensionManifest>) {
        self.0.push((group.into(), tabs));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates groups in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ExtensionManifest])> {
        self.0
            .iter()
            .map(|(name, tabs)| (name.as_str(), tabs.as_slice()))
    }

    /// Iterates group manifest lists in document order, names dropped.
    pub fn values(&self) -> impl Iterator<Item = &[ExtensionManifest]> {
        self.0.iter().map(|(_, tabs)| tabs.as_slice())
    }
}

impl Serialize for TabGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, tabs) in &self.0 {
            map.serialize_entry(name, tabs)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TabGroups {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TabGroupsVisitor;

        impl<'de> Visitor<'de> for TabGroupsVisitor {
            type Value = TabGroups;

            fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str("a map of group name to manifest list")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut groups = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, tabs)) =
                    access.next_entry::<String, Vec<ExtensionManifest>>()?
                {
                    groups.push((name, tabs));
                }
                Ok(TabGroups(groups))
            }
        }

        deserializer.deserialize_map(TabGroupsVisitor)
    }
}

/// One loaded registry source document.
///
/// Missing sections default to empty so a partial document (for example a
/// user-authored external file holding only `decorators`) still loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionCollection {
    /// Legacy flat list of interface tabs.
    pub tabs: Vec<ExtensionManifest>,
    /// Grouped interface tabs; groups are organizational only.
    #[serde(rename = "tabsInGroups")]
    pub tabs_in_groups: TabGroups,
    /// Generation decorators; no grouping structure applies.
    pub decorators: Vec<ExtensionManifest>,
    /// Documentation template entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_extension: Option<ExtensionManifest>,
    /// Stray top-level keys, kept for the first-source-wins gap-fill rule.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ExtensionCollection {
    /// The degenerate collection every unavailable source resolves to.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
            && self.tabs_in_groups.is_empty()
            && self.decorators.is_empty()
            && self.example_extension.is_none()
            && self.extra.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{ExtensionCollection, TabGroups};
    use crate::extension::manifest::ExtensionManifest;

    fn manifest(package_name: &str) -> ExtensionManifest {
        ExtensionManifest {
            package_name: package_name.to_string(),
            ..ExtensionManifest::default()
        }
    }

    #[test]
    fn tab_groups_preserve_document_order() {
        // Keys chosen in reverse-alphabetical order to catch sorted maps.
        let json = r#"{
            "tabsInGroups": {
                "zeta": [{"package_name": "z1"}],
                "alpha": [{"package_name": "a1"}, {"package_name": "a2"}],
                "mid": [{"package_name": "m1"}]
            }
        }"#;
        let collection: ExtensionCollection = serde_json::from_str(json).expect("valid document");
        let names: Vec<&str> = collection
            .tabs_in_groups
            .iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let collection: ExtensionCollection = serde_json::from_str("{}").expect("empty document");
        assert!(collection.is_empty());
    }

    #[test]
    fn stray_keys_are_captured() {
        let json = r#"{"tabs": [], "schema_version": 2}"#;
        let collection: ExtensionCollection = serde_json::from_str(json).expect("valid document");
        assert_eq!(
            collection.extra.get("schema_version"),
            Some(&serde_json::json!(2))
        );
    }

    #[test]
    fn empty_collection_serializes_to_skeleton_sections() {
        let rendered =
            serde_json::to_string(&ExtensionCollection::empty()).expect("serializable skeleton");
        assert!(rendered.contains("\"tabs\":[]"));
        assert!(rendered.contains("\"tabsInGroups\":{}"));
        assert!(rendered.contains("\"decorators\":[]"));
        assert!(!rendered.contains("example_extension"));
    }

    #[test]
    fn round_trips_grouped_tabs() {
        let mut groups = TabGroups::new();
        groups.insert("voice", vec![manifest("b"), manifest("a")]);
        groups.insert("audio", vec![manifest("c")]);
        let collection = ExtensionCollection {
            tabs: vec![manifest("root")],
            tabs_in_groups: groups,
            ..ExtensionCollection::default()
        };

        let rendered = serde_json::to_string(&collection).expect("serialize");
        let parsed: ExtensionCollection = serde_json::from_str(&rendered).expect("parse");
        assert_eq!(parsed, collection);
    }
}
