//! Extension manifest record and ingestion-time validation.
//!
//! # Responsibility
//! - Define the flat manifest record shared by all registry sources.
//! - Validate manifests entering the registry (ingestion, kernel registration).
//!
//! # Invariants
//! - The resolver never validates: unknown or half-filled entries pass through.
//! - An empty `package_name` marks an entry that can never be deduplicated.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Class tag for text-to-speech interface tabs.
pub const EXTENSION_CLASS_TEXT_TO_SPEECH: &str = "text-to-speech";
/// Class tag for music/audio generation interface tabs.
pub const EXTENSION_CLASS_AUDIO_MUSIC_GENERATION: &str = "audio-music-generation";
/// Class tag for audio conversion interface tabs.
pub const EXTENSION_CLASS_AUDIO_CONVERSION: &str = "audio-conversion";
/// Class tag for tooling interface tabs.
pub const EXTENSION_CLASS_TOOLS: &str = "tools";
/// Class tag for settings interface tabs.
pub const EXTENSION_CLASS_SETTINGS: &str = "settings";
/// Class tag for decorators applied around the whole generation call.
pub const EXTENSION_CLASS_OUTER: &str = "outer";
/// Class tag for decorators applied closest to the generation call.
pub const EXTENSION_CLASS_INNER: &str = "inner";

const KNOWN_EXTENSION_CLASSES: &[&str] = &[
    EXTENSION_CLASS_TEXT_TO_SPEECH,
    EXTENSION_CLASS_AUDIO_MUSIC_GENERATION,
    EXTENSION_CLASS_AUDIO_CONVERSION,
    EXTENSION_CLASS_TOOLS,
    EXTENSION_CLASS_SETTINGS,
    EXTENSION_CLASS_OUTER,
    EXTENSION_CLASS_INNER,
];

/// Returns the conventional extension-class tags.
///
/// The field itself is free-form; these are the values the stock registry
/// ships with.
pub fn known_extension_classes() -> &'static [&'static str] {
    KNOWN_EXTENSION_CLASSES
}

/// Extension kind: UI tab or generation decorator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionKind {
    Interface,
    Decorator,
}

impl ExtensionKind {
    /// Stable string id used in manifest `extension_type` fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Interface => "interface",
            Self::Decorator => "decorator",
        }
    }
}

/// One installable/loadable extension described by a registry source.
///
/// Every field defaults to an empty string when absent in JSON: sources are
/// user-editable files and a half-filled entry must still load and display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionManifest {
    /// Unique key within a collection. Empty means "never deduplicated".
    pub package_name: String,
    /// Display title.
    pub name: String,
    pub description: String,
    /// Installable package reference handed to the install collaborator.
    pub requirements: String,
    /// `interface` or `decorator`; compared via [`ExtensionKind::as_str`].
    pub extension_type: String,
    /// Conventional class tag, see [`known_extension_classes`].
    pub extension_class: String,
    pub author: String,
    pub extension_author: String,
    pub license: String,
    pub website: String,
    pub extension_website: String,
    pub extension_platform_version: String,
}

impl ExtensionManifest {
    /// Whether this entry carries an identity usable for deduplication.
    pub fn has_package_name(&self) -> bool {
        !self.package_name.is_empty()
    }

    /// Returns the parsed kind when `extension_type` holds a known value.
    pub fn kind(&self) -> Option<ExtensionKind> {
        match self.extension_type.as_str() {
            "interface" => Some(ExtensionKind::Interface),
            "decorator" => Some(ExtensionKind::Decorator),
            _ => None,
        }
    }

    /// Validates a manifest entering the registry.
    ///
    /// Applies only to ingestion and kernel registration; resolver reads pass
    /// entries through untouched.
    pub fn validate(&self) -> Result<(), ManifestValidationError> {
        let package_name = self.package_name.trim();
        if package_name.is_empty() {
            return Err(ManifestValidationError::MissingPackageName);
        }
        if !is_valid_package_name(package_name) {
            return Err(ManifestValidationError::InvalidPackageName(
                self.package_name.clone(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(ManifestValidationError::MissingField("name"));
        }
        if self.requirements.trim().is_empty() {
            return Err(ManifestValidationError::MissingField("requirements"));
        }
        if self.extension_type.trim().is_empty() {
            return Err(ManifestValidationError::MissingField("extension_type"));
        }
        if self.kind().is_none() {
            return Err(ManifestValidationError::UnknownKind(
                self.extension_type.clone(),
            ));
        }
        Ok(())
    }
}

fn is_valid_package_name(value: &str) -> bool {
    let mut chars = value.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
        return false;
    }

    let mut prev_separator = false;
    for c in chars {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            prev_separator = false;
            continue;
        }
        if c == '.' || c == '_' || c == '-' {
            if prev_separator {
                return false;
            }
            prev_separator = true;
            continue;
        }
        return false;
    }
    !prev_separator
}

/// Manifest validation errors for ingestion/registration paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestValidationError {
    MissingPackageName,
    InvalidPackageName(String),
    MissingField(&'static str),
    UnknownKind(String),
}

impl Display for ManifestValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPackageName => write!(f, "manifest package_name must not be empty"),
            Self::InvalidPackageName(value) => {
                write!(f, "manifest package_name is invalid: {value}")
            }
            Self::MissingField(name) => write!(f, "manifest field must not be empty: {name}"),
            Self::UnknownKind(value) => write!(
                f,
                "manifest extension_type is unsupported: {value} (expected interface|decorator)"
            ),
        }
    }
}

impl Error for ManifestValidationError {}

#[cfg(test)]
mod tests {
    use super::{
        known_extension_classes, ExtensionKind, ExtensionManifest, ManifestValidationError,
    };

    fn valid_manifest() -> ExtensionManifest {
        ExtensionManifest {
            package_name: "extension_bark".to_string(),
            name: "Bark".to_string(),
            requirements: "extension_bark@git+https://example.invalid/bark".to_string(),
            extension_type: "interface".to_string(),
            extension_class: "text-to-speech".to_string(),
            ..ExtensionManifest::default()
        }
    }

    #[test]
    fn validates_complete_manifest() {
        assert!(valid_manifest().validate().is_ok());
    }

    #[test]
    fn deserializes_with_all_fields_absent() {
        let manifest: ExtensionManifest = serde_json::from_str("{}").expect("empty object parses");
        assert!(!manifest.has_package_name());
        assert!(manifest.kind().is_none());
    }

    #[test]
    fn rejects_missing_package_name() {
        let mut manifest = valid_manifest();
        manifest.package_name.clear();
        assert_eq!(
            manifest.validate().unwrap_err(),
            ManifestValidationError::MissingPackageName
        );
    }

    #[test]
    fn rejects_malformed_package_name() {
        let mut manifest = valid_manifest();
        manifest.package_name = "Extension Bark".to_string();
        assert!(matches!(
            manifest.validate().unwrap_err(),
            ManifestValidationError::InvalidPackageName(_)
        ));

        manifest.package_name = "extension..bark".to_string();
        assert!(matches!(
            manifest.validate().unwrap_err(),
            ManifestValidationError::InvalidPackageName(_)
        ));
    }

    #[test]
    fn rejects_unknown_extension_type() {
        let mut manifest = valid_manifest();
        manifest.extension_type = "widget".to_string();
        assert_eq!(
            manifest.validate().unwrap_err(),
            ManifestValidationError::UnknownKind("widget".to_string())
        );
    }

    #[test]
    fn rejects_missing_required_display_fields() {
        let mut manifest = valid_manifest();
        manifest.name = "   ".to_string();
        assert_eq!(
            manifest.validate().unwrap_err(),
            ManifestValidationError::MissingField("name")
        );
    }

    #[test]
    fn known_classes_cover_interface_and_decorator_tags() {
        let classes = known_extension_classes();
        assert!(classes.contains(&"text-to-speech"));
        assert!(classes.contains(&"outer"));
        assert!(classes.contains(&"inner"));
    }

    #[test]
    fn parses_kind_from_type_string() {
        assert_eq!(valid_manifest().kind(), Some(ExtensionKind::Interface));
        let mut decorator = valid_manifest();
        decorator.extension_type = "decorator".to_string();
        assert_eq!(decorator.kind(), Some(ExtensionKind::Decorator));
    }
}
