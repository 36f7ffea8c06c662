//! External-source ingestion: pasted JSON in, external overrides file out.
//!
//! # Responsibility
//! - Parse operator-supplied manifest JSON (single object or array).
//! - Append novel entries to the external overrides file.
//!
//! # Invariants
//! - Only entries passing `ExtensionManifest::validate` reach disk.
//! - Entries whose `package_name` already exists in external `tabs` are
//!   skipped, never overwritten.

use crate::extension::collection::ExtensionCollection;
use crate::extension::loader::{read_collection, SourceName, SourceUnavailable};
use crate::extension::manifest::ExtensionManifest;
use log::info;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

/// Outcome of parsing operator-supplied manifest JSON.
#[derive(Debug, Default)]
pub struct ParseReport {
    /// Entries that validated.
    pub accepted: Vec<ExtensionManifest>,
    /// Human-readable problems, one per rejected entry.
    pub problems: Vec<String>,
}

impl ParseReport {
    pub fn summary(&self) -> String {
        let mut summary = format!("Parsed entries: {}", self.accepted.len());
        if !self.problems.is_empty() {
            summary.push_str(" | Issues: ");
            summary.push_str(&self.problems.join(" ; "));
        }
        summary
    }
}

/// Ingestion failures surfaced to the operator.
#[derive(Debug)]
pub enum IngestError {
    /// Input was not JSON at all.
    InvalidJson(serde_json::Error),
    /// Input was valid JSON but not an object or array of objects.
    UnexpectedShape,
    /// External file exists but cannot be read or parsed.
    ExternalUnavailable(SourceUnavailable),
    /// External file could not be written back.
    WriteFailed(std::io::Error),
    /// Updated collection could not be rendered to JSON.
    RenderFailed(serde_json::Error),
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(cause) => write!(f, "JSON parse error: {cause}"),
            Self::UnexpectedShape => {
                write!(f, "expected a JSON object or an array of objects")
            }
            Self::ExternalUnavailable(cause) => write!(f, "external file unavailable: {cause}"),
            Self::WriteFailed(cause) => write!(f, "failed to save external file: {cause}"),
            Self::RenderFailed(cause) => write!(f, "failed to render external file: {cause}"),
        }
    }
}

impl Error for IngestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidJson(cause) => Some(cause),
            Self::UnexpectedShape => None,
            Self::ExternalUnavailable(cause) => Some(cause),
            Self::WriteFailed(cause) => Some(cause),
            Self::RenderFailed(cause) => Some(cause),
        }
    }
}

/// Parses pasted manifest JSON into validated entries plus a problem report.
///
/// Accepts either a single manifest object or an array of them; non-object
/// array elements and invalid entries are reported, not fatal.
pub fn parse_manifest_input(text: &str) -> Result<ParseReport, IngestError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(ParseReport {
            problems: vec!["No JSON provided".to_string()],
            ..ParseReport::default()
        });
    }

    let value: Value = serde_json::from_str(text).map_err(IngestError::InvalidJson)?;
    let candidates: Vec<Value> = match value {
        Value::Object(_) => vec![value],
        Value::Array(items) => items,
        _ => return Err(IngestError::UnexpectedShape),
    };

    let mut report = ParseReport::default();
    for (index, candidate) in candidates.into_iter().enumerate() {
        if !candidate.is_object() {
            report.problems.push(format!("Entry {index}: not an object"));
            continue;
        }
        let manifest: ExtensionManifest = match serde_json::from_value(candidate) {
            Ok(manifest) => manifest,
            Err(err) => {
                report.problems.push(format!("Entry {index}: {err}"));
                continue;
            }
        };
        match manifest.validate() {
            Ok(()) => report.accepted.push(manifest),
            Err(err) => report.problems.push(format!("Entry {index}: {err}")),
        }
    }
    Ok(report)
}

/// Outcome of appending entries to the external overrides file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub added: Vec<String>,
    pub skipped: Vec<String>,
}

/// Appends novel entries to the external file's `tabs` list.
///
/// An absent external file starts from the empty skeleton. Entries already
/// present by `package_name` are skipped and reported.
pub fn add_to_external(
    path: &Path,
    entries: Vec<ExtensionManifest>,
) -> Result<IngestReport, IngestError> {
    let mut collection = match read_collection(SourceName::External, path) {
        Ok(collection) => collection,
        Err(SourceUnavailable::Missing { .. }) => ExtensionCollection::empty(),
        Err(err) => return Err(IngestError::ExternalUnavailable(err)),
    };

    let mut report = IngestReport::default();
    for entry in entries {
        let exists = collection
            .tabs
            .iter()
            .any(|tab| tab.package_name == entry.package_name);
        if exists {
            report.skipped.push(entry.package_name);
            continue;
        }
        report.added.push(entry.package_name.clone());
        collection.tabs.push(entry);
    }

    if !report.added.is_empty() {
        let rendered =
            serde_json::to_string_pretty(&collection).map_err(IngestError::RenderFailed)?;
        fs::write(path, rendered).map_err(IngestError::WriteFailed)?;
        info!(
            "event=external_entries_added module=extension count={} path={}",
            report.added.len(),
            path.display()
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::{add_to_external, parse_manifest_input, IngestError};
    use crate::extension::loader::{read_collection, SourceName};
    use crate::extension::manifest::ExtensionManifest;

    fn entry_json(package_name: &str) -> String {
        format!(
            r#"{{
                "package_name": "{package_name}",
                "name": "Entry",
                "requirements": "{package_name}@git+https://example.invalid/repo",
                "extension_type": "interface",
                "extension_class": "text-to-speech"
            }}"#
        )
    }

    #[test]
    fn parses_single_object_and_array() {
        let single = parse_manifest_input(&entry_json("extension_a")).expect("parse single");
        assert_eq!(single.accepted.len(), 1);
        assert!(single.problems.is_empty());

        let array_text = format!("[{}, {}]", entry_json("extension_a"), entry_json("extension_b"));
        let array = parse_manifest_input(&array_text).expect("parse array");
        assert_eq!(array.accepted.len(), 2);
    }

    #[test]
    fn reports_invalid_entries_without_failing() {
        let text = format!(r#"[{}, {{"name": "no package"}}]"#, entry_json("extension_a"));
        let report = parse_manifest_input(&text).expect("parse");
        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.problems.len(), 1);
        assert!(report.summary().contains("Issues"));
    }

    #[test]
    fn rejects_non_object_input() {
        let err = parse_manifest_input("42").expect_err("scalar input must fail");
        assert!(matches!(err, IngestError::UnexpectedShape));

        let err = parse_manifest_input("{oops").expect_err("broken JSON must fail");
        assert!(matches!(err, IngestError::InvalidJson(_)));
    }

    #[test]
    fn empty_input_reports_a_problem() {
        let report = parse_manifest_input("   ").expect("empty input is not fatal");
        assert!(report.accepted.is_empty());
        assert_eq!(report.problems, vec!["No JSON provided".to_string()]);
    }

    #[test]
    fn add_to_external_skips_existing_package_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("extensions.external.json");

        let first = ExtensionManifest {
            package_name: "extension_a".to_string(),
            ..ExtensionManifest::default()
        };
        let report = add_to_external(&path, vec![first.clone()]).expect("first add");
        assert_eq!(report.added, vec!["extension_a".to_string()]);

        let second = ExtensionManifest {
            package_name: "extension_b".to_string(),
            ..ExtensionManifest::default()
        };
        let report = add_to_external(&path, vec![first, second]).expect("second add");
        assert_eq!(report.added, vec!["extension_b".to_string()]);
        assert_eq!(report.skipped, vec!["extension_a".to_string()]);

        let external = read_collection(SourceName::External, &path).expect("external readable");
        assert_eq!(external.tabs.len(), 2);
    }
}
