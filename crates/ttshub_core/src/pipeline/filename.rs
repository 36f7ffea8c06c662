//! Base-filename stage: derive the output name and folder for one generation.

use crate::pipeline::{GenerationResult, Stage, StageError};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::PathBuf;

const TITLE_MAX_CHARS: usize = 30;

static NON_ALNUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

/// Reduces a prompt to a filesystem-safe title fragment.
///
/// Lowercased, runs of non-alphanumerics collapsed to `_`, capped at
/// 30 chars, `untitled` when nothing survives.
pub fn prompt_to_title(prompt: &str) -> String {
    let lowered = prompt.to_lowercase();
    let slug = NON_ALNUM_RE.replace_all(&lowered, "_");
    let trimmed: String = slug.trim_matches('_').chars().take(TITLE_MAX_CHARS).collect();
    let trimmed = trimmed.trim_end_matches('_').to_string();
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed
    }
}

/// Date fragment used in output filenames.
pub fn format_date_for_file(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// Canonical output filename: `{date}__{model}__{title}`.
pub fn format_filename(title: &str, model: &str, date: &str) -> String {
    format!("{date}__{model}__{title}")
}

/// Fills `filename` and `folder_root`, creating the output folder.
pub struct BaseFilenameStage {
    outputs_dir: PathBuf,
    create_dirs: bool,
}

impl BaseFilenameStage {
    pub fn new(outputs_dir: impl Into<PathBuf>) -> Self {
        Self {
            outputs_dir: outputs_dir.into(),
            create_dirs: true,
        }
    }

    /// Variant that only names the result, for callers that lay out
    /// directories themselves.
    pub fn naming_only(outputs_dir: impl Into<PathBuf>) -> Self {
        Self {
            outputs_dir: outputs_dir.into(),
            create_dirs: false,
        }
    }
}

impl Stage for BaseFilenameStage {
    fn name(&self) -> &'static str {
        "base_filename"
    }

    fn apply(&self, mut result: GenerationResult) -> Result<GenerationResult, StageError> {
        let mut title = prompt_to_title(&result.prompt);
        if result.long_form {
            title.push_str("_long");
        }
        let filename = format_filename(
            &title,
            &prompt_to_title(&result.model),
            &format_date_for_file(result.date),
        );
        let folder_root = self.outputs_dir.join(&filename);

        if self.create_dirs {
            fs::create_dir_all(&folder_root).map_err(|cause| StageError::Io {
                stage: self.name(),
                path: folder_root.clone(),
                cause,
            })?;
        }

        result.filename = Some(filename);
        result.folder_root = Some(folder_root);
        Ok(result)
    }
}
