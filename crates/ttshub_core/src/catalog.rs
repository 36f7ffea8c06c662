//! Catalog git-sync collaborator.
//!
//! # Responsibility
//! - Produce/refresh the catalog work tree whose JSON file the resolver reads.
//!
//! # Invariants
//! - Failure leaves the catalog file absent or stale; the resolver degrades
//!   to "source absent" and the application keeps running.
//! - Sync is an explicitly triggered operation, never implicit in resolution.

use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::Command;

/// Default remote holding the curated extensions catalog.
pub const CATALOG_REPO_URL: &str = "https://github.com/rsxdalv/tts-webui-extension-catalog.git";
/// Default work-tree directory for the synced catalog.
pub const CATALOG_DIR: &str = "data/extensions-catalog";

const CATALOG_JSON_RELATIVE: &str = "lib/extensions.json";

/// What the sync operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Cloned,
    Pulled,
}

impl SyncAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cloned => "cloned",
            Self::Pulled => "pulled",
        }
    }
}

/// Successful sync summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub action: SyncAction,
    /// Trimmed git stdout, kept for operator display.
    pub detail: String,
    /// Location of the refreshed catalog JSON file.
    pub catalog_json: PathBuf,
}

/// Sync failures. All leave the previous catalog state untouched.
#[derive(Debug)]
pub enum CatalogSyncError {
    /// Git binary could not be launched at all.
    GitLaunch(std::io::Error),
    /// Git ran and exited non-zero.
    GitFailed { action: SyncAction, detail: String },
    /// Git succeeded but the work tree holds no catalog JSON.
    CatalogFileMissing(PathBuf),
}

impl Display for CatalogSyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GitLaunch(cause) => write!(f, "failed to launch git: {cause}"),
            Self::GitFailed { action, detail } => {
                write!(f, "git {} failed: {detail}", action.as_str())
            }
            Self::CatalogFileMissing(path) => {
                write!(f, "catalog JSON not found at {}", path.display())
            }
        }
    }
}

impl Error for CatalogSyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::GitLaunch(cause) => Some(cause),
            Self::GitFailed { .. } | Self::CatalogFileMissing(_) => None,
        }
    }
}

/// Explicitly triggered git clone/pull of the catalog repository.
#[derive(Debug, Clone)]
pub struct CatalogSync {
    dir: PathBuf,
    repo_url: String,
}

impl CatalogSync {
    pub fn new(dir: impl Into<PathBuf>, repo_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            repo_url: repo_url.into(),
        }
    }

    /// Stock catalog location and remote.
    pub fn standard() -> Self {
        Self::new(CATALOG_DIR, CATALOG_REPO_URL)
    }

    /// Path of the catalog JSON file inside the work tree.
    pub fn catalog_json_path(&self) -> PathBuf {
        self.dir.join(CATALOG_JSON_RELATIVE)
    }

    /// Clones the catalog when absent, otherwise fast-forward pulls it.
    pub fn sync(&self) -> Result<SyncReport, CatalogSyncError> {
        let (action, mut command) = if self.dir.join(".git").is_dir() {
            let mut command = Command::new("git");
            command
                .arg("-C")
                .arg(&self.dir)
                .args(["pull", "--ff-only"]);
            (SyncAction::Pulled, command)
        } else {
            let mut command = Command::new("git");
            command
                .args(["clone", "--depth=1"])
                .arg(&self.repo_url)
                .arg(&self.dir);
            (SyncAction::Cloned, command)
        };

        let output = command.output().map_err(CatalogSyncError::GitLaunch)?;
        if !output.status.success() {
            let detail = pick_git_detail(&output.stderr, &output.stdout);
            warn!(
                "event=catalog_sync_failed module=catalog action={} reason={detail}",
                action.as_str()
            );
            return Err(CatalogSyncError::GitFailed { action, detail });
        }

        let catalog_json = self.catalog_json_path();
        if !catalog_json.is_file() {
            return Err(CatalogSyncError::CatalogFileMissing(catalog_json));
        }

        let detail = pick_git_detail(&output.stdout, &output.stderr);
        info!(
            "event=catalog_synced module=catalog action={} dir={}",
            action.as_str(),
            self.dir.display()
        );
        Ok(SyncReport {
            action,
            detail,
            catalog_json,
        })
    }
}

fn pick_git_detail(primary: &[u8], fallback: &[u8]) -> String {
    let primary = String::from_utf8_lossy(primary).trim().to_string();
    if !primary.is_empty() {
        return primary;
    }
    let fallback = String::from_utf8_lossy(fallback).trim().to_string();
    if fallback.is_empty() {
        "no git output".to_string()
    } else {
        fallback
    }
}

/// Convenience used by operator-facing surfaces: one status line either way.
pub fn sync_status_line(result: &Result<SyncReport, CatalogSyncError>) -> String {
    match result {
        Ok(report) => format!("Synced catalog via git ({})", report.action.as_str()),
        Err(err) => format!("Catalog sync failed: {err}"),
    }
}
