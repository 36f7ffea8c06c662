//! Generation post-processing pipeline.
//!
//! # Responsibility
//! - Carry one generation's outputs through a declared sequence of stages.
//!
//! # Invariants
//! - Stage order is fixed at pipeline construction, never inferred from
//!   declaration order elsewhere.
//! - Each stage consumes and returns the whole result value; partial
//!   application is not representable.

pub mod filename;
pub mod metadata;

use chrono::{DateTime, Utc};
use log::debug;
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;
use uuid::Uuid;

use self::filename::BaseFilenameStage;
use self::metadata::MetadataStage;

/// Raw audio payload of one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

/// Value object flowing through the pipeline.
///
/// Model adapters fill the identity/payload fields; stages fill `filename`,
/// `folder_root` and `metadata`.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub id: Uuid,
    /// Model tag used in filenames and metadata, e.g. `bark`.
    pub model: String,
    /// Input text the audio was generated from.
    pub prompt: String,
    pub date: DateTime<Utc>,
    pub audio: AudioClip,
    /// Long-form generations get a filename suffix to stand out in listings.
    pub long_form: bool,
    /// Free-form generation parameters, copied into metadata verbatim.
    pub params: BTreeMap<String, Value>,
    pub filename: Option<String>,
    pub folder_root: Option<PathBuf>,
    pub metadata: Option<Value>,
}

impl GenerationResult {
    pub fn new(
        model: impl Into<String>,
        prompt: impl Into<String>,
        date: DateTime<Utc>,
        audio: AudioClip,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            model: model.into(),
            prompt: prompt.into(),
            date,
            audio,
            long_form: false,
            params: BTreeMap::new(),
            filename: None,
            folder_root: None,
            metadata: None,
        }
    }
}

/// One named post-processing step.
pub trait Stage {
    fn name(&self) -> &'static str;
    fn apply(&self, result: GenerationResult) -> Result<GenerationResult, StageError>;
}

/// Stage failures, attributed to the stage that raised them.
#[derive(Debug)]
pub enum StageError {
    Io {
        stage: &'static str,
        path: PathBuf,
        cause: io::Error,
    },
    /// A stage needed `filename`/`folder_root` that no earlier stage set.
    MissingFilename { stage: &'static str },
    Render {
        stage: &'static str,
        cause: serde_json::Error,
    },
}

impl Display for StageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { stage, path, cause } => {
                write!(f, "stage {stage}: I/O failed at {}: {cause}", path.display())
            }
            Self::MissingFilename { stage } => {
                write!(f, "stage {stage}: result has no filename; run the filename stage first")
            }
            Self::Render { stage, cause } => write!(f, "stage {stage}: render failed: {cause}"),
        }
    }
}

impl Error for StageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { cause, .. } => Some(cause),
            Self::MissingFilename { .. } => None,
            Self::Render { cause, .. } => Some(cause),
        }
    }
}

/// Ordered stage chain.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// The stock post-processing order: name the output, then describe it.
    pub fn standard(outputs_dir: impl Into<PathBuf>) -> Self {
        Self::new()
            .with_stage(BaseFilenameStage::new(outputs_dir))
            .with_stage(MetadataStage::persisted())
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Runs every stage in declared order, stopping at the first failure.
    pub fn run(&self, mut result: GenerationResult) -> Result<GenerationResult, StageError> {
        for stage in &self.stages {
            result = stage.apply(result)?;
            debug!(
                "event=stage_applied module=pipeline stage={} result_id={}",
                stage.name(),
                result.id
            );
        }
        Ok(result)
    }
}
