//! Metadata stage: describe one generation and persist the JSON sidecar.

use crate::pipeline::{GenerationResult, Stage, StageError};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::fs;

/// Schema marker written into every metadata document.
pub const METADATA_VERSION: &str = "0.0.1";
/// Hash-scheme marker; bump when `audio_sha256` changes its input layout.
pub const METADATA_HASH_VERSION: &str = "0.0.2";

/// Hex sha-256 over the raw little-endian bytes of the sample buffer.
pub fn audio_sha256(samples: &[f32]) -> String {
    let mut hasher = Sha256::new();
    for sample in samples {
        hasher.update(sample.to_le_bytes());
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Builds the metadata document for one result.
pub fn build_metadata(result: &GenerationResult) -> Value {
    let mut document = json!({
        "_version": METADATA_VERSION,
        "_hash_version": METADATA_HASH_VERSION,
        "id": result.id,
        "model": result.model,
        "prompt": result.prompt,
        "long_form": result.long_form,
        "date": result.date.to_rfc3339(),
        "sample_rate": result.audio.sample_rate,
        "hash": audio_sha256(&result.audio.samples),
    });
    let map = document
        .as_object_mut()
        .expect("metadata document is an object");
    for (key, value) in &result.params {
        // Generation params never override the reserved fields above.
        map.entry(key.clone()).or_insert_with(|| value.clone());
    }
    document
}

/// Attaches metadata to the result and optionally writes the sidecar file.
pub struct MetadataStage {
    write_to_disk: bool,
}

impl MetadataStage {
    /// Attach-only variant for in-memory consumers.
    pub fn in_memory() -> Self {
        Self {
            write_to_disk: false,
        }
    }

    /// Stock variant: attach and write `<folder_root>/<filename>.json`.
    pub fn persisted() -> Self {
        Self {
            write_to_disk: true,
        }
    }
}

impl Stage for MetadataStage {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn apply(&self, mut result: GenerationResult) -> Result<GenerationResult, StageError> {
        let document = build_metadata(&result);

        if self.write_to_disk {
            let (filename, folder_root) = match (&result.filename, &result.folder_root) {
                (Some(filename), Some(folder_root)) => (filename, folder_root),
                _ => return Err(StageError::MissingFilename { stage: self.name() }),
            };
            let path = folder_root.join(format!("{filename}.json"));
            let rendered =
                serde_json::to_string_pretty(&document).map_err(|cause| StageError::Render {
                    stage: self.name(),
                    cause,
                })?;
            fs::write(&path, rendered).map_err(|cause| StageError::Io {
                stage: self.name(),
                path,
                cause,
            })?;
        }

        result.metadata = Some(document);
        Ok(result)
    }
}
