// SPDX-License-Identifier: MIT OR Apache-2.0
//! Path file format (`path.json`).
//!
//! ```json
//! { "version": 1, "keyframes": [ { "id": "...", "pose": { ... }, "t": 0.0 } ] }
//! ```

use crate::keyframe::Keyframe;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Current path file format version
pub const PATH_FORMAT_VERSION: u32 = 1;

/// Path file errors
#[derive(Debug, Error)]
pub enum PathFileError {
    /// JSON could not be parsed or written
    #[error("Invalid path data: {0}")]
    Json(#[from] serde_json::Error),

    /// The `keyframes` array is missing
    #[error("Invalid path data: missing keyframes")]
    MissingKeyframes,

    /// File was written by a newer version
    #[error("Unsupported path format version {0}")]
    UnsupportedVersion(u32),

    /// Reading or writing the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct PathFileOut<'a> {
    version: u32,
    keyframes: &'a [Keyframe],
}

#[derive(Deserialize)]
struct PathFileIn {
    version: Option<u32>,
    keyframes: Option<Vec<Keyframe>>,
}

/// Serialize keyframes as pretty JSON
pub fn export_path(keyframes: &[Keyframe]) -> Result<String, PathFileError> {
    Ok(serde_json::to_string_pretty(&PathFileOut {
        version: PATH_FORMAT_VERSION,
        keyframes,
    })?)
}

/// Parse keyframes from JSON, sorted by time
pub fn import_path(raw: &str) -> Result<Vec<Keyframe>, PathFileError> {
    let parsed: PathFileIn = serde_json::from_str(raw)?;
    if let Some(version) = parsed.version.filter(|v| *v > PATH_FORMAT_VERSION) {
        return Err(PathFileError::UnsupportedVersion(version));
    }
    let mut keyframes = parsed.keyframes.ok_or(PathFileError::MissingKeyframes)?;
    keyframes.sort_by(|a, b| a.t.total_cmp(&b.t));
    Ok(keyframes)
}

/// Read a path file from disk
pub fn load_path(path: &Path) -> Result<Vec<Keyframe>, PathFileError> {
    let raw = std::fs::read_to_string(path)?;
    import_path(&raw)
}

/// Write a path file to disk
pub fn save_path(path: &Path, keyframes: &[Keyframe]) -> Result<(), PathFileError> {
    std::fs::write(path, export_path(keyframes)?)?;
    tracing::info!("Saved {} keyframes to {:?}", keyframes.len(), path);
    Ok(())
}
