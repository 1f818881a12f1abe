// SPDX-License-Identifier: MIT OR Apache-2.0
//! Export error taxonomy.

use splatpath_sequencer::RenderError;
use thiserror::Error;

/// Export inputs that cannot produce a video
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Export needs at least two keyframes
    #[error("Add at least 2 keyframes to export (have {0})")]
    NotEnoughKeyframes(usize),

    /// Path duration is zero, negative or not finite
    #[error("Invalid duration: {0}")]
    InvalidDuration(f32),

    /// Frame rate must be positive
    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(u32),

    /// Output resolution must be non-zero
    #[error("Invalid resolution {width}x{height}")]
    InvalidResolution {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Nothing to render
    #[error("Export has no frames")]
    NoFrames,
}

/// Failure talking to the remote encoder
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Request could not be sent or its body could not be read
    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        /// Endpoint path
        endpoint: String,
        /// Underlying HTTP error
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("{endpoint} returned HTTP {status}: {message}")]
    Status {
        /// Endpoint path
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Server-provided message
        message: String,
    },

    /// Server answered with an unexpected body
    #[error("Malformed response from {endpoint}: {reason}")]
    Malformed {
        /// Endpoint path
        endpoint: String,
        /// What was wrong
        reason: String,
    },

    /// Background upload task did not complete
    #[error("Upload task failed: {0}")]
    Task(String),
}

/// Export run errors
#[derive(Debug, Error)]
pub enum ExportError {
    /// Inputs rejected before anything started
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Renderer unavailable or a frame failed to render
    #[error(transparent)]
    Render(#[from] RenderError),

    /// A session protocol call failed
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Cancelled by the user
    #[error("Export cancelled.")]
    Cancelled,

    /// Preview playback currently owns the camera
    #[error("Stop preview playback before exporting")]
    PlayerActive,
}

impl ExportError {
    /// Whether this is a user-initiated cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExportError::Cancelled)
    }
}

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;
