// SPDX-License-Identifier: MIT OR Apache-2.0
//! Export progress reporting.

/// Stage of an export run, delivered through the progress callback
#[derive(Debug, Clone, PartialEq)]
pub enum ExportProgress {
    /// Session is being created
    Starting,
    /// A frame was rendered and its upload dispatched
    Rendering {
        /// Frames dispatched so far
        frame: u32,
        /// Total frames
        total: u32,
    },
    /// All frames uploaded, encoder is producing the video
    Encoding,
    /// Video is ready
    Complete {
        /// Where the video can be fetched
        locator: String,
    },
    /// Run stopped by the user
    Cancelled,
    /// Run stopped by an error
    Failed {
        /// Error description
        message: String,
    },
}

impl ExportProgress {
    /// Completion in `[0, 1]`
    pub fn fraction(&self) -> f32 {
        match self {
            Self::Starting | Self::Cancelled | Self::Failed { .. } => 0.0,
            Self::Rendering { frame, total } if *total > 0 => *frame as f32 / *total as f32,
            Self::Rendering { .. } => 0.0,
            Self::Encoding | Self::Complete { .. } => 1.0,
        }
    }

    /// Whether the run has ended
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Complete { .. } | Self::Cancelled | Self::Failed { .. }
        )
    }

    /// One-line status for display
    pub fn status_text(&self) -> String {
        match self {
            Self::Starting => "Starting export…".to_string(),
            Self::Rendering { frame, total } => format!("Rendering: {frame}/{total}"),
            Self::Encoding => "Encoding video…".to_string(),
            Self::Complete { .. } => "Export complete.".to_string(),
            Self::Cancelled => "Export cancelled.".to_string(),
            Self::Failed { message } => message.clone(),
        }
    }
}
