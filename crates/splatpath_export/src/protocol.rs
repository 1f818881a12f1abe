// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wire types for the remote encoder session protocol.
//!
//! | Request                        | Response                                   |
//! |--------------------------------|--------------------------------------------|
//! | `POST /export/start`           | `{ id }`                                   |
//! | `POST /export/{id}/frame`      | `{ ok }` (multipart `index`, `frame`)      |
//! | `POST /export/{id}/finish`     | `{ ok, output }`                           |
//! | `POST /export/{id}/cancel`     | `{ ok }`                                   |
//! | `GET  /export/{id}/status`     | `{ status, receivedFrames, totalFrames }`  |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote export session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Session lifecycle as reported by the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Accepting frames
    Rendering,
    /// Producing the video
    Encoding,
    /// Video ready
    Done,
    /// Encoding failed
    Error,
    /// Cancelled and discarded
    Cancelled,
}

impl SessionStatus {
    /// Whether the session can no longer change
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error | Self::Cancelled)
    }
}

/// `POST /export/start` response
#[derive(Debug, Clone, Deserialize)]
pub struct StartResponse {
    /// New session ID
    pub id: String,
}

/// `{ ok }` acknowledgement
#[derive(Debug, Clone, Deserialize)]
pub struct AckResponse {
    /// Whether the request was accepted
    #[serde(default)]
    pub ok: bool,
}

/// `POST /export/{id}/finish` response
#[derive(Debug, Clone, Deserialize)]
pub struct FinishResponse {
    /// Whether encoding started
    #[serde(default)]
    pub ok: bool,
    /// Server path of the finished video
    pub output: String,
}

/// `GET /export/{id}/status` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Session status
    pub status: SessionStatus,
    /// Frames stored so far
    pub received_frames: u32,
    /// Frames announced at session start
    pub total_frames: u32,
}

/// Error body returned with non-success statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message
    pub error: String,
}

/// Stored file name for a frame, zero-padded so names sort by index
pub fn frame_file_name(index: u32) -> String {
    format!("frame_{index:06}.png")
}

/// Endpoint paths
pub mod endpoints {
    use super::SessionId;

    /// Session creation
    pub const START: &str = "/export/start";

    /// Frame upload
    pub fn frame(id: &SessionId) -> String {
        format!("/export/{id}/frame")
    }

    /// Encode request
    pub fn finish(id: &SessionId) -> String {
        format!("/export/{id}/finish")
    }

    /// Cancellation
    pub fn cancel(id: &SessionId) -> String {
        format!("/export/{id}/cancel")
    }

    /// Status poll
    pub fn status(id: &SessionId) -> String {
        format!("/export/{id}/status")
    }
}
