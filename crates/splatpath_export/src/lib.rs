// SPDX-License-Identifier: MIT OR Apache-2.0
//! Video export for splatpath camera paths.
//!
//! This crate turns a keyframed camera path into a video:
//! - Frame-accurate off-screen rendering through the [`Renderer`] capability
//! - PNG encoding into reusable, lazily sized buffers
//! - Pipelined uploads to a remote encoder session over HTTP
//! - Cooperative cancellation at frame boundaries
//!
//! [`Studio`] is the application shell that owns the renderer and decides
//! whether the live camera belongs to the user, the preview player or the
//! exporter.
//!
//! [`Renderer`]: splatpath_sequencer::Renderer

pub mod encoder;
pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod protocol;
pub mod resources;
pub mod settings;
pub mod studio;

#[cfg(test)]
mod test_support;

pub use encoder::{EncoderClient, HttpEncoderClient};
pub use error::{ExportError, NetworkError, Result, ValidationError};
pub use orchestrator::{CancelHandle, ExportOrchestrator};
pub use progress::ExportProgress;
pub use protocol::{SessionId, SessionStatus, StatusReport};
pub use resources::ExportResources;
pub use settings::{ConfigError, ExportConfig, ExportSettings, RenderSettings};
pub use studio::{ExportState, Studio, StudioError};
