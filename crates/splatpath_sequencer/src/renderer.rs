// SPDX-License-Identifier: MIT OR Apache-2.0
//! Narrow capability interface onto the scene renderer.
//!
//! The renderer owns all GPU and camera state. Playback and export only read
//! and write the camera pose through this trait and never touch graphics
//! objects directly.

use crate::keyframe::{CameraPose, Vec3};
use thiserror::Error;

/// Errors raised by a renderer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// No scene or graphics context is available
    #[error("Renderer unavailable")]
    Unavailable,

    /// Rendering a frame failed
    #[error("Failed to render frame {frame}: {reason}")]
    FrameFailed {
        /// Frame index being rendered
        frame: u32,
        /// Renderer-specific reason
        reason: String,
    },

    /// Requested output size cannot be rendered
    #[error("Invalid render size {width}x{height}")]
    InvalidSize {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Rendered pixels could not be encoded
    #[error("Failed to encode frame: {0}")]
    Encode(String),
}

/// Capability interface implemented by the host renderer
pub trait Renderer {
    /// Current camera pose, if a camera exists
    fn camera_pose(&self) -> Option<CameraPose>;

    /// Move the live camera
    fn set_camera_pose(&mut self, pose: &CameraPose);

    /// Render `pose` into an off-screen target of `width` x `height` and read
    /// the result back as tightly packed RGBA8 rows into `pixels`.
    ///
    /// `pixels` is exactly `width * height * 4` bytes. The visible view must
    /// not change. The renderer may keep its off-screen target alive between
    /// calls until [`Renderer::dispose_export_resources`].
    fn render_frame_offscreen(
        &mut self,
        width: u32,
        height: u32,
        pose: &CameraPose,
        pixels: &mut [u8],
    ) -> Result<(), RenderError>;

    /// Release off-screen targets created for export.
    fn dispose_export_resources(&mut self) {}

    /// Point the interactive controls orbit around, when the renderer has one.
    fn orbit_target(&self) -> Option<Vec3> {
        None
    }

    /// Enable or disable independent camera manipulation.
    fn set_controls_enabled(&mut self, enabled: bool);
}
