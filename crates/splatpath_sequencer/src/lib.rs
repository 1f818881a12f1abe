// SPDX-License-Identifier: MIT OR Apache-2.0
//! Camera path core for splatpath.
//!
//! This crate provides everything needed to author and preview a camera move:
//! - Keyframed camera poses on an ordered timeline
//! - Pose sampling with spline position, slerp rotation and eased timing
//! - Preset moves (turntable, dolly, crane, figure-eight)
//! - Real-time preview playback
//!
//! ## Architecture
//!
//! The renderer is only reached through the [`Renderer`] capability trait.
//! UI state lives in an observable [`Store`] owned by the application; the
//! core itself keeps no global state.

pub mod events;
pub mod interpolation;
pub mod keyframe;
pub mod path_file;
pub mod player;
pub mod presets;
pub mod renderer;
pub mod sampler;
pub mod store;
pub mod timeline;

pub use events::{EventHook, PlayerEvent};
pub use interpolation::Interpolation;
pub use keyframe::{path_duration, CameraPose, Keyframe, KeyframeId, Quat, Vec3};
pub use path_file::{export_path, import_path, load_path, save_path, PathFileError};
pub use player::{Clock, ManualClock, MonotonicClock, PathPlayer, PlaybackState, PlayerError};
pub use presets::{PresetFraming, PresetKind};
pub use renderer::{RenderError, Renderer};
pub use sampler::sample_pose;
pub use store::{PathState, Store, Subscription};
pub use timeline::{MoveDirection, Timeline, TimelineError};
