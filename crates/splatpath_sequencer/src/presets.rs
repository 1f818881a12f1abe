// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canonical camera moves generated from the current framing.
//!
//! Each preset samples a fixed number of positions, aims every one of them at
//! the inferred target, and spaces the resulting keyframes evenly across the
//! requested duration. The output replaces the whole timeline.

use crate::interpolation::{self, Interpolation, WORLD_UP};
use crate::keyframe::{CameraPose, Keyframe, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

/// Distance ahead of the camera used as target when no orbit target is known
pub const DEFAULT_FOCUS_DISTANCE: f32 = 5.0;

/// Smallest orbit radius a preset will use
pub const MIN_ORBIT_RADIUS: f32 = 0.5;

/// Camera move presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetKind {
    /// Full orbit around the target at constant height
    Turntable,
    /// Push in towards the target
    DollyIn,
    /// Rise vertically while keeping the target framed
    CraneUp,
    /// Lemniscate around the target
    FigureEight,
}

impl PresetKind {
    /// All presets
    pub fn all() -> &'static [PresetKind] {
        &[
            PresetKind::Turntable,
            PresetKind::DollyIn,
            PresetKind::CraneUp,
            PresetKind::FigureEight,
        ]
    }

    /// Short identifier used on the command line and in files
    pub fn name(&self) -> &'static str {
        match self {
            Self::Turntable => "turntable",
            Self::DollyIn => "dolly-in",
            Self::CraneUp => "crane-up",
            Self::FigureEight => "figure-8",
        }
    }

    /// Number of control poses the preset produces
    pub fn steps(&self) -> usize {
        match self {
            Self::Turntable | Self::FigureEight => 8,
            Self::DollyIn | Self::CraneUp => 4,
        }
    }
}

impl fmt::Display for PresetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PresetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "turntable" => Ok(Self::Turntable),
            "dolly-in" | "dolly" => Ok(Self::DollyIn),
            "crane-up" | "crane" => Ok(Self::CraneUp),
            "figure-8" | "figure-eight" | "figure8" => Ok(Self::FigureEight),
            other => Err(format!("unknown preset '{other}'")),
        }
    }
}

/// Geometry a preset is built around
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresetFraming {
    /// Point the camera looks at
    pub target: Vec3,
    /// Horizontal distance from the target
    pub radius: f32,
    /// Camera height above the target
    pub height: f32,
    /// Field of view for every generated pose
    pub fov: f32,
}

impl PresetFraming {
    /// Infer framing from the current camera pose.
    ///
    /// Uses the renderer's orbit target when known, otherwise a point
    /// [`DEFAULT_FOCUS_DISTANCE`] ahead of the camera.
    pub fn infer(pose: &CameraPose, orbit_target: Option<Vec3>) -> Self {
        let target = orbit_target.unwrap_or_else(|| {
            let forward = Interpolation::rotate_vec3(pose.orientation, [0.0, 0.0, -1.0]);
            interpolation::add_scaled(pose.position, forward, DEFAULT_FOCUS_DISTANCE)
        });

        let offset = interpolation::sub(pose.position, target);
        let radius = (offset[0] * offset[0] + offset[2] * offset[2])
            .sqrt()
            .max(MIN_ORBIT_RADIUS);

        Self {
            target,
            radius,
            height: offset[1],
            fov: pose.field_of_view,
        }
    }
}

/// Generate the keyframes for a preset spread over `duration` seconds.
pub fn generate(kind: PresetKind, framing: &PresetFraming, duration: f32) -> Vec<Keyframe> {
    let PresetFraming {
        target,
        radius,
        height,
        ..
    } = *framing;
    let steps = kind.steps();

    let positions: Vec<Vec3> = (0..steps)
        .map(|i| {
            let s = step_fraction(i, steps);
            match kind {
                PresetKind::Turntable => {
                    let angle = s * TAU;
                    [
                        target[0] + angle.cos() * radius,
                        target[1] + height,
                        target[2] + angle.sin() * radius,
                    ]
                }
                PresetKind::DollyIn => {
                    let start = (radius * 1.2).max(1.0);
                    let end = (radius * 0.45).max(0.5);
                    let dist = start + (end - start) * s;
                    [target[0], target[1] + height, target[2] + dist]
                }
                PresetKind::CraneUp => {
                    let start = target[1] + height * 0.2;
                    let end = target[1] + height * 1.6;
                    [target[0], start + (end - start) * s, target[2] + radius]
                }
                PresetKind::FigureEight => {
                    let angle = s * TAU;
                    [
                        target[0] + angle.sin() * radius,
                        target[1] + height,
                        target[2] + (angle * 2.0).sin() * (radius * 0.5),
                    ]
                }
            }
        })
        .collect();

    tracing::debug!(preset = %kind, steps, duration, "Generated preset path");
    build_keyframes(&positions, framing, duration)
}

fn step_fraction(i: usize, steps: usize) -> f32 {
    if steps <= 1 {
        0.0
    } else {
        i as f32 / (steps - 1) as f32
    }
}

fn build_keyframes(positions: &[Vec3], framing: &PresetFraming, duration: f32) -> Vec<Keyframe> {
    let count = positions.len();
    positions
        .iter()
        .enumerate()
        .map(|(i, position)| {
            let orientation = Interpolation::look_at(*position, framing.target, WORLD_UP);
            let pose = CameraPose::new(*position, orientation, framing.fov);
            Keyframe::new(duration * step_fraction(i, count), pose)
        })
        .collect()
}
