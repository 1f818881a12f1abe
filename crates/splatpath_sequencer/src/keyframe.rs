// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe and camera pose definitions.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// 3D vector `[x, y, z]`
pub type Vec3 = [f32; 3];

/// Quaternion `[x, y, z, w]`
pub type Quat = [f32; 4];

/// Field of view used when a renderer does not report one
pub const DEFAULT_FOV: f32 = 50.0;

/// Namespace for ids derived from non-UUID tokens
const TOKEN_NAMESPACE: Uuid = Uuid::NAMESPACE_OID;

/// Unique identifier for a keyframe.
///
/// Serialized as a UUID string. Any other token found in a path file (such as
/// `kf_1700000000000_ffee`) is accepted and mapped to a stable UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct KeyframeId(pub Uuid);

impl KeyframeId {
    /// Create a new random keyframe ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// ID for an opaque token; UUID strings keep their value, anything else
    /// hashes to the same ID every time
    pub fn from_token(token: &str) -> Self {
        match Uuid::parse_str(token) {
            Ok(uuid) => Self(uuid),
            Err(_) => Self(Uuid::new_v5(&TOKEN_NAMESPACE, token.as_bytes())),
        }
    }
}

impl<'de> Deserialize<'de> for KeyframeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Self::from_token(&token))
    }
}

impl Default for KeyframeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for KeyframeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Camera position, orientation and vertical field of view (degrees).
///
/// `orientation` is expected to be unit length. Anything that blends
/// orientations must re-normalize the result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// World-space position
    pub position: Vec3,
    /// Orientation quaternion `[x, y, z, w]`
    #[serde(rename = "quaternion")]
    pub orientation: Quat,
    /// Vertical field of view in degrees
    #[serde(rename = "fov")]
    pub field_of_view: f32,
}

impl CameraPose {
    /// Create a new pose
    pub fn new(position: Vec3, orientation: Quat, field_of_view: f32) -> Self {
        Self {
            position,
            orientation,
            field_of_view,
        }
    }

    /// Pose at `position` with identity orientation and default fov
    pub fn at(position: Vec3) -> Self {
        Self::new(position, [0.0, 0.0, 0.0, 1.0], DEFAULT_FOV)
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::at([0.0, 0.0, 0.0])
    }
}

/// A camera pose anchored at a time on the path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Unique keyframe ID
    pub id: KeyframeId,
    /// Camera pose at this keyframe
    pub pose: CameraPose,
    /// Time in seconds
    pub t: f32,
}

impl Keyframe {
    /// Create a new keyframe with a fresh ID
    pub fn new(t: f32, pose: CameraPose) -> Self {
        Self {
            id: KeyframeId::new(),
            pose,
            t,
        }
    }
}

/// Path duration: `last.t - first.t`, or 0 with fewer than two keyframes.
pub fn path_duration(keyframes: &[Keyframe]) -> f32 {
    match (keyframes.first(), keyframes.last()) {
        (Some(first), Some(last)) if keyframes.len() >= 2 => (last.t - first.t).max(0.0),
        _ => 0.0,
    }
}
