// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interpolation math for camera paths.
//!
//! Everything here is a pure function over plain arrays:
//! - Catmull-Rom position splines
//! - Quaternion slerp along the shorter arc
//! - Cubic ease-in-out timing
//! - Look-at basis construction for generated poses

use crate::keyframe::{Quat, Vec3};

/// Cosine above which slerp falls back to a normalized lerp
pub const SLERP_LINEAR_THRESHOLD: f32 = 0.9995;

/// World up axis used for look-at construction
pub const WORLD_UP: Vec3 = [0.0, 1.0, 0.0];

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Interpolate Vec3
    pub fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
        [
            Self::lerp(a[0], b[0], t),
            Self::lerp(a[1], b[1], t),
            Self::lerp(a[2], b[2], t),
        ]
    }

    /// Interpolate Vec4 component-wise (not normalized)
    pub fn lerp_vec4(a: Quat, b: Quat, t: f32) -> Quat {
        [
            Self::lerp(a[0], b[0], t),
            Self::lerp(a[1], b[1], t),
            Self::lerp(a[2], b[2], t),
            Self::lerp(a[3], b[3], t),
        ]
    }

    /// Uniform Catmull-Rom segment between `p1` and `p2`.
    ///
    /// `p0` and `p3` are the outer control points. At sequence endpoints the
    /// caller passes the endpoint itself as the missing neighbor.
    pub fn catmull_rom(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
        let t2 = t * t;
        let t3 = t2 * t;
        let axis = |i: usize| {
            0.5 * ((2.0 * p1[i])
                + (-p0[i] + p2[i]) * t
                + (2.0 * p0[i] - 5.0 * p1[i] + 4.0 * p2[i] - p3[i]) * t2
                + (-p0[i] + 3.0 * p1[i] - 3.0 * p2[i] + p3[i]) * t3)
        };
        [axis(0), axis(1), axis(2)]
    }

    /// Cubic ease-in-out, symmetric about `t = 0.5`.
    ///
    /// Input is clamped to `[0, 1]`; the endpoints map to themselves exactly.
    pub fn ease_in_out_cubic(t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t < 0.5 {
            4.0 * t * t * t
        } else {
            1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
        }
    }

    /// Four-component dot product
    pub fn dot4(a: Quat, b: Quat) -> f32 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
    }

    /// Normalize a quaternion. A zero quaternion becomes identity.
    pub fn normalize_quat(q: Quat) -> Quat {
        let len = Self::dot4(q, q).sqrt();
        if len <= f32::EPSILON || !len.is_finite() {
            return [0.0, 0.0, 0.0, 1.0];
        }
        [q[0] / len, q[1] / len, q[2] / len, q[3] / len]
    }

    /// Spherical linear interpolation for quaternions (`[x, y, z, w]`).
    ///
    /// Always takes the shorter arc and always returns a unit quaternion.
    pub fn slerp(a: Quat, b: Quat, t: f32) -> Quat {
        let mut dot = Self::dot4(a, b);

        let mut b = b;
        if dot < 0.0 {
            b = [-b[0], -b[1], -b[2], -b[3]];
            dot = -dot;
        }

        if dot > SLERP_LINEAR_THRESHOLD {
            return Self::normalize_quat(Self::lerp_vec4(a, b, t));
        }

        let theta = dot.clamp(-1.0, 1.0).acos();
        let sin_theta = theta.sin();
        let w1 = ((1.0 - t) * theta).sin() / sin_theta;
        let w2 = (t * theta).sin() / sin_theta;

        Self::normalize_quat([
            a[0] * w1 + b[0] * w2,
            a[1] * w1 + b[1] * w2,
            a[2] * w1 + b[2] * w2,
            a[3] * w1 + b[3] * w2,
        ])
    }

    /// Rotate a vector by a unit quaternion
    pub fn rotate_vec3(q: Quat, v: Vec3) -> Vec3 {
        let [qx, qy, qz, qw] = q;
        // t = 2 * cross(q.xyz, v)
        let tx = 2.0 * (qy * v[2] - qz * v[1]);
        let ty = 2.0 * (qz * v[0] - qx * v[2]);
        let tz = 2.0 * (qx * v[1] - qy * v[0]);
        [
            v[0] + qw * tx + (qy * tz - qz * ty),
            v[1] + qw * ty + (qz * tx - qx * tz),
            v[2] + qw * tz + (qx * ty - qy * tx),
        ]
    }

    /// Orientation for a camera at `eye` looking at `target`.
    ///
    /// Cameras look down their local -Z axis with +Y up. When the view
    /// direction is parallel to `up`, the direction is nudged so the basis
    /// stays well defined.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Quat {
        let mut z = normalize_vec3(sub(eye, target)).unwrap_or([0.0, 0.0, 1.0]);

        let mut x = cross(up, z);
        if length(x) <= 1e-6 {
            if (up[2].abs() - 1.0).abs() <= 1e-6 {
                z[0] += 1e-4;
            } else {
                z[2] += 1e-4;
            }
            z = normalize_vec3(z).unwrap_or([0.0, 0.0, 1.0]);
            x = cross(up, z);
        }
        let x = normalize_vec3(x).unwrap_or([1.0, 0.0, 0.0]);
        let y = cross(z, x);

        quat_from_basis(x, y, z)
    }
}

/// Vector difference `a - b`
pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Vector sum `a + b * s`
pub fn add_scaled(a: Vec3, b: Vec3, s: f32) -> Vec3 {
    [a[0] + b[0] * s, a[1] + b[1] * s, a[2] + b[2] * s]
}

/// Cross product
pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Euclidean length
pub fn length(v: Vec3) -> f32 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Unit vector, or `None` for a zero-length input
pub fn normalize_vec3(v: Vec3) -> Option<Vec3> {
    let len = length(v);
    if len <= f32::EPSILON || !len.is_finite() {
        None
    } else {
        Some([v[0] / len, v[1] / len, v[2] / len])
    }
}

/// Quaternion for the rotation matrix with columns `x`, `y`, `z`.
fn quat_from_basis(x: Vec3, y: Vec3, z: Vec3) -> Quat {
    let (m11, m12, m13) = (x[0], y[0], z[0]);
    let (m21, m22, m23) = (x[1], y[1], z[1]);
    let (m31, m32, m33) = (x[2], y[2], z[2]);
    let trace = m11 + m22 + m33;

    let q = if trace > 0.0 {
        let s = 0.5 / (trace + 1.0).sqrt();
        [(m32 - m23) * s, (m13 - m31) * s, (m21 - m12) * s, 0.25 / s]
    } else if m11 > m22 && m11 > m33 {
        let s = 2.0 * (1.0 + m11 - m22 - m33).sqrt();
        [0.25 * s, (m12 + m21) / s, (m13 + m31) / s, (m32 - m23) / s]
    } else if m22 > m33 {
        let s = 2.0 * (1.0 + m22 - m11 - m33).sqrt();
        [(m12 + m21) / s, 0.25 * s, (m23 + m32) / s, (m13 - m31) / s]
    } else {
        let s = 2.0 * (1.0 + m33 - m11 - m22).sqrt();
        [(m13 + m31) / s, (m23 + m32) / s, 0.25 * s, (m21 - m12) / s]
    };

    Interpolation::normalize_quat(q)
}
