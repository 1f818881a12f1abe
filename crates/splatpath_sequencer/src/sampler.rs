// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pose sampling along an ordered keyframe sequence.
//!
//! Per segment the normalized parameter is eased once and the same eased value
//! drives all three channels, so position, rotation and field of view change
//! pace together:
//! - Position: linear blend, optionally mixed with a Catmull-Rom spline
//! - Orientation: slerp between the two segment endpoints
//! - Field of view: linear blend

use crate::interpolation::Interpolation;
use crate::keyframe::{CameraPose, Keyframe};

/// Default position smoothing (pure spline)
pub const DEFAULT_SMOOTHING: f32 = 1.0;

/// Sample the camera pose at global time `t_global`.
///
/// `keyframes` must be sorted by ascending `t`. Returns `None` only for an
/// empty sequence. Times outside the path are clamped to its ends, and a time
/// that lands exactly on a keyframe returns that keyframe's pose unchanged.
///
/// `smoothing` mixes the linear position (0) with the spline position (1).
pub fn sample_pose(keyframes: &[Keyframe], t_global: f32, smoothing: f32) -> Option<CameraPose> {
    let first = keyframes.first()?;
    let last = keyframes.last()?;
    if keyframes.len() == 1 || last.t <= first.t {
        return Some(first.pose);
    }

    let t = if t_global.is_nan() {
        first.t
    } else {
        t_global.clamp(first.t, last.t)
    };

    // Keyframes with time <= t; at least the first one qualifies.
    let upper = keyframes.partition_point(|k| k.t <= t);
    if upper >= keyframes.len() {
        return Some(last.pose);
    }
    let index = upper.saturating_sub(1);
    let k1 = &keyframes[index];
    let k2 = &keyframes[index + 1];
    if k1.t == t {
        return Some(k1.pose);
    }

    let span = k2.t - k1.t;
    let u = if span > 0.0 { (t - k1.t) / span } else { 0.0 };
    let eased = Interpolation::ease_in_out_cubic(u);

    let p1 = k1.pose.position;
    let p2 = k2.pose.position;
    let linear = Interpolation::lerp_vec3(p1, p2, eased);

    let position = if keyframes.len() < 3 {
        linear
    } else {
        let p0 = keyframes[index.saturating_sub(1)].pose.position;
        let p3 = keyframes[(index + 2).min(keyframes.len() - 1)].pose.position;
        let spline = Interpolation::catmull_rom(p0, p1, p2, p3, eased);
        blend_positions(linear, spline, smoothing)
    };

    Some(CameraPose {
        position,
        orientation: Interpolation::slerp(k1.pose.orientation, k2.pose.orientation, eased),
        field_of_view: Interpolation::lerp(k1.pose.field_of_view, k2.pose.field_of_view, eased),
    })
}

/// Mix linear and spline positions by `smoothing`, exact at both limits.
fn blend_positions(linear: [f32; 3], spline: [f32; 3], smoothing: f32) -> [f32; 3] {
    let strength = if smoothing.is_nan() {
        DEFAULT_SMOOTHING
    } else {
        smoothing.clamp(0.0, 1.0)
    };

    if strength <= 0.0 {
        linear
    } else if strength >= 1.0 {
        spline
    } else {
        Interpolation::lerp_vec3(linear, spline, strength)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::WORLD_UP;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn kf(t: f32, position: [f32; 3]) -> Keyframe {
        Keyframe::new(t, CameraPose::at(position))
    }

    fn curved_path() -> Vec<Keyframe> {
        let positions = [
            [0.0, 0.0, 0.0],
            [2.0, 1.0, 0.0],
            [3.0, -1.0, 2.0],
            [6.0, 0.5, 1.0],
            [7.0, 2.0, -3.0],
        ];
        positions
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let orientation = Interpolation::look_at(*p, [0.0, 0.0, 0.0], WORLD_UP);
                Keyframe::new(i as f32 * 1.5 + 0.25, CameraPose::new(*p, orientation, 40.0 + i as f32 * 5.0))
            })
            .collect()
    }

    #[test]
    fn test_empty_and_single() {
        assert!(sample_pose(&[], 1.0, 1.0).is_none());
        let only = [kf(5.0, [1.0, 2.0, 3.0])];
        assert_eq!(sample_pose(&only, -10.0, 0.3), Some(only[0].pose));
    }

    #[test]
    fn test_clamps_outside_range() {
        let path = curved_path();
        assert_eq!(sample_pose(&path, -100.0, 1.0), Some(path[0].pose));
        assert_eq!(sample_pose(&path, 1e6, 1.0), Some(path[4].pose));
    }

    #[test]
    fn test_interior_keyframe_is_exact_for_any_smoothing() {
        let path = [
            kf(0.0, [0.0, 0.0, 0.0]),
            kf(2.0, [1.0, 0.0, 0.0]),
            kf(4.0, [2.0, 0.0, 0.0]),
        ];
        for i in 0..=10 {
            let smoothing = i as f32 / 10.0;
            let pose = sample_pose(&path, 2.0, smoothing).unwrap();
            assert_eq!(pose.position, [1.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn test_two_keyframes_use_linear_position() {
        let path = [kf(0.0, [0.0, 0.0, 0.0]), kf(1.0, [4.0, 0.0, 0.0])];
        let pose = sample_pose(&path, 0.5, 1.0).unwrap();
        assert_abs_diff_eq!(pose.position[0], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_smoothing_limits() {
        let path = curved_path();
        // Interior segment 1 -> 2
        let k1 = &path[1];
        let k2 = &path[2];
        let t = k1.t + (k2.t - k1.t) * 0.3;
        let eased = Interpolation::ease_in_out_cubic((t - k1.t) / (k2.t - k1.t));

        let linear = Interpolation::lerp_vec3(k1.pose.position, k2.pose.position, eased);
        let spline = Interpolation::catmull_rom(
            path[0].pose.position,
            k1.pose.position,
            k2.pose.position,
            path[3].pose.position,
            eased,
        );

        assert_eq!(sample_pose(&path, t, 0.0).unwrap().position, linear);
        assert_eq!(sample_pose(&path, t, 1.0).unwrap().position, spline);

        let half = sample_pose(&path, t, 0.5).unwrap().position;
        for i in 0..3 {
            assert_abs_diff_eq!(half[i], (linear[i] + spline[i]) * 0.5, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_continuity_across_keyframes() {
        let path = curved_path();
        for k in &path[1..path.len() - 1] {
            let before = sample_pose(&path, k.t - 1e-4, 1.0).unwrap();
            let after = sample_pose(&path, k.t + 1e-4, 1.0).unwrap();
            for i in 0..3 {
                assert_abs_diff_eq!(before.position[i], after.position[i], epsilon = 1e-3);
            }
            assert_abs_diff_eq!(before.field_of_view, after.field_of_view, epsilon = 1e-3);
            let dot = Interpolation::dot4(before.orientation, after.orientation).abs();
            assert_abs_diff_eq!(dot, 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_deterministic() {
        let path = curved_path();
        let a = sample_pose(&path, 2.71, 0.6).unwrap();
        let b = sample_pose(&path, 2.71, 0.6).unwrap();
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_endpoints_exact(smoothing in 0.0f32..=1.0) {
            let path = curved_path();
            let first = &path[0];
            let last = &path[path.len() - 1];
            prop_assert_eq!(sample_pose(&path, first.t, smoothing), Some(first.pose));
            prop_assert_eq!(sample_pose(&path, last.t, smoothing), Some(last.pose));
        }

        #[test]
        fn prop_orientation_unit(t in 0.0f32..7.0, smoothing in 0.0f32..=1.0) {
            let path = curved_path();
            let pose = sample_pose(&path, t, smoothing).unwrap();
            let len = Interpolation::dot4(pose.orientation, pose.orientation).sqrt();
            prop_assert!((len - 1.0).abs() <= 1e-5);
        }
    }
}
