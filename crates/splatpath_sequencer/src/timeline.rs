// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe timeline: the ordered, editable list of camera keyframes.
//!
//! Storage order always equals ascending time order. Every mutation
//! recomputes the path duration.

use crate::keyframe::{path_duration, CameraPose, Keyframe, KeyframeId};
use thiserror::Error;

/// Spacing between an appended keyframe and the previous last keyframe
pub const DEFAULT_KEYFRAME_SPACING: f32 = 2.0;

/// Smallest gap kept between a retimed keyframe and its neighbors
pub const MIN_KEYFRAME_GAP: f32 = 1e-3;

/// Timeline errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    /// No keyframe with this ID
    #[error("Keyframe not found: {0}")]
    NotFound(KeyframeId),

    /// Keyframe is already at the start or end of the timeline
    #[error("Keyframe {0} cannot move further in that direction")]
    AtBoundary(KeyframeId),
}

/// Result type for timeline operations
pub type Result<T> = std::result::Result<T, TimelineError>;

/// Direction for adjacent reordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    /// One position towards the start
    Earlier,
    /// One position towards the end
    Later,
}

/// Ordered keyframe collection with selection
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    keyframes: Vec<Keyframe>,
    selected: Option<KeyframeId>,
    duration: f32,
}

impl Timeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a timeline from existing keyframes (sorted by time)
    pub fn from_keyframes(keyframes: Vec<Keyframe>) -> Self {
        let mut timeline = Self::new();
        timeline.replace_all(keyframes);
        timeline
    }

    /// All keyframes in time order
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Number of keyframes
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    /// Whether the timeline has no keyframes
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Path duration (`last.t - first.t`, 0 with fewer than two keyframes)
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Currently selected keyframe
    pub fn selected(&self) -> Option<KeyframeId> {
        self.selected
    }

    /// Get keyframe by ID
    pub fn keyframe(&self, id: KeyframeId) -> Option<&Keyframe> {
        self.keyframes.iter().find(|k| k.id == id)
    }

    fn index_of(&self, id: KeyframeId) -> Result<usize> {
        self.keyframes
            .iter()
            .position(|k| k.id == id)
            .ok_or(TimelineError::NotFound(id))
    }

    fn refresh_duration(&mut self) {
        self.duration = path_duration(&self.keyframes);
    }

    /// Append a keyframe after the current last one and select it
    pub fn append(&mut self, pose: CameraPose) -> KeyframeId {
        let t = self
            .keyframes
            .last()
            .map_or(0.0, |last| last.t + DEFAULT_KEYFRAME_SPACING);
        let keyframe = Keyframe::new(t, pose);
        let id = keyframe.id;

        self.keyframes.push(keyframe);
        self.selected = Some(id);
        self.refresh_duration();
        tracing::debug!(%id, t, "Appended keyframe");
        id
    }

    /// Delete a keyframe.
    ///
    /// If it was selected, selection falls back to the new first keyframe.
    pub fn delete(&mut self, id: KeyframeId) -> Result<Keyframe> {
        let index = self.index_of(id)?;
        let removed = self.keyframes.remove(index);

        if self.selected == Some(id) {
            self.selected = self.keyframes.first().map(|k| k.id);
        }
        self.refresh_duration();
        tracing::debug!(%id, "Deleted keyframe");
        Ok(removed)
    }

    /// Swap a keyframe with its neighbor.
    ///
    /// The two keyframes exchange times as well as positions, so the time
    /// slots stay in ascending order and only the poses change places.
    pub fn move_keyframe(&mut self, id: KeyframeId, direction: MoveDirection) -> Result<()> {
        let index = self.index_of(id)?;
        let other = match direction {
            MoveDirection::Earlier => index.checked_sub(1),
            MoveDirection::Later => Some(index + 1).filter(|i| *i < self.keyframes.len()),
        }
        .ok_or(TimelineError::AtBoundary(id))?;

        let (t_index, t_other) = (self.keyframes[index].t, self.keyframes[other].t);
        self.keyframes.swap(index, other);
        self.keyframes[index].t = t_index;
        self.keyframes[other].t = t_other;
        self.refresh_duration();
        tracing::debug!(%id, ?direction, "Moved keyframe");
        Ok(())
    }

    /// Set a keyframe's time, clamped strictly between its neighbors.
    ///
    /// Returns the time actually applied. The first keyframe cannot go below
    /// zero; the last keyframe has no upper bound.
    pub fn retime(&mut self, id: KeyframeId, t: f32) -> Result<f32> {
        let index = self.index_of(id)?;
        let lower = match index.checked_sub(1) {
            Some(prev) => self.keyframes[prev].t + MIN_KEYFRAME_GAP,
            None => 0.0,
        };
        let upper = self
            .keyframes
            .get(index + 1)
            .map_or(f32::INFINITY, |next| next.t - MIN_KEYFRAME_GAP);

        let applied = if lower > upper {
            // Neighbors closer than two gaps; settle between them.
            (lower + upper) * 0.5
        } else if t.is_nan() {
            self.keyframes[index].t.clamp(lower, upper)
        } else {
            t.clamp(lower, upper)
        };

        self.keyframes[index].t = applied;
        self.refresh_duration();
        tracing::debug!(%id, requested = t, applied, "Retimed keyframe");
        Ok(applied)
    }

    /// Update the pose stored in a keyframe
    pub fn set_pose(&mut self, id: KeyframeId, pose: CameraPose) -> Result<()> {
        let index = self.index_of(id)?;
        self.keyframes[index].pose = pose;
        Ok(())
    }

    /// Select a keyframe, or clear selection with `None`
    pub fn select(&mut self, id: Option<KeyframeId>) -> Result<()> {
        if let Some(id) = id {
            self.index_of(id)?;
        }
        self.selected = id;
        Ok(())
    }

    /// Replace every keyframe (presets, import, clear).
    ///
    /// Input is sorted by time. Selection is cleared.
    pub fn replace_all(&mut self, mut keyframes: Vec<Keyframe>) {
        keyframes.sort_by(|a, b| a.t.total_cmp(&b.t));
        self.keyframes = keyframes;
        self.selected = None;
        self.refresh_duration();
        tracing::debug!(count = self.keyframes.len(), "Replaced keyframes");
    }

    /// Remove every keyframe
    pub fn clear(&mut self) {
        self.replace_all(Vec::new());
    }

    /// Owned copy of the keyframes for a playback or export run
    pub fn snapshot(&self) -> Vec<Keyframe> {
        self.keyframes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(x: f32) -> CameraPose {
        CameraPose::at([x, 0.0, 0.0])
    }

    fn times(timeline: &Timeline) -> Vec<f32> {
        timeline.keyframes().iter().map(|k| k.t).collect()
    }

    #[test]
    fn test_append_spacing_and_selection() {
        let mut timeline = Timeline::new();
        let a = timeline.append(pose(0.0));
        assert_eq!(timeline.duration(), 0.0);
        let b = timeline.append(pose(1.0));
        let c = timeline.append(pose(2.0));

        assert_eq!(times(&timeline), vec![0.0, 2.0, 4.0]);
        assert_eq!(timeline.duration(), 4.0);
        assert_eq!(timeline.selected(), Some(c));
        assert_ne!(a, b);
    }

    #[test]
    fn test_append_after_offset_start() {
        let mut timeline = Timeline::from_keyframes(vec![Keyframe::new(3.0, pose(0.0))]);
        timeline.append(pose(1.0));
        assert_eq!(times(&timeline), vec![3.0, 5.0]);
        assert_eq!(timeline.duration(), 2.0);
    }

    #[test]
    fn test_delete_selected_falls_back_to_first() {
        let mut timeline = Timeline::new();
        let a = timeline.append(pose(0.0));
        let b = timeline.append(pose(1.0));
        timeline.delete(b).unwrap();
        assert_eq!(timeline.selected(), Some(a));
        assert_eq!(timeline.duration(), 0.0);

        timeline.delete(a).unwrap();
        assert_eq!(timeline.selected(), None);
        assert_eq!(timeline.delete(a), Err(TimelineError::NotFound(a)));
    }

    #[test]
    fn test_delete_unselected_keeps_selection() {
        let mut timeline = Timeline::new();
        let a = timeline.append(pose(0.0));
        let b = timeline.append(pose(1.0));
        timeline.select(Some(a)).unwrap();
        timeline.delete(b).unwrap();
        assert_eq!(timeline.selected(), Some(a));
    }

    #[test]
    fn test_move_swaps_poses_and_keeps_time_order() {
        let mut timeline = Timeline::new();
        let a = timeline.append(pose(0.0));
        let b = timeline.append(pose(1.0));

        timeline.move_keyframe(b, MoveDirection::Earlier).unwrap();
        assert_eq!(timeline.keyframes()[0].id, b);
        assert_eq!(times(&timeline), vec![0.0, 2.0]);
        assert_eq!(timeline.keyframes()[1].pose.position[0], 0.0);

        assert_eq!(
            timeline.move_keyframe(b, MoveDirection::Earlier),
            Err(TimelineError::AtBoundary(b))
        );
        assert_eq!(
            timeline.move_keyframe(a, MoveDirection::Later),
            Err(TimelineError::AtBoundary(a))
        );
    }

    #[test]
    fn test_retime_clamped_between_neighbors() {
        let mut timeline = Timeline::new();
        timeline.append(pose(0.0));
        let mid = timeline.append(pose(1.0));
        let last = timeline.append(pose(2.0));

        let applied = timeline.retime(mid, 10.0).unwrap();
        assert!(applied < 4.0);
        assert!((applied - (4.0 - MIN_KEYFRAME_GAP)).abs() < 1e-6);

        let applied = timeline.retime(mid, -3.0).unwrap();
        assert!(applied > 0.0);

        let applied = timeline.retime(mid, 1.25).unwrap();
        assert_eq!(applied, 1.25);

        // Last keyframe may extend the path
        timeline.retime(last, 9.0).unwrap();
        assert_eq!(timeline.duration(), 9.0);
        assert!(times(&timeline).windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_retime_first_not_negative() {
        let mut timeline = Timeline::new();
        let first = timeline.append(pose(0.0));
        timeline.append(pose(1.0));
        assert_eq!(timeline.retime(first, -1.0).unwrap(), 0.0);
        let applied = timeline.retime(first, 5.0).unwrap();
        assert!(applied < 2.0);
    }

    #[test]
    fn test_select_unknown() {
        let mut timeline = Timeline::new();
        let missing = KeyframeId::new();
        assert_eq!(timeline.select(Some(missing)), Err(TimelineError::NotFound(missing)));
        timeline.select(None).unwrap();
    }

    #[test]
    fn test_replace_all_sorts() {
        let mut timeline = Timeline::new();
        timeline.replace_all(vec![
            Keyframe::new(4.0, pose(2.0)),
            Keyframe::new(1.0, pose(0.0)),
            Keyframe::new(2.0, pose(1.0)),
        ]);
        assert_eq!(times(&timeline), vec![1.0, 2.0, 4.0]);
        assert_eq!(timeline.duration(), 3.0);

        timeline.clear();
        assert!(timeline.is_empty());
        assert_eq!(timeline.duration(), 0.0);
    }
}
