// SPDX-License-Identifier: MIT OR Apache-2.0
//! Real-time path playback.
//!
//! The player is driven by the host's per-display-frame callback: the host
//! calls [`PathPlayer::tick`] once per frame while [`PathPlayer::wants_frame`]
//! is true. Position is derived from wall-clock time elapsed since a start
//! anchor, so callback jitter never accumulates into drift.
//!
//! Playback positions run from 0 to the path duration and map onto keyframe
//! time `first.t + position`.

use crate::events::{EventHook, PlayerEvent};
use crate::keyframe::{path_duration, CameraPose, Keyframe};
use crate::renderer::Renderer;
use crate::sampler::{sample_pose, DEFAULT_SMOOTHING};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Stopped at the start, camera released
    #[default]
    Stopped,
    /// Advancing with wall-clock time
    Playing,
    /// Frozen at the current position, camera still held
    Paused,
}

impl PlaybackState {
    /// Whether the player currently holds the camera
    pub fn holds_camera(&self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }
}

/// Player errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    /// Playback needs at least two keyframes
    #[error("Add at least 2 keyframes to preview (have {0})")]
    NotEnoughKeyframes(usize),
}

/// Source of wall-clock time in seconds
pub trait Clock {
    /// Current time in seconds from an arbitrary fixed origin
    fn now(&self) -> f64;
}

/// Monotonic system clock
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Clock starting at zero now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Manually advanced clock, shared between clones
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<Mutex<f64>>);

impl ManualClock {
    /// Clock at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the absolute time
    pub fn set(&self, seconds: f64) {
        *self.0.lock() = seconds;
    }

    /// Move time forward
    pub fn advance(&self, seconds: f64) {
        *self.0.lock() += seconds;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.0.lock()
    }
}

/// Playback state machine for previewing a camera path
pub struct PathPlayer<C: Clock = MonotonicClock> {
    clock: C,
    keyframes: Vec<Keyframe>,
    duration: f32,
    state: PlaybackState,
    /// Playback position in seconds, `0..=duration`
    current_time: f32,
    /// Clock time corresponding to position 0
    start_anchor: f64,
    loop_enabled: bool,
    smoothing: f32,
    frame_requested: bool,
    last_pose: Option<CameraPose>,
    hook: Option<EventHook<PlayerEvent>>,
}

impl PathPlayer<MonotonicClock> {
    /// Create a player on the system clock
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }
}

impl Default for PathPlayer<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> PathPlayer<C> {
    /// Create a player on a custom clock
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            keyframes: Vec::new(),
            duration: 0.0,
            state: PlaybackState::Stopped,
            current_time: 0.0,
            start_anchor: 0.0,
            loop_enabled: false,
            smoothing: DEFAULT_SMOOTHING,
            frame_requested: false,
            last_pose: None,
            hook: None,
        }
    }

    /// Install a structured event hook
    pub fn set_event_hook(&mut self, hook: Option<EventHook<PlayerEvent>>) {
        self.hook = hook;
    }

    /// Replace the keyframe snapshot (sorted by time).
    ///
    /// The current position is clamped into the new duration.
    pub fn set_keyframes(&mut self, keyframes: Vec<Keyframe>) {
        self.duration = path_duration(&keyframes);
        self.keyframes = keyframes;
        if self.current_time > self.duration {
            self.current_time = self.duration;
        }
    }

    /// Enable or disable looping; applies at the next end-of-path crossing
    pub fn set_loop(&mut self, enabled: bool) {
        self.loop_enabled = enabled;
    }

    /// Whether looping is enabled
    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    /// Position smoothing passed to the sampler
    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.smoothing = smoothing.clamp(0.0, 1.0);
    }

    /// Position smoothing
    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    /// Path duration in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Playback position in seconds
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    /// Current state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Whether playback is advancing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Whether the host should keep delivering display-frame ticks
    pub fn wants_frame(&self) -> bool {
        self.frame_requested
    }

    /// Last pose applied to the camera
    pub fn last_pose(&self) -> Option<CameraPose> {
        self.last_pose
    }

    /// Start or resume playback from the current position.
    ///
    /// Takes exclusive control of the camera until [`PathPlayer::stop`].
    pub fn play(&mut self, renderer: &mut dyn Renderer) -> Result<(), PlayerError> {
        if self.keyframes.len() < 2 {
            tracing::warn!(count = self.keyframes.len(), "Cannot play path");
            return Err(PlayerError::NotEnoughKeyframes(self.keyframes.len()));
        }
        if self.state == PlaybackState::Playing {
            return Ok(());
        }

        renderer.set_controls_enabled(false);
        self.start_anchor = self.clock.now() - f64::from(self.current_time);
        self.frame_requested = true;
        self.transition(PlaybackState::Playing);
        Ok(())
    }

    /// Pause playback, keeping the camera at the last sampled pose.
    ///
    /// Only valid while playing; returns whether the state changed.
    pub fn pause(&mut self) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        self.frame_requested = false;
        self.transition(PlaybackState::Paused);
        true
    }

    /// Stop playback, snap the camera to the first keyframe and release it.
    pub fn stop(&mut self, renderer: &mut dyn Renderer) {
        self.frame_requested = false;
        self.current_time = 0.0;
        if let Some(first) = self.keyframes.first() {
            renderer.set_camera_pose(&first.pose);
            self.last_pose = Some(first.pose);
        }
        renderer.set_controls_enabled(true);
        self.transition(PlaybackState::Stopped);
    }

    /// Jump to `time` (clamped to `[0, duration]`) and pause there.
    ///
    /// Never resumes playback on its own.
    pub fn seek(&mut self, time: f32, renderer: &mut dyn Renderer) {
        self.frame_requested = false;
        self.current_time = if time.is_nan() {
            0.0
        } else {
            time.clamp(0.0, self.duration)
        };

        if self.state == PlaybackState::Stopped {
            renderer.set_controls_enabled(false);
        }
        self.transition(PlaybackState::Paused);
        self.apply_current(renderer);
        self.emit(PlayerEvent::Seeked {
            time: self.current_time,
        });
    }

    /// Advance playback for one display frame.
    ///
    /// Returns the pose applied to the camera, or `None` when not playing or
    /// when the path just finished.
    pub fn tick(&mut self, renderer: &mut dyn Renderer) -> Option<CameraPose> {
        if self.state != PlaybackState::Playing {
            return None;
        }

        let now = self.clock.now();
        let elapsed = (now - self.start_anchor).max(0.0);

        if elapsed >= f64::from(self.duration) {
            if !self.loop_enabled {
                tracing::debug!(duration = self.duration, "Path playback finished");
                self.emit(PlayerEvent::Finished);
                self.stop(renderer);
                return None;
            }

            let duration = f64::from(self.duration);
            let position = if duration > 0.0 { elapsed % duration } else { 0.0 };
            self.start_anchor = now - position;
            self.current_time = position as f32;
            tracing::debug!(time = self.current_time, "Path playback looped");
            self.emit(PlayerEvent::Looped {
                time: self.current_time,
            });
        } else {
            self.current_time = elapsed as f32;
        }

        self.apply_current(renderer)
    }

    fn apply_current(&mut self, renderer: &mut dyn Renderer) -> Option<CameraPose> {
        let start = self.keyframes.first()?.t;
        let pose = sample_pose(&self.keyframes, start + self.current_time, self.smoothing)?;
        renderer.set_camera_pose(&pose);
        self.last_pose = Some(pose);
        Some(pose)
    }

    fn transition(&mut self, to: PlaybackState) {
        let from = self.state;
        self.state = to;
        if from != to {
            tracing::info!(?from, ?to, time = self.current_time, "Playback state changed");
            self.emit(PlayerEvent::StateChanged {
                from,
                to,
                time: self.current_time,
            });
        }
    }

    fn emit(&self, event: PlayerEvent) {
        if let Some(hook) = &self.hook {
            hook.emit(&event);
        }
    }
}
