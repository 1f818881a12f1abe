// SPDX-License-Identifier: MIT OR Apache-2.0
//! Application shell tying the timeline, preview player and exporter together.
//!
//! The studio owns the renderer and arbitrates the live camera between
//! interactive controls, preview playback and export. All UI-facing state is
//! published through two observable stores.

use crate::encoder::EncoderClient;
use crate::error::ExportError;
use crate::orchestrator::{CancelHandle, ExportOrchestrator};
use crate::progress::ExportProgress;
use crate::settings::{ExportConfig, ExportSettings};
use splatpath_sequencer::presets::{self, PresetFraming, PresetKind};
use splatpath_sequencer::{
    CameraPose, Clock, Keyframe, KeyframeId, MonotonicClock, MoveDirection, PathPlayer, PathState,
    PlaybackState, PlayerError, Renderer, Store, Timeline, TimelineError,
};
use std::sync::Arc;
use thiserror::Error;

/// Studio operation errors
#[derive(Debug, Error)]
pub enum StudioError {
    /// Keyframe edit failed
    #[error(transparent)]
    Timeline(#[from] TimelineError),

    /// Preview could not start
    #[error(transparent)]
    Player(#[from] PlayerError),

    /// Export failed or was cancelled
    #[error(transparent)]
    Export(#[from] ExportError),

    /// The renderer has no camera to read
    #[error("Camera pose unavailable")]
    CameraUnavailable,

    /// Rerun requested before any export
    #[error("No previous export to rerun")]
    NoPreviousExport,
}

impl StudioError {
    /// Whether this is a user-initiated export cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StudioError::Export(e) if e.is_cancelled())
    }
}

/// UI-facing state of the exporter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportState {
    /// Whether a run is active
    pub is_exporting: bool,
    /// Completion in `[0, 1]`
    pub progress: f32,
    /// Status line
    pub status: String,
    /// Locator of the last finished video
    pub output_url: Option<String>,
}

/// Camera path editor session
pub struct Studio<R: Renderer, C: Clock = MonotonicClock> {
    renderer: R,
    timeline: Timeline,
    player: PathPlayer<C>,
    exporter: ExportOrchestrator,
    config: ExportConfig,
    path_state: Store<PathState>,
    export_state: Store<ExportState>,
    last_export: Option<ExportSettings>,
}

impl<R: Renderer> Studio<R, MonotonicClock> {
    /// Studio on the system clock
    pub fn new(renderer: R, encoder: Arc<dyn EncoderClient>, config: ExportConfig) -> Self {
        Self::with_clock(renderer, encoder, config, MonotonicClock::new())
    }
}

impl<R: Renderer, C: Clock> Studio<R, C> {
    /// Studio with a custom playback clock
    pub fn with_clock(
        renderer: R,
        encoder: Arc<dyn EncoderClient>,
        config: ExportConfig,
        clock: C,
    ) -> Self {
        let mut player = PathPlayer::with_clock(clock);
        player.set_smoothing(config.smoothing);

        let studio = Self {
            renderer,
            timeline: Timeline::new(),
            player,
            exporter: ExportOrchestrator::new(encoder),
            config,
            path_state: Store::new(PathState::default()),
            export_state: Store::new(ExportState::default()),
            last_export: None,
        };
        studio.publish();
        studio
    }

    /// Observable editor state
    pub fn path_state(&self) -> &Store<PathState> {
        &self.path_state
    }

    /// Observable exporter state
    pub fn export_state(&self) -> &Store<ExportState> {
        &self.export_state
    }

    /// Host renderer
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Host renderer, mutably
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Keyframe timeline
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Preview player
    pub fn player(&self) -> &PathPlayer<C> {
        &self.player
    }

    /// Export defaults
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    // --- Keyframe editing ---

    /// Capture the live camera as a new keyframe at the end of the path
    pub fn add_keyframe(&mut self) -> Result<KeyframeId, StudioError> {
        let pose = self.camera_pose()?;
        let id = self.timeline.append(pose);
        self.sync();
        Ok(id)
    }

    /// Overwrite a keyframe's pose with the live camera
    pub fn update_keyframe_pose(&mut self, id: KeyframeId) -> Result<(), StudioError> {
        let pose = self.camera_pose()?;
        self.timeline.set_pose(id, pose)?;
        self.sync();
        Ok(())
    }

    /// Delete a keyframe
    pub fn delete_keyframe(&mut self, id: KeyframeId) -> Result<(), StudioError> {
        self.timeline.delete(id)?;
        self.sync();
        Ok(())
    }

    /// Swap a keyframe with its neighbor
    pub fn move_keyframe(&mut self, id: KeyframeId, direction: MoveDirection) -> Result<(), StudioError> {
        self.timeline.move_keyframe(id, direction)?;
        self.sync();
        Ok(())
    }

    /// Set a keyframe's time, returning the time actually applied.
    ///
    /// Stops preview first.
    pub fn set_keyframe_time(&mut self, id: KeyframeId, t: f32) -> Result<f32, StudioError> {
        self.stop_preview();
        let applied = self.timeline.retime(id, t)?;
        self.sync();
        Ok(applied)
    }

    /// Select a keyframe and move the camera to it
    pub fn select(&mut self, id: Option<KeyframeId>) -> Result<(), StudioError> {
        self.timeline.select(id)?;
        if let Some(pose) = id.and_then(|id| self.timeline.keyframe(id)).map(|k| k.pose) {
            if self.player.state() == PlaybackState::Stopped {
                self.renderer.set_camera_pose(&pose);
            }
        }
        self.publish();
        Ok(())
    }

    /// Remove every keyframe
    pub fn clear(&mut self) {
        self.stop_preview();
        self.timeline.clear();
        self.sync();
    }

    /// Replace the path with a preset framed around the live camera
    pub fn apply_preset(&mut self, kind: PresetKind, duration: f32) -> Result<(), StudioError> {
        let pose = self.camera_pose()?;
        let framing = PresetFraming::infer(&pose, self.renderer.orbit_target());
        tracing::info!(preset = %kind, duration, "Applying preset");
        self.load_keyframes(presets::generate(kind, &framing, duration));
        Ok(())
    }

    /// Replace the path with `keyframes`
    pub fn load_keyframes(&mut self, keyframes: Vec<Keyframe>) {
        self.stop_preview();
        self.timeline.replace_all(keyframes);
        self.sync();
    }

    // --- Preview ---

    /// Start or resume preview playback
    pub fn play(&mut self) -> Result<(), StudioError> {
        let result = self.player.play(&mut self.renderer);
        self.path_state.update(|s| {
            s.preview_error = result.as_ref().err().map(ToString::to_string);
        });
        self.publish();
        Ok(result?)
    }

    /// Pause preview playback
    pub fn pause(&mut self) {
        self.player.pause();
        self.publish();
    }

    /// Stop preview and hand the camera back to the controls
    pub fn stop(&mut self) {
        self.player.stop(&mut self.renderer);
        self.publish();
    }

    /// Jump preview to `time` and pause there
    pub fn seek(&mut self, time: f32) {
        self.player.seek(time, &mut self.renderer);
        self.publish();
    }

    /// Enable or disable preview looping
    pub fn set_loop(&mut self, enabled: bool) {
        self.player.set_loop(enabled);
        self.publish();
    }

    /// Position smoothing for preview and export
    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.player.set_smoothing(smoothing);
    }

    /// Drive preview playback for one display frame
    pub fn tick(&mut self) -> Option<CameraPose> {
        if self.player.state() != PlaybackState::Playing {
            return None;
        }
        let pose = self.player.tick(&mut self.renderer);
        self.publish();
        pose
    }

    // --- Export ---

    /// Settings for exporting the current path
    pub fn export_settings(&self, scene_url: &str) -> ExportSettings {
        let mut settings = ExportSettings::new(scene_url, self.timeline.snapshot(), &self.config);
        settings.render.smoothing = self.player.smoothing();
        settings
    }

    /// Handle for cancelling a running export
    pub fn cancel_handle(&self) -> CancelHandle {
        self.exporter.cancel_handle()
    }

    /// Export the current path and return the video locator.
    ///
    /// Fails with [`ExportError::PlayerActive`] while preview is playing.
    pub async fn export(
        &mut self,
        scene_url: &str,
        on_progress: &mut (dyn FnMut(&ExportProgress) + Send),
    ) -> Result<String, StudioError> {
        if self.player.is_playing() {
            tracing::warn!("Export requested during preview playback");
            return Err(ExportError::PlayerActive.into());
        }
        let settings = self.export_settings(scene_url);
        self.last_export = Some(settings.clone());
        self.run_export(settings, on_progress).await
    }

    /// Export again with the settings of the previous export
    pub async fn rerun_export(
        &mut self,
        on_progress: &mut (dyn FnMut(&ExportProgress) + Send),
    ) -> Result<String, StudioError> {
        if self.player.is_playing() {
            return Err(ExportError::PlayerActive.into());
        }
        let settings = self.last_export.clone().ok_or(StudioError::NoPreviousExport)?;
        self.run_export(settings, on_progress).await
    }

    async fn run_export(
        &mut self,
        settings: ExportSettings,
        on_progress: &mut (dyn FnMut(&ExportProgress) + Send),
    ) -> Result<String, StudioError> {
        self.export_state.update(|s| {
            s.is_exporting = true;
            s.progress = 0.0;
            s.status.clear();
            s.output_url = None;
        });

        let store = self.export_state.clone();
        let result = self
            .exporter
            .run(&mut self.renderer, &settings, &mut |progress| {
                store.update(|s| {
                    s.progress = progress.fraction();
                    s.status = progress.status_text();
                    if let ExportProgress::Complete { locator } = progress {
                        s.output_url = Some(locator.clone());
                    }
                });
                on_progress(progress);
            })
            .await;

        self.export_state.update(|s| {
            s.is_exporting = false;
            if let Err(ExportError::Validation(e)) = &result {
                s.status = e.to_string();
            }
        });
        Ok(result?)
    }

    // --- Internals ---

    fn camera_pose(&self) -> Result<CameraPose, StudioError> {
        self.renderer.camera_pose().ok_or(StudioError::CameraUnavailable)
    }

    fn stop_preview(&mut self) {
        if self.player.state() != PlaybackState::Stopped {
            self.player.stop(&mut self.renderer);
        }
    }

    /// Hand the player a fresh snapshot and publish.
    ///
    /// A path left with fewer than two keyframes cannot be previewed, so any
    /// running or paused preview is stopped and controls come back.
    fn sync(&mut self) {
        self.player.set_keyframes(self.timeline.snapshot());
        if self.timeline.len() < 2 {
            self.stop_preview();
        }
        self.publish();
    }

    fn publish(&self) {
        let state = self.player.state();
        let keyframes = self.timeline.snapshot();
        self.path_state.update(|s| {
            s.keyframes = keyframes;
            s.selected_id = self.timeline.selected();
            s.is_previewing = state != PlaybackState::Stopped;
            s.is_paused = state == PlaybackState::Paused;
            s.current_time = self.player.current_time();
            s.duration = self.timeline.duration();
            s.loop_enabled = self.player.loop_enabled();
        });
    }
}
