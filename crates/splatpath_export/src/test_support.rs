// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory encoder and renderer doubles shared by the crate's tests.

use crate::encoder::EncoderClient;
use crate::error::NetworkError;
use crate::protocol::{SessionId, SessionStatus, StatusReport};
use crate::settings::ExportSettings;
use async_trait::async_trait;
use parking_lot::Mutex;
use splatpath_sequencer::{CameraPose, RenderError, Renderer, Vec3};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One request seen by [`MockEncoder`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Start { frames: u32 },
    Upload(u32),
    UploadDone(u32),
    Finish,
    Cancel,
}

/// Records every request and tracks upload concurrency
#[derive(Default)]
pub struct MockEncoder {
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fail_upload: Option<u32>,
    hang_upload: Option<u32>,
    live: Arc<()>,
    sessions: AtomicUsize,
}

impl MockEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoder rejecting the upload of frame `index`
    pub fn failing_upload(index: u32) -> Self {
        Self {
            fail_upload: Some(index),
            ..Self::default()
        }
    }

    /// Encoder whose upload of frame `index` never completes
    pub fn hanging_upload(index: u32) -> Self {
        Self {
            hang_upload: Some(index),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    pub fn uploaded_indices(&self) -> Vec<u32> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Upload(i) => Some(*i),
                _ => None,
            })
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Upload futures not yet completed or dropped
    pub fn live_uploads(&self) -> usize {
        Arc::strong_count(&self.live) - 1
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl EncoderClient for MockEncoder {
    async fn start(&self, settings: &ExportSettings) -> Result<SessionId, NetworkError> {
        self.record(Call::Start {
            frames: settings.render.frame_count,
        });
        let n = self.sessions.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SessionId(format!("session-{n}")))
    }

    async fn upload_frame(
        &self,
        _session: &SessionId,
        index: u32,
        png: Vec<u8>,
    ) -> Result<(), NetworkError> {
        assert!(png.starts_with(b"\x89PNG"));
        let _live = Arc::clone(&self.live);
        self.record(Call::Upload(index));
        if self.hang_upload == Some(index) {
            std::future::pending::<()>().await;
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.record(Call::UploadDone(index));
        if self.fail_upload == Some(index) {
            return Err(NetworkError::Status {
                endpoint: format!("/export/mock/frame/{index}"),
                status: 500,
                message: "disk full".to_string(),
            });
        }
        Ok(())
    }

    async fn finish(&self, session: &SessionId) -> Result<String, NetworkError> {
        self.record(Call::Finish);
        Ok(format!("mock://{session}/output.mp4"))
    }

    async fn cancel(&self, _session: &SessionId) -> Result<(), NetworkError> {
        self.record(Call::Cancel);
        Ok(())
    }

    async fn status(&self, _session: &SessionId) -> Result<StatusReport, NetworkError> {
        let received = self.count(|c| matches!(c, Call::UploadDone(_))) as u32;
        let total = self
            .calls
            .lock()
            .iter()
            .rev()
            .find_map(|c| match c {
                Call::Start { frames } => Some(*frames),
                _ => None,
            })
            .unwrap_or(0);
        let status = if self.count(|c| matches!(c, Call::Cancel)) > 0 {
            SessionStatus::Cancelled
        } else if self.count(|c| matches!(c, Call::Finish)) > 0 {
            SessionStatus::Done
        } else {
            SessionStatus::Rendering
        };
        Ok(StatusReport {
            status,
            received_frames: received,
            total_frames: total,
        })
    }
}

/// Renderer with a live camera that fills frames with a solid color
#[derive(Debug, Default)]
pub struct MockRenderer {
    pub camera: Option<CameraPose>,
    pub orbit: Option<Vec3>,
    pub controls_enabled: bool,
    pub rendered: u32,
    pub poses: Vec<CameraPose>,
    pub disposed: u32,
    pub fail_at: Option<u32>,
}

impl MockRenderer {
    pub fn with_camera(pose: CameraPose) -> Self {
        Self {
            camera: Some(pose),
            controls_enabled: true,
            ..Self::default()
        }
    }
}

impl Renderer for MockRenderer {
    fn camera_pose(&self) -> Option<CameraPose> {
        self.camera
    }

    fn set_camera_pose(&mut self, pose: &CameraPose) {
        self.camera = Some(*pose);
    }

    fn render_frame_offscreen(
        &mut self,
        width: u32,
        height: u32,
        pose: &CameraPose,
        pixels: &mut [u8],
    ) -> Result<(), RenderError> {
        if self.fail_at == Some(self.rendered) {
            return Err(RenderError::FrameFailed {
                frame: self.rendered,
                reason: "device lost".to_string(),
            });
        }
        assert_eq!(pixels.len(), (width * height * 4) as usize);
        for px in pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[200, 100, 50, 255]);
        }
        self.poses.push(*pose);
        self.rendered += 1;
        Ok(())
    }

    fn dispose_export_resources(&mut self) {
        self.disposed += 1;
    }

    fn orbit_target(&self) -> Option<Vec3> {
        self.orbit
    }

    fn set_controls_enabled(&mut self, enabled: bool) {
        self.controls_enabled = enabled;
    }
}
