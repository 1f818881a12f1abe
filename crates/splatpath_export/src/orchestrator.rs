// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame-accurate export driver.
//!
//! One run walks frame indices `0..frame_count`, samples the pose at
//! `first.t + frame / fps`, renders it off-screen, encodes it and uploads it
//! to the remote encoder. Uploads are pipelined one deep: frame N uploads
//! while frame N+1 renders, and frame N's upload is awaited before frame N+1
//! is rendered, so at most one upload is ever in flight and uploads arrive in
//! index order.
//!
//! Cancellation is cooperative and only checked between frames. A cancelled
//! run settles its outstanding upload before notifying the encoder, so the
//! encoder never sees a frame after the cancel.

use crate::encoder::EncoderClient;
use crate::error::{ExportError, NetworkError, Result};
use crate::progress::ExportProgress;
use crate::protocol::SessionId;
use crate::resources::ExportResources;
use crate::settings::ExportSettings;
use splatpath_sequencer::{sample_pose, CameraPose, EventHook, RenderError, Renderer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

type PendingUpload = Option<JoinHandle<std::result::Result<(), NetworkError>>>;

/// Requests cancellation of a running export from outside the run
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Ask the run to stop at the next frame boundary
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives one export at a time.
///
/// `run` takes `&mut self`, so a single orchestrator can never have two runs
/// active at once.
pub struct ExportOrchestrator {
    encoder: Arc<dyn EncoderClient>,
    cancel: CancelHandle,
    resources: ExportResources,
    hook: Option<EventHook<ExportProgress>>,
}

impl ExportOrchestrator {
    /// Create an orchestrator uploading through `encoder`
    pub fn new(encoder: Arc<dyn EncoderClient>) -> Self {
        Self {
            encoder,
            cancel: CancelHandle::default(),
            resources: ExportResources::new(),
            hook: None,
        }
    }

    /// Install a structured hook receiving every progress stage
    pub fn set_event_hook(&mut self, hook: Option<EventHook<ExportProgress>>) {
        self.hook = hook;
    }

    /// Handle for cancelling the current or next run
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Request cancellation at the next frame boundary
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether export buffers are currently held
    pub fn holds_resources(&self) -> bool {
        self.resources.is_allocated()
    }

    /// Run an export and return the locator of the finished video.
    ///
    /// Every stage is reported through `on_progress`. Off-screen resources
    /// are released however the run ends, including when the returned future
    /// is dropped before completion (an outstanding upload is aborted and the
    /// remote session is cancelled in the background).
    pub async fn run(
        &mut self,
        renderer: &mut dyn Renderer,
        settings: &ExportSettings,
        on_progress: &mut (dyn FnMut(&ExportProgress) + Send),
    ) -> Result<String> {
        self.cancel.reset();
        settings.validate()?;

        tracing::info!(
            frames = settings.render.frame_count,
            fps = settings.render.fps,
            width = settings.render.width,
            height = settings.render.height,
            "Starting export"
        );
        self.report(on_progress, ExportProgress::Starting);

        let mut active = ActiveRun {
            encoder: &self.encoder,
            cancel: &self.cancel,
            hook: self.hook.as_ref(),
            resources: &mut self.resources,
            renderer,
            session: None,
            pending: None,
            settled: false,
        };
        let result = active.drive(settings, on_progress).await;
        active.settled = true;
        drop(active);

        let terminal = match &result {
            Ok(locator) => {
                tracing::info!(%locator, "Export complete");
                ExportProgress::Complete {
                    locator: locator.clone(),
                }
            }
            Err(ExportError::Cancelled) => {
                tracing::info!("Export cancelled");
                ExportProgress::Cancelled
            }
            Err(e) => {
                tracing::error!("Export failed: {e}");
                ExportProgress::Failed {
                    message: e.to_string(),
                }
            }
        };
        self.report(on_progress, terminal);
        result
    }

    fn report(&self, on_progress: &mut (dyn FnMut(&ExportProgress) + Send), progress: ExportProgress) {
        emit(self.hook.as_ref(), on_progress, progress);
    }
}

/// Borrowed state of one run in progress.
///
/// Dropping it releases the staging buffers and the renderer's export target.
/// If the run never reached its end (the future was dropped mid-await), the
/// outstanding upload is aborted and the session is cancelled on the runtime.
struct ActiveRun<'a> {
    encoder: &'a Arc<dyn EncoderClient>,
    cancel: &'a CancelHandle,
    hook: Option<&'a EventHook<ExportProgress>>,
    resources: &'a mut ExportResources,
    renderer: &'a mut dyn Renderer,
    session: Option<SessionId>,
    pending: PendingUpload,
    settled: bool,
}

impl ActiveRun<'_> {
    async fn drive(
        &mut self,
        settings: &ExportSettings,
        on_progress: &mut (dyn FnMut(&ExportProgress) + Send),
    ) -> Result<String> {
        let session = self.encoder.start(settings).await?;
        self.session = Some(session.clone());

        let render = settings.render;
        let start_t = settings.keyframes.first().map_or(0.0, |k| k.t);

        for frame in 0..render.frame_count {
            self.abort_if_cancelled(&session).await?;
            self.settle_pending().await?;

            let t = start_t + render.frame_time(frame);
            let Some(pose) = sample_pose(&settings.keyframes, t, render.smoothing) else {
                continue;
            };

            let png = self.render_frame(render.width, render.height, &pose, frame)?;

            let encoder = Arc::clone(self.encoder);
            let session_id = session.clone();
            self.pending = Some(tokio::spawn(async move {
                encoder.upload_frame(&session_id, frame, png).await
            }));

            emit(
                self.hook,
                on_progress,
                ExportProgress::Rendering {
                    frame: frame + 1,
                    total: render.frame_count,
                },
            );

            tokio::task::yield_now().await;
        }

        self.abort_if_cancelled(&session).await?;
        self.settle_pending().await?;

        emit(self.hook, on_progress, ExportProgress::Encoding);
        tracing::info!(%session, "All frames uploaded, encoding");
        Ok(self.encoder.finish(&session).await?)
    }

    /// Render one pose off-screen and encode it as PNG
    fn render_frame(
        &mut self,
        width: u32,
        height: u32,
        pose: &CameraPose,
        frame: u32,
    ) -> std::result::Result<Vec<u8>, RenderError> {
        self.resources.ensure(width, height)?;
        self.renderer
            .render_frame_offscreen(width, height, pose, self.resources.staging_mut())?;
        let png = self.resources.encode_png()?;
        tracing::trace!(frame, bytes = png.len(), "Rendered frame");
        Ok(png)
    }

    async fn abort_if_cancelled(&mut self, session: &SessionId) -> Result<()> {
        if !self.cancel.is_cancelled() {
            return Ok(());
        }

        // Outcome is irrelevant once cancelled; only ordering matters.
        let _ = self.settle_pending().await;
        if let Err(e) = self.encoder.cancel(session).await {
            tracing::warn!(%session, "Failed to cancel export session: {e}");
        }
        Err(ExportError::Cancelled)
    }

    /// Wait for the outstanding upload, if any.
    ///
    /// The handle stays in `pending` while awaited so a dropped run can
    /// still abort it.
    async fn settle_pending(&mut self) -> Result<()> {
        let Some(upload) = self.pending.as_mut() else {
            return Ok(());
        };
        let outcome = upload.await;
        self.pending = None;
        match outcome {
            Ok(result) => Ok(result?),
            Err(e) => Err(NetworkError::Task(e.to_string()).into()),
        }
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        if let Some(upload) = self.pending.take() {
            upload.abort();
        }

        if !self.settled {
            if let Some(session) = self.session.take() {
                tracing::warn!(%session, "Export dropped before completion");
                match tokio::runtime::Handle::try_current() {
                    Ok(runtime) => {
                        let encoder = Arc::clone(self.encoder);
                        runtime.spawn(async move {
                            if let Err(e) = encoder.cancel(&session).await {
                                tracing::warn!(%session, "Failed to cancel export session: {e}");
                            }
                        });
                    }
                    Err(_) => tracing::warn!(%session, "No runtime to cancel export session on"),
                }
            }
        }

        self.resources.release();
        self.renderer.dispose_export_resources();
    }
}

fn emit(
    hook: Option<&EventHook<ExportProgress>>,
    on_progress: &mut (dyn FnMut(&ExportProgress) + Send),
    progress: ExportProgress,
) {
    if let Some(hook) = hook {
        hook.emit(&progress);
    }
    on_progress(&progress);
}
