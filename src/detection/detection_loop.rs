use super::clock::{Clock, MonotonicClock};
use super::gate::FrameGate;
use super::skeleton::draw_pose;
use super::surface::RenderSurface;
use crate::camera::{DisplaySize, VideoElement};
use crate::config::DetectorConfig;
use crate::detector::DetectorAdapter;
use crate::error::{PosecamError, Result};
use crate::pose::PoseDetectionResult;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Receives every processed frame's result; `None` means no body this frame
pub trait DetectionListener: Send {
    fn on_result(&mut self, result: Option<&PoseDetectionResult>);
}

impl<F> DetectionListener for F
where
    F: FnMut(Option<&PoseDetectionResult>) + Send,
{
    fn on_result(&mut self, result: Option<&PoseDetectionResult>) {
        self(result)
    }
}

/// What a single wake-up did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    DetectorNotReady,
    NoVideo,
    Throttled,
    Processed { detected: bool },
}

/// Samples the live video at a bounded rate and runs pose detection on it
pub struct DetectionLoop {
    detector: Arc<DetectorAdapter>,
    video: Arc<VideoElement>,
    clock: Arc<dyn Clock>,
    gate: FrameGate,
    surface: RenderSurface,
    display: watch::Receiver<DisplaySize>,
    mirrored: bool,
    draw_skeleton: bool,
    listener: Box<dyn DetectionListener>,
    missing_reported: bool,
}

impl DetectionLoop {
    /// One wake-up: skip unless the detector is ready, a frame is available
    /// and the frame interval has elapsed; otherwise detect, redraw and publish.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.detector.is_ready() {
            return TickOutcome::DetectorNotReady;
        }

        self.sync_surface();

        let Some(frame) = self.video.current_frame() else {
            return self.video_missing();
        };
        if !self.surface.is_available() {
            return self.video_missing();
        }

        let now = self.clock.now();
        if !self.gate.is_open(now) {
            return TickOutcome::Throttled;
        }
        self.gate.admit(now);

        let timestamp = i64::try_from(now.as_micros()).unwrap_or(i64::MAX);
        let result = self.detector.detect(&frame, timestamp);

        self.surface.clear();
        if self.draw_skeleton {
            if let Some(landmarks) = result.as_ref().and_then(PoseDetectionResult::primary) {
                let connections = self.detector.connections();
                draw_pose(self.surface.image_mut(), landmarks, &connections, self.mirrored);
            }
        }

        trace!(
            "Processed frame {} at {:?} (body: {})",
            frame.id,
            now,
            result.is_some()
        );

        self.missing_reported = false;
        self.listener.on_result(result.as_ref());
        TickOutcome::Processed {
            detected: result.is_some(),
        }
    }

    /// Frames stopped arriving: clear the last skeleton and report no body, once
    fn video_missing(&mut self) -> TickOutcome {
        if !self.missing_reported {
            debug!("No video frame available; clearing last detection");
            self.missing_reported = true;
            self.surface.clear();
            self.listener.on_result(None);
        }
        TickOutcome::NoVideo
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    /// Follow the video's on-screen size
    fn sync_surface(&mut self) {
        if self.display.has_changed().unwrap_or(false) {
            let display = *self.display.borrow_and_update();
            if self.surface.resize(display) {
                let (width, height) = self.surface.dimensions();
                debug!("Detection surface resized to {}x{}", width, height);
            }
        }
    }

    /// Run on a refresh-rate schedule until cancelled
    pub fn spawn(mut self, refresh_rate: u32) -> DetectionLoopHandle {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let period = Duration::from_secs_f64(1.0 / f64::from(refresh_rate.max(1)));
        self.gate.set_slack(period / 2);

        let task = tokio::spawn(async move {
            info!(
                "Detection loop started ({} Hz refresh, {:?} frame interval)",
                refresh_rate,
                self.gate.interval()
            );

            let mut refresh = tokio::time::interval(period);
            refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = refresh.tick() => {
                        self.tick();
                    }
                }
            }

            debug!("Detection loop stopped");
        });

        DetectionLoopHandle {
            token,
            cancel_requested: AtomicBool::new(false),
            task: Some(task),
        }
    }
}

/// Running detection loop; dropping it cancels the loop
pub struct DetectionLoopHandle {
    token: CancellationToken,
    cancel_requested: AtomicBool,
    task: Option<JoinHandle<()>>,
}

impl DetectionLoopHandle {
    /// Request cancellation; only the first call has an effect
    pub fn cancel(&self) -> bool {
        if self.cancel_requested.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.token.cancel();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel and wait for the loop task to exit
    pub async fn stop(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Detection loop task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for DetectionLoopHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Builder for the detection loop
pub struct DetectionLoopBuilder {
    detector: Option<Arc<DetectorAdapter>>,
    video: Option<Arc<VideoElement>>,
    listener: Option<Box<dyn DetectionListener>>,
    clock: Option<Arc<dyn Clock>>,
    target_fps: u32,
    mirrored: bool,
    draw_skeleton: bool,
}

impl DetectionLoopBuilder {
    pub fn new() -> Self {
        Self {
            detector: None,
            video: None,
            listener: None,
            clock: None,
            target_fps: 30,
            mirrored: false,
            draw_skeleton: true,
        }
    }

    pub fn config(mut self, config: &DetectorConfig) -> Self {
        self.target_fps = config.target_fps;
        self
    }

    pub fn detector(mut self, detector: Arc<DetectorAdapter>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn video(mut self, video: Arc<VideoElement>) -> Self {
        self.video = Some(video);
        self
    }

    pub fn listener<L: DetectionListener + 'static>(mut self, listener: L) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn target_fps(mut self, target_fps: u32) -> Self {
        self.target_fps = target_fps;
        self
    }

    /// Draw mirrored, for a front-facing camera
    pub fn mirrored(mut self, mirrored: bool) -> Self {
        self.mirrored = mirrored;
        self
    }

    pub fn draw_skeleton(mut self, draw_skeleton: bool) -> Self {
        self.draw_skeleton = draw_skeleton;
        self
    }

    pub fn build(self) -> Result<DetectionLoop> {
        let detector = self
            .detector
            .ok_or_else(|| PosecamError::system("Pose detector must be specified"))?;
        let video = self
            .video
            .ok_or_else(|| PosecamError::system("Video element must be specified"))?;
        let listener = self
            .listener
            .ok_or_else(|| PosecamError::system("Detection listener must be specified"))?;

        let mut display = video.watch_display_size();
        let mut surface = RenderSurface::new();
        surface.resize(*display.borrow_and_update());

        Ok(DetectionLoop {
            detector,
            video,
            clock: self
                .clock
                .unwrap_or_else(|| Arc::new(MonotonicClock::new())),
            gate: FrameGate::from_rate(self.target_fps),
            surface,
            display,
            mirrored: self.mirrored,
            draw_skeleton: self.draw_skeleton,
            listener,
            missing_reported: false,
        })
    }
}

impl Default for DetectionLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}
