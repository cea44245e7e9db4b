use super::backend::{
    CameraBackend, CameraSessionState, DeviceKind, FacingMode, MediaStream, PlatformCause,
    StreamConstraints,
};
use super::classify::classify;
use super::video::VideoElement;
use crate::config::CameraConfig;
use crate::error::CameraError;
use crate::events::{EventBus, PosecamEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Owns the live camera stream and its lifecycle.
///
/// At most one stream is held at a time: every `start` releases the previous
/// stream before asking the host for a new one, and dropping the session
/// releases whatever it still holds.
pub struct CameraSession {
    backend: Arc<dyn CameraBackend>,
    config: CameraConfig,
    video: Arc<VideoElement>,
    event_bus: Arc<EventBus>,
    stream: Option<Arc<dyn MediaStream>>,
    state: CameraSessionState,
    error: Option<CameraError>,
    facing: FacingMode,
    multiple_cameras: Arc<AtomicBool>,
    device_check: Option<JoinHandle<()>>,
}

impl CameraSession {
    pub fn new(
        config: CameraConfig,
        backend: Arc<dyn CameraBackend>,
        video: Arc<VideoElement>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let facing = config.facing;
        Self {
            backend,
            config,
            video,
            event_bus,
            stream: None,
            state: CameraSessionState::Idle,
            error: None,
            facing,
            multiple_cameras: Arc::new(AtomicBool::new(false)),
            device_check: None,
        }
    }

    /// Start streaming from the camera facing `mode`.
    ///
    /// Callable from any state. On failure the session ends in `Error` with
    /// the classified error, and no stream is left attached.
    pub async fn start(&mut self, mode: FacingMode) -> Result<(), CameraError> {
        info!(
            "Starting {} camera ({}x{} preferred)",
            mode, self.config.resolution.0, self.config.resolution.1
        );

        self.release_stream();

        if !self.backend.is_supported() {
            let error = classify(&PlatformCause::Unsupported);
            self.fail(error.clone());
            return Err(error);
        }

        self.error = None;
        self.transition(CameraSessionState::Loading, true);

        let constraints = StreamConstraints {
            facing: mode,
            ideal_resolution: self.config.resolution,
        };

        let stream = match self.backend.request_stream(constraints).await {
            Ok(stream) => stream,
            Err(cause) => {
                let error = classify(&cause);
                warn!("Camera request failed ({}): {}", cause, error.kind());
                self.fail(error.clone());
                return Err(error);
            }
        };

        if !stream.is_active() {
            // Granted but dead on arrival: release it rather than attach it
            stream.stop_all_tracks();
            let error = classify(&PlatformCause::NotReadable);
            warn!("Camera stream delivered no live tracks");
            self.fail(error.clone());
            return Err(error);
        }

        self.video.attach(Arc::clone(&stream));
        self.stream = Some(stream);
        self.facing = mode;
        self.transition(CameraSessionState::Ready, true);

        info!("Camera ready ({})", mode);
        Ok(())
    }

    /// Release every active track. Safe to call repeatedly.
    pub fn stop(&mut self) {
        let released = self.release_stream();
        if let Some(task) = self.device_check.take() {
            task.abort();
        }

        if matches!(
            self.state,
            CameraSessionState::Ready | CameraSessionState::Loading
        ) {
            self.transition(CameraSessionState::Idle, false);
        }

        if released {
            info!("Camera stopped");
        } else {
            trace!("Camera stop requested with no active stream");
        }
    }

    /// Switch to the opposite camera. Returns `Ok(false)` when flipping is unavailable.
    pub async fn flip(&mut self) -> Result<bool, CameraError> {
        if !self.can_flip() {
            debug!(
                "Flip ignored (state: {:?}, multiple cameras: {})",
                self.state,
                self.has_multiple_cameras()
            );
            return Ok(false);
        }

        self.start(self.facing.opposite()).await.map(|_| true)
    }

    /// Re-attempt acquisition after a failure, using the configured facing mode
    pub async fn retry(&mut self) -> Result<(), CameraError> {
        info!("Retrying camera start");
        self.start(self.config.facing).await
    }

    pub fn can_flip(&self) -> bool {
        self.state == CameraSessionState::Ready && self.has_multiple_cameras()
    }

    pub fn state(&self) -> CameraSessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == CameraSessionState::Ready
    }

    pub fn facing_mode(&self) -> FacingMode {
        self.facing
    }

    pub fn error(&self) -> Option<&CameraError> {
        self.error.as_ref()
    }

    pub fn video(&self) -> Arc<VideoElement> {
        Arc::clone(&self.video)
    }

    pub fn has_multiple_cameras(&self) -> bool {
        self.multiple_cameras.load(Ordering::Relaxed)
    }

    /// Wait for the device enumeration triggered by the last state change
    pub async fn settle_device_check(&mut self) -> bool {
        if let Some(task) = self.device_check.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    error!("Device enumeration task failed: {}", e);
                }
            }
        }
        self.has_multiple_cameras()
    }

    fn fail(&mut self, error: CameraError) {
        error!("Camera error: {}", error);
        self.error = Some(error);
        self.transition(CameraSessionState::Error, true);
    }

    fn release_stream(&mut self) -> bool {
        self.video.detach();
        match self.stream.take() {
            Some(stream) => {
                stream.stop_all_tracks();
                true
            }
            None => false,
        }
    }

    fn transition(&mut self, state: CameraSessionState, recheck_devices: bool) {
        debug!("Camera state {:?} -> {:?}", self.state, state);
        self.state = state;

        let event = PosecamEvent::CameraStateChanged {
            state,
            facing: self.facing,
            error: self.error.as_ref().map(|e| e.message().to_string()),
        };
        if let Err(e) = self.event_bus.publish(event) {
            trace!("Camera state change not delivered: {}", e);
        }

        if recheck_devices {
            self.recheck_devices();
        }
    }

    /// Re-count video inputs in the background; a newer check supersedes an older one
    fn recheck_devices(&mut self) {
        if let Some(task) = self.device_check.take() {
            task.abort();
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No runtime available for device enumeration");
            return;
        };

        let backend = Arc::clone(&self.backend);
        let multiple_cameras = Arc::clone(&self.multiple_cameras);

        self.device_check = Some(runtime.spawn(async move {
            let multiple = match backend.enumerate_devices().await {
                Ok(devices) => {
                    let inputs = devices
                        .iter()
                        .filter(|device| device.kind == DeviceKind::VideoInput)
                        .count();
                    debug!("Found {} video input device(s)", inputs);
                    inputs > 1
                }
                Err(cause) => {
                    debug!("Device enumeration failed: {}", cause);
                    false
                }
            };
            multiple_cameras.store(multiple, Ordering::Relaxed);
        }));
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        if let Some(task) = self.device_check.take() {
            task.abort();
        }
        if self.release_stream() {
            debug!("Camera stream released on session drop");
        }
    }
}
