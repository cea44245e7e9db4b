use super::keyboard_input::KeyboardInputHandler;
use super::state::{AlignmentListener, OverlayState};
use super::types::{ComponentState, ShutdownReason};
use crate::camera::{CameraBackend, CameraSession, CameraSessionBuilder, DisplaySize, VideoElement};
use crate::capture::{CapturedPhoto, PhotoCapture};
use crate::config::PosecamConfig;
use crate::detection::{Clock, DetectionLoopBuilder, DetectionLoopHandle, MonotonicClock};
use crate::detector::{DetectorAdapter, LandmarkerLoader, LandmarkerOptions};
use crate::error::{CaptureError, PosecamError, Result};
use crate::events::{EventBus, PosecamEvent};
use crate::matcher::AlignmentMatcher;
use crate::overlay::{OverlayHint, OverlayRenderer};
use crate::templates::{PoseTemplate, TemplateStore};
use image::RgbaImage;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Wires the camera, detector, detection loop, overlay and capture together
pub struct PosecamApp {
    pub(super) config: PosecamConfig,
    pub(super) event_bus: Arc<EventBus>,
    pub(super) templates: TemplateStore,
    pub(super) clock: Arc<dyn Clock>,

    // Components
    pub(super) session: CameraSession,
    pub(super) detector: Arc<DetectorAdapter>,
    pub(super) capture: PhotoCapture,
    pub(super) matcher: AlignmentMatcher,
    pub(super) overlay: Arc<Mutex<OverlayState>>,
    pub(super) template: Option<&'static PoseTemplate>,
    pub(super) detection: Option<DetectionLoopHandle>,
    pub(super) keyboard_handler: Option<KeyboardInputHandler>,
    pub(super) keyboard_enabled: bool,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<String, ComponentState>>>,
    pub(super) shutdown_sender: Option<oneshot::Sender<ShutdownReason>>,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
}

impl PosecamApp {
    /// Create the application; the pose model starts loading right away
    pub fn new(
        config: PosecamConfig,
        backend: Arc<dyn CameraBackend>,
        loader: Arc<dyn LandmarkerLoader>,
    ) -> Result<Self> {
        let event_bus = Arc::new(EventBus::new(config.system.event_bus_capacity));
        let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());

        let (width, height) = config.overlay.display_resolution;
        let display = DisplaySize::new(width, height, config.overlay.device_pixel_ratio);
        let video = Arc::new(VideoElement::new(display));

        let session = CameraSessionBuilder::new()
            .config(config.camera.clone())
            .backend(backend)
            .event_bus(Arc::clone(&event_bus))
            .video(video)
            .build()?;

        let detector = Arc::new(DetectorAdapter::spawn(
            loader,
            LandmarkerOptions::new(config.detector.model_path.clone()),
            Duration::from_secs(config.detector.load_timeout_seconds),
            Some(Arc::clone(&event_bus)),
        ));

        let (pixel_width, pixel_height) = display.pixel_size();
        let renderer = OverlayRenderer::new(
            pixel_width,
            pixel_height,
            display.device_pixel_ratio,
            Duration::from_millis(config.overlay.transition_ms),
        );

        let capture = PhotoCapture::new(config.capture.clone(), Arc::clone(&event_bus));
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        Ok(Self {
            keyboard_enabled: config.system.keyboard,
            matcher: AlignmentMatcher::from(config.matcher),
            keyboard_handler: Some(KeyboardInputHandler::new(Arc::clone(&event_bus))),
            config,
            event_bus,
            templates: TemplateStore::builtin(),
            clock,
            session,
            detector,
            capture,
            overlay: Arc::new(Mutex::new(OverlayState::new(renderer))),
            template: None,
            detection: None,
            component_states: Arc::new(Mutex::new(HashMap::new())),
            shutdown_sender: Some(shutdown_sender),
            shutdown_receiver: Some(shutdown_receiver),
        })
    }

    /// Enable or disable interactive keyboard control
    pub fn set_keyboard_enabled(&mut self, enabled: bool) {
        self.keyboard_enabled = enabled;
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn session(&self) -> &CameraSession {
        &self.session
    }

    pub fn detector(&self) -> Arc<DetectorAdapter> {
        Arc::clone(&self.detector)
    }

    pub fn selected_template(&self) -> Option<&'static PoseTemplate> {
        self.template
    }

    pub fn is_aligned(&self) -> bool {
        self.overlay.lock().tracker.is_aligned()
    }

    pub fn is_detecting(&self) -> bool {
        self.detection.as_ref().is_some_and(|d| !d.is_cancelled())
    }

    /// The visible capture notice, if any
    pub fn notice(&self) -> Option<String> {
        self.capture.notices().current()
    }

    pub fn hint(&self) -> OverlayHint {
        self.overlay.lock().renderer.hint(self.clock.now())
    }

    /// Draw the guide and the selected silhouette as currently shown
    pub fn render_overlay(&self) -> RgbaImage {
        let mirrored = self.session.facing_mode().is_mirrored();
        self.overlay
            .lock()
            .renderer
            .render(self.template, mirrored, self.clock.now())
    }

    /// Select a template by catalog position; `None` clears the overlay
    pub async fn select_template(&mut self, position: Option<usize>) -> Result<()> {
        let template = match position {
            Some(position) => Some(self.templates.get(position).ok_or_else(|| {
                PosecamError::system(format!("No template at position {}", position + 1))
            })?),
            None => None,
        };
        self.set_template(template).await;
        Ok(())
    }

    pub async fn select_template_by_id(&mut self, id: &str) -> Result<()> {
        let template = self
            .templates
            .find(id)
            .ok_or_else(|| PosecamError::system(format!("Unknown template '{}'", id)))?;
        self.set_template(Some(template)).await;
        Ok(())
    }

    async fn set_template(&mut self, template: Option<&'static PoseTemplate>) {
        let unchanged = match (self.template, template) {
            (Some(current), Some(next)) => current.id == next.id,
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        self.template = template;
        info!(
            "Template selected: {}",
            template.map_or("<none>", |t| t.name)
        );
        let _ = self.event_bus.publish(PosecamEvent::TemplateSelected {
            template_id: template.map(|t| t.id.to_string()),
        });

        self.restart_detection().await;
    }

    /// Export the current frame
    pub async fn capture_photo(&self) -> std::result::Result<CapturedPhoto, CaptureError> {
        let aligned = self.is_aligned();
        self.capture
            .capture(&self.session, self.template, aligned)
            .await
    }

    /// Switch between front and back cameras when more than one exists
    pub async fn flip_camera(&mut self) -> Result<bool> {
        self.stop_detection().await;
        let result = self.session.flip().await;
        self.restart_detection().await;
        Ok(result?)
    }

    /// Re-attempt camera acquisition after a failure
    pub async fn retry_camera(&mut self) -> Result<()> {
        self.stop_detection().await;
        let result = self.session.retry().await;
        self.restart_detection().await;
        Ok(result?)
    }

    /// Stop the running detection loop, if any, and wait for it to exit
    pub(super) async fn stop_detection(&mut self) {
        if let Some(detection) = self.detection.take() {
            detection.stop().await;
            self.set_component_state("detection", ComponentState::Stopped);
        }
    }

    /// Start a fresh detection loop for the current camera and template.
    ///
    /// No loop runs unless the camera is Ready. Alignment starts over as
    /// "not aligned" every time.
    pub(super) async fn restart_detection(&mut self) {
        self.stop_detection().await;
        self.reset_alignment();

        if !self.session.is_ready() {
            debug!(
                "Detection not started: camera {:?}",
                self.session.state()
            );
            return;
        }

        let mirrored = self.session.facing_mode().is_mirrored();
        let listener = AlignmentListener {
            template: self.template,
            mirrored,
            matcher: self.matcher,
            overlay: Arc::clone(&self.overlay),
            clock: Arc::clone(&self.clock),
            event_bus: Arc::clone(&self.event_bus),
        };

        let detection = DetectionLoopBuilder::new()
            .config(&self.config.detector)
            .detector(Arc::clone(&self.detector))
            .video(self.session.video())
            .clock(Arc::clone(&self.clock))
            .mirrored(mirrored)
            .draw_skeleton(self.config.overlay.draw_skeleton)
            .listener(listener)
            .build();

        match detection {
            Ok(detection) => {
                self.detection = Some(detection.spawn(self.config.detector.refresh_rate));
                self.set_component_state("detection", ComponentState::Running);
            }
            Err(e) => {
                warn!("Failed to build detection loop: {}", e);
                self.set_component_state("detection", ComponentState::Failed);
            }
        }
    }

    fn reset_alignment(&self) {
        let mut overlay = self.overlay.lock();
        if overlay.tracker.reset() {
            overlay.renderer.set_aligned(false, self.clock.now());
            drop(overlay);
            let _ = self.event_bus.publish(PosecamEvent::AlignmentChanged {
                aligned: false,
                template_id: self.template.map(|t| t.id.to_string()),
            });
        }
    }
}
