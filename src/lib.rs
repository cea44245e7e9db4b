pub mod app;
pub mod camera;
pub mod capture;
pub mod config;
pub mod detection;
pub mod detector;
pub mod error;
pub mod events;
pub mod frame;
pub mod matcher;
pub mod overlay;
pub mod pose;
pub mod templates;

pub use app::{ComponentState, PosecamApp, ShutdownReason};
pub use camera::{
    CameraBackend, CameraSession, CameraSessionBuilder, CameraSessionState, FacingMode,
    MediaStream, MockCameraBackend, PlatformCause,
};
pub use capture::{CapturedPhoto, PhotoCapture, PhotoMetadata};
pub use config::PosecamConfig;
pub use detection::{DetectionLoop, DetectionLoopBuilder, DetectionLoopHandle};
pub use detector::{DemoLoader, DetectorAdapter, DetectorState, LandmarkerLoader};
pub use error::{CameraError, CaptureError, DetectorError, PosecamError, Result};
pub use events::{EventBus, PosecamEvent};
pub use frame::{FrameData, FrameFormat};
pub use matcher::{check_template_alignment, is_aligned, AlignmentMatcher};
pub use overlay::{AlignmentTracker, OverlayRenderer};
pub use pose::{NormalizedLandmark, PoseDetectionResult};
pub use templates::{PoseTemplate, TemplateStore};
