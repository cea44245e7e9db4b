use crate::camera::FacingMode;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PosecamConfig {
    pub camera: CameraConfig,
    pub detector: DetectorConfig,
    pub matcher: MatcherConfig,
    pub overlay: OverlayConfig,
    pub capture: CaptureConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Facing mode requested when the session first starts
    #[serde(default = "default_camera_facing")]
    pub facing: FacingMode,

    /// Preferred stream resolution (width, height); the host may grant less
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// Device index used for the front-facing camera on hosts without facing hints
    #[serde(default = "default_front_device")]
    pub front_device: u32,

    /// Device index used for the back-facing camera on hosts without facing hints
    #[serde(default = "default_back_device")]
    pub back_device: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DetectorConfig {
    /// Upper bound on landmark detections per second
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,

    /// Display refresh rate driving the detection loop wake-ups
    #[serde(default = "default_refresh_rate")]
    pub refresh_rate: u32,

    /// Seconds to wait for the pose model before giving up
    #[serde(default = "default_load_timeout_seconds")]
    pub load_timeout_seconds: u64,

    /// Model asset handed to the landmarker loader
    #[serde(default = "default_model_path")]
    pub model_path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
pub struct MatcherConfig {
    /// Per-axis tolerance in normalized frame units
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,

    /// Fraction of reference points that must match
    #[serde(default = "default_quorum")]
    pub quorum: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OverlayConfig {
    /// On-screen size of the live video (width, height) in logical pixels
    #[serde(default = "default_display_resolution")]
    pub display_resolution: (u32, u32),

    /// Physical pixels per logical pixel
    #[serde(default = "default_device_pixel_ratio")]
    pub device_pixel_ratio: f32,

    /// Duration of the neutral/aligned colour transition in milliseconds
    #[serde(default = "default_transition_ms")]
    pub transition_ms: u64,

    /// Draw detected joints and segments onto the frame-synced surface
    #[serde(default = "default_draw_skeleton")]
    pub draw_skeleton: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CaptureConfig {
    /// Directory receiving exported photos
    #[serde(default = "default_capture_path")]
    pub path: String,

    /// JPEG quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Seconds a capture notice stays visible
    #[serde(default = "default_notice_seconds")]
    pub notice_seconds: u64,

    /// Write a JSON sidecar next to each exported photo
    #[serde(default = "default_save_metadata")]
    pub save_metadata: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,

    /// Enable interactive keyboard control
    #[serde(default = "default_keyboard")]
    pub keyboard: bool,
}

impl PosecamConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("posecam.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.facing", default_camera_facing().as_str())?
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("camera.front_device", default_front_device())?
            .set_default("camera.back_device", default_back_device())?
            .set_default("detector.target_fps", default_target_fps())?
            .set_default("detector.refresh_rate", default_refresh_rate())?
            .set_default(
                "detector.load_timeout_seconds",
                default_load_timeout_seconds() as i64,
            )?
            .set_default("detector.model_path", default_model_path())?
            .set_default("matcher.tolerance", default_tolerance() as f64)?
            .set_default("matcher.quorum", default_quorum())?
            .set_default(
                "overlay.display_resolution",
                vec![
                    default_display_resolution().0,
                    default_display_resolution().1,
                ],
            )?
            .set_default(
                "overlay.device_pixel_ratio",
                default_device_pixel_ratio() as f64,
            )?
            .set_default("overlay.transition_ms", default_transition_ms() as i64)?
            .set_default("overlay.draw_skeleton", default_draw_skeleton())?
            .set_default("capture.path", default_capture_path())?
            .set_default("capture.jpeg_quality", default_jpeg_quality() as i64)?
            .set_default("capture.notice_seconds", default_notice_seconds() as i64)?
            .set_default("capture.save_metadata", default_save_metadata())?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .set_default("system.keyboard", default_keyboard())?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // POSECAM_CAPTURE__JPEG_QUALITY=80 -> capture.jpeg_quality
            .add_source(
                Environment::with_prefix("POSECAM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: PosecamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.detector.target_fps == 0 {
            return Err(ConfigError::Message(
                "Detector target_fps must be greater than 0".to_string(),
            ));
        }

        if self.detector.refresh_rate == 0 {
            return Err(ConfigError::Message(
                "Detector refresh_rate must be greater than 0".to_string(),
            ));
        }

        if !(self.matcher.tolerance > 0.0 && self.matcher.tolerance <= 1.0) {
            return Err(ConfigError::Message(
                "Matcher tolerance must be within (0, 1]".to_string(),
            ));
        }

        if !(self.matcher.quorum > 0.0 && self.matcher.quorum <= 1.0) {
            return Err(ConfigError::Message(
                "Matcher quorum must be within (0, 1]".to_string(),
            ));
        }

        if !(self.overlay.device_pixel_ratio > 0.0) {
            return Err(ConfigError::Message(
                "Overlay device_pixel_ratio must be greater than 0".to_string(),
            ));
        }

        if !(1..=100).contains(&self.capture.jpeg_quality) {
            return Err(ConfigError::Message(
                "Capture jpeg_quality must be within 1..=100".to_string(),
            ));
        }

        if self.capture.notice_seconds == 0 {
            return Err(ConfigError::Message(
                "Capture notice_seconds must be greater than 0".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Serialize this configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for PosecamConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                facing: default_camera_facing(),
                resolution: default_camera_resolution(),
                front_device: default_front_device(),
                back_device: default_back_device(),
            },
            detector: DetectorConfig {
                target_fps: default_target_fps(),
                refresh_rate: default_refresh_rate(),
                load_timeout_seconds: default_load_timeout_seconds(),
                model_path: default_model_path(),
            },
            matcher: MatcherConfig::default(),
            overlay: OverlayConfig {
                display_resolution: default_display_resolution(),
                device_pixel_ratio: default_device_pixel_ratio(),
                transition_ms: default_transition_ms(),
                draw_skeleton: default_draw_skeleton(),
            },
            capture: CaptureConfig {
                path: default_capture_path(),
                jpeg_quality: default_jpeg_quality(),
                notice_seconds: default_notice_seconds(),
                save_metadata: default_save_metadata(),
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
                keyboard: default_keyboard(),
            },
        }
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            quorum: default_quorum(),
        }
    }
}

// Default value functions
fn default_camera_facing() -> FacingMode {
    FacingMode::Front
}
fn default_camera_resolution() -> (u32, u32) {
    (1920, 1080)
}
fn default_front_device() -> u32 {
    0
}
fn default_back_device() -> u32 {
    1
}

fn default_target_fps() -> u32 {
    30
}
fn default_refresh_rate() -> u32 {
    60
}
fn default_load_timeout_seconds() -> u64 {
    30
}
fn default_model_path() -> String {
    "models/pose_landmarker_lite.task".to_string()
}

fn default_tolerance() -> f32 {
    0.22
}
fn default_quorum() -> f64 {
    0.7
}

fn default_display_resolution() -> (u32, u32) {
    (1280, 720)
}
fn default_device_pixel_ratio() -> f32 {
    1.0
}
fn default_transition_ms() -> u64 {
    500
}
fn default_draw_skeleton() -> bool {
    true
}

fn default_capture_path() -> String {
    "./captures".to_string()
}
fn default_jpeg_quality() -> u8 {
    92
}
fn default_notice_seconds() -> u64 {
    2
}
fn default_save_metadata() -> bool {
    false
}

fn default_event_bus_capacity() -> usize {
    100
}
fn default_keyboard() -> bool {
    true
}
