use crate::frame::FrameData;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which physical camera the session should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Faces the user; previewed as a mirror image
    Front,
    /// Faces away from the user
    Back,
}

impl FacingMode {
    pub fn opposite(self) -> Self {
        match self {
            FacingMode::Front => FacingMode::Back,
            FacingMode::Back => FacingMode::Front,
        }
    }

    /// Front cameras preview (and export) a horizontally flipped image
    pub fn is_mirrored(self) -> bool {
        matches!(self, FacingMode::Front)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FacingMode::Front => "front",
            FacingMode::Back => "back",
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of the camera session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraSessionState {
    Idle,
    Loading,
    Ready,
    Error,
}

/// What the session asks the host for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing: FacingMode,
    /// Preferred, not guaranteed
    pub ideal_resolution: (u32, u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: String,
    pub label: String,
    pub kind: DeviceKind,
}

impl DeviceInfo {
    pub fn video_input<S: Into<String>>(id: S, label: S) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: DeviceKind::VideoInput,
        }
    }
}

/// Failure cause as reported by the host camera capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCause {
    /// The user or system refused camera access
    PermissionDenied,
    /// No capture device is present
    NotFound,
    /// A device exists but is busy or cannot be read
    NotReadable,
    /// The host has no camera capability at all
    Unsupported,
    Other(String),
}

impl PlatformCause {
    /// Parse a host error name such as `NotAllowedError`
    pub fn from_error_name(name: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" => PlatformCause::PermissionDenied,
            "NotFoundError" => PlatformCause::NotFound,
            // Legacy hosts report a busy device as DevicesNotFoundError
            "NotReadableError" | "TrackStartError" | "DevicesNotFoundError" => {
                PlatformCause::NotReadable
            }
            other => PlatformCause::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PlatformCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformCause::PermissionDenied => f.write_str("permission denied"),
            PlatformCause::NotFound => f.write_str("no capture device"),
            PlatformCause::NotReadable => f.write_str("device busy or unreadable"),
            PlatformCause::Unsupported => f.write_str("camera capability unsupported"),
            PlatformCause::Other(details) => write!(f, "{}", details),
        }
    }
}

/// A live video stream handed out by the host
pub trait MediaStream: Send + Sync {
    /// Most recent decoded frame, if any has arrived
    fn latest_frame(&self) -> Option<FrameData>;

    /// Number of tracks still delivering media
    fn active_tracks(&self) -> usize;

    /// Stop every track; calling it again is a no-op
    fn stop_all_tracks(&self);

    fn is_active(&self) -> bool {
        self.active_tracks() > 0
    }
}

/// Host camera capability
#[async_trait]
pub trait CameraBackend: Send + Sync {
    /// Whether the host can stream video at all
    fn is_supported(&self) -> bool {
        true
    }

    /// Acquire a live stream matching the constraints as closely as possible
    async fn request_stream(
        &self,
        constraints: StreamConstraints,
    ) -> Result<Arc<dyn MediaStream>, PlatformCause>;

    /// List media devices known to the host
    async fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>, PlatformCause>;
}
