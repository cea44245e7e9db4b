use thiserror::Error;

pub const PERMISSION_DENIED_MESSAGE: &str =
    "Camera access denied. Please allow camera access in your settings and try again.";
pub const DEVICE_NOT_FOUND_MESSAGE: &str = "No camera found on this device.";
pub const DEVICE_UNREADABLE_MESSAGE: &str =
    "Camera is in use by another app or could not be read. Try closing other apps using the camera.";
pub const GENERIC_CAMERA_MESSAGE: &str = "Something went wrong. Please reload and try again.";
pub const UNSUPPORTED_HOST_MESSAGE: &str = "Camera API is not supported on this host.";

#[derive(Error, Debug)]
pub enum PosecamError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Detector error: {0}")]
    Detector(#[from] DetectorError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl PosecamError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>, M: Into<String>>(component: S, message: M) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Classified camera acquisition failure, carrying the message shown to the user
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("{message}")]
    PermissionDenied { message: String },

    #[error("{message}")]
    DeviceNotFound { message: String },

    #[error("{message}")]
    DeviceUnreadable { message: String },

    #[error("{message}")]
    Generic { message: String },
}

impl CameraError {
    pub fn permission_denied() -> Self {
        Self::PermissionDenied {
            message: PERMISSION_DENIED_MESSAGE.to_string(),
        }
    }

    pub fn device_not_found() -> Self {
        Self::DeviceNotFound {
            message: DEVICE_NOT_FOUND_MESSAGE.to_string(),
        }
    }

    pub fn device_unreadable() -> Self {
        Self::DeviceUnreadable {
            message: DEVICE_UNREADABLE_MESSAGE.to_string(),
        }
    }

    pub fn generic() -> Self {
        Self::Generic {
            message: GENERIC_CAMERA_MESSAGE.to_string(),
        }
    }

    pub fn unsupported_host() -> Self {
        Self::Generic {
            message: UNSUPPORTED_HOST_MESSAGE.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CameraError::PermissionDenied { message }
            | CameraError::DeviceNotFound { message }
            | CameraError::DeviceUnreadable { message }
            | CameraError::Generic { message } => message,
        }
    }

    /// Short machine-readable tag, used in events and logs
    pub fn kind(&self) -> &'static str {
        match self {
            CameraError::PermissionDenied { .. } => "permission_denied",
            CameraError::DeviceNotFound { .. } => "device_not_found",
            CameraError::DeviceUnreadable { .. } => "device_unreadable",
            CameraError::Generic { .. } => "generic",
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum DetectorError {
    #[error("Failed to load pose model: {details}")]
    LoadFailed { details: String },

    #[error("Pose inference failed: {details}")]
    Inference { details: String },
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Camera not ready")]
    NotReady,

    #[error("Failed to encode photo: {details}")]
    EncodingFailed { details: String },

    #[error("Failed to export photo to {path}: {source}")]
    Export {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },
}

pub type Result<T> = std::result::Result<T, PosecamError>;
