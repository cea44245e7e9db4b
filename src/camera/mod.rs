mod backend;
mod builder;
mod classify;
#[cfg(all(feature = "gstreamer", target_os = "linux"))]
mod gst;
mod mock;
mod session;
mod video;
#[cfg(test)]
mod tests;

pub use backend::{
    CameraBackend, CameraSessionState, DeviceInfo, DeviceKind, FacingMode, MediaStream,
    PlatformCause, StreamConstraints,
};
pub use builder::CameraSessionBuilder;
pub use classify::classify;
#[cfg(all(feature = "gstreamer", target_os = "linux"))]
pub use gst::{GstCameraBackend, GstStream};
pub use mock::{MockCameraBackend, SyntheticStream};
pub use session::CameraSession;
pub use video::{DisplaySize, VideoElement};
