use super::backend::CameraBackend;
use super::session::CameraSession;
use super::video::{DisplaySize, VideoElement};
use crate::config::CameraConfig;
use crate::error::{PosecamError, Result};
use crate::events::EventBus;
use std::sync::Arc;

/// Builder for a camera session
pub struct CameraSessionBuilder {
    config: Option<CameraConfig>,
    backend: Option<Arc<dyn CameraBackend>>,
    event_bus: Option<Arc<EventBus>>,
    video: Option<Arc<VideoElement>>,
}

impl CameraSessionBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            backend: None,
            event_bus: None,
            video: None,
        }
    }

    pub fn config(mut self, config: CameraConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn CameraBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Attach streams to an existing element instead of a fresh one
    pub fn video(mut self, video: Arc<VideoElement>) -> Self {
        self.video = Some(video);
        self
    }

    pub fn build(self) -> Result<CameraSession> {
        let config = self
            .config
            .ok_or_else(|| PosecamError::system("Camera configuration must be specified"))?;
        let backend = self
            .backend
            .ok_or_else(|| PosecamError::system("Camera backend must be specified"))?;
        let event_bus = self
            .event_bus
            .ok_or_else(|| PosecamError::system("Event bus must be specified"))?;

        let video = self.video.unwrap_or_else(|| {
            let (width, height) = config.resolution;
            Arc::new(VideoElement::new(DisplaySize::new(width, height, 1.0)))
        });

        Ok(CameraSession::new(config, backend, video, event_bus))
    }
}

impl Default for CameraSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
