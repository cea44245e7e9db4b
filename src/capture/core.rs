use super::encode::{encode_jpeg, rasterize};
use super::metadata::{save_metadata, PhotoMetadata};
use super::notice::{
    NoticeBoard, NOTICE_CAPTURE_FAILED, NOTICE_NOT_READY, NOTICE_RASTER_FAILED, NOTICE_SAVED,
};
use crate::camera::CameraSession;
use crate::config::CaptureConfig;
use crate::error::CaptureError;
use crate::events::{EventBus, PosecamEvent};
use crate::templates::PoseTemplate;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, error, info, warn};

/// A photo written to the capture directory
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedPhoto {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub metadata_path: Option<PathBuf>,
}

/// Exports the current camera frame as a JPEG still
pub struct PhotoCapture {
    config: CaptureConfig,
    event_bus: Arc<EventBus>,
    notices: Arc<NoticeBoard>,
}

impl PhotoCapture {
    pub fn new(config: CaptureConfig, event_bus: Arc<EventBus>) -> Self {
        let notices = Arc::new(NoticeBoard::new(Duration::from_secs(config.notice_seconds)));
        Self {
            config,
            event_bus,
            notices,
        }
    }

    pub fn notices(&self) -> Arc<NoticeBoard> {
        Arc::clone(&self.notices)
    }

    pub fn capture_dir(&self) -> &Path {
        Path::new(&self.config.path)
    }

    /// Take a photo of exactly what the session is showing.
    ///
    /// Every failure leaves a notice for the user; nothing is written unless
    /// the session is Ready with decoded video.
    pub async fn capture(
        &self,
        session: &CameraSession,
        template: Option<&PoseTemplate>,
        aligned: bool,
    ) -> Result<CapturedPhoto, CaptureError> {
        let frame = match session.video().current_frame() {
            Some(frame) if session.is_ready() && frame.has_decoded_data() => frame,
            _ => {
                debug!("Capture refused: camera state {:?}", session.state());
                self.notify(NOTICE_NOT_READY);
                return Err(CaptureError::NotReady);
            }
        };

        let facing = session.facing_mode();
        let image = match rasterize(&frame, facing.is_mirrored()) {
            Ok(image) => image,
            Err(e) => {
                warn!("Failed to rasterize frame {}: {}", frame.id, e);
                self.notify(NOTICE_RASTER_FAILED);
                return Err(e);
            }
        };

        let jpeg = match encode_jpeg(&image, self.config.jpeg_quality) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                error!("Failed to encode photo: {}", e);
                self.notify(NOTICE_CAPTURE_FAILED);
                return Err(e);
            }
        };

        let captured_at = Utc::now();
        let filename = format!("pose-{}.jpg", captured_at.timestamp_millis());
        let path = match self.export(&filename, &jpeg).await {
            Ok(path) => path,
            Err(e) => {
                error!("{}", e);
                self.notify(NOTICE_CAPTURE_FAILED);
                return Err(e);
            }
        };

        let (width, height) = image.dimensions();
        let metadata_path = if self.config.save_metadata {
            let metadata = PhotoMetadata {
                filename,
                width,
                height,
                facing,
                template_id: template.map(|t| t.id.to_string()),
                aligned,
                captured_at,
            };
            match save_metadata(&path, &metadata).await {
                Ok(metadata_path) => Some(metadata_path),
                Err(e) => {
                    // The photo itself is already saved
                    warn!("{}", e);
                    None
                }
            }
        } else {
            None
        };

        info!(
            "Captured {}x{} photo ({} bytes) to {}",
            width,
            height,
            jpeg.len(),
            path.display()
        );
        self.notify(NOTICE_SAVED);
        let _ = self.event_bus.publish(PosecamEvent::PhotoCaptured {
            path: path.display().to_string(),
            width,
            height,
        });

        Ok(CapturedPhoto {
            path,
            width,
            height,
            metadata_path,
        })
    }

    async fn export(&self, filename: &str, jpeg: &[u8]) -> Result<PathBuf, CaptureError> {
        let dir = self.capture_dir();
        fs::create_dir_all(dir)
            .await
            .map_err(|source| CaptureError::Export {
                path: dir.display().to_string(),
                source,
            })?;

        let path = dir.join(filename);
        fs::write(&path, jpeg)
            .await
            .map_err(|source| CaptureError::Export {
                path: path.display().to_string(),
                source,
            })?;
        Ok(path)
    }

    fn notify(&self, message: &str) {
        self.notices.show(message);
        let _ = self.event_bus.publish(PosecamEvent::NoticeShown {
            message: message.to_string(),
        });
    }
}
