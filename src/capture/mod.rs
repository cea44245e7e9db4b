mod core;
mod encode;
mod metadata;
mod notice;

pub use self::core::{CapturedPhoto, PhotoCapture};
pub use metadata::PhotoMetadata;
pub use notice::{
    NoticeBoard, NOTICE_CAPTURE_FAILED, NOTICE_NOT_READY, NOTICE_RASTER_FAILED, NOTICE_SAVED,
};
