use super::backend::MediaStream;
use crate::frame::FrameData;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;

/// On-screen size of the live video
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySize {
    /// Logical width
    pub width: u32,
    /// Logical height
    pub height: u32,
    /// Physical pixels per logical pixel
    pub device_pixel_ratio: f32,
}

impl DisplaySize {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    /// Backing-store size in physical pixels
    pub fn pixel_size(&self) -> (u32, u32) {
        let ratio = if self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        };
        (
            (self.width as f32 * ratio).round() as u32,
            (self.height as f32 * ratio).round() as u32,
        )
    }
}

/// The element the live stream is attached to.
///
/// Holds at most one stream at a time. The camera session attaches and
/// detaches streams; the detection loop only reads frames and observes the
/// display size.
pub struct VideoElement {
    source: RwLock<Option<Arc<dyn MediaStream>>>,
    display: watch::Sender<DisplaySize>,
}

impl VideoElement {
    pub fn new(display: DisplaySize) -> Self {
        let (display, _) = watch::channel(display);
        Self {
            source: RwLock::new(None),
            display,
        }
    }

    pub(crate) fn attach(&self, stream: Arc<dyn MediaStream>) {
        *self.source.write() = Some(stream);
    }

    pub(crate) fn detach(&self) -> Option<Arc<dyn MediaStream>> {
        self.source.write().take()
    }

    pub fn has_source(&self) -> bool {
        self.source.read().is_some()
    }

    /// Current frame of an active stream, if it carries decoded pixels
    pub fn current_frame(&self) -> Option<FrameData> {
        let source = self.source.read();
        let stream = source.as_ref().filter(|stream| stream.is_active())?;
        stream
            .latest_frame()
            .filter(FrameData::has_decoded_data)
    }

    /// Whether the element has usable decoded data right now
    pub fn has_decoded_data(&self) -> bool {
        self.current_frame().is_some()
    }

    pub fn display_size(&self) -> DisplaySize {
        *self.display.borrow()
    }

    /// Report a new on-screen size; observers are only woken when it changes
    pub fn set_display_size(&self, size: DisplaySize) -> bool {
        self.display.send_if_modified(|current| {
            if *current == size {
                false
            } else {
                *current = size;
                true
            }
        })
    }

    /// Observe on-screen size changes
    pub fn watch_display_size(&self) -> watch::Receiver<DisplaySize> {
        self.display.subscribe()
    }
}
