use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub const NOTICE_NOT_READY: &str = "Camera not ready";
pub const NOTICE_RASTER_FAILED: &str = "Could not capture";
pub const NOTICE_CAPTURE_FAILED: &str = "Capture failed";
pub const NOTICE_SAVED: &str = "Photo saved";

/// A single transient, auto-dismissing message; a newer one replaces the older
pub struct NoticeBoard {
    duration: Duration,
    current: Mutex<Option<(String, Instant)>>,
}

impl NoticeBoard {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            current: Mutex::new(None),
        }
    }

    pub fn show<S: Into<String>>(&self, message: S) {
        *self.current.lock() = Some((message.into(), Instant::now()));
    }

    /// The visible notice, if it has not expired yet
    pub fn current(&self) -> Option<String> {
        let mut current = self.current.lock();
        match current.as_ref() {
            Some((_, shown)) if shown.elapsed() >= self.duration => {
                *current = None;
                None
            }
            Some((message, _)) => Some(message.clone()),
            None => None,
        }
    }

    pub fn dismiss(&self) {
        self.current.lock().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_notice_expires() {
        let board = NoticeBoard::new(Duration::from_secs(2));
        assert!(board.current().is_none());

        board.show(NOTICE_NOT_READY);
        tokio::time::advance(Duration::from_millis(1900)).await;
        assert_eq!(board.current().as_deref(), Some(NOTICE_NOT_READY));

        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(board.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_notice_replaces_older() {
        let board = NoticeBoard::new(Duration::from_secs(2));
        board.show(NOTICE_CAPTURE_FAILED);
        tokio::time::advance(Duration::from_millis(1500)).await;

        board.show(NOTICE_SAVED);
        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_eq!(board.current().as_deref(), Some(NOTICE_SAVED));

        board.dismiss();
        assert!(board.current().is_none());
    }
}
