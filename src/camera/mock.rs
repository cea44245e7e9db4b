use super::backend::{
    CameraBackend, DeviceInfo, FacingMode, MediaStream, PlatformCause, StreamConstraints,
};
use crate::frame::{FrameData, FrameFormat};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, trace};

/// Camera backend producing synthetic frames, for demos and tests
pub struct MockCameraBackend {
    supported: bool,
    native_resolution: (u32, u32),
    devices: Mutex<Vec<DeviceInfo>>,
    queued_failures: Mutex<VecDeque<PlatformCause>>,
    enumeration_failure: Mutex<Option<PlatformCause>>,
    dead_next: AtomicBool,
    issued: Mutex<Vec<Arc<SyntheticStream>>>,
    stream_counter: AtomicU64,
}

impl MockCameraBackend {
    /// A host with a front and a back camera
    pub fn new() -> Self {
        Self::with_devices(vec![
            DeviceInfo::video_input("mock-front", "Mock front camera"),
            DeviceInfo::video_input("mock-back", "Mock back camera"),
        ])
    }

    pub fn with_devices(devices: Vec<DeviceInfo>) -> Self {
        Self {
            supported: true,
            native_resolution: (1280, 720),
            devices: Mutex::new(devices),
            queued_failures: Mutex::new(VecDeque::new()),
            enumeration_failure: Mutex::new(None),
            dead_next: AtomicBool::new(false),
            issued: Mutex::new(Vec::new()),
            stream_counter: AtomicU64::new(0),
        }
    }

    /// A host without any camera capability
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    /// Largest resolution the synthetic sensor can deliver
    pub fn with_native_resolution(mut self, width: u32, height: u32) -> Self {
        self.native_resolution = (width, height);
        self
    }

    /// Make the next stream request fail with `cause`
    pub fn fail_next(&self, cause: PlatformCause) {
        self.queued_failures.lock().push_back(cause);
    }

    /// Make device enumeration fail until cleared
    pub fn fail_enumeration(&self, cause: Option<PlatformCause>) {
        *self.enumeration_failure.lock() = cause;
    }

    /// Hand out a stream whose tracks have already ended on the next request
    pub fn deliver_dead_stream_next(&self) {
        self.dead_next.store(true, Ordering::Relaxed);
    }

    pub fn set_devices(&self, devices: Vec<DeviceInfo>) {
        *self.devices.lock() = devices;
    }

    /// Every stream handed out so far, oldest first
    pub fn issued_streams(&self) -> Vec<Arc<SyntheticStream>> {
        self.issued.lock().clone()
    }

    /// Streams that still have live tracks
    pub fn live_streams(&self) -> usize {
        self.issued.lock().iter().filter(|s| s.is_active()).count()
    }
}

impl Default for MockCameraBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CameraBackend for MockCameraBackend {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn request_stream(
        &self,
        constraints: StreamConstraints,
    ) -> Result<Arc<dyn MediaStream>, PlatformCause> {
        if let Some(cause) = self.queued_failures.lock().pop_front() {
            debug!("Mock camera refusing stream: {}", cause);
            return Err(cause);
        }

        let width = constraints.ideal_resolution.0.min(self.native_resolution.0);
        let height = constraints.ideal_resolution.1.min(self.native_resolution.1);
        let id = self.stream_counter.fetch_add(1, Ordering::Relaxed);

        let stream = Arc::new(SyntheticStream::new(id, constraints.facing, width, height));
        if self.dead_next.swap(false, Ordering::Relaxed) {
            stream.stop_all_tracks();
        }

        debug!(
            "Mock camera granted stream {} ({}, {}x{})",
            id, constraints.facing, width, height
        );
        self.issued.lock().push(Arc::clone(&stream));

        Ok(stream)
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>, PlatformCause> {
        if let Some(cause) = self.enumeration_failure.lock().clone() {
            return Err(cause);
        }
        Ok(self.devices.lock().clone())
    }
}

/// A live stream serving one precomputed frame until its track is stopped
pub struct SyntheticStream {
    id: u64,
    facing: FacingMode,
    frame: RwLock<Option<FrameData>>,
    live_tracks: AtomicUsize,
}

impl SyntheticStream {
    pub fn new(id: u64, facing: FacingMode, width: u32, height: u32) -> Self {
        Self {
            id,
            facing,
            frame: RwLock::new(Some(gradient_frame(id, facing, width, height))),
            live_tracks: AtomicUsize::new(1),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    /// Replace the frame served to readers; `None` simulates a stream with no decoded data yet
    pub fn set_frame(&self, frame: Option<FrameData>) {
        *self.frame.write() = frame;
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.frame.read().as_ref().map(|f| (f.width, f.height))
    }
}

impl MediaStream for SyntheticStream {
    fn latest_frame(&self) -> Option<FrameData> {
        if !self.is_active() {
            return None;
        }
        self.frame.read().clone()
    }

    fn active_tracks(&self) -> usize {
        self.live_tracks.load(Ordering::Relaxed)
    }

    fn stop_all_tracks(&self) {
        if self.live_tracks.swap(0, Ordering::Relaxed) > 0 {
            trace!("Synthetic stream {} stopped", self.id);
        }
    }
}

/// Diagonal gradient, tinted per facing mode so the cameras are distinguishable
fn gradient_frame(id: u64, facing: FacingMode, width: u32, height: u32) -> FrameData {
    let tint: u8 = match facing {
        FacingMode::Front => 0x40,
        FacingMode::Back => 0xC0,
    };

    let mut data = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            data.extend_from_slice(&[r, g, tint, 0xFF]);
        }
    }

    FrameData::new(id, SystemTime::now(), data, width, height, FrameFormat::Rgba8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_granted_resolution_is_capped_by_sensor() {
        let backend = MockCameraBackend::new().with_native_resolution(64, 48);
        let stream = backend
            .request_stream(StreamConstraints {
                facing: FacingMode::Back,
                ideal_resolution: (1920, 1080),
            })
            .await
            .unwrap();

        let frame = stream.latest_frame().unwrap();
        assert_eq!((frame.width, frame.height), (64, 48));
        assert!(frame.has_decoded_data());
    }

    #[tokio::test]
    async fn test_stopped_stream_serves_nothing() {
        let backend = MockCameraBackend::new();
        let stream = backend
            .request_stream(StreamConstraints {
                facing: FacingMode::Front,
                ideal_resolution: (8, 8),
            })
            .await
            .unwrap();

        assert_eq!(backend.live_streams(), 1);
        stream.stop_all_tracks();
        stream.stop_all_tracks();
        assert!(stream.latest_frame().is_none());
        assert_eq!(backend.live_streams(), 0);
    }

    #[tokio::test]
    async fn test_queued_failure_is_consumed_once() {
        let backend = MockCameraBackend::new();
        backend.fail_next(PlatformCause::PermissionDenied);
        let constraints = StreamConstraints {
            facing: FacingMode::Front,
            ideal_resolution: (8, 8),
        };

        assert_eq!(
            backend.request_stream(constraints).await.err(),
            Some(PlatformCause::PermissionDenied)
        );
        assert!(backend.request_stream(constraints).await.is_ok());
    }
}
