use super::backend::{
    CameraBackend, DeviceInfo, DeviceKind, FacingMode, MediaStream, PlatformCause,
    StreamConstraints,
};
use crate::config::CameraConfig;
use crate::error::{PosecamError, Result};
use crate::frame::{FrameData, FrameFormat};
use async_trait::async_trait;
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, error, info, trace, warn};

/// V4L2 camera backend built on GStreamer
pub struct GstCameraBackend {
    front_device: u32,
    back_device: u32,
}

impl GstCameraBackend {
    pub fn new(config: &CameraConfig) -> Result<Self> {
        gstreamer::init().map_err(|e| {
            PosecamError::component("camera", format!("Failed to initialize GStreamer: {}", e))
        })?;

        Ok(Self {
            front_device: config.front_device,
            back_device: config.back_device,
        })
    }

    fn device_for(&self, facing: FacingMode) -> u32 {
        match facing {
            FacingMode::Front => self.front_device,
            FacingMode::Back => self.back_device,
        }
    }
}

fn build_pipeline_string(device: u32, (width, height): (u32, u32)) -> String {
    format!(
        "v4l2src device=/dev/video{} ! videoconvert ! videoscale ! \
         video/x-raw,format=RGBA,width={},height={} ! \
         appsink name=sink sync=false max-buffers=1 drop=true enable-last-sample=false",
        device, width, height
    )
}

/// Map a GStreamer error onto the host failure taxonomy
fn cause_from_error(err: &gstreamer::glib::Error) -> PlatformCause {
    match err.kind::<gstreamer::ResourceError>() {
        Some(gstreamer::ResourceError::NotAuthorized) => PlatformCause::PermissionDenied,
        Some(gstreamer::ResourceError::NotFound) => PlatformCause::NotFound,
        Some(
            gstreamer::ResourceError::Busy
            | gstreamer::ResourceError::OpenRead
            | gstreamer::ResourceError::OpenReadWrite
            | gstreamer::ResourceError::Read,
        ) => PlatformCause::NotReadable,
        _ => PlatformCause::Other(err.to_string()),
    }
}

fn start_pipeline(device: u32, resolution: (u32, u32)) -> std::result::Result<GstStream, PlatformCause> {
    let description = build_pipeline_string(device, resolution);
    info!("Creating GStreamer pipeline: {}", description);

    let pipeline = gstreamer::parse::launch(&description)
        .map_err(|e| cause_from_error(&e))?
        .downcast::<Pipeline>()
        .map_err(|_| PlatformCause::Other("Failed to downcast to Pipeline".to_string()))?;

    let appsink = pipeline
        .by_name("sink")
        .and_then(|element| element.downcast::<AppSink>().ok())
        .ok_or_else(|| PlatformCause::Other("Pipeline has no appsink".to_string()))?;

    let latest = Arc::new(RwLock::new(None));
    let counter = Arc::new(AtomicU64::new(0));

    let sink_latest = Arc::clone(&latest);
    appsink.set_callbacks(
        gstreamer_app::AppSinkCallbacks::builder()
            .new_sample(move |appsink| {
                let sample = appsink
                    .pull_sample()
                    .map_err(|_| gstreamer::FlowError::Eos)?;
                match frame_from_sample(&sample, counter.fetch_add(1, Ordering::Relaxed)) {
                    Some(frame) => *sink_latest.write() = Some(frame),
                    None => trace!("Dropped undecodable sample"),
                }
                Ok(gstreamer::FlowSuccess::Ok)
            })
            .build(),
    );

    let stream = GstStream {
        pipeline,
        latest,
        active: AtomicBool::new(true),
    };

    if stream.pipeline.set_state(gstreamer::State::Playing).is_err() {
        let cause = stream.pending_error();
        stream.stop_all_tracks();
        return Err(cause);
    }

    // Wait for preroll so device errors surface here rather than on first read
    let (result, _, _) = stream
        .pipeline
        .state(gstreamer::ClockTime::from_seconds(5));
    if result.is_err() {
        let cause = stream.pending_error();
        stream.stop_all_tracks();
        return Err(cause);
    }

    Ok(stream)
}

fn frame_from_sample(sample: &gstreamer::Sample, id: u64) -> Option<FrameData> {
    let buffer = sample.buffer()?;
    let info = VideoInfo::from_caps(sample.caps()?).ok()?;
    let map = buffer.map_readable().ok()?;

    let width = info.width();
    let height = info.height();
    let row = width as usize * 4;
    let stride = info.stride().first().copied().unwrap_or(row as i32) as usize;

    let data = if stride == row {
        map.as_slice().get(..row * height as usize)?.to_vec()
    } else {
        // Strip row padding
        let mut data = Vec::with_capacity(row * height as usize);
        for y in 0..height as usize {
            data.extend_from_slice(map.as_slice().get(y * stride..y * stride + row)?);
        }
        data
    };

    Some(FrameData::new(
        id,
        SystemTime::now(),
        data,
        width,
        height,
        FrameFormat::Rgba8,
    ))
}

#[async_trait]
impl CameraBackend for GstCameraBackend {
    async fn request_stream(
        &self,
        constraints: StreamConstraints,
    ) -> std::result::Result<Arc<dyn MediaStream>, PlatformCause> {
        let device = self.device_for(constraints.facing);
        let resolution = constraints.ideal_resolution;

        let stream = tokio::task::spawn_blocking(move || start_pipeline(device, resolution))
            .await
            .map_err(|e| PlatformCause::Other(format!("Pipeline task failed: {}", e)))??;

        info!("GStreamer stream started on /dev/video{}", device);
        Ok(Arc::new(stream))
    }

    async fn enumerate_devices(&self) -> std::result::Result<Vec<DeviceInfo>, PlatformCause> {
        tokio::task::spawn_blocking(|| {
            let monitor = gstreamer::DeviceMonitor::new();
            monitor.add_filter(Some("Video/Source"), None);
            monitor
                .start()
                .map_err(|e| PlatformCause::Other(e.to_string()))?;

            let devices = monitor
                .devices()
                .iter()
                .map(|device| DeviceInfo {
                    id: device.name().to_string(),
                    label: device.display_name().to_string(),
                    kind: DeviceKind::VideoInput,
                })
                .collect::<Vec<_>>();

            monitor.stop();
            debug!("GStreamer device monitor found {} video source(s)", devices.len());
            Ok(devices)
        })
        .await
        .map_err(|e| PlatformCause::Other(format!("Enumeration task failed: {}", e)))?
    }
}

/// A running capture pipeline; its single track ends when the pipeline is torn down
pub struct GstStream {
    pipeline: Pipeline,
    latest: Arc<RwLock<Option<FrameData>>>,
    active: AtomicBool,
}

impl GstStream {
    /// First error waiting on the pipeline bus, if any
    fn pending_error(&self) -> PlatformCause {
        let Some(bus) = self.pipeline.bus() else {
            return PlatformCause::Other("Pipeline has no bus".to_string());
        };

        match bus.timed_pop_filtered(
            gstreamer::ClockTime::from_mseconds(500),
            &[gstreamer::MessageType::Error],
        ) {
            Some(message) => match message.view() {
                gstreamer::MessageView::Error(err) => {
                    warn!("GStreamer pipeline error: {}", err.error());
                    cause_from_error(&err.error())
                }
                _ => PlatformCause::Other("Unexpected bus message".to_string()),
            },
            None => PlatformCause::Other("Pipeline failed to start".to_string()),
        }
    }
}

impl MediaStream for GstStream {
    fn latest_frame(&self) -> Option<FrameData> {
        if !self.is_active() {
            return None;
        }
        self.latest.read().clone()
    }

    fn active_tracks(&self) -> usize {
        usize::from(self.active.load(Ordering::Relaxed))
    }

    fn stop_all_tracks(&self) {
        if self.active.swap(false, Ordering::Relaxed) {
            if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
                error!("Failed to stop GStreamer pipeline: {}", e);
            }
            *self.latest.write() = None;
            debug!("GStreamer pipeline stopped");
        }
    }
}

impl Drop for GstStream {
    fn drop(&mut self) {
        self.stop_all_tracks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_requests_rgba_at_preferred_size() {
        let description = build_pipeline_string(2, (640, 480));
        assert!(description.starts_with("v4l2src device=/dev/video2"));
        assert!(description.contains("format=RGBA,width=640,height=480"));
        assert!(description.contains("appsink name=sink"));
    }

    #[test]
    fn test_resource_errors_are_classified() {
        let err = gstreamer::glib::Error::new(gstreamer::ResourceError::Busy, "busy");
        assert_eq!(cause_from_error(&err), PlatformCause::NotReadable);

        let err = gstreamer::glib::Error::new(gstreamer::ResourceError::NotFound, "missing");
        assert_eq!(cause_from_error(&err), PlatformCause::NotFound);

        let err = gstreamer::glib::Error::new(gstreamer::CoreError::Failed, "boom");
        assert!(matches!(cause_from_error(&err), PlatformCause::Other(_)));
    }
}
