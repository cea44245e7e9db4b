use super::landmarker::{LandmarkerLoader, LandmarkerOptions, PoseLandmarker};
use crate::events::{EventBus, PosecamEvent};
use crate::frame::FrameData;
use crate::pose::{PoseConnection, PoseDetectionResult};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Readiness of the pose model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorState {
    Loading,
    Ready,
    Failed(String),
}

impl DetectorState {
    pub fn is_ready(&self) -> bool {
        matches!(self, DetectorState::Ready)
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, DetectorState::Loading)
    }
}

impl fmt::Display for DetectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorState::Loading => f.write_str("loading"),
            DetectorState::Ready => f.write_str("ready"),
            DetectorState::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Wraps the external landmark model: loads it in the background and
/// shields callers from its failures.
pub struct DetectorAdapter {
    state: watch::Receiver<DetectorState>,
    landmarker: Arc<Mutex<Option<Box<dyn PoseLandmarker>>>>,
    connections: Arc<RwLock<Arc<[PoseConnection]>>>,
    last_timestamp: AtomicI64,
    load_task: Mutex<Option<JoinHandle<()>>>,
}

impl DetectorAdapter {
    /// Start loading the model; the adapter is usable (and not ready) immediately
    pub fn spawn(
        loader: Arc<dyn LandmarkerLoader>,
        options: LandmarkerOptions,
        timeout: Duration,
        event_bus: Option<Arc<EventBus>>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(DetectorState::Loading);
        let landmarker: Arc<Mutex<Option<Box<dyn PoseLandmarker>>>> = Arc::new(Mutex::new(None));
        let connections: Arc<RwLock<Arc<[PoseConnection]>>> =
            Arc::new(RwLock::new(Arc::from(Vec::new())));

        let slot = Arc::clone(&landmarker);
        let catalog = Arc::clone(&connections);

        let load_task = tokio::spawn(async move {
            info!(
                "Loading pose model {} ({:?}, {} pose)",
                options.model_path, options.delegate, options.num_poses
            );

            let state = match tokio::time::timeout(timeout, loader.load(&options)).await {
                Ok(Ok(model)) => {
                    *catalog.write() = Arc::from(model.connections());
                    *slot.lock() = Some(model);
                    info!("Pose model ready");
                    DetectorState::Ready
                }
                Ok(Err(e)) => {
                    error!("Pose model failed to load: {}", e);
                    DetectorState::Failed(e.to_string())
                }
                Err(_) => {
                    error!("Pose model load timed out after {:?}", timeout);
                    DetectorState::Failed(format!("timed out after {:?}", timeout))
                }
            };

            if let Some(event_bus) = event_bus {
                let event = PosecamEvent::DetectorStateChanged {
                    state: state.to_string(),
                };
                if let Err(e) = event_bus.publish(event) {
                    trace!("Detector state change not delivered: {}", e);
                }
            }

            state_tx.send_replace(state);
        });

        Self {
            state: state_rx,
            landmarker,
            connections,
            last_timestamp: AtomicI64::new(i64::MIN),
            load_task: Mutex::new(Some(load_task)),
        }
    }

    pub fn state(&self) -> DetectorState {
        self.state.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.state.borrow().is_ready()
    }

    /// Observe readiness changes
    pub fn subscribe(&self) -> watch::Receiver<DetectorState> {
        self.state.clone()
    }

    /// Wait until loading has either succeeded or failed
    pub async fn wait_until_settled(&self) -> DetectorState {
        let mut state = self.state.clone();
        let settled = match state.wait_for(DetectorState::is_settled).await {
            Ok(settled) => settled.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    /// Joint pairs for skeleton drawing; empty until the model is ready
    pub fn connections(&self) -> Arc<[PoseConnection]> {
        self.connections.read().clone()
    }

    /// Run the model on one frame.
    ///
    /// Returns `None` when the model is not ready, the frame carries no
    /// decoded pixels, or the model fails, panics or produces non-finite
    /// coordinates. Never propagates a per-frame failure.
    pub fn detect(&self, frame: &FrameData, timestamp_micros: i64) -> Option<PoseDetectionResult> {
        if !self.is_ready() {
            trace!("Detector not ready, skipping frame {}", frame.id);
            return None;
        }

        if !frame.has_decoded_data() {
            debug!("Frame {} has no decoded data", frame.id);
            return None;
        }

        let mut guard = self.landmarker.lock();
        let landmarker = guard.as_mut()?;
        let timestamp = self.next_timestamp(timestamp_micros);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            landmarker.detect_for_frame(frame, timestamp)
        }));

        match outcome {
            Ok(Ok(Some(result))) if result.is_well_formed() => Some(result),
            Ok(Ok(Some(_))) => {
                warn!("Discarding malformed pose result for frame {}", frame.id);
                None
            }
            Ok(Ok(None)) => None,
            Ok(Err(e)) => {
                warn!("Pose detection failed on frame {}: {}", frame.id, e);
                None
            }
            Err(_) => {
                warn!("Pose model panicked on frame {}", frame.id);
                None
            }
        }
    }

    /// Release the model and abandon a pending load
    pub fn shutdown(&self) {
        if let Some(task) = self.load_task.lock().take() {
            task.abort();
        }
        if self.landmarker.lock().take().is_some() {
            info!("Pose model released");
        }
    }

    /// Timestamps must strictly increase across calls
    fn next_timestamp(&self, requested: i64) -> i64 {
        let previous = self.last_timestamp.load(Ordering::Relaxed);
        let timestamp = if requested > previous {
            requested
        } else {
            previous.saturating_add(1)
        };
        self.last_timestamp.store(timestamp, Ordering::Relaxed);
        timestamp
    }
}

impl Drop for DetectorAdapter {
    fn drop(&mut self) {
        if let Some(task) = self.load_task.lock().take() {
            task.abort();
        }
    }
}
