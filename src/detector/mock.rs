use super::landmarker::{LandmarkerLoader, LandmarkerOptions, PoseLandmarker};
use crate::error::DetectorError;
use crate::frame::FrameData;
use crate::pose::{
    NormalizedLandmark, PoseConnection, PoseDetectionResult, BODY_LANDMARK_COUNT,
    POSE_CONNECTIONS,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::f32::consts::TAU;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One scripted answer from a [`ScriptedLandmarker`]
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Pose(PoseDetectionResult),
    NoBody,
    Fail(String),
    Panic,
}

/// Landmarker replaying a fixed script; the last response repeats forever
pub struct ScriptedLandmarker {
    script: VecDeque<ScriptedResponse>,
    fallback: ScriptedResponse,
    calls: Arc<AtomicUsize>,
    timestamps: Arc<Mutex<Vec<i64>>>,
}

impl ScriptedLandmarker {
    pub fn new(script: Vec<ScriptedResponse>) -> Self {
        let fallback = script.last().cloned().unwrap_or(ScriptedResponse::NoBody);
        Self {
            script: script.into(),
            fallback,
            calls: Arc::new(AtomicUsize::new(0)),
            timestamps: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always report the same body
    pub fn constant(landmarks: Vec<NormalizedLandmark>) -> Self {
        Self::new(vec![ScriptedResponse::Pose(PoseDetectionResult::single(
            landmarks,
        ))])
    }

    /// Shared counter of `detect_for_frame` invocations
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Shared log of timestamps the landmarker was called with
    pub fn timestamp_log(&self) -> Arc<Mutex<Vec<i64>>> {
        Arc::clone(&self.timestamps)
    }
}

impl PoseLandmarker for ScriptedLandmarker {
    fn detect_for_frame(
        &mut self,
        _frame: &FrameData,
        timestamp_micros: i64,
    ) -> Result<Option<PoseDetectionResult>, DetectorError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.timestamps.lock().push(timestamp_micros);

        let response = self
            .script
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match response {
            ScriptedResponse::Pose(result) => Ok(Some(result)),
            ScriptedResponse::NoBody => Ok(None),
            ScriptedResponse::Fail(details) => Err(DetectorError::Inference { details }),
            ScriptedResponse::Panic => panic!("scripted landmarker panic"),
        }
    }

    fn connections(&self) -> &[PoseConnection] {
        &POSE_CONNECTIONS
    }
}

/// Loader handing out a prepared landmarker, or failing
pub struct ScriptedLoader {
    landmarker: Mutex<Option<Box<dyn PoseLandmarker>>>,
    failure: Option<String>,
    delay: Duration,
}

impl ScriptedLoader {
    pub fn new<L: PoseLandmarker + 'static>(landmarker: L) -> Self {
        Self {
            landmarker: Mutex::new(Some(Box::new(landmarker))),
            failure: None,
            delay: Duration::ZERO,
        }
    }

    pub fn failing<S: Into<String>>(details: S) -> Self {
        Self {
            landmarker: Mutex::new(None),
            failure: Some(details.into()),
            delay: Duration::ZERO,
        }
    }

    /// Simulate a slow model download
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl LandmarkerLoader for ScriptedLoader {
    async fn load(
        &self,
        _options: &LandmarkerOptions,
    ) -> Result<Box<dyn PoseLandmarker>, DetectorError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(details) = &self.failure {
            return Err(DetectorError::LoadFailed {
                details: details.clone(),
            });
        }

        self.landmarker
            .lock()
            .take()
            .ok_or_else(|| DetectorError::LoadFailed {
                details: "model already handed out".to_string(),
            })
    }
}

/// Standing body in mirrored-preview coordinates, indexed by joint
const STANDING_BODY: [(f32, f32); BODY_LANDMARK_COUNT] = [
    (0.50, 0.22),
    (0.48, 0.20),
    (0.47, 0.20),
    (0.46, 0.20),
    (0.52, 0.20),
    (0.53, 0.20),
    (0.54, 0.20),
    (0.44, 0.21),
    (0.56, 0.21),
    (0.48, 0.25),
    (0.52, 0.25),
    (0.35, 0.38),
    (0.65, 0.38),
    (0.31, 0.48),
    (0.69, 0.48),
    (0.30, 0.58),
    (0.70, 0.58),
    (0.29, 0.61),
    (0.71, 0.61),
    (0.30, 0.62),
    (0.70, 0.62),
    (0.31, 0.60),
    (0.69, 0.60),
    (0.42, 0.58),
    (0.58, 0.58),
    (0.42, 0.74),
    (0.58, 0.74),
    (0.42, 0.90),
    (0.58, 0.90),
    (0.41, 0.92),
    (0.59, 0.92),
    (0.43, 0.94),
    (0.57, 0.94),
];

/// Landmarker for the demo binary: a body swaying sideways through the
/// "Casual Standing" pose on a fixed cycle
pub struct DemoLandmarker {
    period: Duration,
    amplitude: f32,
}

impl DemoLandmarker {
    pub fn new() -> Self {
        Self {
            period: Duration::from_secs(8),
            amplitude: 0.4,
        }
    }

    /// Body at `timestamp_micros`, in sensor coordinates of a front camera
    pub fn body_at(&self, timestamp_micros: i64) -> Vec<NormalizedLandmark> {
        let period = self.period.as_micros().max(1) as i64;
        let phase = (timestamp_micros.rem_euclid(period)) as f32 / period as f32;
        let sway = self.amplitude * (phase * TAU).sin();

        STANDING_BODY
            .iter()
            .map(|&(x, y)| NormalizedLandmark::with_depth(1.0 - (x + sway), y, 0.0))
            .collect()
    }
}

impl Default for DemoLandmarker {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseLandmarker for DemoLandmarker {
    fn detect_for_frame(
        &mut self,
        _frame: &FrameData,
        timestamp_micros: i64,
    ) -> Result<Option<PoseDetectionResult>, DetectorError> {
        Ok(Some(PoseDetectionResult::single(
            self.body_at(timestamp_micros),
        )))
    }

    fn connections(&self) -> &[PoseConnection] {
        &POSE_CONNECTIONS
    }
}

/// Loader for [`DemoLandmarker`], with a short warm-up
pub struct DemoLoader {
    warm_up: Duration,
}

impl DemoLoader {
    pub fn new(warm_up: Duration) -> Self {
        Self { warm_up }
    }
}

#[async_trait]
impl LandmarkerLoader for DemoLoader {
    async fn load(
        &self,
        options: &LandmarkerOptions,
    ) -> Result<Box<dyn PoseLandmarker>, DetectorError> {
        debug!("Demo landmarker standing in for {}", options.model_path);
        tokio::time::sleep(self.warm_up).await;
        Ok(Box::new(DemoLandmarker::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::check_template_alignment;
    use crate::templates::TemplateStore;

    #[test]
    fn test_demo_body_passes_through_template() {
        let demo = DemoLandmarker::new();
        let template = TemplateStore::builtin().find("casual-standing").unwrap();

        // Zero sway at the start of the cycle, full sway a quarter later
        assert!(check_template_alignment(&demo.body_at(0), template, true));
        assert!(!check_template_alignment(
            &demo.body_at(2_000_000),
            template,
            true
        ));
        assert_eq!(demo.body_at(0).len(), BODY_LANDMARK_COUNT);
    }

    #[test]
    fn test_scripted_landmarker_repeats_last_response() {
        let mut landmarker =
            ScriptedLandmarker::new(vec![ScriptedResponse::Fail("x".into()), ScriptedResponse::NoBody]);
        let frame = FrameData::new(
            0,
            std::time::SystemTime::now(),
            vec![0; 4],
            1,
            1,
            crate::frame::FrameFormat::Rgba8,
        );

        assert!(landmarker.detect_for_frame(&frame, 1).is_err());
        assert!(landmarker.detect_for_frame(&frame, 2).unwrap().is_none());
        assert!(landmarker.detect_for_frame(&frame, 3).unwrap().is_none());
        assert_eq!(landmarker.call_counter().load(Ordering::Relaxed), 3);
        assert_eq!(*landmarker.timestamp_log().lock(), vec![1, 2, 3]);
    }
}
