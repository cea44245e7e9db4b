use crate::error::DetectorError;
use crate::frame::FrameData;
use crate::pose::{PoseConnection, PoseDetectionResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Where inference should run, if the engine offers a choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delegate {
    Gpu,
    Cpu,
}

/// Settings handed to the inference engine at load time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandmarkerOptions {
    pub model_path: String,
    pub delegate: Delegate,
    /// Bodies to detect per frame; the pipeline runs single-subject
    pub num_poses: usize,
}

impl LandmarkerOptions {
    pub fn new<S: Into<String>>(model_path: S) -> Self {
        Self {
            model_path: model_path.into(),
            delegate: Delegate::Gpu,
            num_poses: 1,
        }
    }
}

/// A loaded body-landmark model.
///
/// Calls are synchronous and expected to finish within a frame budget.
/// Timestamps passed to `detect_for_frame` strictly increase.
pub trait PoseLandmarker: Send {
    fn detect_for_frame(
        &mut self,
        frame: &FrameData,
        timestamp_micros: i64,
    ) -> Result<Option<PoseDetectionResult>, DetectorError>;

    /// Joint pairs drawn as skeleton segments
    fn connections(&self) -> &[PoseConnection];
}

/// Asynchronous model loading
#[async_trait]
pub trait LandmarkerLoader: Send + Sync {
    async fn load(
        &self,
        options: &LandmarkerOptions,
    ) -> Result<Box<dyn PoseLandmarker>, DetectorError>;
}
