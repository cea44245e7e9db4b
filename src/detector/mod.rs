mod adapter;
mod landmarker;
mod mock;

pub use adapter::{DetectorAdapter, DetectorState};
pub use landmarker::{Delegate, LandmarkerLoader, LandmarkerOptions, PoseLandmarker};
pub use mock::{DemoLandmarker, DemoLoader, ScriptedLandmarker, ScriptedLoader, ScriptedResponse};
