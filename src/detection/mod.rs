mod clock;
mod detection_loop;
mod gate;
mod skeleton;
mod surface;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use detection_loop::{
    DetectionListener, DetectionLoop, DetectionLoopBuilder, DetectionLoopHandle, TickOutcome,
};
pub use gate::FrameGate;
pub use skeleton::draw_pose;
pub use surface::RenderSurface;
