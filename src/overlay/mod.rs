mod alignment;
mod draw;
mod renderer;
mod transition;
#[cfg(test)]
mod tests;

pub use alignment::AlignmentTracker;
pub use draw::{rgba, StrokeMask};
pub use renderer::{OverlayHint, OverlayRenderer, SilhouetteLayout, HINT_TEXT};
pub use transition::{ease_out, lerp_color, LevelTransition};
