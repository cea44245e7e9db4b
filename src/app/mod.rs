pub mod keyboard_input;

mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use orchestrator::PosecamApp;
pub use state::OverlayState;
pub use types::{ComponentState, ShutdownReason};
