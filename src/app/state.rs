use super::{ComponentState, PosecamApp};
use crate::detection::{Clock, DetectionListener};
use crate::events::{EventBus, PosecamEvent};
use crate::matcher::AlignmentMatcher;
use crate::overlay::{AlignmentTracker, OverlayRenderer};
use crate::pose::PoseDetectionResult;
use crate::templates::PoseTemplate;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Alignment flag plus the overlay it drives
pub struct OverlayState {
    pub tracker: AlignmentTracker,
    pub renderer: OverlayRenderer,
}

impl OverlayState {
    pub fn new(renderer: OverlayRenderer) -> Self {
        Self {
            tracker: AlignmentTracker::new(),
            renderer,
        }
    }
}

/// Runs the matcher on each detection result and records alignment flips.
///
/// Built per detection loop, so the template and mirroring it holds are
/// those in effect when the loop started.
pub(super) struct AlignmentListener {
    pub(super) template: Option<&'static PoseTemplate>,
    pub(super) mirrored: bool,
    pub(super) matcher: AlignmentMatcher,
    pub(super) overlay: Arc<Mutex<OverlayState>>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) event_bus: Arc<EventBus>,
}

impl DetectionListener for AlignmentListener {
    fn on_result(&mut self, result: Option<&PoseDetectionResult>) {
        let aligned = match (self.template, result.and_then(PoseDetectionResult::primary)) {
            (Some(template), Some(landmarks)) => {
                self.matcher
                    .check_template(landmarks, template, self.mirrored)
            }
            _ => false,
        };

        let mut overlay = self.overlay.lock();
        if !overlay.tracker.update(aligned) {
            trace!("Alignment unchanged ({})", aligned);
            return;
        }
        overlay.renderer.set_aligned(aligned, self.clock.now());
        drop(overlay);

        let _ = self.event_bus.publish(PosecamEvent::AlignmentChanged {
            aligned,
            template_id: self.template.map(|t| t.id.to_string()),
        });
    }
}

impl PosecamApp {
    /// Update component state
    pub fn set_component_state(&self, component: &str, state: ComponentState) {
        let mut states = self.component_states.lock();
        states.insert(component.to_string(), state.clone());
        debug!("Component '{}' state changed to: {:?}", component, state);
    }

    /// Get component state
    pub fn get_component_state(&self, component: &str) -> Option<ComponentState> {
        self.component_states.lock().get(component).cloned()
    }

    /// Get all component states
    pub fn get_all_component_states(&self) -> HashMap<String, ComponentState> {
        self.component_states.lock().clone()
    }
}
