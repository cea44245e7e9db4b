use crate::camera::{CameraSessionState, FacingMode};
use crate::error::EventBusError;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Events exchanged between posecam components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PosecamEvent {
    /// Camera session moved to a new state
    CameraStateChanged {
        state: CameraSessionState,
        facing: FacingMode,
        error: Option<String>,
    },
    /// Pose model readiness changed
    DetectorStateChanged { state: String },
    /// The body moved into or out of the selected template
    AlignmentChanged {
        aligned: bool,
        template_id: Option<String>,
    },
    /// A different template (or none) was selected
    TemplateSelected { template_id: Option<String> },
    /// A transient notice is shown to the user
    NoticeShown { message: String },
    /// A photo was exported
    PhotoCaptured {
        path: String,
        width: u32,
        height: u32,
    },
    /// User asked for a photo
    CaptureRequested { timestamp: SystemTime },
    /// User asked to switch between front and back cameras
    FlipRequested { timestamp: SystemTime },
    /// User asked to retry after a camera failure
    RetryRequested { timestamp: SystemTime },
    /// User picked a template by catalog position (None clears the overlay)
    TemplateRequested { position: Option<usize> },
    /// A system error occurred in a component
    SystemError { component: String, error: String },
    /// System shutdown requested
    ShutdownRequested {
        timestamp: SystemTime,
        reason: String,
    },
}

impl PosecamEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            PosecamEvent::CameraStateChanged {
                state,
                facing,
                error,
            } => match error {
                Some(error) => format!("Camera {:?} ({:?}): {}", state, facing, error),
                None => format!("Camera {:?} ({:?})", state, facing),
            },
            PosecamEvent::DetectorStateChanged { state } => format!("Pose detector {}", state),
            PosecamEvent::AlignmentChanged {
                aligned,
                template_id,
            } => format!(
                "{} template {}",
                if *aligned { "Aligned with" } else { "Left" },
                template_id.as_deref().unwrap_or("<none>")
            ),
            PosecamEvent::TemplateSelected { template_id } => format!(
                "Template selected: {}",
                template_id.as_deref().unwrap_or("<none>")
            ),
            PosecamEvent::NoticeShown { message } => format!("Notice: {}", message),
            PosecamEvent::PhotoCaptured {
                path,
                width,
                height,
            } => format!("Photo saved to {} ({}x{})", path, width, height),
            PosecamEvent::CaptureRequested { .. } => "Capture requested".to_string(),
            PosecamEvent::FlipRequested { .. } => "Camera flip requested".to_string(),
            PosecamEvent::RetryRequested { .. } => "Camera retry requested".to_string(),
            PosecamEvent::TemplateRequested { position } => match position {
                Some(position) => format!("Template #{} requested", position + 1),
                None => "Template cleared".to_string(),
            },
            PosecamEvent::SystemError { component, error } => {
                format!("Error in {}: {}", component, error)
            }
            PosecamEvent::ShutdownRequested { reason, .. } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            PosecamEvent::CameraStateChanged { .. } => "camera_state_changed",
            PosecamEvent::DetectorStateChanged { .. } => "detector_state_changed",
            PosecamEvent::AlignmentChanged { .. } => "alignment_changed",
            PosecamEvent::TemplateSelected { .. } => "template_selected",
            PosecamEvent::NoticeShown { .. } => "notice_shown",
            PosecamEvent::PhotoCaptured { .. } => "photo_captured",
            PosecamEvent::CaptureRequested { .. } => "capture_requested",
            PosecamEvent::FlipRequested { .. } => "flip_requested",
            PosecamEvent::RetryRequested { .. } => "retry_requested",
            PosecamEvent::TemplateRequested { .. } => "template_requested",
            PosecamEvent::SystemError { .. } => "system_error",
            PosecamEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Event bus for component coordination using broadcast channels
pub struct EventBus {
    sender: broadcast::Sender<PosecamEvent>,
    debug_logging: bool,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            debug_logging: false,
        }
    }

    /// Create a new event bus with debug logging enabled
    pub fn with_debug_logging(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            debug_logging: true,
        }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<PosecamEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers.
    ///
    /// Never blocks, so it can be called from the per-frame detection path.
    pub fn publish(&self, event: PosecamEvent) -> Result<usize, EventBusError> {
        match &event {
            PosecamEvent::CameraStateChanged {
                error: Some(error), ..
            } => {
                warn!("Camera error: {}", error);
            }
            PosecamEvent::AlignmentChanged { .. } | PosecamEvent::PhotoCaptured { .. } => {
                info!("{}", event.description());
            }
            PosecamEvent::SystemError { component, error } => {
                error!("System error in {}: {}", component, error);
            }
            PosecamEvent::ShutdownRequested { reason, .. } => {
                info!("Shutdown requested: {}", reason);
            }
            _ => {
                if self.debug_logging {
                    debug!("Event: {}", event.description());
                }
            }
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            debug_logging: self.debug_logging,
        }
    }
}
