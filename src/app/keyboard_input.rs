use crate::error::{PosecamError, Result};
use crate::events::{EventBus, PosecamEvent};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Map a key press to the request it stands for
pub fn key_request(code: KeyCode) -> Option<PosecamEvent> {
    match code {
        KeyCode::Char(' ') | KeyCode::Char('c') => Some(PosecamEvent::CaptureRequested {
            timestamp: SystemTime::now(),
        }),
        KeyCode::Char('f') => Some(PosecamEvent::FlipRequested {
            timestamp: SystemTime::now(),
        }),
        KeyCode::Char('r') => Some(PosecamEvent::RetryRequested {
            timestamp: SystemTime::now(),
        }),
        KeyCode::Char('0') => Some(PosecamEvent::TemplateRequested { position: None }),
        KeyCode::Char(digit @ '1'..='9') => digit.to_digit(10).map(|n| {
            PosecamEvent::TemplateRequested {
                position: Some(n as usize - 1),
            }
        }),
        KeyCode::Char('q') | KeyCode::Esc => Some(PosecamEvent::ShutdownRequested {
            timestamp: SystemTime::now(),
            reason: "User requested via keyboard".to_string(),
        }),
        _ => None,
    }
}

/// Terminal keyboard control, read on a blocking thread in raw mode
pub struct KeyboardInputHandler {
    event_bus: Arc<EventBus>,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self {
            event_bus,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for key presses
    pub fn start(&self) -> Result<()> {
        let runtime = Handle::try_current()
            .map_err(|e| PosecamError::component("keyboard", e.to_string()))?;

        let event_bus = Arc::clone(&self.event_bus);
        let cancellation_token = self.cancellation_token.clone();

        runtime.spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }
            debug!("Raw mode enabled - keyboard handler active");

            while !cancellation_token.is_cancelled() {
                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let Ok(Event::Key(key_event)) = event::read() else {
                            continue;
                        };
                        if key_event.kind != KeyEventKind::Press {
                            continue;
                        }

                        let Some(request) = key_request(key_event.code) else {
                            debug!("Key pressed: {:?}", key_event.code);
                            continue;
                        };
                        let quit = matches!(request, PosecamEvent::ShutdownRequested { .. });

                        info!("Key {:?}: {}", key_event.code, request.description());
                        if let Err(e) = event_bus.publish(request) {
                            warn!("Failed to publish keyboard request: {}", e);
                        }
                        if quit {
                            break;
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            } else {
                debug!("Raw mode disabled");
            }
            debug!("Keyboard input handler task exited");
        });

        Ok(())
    }

    /// Stop listening and give the terminal back
    pub async fn stop(&self) {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Let the polling thread notice and leave raw mode itself
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = disable_raw_mode();
    }
}
