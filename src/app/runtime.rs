use super::{ComponentState, PosecamApp, ShutdownReason};
use crate::error::{PosecamError, Result};
use crate::events::PosecamEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

const STATUS_INTERVAL: Duration = Duration::from_secs(5);

impl PosecamApp {
    /// Handle user requests until a signal or the quit key, then shut down
    pub async fn run(&mut self) -> Result<i32> {
        info!("Posecam is running");

        let shutdown_sender = self
            .shutdown_sender
            .take()
            .ok_or_else(|| PosecamError::system("Shutdown sender already taken"))?;
        let mut shutdown_receiver = self
            .shutdown_receiver
            .take()
            .ok_or_else(|| PosecamError::system("Shutdown receiver already taken"))?;

        self.setup_signal_handlers(shutdown_sender);

        let mut events = self.event_bus.subscribe();
        let mut status = tokio::time::interval(STATUS_INTERVAL);
        status.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let shutdown_reason = loop {
            tokio::select! {
                reason = &mut shutdown_receiver => {
                    break reason.unwrap_or_else(|_| {
                        ShutdownReason::Error("Shutdown channel closed unexpectedly".to_string())
                    });
                }
                event = events.recv() => match event {
                    Ok(event) => {
                        if let Some(reason) = self.handle_event(event).await {
                            break reason;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Event handling lagged, skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => {
                        break ShutdownReason::Error("Event bus closed".to_string());
                    }
                },
                _ = status.tick() => self.log_status(),
            }
        };

        info!("Shutdown initiated: {:?}", shutdown_reason);
        let exit_code = self.shutdown().await?;

        info!("Posecam shutdown complete");
        Ok(exit_code)
    }

    /// React to one bus event; returns a reason when the app should exit
    pub async fn handle_event(&mut self, event: PosecamEvent) -> Option<ShutdownReason> {
        match event {
            PosecamEvent::CaptureRequested { .. } => {
                // Failures already left a notice for the user
                match self.capture_photo().await {
                    Ok(photo) => debug!("Capture stored at {}", photo.path.display()),
                    Err(e) => debug!("Capture not taken: {}", e),
                }
            }
            PosecamEvent::FlipRequested { .. } => match self.flip_camera().await {
                Ok(true) => info!("Camera flipped to {}", self.session.facing_mode()),
                Ok(false) => info!("Flip unavailable (single camera or camera not ready)"),
                Err(e) => error!("Camera flip failed: {}", e),
            },
            PosecamEvent::RetryRequested { .. } => {
                self.set_component_state("camera", ComponentState::Starting);
                match self.retry_camera().await {
                    Ok(()) => self.set_component_state("camera", ComponentState::Running),
                    Err(e) => {
                        self.set_component_state("camera", ComponentState::Failed);
                        error!("Camera retry failed: {}", e);
                    }
                }
            }
            PosecamEvent::TemplateRequested { position } => {
                if let Err(e) = self.select_template(position).await {
                    warn!("{}", e);
                }
            }
            PosecamEvent::CameraStateChanged { .. } => {
                if !self.session.is_ready() && self.detection.is_some() {
                    debug!("Camera left Ready, stopping detection");
                    self.stop_detection().await;
                }
            }
            PosecamEvent::DetectorStateChanged { state } => {
                let component_state = if self.detector.is_ready() {
                    ComponentState::Running
                } else {
                    ComponentState::Failed
                };
                self.set_component_state("detector", component_state);
                info!("Pose detector {}", state);
            }
            PosecamEvent::ShutdownRequested { .. } => return Some(ShutdownReason::UserRequest),
            _ => {}
        }
        None
    }

    fn log_status(&self) {
        info!(
            "Status: camera {:?} ({}), detector {}, template {}, aligned {}{}",
            self.session.state(),
            self.session.facing_mode(),
            self.detector.state(),
            self.template.map_or("<none>", |t| t.id),
            self.is_aligned(),
            self.notice()
                .map(|notice| format!(", notice \"{}\"", notice))
                .unwrap_or_default()
        );
    }

    fn setup_signal_handlers(&self, shutdown_sender: oneshot::Sender<ShutdownReason>) {
        let shutdown_sender = Arc::new(parking_lot::Mutex::new(Some(shutdown_sender)));

        #[cfg(unix)]
        {
            let shutdown_sender_sigterm = Arc::clone(&shutdown_sender);
            tokio::spawn(async move {
                let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate())
                {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        error!("Failed to register SIGTERM handler: {}", e);
                        return;
                    }
                };
                if sigterm.recv().await.is_some() {
                    info!("Received SIGTERM signal");
                    if let Some(sender) = shutdown_sender_sigterm.lock().take() {
                        let _ = sender.send(ShutdownReason::Signal("SIGTERM".to_string()));
                    }
                }
            });
        }

        let shutdown_sender_sigint = Arc::clone(&shutdown_sender);
        tokio::spawn(async move {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                if let Some(sender) = shutdown_sender_sigint.lock().take() {
                    let _ = sender.send(ShutdownReason::Signal("SIGINT".to_string()));
                }
            }
        });
    }
}
