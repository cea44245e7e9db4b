use super::{ComponentState, PosecamApp};
use crate::error::Result;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

const STOP_TIMEOUT: Duration = Duration::from_secs(5);

impl PosecamApp {
    /// Release everything: detection loop, camera stream, model, keyboard
    pub async fn shutdown(&mut self) -> Result<i32> {
        info!("Beginning graceful shutdown");

        let mut exit_code = 0;

        if self.keyboard_enabled {
            if let Some(keyboard_handler) = &self.keyboard_handler {
                self.set_component_state("keyboard", ComponentState::Stopping);
                keyboard_handler.stop().await;
                self.set_component_state("keyboard", ComponentState::Stopped);
            }
        }

        if let Some(detection) = self.detection.take() {
            self.set_component_state("detection", ComponentState::Stopping);
            detection.cancel();
            if timeout(STOP_TIMEOUT, detection.stop()).await.is_err() {
                error!("Detection loop stop timeout");
                self.set_component_state("detection", ComponentState::Failed);
                exit_code = 1;
            } else {
                self.set_component_state("detection", ComponentState::Stopped);
            }
        }

        self.session.stop();
        self.set_component_state("camera", ComponentState::Stopped);
        info!("Camera stream released");

        self.detector.shutdown();
        self.set_component_state("detector", ComponentState::Stopped);
        self.set_component_state("capture", ComponentState::Stopped);

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }
}
