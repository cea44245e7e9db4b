use super::{ComponentState, PosecamApp};
use crate::error::Result;
use tracing::{info, warn};

impl PosecamApp {
    /// Register components in their initial state
    pub fn initialize(&mut self) -> Result<()> {
        info!("Initializing posecam components");

        let mut components = vec!["camera", "detector", "detection", "capture"];
        if self.keyboard_enabled {
            components.push("keyboard");
        }
        for component in components {
            self.set_component_state(component, ComponentState::Stopped);
        }

        info!("All components initialized successfully");
        Ok(())
    }

    /// Open the camera and begin detecting.
    ///
    /// A camera failure is not fatal: the session keeps its classified error
    /// and the user can retry.
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting posecam");

        self.set_component_state("detector", ComponentState::Starting);
        self.set_component_state("capture", ComponentState::Running);

        self.set_component_state("camera", ComponentState::Starting);
        let facing = self.config.camera.facing;
        match self.session.start(facing).await {
            Ok(()) => {
                self.set_component_state("camera", ComponentState::Running);
                info!("Camera started ({})", facing);
            }
            Err(e) => {
                self.set_component_state("camera", ComponentState::Failed);
                warn!("Camera unavailable ({}): {} - press 'r' to retry", e.kind(), e);
            }
        }

        if self.keyboard_enabled {
            if let Some(keyboard_handler) = &self.keyboard_handler {
                self.set_component_state("keyboard", ComponentState::Starting);
                keyboard_handler.start()?;
                self.set_component_state("keyboard", ComponentState::Running);
                info!(
                    "Keyboard control active: SPACE/c capture, f flip, 0-9 template, r retry, q quit"
                );
            }
        }

        self.restart_detection().await;

        info!("Posecam started");
        Ok(())
    }
}
