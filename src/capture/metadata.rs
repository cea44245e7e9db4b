use crate::camera::FacingMode;
use crate::error::{PosecamError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Sidecar describing an exported photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub facing: FacingMode,
    pub template_id: Option<String>,
    pub aligned: bool,
    pub captured_at: DateTime<Utc>,
}

/// Write `metadata` as pretty JSON next to the photo (`pose-1.jpg` -> `pose-1.json`)
pub(crate) async fn save_metadata(photo_path: &Path, metadata: &PhotoMetadata) -> Result<PathBuf> {
    let metadata_json = serde_json::to_string_pretty(metadata).map_err(|e| {
        PosecamError::component("capture", format!("Failed to serialize metadata: {}", e))
    })?;

    let metadata_path = photo_path.with_extension("json");
    fs::write(&metadata_path, metadata_json).await.map_err(|e| {
        PosecamError::component("capture", format!("Failed to write metadata file: {}", e))
    })?;

    debug!("Saved metadata to {}", metadata_path.display());
    Ok(metadata_path)
}
