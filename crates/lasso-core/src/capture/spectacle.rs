//! KDE Plasma backend via `spectacle`
//!
//! Spectacle has no region flag usable from scripts, so region captures take
//! a full frame and crop it, exactly like the GNOME path. Output goes through
//! a temporary PNG file (`-b -n -o`): background mode, no notification.

use async_trait::async_trait;
use tokio::process::Command;

use super::{CaptureBackend, RawFrame, tool_output};
use crate::error::{SelectError, SelectResult};
use crate::model::{BackendKind, PhysicalRect, SessionEnvironment};

/// Capture backend for KDE Plasma
#[derive(Debug)]
pub struct SpectacleBackend {
    area: PhysicalRect,
}

impl SpectacleBackend {
    pub fn new(env: &SessionEnvironment) -> Self {
        Self {
            area: env.virtual_bounds(),
        }
    }

    async fn capture_to_temp(&self) -> SelectResult<RawFrame> {
        let file = tempfile::Builder::new()
            .prefix("lasso-capture-")
            .suffix(".png")
            .tempfile()?;
        let path = file.path().to_path_buf();

        tracing::debug!(path = %path.display(), "invoking spectacle");
        let output = Command::new("spectacle")
            .args(["-b", "-n", "-o"])
            .arg(&path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SelectError::CaptureUnavailable {
                backend: BackendKind::KdeSpectacle,
                reason:  format!("failed to spawn spectacle: {e}"),
            })?;
        tool_output(BackendKind::KdeSpectacle, output)?;

        let png = tokio::fs::read(&path).await?;
        RawFrame::decode(&png, self.area)
    }
}

#[async_trait]
impl CaptureBackend for SpectacleBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::KdeSpectacle
    }

    async fn capture_full_screen(&self) -> SelectResult<RawFrame> {
        self.capture_to_temp().await
    }

    async fn capture_region(&self, region: PhysicalRect) -> SelectResult<RawFrame> {
        self.capture_to_temp().await?.crop(region)
    }
}
