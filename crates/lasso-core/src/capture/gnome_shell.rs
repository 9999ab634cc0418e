//! GNOME Shell backend via the Shell's D-Bus screenshot API
//!
//! GNOME 42+ removed script access to the old gnome-screenshot path; the
//! supported route is `org.gnome.Shell.Screenshot` on the session bus,
//! invoked here through `gdbus`. The API writes to a file, so captures go
//! through a temporary PNG. Region captures take a full frame and crop.

use async_trait::async_trait;
use tokio::process::Command;

use super::{CaptureBackend, RawFrame, tool_output};
use crate::error::{SelectError, SelectResult};
use crate::model::{BackendKind, PhysicalRect, SessionEnvironment};

/// Capture backend for GNOME Shell sessions
#[derive(Debug)]
pub struct GnomeShellBackend {
    area: PhysicalRect,
}

impl GnomeShellBackend {
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

        tracing::debug!(path = %path.display(), "invoking GNOME Shell screenshot API");
        let output = Command::new("gdbus")
            .args([
                "call",
                "--session",
                "--dest",
                "org.gnome.Shell.Screenshot",
                "--object-path",
                "/org/gnome/Shell/Screenshot",
                "--method",
                "org.gnome.Shell.Screenshot.Screenshot",
                // include_cursor, flash
                "false",
                "false",
            ])
            .arg(&path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SelectError::CaptureUnavailable {
                backend: BackendKind::GnomeShell,
                reason:  format!("failed to spawn gdbus: {e}"),
            })?;
        tool_output(BackendKind::GnomeShell, output)?;

        let png = tokio::fs::read(&path).await?;
        RawFrame::decode(&png, self.area)
    }
}

#[async_trait]
impl CaptureBackend for GnomeShellBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::GnomeShell
    }

    async fn capture_full_screen(&self) -> SelectResult<RawFrame> {
        self.capture_to_temp().await
    }

    async fn capture_region(&self, region: PhysicalRect) -> SelectResult<RawFrame> {
        self.capture_to_temp().await?.crop(region)
    }
}
