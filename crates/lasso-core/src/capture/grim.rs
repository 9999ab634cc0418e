//! wlroots screencopy backend via `grim`
//!
//! `grim` speaks the wlr-screencopy protocol directly and writes PNG to
//! stdout, which keeps the whole capture in memory. Region captures use
//! `-g "x,y wxh"` in compositor layout (logical) coordinates; the selection
//! pipeline works in physical pixels, so the region is translated back
//! through the owning monitor's scale before invoking the tool.

use async_trait::async_trait;
use tokio::process::Command;

use super::{CaptureBackend, RawFrame, tool_output};
use crate::error::{SelectError, SelectResult};
use crate::model::{BackendKind, Monitor, PhysicalRect, SessionEnvironment};

/// Capture backend for wlroots compositors (Hyprland, Sway, ...)
#[derive(Debug)]
pub struct GrimBackend {
    monitors: Vec<Monitor>,
    area:     PhysicalRect,
}

impl GrimBackend {
    pub fn new(env: &SessionEnvironment) -> Self {
        Self {
            monitors: env.monitors.clone(),
            area:     env.virtual_bounds(),
        }
    }

    /// Formats a physical region as grim's `-g` layout-coordinate geometry.
    ///
    /// grim expects logical layout coordinates; the physical region is
    /// translated through the monitor whose physical rectangle contains it.
    fn layout_geometry(&self, region: PhysicalRect) -> SelectResult<String> {
        let owner = self
            .monitors
            .iter()
            .find(|m| m.physical.intersect(&region).is_some())
            .ok_or_else(|| SelectError::CoordinateMapping {
                reason: format!("region {region:?} is outside every monitor"),
            })?;

        let lx = owner.logical.x + (region.x - owner.physical.x) as f64 / owner.scale;
        let ly = owner.logical.y + (region.y - owner.physical.y) as f64 / owner.scale;
        let lw = (region.width as f64 / owner.scale).ceil().max(1.0);
        let lh = (region.height as f64 / owner.scale).ceil().max(1.0);

        Ok(format!(
            "{},{} {}x{}",
            lx.floor() as i32,
            ly.floor() as i32,
            lw as u32,
            lh as u32
        ))
    }

    async fn run(&self, args: &[&str]) -> SelectResult<Vec<u8>> {
        tracing::debug!(?args, "invoking grim");
        let output = Command::new("grim")
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SelectError::CaptureUnavailable {
                backend: BackendKind::WlrScreencopy,
                reason:  format!("failed to spawn grim: {e}"),
            })?;
        tool_output(BackendKind::WlrScreencopy, output)
    }
}

#[async_trait]
impl CaptureBackend for GrimBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::WlrScreencopy
    }

    async fn capture_full_screen(&self) -> SelectResult<RawFrame> {
        let png = self.run(&["-"]).await?;
        RawFrame::decode(&png, self.area)
    }

    async fn capture_region(&self, region: PhysicalRect) -> SelectResult<RawFrame> {
        let geometry = self.layout_geometry(region)?;
        let png = self.run(&["-g", &geometry, "-"]).await?;
        RawFrame::decode(&png, region)
    }
}
