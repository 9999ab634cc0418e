//! Session environment detection
//!
//! This module is the single place that inspects the ambient session:
//! which compositor is running, which screenshot tools are installed, whether
//! a layer-shell overlay can be created, and how the outputs are laid out.
//!
//! Detection never fails. Unknown conditions degrade to
//! [`Compositor::Unknown`], an empty backend list, or the fallback monitor,
//! so a caller can always proceed with *some* mode.

use std::env;
use std::path::Path;

use serde::Deserialize;

use crate::model::{
    BackendKind, Compositor, LogicalRect, Monitor, PhysicalRect, SessionEnvironment,
};

/// Detects the current session environment
///
/// Probes, in order:
/// - compositor identity from environment variables
/// - installed capture tools from `$PATH`, preferring the wlroots-native tool
///   over the desktop-specific tool over generic desktop-shell IPC
/// - layer-shell capability (wlroots-family compositors only)
/// - monitor layout from compositor IPC (`hyprctl` / `swaymsg`), degrading to
///   a single fallback monitor
///
/// # Examples
///
/// ```
/// use lasso_core::detect::detect;
///
/// let env = detect();
/// // Detection never fails; an unrecognized session yields Unknown/empty.
/// assert!(env.monitors.len() >= 1);
/// ```
pub fn detect() -> SessionEnvironment {
    detect_with(
        |key| env::var(key).ok(),
        tool_on_path,
        query_monitors,
    )
}

/// Internal detection with injectable probes
///
/// `env_provider` looks up environment variables, `has_tool` checks for an
/// executable on `$PATH`, and `monitors` queries the compositor's layout IPC.
/// Injecting all three keeps the tests hermetic.
pub(crate) fn detect_with<E, T, M>(env_provider: E, has_tool: T, monitors: M) -> SessionEnvironment
where
    E: Fn(&str) -> Option<String>,
    T: Fn(&str) -> bool,
    M: Fn(Compositor) -> Option<Vec<Monitor>>,
{
    let compositor = detect_compositor(&env_provider);
    let backends = detect_backends(compositor, &has_tool);
    let layer_shell = matches!(compositor, Compositor::Hyprland | Compositor::Sway);

    let monitors = match monitors(compositor) {
        Some(list) if !list.is_empty() => list,
        _ => {
            tracing::debug!("no monitor layout from compositor IPC, using fallback");
            vec![Monitor::fallback()]
        }
    };

    tracing::info!(
        compositor = %compositor,
        backends = ?backends,
        layer_shell,
        monitor_count = monitors.len(),
        "detected session environment"
    );

    SessionEnvironment {
        compositor,
        backends,
        layer_shell,
        monitors,
    }
}

/// Identifies the compositor from session environment variables
fn detect_compositor<E>(env_provider: &E) -> Compositor
where
    E: Fn(&str) -> Option<String>,
{
    if env_provider("HYPRLAND_INSTANCE_SIGNATURE").is_some_and(|v| !v.is_empty()) {
        return Compositor::Hyprland;
    }
    if env_provider("SWAYSOCK").is_some_and(|v| !v.is_empty()) {
        return Compositor::Sway;
    }

    let desktop = env_provider("XDG_CURRENT_DESKTOP")
        .unwrap_or_default()
        .to_lowercase();
    if desktop.contains("hyprland") {
        Compositor::Hyprland
    } else if desktop.contains("sway") {
        Compositor::Sway
    } else if desktop.contains("gnome") {
        Compositor::Gnome
    } else if desktop.contains("kde") || desktop.contains("plasma") {
        Compositor::Kde
    } else {
        Compositor::Unknown
    }
}

/// Builds the ordered backend preference list from installed tools.
///
/// Preference: wlroots-native tool > desktop-specific tool > desktop-shell
/// IPC. The GNOME Shell API is only usable when GNOME is actually running,
/// so its presence probe is gated on the compositor identity.
fn detect_backends<T>(compositor: Compositor, has_tool: &T) -> Vec<BackendKind>
where
    T: Fn(&str) -> bool,
{
    let mut backends = Vec::new();
    if has_tool("grim") {
        backends.push(BackendKind::WlrScreencopy);
    }
    if has_tool("spectacle") {
        backends.push(BackendKind::KdeSpectacle);
    }
    if compositor == Compositor::Gnome && has_tool("gdbus") {
        backends.push(BackendKind::GnomeShell);
    }
    backends
}

/// Checks whether an executable exists in any `$PATH` directory
fn tool_on_path(tool: &str) -> bool {
    let Some(path) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&path).any(|dir| is_executable(&dir.join(tool)))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

// ============================================================================
// Monitor layout via compositor IPC
// ============================================================================

/// One entry of `hyprctl monitors -j`. Width/height are physical pixels;
/// x/y are layout (logical) coordinates.
#[derive(Debug, Deserialize)]
struct HyprMonitor {
    id:     u32,
    name:   String,
    width:  u32,
    height: u32,
    x:      i32,
    y:      i32,
    scale:  f64,
}

/// One entry of `swaymsg -t get_outputs`. `rect` is logical; the physical
/// size comes from `current_mode`.
#[derive(Debug, Deserialize)]
struct SwayOutput {
    name:         String,
    rect:         SwayRect,
    scale:        Option<f64>,
    current_mode: Option<SwayMode>,
    active:       Option<bool>,
}

#[derive(Debug, Deserialize)]
struct SwayRect {
    x:      i32,
    y:      i32,
    width:  u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct SwayMode {
    width:  u32,
    height: u32,
}

/// Queries the monitor layout over compositor IPC.
///
/// Only wlroots-family compositors expose a layout query this crate
/// understands; everywhere else the caller falls back to a single default
/// monitor. Runs synchronously: detection happens once at startup, before
/// any overlay exists.
fn query_monitors(compositor: Compositor) -> Option<Vec<Monitor>> {
    let output = match compositor {
        Compositor::Hyprland => run_layout_query("hyprctl", &["monitors", "-j"])?,
        Compositor::Sway => run_layout_query("swaymsg", &["-t", "get_outputs"])?,
        _ => return None,
    };

    match compositor {
        Compositor::Hyprland => parse_hyprland_monitors(&output),
        Compositor::Sway => parse_sway_outputs(&output),
        _ => None,
    }
}

fn run_layout_query(tool: &str, args: &[&str]) -> Option<String> {
    let output = std::process::Command::new(tool).args(args).output().ok()?;
    if !output.status.success() {
        tracing::warn!(tool, status = ?output.status, "layout query failed");
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

pub(crate) fn parse_hyprland_monitors(json: &str) -> Option<Vec<Monitor>> {
    let raw: Vec<HyprMonitor> = serde_json::from_str(json).ok()?;
    let monitors = raw
        .into_iter()
        .filter(|m| m.scale > 0.0 && m.width > 0 && m.height > 0)
        .map(|m| Monitor {
            id:       m.id,
            scale:    m.scale,
            logical:  LogicalRect::new(
                m.x as f64,
                m.y as f64,
                m.width as f64 / m.scale,
                m.height as f64 / m.scale,
            ),
            physical: PhysicalRect::new(
                (m.x as f64 * m.scale).round() as i32,
                (m.y as f64 * m.scale).round() as i32,
                m.width,
                m.height,
            ),
            name:     m.name,
        })
        .collect::<Vec<_>>();
    Some(monitors)
}

pub(crate) fn parse_sway_outputs(json: &str) -> Option<Vec<Monitor>> {
    let raw: Vec<SwayOutput> = serde_json::from_str(json).ok()?;
    let monitors = raw
        .into_iter()
        .filter(|o| o.active.unwrap_or(true))
        .enumerate()
        .filter_map(|(idx, o)| {
            let scale = o.scale.unwrap_or(1.0);
            if scale <= 0.0 || o.rect.width == 0 || o.rect.height == 0 {
                return None;
            }
            let (phys_w, phys_h) = match o.current_mode {
                Some(mode) => (mode.width, mode.height),
                None => (
                    (o.rect.width as f64 * scale).round() as u32,
                    (o.rect.height as f64 * scale).round() as u32,
                ),
            };
            Some(Monitor {
                id:       idx as u32,
                scale,
                logical:  LogicalRect::new(
                    o.rect.x as f64,
                    o.rect.y as f64,
                    o.rect.width as f64,
                    o.rect.height as f64,
                ),
                physical: PhysicalRect::new(
                    (o.rect.x as f64 * scale).round() as i32,
                    (o.rect.y as f64 * scale).round() as i32,
                    phys_w,
                    phys_h,
                ),
                name:     o.name,
            })
        })
        .collect::<Vec<_>>();
    Some(monitors)
}
