//! Capture backends
//!
//! One concrete strategy exists per [`BackendKind`]; the variant for a
//! session is chosen once, from the detection result, by [`backend_for`].
//! Capture is a one-shot externally visible side effect: no backend retries
//! internally, and a backend that cannot produce a complete frame fails with
//! [`crate::error::SelectError::CaptureUnavailable`] instead of returning a
//! partial one.
//!
//! All tool invocations go through `tokio::process` with `kill_on_drop`, so
//! dropping a pending capture future (session cancellation) also abandons
//! the external process.

use async_trait::async_trait;

use crate::error::{SelectError, SelectResult};
use crate::model::{BackendKind, PhysicalRect, SessionEnvironment};

pub mod frame;
pub mod gnome_shell;
pub mod grim;
pub mod mock;
pub mod spectacle;

pub use frame::RawFrame;
pub use gnome_shell::GnomeShellBackend;
pub use grim::GrimBackend;
pub use mock::MockBackend;
pub use spectacle::SpectacleBackend;

/// A screenshot mechanism producing physical-pixel-accurate frames.
///
/// `capture_full_screen` is the Static-mode pre-capture: the entire virtual
/// display space in one buffer. `capture_region` is the Live-mode post-draw
/// re-capture path and is not part of the static contract.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Which backend variant this is
    fn kind(&self) -> BackendKind;

    /// Captures the entire virtual display space in one frame
    async fn capture_full_screen(&self) -> SelectResult<RawFrame>;

    /// Captures the given physical region (Live-mode re-capture)
    async fn capture_region(&self, region: PhysicalRect) -> SelectResult<RawFrame>;
}

/// Creates the capture backend for the detected environment.
///
/// First present wins, in the preference order recorded by detection:
/// wlroots-native tool > desktop-specific tool > desktop-shell IPC.
pub fn backend_for(env: &SessionEnvironment) -> SelectResult<Box<dyn CaptureBackend>> {
    match env.preferred_backend() {
        Some(BackendKind::WlrScreencopy) => Ok(Box::new(GrimBackend::new(env))),
        Some(BackendKind::KdeSpectacle) => Ok(Box::new(SpectacleBackend::new(env))),
        Some(BackendKind::GnomeShell) => Ok(Box::new(GnomeShellBackend::new(env))),
        None => Err(SelectError::NoBackendAvailable),
    }
}

/// Maps a finished tool invocation to its stdout payload, or a
/// `CaptureUnavailable` carrying the tool's stderr.
pub(crate) fn tool_output(
    backend: BackendKind,
    output: std::process::Output,
) -> SelectResult<Vec<u8>> {
    if output.status.success() {
        return Ok(output.stdout);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let reason = if stderr.trim().is_empty() {
        format!("{} exited with {}", backend.tool(), output.status)
    } else {
        stderr.trim().to_string()
    };
    tracing::error!(backend = %backend, %reason, "capture tool failed");
    Err(SelectError::CaptureUnavailable { backend, reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Compositor, Monitor};

    fn env_with(backends: Vec<BackendKind>) -> SessionEnvironment {
        SessionEnvironment {
            compositor: Compositor::Unknown,
            backends,
            layer_shell: false,
            monitors: vec![Monitor::fallback()],
        }
    }

    #[test]
    fn test_backend_for_prefers_first() {
        let env = env_with(vec![BackendKind::WlrScreencopy, BackendKind::KdeSpectacle]);
        let backend = backend_for(&env).unwrap();
        assert_eq!(backend.kind(), BackendKind::WlrScreencopy);
    }

    #[test]
    fn test_backend_for_each_kind() {
        for kind in [
            BackendKind::WlrScreencopy,
            BackendKind::KdeSpectacle,
            BackendKind::GnomeShell,
        ] {
            let backend = backend_for(&env_with(vec![kind])).unwrap();
            assert_eq!(backend.kind(), kind);
        }
    }

    #[test]
    fn test_backend_for_empty_catalog() {
        let result = backend_for(&env_with(vec![]));
        assert!(matches!(result, Err(SelectError::NoBackendAvailable)));
    }

    #[test]
    fn test_tool_output_failure_carries_stderr() {
        use std::os::unix::process::ExitStatusExt;
        let output = std::process::Output {
            status: std::process::ExitStatus::from_raw(256),
            stdout: vec![],
            stderr: b"compositor doesn't support wlr-screencopy".to_vec(),
        };
        let err = tool_output(BackendKind::WlrScreencopy, output).unwrap_err();
        match err {
            SelectError::CaptureUnavailable { backend, reason } => {
                assert_eq!(backend, BackendKind::WlrScreencopy);
                assert!(reason.contains("wlr-screencopy"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_tool_output_success_passthrough() {
        use std::os::unix::process::ExitStatusExt;
        let output = std::process::Output {
            status: std::process::ExitStatus::from_raw(0),
            stdout: b"payload".to_vec(),
            stderr: vec![],
        };
        assert_eq!(tool_output(BackendKind::KdeSpectacle, output).unwrap(), b"payload");
    }
}
