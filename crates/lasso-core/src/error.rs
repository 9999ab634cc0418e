//! Error types for the capture/selection pipeline
//!
//! This module defines the error taxonomy with user-facing messages and
//! actionable remediation hints. Each error carries enough context for the
//! surrounding CLI/UI layer to tell the user what went wrong and what to
//! install or reconfigure.
//!
//! Two conditions are deliberately *not* errors: a Live -> Static fallback is
//! absorbed by [`crate::mode::ModeController`] as a flag, and a degenerate
//! selection is treated as user cancellation by the session driver.

use crate::model::BackendKind;

/// Result type alias for pipeline operations
pub type SelectResult<T> = Result<T, SelectError>;

/// Error type for capture and selection operations
///
/// Fatal variants terminate the current session cleanly (overlay surface and
/// raw frame released) without retry; the surrounding layer decides whether
/// to offer a manual re-run.
#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    /// No capture backend is available on this session
    #[error("No screenshot backend available on this session")]
    NoBackendAvailable,

    /// A capture backend failed to produce a frame
    #[error("Capture via {backend} failed: {reason}")]
    CaptureUnavailable {
        /// Backend that failed
        backend: BackendKind,
        /// Tool exit status or IPC error text
        reason:  String,
    },

    /// Extraction produced an empty or fully transparent buffer.
    ///
    /// The session driver maps this to cancellation rather than surfacing it.
    #[error("Selection produced an empty pixel buffer")]
    EmptySelection,

    /// Display scale/offset data is inconsistent
    #[error("Coordinate mapping failed: {reason}")]
    CoordinateMapping {
        /// What made the layout data unusable
        reason: String,
    },

    /// Image encoding failed
    #[error("Failed to encode image as {format}: {reason}")]
    EncodingFailed {
        /// Image format that failed
        format: String,
        /// Reason for encoding failure
        reason: String,
    },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or processing error
    #[error("Image processing error: {0}")]
    Image(String),
}

impl SelectError {
    /// Returns an actionable remediation hint for this error
    ///
    /// Provides compositor-specific guidance for the user to resolve the
    /// error condition.
    ///
    /// # Examples
    ///
    /// ```
    /// use lasso_core::error::SelectError;
    ///
    /// let error = SelectError::NoBackendAvailable;
    /// assert!(error.remediation_hint().contains("grim"));
    /// ```
    pub fn remediation_hint(&self) -> &str {
        match self {
            SelectError::NoBackendAvailable => {
                "Install grim (wlroots compositors) or spectacle (KDE Plasma). GNOME 42+ is \
                 supported through the built-in Shell D-Bus screenshot API and needs gdbus on the \
                 PATH."
            }
            SelectError::CaptureUnavailable { backend, .. } => match backend {
                BackendKind::WlrScreencopy => {
                    "grim could not capture the screen. Ensure the compositor supports the \
                     wlr-screencopy protocol and that WAYLAND_DISPLAY points at a live session."
                }
                BackendKind::KdeSpectacle => {
                    "spectacle could not capture the screen. Ensure Plasma is running and that \
                     background captures are allowed in the Spectacle settings."
                }
                BackendKind::GnomeShell => {
                    "The GNOME Shell screenshot API call failed. Ensure GNOME Shell 42+ is \
                     running and the session D-Bus is reachable."
                }
            },
            SelectError::EmptySelection => {
                "The drawn shape enclosed no visible pixels. Draw a larger region and release \
                 the pointer inside the screen."
            }
            SelectError::CoordinateMapping { .. } => {
                "The display layout reported by the compositor is inconsistent (zero scale or \
                 missing outputs). Re-run after reconnecting the display, or report the layout \
                 output of `lasso detect --json`."
            }
            SelectError::EncodingFailed { format, .. } => match format.as_str() {
                "webp" => {
                    "WebP encoding failed. Try PNG format as a fallback."
                }
                "jpeg" | "jpg" => {
                    "JPEG encoding failed. Try reducing the quality parameter or using PNG."
                }
                _ => "Image encoding failed. Try a different format (PNG, JPEG, or WebP).",
            },
            SelectError::Io(_) => {
                "An I/O error occurred. Check file permissions, disk space, and that the \
                 temporary directory is writable."
            }
            SelectError::Image(_) => {
                "Image processing failed. The capture tool may have produced a truncated or \
                 unsupported file."
            }
        }
    }

    /// Whether this error cancels the session rather than failing it.
    ///
    /// [`SelectError::EmptySelection`] is the one error the session driver
    /// folds into user cancellation.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SelectError::EmptySelection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_backend_message() {
        let error = SelectError::NoBackendAvailable;
        assert!(error.to_string().contains("No screenshot backend"));
        assert!(error.remediation_hint().contains("spectacle"));
    }

    #[test]
    fn test_capture_unavailable_message() {
        let error = SelectError::CaptureUnavailable {
            backend: BackendKind::WlrScreencopy,
            reason:  "exit status 1".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("wlr-screencopy"));
        assert!(msg.contains("exit status 1"));
        assert!(error.remediation_hint().contains("wlr-screencopy"));
    }

    #[test]
    fn test_capture_unavailable_hints_per_backend() {
        let kde = SelectError::CaptureUnavailable {
            backend: BackendKind::KdeSpectacle,
            reason:  "boom".to_string(),
        };
        assert!(kde.remediation_hint().contains("Plasma"));

        let gnome = SelectError::CaptureUnavailable {
            backend: BackendKind::GnomeShell,
            reason:  "boom".to_string(),
        };
        assert!(gnome.remediation_hint().contains("D-Bus"));
    }

    #[test]
    fn test_empty_selection_is_cancellation() {
        assert!(SelectError::EmptySelection.is_cancellation());
        assert!(!SelectError::NoBackendAvailable.is_cancellation());
    }

    #[test]
    fn test_coordinate_mapping_message() {
        let error = SelectError::CoordinateMapping {
            reason: "monitor scale is 0".to_string(),
        };
        assert!(error.to_string().contains("monitor scale is 0"));
        assert!(error.remediation_hint().contains("lasso detect"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: SelectError = io_error.into();
        assert!(error.to_string().contains("I/O error"));
    }
}
