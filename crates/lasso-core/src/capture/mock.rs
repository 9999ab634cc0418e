//! Mock capture backend for testing
//!
//! Generates synthetic test-pattern frames without touching a real display.
//! Supports a configurable delay (for timing-sensitive tests), error
//! injection (for error-path tests), and an optional shared call log so a
//! test can assert ordering between the overlay and the backend, e.g. that
//! the live surface was hidden *before* the post-draw re-capture ran.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use super::{CaptureBackend, RawFrame};
use crate::error::{SelectError, SelectResult};
use crate::model::{BackendKind, PhysicalRect};

/// Shared, ordered record of calls across test collaborators
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Capture backend producing synthetic frames
#[derive(Debug)]
pub struct MockBackend {
    area:            PhysicalRect,
    delay:           Option<Duration>,
    error_injection: Option<SelectError>,
    log:             Option<CallLog>,
}

impl MockBackend {
    /// Creates a mock backend whose full-screen frame covers `area`
    pub fn new(area: PhysicalRect) -> Self {
        Self {
            area,
            delay: None,
            error_injection: None,
            log: None,
        }
    }

    /// Sleeps for `delay` before completing any capture
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Makes every capture fail with (a copy of) the given error
    pub fn with_error(mut self, error: SelectError) -> Self {
        self.error_injection = Some(error);
        self
    }

    /// Records each capture call into a shared log
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    fn record(&self, call: &str) {
        if let Some(log) = &self.log {
            log.lock().unwrap().push(call.to_string());
        }
    }

    async fn pre_capture(&self) -> SelectResult<()> {
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        if let Some(error) = &self.error_injection {
            return Err(clone_error(error));
        }
        Ok(())
    }
}

/// Rebuilds an owned copy of an injected error.
///
/// `SelectError` holds an `io::Error` in one variant and so cannot derive
/// `Clone`; the mock reconstructs variants field by field instead.
fn clone_error(error: &SelectError) -> SelectError {
    match error {
        SelectError::NoBackendAvailable => SelectError::NoBackendAvailable,
        SelectError::CaptureUnavailable { backend, reason } => SelectError::CaptureUnavailable {
            backend: *backend,
            reason:  reason.clone(),
        },
        SelectError::EmptySelection => SelectError::EmptySelection,
        SelectError::CoordinateMapping { reason } => SelectError::CoordinateMapping {
            reason: reason.clone(),
        },
        SelectError::EncodingFailed { format, reason } => SelectError::EncodingFailed {
            format: format.clone(),
            reason: reason.clone(),
        },
        SelectError::Io(e) => SelectError::Io(std::io::Error::new(e.kind(), e.to_string())),
        SelectError::Image(msg) => SelectError::Image(msg.clone()),
    }
}

#[async_trait]
impl CaptureBackend for MockBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::WlrScreencopy
    }

    async fn capture_full_screen(&self) -> SelectResult<RawFrame> {
        self.record("capture_full_screen");
        self.pre_capture().await?;
        Ok(RawFrame::from_test_pattern(self.area))
    }

    async fn capture_region(&self, region: PhysicalRect) -> SelectResult<RawFrame> {
        self.record("capture_region");
        self.pre_capture().await?;
        RawFrame::from_test_pattern(self.area).crop(region)
    }
}
