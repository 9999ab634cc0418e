//! Selection session driver
//!
//! One session per invocation: resolve the mode, pre-capture (static), run
//! the overlay event loop through the selection engine, map coordinates,
//! re-capture (live), extract, and hand the result out. No state crosses
//! session boundaries; the session owns its frame, shape, and geometry
//! exclusively until the extracted selection is moved to the caller.

use crate::capture::CaptureBackend;
use crate::error::SelectResult;
use crate::extract::{ExtractOptions, extract_with};
use crate::geometry::map_selection;
use crate::mode::ModeController;
use crate::model::{
    CaptureMode, EffectiveMode, ExtractedSelection, SelectionShape, SessionEnvironment,
};
use crate::overlay::{EventSource, Overlay, OverlayEvent};
use crate::selection::SelectionEngine;

/// How a session ended
#[derive(Debug)]
pub enum SessionOutcome {
    /// A selection was extracted; ownership moves to the caller
    Completed(ExtractedSelection),
    /// Escape, a degenerate shape, or a closed surface: no output produced
    Cancelled,
}

impl SessionOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionOutcome::Cancelled)
    }
}

/// A single capture-and-select session
#[derive(Debug)]
pub struct SelectionSession {
    env:       SessionEnvironment,
    effective: EffectiveMode,
    extract:   ExtractOptions,
}

impl SelectionSession {
    /// Creates a session, resolving the requested mode against the
    /// environment immediately. The resolution is final for this session.
    pub fn new(env: SessionEnvironment, requested: CaptureMode) -> Self {
        let mut controller = ModeController::new(requested);
        let effective = controller.resolve(&env);
        Self {
            env,
            effective,
            extract: ExtractOptions::default(),
        }
    }

    /// Sets the extraction post-processing options
    pub fn with_extract_options(mut self, extract: ExtractOptions) -> Self {
        self.extract = extract;
        self
    }

    /// The mode this session runs in, including the fallback flag the
    /// surrounding UI uses to notify the user
    pub fn effective_mode(&self) -> EffectiveMode {
        self.effective
    }

    /// Runs the session to completion.
    ///
    /// In Static mode the full-screen frame is captured *before* the overlay
    /// is shown; in Live mode the overlay is concealed and awaited before the
    /// region re-capture so the surface cannot capture its own chrome.
    /// Dropping the returned future (caller-side cancellation) also abandons
    /// any in-flight capture-tool process.
    pub async fn run<S: EventSource>(
        self,
        events: S,
        backend: &dyn CaptureBackend,
    ) -> SelectResult<SessionOutcome> {
        let mut overlay = match self.effective.mode {
            CaptureMode::Static => {
                let frame = backend.capture_full_screen().await?;
                Overlay::static_over(events, frame)
            }
            CaptureMode::Live => Overlay::live(events),
        };

        let shape = match drive_overlay(&mut overlay).await {
            Some(shape) => shape,
            None => {
                overlay.conceal().await;
                tracing::info!("selection session cancelled");
                return Ok(SessionOutcome::Cancelled);
            }
        };

        let geometry = map_selection(&shape, &self.env)?;

        // The live surface must be fully invisible before the re-capture.
        overlay.conceal().await;
        let frame = match overlay.into_frame() {
            Some(frame) => frame,
            None => backend.capture_region(geometry.bounds).await?,
        };

        match extract_with(frame, &geometry, self.extract) {
            Ok(selection) => {
                tracing::info!(
                    width = selection.width(),
                    height = selection.height(),
                    monitor = selection.monitor_id,
                    "selection extracted"
                );
                Ok(SessionOutcome::Completed(selection))
            }
            Err(e) if e.is_cancellation() => Ok(SessionOutcome::Cancelled),
            Err(e) => Err(e),
        }
    }
}

/// Feeds overlay events through the selection engine until a shape is
/// finalized or the session is cancelled.
async fn drive_overlay<S: EventSource>(overlay: &mut Overlay<S>) -> Option<SelectionShape> {
    let mut engine = SelectionEngine::new();

    while let Some(event) = overlay.next_event().await {
        match event {
            OverlayEvent::PointerDown { point, modifiers } => {
                engine.pointer_down(point, modifiers);
                overlay.request_redraw(engine.current_shape());
            }
            OverlayEvent::PointerMove { point } => {
                engine.pointer_move(point);
                overlay.request_redraw(engine.current_shape());
            }
            OverlayEvent::ModifiersChanged { modifiers } => {
                engine.modifiers_changed(modifiers);
                overlay.request_redraw(engine.current_shape());
            }
            OverlayEvent::PointerUp { point } => {
                if engine.is_drawing() {
                    // Degenerate shapes finalize to cancellation
                    return engine.pointer_up(point);
                }
            }
            OverlayEvent::KeyEscape => return None,
            OverlayEvent::KeyEnter => {
                let (width, height) = overlay.logical_size();
                return Some(engine.select_all(width, height));
            }
        }
    }

    // Surface closed without a finalized shape
    None
}

/// Convenience wrapper: run a full session and fold fatal errors and
/// cancellation into an `Option` for callers that only care about output.
pub async fn run_session<S: EventSource>(
    env: SessionEnvironment,
    requested: CaptureMode,
    events: S,
    backend: &dyn CaptureBackend,
) -> SelectResult<Option<ExtractedSelection>> {
    let session = SelectionSession::new(env, requested);
    match session.run(events, backend).await? {
        SessionOutcome::Completed(selection) => Ok(Some(selection)),
        SessionOutcome::Cancelled => Ok(None),
    }
}
