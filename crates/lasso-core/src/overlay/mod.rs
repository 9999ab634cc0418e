//! Overlay surface contract and variant drivers
//!
//! The crate does not implement a windowing toolkit's event loop. It defines
//! the behavioral contract the overlay/event layer must satisfy — the
//! [`EventSource`] trait — and ships the two surface variants built on top
//! of it:
//!
//! - [`Overlay::static_over`]: an opaque surface backed by the pre-captured
//!   frame; always available.
//! - [`Overlay::live`]: a transparent, input-opaque, top-layer surface; valid
//!   only when the session resolved to Live mode, and required to be fully
//!   concealed before the post-draw re-capture so it cannot capture its own
//!   chrome.
//!
//! A toolkit adapter (layer-shell surface, test script, CLI replay) plugs in
//! as an `EventSource`; the session driver consumes [`OverlayEvent`]s from
//! the overlay and requests a redraw of the current shape on every pointer
//! or modifier change.

use async_trait::async_trait;

use crate::capture::RawFrame;
use crate::model::{LogicalPoint, SelectionShape};

pub mod scripted;

pub use scripted::ScriptedEvents;

/// Modifier-key state attached to pointer events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl:  bool,
    pub shift: bool,
}

impl Modifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl:  true,
            shift: false,
        }
    }

    pub fn ctrl_shift() -> Self {
        Self {
            ctrl:  true,
            shift: true,
        }
    }
}

/// One input event from the overlay surface, in logical coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayEvent {
    PointerDown {
        point:     LogicalPoint,
        modifiers: Modifiers,
    },
    PointerMove {
        point: LogicalPoint,
    },
    ModifiersChanged {
        modifiers: Modifiers,
    },
    PointerUp {
        point: LogicalPoint,
    },
    /// Cancels the session with no output
    KeyEscape,
    /// Accepts the whole surface as the selection
    KeyEnter,
}

/// The contract a toolkit adapter implements for the overlay surface.
///
/// `next_event` yields input events until the surface closes; `request_redraw`
/// asks the adapter to repaint the current shape with its glow/outline;
/// `hide` must not resolve until the surface is actually invisible, because
/// Live mode re-captures the screen immediately afterwards.
#[async_trait]
pub trait EventSource: Send {
    /// Next input event, or `None` once the surface is gone
    async fn next_event(&mut self) -> Option<OverlayEvent>;

    /// Repaint showing `shape`, or clear the drawing when `None`
    fn request_redraw(&mut self, shape: Option<&SelectionShape>);

    /// Size of the surface in logical coordinates
    fn logical_size(&self) -> (f64, f64);

    /// Makes the surface fully invisible; resolves only once it is
    async fn hide(&mut self);
}

/// Variant-specific backing of the overlay
#[derive(Debug)]
enum Backing {
    /// Frozen pre-captured frame shown behind the drawing
    Static(RawFrame),
    /// Transparent layer surface over the live desktop
    Live,
}

/// The interactive drawing surface handed to the session driver
pub struct Overlay<S: EventSource> {
    events:  S,
    backing: Backing,
}

impl<S: EventSource> Overlay<S> {
    /// Static variant: draw over the previously captured frame
    pub fn static_over(events: S, frame: RawFrame) -> Self {
        Self {
            events,
            backing: Backing::Static(frame),
        }
    }

    /// Live variant: draw over the actual desktop
    pub fn live(events: S) -> Self {
        Self {
            events,
            backing: Backing::Live,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self.backing, Backing::Live)
    }

    pub async fn next_event(&mut self) -> Option<OverlayEvent> {
        self.events.next_event().await
    }

    pub fn request_redraw(&mut self, shape: Option<&SelectionShape>) {
        self.events.request_redraw(shape);
    }

    pub fn logical_size(&self) -> (f64, f64) {
        self.events.logical_size()
    }

    /// Conceals the surface. Completion is the signal that a Live re-capture
    /// may proceed without capturing the overlay itself.
    pub async fn conceal(&mut self) {
        self.events.request_redraw(None);
        self.events.hide().await;
    }

    /// Tears the overlay down, releasing the pre-captured frame if this is
    /// the static variant
    pub fn into_frame(self) -> Option<RawFrame> {
        match self.backing {
            Backing::Static(frame) => Some(frame),
            Backing::Live => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PhysicalRect;

    #[tokio::test]
    async fn test_static_overlay_returns_frame() {
        let frame = RawFrame::from_test_pattern(PhysicalRect::new(0, 0, 32, 32));
        let overlay = Overlay::static_over(ScriptedEvents::new(vec![], (32.0, 32.0)), frame);
        assert!(!overlay.is_live());
        let frame = overlay.into_frame().unwrap();
        assert_eq!(frame.width(), 32);
    }

    #[tokio::test]
    async fn test_live_overlay_has_no_frame() {
        let overlay = Overlay::live(ScriptedEvents::new(vec![], (32.0, 32.0)));
        assert!(overlay.is_live());
        assert!(overlay.into_frame().is_none());
    }

    #[tokio::test]
    async fn test_conceal_clears_and_hides() {
        let events = ScriptedEvents::new(vec![], (32.0, 32.0));
        let probe = events.probe();
        let mut overlay = Overlay::live(events);
        overlay.conceal().await;
        assert!(probe.hidden());
        // The concealing redraw clears the shape
        assert_eq!(probe.last_redraw_had_shape(), Some(false));
    }
}
