//! Scripted event source for tests and non-interactive drivers
//!
//! Replays a fixed sequence of overlay events. Used by the pipeline tests in
//! place of a real toolkit surface, and by the CLI to drive a session from an
//! externally supplied region. A [`ScriptedProbe`] observes what the session
//! did to the surface (redraws, concealment), and an optional shared call log
//! lets tests assert ordering against other collaborators, e.g. that `hide`
//! completed before the re-capture call.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{EventSource, Modifiers, OverlayEvent};
use crate::capture::mock::CallLog;
use crate::model::{LogicalPoint, SelectionShape};

#[derive(Debug, Default)]
struct ProbeState {
    hidden:           AtomicBool,
    redraws:          AtomicUsize,
    last_shape_drawn: AtomicBool,
    any_redraw:       AtomicBool,
}

/// Read-only view of what happened to a [`ScriptedEvents`] surface
#[derive(Debug, Clone)]
pub struct ScriptedProbe {
    state: Arc<ProbeState>,
}

impl ScriptedProbe {
    /// Whether `hide` has completed
    pub fn hidden(&self) -> bool {
        self.state.hidden.load(Ordering::SeqCst)
    }

    /// Number of redraw requests received
    pub fn redraw_count(&self) -> usize {
        self.state.redraws.load(Ordering::SeqCst)
    }

    /// Whether the most recent redraw carried a shape, or `None` before the
    /// first redraw
    pub fn last_redraw_had_shape(&self) -> Option<bool> {
        if !self.state.any_redraw.load(Ordering::SeqCst) {
            return None;
        }
        Some(self.state.last_shape_drawn.load(Ordering::SeqCst))
    }
}

/// Event source that replays a fixed script
pub struct ScriptedEvents {
    queue: VecDeque<OverlayEvent>,
    size:  (f64, f64),
    state: Arc<ProbeState>,
    log:   Option<CallLog>,
}

impl ScriptedEvents {
    pub fn new(events: Vec<OverlayEvent>, size: (f64, f64)) -> Self {
        Self {
            queue: events.into(),
            size,
            state: Arc::new(ProbeState::default()),
            log: None,
        }
    }

    /// Records `hide` into a shared log for cross-collaborator ordering
    /// assertions
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Observer handle for this surface
    pub fn probe(&self) -> ScriptedProbe {
        ScriptedProbe {
            state: self.state.clone(),
        }
    }

    /// Builds a full drag script: PointerDown at the first point with the
    /// given modifiers, a PointerMove per remaining point, PointerUp at the
    /// last.
    pub fn drag(points: &[(f64, f64)], modifiers: Modifiers, size: (f64, f64)) -> Self {
        let mut events = Vec::with_capacity(points.len() + 1);
        let mut iter = points.iter().map(|&(x, y)| LogicalPoint::new(x, y));
        if let Some(first) = iter.next() {
            events.push(OverlayEvent::PointerDown {
                point: first,
                modifiers,
            });
            let mut last = first;
            for point in iter {
                events.push(OverlayEvent::PointerMove { point });
                last = point;
            }
            events.push(OverlayEvent::PointerUp { point: last });
        }
        Self::new(events, size)
    }
}

#[async_trait]
impl EventSource for ScriptedEvents {
    async fn next_event(&mut self) -> Option<OverlayEvent> {
        self.queue.pop_front()
    }

    fn request_redraw(&mut self, shape: Option<&SelectionShape>) {
        self.state.redraws.fetch_add(1, Ordering::SeqCst);
        self.state
            .last_shape_drawn
            .store(shape.is_some(), Ordering::SeqCst);
        self.state.any_redraw.store(true, Ordering::SeqCst);
    }

    fn logical_size(&self) -> (f64, f64) {
        self.size
    }

    async fn hide(&mut self) {
        self.state.hidden.store(true, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.lock().unwrap().push("hide".to_string());
        }
    }
}
