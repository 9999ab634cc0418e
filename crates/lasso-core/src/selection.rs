//! Selection engine
//!
//! A pure state machine turning pointer/modifier event streams into a
//! finalized [`SelectionShape`]. The modifier state at PointerDown picks the
//! shape variant for the drag; switching modifiers mid-drag re-tags the
//! in-progress shape while preserving the anchor. Degenerate results (zero
//! area, or a freeform path with fewer than three distinct points) finalize
//! to `None`: the session treats that as cancellation, not an error.

use crate::geometry::{polygon_area, simplify_path};
use crate::model::{LogicalPoint, SelectionShape};
use crate::overlay::Modifiers;

/// Pointer-move points closer than this (logical pixels) to the previous
/// point are dropped, bounding polygon growth during a slow drag.
pub const POINT_EPSILON: f64 = 2.0;

/// Freeform polygons are thinned at finalize time once they exceed this many
/// points.
pub const MAX_FREEFORM_POINTS: usize = 1024;

/// Tolerance (logical pixels) for the finalize-time path simplification.
pub const SIMPLIFY_TOLERANCE: f64 = 1.5;

/// Shape variant selected by the modifier state at PointerDown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Freeform,
    Rectangle,
    Ellipse,
}

impl ShapeKind {
    /// Modifier contract: none => Freeform, Ctrl => Rectangle,
    /// Ctrl+Shift => Ellipse
    pub fn from_modifiers(modifiers: Modifiers) -> Self {
        match (modifiers.ctrl, modifiers.shift) {
            (true, true) => ShapeKind::Ellipse,
            (true, false) => ShapeKind::Rectangle,
            _ => ShapeKind::Freeform,
        }
    }
}

/// Converts an input event stream into a finalized selection shape.
///
/// Exactly one shape is active per drawing session; it is mutated only
/// through the methods below and frozen by [`SelectionEngine::pointer_up`].
#[derive(Debug, Default)]
pub struct SelectionEngine {
    drag: Option<SelectionShape>,
}

impl SelectionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a drag is in progress
    pub fn is_drawing(&self) -> bool {
        self.drag.is_some()
    }

    /// The in-progress shape, for overlay redraw
    pub fn current_shape(&self) -> Option<&SelectionShape> {
        self.drag.as_ref()
    }

    /// Starts a drag. A second PointerDown during an active drag is ignored.
    pub fn pointer_down(&mut self, point: LogicalPoint, modifiers: Modifiers) {
        if self.drag.is_some() {
            return;
        }
        self.drag = Some(match ShapeKind::from_modifiers(modifiers) {
            ShapeKind::Freeform => SelectionShape::Freeform(vec![point]),
            ShapeKind::Rectangle => SelectionShape::Rectangle {
                anchor:  point,
                current: point,
            },
            ShapeKind::Ellipse => SelectionShape::Ellipse {
                anchor:  point,
                current: point,
            },
        });
    }

    /// Tracks pointer motion during a drag
    pub fn pointer_move(&mut self, point: LogicalPoint) {
        match &mut self.drag {
            Some(SelectionShape::Freeform(points)) => {
                let far_enough = points
                    .last()
                    .is_none_or(|last| last.distance(&point) >= POINT_EPSILON);
                if far_enough {
                    points.push(point);
                }
            }
            Some(SelectionShape::Rectangle { current, .. })
            | Some(SelectionShape::Ellipse { current, .. }) => *current = point,
            None => {}
        }
    }

    /// Re-tags the in-progress shape on a mid-drag modifier change.
    ///
    /// The anchor is preserved: for a freeform path that is its first point,
    /// for box shapes the original anchor corner.
    pub fn modifiers_changed(&mut self, modifiers: Modifiers) {
        let Some(shape) = self.drag.take() else {
            return;
        };
        let kind = ShapeKind::from_modifiers(modifiers);

        let (anchor, current) = match &shape {
            SelectionShape::Freeform(points) => {
                let anchor = points[0];
                let current = *points.last().unwrap_or(&anchor);
                (anchor, current)
            }
            SelectionShape::Rectangle { anchor, current }
            | SelectionShape::Ellipse { anchor, current } => (*anchor, *current),
        };

        self.drag = Some(match (kind, shape) {
            (ShapeKind::Freeform, shape @ SelectionShape::Freeform(_)) => shape,
            (ShapeKind::Freeform, _) => SelectionShape::Freeform(vec![anchor, current]),
            (ShapeKind::Rectangle, _) => SelectionShape::Rectangle { anchor, current },
            (ShapeKind::Ellipse, _) => SelectionShape::Ellipse { anchor, current },
        });
    }

    /// Freezes the shape. Returns `None` for degenerate selections, which
    /// the caller treats as cancellation.
    pub fn pointer_up(&mut self, point: LogicalPoint) -> Option<SelectionShape> {
        self.pointer_move(point);
        let shape = self.drag.take()?;

        match shape {
            SelectionShape::Freeform(mut points) => {
                if points.len() < 3 || polygon_area(&points) == 0.0 {
                    tracing::debug!(points = points.len(), "degenerate freeform selection");
                    return None;
                }
                if points.len() > MAX_FREEFORM_POINTS {
                    points = simplify_path(&points, SIMPLIFY_TOLERANCE);
                }
                Some(SelectionShape::Freeform(points))
            }
            SelectionShape::Rectangle { anchor, current }
            | SelectionShape::Ellipse { anchor, current }
                if (anchor.x - current.x).abs() == 0.0 || (anchor.y - current.y).abs() == 0.0 =>
            {
                tracing::debug!("degenerate box selection");
                None
            }
            shape => Some(shape),
        }
    }

    /// Whole-surface selection (Enter key): a rectangle covering the full
    /// overlay. Discards any in-progress drag.
    pub fn select_all(&mut self, width: f64, height: f64) -> SelectionShape {
        self.drag = None;
        SelectionShape::Rectangle {
            anchor:  LogicalPoint::new(0.0, 0.0),
            current: LogicalPoint::new(width, height),
        }
    }
}
