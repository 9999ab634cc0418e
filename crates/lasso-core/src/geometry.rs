//! Coordinate mapping and pure shape math
//!
//! Everything here is a free function over immutable geometry values: the
//! logical-to-physical mapping under per-monitor scale factors, the
//! point-in-shape tests used to build extraction masks, and path helpers
//! shared with the selection engine. None of it touches a display.

use crate::error::{SelectError, SelectResult};
use crate::model::{
    LogicalPoint, Monitor, PhysicalRect, SelectionGeometry, SelectionMask, SelectionShape,
    SessionEnvironment,
};

/// Maps a finalized logical shape onto physical pixel coordinates.
///
/// The shape is assigned wholly to the monitor whose logical rectangle
/// contains its centroid; shapes whose centroid lies outside every monitor
/// fall back to the first monitor. This keeps multi-monitor behavior
/// deterministic when a shape spans differently-scaled outputs. The returned
/// bounding box is clamped to the owning monitor's physical bounds, so no
/// out-of-range pixel coordinate can escape this function.
///
/// Fails with [`SelectError::CoordinateMapping`] when the layout data is
/// unusable (no monitors, or a non-positive scale factor).
pub fn map_selection(
    shape: &SelectionShape,
    env: &SessionEnvironment,
) -> SelectResult<SelectionGeometry> {
    if env.monitors.is_empty() {
        return Err(SelectError::CoordinateMapping {
            reason: "session environment has no monitors".to_string(),
        });
    }

    let center = shape_centroid(shape);
    let owner = env
        .monitor_at(center)
        .unwrap_or(&env.monitors[0]);
    if owner.scale <= 0.0 {
        return Err(SelectError::CoordinateMapping {
            reason: format!("monitor {} has non-positive scale {}", owner.name, owner.scale),
        });
    }

    let geometry = match shape {
        SelectionShape::Rectangle { anchor, current } => SelectionGeometry {
            monitor_id: owner.id,
            bounds:     map_box(owner, *anchor, *current),
            mask:       SelectionMask::None,
        },
        SelectionShape::Ellipse { anchor, current } => SelectionGeometry {
            monitor_id: owner.id,
            bounds:     map_box(owner, *anchor, *current),
            mask:       SelectionMask::Ellipse,
        },
        SelectionShape::Freeform(points) => {
            let mapped: Vec<(f64, f64)> =
                points.iter().map(|p| map_point(owner, *p)).collect();
            let bounds = bounds_of(owner, &mapped);
            let local = mapped
                .into_iter()
                .map(|(x, y)| (x - bounds.x as f64, y - bounds.y as f64))
                .collect();
            SelectionGeometry {
                monitor_id: owner.id,
                bounds,
                mask: SelectionMask::Polygon(local),
            }
        }
    };

    tracing::debug!(
        monitor = owner.id,
        bounds = ?geometry.bounds,
        "mapped selection to physical coordinates"
    );
    Ok(geometry)
}

/// Scales a logical point into global physical coordinates on `monitor`
fn map_point(monitor: &Monitor, point: LogicalPoint) -> (f64, f64) {
    (
        (point.x - monitor.logical.x) * monitor.scale + monitor.physical.x as f64,
        (point.y - monitor.logical.y) * monitor.scale + monitor.physical.y as f64,
    )
}

/// Maps and clamps the box spanned by two logical corners
fn map_box(monitor: &Monitor, a: LogicalPoint, b: LogicalPoint) -> PhysicalRect {
    let (ax, ay) = map_point(monitor, a);
    let (bx, by) = map_point(monitor, b);
    let points = [(ax.min(bx), ay.min(by)), (ax.max(bx), ay.max(by))];
    bounds_of(monitor, &points)
}

/// Clamped integer bounding box of mapped points on `monitor`
fn bounds_of(monitor: &Monitor, points: &[(f64, f64)]) -> PhysicalRect {
    let phys = monitor.physical;
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(x, y) in points {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    let x1 = (min_x.round() as i32).clamp(phys.x, phys.right());
    let y1 = (min_y.round() as i32).clamp(phys.y, phys.bottom());
    let x2 = (max_x.round() as i32).clamp(phys.x, phys.right());
    let y2 = (max_y.round() as i32).clamp(phys.y, phys.bottom());

    PhysicalRect::new(x1, y1, (x2 - x1).max(0) as u32, (y2 - y1).max(0) as u32)
}

/// Centroid of a finalized shape, used to pick the owning monitor
pub fn shape_centroid(shape: &SelectionShape) -> LogicalPoint {
    match shape {
        SelectionShape::Freeform(points) => centroid(points),
        SelectionShape::Rectangle { anchor, current }
        | SelectionShape::Ellipse { anchor, current } => LogicalPoint::new(
            (anchor.x + current.x) / 2.0,
            (anchor.y + current.y) / 2.0,
        ),
    }
}

/// Arithmetic mean of a point sequence
pub fn centroid(points: &[LogicalPoint]) -> LogicalPoint {
    if points.is_empty() {
        return LogicalPoint::new(0.0, 0.0);
    }
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    LogicalPoint::new(sx / points.len() as f64, sy / points.len() as f64)
}

/// Absolute polygon area via the shoelace formula
pub fn polygon_area(points: &[LogicalPoint]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum.abs() / 2.0
}

/// Even-odd point-in-polygon test
///
/// # Examples
///
/// ```
/// use lasso_core::geometry::point_in_polygon;
///
/// let triangle = [(0.0, 0.0), (10.0, 0.0), (5.0, 10.0)];
/// assert!(point_in_polygon(5.0, 3.0, &triangle));
/// assert!(!point_in_polygon(0.0, 9.0, &triangle));
/// ```
pub fn point_in_polygon(x: f64, y: f64, polygon: &[(f64, f64)]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (xi, yi) = polygon[i];
        let (xj, yj) = polygon[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Whether a point lies inside the ellipse inscribed in the box
/// `[0, width] x [0, height]`
pub fn point_in_ellipse(x: f64, y: f64, width: f64, height: f64) -> bool {
    if width <= 0.0 || height <= 0.0 {
        return false;
    }
    let rx = width / 2.0;
    let ry = height / 2.0;
    let dx = (x - rx) / rx;
    let dy = (y - ry) / ry;
    dx * dx + dy * dy <= 1.0
}

/// Douglas-Peucker path simplification.
///
/// Keeps endpoints, drops intermediate points closer than `tolerance` to the
/// simplified path. Used to bound freeform polygon size at finalize time.
pub fn simplify_path(points: &[LogicalPoint], tolerance: f64) -> Vec<LogicalPoint> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;
    simplify_segment(points, 0, points.len() - 1, tolerance, &mut keep);
    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

fn simplify_segment(
    points: &[LogicalPoint],
    first: usize,
    last: usize,
    tolerance: f64,
    keep: &mut [bool],
) {
    if last <= first + 1 {
        return;
    }
    let mut max_dist = 0.0;
    let mut max_idx = first;
    for i in (first + 1)..last {
        let dist = perpendicular_distance(points[i], points[first], points[last]);
        if dist > max_dist {
            max_dist = dist;
            max_idx = i;
        }
    }
    if max_dist > tolerance {
        keep[max_idx] = true;
        simplify_segment(points, first, max_idx, tolerance, keep);
        simplify_segment(points, max_idx, last, tolerance, keep);
    }
}

fn perpendicular_distance(point: LogicalPoint, a: LogicalPoint, b: LogicalPoint) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return point.distance(&a);
    }
    ((dy * point.x - dx * point.y + b.x * a.y - b.y * a.x) / len).abs()
}
