//! Data models and type definitions for the capture/selection pipeline
//!
//! This module defines the core types used throughout the crate:
//! - Session environment and compositor detection types
//! - Capture mode resolution types
//! - Selection shapes and finalized geometry
//! - The extracted output buffer handed to downstream consumers

use serde::{Deserialize, Serialize};

/// Identity of the running compositor, as far as it can be determined
/// from the ambient session environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compositor {
    /// Hyprland (wlroots family)
    Hyprland,
    /// Sway (wlroots family)
    Sway,
    /// GNOME Shell / Mutter
    Gnome,
    /// KDE Plasma / KWin
    Kde,
    /// Anything else, including sessions we cannot identify
    Unknown,
}

impl Compositor {
    /// Returns the compositor identity as a lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            Compositor::Hyprland => "hyprland",
            Compositor::Sway => "sway",
            Compositor::Gnome => "gnome",
            Compositor::Kde => "kde",
            Compositor::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A screenshot mechanism the current session can use.
///
/// The set is closed: one concrete capture strategy exists per variant, and
/// the variant for a session is chosen once, at detection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// wlroots screencopy via the `grim` tool (Hyprland, Sway, ...)
    WlrScreencopy,
    /// KDE Plasma via the `spectacle` tool
    KdeSpectacle,
    /// GNOME Shell's D-Bus screenshot API via `gdbus`
    GnomeShell,
}

impl BackendKind {
    /// Returns the backend kind as a kebab-case string
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::WlrScreencopy => "wlr-screencopy",
            BackendKind::KdeSpectacle => "kde-spectacle",
            BackendKind::GnomeShell => "gnome-shell",
        }
    }

    /// Name of the external executable this backend invokes
    pub fn tool(&self) -> &'static str {
        match self {
            BackendKind::WlrScreencopy => "grim",
            BackendKind::KdeSpectacle => "spectacle",
            BackendKind::GnomeShell => "gdbus",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A point in overlay-logical coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalPoint {
    pub x: f64,
    pub y: f64,
}

impl LogicalPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &LogicalPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// An axis-aligned rectangle in overlay-logical coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalRect {
    pub x:      f64,
    pub y:      f64,
    pub width:  f64,
    pub height: f64,
}

impl LogicalRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle contains the given point (inclusive of the
    /// top/left edge, exclusive of the bottom/right edge)
    pub fn contains(&self, point: LogicalPoint) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// An axis-aligned rectangle in physical pixel coordinates.
///
/// The origin may be negative in multi-monitor layouts where an output sits
/// left of or above the primary output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalRect {
    pub x:      i32,
    pub y:      i32,
    pub width:  u32,
    pub height: u32,
}

impl PhysicalRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersection with another rectangle, or `None` when disjoint
    pub fn intersect(&self, other: &PhysicalRect) -> Option<PhysicalRect> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(PhysicalRect::new(x1, y1, (x2 - x1) as u32, (y2 - y1) as u32))
    }

    /// Smallest rectangle covering both `self` and `other`
    pub fn union(&self, other: &PhysicalRect) -> PhysicalRect {
        let x1 = self.x.min(other.x);
        let y1 = self.y.min(other.y);
        let x2 = self.right().max(other.right());
        let y2 = self.bottom().max(other.bottom());
        PhysicalRect::new(x1, y1, (x2 - x1) as u32, (y2 - y1) as u32)
    }
}

/// One output in the session's display layout.
///
/// `logical` is the monitor's rectangle in the shared overlay coordinate
/// space; `physical` is its pixel rectangle in the global physical space.
/// Under fractional scaling the two differ by `scale` on each axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monitor {
    pub id:       u32,
    pub name:     String,
    pub scale:    f64,
    pub logical:  LogicalRect,
    pub physical: PhysicalRect,
}

impl Monitor {
    /// Fallback monitor used when the layout cannot be queried.
    ///
    /// A single 1920x1080 output at the origin with no scaling. Detection
    /// never fails, so sessions on unknown compositors draw against this.
    pub fn fallback() -> Self {
        Self {
            id:       0,
            name:     "unknown-0".to_string(),
            scale:    1.0,
            logical:  LogicalRect::new(0.0, 0.0, 1920.0, 1080.0),
            physical: PhysicalRect::new(0, 0, 1920, 1080),
        }
    }
}

/// Immutable snapshot of the session's capture-relevant environment.
///
/// Captured once at startup by [`crate::detect::detect`] and never mutated
/// afterwards. All mode and backend decisions read from this snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEnvironment {
    /// Detected compositor identity
    pub compositor:  Compositor,
    /// Available capture backends in preference order (first wins)
    pub backends:    Vec<BackendKind>,
    /// Whether a layer-shell overlay surface can be created
    pub layer_shell: bool,
    /// Display layout, one entry per output
    pub monitors:    Vec<Monitor>,
}

impl SessionEnvironment {
    /// The backend a session should use: first entry of the preference list
    pub fn preferred_backend(&self) -> Option<BackendKind> {
        self.backends.first().copied()
    }

    /// The monitor whose logical rectangle contains `point`, if any
    pub fn monitor_at(&self, point: LogicalPoint) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.logical.contains(point))
    }

    /// Bounding rectangle of the whole virtual display in physical pixels
    pub fn virtual_bounds(&self) -> PhysicalRect {
        let mut iter = self.monitors.iter();
        let first = match iter.next() {
            Some(m) => m.physical,
            None => return PhysicalRect::new(0, 0, 0, 0),
        };
        iter.fold(first, |acc, m| acc.union(&m.physical))
    }
}

/// Capture mode requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Selection drawn over a frozen, pre-captured screenshot
    Static,
    /// Selection drawn over a transparent layer-shell surface
    Live,
}

impl std::fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureMode::Static => write!(f, "static"),
            CaptureMode::Live => write!(f, "live"),
        }
    }
}

/// The mode a session actually runs in, as resolved by
/// [`crate::mode::ModeController`].
///
/// `fell_back` records a Live -> Static downgrade so the surrounding UI can
/// notify the user; the core never formats that notification itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveMode {
    pub mode:      CaptureMode,
    pub fell_back: bool,
}

/// The in-progress selection, in overlay-logical coordinates.
///
/// Mutated only by [`crate::selection::SelectionEngine`] while a drag is
/// active; frozen on pointer-release.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionShape {
    /// Hand-drawn polygon; holds at least one point while drawing
    Freeform(Vec<LogicalPoint>),
    /// Axis-aligned box spanned by two opposite corners
    Rectangle {
        anchor:  LogicalPoint,
        current: LogicalPoint,
    },
    /// Ellipse inscribed in the box spanned by anchor/current
    Ellipse {
        anchor:  LogicalPoint,
        current: LogicalPoint,
    },
}

/// Mask applied during extraction, in coordinates local to the selection's
/// physical bounding box.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionMask {
    /// Axis-aligned rectangle: no masking needed
    None,
    /// Closed polygon; pixels outside it become fully transparent
    Polygon(Vec<(f64, f64)>),
    /// Ellipse inscribed in the bounding box
    Ellipse,
}

/// Finalized, coordinate-mapped selection.
///
/// Derived data: produced once by [`crate::geometry::map_selection`] and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionGeometry {
    /// Id of the monitor the selection belongs to
    pub monitor_id: u32,
    /// Bounding box in global physical pixels, clamped to the monitor
    pub bounds:     PhysicalRect,
    /// Mask description in bounds-local coordinates
    pub mask:       SelectionMask,
}

/// Final pixel buffer emitted to downstream consumers.
///
/// Out-of-shape pixels carry zero alpha for freeform/ellipse selections;
/// rectangle selections are fully opaque. Ownership moves to the consumer on
/// handoff; the pipeline retains no reference afterwards.
#[derive(Debug, Clone)]
pub struct ExtractedSelection {
    /// RGBA pixels sized to the selection's bounding box
    pub image:      image::RgbaImage,
    /// Id of the monitor the selection was taken from
    pub monitor_id: u32,
}

impl ExtractedSelection {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
