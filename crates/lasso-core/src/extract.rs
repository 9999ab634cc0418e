//! Selection extraction
//!
//! Turns a captured frame plus finalized geometry into the output buffer:
//! a direct crop for rectangles, an alpha-masked crop for freeform and
//! ellipse selections. Masking samples each pixel at its center with the
//! standard point-in-shape tests from [`crate::geometry`].

use image::RgbaImage;

use crate::capture::RawFrame;
use crate::error::{SelectError, SelectResult};
use crate::geometry::{point_in_ellipse, point_in_polygon};
use crate::model::{ExtractedSelection, SelectionGeometry, SelectionMask};

/// Post-processing options for extraction
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// Gaussian feather radius for the alpha edge, in pixels. Zero disables.
    pub feather:       f32,
    /// Downscale the result so neither side exceeds this, preserving aspect
    /// ratio. `None` keeps the native size.
    pub max_dimension: Option<u32>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            feather:       0.0,
            max_dimension: None,
        }
    }
}

/// Extracts the selected pixels from `frame`.
///
/// Consumes the frame: after extraction only the output buffer remains.
/// Fails with [`SelectError::EmptySelection`] when the selection encloses no
/// visible pixel; an all-transparent result is invalid output.
pub fn extract(
    frame: RawFrame,
    geometry: &SelectionGeometry,
) -> SelectResult<ExtractedSelection> {
    extract_with(frame, geometry, ExtractOptions::default())
}

/// [`extract`] with explicit post-processing options
pub fn extract_with(
    frame: RawFrame,
    geometry: &SelectionGeometry,
    opts: ExtractOptions,
) -> SelectResult<ExtractedSelection> {
    if geometry.bounds.is_empty() {
        return Err(SelectError::EmptySelection);
    }

    let cropped = frame.crop(geometry.bounds)?;
    // Mask coordinates are local to the requested bounds; if the crop was
    // clamped against the frame edge, shift the sampling window accordingly.
    let offset_x = (cropped.area().x - geometry.bounds.x) as f64;
    let offset_y = (cropped.area().y - geometry.bounds.y) as f64;
    let mut image = cropped.into_image();

    match &geometry.mask {
        SelectionMask::None => {}
        SelectionMask::Polygon(polygon) => {
            apply_mask(&mut image, |x, y| {
                point_in_polygon(x + offset_x, y + offset_y, polygon)
            });
        }
        SelectionMask::Ellipse => {
            let width = geometry.bounds.width as f64;
            let height = geometry.bounds.height as f64;
            apply_mask(&mut image, |x, y| {
                point_in_ellipse(x + offset_x, y + offset_y, width, height)
            });
        }
    }

    if !image.pixels().any(|p| p[3] != 0) {
        return Err(SelectError::EmptySelection);
    }

    if opts.feather > 0.0 {
        feather_alpha(&mut image, opts.feather);
    }
    if let Some(limit) = opts.max_dimension {
        image = shrink_to_limit(image, limit);
    }

    Ok(ExtractedSelection {
        image,
        monitor_id: geometry.monitor_id,
    })
}

/// Zeroes the alpha of every pixel whose center fails `inside`
fn apply_mask<F>(image: &mut RgbaImage, inside: F)
where
    F: Fn(f64, f64) -> bool,
{
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        if !inside(x as f64 + 0.5, y as f64 + 0.5) {
            pixel[3] = 0;
        }
    }
}

/// Softens the alpha edge with a Gaussian blur of the alpha channel only.
/// Color channels are untouched.
fn feather_alpha(image: &mut RgbaImage, sigma: f32) {
    let alpha = image::GrayImage::from_fn(image.width(), image.height(), |x, y| {
        image::Luma([image.get_pixel(x, y)[3]])
    });
    let blurred = image::imageops::blur(&alpha, sigma);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        // Feathering only softens: never raise alpha on masked-out pixels
        pixel[3] = pixel[3].min(blurred.get_pixel(x, y)[0]);
    }
}

/// Lanczos downscale so neither dimension exceeds `limit`
fn shrink_to_limit(image: RgbaImage, limit: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width <= limit && height <= limit {
        return image;
    }
    let ratio = (limit as f64 / width as f64).min(limit as f64 / height as f64);
    let new_width = ((width as f64 * ratio) as u32).max(1);
    let new_height = ((height as f64 * ratio) as u32).max(1);
    image::imageops::resize(
        &image,
        new_width,
        new_height,
        image::imageops::FilterType::Lanczos3,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PhysicalRect;

    fn frame_100() -> RawFrame {
        RawFrame::from_test_pattern(PhysicalRect::new(0, 0, 100, 100))
    }

    fn rect_geometry(bounds: PhysicalRect) -> SelectionGeometry {
        SelectionGeometry {
            monitor_id: 0,
            bounds,
            mask: SelectionMask::None,
        }
    }

    #[test]
    fn test_rectangle_extraction_is_opaque() {
        let geometry = rect_geometry(PhysicalRect::new(10, 10, 40, 30));
        let selection = extract(frame_100(), &geometry).unwrap();

        assert_eq!((selection.width(), selection.height()), (40, 30));
        assert!(selection.image.pixels().all(|p| p[3] == 255));
        assert_eq!(selection.monitor_id, 0);
    }

    #[test]
    fn test_ellipse_extraction_corner_and_center() {
        let geometry = SelectionGeometry {
            monitor_id: 0,
            bounds:     PhysicalRect::new(0, 0, 20, 10),
            mask:       SelectionMask::Ellipse,
        };
        let selection = extract(frame_100(), &geometry).unwrap();

        assert_eq!((selection.width(), selection.height()), (20, 10));
        // Corner pixel is outside the inscribed ellipse, center is inside
        assert_eq!(selection.image.get_pixel(0, 0)[3], 0);
        assert_eq!(selection.image.get_pixel(10, 5)[3], 255);
    }

    #[test]
    fn test_polygon_extraction_masks_outside() {
        // Triangle covering the left half of a 20x20 box
        let geometry = SelectionGeometry {
            monitor_id: 0,
            bounds:     PhysicalRect::new(0, 0, 20, 20),
            mask:       SelectionMask::Polygon(vec![
                (0.0, 0.0),
                (20.0, 0.0),
                (0.0, 20.0),
            ]),
        };
        let selection = extract(frame_100(), &geometry).unwrap();

        assert_eq!(selection.image.get_pixel(2, 2)[3], 255);
        assert_eq!(selection.image.get_pixel(19, 19)[3], 0);
    }

    #[test]
    fn test_empty_bounds_rejected() {
        let geometry = rect_geometry(PhysicalRect::new(10, 10, 0, 0));
        assert!(matches!(
            extract(frame_100(), &geometry),
            Err(SelectError::EmptySelection)
        ));
    }

    #[test]
    fn test_bounds_outside_frame_rejected() {
        let geometry = rect_geometry(PhysicalRect::new(500, 500, 10, 10));
        assert!(matches!(
            extract(frame_100(), &geometry),
            Err(SelectError::EmptySelection)
        ));
    }

    #[test]
    fn test_all_transparent_result_rejected() {
        // A polygon with no interior at pixel centers
        let geometry = SelectionGeometry {
            monitor_id: 0,
            bounds:     PhysicalRect::new(0, 0, 10, 10),
            mask:       SelectionMask::Polygon(vec![
                (0.0, 0.0),
                (0.2, 0.0),
                (0.0, 0.2),
            ]),
        };
        assert!(matches!(
            extract(frame_100(), &geometry),
            Err(SelectError::EmptySelection)
        ));
    }

    #[test]
    fn test_offset_frame_extraction() {
        // A live re-capture frame starting away from the global origin
        let frame = RawFrame::from_test_pattern(PhysicalRect::new(200, 100, 60, 60));
        let geometry = rect_geometry(PhysicalRect::new(210, 110, 20, 20));
        let selection = extract(frame, &geometry).unwrap();
        assert_eq!((selection.width(), selection.height()), (20, 20));
    }

    #[test]
    fn test_feather_softens_edge() {
        let geometry = SelectionGeometry {
            monitor_id: 0,
            bounds:     PhysicalRect::new(0, 0, 21, 21),
            mask:       SelectionMask::Ellipse,
        };
        let opts = ExtractOptions {
            feather: 2.0,
            ..Default::default()
        };
        let selection = extract_with(frame_100(), &geometry, opts).unwrap();

        // Center stays (nearly) opaque, corner stays transparent, and some
        // edge pixel now carries partial alpha
        assert!(selection.image.get_pixel(10, 10)[3] > 200);
        assert_eq!(selection.image.get_pixel(0, 0)[3], 0);
        let has_partial = selection
            .image
            .pixels()
            .any(|p| p[3] > 0 && p[3] < 255);
        assert!(has_partial);
    }

    #[test]
    fn test_max_dimension_downscales() {
        let frame = RawFrame::from_test_pattern(PhysicalRect::new(0, 0, 400, 200));
        let geometry = rect_geometry(PhysicalRect::new(0, 0, 400, 200));
        let opts = ExtractOptions {
            max_dimension: Some(100),
            ..Default::default()
        };
        let selection = extract_with(frame, &geometry, opts).unwrap();
        assert_eq!((selection.width(), selection.height()), (100, 50));
    }
}
