//! Raw frame buffer for captured screen content
//!
//! A [`RawFrame`] pairs a full-resolution RGBA buffer with the physical
//! rectangle of the virtual display space it covers. The frame is owned
//! exclusively by whichever component captured it until it is handed to the
//! extractor, at which point ownership transfers.

use image::RgbaImage;

use crate::error::{SelectError, SelectResult};
use crate::model::PhysicalRect;

/// A captured pixel buffer plus the physical area it covers
#[derive(Debug, Clone)]
pub struct RawFrame {
    image: RgbaImage,
    area:  PhysicalRect,
}

impl RawFrame {
    /// Wraps an RGBA buffer covering `area` of the physical display space.
    ///
    /// The buffer dimensions win over the declared area size when they
    /// disagree (capture tools round fractional-scale regions), so the area
    /// is normalized to the buffer.
    pub fn new(image: RgbaImage, area: PhysicalRect) -> Self {
        let area = PhysicalRect::new(area.x, area.y, image.width(), image.height());
        Self { image, area }
    }

    /// Decodes an encoded image payload (PNG from a capture tool) into a frame
    pub fn decode(bytes: &[u8], area: PhysicalRect) -> SelectResult<Self> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| SelectError::Image(format!("failed to decode capture payload: {e}")))?;
        Ok(Self::new(decoded.to_rgba8(), area))
    }

    /// The physical rectangle this frame covers
    pub fn area(&self) -> PhysicalRect {
        self.area
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Crops out `bounds` (global physical coordinates), returning a new
    /// frame covering exactly the intersection of `bounds` with this frame.
    ///
    /// Fails with [`SelectError::EmptySelection`] when the intersection is
    /// empty: a caller asking for pixels this frame does not cover would
    /// otherwise receive a silently wrong buffer.
    pub fn crop(&self, bounds: PhysicalRect) -> SelectResult<RawFrame> {
        let visible = self
            .area
            .intersect(&bounds)
            .ok_or(SelectError::EmptySelection)?;

        let local_x = (visible.x - self.area.x) as u32;
        let local_y = (visible.y - self.area.y) as u32;
        let cropped = image::imageops::crop_imm(
            &self.image,
            local_x,
            local_y,
            visible.width,
            visible.height,
        )
        .to_image();

        Ok(RawFrame {
            image: cropped,
            area:  visible,
        })
    }

    /// Consumes the frame and returns the pixel buffer
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Generates a fully opaque test pattern frame covering `area`.
    ///
    /// A vertical blue-to-cyan gradient, useful for exercising the pipeline
    /// without a real capture backend.
    pub fn from_test_pattern(area: PhysicalRect) -> Self {
        let image = RgbaImage::from_fn(area.width, area.height, |_x, y| {
            let ratio = y as f32 / area.height.max(1) as f32;
            image::Rgba([0, (255.0 * ratio) as u8, 255, 255])
        });
        Self { image, area }
    }
}
