//! Pixel-to-clip-space mapping for paint draws, and display sizing.
//!
//! The GL vertex shader and the CPU rasterizer both go through the values
//! computed here, so the two backends place triangles identically.

/// The host display: logical size plus device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySize {
    /// Logical width.
    pub width: f32,
    /// Logical height.
    pub height: f32,
    /// Physical pixels per logical pixel.
    pub device_pixel_ratio: f32,
}

impl DisplaySize {
    /// A display whose logical pixels are physical pixels.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        #[expect(clippy::cast_precision_loss)]
        let (width, height) = (width as f32, height as f32);
        Self {
            width,
            height,
            device_pixel_ratio: 1.0,
        }
    }

    /// Builder-style device pixel ratio.
    #[must_use]
    pub fn with_device_pixel_ratio(mut self, ratio: f32) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    /// Physical pixel size, truncated toward zero. Negative or NaN sizes
    /// collapse to zero.
    #[must_use]
    pub fn pixel_size(&self) -> [u32; 2] {
        #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let physical = |logical: f32| (logical * self.device_pixel_ratio).max(0.0) as u32;
        [physical(self.width), physical(self.height)]
    }
}

/// Column-major 3×3 matrix taking `[0, w] × [0, h]` pixels (y down) to
/// `[-1, 1]²` clip space (y up).
#[must_use]
pub fn pixel_matrix([width, height]: [u32; 2]) -> [f32; 9] {
    #[expect(clippy::cast_precision_loss)]
    let (w, h) = (width as f32, height as f32);
    [2.0 / w, 0.0, 0.0, 0.0, -2.0 / h, 0.0, -1.0, 1.0, 1.0]
}

/// Per-axis scale applied after [`pixel_matrix`], picked from the display's
/// aspect ratio so accumulated shapes look right once the accumulator is
/// stretched over the display.
///
/// A wide display squashes x by `h / w`; a tall one squashes y by `w / h`.
/// Square and empty displays leave both axes alone.
#[must_use]
pub fn aspect_scale([width, height]: [u32; 2]) -> [f32; 2] {
    if width == 0 || height == 0 {
        return [1.0, 1.0];
    }
    #[expect(clippy::cast_precision_loss)]
    let aspect = height as f32 / width as f32;
    if aspect < 1.0 {
        [aspect, 1.0]
    } else {
        [1.0, 1.0 / aspect]
    }
}

/// Map a pixel-space point to clip space, matching the paint vertex shader.
#[must_use]
pub fn project(matrix: &[f32; 9], scale: [f32; 2], [x, y]: [f32; 2]) -> [f32; 2] {
    let cx = matrix[0] * x + matrix[3] * y + matrix[6];
    let cy = matrix[1] * x + matrix[4] * y + matrix[7];
    [cx * scale[0], cy * scale[1]]
}
