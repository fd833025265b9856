//! Software reference backend.
//!
//! Rasterizes paint batches into an `f32` RGBA image with the same blend
//! equations, projection and sampling the GL backend uses. Handy for
//! headless rendering, preview capture and tests.
//!
//! Both images are stored top row first. Pixel centers sit at half-integer
//! coordinates and shared triangle edges follow the top-left rule, so the
//! two triangles of a quad never blend the same pixel twice.

use std::path::Path;

use image::{Rgba32FImage, RgbaImage};
use lyon::math::{point, Box2D};

use crate::backend::PaintBackend;
use crate::batch::TriangleBatch;
use crate::config::RenderSettings;
use crate::error::Result;
use crate::projection::{self, DisplaySize};
use crate::types::{PaintVertex, Rgba};

/// CPU implementation of [`PaintBackend`].
pub struct CpuBackend {
    /// Persistent float accumulator.
    accumulator: Rgba32FImage,
    /// What the display currently shows.
    visible: RgbaImage,
    /// Shared clear color for the accumulator's initial clear and every
    /// composite.
    clear_color: Rgba,
}

impl CpuBackend {
    /// Allocate the accumulator and clear it once to the configured color.
    #[must_use]
    pub fn new(settings: &RenderSettings) -> Self {
        let accumulator = Rgba32FImage::from_pixel(
            settings.width,
            settings.height,
            image::Rgba(settings.clear_color),
        );
        tracing::debug!(
            width = settings.width,
            height = settings.height,
            "cpu accumulator cleared"
        );
        Self {
            accumulator,
            visible: RgbaImage::new(0, 0),
            clear_color: settings.clear_color,
        }
    }

    /// The accumulated paint.
    #[must_use]
    pub fn accumulator(&self) -> &Rgba32FImage {
        &self.accumulator
    }

    /// The last composited frame.
    #[must_use]
    pub fn visible(&self) -> &RgbaImage {
        &self.visible
    }

    /// Accumulator texel at `(x, y)`, top row first.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[must_use]
    pub fn texel(&self, x: u32, y: u32) -> Rgba {
        self.accumulator.get_pixel(x, y).0
    }

    /// Write the visible surface as a PNG (or any format `image` infers from
    /// the extension).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`](crate::Error::Image) if encoding or writing
    /// fails.
    pub fn save_visible(&self, path: impl AsRef<Path>) -> Result<()> {
        self.visible.save(path)?;
        Ok(())
    }

    /// Rasterize one triangle given in clip space.
    #[allow(clippy::float_cmp)]
    fn fill_triangle(&mut self, clip: [[f32; 2]; 3], colors: [Rgba; 3]) {
        let (width, height) = self.accumulator.dimensions();
        #[expect(clippy::cast_precision_loss)]
        let (w, h) = (width as f32, height as f32);
        let to_pixels = |[x, y]: [f32; 2]| point((x + 1.0) * 0.5 * w, (1.0 - y) * 0.5 * h);

        let a = (to_pixels(clip[0]), colors[0]);
        let mut b = (to_pixels(clip[1]), colors[1]);
        let mut c = (to_pixels(clip[2]), colors[2]);
        if [a.0, b.0, c.0].iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return;
        }

        let mut area = edge(a.0, b.0, c.0);
        if area == 0.0 {
            return;
        }
        if area < 0.0 {
            std::mem::swap(&mut b, &mut c);
            area = -area;
        }
        let flat = a.1 == b.1 && b.1 == c.1;

        let bounds = Box2D::from_points([a.0, b.0, c.0]);
        #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (x0, y0, x1, y1) = (
            bounds.min.x.floor().max(0.0) as u32,
            bounds.min.y.floor().max(0.0) as u32,
            bounds.max.x.ceil().min(w) as u32,
            bounds.max.y.ceil().min(h) as u32,
        );

        let bias = [
            top_left(b.0, c.0),
            top_left(c.0, a.0),
            top_left(a.0, b.0),
        ];

        for py in y0..y1 {
            for px in x0..x1 {
                #[expect(clippy::cast_precision_loss)]
                let p = point(px as f32 + 0.5, py as f32 + 0.5);
                let weights = [edge(b.0, c.0, p), edge(c.0, a.0, p), edge(a.0, b.0, p)];
                let inside = weights
                    .iter()
                    .zip(bias)
                    .all(|(&wt, owns_edge)| wt > 0.0 || (wt == 0.0 && owns_edge));
                if !inside {
                    continue;
                }

                let mut src = a.1;
                if !flat {
                    for (channel, out) in src.iter_mut().enumerate() {
                        *out = (weights[0] * a.1[channel]
                            + weights[1] * b.1[channel]
                            + weights[2] * c.1[channel])
                            / area;
                    }
                }
                let dst = self.accumulator.get_pixel_mut(px, py);
                dst.0 = blend_over(dst.0, src);
            }
        }
    }

    /// Bilinear, clamp-to-edge sample of the accumulator. `u` runs left to
    /// right, `v` top to bottom.
    fn sample(&self, u: f32, v: f32) -> Rgba {
        let (width, height) = self.accumulator.dimensions();
        #[expect(clippy::cast_precision_loss)]
        let (x, y) = (u * width as f32 - 0.5, v * height as f32 - 0.5);
        let (fx, fy) = (x - x.floor(), y - y.floor());

        let texel = |ix: f32, iy: f32| -> Rgba {
            #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let (cx, cy) = (
                (ix.max(0.0) as u32).min(width - 1),
                (iy.max(0.0) as u32).min(height - 1),
            );
            self.accumulator.get_pixel(cx, cy).0
        };

        let top = lerp(texel(x.floor(), y.floor()), texel(x.floor() + 1.0, y.floor()), fx);
        let bottom = lerp(
            texel(x.floor(), y.floor() + 1.0),
            texel(x.floor() + 1.0, y.floor() + 1.0),
            fx,
        );
        lerp(top, bottom, fy)
    }
}

impl PaintBackend for CpuBackend {
    fn accumulate(&mut self, batch: &TriangleBatch, display: DisplaySize) -> Result<()> {
        let matrix = projection::pixel_matrix(self.accumulator.dimensions().into());
        let scale = projection::aspect_scale(display.pixel_size());
        let clip = |v: &PaintVertex| projection::project(&matrix, scale, v.position);

        for [a, b, c] in batch.triangles() {
            self.fill_triangle([clip(&a), clip(&b), clip(&c)], [a.color, b.color, c.color]);
        }
        Ok(())
    }

    fn composite(&mut self, display: DisplaySize) -> Result<()> {
        let [width, height] = display.pixel_size();
        if self.visible.dimensions() != (width, height) {
            tracing::debug!(width, height, "resizing visible surface");
            self.visible = RgbaImage::new(width, height);
        }

        let clear = image::Rgba(self.clear_color.map(quantize));
        for pixel in self.visible.pixels_mut() {
            *pixel = clear;
        }

        let (aw, ah) = self.accumulator.dimensions();
        if aw == 0 || ah == 0 {
            return Ok(());
        }

        #[expect(clippy::cast_precision_loss)]
        let (w, h) = (width as f32, height as f32);
        for y in 0..height {
            for x in 0..width {
                #[expect(clippy::cast_precision_loss)]
                let (u, v) = ((x as f32 + 0.5) / w, (y as f32 + 0.5) / h);
                let src = self.sample(u, v);
                let pixel = self.visible.get_pixel_mut(x, y);
                let dst = pixel.0.map(|c| f32::from(c) / 255.0);
                pixel.0 = blend_over(dst, src).map(quantize);
            }
        }
        Ok(())
    }
}

/// Twice the signed area of `(a, b, p)`; positive when `p` lies on the
/// interior side of a positively wound edge `a → b` (y down).
fn edge(a: lyon::math::Point, b: lyon::math::Point, p: lyon::math::Point) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Whether samples exactly on edge `a → b` belong to this triangle.
#[allow(clippy::float_cmp)]
fn top_left(a: lyon::math::Point, b: lyon::math::Point) -> bool {
    let d = b - a;
    (d.y == 0.0 && d.x > 0.0) || d.y < 0.0
}

/// Straight-alpha source-over with a separate alpha equation:
/// `rgb = src·a + dst·(1 − a)`, `alpha = a + dst·(1 − a)`.
pub(crate) fn blend_over(dst: Rgba, src: Rgba) -> Rgba {
    let a = src[3];
    let inv = 1.0 - a;
    [
        src[0] * a + dst[0] * inv,
        src[1] * a + dst[1] * inv,
        src[2] * a + dst[2] * inv,
        a + dst[3] * inv,
    ]
}

fn lerp(a: Rgba, b: Rgba, t: f32) -> Rgba {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}

fn quantize(c: f32) -> u8 {
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let byte = (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    byte
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::triangulate::Polygon;

    const GRAY: f32 = 0.4;

    fn settings(width: u32, height: u32) -> RenderSettings {
        RenderSettings {
            width,
            height,
            ..RenderSettings::default()
        }
    }

    fn square(x0: f32, y0: f32, x1: f32, y1: f32) -> Polygon {
        Polygon::from_coords(&[[x0, y0], [x1, y0], [x1, y1], [x0, y1]])
    }

    fn draw(backend: &mut CpuBackend, polygon: &Polygon, color: Rgba) {
        let batch = TriangleBatch::from_polygons(std::slice::from_ref(polygon), color);
        let (w, h) = backend.accumulator().dimensions();
        backend.accumulate(&batch, DisplaySize::new(w, h)).unwrap();
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!((actual - expected).abs() < 1e-5, "expected {expected}, got {actual}");
    }

    #[test]
    fn starts_cleared_to_opaque_gray() {
        let backend = CpuBackend::new(&settings(8, 8));
        assert_eq!(backend.texel(0, 0), [GRAY, GRAY, GRAY, 1.0]);
        assert_eq!(backend.texel(7, 7), [GRAY, GRAY, GRAY, 1.0]);
    }

    #[test]
    fn blend_keeps_opaque_alpha_opaque() {
        let out = blend_over([GRAY, GRAY, GRAY, 1.0], [1.0, 0.0, 0.0, 0.1]);
        assert_close(out[0], 0.1 + GRAY * 0.9);
        assert_close(out[1], GRAY * 0.9);
        assert_close(out[3], 1.0);
    }

    #[test]
    fn blend_saturates_alpha_from_transparent() {
        let mut dst = [0.0; 4];
        for _ in 0..50 {
            dst = blend_over(dst, [1.0, 1.0, 1.0, 0.2]);
        }
        assert!(dst[3] > 0.99 && dst[3] <= 1.0);
    }

    #[test]
    fn quad_covers_exactly_its_pixels_once() {
        let mut backend = CpuBackend::new(&settings(16, 16));
        draw(&mut backend, &square(4.0, 4.0, 12.0, 12.0), [1.0, 0.0, 0.0, 0.5]);

        let inside = 0.5 + GRAY * 0.5;
        for y in 0..16 {
            for x in 0..16 {
                let r = backend.texel(x, y)[0];
                if (4..12).contains(&x) && (4..12).contains(&y) {
                    // Blending twice along the diagonal would give 0.5 + inside * 0.5.
                    assert_close(r, inside);
                } else {
                    assert_close(r, GRAY);
                }
            }
        }
    }

    #[test]
    fn accumulation_is_cumulative() {
        let mut backend = CpuBackend::new(&settings(16, 16));
        let red = |alpha| [1.0, 0.0, 0.0, alpha];
        draw(&mut backend, &square(2.0, 2.0, 10.0, 10.0), red(0.1));
        let once = backend.texel(6, 6)[0];
        draw(&mut backend, &square(4.0, 4.0, 12.0, 12.0), red(0.102));
        let twice = backend.texel(6, 6)[0];

        let second_alone = 0.102 + GRAY * (1.0 - 0.102);
        assert!(twice > once);
        assert!(twice > second_alone);
        // Outside the overlap only the second quad landed.
        assert_close(backend.texel(11, 11)[0], second_alone);
    }

    #[test]
    fn y_axis_points_down_in_pixel_space() {
        let mut backend = CpuBackend::new(&settings(10, 10));
        draw(&mut backend, &square(0.0, 0.0, 10.0, 2.0), [0.0, 1.0, 0.0, 1.0]);
        assert_close(backend.texel(5, 0)[1], 1.0);
        assert_close(backend.texel(5, 9)[1], GRAY);
    }

    #[test]
    fn wide_display_squashes_x() {
        let mut backend = CpuBackend::new(&settings(10, 10));
        let batch = TriangleBatch::from_polygons(
            &[square(0.0, 0.0, 10.0, 10.0)],
            [0.0, 0.0, 1.0, 1.0],
        );
        backend.accumulate(&batch, DisplaySize::new(20, 10)).unwrap();
        // x is halved around the center: columns 2.5..7.5 are covered.
        assert_close(backend.texel(1, 5)[2], GRAY);
        assert_close(backend.texel(5, 5)[2], 1.0);
        assert_close(backend.texel(8, 5)[2], GRAY);
    }

    #[test]
    fn offscreen_triangles_are_clipped() {
        let mut backend = CpuBackend::new(&settings(8, 8));
        draw(&mut backend, &square(-50.0, -50.0, 100.0, 100.0), [1.0, 1.0, 1.0, 1.0]);
        for [x, y] in [[0, 0], [7, 7], [3, 5]] {
            for channel in backend.texel(x, y) {
                assert_close(channel, 1.0);
            }
        }
    }

    #[test]
    fn composite_resizes_and_copies() {
        let mut backend = CpuBackend::new(&settings(4, 4));
        draw(&mut backend, &square(0.0, 0.0, 4.0, 4.0), [1.0, 0.0, 0.0, 1.0]);

        backend.composite(DisplaySize::new(8, 6)).unwrap();
        assert_eq!(backend.visible().dimensions(), (8, 6));
        assert!(backend.visible().pixels().all(|p| p.0 == [255, 0, 0, 255]));

        backend.composite(DisplaySize::new(3, 3)).unwrap();
        assert_eq!(backend.visible().dimensions(), (3, 3));
    }

    #[test]
    fn composite_of_fresh_accumulator_is_gray() {
        let mut backend = CpuBackend::new(&settings(4, 4));
        backend.composite(DisplaySize::new(5, 5)).unwrap();
        assert!(backend.visible().pixels().all(|p| p.0 == [102, 102, 102, 255]));
    }

    #[test]
    fn composite_filters_linearly() {
        let mut backend = CpuBackend::new(&settings(2, 1));
        let white = square(1.0, 0.0, 2.0, 1.0);
        let batch = TriangleBatch::from_polygons(std::slice::from_ref(&white), [1.0; 4]);
        // A square display leaves clip space unscaled, so the right texel is covered.
        backend.accumulate(&batch, DisplaySize::new(1, 1)).unwrap();
        assert_eq!(backend.texel(1, 0), [1.0; 4]);
        assert_eq!(backend.texel(0, 0), [GRAY, GRAY, GRAY, 1.0]);
        backend.composite(DisplaySize::new(4, 1)).unwrap();
        let reds: Vec<u8> = backend.visible().pixels().map(|p| p.0[0]).collect();
        // Edge pixels clamp, the middle two interpolate between gray and white.
        assert_eq!(reds[0], 102);
        assert_eq!(reds[3], 255);
        assert!(reds[1] > 102 && reds[1] < reds[2] && reds[2] < 255);
    }

    #[test]
    fn zero_sized_display_is_harmless() {
        let mut backend = CpuBackend::new(&settings(4, 4));
        backend.composite(DisplaySize::new(0, 0)).unwrap();
        assert_eq!(backend.visible().dimensions(), (0, 0));
    }
}
