//! Frame counter and per-frame geometry.

use lyon::math::vector;

use crate::config::AnimationSettings;
use crate::triangulate::Polygon;
use crate::types::Rgba;

/// Time-varying values for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    /// Frame index, starting at 0.
    pub frame: u32,
    /// Rightward offset of the shape, in accumulator pixels.
    pub dx: f32,
    /// Stroke opacity. Grows without bound; see [`AnimationDriver`].
    pub alpha: f32,
}

/// Everything the pipeline needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameGeometry {
    /// The frame's parameters.
    pub params: FrameParams,
    /// Shapes to fill.
    pub polygons: Vec<Polygon>,
    /// Flat fill color shared by every polygon.
    pub color: Rgba,
}

/// Drives the animation one frame per tick until the last frame is drawn.
///
/// Opacity follows `alpha_base * alpha_growth^frame` and is passed through
/// unclamped. With the default constants it would exceed 1.0 around frame
/// 117, well after the run stops at frame 50; longer configured runs log a
/// warning the first time it happens.
#[derive(Debug, Clone)]
pub struct AnimationDriver {
    settings: AnimationSettings,
    frame: u32,
    warned_alpha: bool,
}

impl AnimationDriver {
    /// A driver positioned at frame 0.
    #[must_use]
    pub fn new(settings: AnimationSettings) -> Self {
        Self {
            settings,
            frame: 0,
            warned_alpha: false,
        }
    }

    /// The next frame index to draw.
    #[must_use]
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Whether every frame up to and including `last_frame` has been drawn.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.frame > self.settings.last_frame
    }

    /// Parameters for an arbitrary frame.
    #[must_use]
    pub fn params(&self, frame: u32) -> FrameParams {
        let s = &self.settings;
        let exponent = i32::try_from(frame).unwrap_or(i32::MAX);
        #[expect(clippy::cast_possible_truncation)]
        let (dx, alpha) = (
            (s.drift_base * s.drift_growth.powi(exponent)) as f32,
            (s.alpha_base * s.alpha_growth.powi(exponent)) as f32,
        );
        FrameParams { frame, dx, alpha }
    }

    /// Build the current frame's geometry and advance, or `None` once the
    /// animation has finished.
    pub fn tick(&mut self) -> Option<FrameGeometry> {
        if self.is_finished() {
            return None;
        }

        let params = self.params(self.frame);
        if params.alpha > 1.0 && !self.warned_alpha {
            tracing::warn!(
                frame = params.frame,
                alpha = params.alpha,
                "stroke opacity exceeds 1.0; passing it through unclamped"
            );
            self.warned_alpha = true;
        }

        let polygon =
            Polygon::from_coords(&self.settings.base_shape).translated(vector(params.dx, 0.0));
        let [r, g, b] = self.settings.rgb;

        self.frame += 1;
        Some(FrameGeometry {
            params,
            polygons: vec![polygon],
            color: [r, g, b, params.alpha],
        })
    }
}
