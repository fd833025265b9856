//! Sketch configuration.
//!
//! Everything the sketch would otherwise read from ambient globals is passed
//! in explicitly as a [`SketchConfig`] at construction time. The defaults
//! reproduce the reference piece; a JSON document can override any section.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::features::Features;
use crate::seed::SeedHash;
use crate::types::Rgba;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SketchConfig {
    /// The host-provided hash.
    pub seed: SeedHash,
    /// Accumulator setup.
    #[serde(default)]
    pub render: RenderSettings,
    /// Animation constants.
    #[serde(default)]
    pub animation: AnimationSettings,
    /// Metadata published once at setup.
    #[serde(default)]
    pub features: Features,
}

impl SketchConfig {
    /// Default settings for the given seed.
    #[must_use]
    pub fn new(seed: SeedHash) -> Self {
        Self {
            seed,
            render: RenderSettings::default(),
            animation: AnimationSettings::default(),
            features: Features::default(),
        }
    }

    /// Parse a JSON document.
    ///
    /// Only `seed` is required:
    ///
    /// ```
    /// # use paint_trails::SketchConfig;
    /// let config = SketchConfig::from_json(&format!(
    ///     r#"{{ "seed": "{}", "animation": {{ "last_frame": 10 }} }}"#,
    ///     "ab".repeat(32)
    /// ))
    /// .unwrap();
    /// assert_eq!(config.animation.last_frame, 10);
    /// assert_eq!(config.render.width, 1000);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for malformed JSON, unknown fields, or an
    /// invalid seed.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(e.to_string()))
    }
}

/// Settings for the off-screen accumulator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    /// Accumulator width in texels.
    pub width: u32,
    /// Accumulator height in texels.
    pub height: u32,
    /// One-time clear color of the accumulator, reused when clearing the
    /// visible surface.
    pub clear_color: Rgba,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 1000,
            clear_color: [0.4, 0.4, 0.4, 1.0],
        }
    }
}

/// Constants driving the per-frame geometry.
///
/// Frame `n` draws `base_shape` shifted right by
/// `drift_base * drift_growth^n` with opacity `alpha_base * alpha_growth^n`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationSettings {
    /// Polygon drawn every frame, in accumulator pixels.
    pub base_shape: Vec<[f32; 2]>,
    /// Horizontal offset at frame 0.
    pub drift_base: f64,
    /// Per-frame growth factor of the offset.
    pub drift_growth: f64,
    /// Opacity at frame 0.
    pub alpha_base: f64,
    /// Per-frame growth factor of the opacity. Not clamped.
    pub alpha_growth: f64,
    /// Stroke color; alpha comes from the animation.
    pub rgb: [f32; 3],
    /// Last frame index that is drawn.
    pub last_frame: u32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            base_shape: vec![[200.0, 300.0], [230.0, 300.0], [290.0, 400.0], [200.0, 400.0]],
            drift_base: 40.0,
            drift_growth: 1.05,
            alpha_base: 0.1,
            alpha_growth: 1.02,
            rgb: [1.0, 0.0, 0.0],
            last_frame: 50,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::features::FeatureValue;

    fn seed_json() -> String {
        "0123456789abcdef".repeat(4)
    }

    #[test]
    fn minimal_document_uses_defaults() {
        let config = SketchConfig::from_json(&format!(r#"{{"seed":"{}"}}"#, seed_json())).unwrap();
        assert_eq!(config.seed.as_str(), seed_json());
        assert_eq!(config.render, RenderSettings::default());
        assert_eq!(config.animation, AnimationSettings::default());
        assert!(config.features.is_empty());
    }

    #[test]
    fn sections_override_individual_fields() {
        let json = format!(
            r#"{{
                "seed": "{}",
                "render": {{ "width": 256, "height": 128 }},
                "animation": {{ "alpha_base": 0.5 }},
                "features": {{ "Palette": "Red" }}
            }}"#,
            seed_json()
        );
        let config = SketchConfig::from_json(&json).unwrap();
        assert_eq!(config.render.width, 256);
        assert_eq!(config.render.height, 128);
        assert_eq!(config.render.clear_color, [0.4, 0.4, 0.4, 1.0]);
        assert!((config.animation.alpha_base - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.animation.last_frame, 50);
        assert_eq!(
            config.features.get("Palette"),
            Some(&FeatureValue::Text("Red".into()))
        );
    }

    #[test]
    fn bad_seed_is_a_config_error() {
        let err = SketchConfig::from_json(r#"{"seed":"nope"}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("invalid seed"));
    }

    #[test]
    fn missing_seed_is_a_config_error() {
        assert!(matches!(
            SketchConfig::from_json("{}"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn unknown_render_field_is_rejected() {
        let json = format!(r#"{{"seed":"{}","render":{{"depth":1}}}}"#, seed_json());
        assert!(SketchConfig::from_json(&json).is_err());
    }
}
