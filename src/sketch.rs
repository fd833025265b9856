//! The sketch: setup once, then one [`Sketch::tick`] per display refresh.

use crate::backend::PaintBackend;
use crate::batch::TriangleBatch;
use crate::config::SketchConfig;
use crate::driver::AnimationDriver;
use crate::error::Result;
use crate::features::Features;
use crate::projection::DisplaySize;
use crate::seed::{RandomSource, Sfc32};

/// Seeds drawn from the random source at startup, for hosts that run their
/// own noise or random helpers alongside the sketch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupSeeds {
    /// Seed for general-purpose randomness.
    pub random: u32,
    /// Seed for noise fields.
    pub noise: u32,
}

impl StartupSeeds {
    fn draw(source: &mut dyn RandomSource) -> Self {
        #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let mut next = || (source.next_f64() * 1_000_000.0).floor() as u32;
        let random = next();
        let noise = next();
        Self { random, noise }
    }
}

/// What a call to [`Sketch::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was accumulated and composited.
    Drawn {
        /// The frame index that was drawn.
        frame: u32,
        /// Triangles blended into the accumulator.
        triangles: usize,
    },
    /// The animation is over; nothing was touched.
    Finished,
    /// Setup failed; the sketch stays blank.
    Disabled,
}

/// A running sketch over some [`PaintBackend`].
///
/// ```
/// use paint_trails::{CpuBackend, DisplaySize, SeedHash, Sketch, SketchConfig, TickOutcome};
///
/// let config = SketchConfig::new(SeedHash::parse("7".repeat(64)).unwrap());
/// let mut sketch = Sketch::with_seeded_random(config, |c| Ok(CpuBackend::new(&c.render)));
/// let display = DisplaySize::new(640, 480);
/// while sketch.tick(display).unwrap() != TickOutcome::Finished {}
/// assert_eq!(sketch.frame(), 51);
/// ```
pub struct Sketch<B> {
    config: SketchConfig,
    random: Box<dyn RandomSource>,
    seeds: StartupSeeds,
    driver: AnimationDriver,
    backend: Option<B>,
}

impl<B: PaintBackend> Sketch<B> {
    /// Set up the sketch with an explicit random source.
    ///
    /// Draws the startup seeds, publishes the feature metadata, then calls
    /// `create_backend`. If that fails (typically because the graphics
    /// context cannot render to a float target) the error is logged and
    /// every later tick returns [`TickOutcome::Disabled`].
    pub fn setup<R, F>(config: SketchConfig, random: R, create_backend: F) -> Self
    where
        R: RandomSource + 'static,
        F: FnOnce(&SketchConfig) -> Result<B>,
    {
        let mut random: Box<dyn RandomSource> = Box::new(random);
        let seeds = StartupSeeds::draw(random.as_mut());

        tracing::info!(
            seed = %config.seed,
            random_seed = seeds.random,
            noise_seed = seeds.noise,
            features = %config.features.to_json(),
            "sketch setup"
        );

        let backend = match create_backend(&config) {
            Ok(backend) => Some(backend),
            Err(err) => {
                tracing::error!(%err, "graphics unavailable; sketch disabled");
                None
            }
        };

        Self {
            driver: AnimationDriver::new(config.animation.clone()),
            config,
            random,
            seeds,
            backend,
        }
    }

    /// Set up the sketch with the default [`Sfc32`] generator seeded from
    /// `config.seed`.
    pub fn with_seeded_random<F>(config: SketchConfig, create_backend: F) -> Self
    where
        F: FnOnce(&SketchConfig) -> Result<B>,
    {
        let random = Sfc32::from_seed(&config.seed);
        Self::setup(config, random, create_backend)
    }

    /// Draw the next frame, if any.
    ///
    /// # Errors
    ///
    /// Propagates backend failures from the accumulate or composite pass.
    #[tracing::instrument(
        level = "debug",
        skip(self, display_size),
        fields(frame = self.driver.frame(), size = ?display_size.pixel_size())
    )]
    pub fn tick(&mut self, display_size: DisplaySize) -> Result<TickOutcome> {
        let Some(backend) = self.backend.as_mut() else {
            return Ok(TickOutcome::Disabled);
        };
        let Some(geometry) = self.driver.tick() else {
            return Ok(TickOutcome::Finished);
        };

        let batch = TriangleBatch::from_polygons(&geometry.polygons, geometry.color);
        backend.accumulate(&batch, display_size)?;
        backend.composite(display_size)?;

        tracing::debug!(
            dx = geometry.params.dx,
            alpha = geometry.params.alpha,
            triangles = batch.triangle_count(),
            "frame drawn"
        );

        Ok(TickOutcome::Drawn {
            frame: geometry.params.frame,
            triangles: batch.triangle_count(),
        })
    }

    /// Whether setup failed.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.backend.is_none()
    }

    /// Whether the last frame has been drawn.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.driver.is_finished()
    }

    /// The next frame index.
    #[must_use]
    pub fn frame(&self) -> u32 {
        self.driver.frame()
    }

    /// The configuration the sketch was built with.
    #[must_use]
    pub fn config(&self) -> &SketchConfig {
        &self.config
    }

    /// Feature metadata published at setup.
    #[must_use]
    pub fn features(&self) -> &Features {
        &self.config.features
    }

    /// Seeds drawn at setup.
    #[must_use]
    pub fn seeds(&self) -> StartupSeeds {
        self.seeds
    }

    /// Draw from the sketch's random source.
    pub fn random(&mut self) -> f64 {
        self.random.next_f64()
    }

    /// The backend, unless setup failed.
    #[must_use]
    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    /// Tear down and hand back the backend, e.g. to release GL resources.
    #[must_use]
    pub fn into_backend(self) -> Option<B> {
        self.backend
    }
}
