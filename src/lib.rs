//! A seeded generative sketch that paints into a floating-point accumulator.
//!
//! Every frame, an [`AnimationDriver`] produces a polygon, the polygon is
//! triangulated by ear clipping, and the triangles are alpha-blended into a
//! persistent RGBA float target that is never cleared again. The target is
//! then stretched over the visible surface. Because nothing is erased,
//! strokes pile up into trails.
//!
//! # Backends
//!
//! - [`GlowBackend`] (feature `glow`, on by default) renders with OpenGL 3.3
//!   or WebGL2 via [glow], into an RGBA32F texture.
//! - [`CpuBackend`] is a software rasterizer with the same projection and
//!   blend equations, for headless use and snapshots.
//!
//! # Example
//!
//! ```
//! use paint_trails::{CpuBackend, DisplaySize, SeedHash, Sketch, SketchConfig};
//!
//! let seed = SeedHash::parse("0f".repeat(32)).unwrap();
//! let mut sketch = Sketch::with_seeded_random(SketchConfig::new(seed), |config| {
//!     Ok(CpuBackend::new(&config.render))
//! });
//!
//! // The host calls this once per display refresh.
//! let outcome = sketch.tick(DisplaySize::new(800, 800)).unwrap();
//! println!("{outcome:?}");
//! ```
//!
//! # Safety
//!
//! Creating a [`GlowBackend`] requires a valid, current OpenGL context, and
//! that context must stay current while the backend is used.
//!
//! [glow]: https://docs.rs/glow

mod backend;
mod batch;
mod config;
mod cpu;
mod driver;
mod error;
mod features;
mod projection;
#[cfg(feature = "glow")]
mod render;
mod seed;
#[cfg(feature = "glow")]
mod shaders;
mod sketch;
mod triangulate;
mod types;

pub use backend::PaintBackend;
pub use batch::TriangleBatch;
pub use config::{AnimationSettings, RenderSettings, SketchConfig};
pub use cpu::CpuBackend;
pub use driver::{AnimationDriver, FrameGeometry, FrameParams};
pub use error::{Error, Result};
pub use features::{FeatureValue, Features};
pub use lyon::math::{Point, Vector};
pub use projection::{aspect_scale, pixel_matrix, project, DisplaySize};
#[cfg(feature = "glow")]
pub use render::GlowBackend;
pub use seed::{RandomSource, SeedHash, Sfc32, SEED_LEN};
pub use sketch::{Sketch, StartupSeeds, TickOutcome};
pub use triangulate::{ring_signed_area, triangulate, Polygon};
pub use types::{PaintVertex, QuadVertex, Rgba, FULLSCREEN_QUAD};
