//! The seam between the animation and whatever rasterizes it.

use crate::batch::TriangleBatch;
use crate::error::Result;
use crate::projection::DisplaySize;

/// A paint accumulator plus compositor.
///
/// Implementations own a persistent floating-point target that is cleared
/// once at creation and only ever blended into afterwards.
pub trait PaintBackend {
    /// Blend `batch` into the accumulator with straight-alpha source-over.
    ///
    /// `display` only feeds the aspect correction; the accumulator keeps its
    /// own fixed resolution.
    ///
    /// # Errors
    ///
    /// Backend-specific; the CPU backend never fails.
    fn accumulate(&mut self, batch: &TriangleBatch, display: DisplaySize) -> Result<()>;

    /// Resize the visible surface to `display`, clear it, and draw the
    /// accumulator over it.
    ///
    /// # Errors
    ///
    /// Backend-specific; the CPU backend never fails.
    fn composite(&mut self, display: DisplaySize) -> Result<()>;
}
