//! Flat triangle and color arrays handed to a backend in one draw.

use crate::triangulate::Polygon;
use crate::types::{PaintVertex, Rgba};

/// Coordinates per vertex.
const POSITION_COMPONENTS: usize = 2;
/// Color channels per vertex.
const COLOR_COMPONENTS: usize = 4;
/// Vertices per triangle.
const TRIANGLE_VERTICES: usize = 3;

/// Triangles as flat positions plus one straight-alpha color per vertex.
///
/// Always holds `positions.len() / 2 == colors.len() / 4` vertices, a
/// multiple of three.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleBatch {
    positions: Vec<f32>,
    colors: Vec<f32>,
}

impl TriangleBatch {
    /// An empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Triangulate every polygon and fill it with a single color.
    #[must_use]
    pub fn from_polygons(polygons: &[Polygon], color: Rgba) -> Self {
        let mut batch = Self::new();
        for polygon in polygons {
            batch.push_polygon(polygon, color);
        }
        batch
    }

    /// Triangulate `polygon` and append its triangles flat-shaded with
    /// `color`.
    pub fn push_polygon(&mut self, polygon: &Polygon, color: Rgba) {
        let coords = polygon.triangle_coords();
        let vertices = coords.len() / POSITION_COMPONENTS;
        self.positions.extend_from_slice(&coords);
        self.colors.reserve(vertices * COLOR_COMPONENTS);
        for _ in 0..vertices {
            self.colors.extend_from_slice(&color);
        }
    }

    /// Flat `[x, y]` positions, three vertices per triangle.
    #[must_use]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Flat `[r, g, b, a]` colors, one per vertex.
    #[must_use]
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / POSITION_COMPONENTS
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / TRIANGLE_VERTICES
    }

    /// Whether the batch draws nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Interleave positions and colors.
    pub fn vertices(&self) -> impl ExactSizeIterator<Item = PaintVertex> + '_ {
        self.positions
            .chunks_exact(POSITION_COMPONENTS)
            .zip(self.colors.chunks_exact(COLOR_COMPONENTS))
            .map(|(p, c)| PaintVertex {
                position: [p[0], p[1]],
                color: [c[0], c[1], c[2], c[3]],
            })
    }

    /// Vertices grouped per triangle.
    pub fn triangles(&self) -> impl Iterator<Item = [PaintVertex; 3]> + '_ {
        let mut vertices = self.vertices();
        std::iter::from_fn(move || Some([vertices.next()?, vertices.next()?, vertices.next()?]))
    }
}
