//! Vertex and color types shared by the backends.

use bytemuck::{Pod, Zeroable};

/// Straight (non-premultiplied) RGBA color.
pub type Rgba = [f32; 4];

/// One vertex of a paint triangle, interleaved for GPU upload.
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct PaintVertex {
    /// Position in accumulator pixels.
    pub position: [f32; 2],
    /// Straight-alpha color.
    pub color: Rgba,
}

/// One vertex of the full-surface composite quad.
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct QuadVertex {
    /// Position in normalized device coordinates.
    pub position: [f32; 2],
    /// Accumulator texture coordinate.
    pub texcoord: [f32; 2],
}

const fn quad_vertex(x: f32, y: f32) -> QuadVertex {
    QuadVertex {
        position: [x, y],
        texcoord: [(x + 1.0) * 0.5, (y + 1.0) * 0.5],
    }
}

/// Two triangles covering `[-1, 1]²` with texcoords covering `[0, 1]²`.
pub const FULLSCREEN_QUAD: [QuadVertex; 6] = [
    quad_vertex(-1.0, -1.0),
    quad_vertex(-1.0, 1.0),
    quad_vertex(1.0, -1.0),
    quad_vertex(1.0, -1.0),
    quad_vertex(-1.0, 1.0),
    quad_vertex(1.0, 1.0),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layouts_are_tightly_packed() {
        assert_eq!(std::mem::size_of::<PaintVertex>(), 24);
        assert_eq!(std::mem::size_of::<QuadVertex>(), 16);
    }

    #[test]
    fn quad_texcoords_track_positions() {
        for v in FULLSCREEN_QUAD {
            for axis in 0..2 {
                let expected = if v.position[axis] < 0.0 { 0.0 } else { 1.0 };
                assert!((v.texcoord[axis] - expected).abs() < f32::EPSILON);
            }
        }
    }

    #[test]
    fn quad_casts_to_bytes() {
        let bytes: &[u8] = bytemuck::cast_slice(&FULLSCREEN_QUAD);
        assert_eq!(bytes.len(), 6 * 16);
    }
}
