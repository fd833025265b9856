//! Polygon triangulation.
//!
//! Polygons are split into triangles by ear clipping (the earcut algorithm:
//! a doubly-linked vertex ring, with z-order curve hashing to speed up the
//! "is this ear empty" test on large inputs). Holes are supported.
//!
//! Triangulation never fails. Fewer than three points, or input the
//! algorithm rejects, yields no triangles. Self-intersecting rings are not
//! validated and may produce overlapping triangles.

use lyon::math::{Point, Vector};

/// A closed polygon: one outer ring plus optional hole rings.
///
/// All rings live in one point list. `hole_starts` holds the index of the
/// first point of each hole, in increasing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    points: Vec<Point>,
    hole_starts: Vec<usize>,
}

impl Polygon {
    /// A polygon without holes. The last point connects back to the first.
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points,
            hole_starts: Vec::new(),
        }
    }

    /// Build a polygon from `[x, y]` pairs.
    #[must_use]
    pub fn from_coords(coords: &[[f32; 2]]) -> Self {
        Self::new(coords.iter().map(|&[x, y]| Point::new(x, y)).collect())
    }

    /// Append a hole ring. Rings with fewer than three points enclose
    /// nothing and are ignored.
    #[must_use]
    pub fn with_hole(mut self, ring: impl IntoIterator<Item = Point>) -> Self {
        let ring: Vec<Point> = ring.into_iter().collect();
        if ring.len() < 3 {
            return self;
        }
        self.hole_starts.push(self.points.len());
        self.points.extend(ring);
        self
    }

    /// Every point, outer ring first, then holes.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Start indices of the hole rings.
    #[must_use]
    pub fn hole_starts(&self) -> &[usize] {
        &self.hole_starts
    }

    /// The outer ring.
    #[must_use]
    pub fn outer(&self) -> &[Point] {
        let end = self.hole_starts.first().copied().unwrap_or(self.points.len());
        &self.points[..end]
    }

    /// Shift every point by `offset`.
    #[must_use]
    pub fn translated(mut self, offset: Vector) -> Self {
        for p in &mut self.points {
            *p += offset;
        }
        self
    }

    /// Enclosed area: outer ring minus holes.
    #[must_use]
    pub fn area(&self) -> f64 {
        let ends = self.hole_starts.iter().copied().chain(Some(self.points.len()));
        let mut start = 0;
        let mut area = 0.0;
        let mut outer = true;
        for end in ends {
            let ring = ring_signed_area(&self.points[start..end]).abs();
            area += if outer { ring } else { -ring };
            outer = false;
            start = end;
        }
        area
    }

    /// Triangle index triples into [`points`](Self::points).
    #[must_use]
    pub fn triangle_indices(&self) -> Vec<usize> {
        triangulate(&self.points, &self.hole_starts)
    }

    /// Triangles expanded to flat `[x0, y0, x1, y1, x2, y2, ...]`
    /// coordinates, three vertices per triangle.
    #[must_use]
    pub fn triangle_coords(&self) -> Vec<f32> {
        self.triangle_indices()
            .into_iter()
            .flat_map(|i| {
                let p = self.points[i];
                [p.x, p.y]
            })
            .collect()
    }
}

/// Triangulate a ring (plus holes) and return index triples into `points`.
///
/// `hole_starts` lists the first point of each hole ring.
#[must_use]
pub fn triangulate(points: &[Point], hole_starts: &[usize]) -> Vec<usize> {
    if points.len() < 3 {
        return Vec::new();
    }

    let coords: Vec<f64> = points
        .iter()
        .flat_map(|p| [f64::from(p.x), f64::from(p.y)])
        .collect();

    match earcutr::earcut(&coords, hole_starts, 2) {
        Ok(indices) => indices,
        Err(err) => {
            tracing::warn!(?err, points = points.len(), "triangulation failed; dropping polygon");
            Vec::new()
        }
    }
}

/// Shoelace signed area of a closed ring. Positive for counter-clockwise
/// rings in a y-up frame.
#[must_use]
pub fn ring_signed_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut prev = ring[ring.len() - 1];
    for &p in ring {
        sum += f64::from(prev.x) * f64::from(p.y) - f64::from(p.x) * f64::from(prev.y);
        prev = p;
    }
    sum * 0.5
}
