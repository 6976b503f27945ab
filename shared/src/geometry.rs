/// 2D geometry for the unit-square arena.
/// Coordinates are normalized to [0, 1] x [0, 1]; angles are radians.
use std::f64::consts::{PI, TAU};

/// Accumulated winding angle above which a point counts as enclosed.
/// Outside points sum to ~0 and inside points to ~2*PI, so this only has to
/// absorb floating-point drift.
const WINDING_THRESHOLD: f64 = 0.1;

/// A trail sample or polygon corner. `t` is the wall-clock time the sample
/// was taken; polygon-only vertices carry `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    pub t: Option<f64>,
}

impl Vertex {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, t: None }
    }

    pub fn at(x: f64, y: f64, t: f64) -> Self {
        Self { x, y, t: Some(t) }
    }
}

/// Squared distance between two points
pub fn dist2(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let xd = x1 - x2;
    let yd = y1 - y2;
    xd * xd + yd * yd
}

/// Intersection of segment a1-a2 with segment b1-b2.
///
/// The lines through both segments are intersected with the determinant
/// formula, then the candidate is kept only if it lies inside both segments'
/// axis-aligned bounding boxes. Parallel or coincident lines (an exactly zero
/// determinant, no epsilon) give `None`, so nearly parallel segments may or
/// may not report a hit. The bounding-box test is also loose near segment
/// endpoints, and for an axis-aligned segment the box has zero width, so
/// rounding in the computed point can make a real crossing be missed.
pub fn segment_intersection(a1: Vertex, a2: Vertex, b1: Vertex, b2: Vertex) -> Option<Vertex> {
    let (x1, y1, x2, y2) = (a1.x, a1.y, a2.x, a2.y);
    let (x3, y3, x4, y4) = (b1.x, b1.y, b2.x, b2.y);

    let denom = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if denom == 0.0 {
        return None;
    }

    let a_det = x1 * y2 - y1 * x2;
    let b_det = x3 * y4 - y3 * x4;
    let px = (a_det * (x3 - x4) - (x1 - x2) * b_det) / denom;
    let py = (a_det * (y3 - y4) - (y1 - y2) * b_det) / denom;

    let within = |p: f64, lo: f64, hi: f64| p >= lo.min(hi) && p <= lo.max(hi);
    if !within(px, x1, x2) || !within(px, x3, x4) {
        return None;
    }
    if !within(py, y1, y2) || !within(py, y3, y4) {
        return None;
    }

    Some(Vertex::new(px, py))
}

/// Direction from one point to another
pub fn bearing(from_x: f64, from_y: f64, to_x: f64, to_y: f64) -> f64 {
    (to_y - from_y).atan2(to_x - from_x)
}

/// Signed minimal turn from `current` to `target`, in [-PI, PI].
pub fn angle_difference(current: f64, target: f64) -> f64 {
    let mut current = current;
    let mut target = target;
    while current < target - PI {
        current += TAU;
    }
    while target < current - PI {
        target += TAU;
    }
    target - current
}

/// Winding test: sums the turn between successive bearings from the point to
/// each vertex (closing last -> first). Only meaningful for simple polygons.
pub fn point_in_polygon(vertices: &[Vertex], x: f64, y: f64) -> bool {
    let Some(last) = vertices.last() else {
        return false;
    };

    let mut accumulated = 0.0;
    let mut current = bearing(x, y, last.x, last.y);
    for v in vertices {
        let next = bearing(x, y, v.x, v.y);
        accumulated += angle_difference(current, next);
        current = next;
    }

    accumulated.abs() > WINDING_THRESHOLD
}

/// Arithmetic mean of the vertices. `None` for an empty slice.
pub fn centroid(vertices: &[Vertex]) -> Option<Vertex> {
    if vertices.is_empty() {
        return None;
    }
    let count = vertices.len() as f64;
    let xs: f64 = vertices.iter().map(|v| v.x).sum();
    let ys: f64 = vertices.iter().map(|v| v.y).sum();
    Some(Vertex::new(xs / count, ys / count))
}
