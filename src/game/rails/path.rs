use nalgebra::Vector3;
use thiserror::Error;

use crate::game::math::lerp_vec;

/// Distance from an open end at which samples report `end_reached`.
pub const END_TOLERANCE: f32 = 0.05;

/// Points closer than this are treated as coincident when closing a loop.
pub const CLOSE_TOLERANCE: f32 = 0.01;

#[derive(Debug, Error, PartialEq)]
pub enum RailPathError {
    #[error("a rail path needs at least two points, got {0}")]
    TooFewPoints(usize),
    #[error("rail point {0} has a non-finite coordinate")]
    NonFinite(usize),
}

/// Sample returned by [`RailPath::point_at_distance`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    pub point: Vector3<f32>,
    pub tangent: Vector3<f32>,
    /// Within [`END_TOLERANCE`] of either end of an open path
    pub end_reached: bool,
}

/// Closest location on a path to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestPoint {
    pub point: Vector3<f32>,
    pub tangent: Vector3<f32>,
    /// Arc-length distance from the start of the path
    pub distance: f32,
}

/// Ordered polyline parameterized by arc length.
///
/// Closed paths store their first point again at the end, so the closing
/// segment is part of `length` and sampling wraps without a seam.
#[derive(Debug, Clone, PartialEq)]
pub struct RailPath {
    points: Vec<Vector3<f32>>,
    tangents: Vec<Vector3<f32>>,
    distances: Vec<f32>,
    length: f32,
    closed: bool,
}

impl RailPath {
    pub fn from_points(mut points: Vec<Vector3<f32>>, closed: bool) -> Result<Self, RailPathError> {
        if points.len() < 2 {
            return Err(RailPathError::TooFewPoints(points.len()));
        }
        if let Some(index) = points
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
        {
            return Err(RailPathError::NonFinite(index));
        }

        if closed {
            let first = points[0];
            let last = points.len() - 1;
            if (points[last] - first).norm() <= CLOSE_TOLERANCE {
                points[last] = first;
            } else {
                points.push(first);
            }
        }

        let mut distances = Vec::with_capacity(points.len());
        let mut total = 0.0;
        distances.push(0.0);
        for pair in points.windows(2) {
            total += (pair[1] - pair[0]).norm();
            distances.push(total);
        }

        let tangents = compute_tangents(&points, closed);
        Ok(Self {
            points,
            tangents,
            distances,
            length: total,
            closed,
        })
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn points(&self) -> &[Vector3<f32>] {
        &self.points
    }

    pub fn tangents(&self) -> &[Vector3<f32>] {
        &self.tangents
    }

    /// Wraps (closed) or clamps (open) a distance into `[0, length]`.
    pub fn normalize_distance(&self, distance: f32) -> f32 {
        if self.length <= 0.0 {
            return 0.0;
        }
        if self.closed {
            distance.rem_euclid(self.length)
        } else {
            distance.clamp(0.0, self.length)
        }
    }

    pub fn point_at_distance(&self, distance: f32) -> PathSample {
        if self.length <= 0.0 {
            return PathSample {
                point: self.points[0],
                tangent: self.tangents[0],
                end_reached: true,
            };
        }

        let d = self.normalize_distance(distance);
        let segment = self.segment_at(d);
        let start = self.distances[segment];
        let span = self.distances[segment + 1] - start;
        let t = if span > f32::EPSILON { (d - start) / span } else { 0.0 };

        PathSample {
            point: lerp_vec(&self.points[segment], &self.points[segment + 1], t),
            tangent: self.blend_tangent(segment, t),
            end_reached: !self.closed && (d <= END_TOLERANCE || d >= self.length - END_TOLERANCE),
        }
    }

    pub fn nearest_point(&self, position: &Vector3<f32>) -> NearestPoint {
        let mut best = NearestPoint {
            point: self.points[0],
            tangent: self.tangents[0],
            distance: 0.0,
        };
        let mut best_sq = f32::MAX;

        for segment in 0..self.points.len() - 1 {
            let a = self.points[segment];
            let b = self.points[segment + 1];
            let ab = b - a;
            let span_sq = ab.norm_squared();
            let t = if span_sq > f32::EPSILON {
                ((position - a).dot(&ab) / span_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let candidate = a + ab * t;
            let dist_sq = (position - candidate).norm_squared();
            if dist_sq < best_sq {
                best_sq = dist_sq;
                let span = self.distances[segment + 1] - self.distances[segment];
                best = NearestPoint {
                    point: candidate,
                    tangent: self.blend_tangent(segment, t),
                    distance: self.distances[segment] + span * t,
                };
            }
        }
        best
    }

    fn segment_at(&self, distance: f32) -> usize {
        let upper = self.distances.partition_point(|&d| d <= distance);
        upper.saturating_sub(1).min(self.points.len() - 2)
    }

    fn blend_tangent(&self, segment: usize, t: f32) -> Vector3<f32> {
        let a = self.tangents[segment];
        let b = self.tangents[segment + 1];
        lerp_vec(&a, &b, t).try_normalize(1.0e-6).unwrap_or(a)
    }
}

/// Central-difference tangents. Closed paths share one tangent across the seam.
/// Degenerate spans reuse the previous tangent, or +Z at the very start.
fn compute_tangents(points: &[Vector3<f32>], closed: bool) -> Vec<Vector3<f32>> {
    let n = points.len();
    let mut tangents = Vec::with_capacity(n);
    let mut previous = Vector3::z();
    for i in 0..n {
        let (before, after) = if closed && n > 2 && (i == 0 || i == n - 1) {
            (points[n - 2], points[1])
        } else {
            (points[i.saturating_sub(1)], points[(i + 1).min(n - 1)])
        };
        let tangent = match (after - before).try_normalize(1.0e-6) {
            Some(t) => t,
            None => {
                tracing::debug!(index = i, "degenerate rail span, reusing previous tangent");
                previous
            }
        };
        tangents.push(tangent);
        previous = tangent;
    }
    tangents
}
