use nalgebra::Vector3;
use std::collections::HashSet;

use super::mesh::TaggedMesh;
use super::path::RailPath;
use super::RailBuildError;

/// Extracts one ordered grind path from the tagged edges of a mesh.
#[derive(Debug, Clone, Copy)]
pub struct RailPathBuilder {
    /// Minimum vertex alpha for an edge endpoint to count as tagged
    pub weight_threshold: f32,
    /// Endpoints closer than this are the same point when deduplicating edges
    pub position_tolerance: f32,
    /// Largest gap bridged when chaining edges into a path
    pub connection_tolerance: f32,
    /// Extra points inserted into each long segment
    pub subdivisions: usize,
    pub min_subdivide_length: f32,
}

impl Default for RailPathBuilder {
    fn default() -> Self {
        Self {
            weight_threshold: 0.9,
            position_tolerance: 0.001,
            connection_tolerance: 0.01,
            subdivisions: 3,
            min_subdivide_length: 0.1,
        }
    }
}

/// A tagged mesh edge in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: Vector3<f32>,
    pub b: Vector3<f32>,
}

impl RailPathBuilder {
    pub fn with_threshold(weight_threshold: f32) -> Self {
        Self {
            weight_threshold,
            ..Self::default()
        }
    }

    pub fn build(&self, mesh: &TaggedMesh) -> Result<RailPath, RailBuildError> {
        let edges = self.tagged_edges(mesh)?;
        let ordered = self.order_edges(&edges);
        if ordered.len() < 2 {
            return Err(RailBuildError::TooFewPoints(ordered.len()));
        }

        let closed = ordered.len() > 2
            && (ordered[0] - ordered[ordered.len() - 1]).norm() <= self.connection_tolerance;
        let points = subdivide(&ordered, self.subdivisions, self.min_subdivide_length);
        tracing::debug!(
            edges = edges.len(),
            core_points = ordered.len(),
            points = points.len(),
            closed,
            "built rail path"
        );
        Ok(RailPath::from_points(points, closed)?)
    }

    /// Tagged edges keyed by vertex-index pair, then deduplicated spatially.
    pub fn tagged_edges(&self, mesh: &TaggedMesh) -> Result<Vec<Edge>, RailBuildError> {
        mesh.validate()?;

        let mut seen = HashSet::new();
        let mut index_pairs = Vec::new();
        for tri in &mesh.triangles {
            for (i, j) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                let tagged = mesh.colors[i as usize].a >= self.weight_threshold
                    && mesh.colors[j as usize].a >= self.weight_threshold;
                if tagged && seen.insert((i.min(j), i.max(j))) {
                    index_pairs.push((i.min(j), i.max(j)));
                }
            }
        }
        if index_pairs.is_empty() {
            return Err(RailBuildError::NoTaggedEdges);
        }

        let mut edges: Vec<Edge> = Vec::with_capacity(index_pairs.len());
        for (i, j) in index_pairs {
            let (Some(a), Some(b)) = (mesh.vertex(i), mesh.vertex(j)) else {
                continue;
            };
            if (a - b).norm() <= self.position_tolerance {
                continue;
            }
            let duplicate = edges.iter().any(|e| {
                (near(&e.a, &a, self.position_tolerance) && near(&e.b, &b, self.position_tolerance))
                    || (near(&e.a, &b, self.position_tolerance)
                        && near(&e.b, &a, self.position_tolerance))
            });
            if !duplicate {
                edges.push(Edge { a, b });
            }
        }
        Ok(edges)
    }

    /// Chains edges into one polyline, starting from the lowest edge on the
    /// longest bounding-box axis and growing greedily from either end.
    pub fn order_edges(&self, edges: &[Edge]) -> Vec<Vector3<f32>> {
        let Some(start) = start_edge(edges) else {
            return Vec::new();
        };
        let axis = longest_axis(edges);
        let first = edges[start];
        let mut path = if first.a[axis] <= first.b[axis] {
            vec![first.a, first.b]
        } else {
            vec![first.b, first.a]
        };

        let mut used = vec![false; edges.len()];
        used[start] = true;
        let max_iterations = edges.len() * 2 + 5;

        for _ in 0..max_iterations {
            let end = path[path.len() - 1];
            if let Some((index, far)) = self.closest_connection(edges, &used, &end) {
                used[index] = true;
                path.push(far);
                continue;
            }
            let head = path[0];
            if let Some((index, far)) = self.closest_connection(edges, &used, &head) {
                used[index] = true;
                path.insert(0, far);
                continue;
            }
            break;
        }
        path
    }

    /// Unused edge with an endpoint nearest `anchor` within tolerance, and its far endpoint.
    fn closest_connection(
        &self,
        edges: &[Edge],
        used: &[bool],
        anchor: &Vector3<f32>,
    ) -> Option<(usize, Vector3<f32>)> {
        let mut best: Option<(usize, Vector3<f32>, f32)> = None;
        for (index, edge) in edges.iter().enumerate() {
            if used[index] {
                continue;
            }
            for (near_end, far_end) in [(edge.a, edge.b), (edge.b, edge.a)] {
                let gap = (near_end - anchor).norm();
                if gap <= self.connection_tolerance && best.map_or(true, |(_, _, g)| gap < g) {
                    best = Some((index, far_end, gap));
                }
            }
        }
        best.map(|(index, far, _)| (index, far))
    }
}

fn near(a: &Vector3<f32>, b: &Vector3<f32>, tolerance: f32) -> bool {
    (a - b).norm() <= tolerance
}

/// 0 = x, 1 = y, 2 = z. X wins ties.
fn longest_axis(edges: &[Edge]) -> usize {
    let mut min = Vector3::repeat(f32::MAX);
    let mut max = Vector3::repeat(f32::MIN);
    for edge in edges {
        for p in [edge.a, edge.b] {
            min = min.inf(&p);
            max = max.sup(&p);
        }
    }
    let extent = max - min;
    if extent.y > extent.x && extent.y >= extent.z {
        1
    } else if extent.z > extent.x && extent.z > extent.y {
        2
    } else {
        0
    }
}

fn start_edge(edges: &[Edge]) -> Option<usize> {
    let axis = longest_axis(edges);
    edges
        .iter()
        .enumerate()
        .map(|(i, e)| (i, e.a[axis].min(e.b[axis])))
        .fold(None, |best: Option<(usize, f32)>, (i, low)| match best {
            Some((_, best_low)) if best_low <= low => best,
            _ => Some((i, low)),
        })
        .map(|(i, _)| i)
}

/// Inserts `subdivisions` evenly spaced points into every segment longer than `min_length`.
pub fn subdivide(points: &[Vector3<f32>], subdivisions: usize, min_length: f32) -> Vec<Vector3<f32>> {
    let Some(&last) = points.last() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(points.len() * (subdivisions + 1));
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        out.push(a);
        if (b - a).norm() > min_length {
            for step in 1..=subdivisions {
                let t = step as f32 / (subdivisions + 1) as f32;
                out.push(a + (b - a) * t);
            }
        }
    }
    out.push(last);
    out
}
