use nalgebra::Vector3;
use std::collections::HashMap;

use super::builder::{subdivide, RailPathBuilder};
use super::mesh::TaggedMesh;
use super::path::RailPath;
use super::RailBuildError;

/// Discovers every disjoint grind path in a mesh by walking the adjacency
/// graph of its tagged edges.
///
/// Open chains are walked from their degree-1 endpoints first; whatever is
/// left unvisited afterwards can only be loops.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiPathExtractor {
    pub builder: RailPathBuilder,
}

struct EdgeGraph {
    nodes: Vec<Vector3<f32>>,
    adjacency: Vec<Vec<usize>>,
}

impl EdgeGraph {
    fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }
}

impl MultiPathExtractor {
    pub fn new(builder: RailPathBuilder) -> Self {
        Self { builder }
    }

    pub fn extract(&self, mesh: &TaggedMesh) -> Result<Vec<RailPath>, RailBuildError> {
        let edges = self.builder.tagged_edges(mesh)?;
        let graph = self.build_graph(edges.iter().map(|e| (e.a, e.b)));

        let mut visited = vec![false; graph.nodes.len()];
        let mut chains: Vec<(Vec<usize>, bool)> = Vec::new();

        for node in 0..graph.nodes.len() {
            if !visited[node] && graph.degree(node) == 1 {
                chains.push(walk(&graph, node, &mut visited));
            }
        }
        for node in 0..graph.nodes.len() {
            if !visited[node] && graph.degree(node) > 0 {
                chains.push(walk(&graph, node, &mut visited));
            }
        }

        let mut paths = Vec::new();
        for (mut chain, closed) in chains {
            if chain.len() < 2 {
                continue;
            }
            let first_is_end = graph.degree(chain[0]) == 1;
            let last_is_end = graph.degree(chain[chain.len() - 1]) == 1;
            if !closed && !first_is_end && last_is_end {
                chain.reverse();
            }

            let mut core: Vec<Vector3<f32>> = chain.iter().map(|&n| graph.nodes[n]).collect();
            if closed {
                core.push(core[0]);
            }
            let points = subdivide(
                &core,
                self.builder.subdivisions,
                self.builder.min_subdivide_length,
            );
            paths.push(RailPath::from_points(points, closed)?);
        }

        tracing::debug!(
            nodes = graph.nodes.len(),
            paths = paths.len(),
            "extracted rail paths"
        );
        Ok(paths)
    }

    /// Merges endpoints on a tolerance grid; node order follows first appearance.
    fn build_graph(&self, edges: impl Iterator<Item = (Vector3<f32>, Vector3<f32>)>) -> EdgeGraph {
        let cell = self.builder.position_tolerance.max(f32::EPSILON);
        let mut lookup: HashMap<(i64, i64, i64), usize> = HashMap::new();
        let mut graph = EdgeGraph {
            nodes: Vec::new(),
            adjacency: Vec::new(),
        };

        let mut node_for = |graph: &mut EdgeGraph, p: Vector3<f32>| -> usize {
            let key = (
                (p.x / cell).round() as i64,
                (p.y / cell).round() as i64,
                (p.z / cell).round() as i64,
            );
            *lookup.entry(key).or_insert_with(|| {
                graph.nodes.push(p);
                graph.adjacency.push(Vec::new());
                graph.nodes.len() - 1
            })
        };

        for (a, b) in edges {
            let na = node_for(&mut graph, a);
            let nb = node_for(&mut graph, b);
            if na == nb {
                continue;
            }
            if !graph.adjacency[na].contains(&nb) {
                graph.adjacency[na].push(nb);
            }
            if !graph.adjacency[nb].contains(&na) {
                graph.adjacency[nb].push(na);
            }
        }
        graph
    }
}

/// Follows the first unvisited neighbour until stuck. A chain that ends next
/// to its start with more than two nodes is a loop.
fn walk(graph: &EdgeGraph, start: usize, visited: &mut [bool]) -> (Vec<usize>, bool) {
    let mut chain = vec![start];
    visited[start] = true;
    let mut current = start;
    loop {
        match graph.adjacency[current].iter().copied().find(|&n| !visited[n]) {
            Some(next) => {
                visited[next] = true;
                chain.push(next);
                current = next;
            }
            None => {
                let closed = chain.len() > 2 && graph.adjacency[current].contains(&start);
                return (chain, closed);
            }
        }
    }
}
