use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::RailBuildError;
use crate::game::geometry::Rgba;

/// Triangle mesh with per-vertex colour tags.
///
/// RGB classifies the surface (vert, grindable) and alpha weights grind edges.
/// Serialized as JSON for the CLI: `{"positions": [[x,y,z],..], "colors": [[r,g,b,a],..], "triangles": [[i,j,k],..]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaggedMesh {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<Rgba>,
    pub triangles: Vec<[u32; 3]>,
}

impl TaggedMesh {
    pub fn new(positions: Vec<[f32; 3]>, colors: Vec<Rgba>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            colors,
            triangles,
        }
    }

    /// Two-triangle quad over corners given in winding order, uniformly tagged.
    pub fn quad(corners: [Vector3<f32>; 4], color: Rgba) -> Self {
        Self {
            positions: corners.iter().map(|c| [c.x, c.y, c.z]).collect(),
            colors: vec![color; 4],
            triangles: vec![[0, 1, 2], [0, 2, 3]],
        }
    }

    /// Axis-aligned horizontal quad centred on `center`.
    pub fn floor(center: Vector3<f32>, half_x: f32, half_z: f32, color: Rgba) -> Self {
        let c = center;
        Self::quad(
            [
                Vector3::new(c.x - half_x, c.y, c.z - half_z),
                Vector3::new(c.x - half_x, c.y, c.z + half_z),
                Vector3::new(c.x + half_x, c.y, c.z + half_z),
                Vector3::new(c.x + half_x, c.y, c.z - half_z),
            ],
            color,
        )
    }

    /// Appends another mesh, re-basing its indices.
    pub fn append(&mut self, other: &TaggedMesh) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.colors.extend_from_slice(&other.colors);
        self.triangles
            .extend(other.triangles.iter().map(|t| [t[0] + base, t[1] + base, t[2] + base]));
    }

    pub fn vertex(&self, index: u32) -> Option<Vector3<f32>> {
        self.positions
            .get(index as usize)
            .map(|p| Vector3::new(p[0], p[1], p[2]))
    }

    pub fn triangle_colors(&self, triangle: u32) -> Option<[Rgba; 3]> {
        let [a, b, c] = *self.triangles.get(triangle as usize)?;
        Some([
            *self.colors.get(a as usize)?,
            *self.colors.get(b as usize)?,
            *self.colors.get(c as usize)?,
        ])
    }

    /// Checks that colours line up with vertices and every index is in range.
    pub fn validate(&self) -> Result<(), RailBuildError> {
        if self.colors.len() != self.positions.len() {
            return Err(RailBuildError::ColorCountMismatch {
                colors: self.colors.len(),
                vertices: self.positions.len(),
            });
        }
        let vertices = self.positions.len();
        for tri in &self.triangles {
            for &index in tri {
                if index as usize >= vertices {
                    return Err(RailBuildError::IndexOutOfRange { index, vertices });
                }
            }
        }
        Ok(())
    }

    /// Load a mesh from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, RailBuildError> {
        let content = std::fs::read_to_string(path).map_err(|source| RailBuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mesh: Self = serde_json::from_str(&content).map_err(|source| RailBuildError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        mesh.validate()?;
        Ok(mesh)
    }
}
