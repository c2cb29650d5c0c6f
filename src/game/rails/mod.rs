//! Grind rails: extraction from tagged meshes and arc-length traversal.

mod builder;
mod extractor;
mod mesh;
mod path;

pub use builder::{subdivide, Edge, RailPathBuilder};
pub use extractor::MultiPathExtractor;
pub use mesh::TaggedMesh;
pub use path::{NearestPoint, PathSample, RailPath, RailPathError, END_TOLERANCE};

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Handle to a rail registered in a [`RailNetwork`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RailId(pub u32);

/// Read-only rail paths shared by every skater in a simulation.
#[derive(Debug, Default, Clone)]
pub struct RailNetwork {
    rails: Vec<Arc<RailPath>>,
}

impl RailNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: RailPath) -> RailId {
        self.rails.push(Arc::new(path));
        RailId((self.rails.len() - 1) as u32)
    }

    pub fn get(&self, id: RailId) -> Option<&Arc<RailPath>> {
        self.rails.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.rails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rails.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RailId, &Arc<RailPath>)> {
        self.rails
            .iter()
            .enumerate()
            .map(|(i, rail)| (RailId(i as u32), rail))
    }
}

/// Errors raised while turning a tagged mesh into rail paths
#[derive(Debug, Error)]
pub enum RailBuildError {
    #[error("mesh has {colors} vertex colours for {vertices} vertices")]
    ColorCountMismatch { colors: usize, vertices: usize },
    #[error("triangle index {index} out of range for {vertices} vertices")]
    IndexOutOfRange { index: u32, vertices: usize },
    #[error("mesh has no edges tagged above the grind weight threshold")]
    NoTaggedEdges,
    #[error("ordered rail has {0} points, need at least two")]
    TooFewPoints(usize),
    #[error(transparent)]
    Path(#[from] RailPathError),
    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {}", .path.display(), .source)]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
