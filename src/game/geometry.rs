//! Geometry query seam between the locomotion core and the world.
//!
//! States never talk to rapier directly: they cast probes and look up surface
//! tags through [`GeometryQuery`], which [`super::physics::PhysicsWorld`] implements.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::rails::RailId;

/// Identifies one authored surface (a ground mesh or a rail) in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u32);

/// Surface category a probe is filtered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Ground,
    Rail,
}

/// Which layers the skater's probes currently see.
///
/// Grinding switches both off so the board is not re-snapped onto the
/// geometry it just left; a scheduled task turns them back on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionMask {
    pub ground: bool,
    pub rail: bool,
}

impl CollisionMask {
    pub const ALL: Self = Self { ground: true, rail: true };
    pub const NONE: Self = Self { ground: false, rail: false };

    pub fn allows(&self, layer: Layer) -> bool {
        match layer {
            Layer::Ground => self.ground,
            Layer::Rail => self.rail,
        }
    }
}

impl Default for CollisionMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Vertex colour tag. RGB selects the surface class, alpha weights grind edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(rgb: [f32; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2], 1.0)
    }

    /// True when every RGB channel is within `tolerance` of `target`.
    pub fn matches_rgb(&self, target: [f32; 3], tolerance: f32) -> bool {
        (self.r - target[0]).abs() <= tolerance
            && (self.g - target[1]).abs() <= tolerance
            && (self.b - target[2]).abs() <= tolerance
    }
}

impl From<[f32; 4]> for Rgba {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }
}

impl From<Rgba> for [f32; 4] {
    fn from(c: Rgba) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

/// Result of a probe that struck a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub point: Vector3<f32>,
    /// Unit normal facing back toward the probe origin
    pub normal: Vector3<f32>,
    pub distance: f32,
    pub surface: SurfaceId,
    /// Triangle index within the surface mesh, when the surface is a mesh
    pub triangle: Option<u32>,
}

/// World queries consumed by the locomotion core.
pub trait GeometryQuery {
    /// Casts a ray from `origin` along `direction` (need not be normalized)
    /// and returns the nearest hit on `layer` within `max_distance`.
    fn probe(
        &self,
        origin: &Vector3<f32>,
        direction: &Vector3<f32>,
        max_distance: f32,
        layer: Layer,
    ) -> Option<Hit>;

    /// Vertex colours of one triangle, or `None` when the surface has no
    /// colour data or the index is stale.
    fn triangle_colors(&self, surface: SurfaceId, triangle: u32) -> Option<[Rgba; 3]>;

    /// Rail registered for a rail-layer surface.
    fn rail_at(&self, surface: SurfaceId) -> Option<RailId>;
}

/// Classifies a hit by its triangle's vertex colours.
///
/// Any vertex matching `color` tags the triangle. Hits without triangle data
/// or with unreadable colours never match.
pub fn hit_matches_color(
    world: &dyn GeometryQuery,
    hit: &Hit,
    color: [f32; 3],
    tolerance: f32,
) -> bool {
    let Some(triangle) = hit.triangle else {
        return false;
    };
    match world.triangle_colors(hit.surface, triangle) {
        Some(colors) => colors.iter().any(|c| c.matches_rgb(color, tolerance)),
        None => {
            tracing::debug!(
                surface = hit.surface.0,
                triangle,
                "no vertex colours for hit triangle, treating as untagged"
            );
            false
        }
    }
}
