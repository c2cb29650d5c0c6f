use nalgebra::{Point3, Vector3};
use rapier3d::prelude::*;
use std::collections::HashMap;

use super::geometry::{GeometryQuery, Hit, Layer, Rgba, SurfaceId};
use super::rails::{MultiPathExtractor, RailBuildError, RailId, RailNetwork, RailPath, TaggedMesh};

// Surfaces are members of their layer's group; probes are members of the skater
// group and filter on exactly one layer, so a ground probe never sees rails.
const GROUP_GROUND: Group = Group::GROUP_1;
const GROUP_RAIL: Group = Group::GROUP_2;
const GROUP_SKATER: Group = Group::GROUP_3;

/// Radius of the capsules laid along rail paths
pub const RAIL_RADIUS: f32 = 0.05;

fn layer_group(layer: Layer) -> Group {
    match layer {
        Layer::Ground => GROUP_GROUND,
        Layer::Rail => GROUP_RAIL,
    }
}

struct SurfaceRecord {
    layer: Layer,
    /// Vertex colours per source triangle, indexed like the source mesh
    triangle_colors: Vec<[Rgba; 3]>,
    rail: Option<RailId>,
}

/// Static rapier world answering the skater's geometry queries.
///
/// Ground meshes are inserted one collider per triangle so a ray hit maps
/// straight back to the authored triangle and its colour tags.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub query_pipeline: QueryPipeline,

    surfaces: Vec<SurfaceRecord>,
    /// Maps Rapier collider handle to its surface and source triangle
    collider_to_surface: HashMap<ColliderHandle, (SurfaceId, Option<u32>)>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            query_pipeline: QueryPipeline::new(),
            surfaces: Vec::new(),
            collider_to_surface: HashMap::new(),
        }
    }

    /// Adds a tagged mesh as static geometry on `layer`.
    pub fn add_surface(&mut self, mesh: &TaggedMesh, layer: Layer) -> Result<SurfaceId, RailBuildError> {
        mesh.validate()?;
        let surface = self.next_surface_id();
        let mut triangle_colors = Vec::with_capacity(mesh.triangles.len());

        for (index, tri) in mesh.triangles.iter().enumerate() {
            let index = index as u32;
            if let Some(colors) = mesh.triangle_colors(index) {
                triangle_colors.push(colors);
            }
            let (Some(a), Some(b), Some(c)) =
                (mesh.vertex(tri[0]), mesh.vertex(tri[1]), mesh.vertex(tri[2]))
            else {
                continue;
            };
            if (b - a).cross(&(c - a)).norm_squared() < 1.0e-12 {
                tracing::debug!(surface = surface.0, triangle = index, "skipping degenerate triangle");
                continue;
            }
            let collider = ColliderBuilder::new(SharedShape::triangle(
                Point3::from(a),
                Point3::from(b),
                Point3::from(c),
            ))
            .collision_groups(InteractionGroups::new(layer_group(layer), Group::ALL))
            .build();
            let handle = self.collider_set.insert(collider);
            self.collider_to_surface.insert(handle, (surface, Some(index)));
        }

        self.surfaces.push(SurfaceRecord {
            layer,
            triangle_colors,
            rail: None,
        });
        self.update_queries();
        Ok(surface)
    }

    /// Lays capsule colliders along a rail path so rail probes can find it.
    pub fn add_rail(&mut self, rail: RailId, path: &RailPath) -> SurfaceId {
        let surface = self.next_surface_id();
        let points = path.points();
        let mut inserted = 0;
        for pair in points.windows(2) {
            if (pair[1] - pair[0]).norm() < 1.0e-5 {
                continue;
            }
            self.insert_rail_collider(
                surface,
                SharedShape::capsule(Point3::from(pair[0]), Point3::from(pair[1]), RAIL_RADIUS),
            );
            inserted += 1;
        }
        if inserted == 0 {
            tracing::warn!(rail = rail.0, "rail has no usable segments, adding a point collider");
            let p = Point3::from(points[0]);
            self.insert_rail_collider(surface, SharedShape::capsule(p, p, RAIL_RADIUS));
        }

        self.surfaces.push(SurfaceRecord {
            layer: Layer::Rail,
            triangle_colors: Vec::new(),
            rail: Some(rail),
        });
        self.update_queries();
        surface
    }

    /// Extracts every rail in `mesh`, registers the paths in `network` and adds their colliders.
    pub fn add_rail_mesh(
        &mut self,
        mesh: &TaggedMesh,
        extractor: &MultiPathExtractor,
        network: &mut RailNetwork,
    ) -> Result<Vec<RailId>, RailBuildError> {
        let paths = extractor.extract(mesh)?;
        let mut ids = Vec::with_capacity(paths.len());
        for path in paths {
            let id = network.insert(path);
            if let Some(shared) = network.get(id).cloned() {
                self.add_rail(id, &shared);
            }
            ids.push(id);
        }
        tracing::info!(rails = ids.len(), "registered rails from mesh");
        Ok(ids)
    }

    /// Rebuilds the query acceleration structure after colliders change.
    pub fn update_queries(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn surface_layer(&self, surface: SurfaceId) -> Option<Layer> {
        self.surfaces.get(surface.0 as usize).map(|s| s.layer)
    }

    fn next_surface_id(&self) -> SurfaceId {
        SurfaceId(self.surfaces.len() as u32)
    }

    fn insert_rail_collider(&mut self, surface: SurfaceId, shape: SharedShape) {
        let collider = ColliderBuilder::new(shape)
            .collision_groups(InteractionGroups::new(GROUP_RAIL, Group::ALL))
            .build();
        let handle = self.collider_set.insert(collider);
        self.collider_to_surface.insert(handle, (surface, None));
    }
}

impl GeometryQuery for PhysicsWorld {
    fn probe(
        &self,
        origin: &Vector3<f32>,
        direction: &Vector3<f32>,
        max_distance: f32,
        layer: Layer,
    ) -> Option<Hit> {
        let dir = direction.try_normalize(1.0e-6)?;
        let ray = Ray::new(Point3::from(*origin), dir);
        let filter =
            QueryFilter::default().groups(InteractionGroups::new(GROUP_SKATER, layer_group(layer)));

        let (handle, intersection) = self.query_pipeline.cast_ray_and_get_normal(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_distance,
            true, // solid
            filter,
        )?;
        let &(surface, triangle) = self.collider_to_surface.get(&handle)?;

        // Triangle normals come back with arbitrary winding; face them toward the probe.
        let normal = match intersection.normal.try_normalize(1.0e-6) {
            Some(n) if n.dot(&dir) > 0.0 => -n,
            Some(n) => n,
            None => -dir,
        };
        Some(Hit {
            point: ray.point_at(intersection.time_of_impact).coords,
            normal,
            distance: intersection.time_of_impact,
            surface,
            triangle,
        })
    }

    fn triangle_colors(&self, surface: SurfaceId, triangle: u32) -> Option<[Rgba; 3]> {
        self.surfaces
            .get(surface.0 as usize)?
            .triangle_colors
            .get(triangle as usize)
            .copied()
    }

    fn rail_at(&self, surface: SurfaceId) -> Option<RailId> {
        self.surfaces.get(surface.0 as usize)?.rail
    }
}
