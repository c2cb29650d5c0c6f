use nalgebra::Vector3;

use super::body::{GroundContact, SkaterBody};
use crate::config::PhysicsParameterTable;
use crate::game::constants::ground::{
    PROBE_DISTANCE, PROBE_HEIGHT, SIDE_OFFSET, SNAP_DISTANCE, SNAP_OFFSET, WHEEL_OFFSET,
};
use crate::game::geometry::{hit_matches_color, GeometryQuery, Hit, Layer};

/// Result of one ground sensing pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundReading {
    /// Contact after the post-ollie override
    pub grounded: bool,
    /// Contact as the probes saw it
    pub raw_grounded: bool,
    pub normal: Vector3<f32>,
    pub contact: Option<GroundContact>,
}

/// Casts the wheel probes and updates the body's contact state.
///
/// Probe order is fixed: front, back, then center only when both trucks
/// miss, then the side probes only in air states, then the longer snap probe.
/// The snap probe grounds the board only outside air states, where it also
/// lifts the body to rest just above the contact. Falling bodies get their
/// probes stretched by this tick's drop so a fast fall cannot tunnel.
pub fn sample_ground(
    body: &mut SkaterBody,
    world: &dyn GeometryQuery,
    params: &PhysicsParameterTable,
    airborne: bool,
    dt: f32,
) -> GroundReading {
    let mut reading = GroundReading {
        grounded: false,
        raw_grounded: false,
        normal: Vector3::y(),
        contact: None,
    };
    if !body.collision_mask.allows(Layer::Ground) {
        body.grounded = false;
        return reading;
    }

    let down = -Vector3::y();
    let reach = (-body.velocity.y).max(0.0) * dt;
    let probe = |local: Vector3<f32>, length: f32| -> Option<Hit> {
        let origin = body.transform_point(&local) + Vector3::y() * reach;
        world.probe(&origin, &down, length + reach, Layer::Ground)
    };

    let front = probe(Vector3::new(0.0, PROBE_HEIGHT, WHEEL_OFFSET), PROBE_DISTANCE);
    let back = probe(Vector3::new(0.0, PROBE_HEIGHT, -WHEEL_OFFSET), PROBE_DISTANCE);
    let mut primary = match (&front, &back) {
        (Some(f), Some(b)) => {
            reading.normal = (f.normal + b.normal)
                .try_normalize(1.0e-6)
                .unwrap_or(f.normal);
            Some(*f)
        }
        (Some(hit), None) | (None, Some(hit)) => {
            reading.normal = hit.normal;
            Some(*hit)
        }
        (None, None) => None,
    };

    if primary.is_none() {
        primary = probe(Vector3::new(0.0, PROBE_HEIGHT, 0.0), PROBE_DISTANCE);
    }
    if primary.is_none() && airborne {
        primary = probe(Vector3::new(SIDE_OFFSET, PROBE_HEIGHT, 0.0), PROBE_DISTANCE)
            .or_else(|| probe(Vector3::new(-SIDE_OFFSET, PROBE_HEIGHT, 0.0), PROBE_DISTANCE));
    }
    if front.is_none() || back.is_none() {
        if let Some(hit) = &primary {
            reading.normal = hit.normal;
        }
    }

    let mut snapped = false;
    if primary.is_none() && !airborne {
        if let Some(hit) = probe(Vector3::new(0.0, PROBE_HEIGHT, 0.0), SNAP_DISTANCE) {
            reading.normal = hit.normal;
            primary = Some(hit);
            snapped = true;
        }
    }

    if let Some(hit) = primary {
        reading.raw_grounded = true;
        reading.contact = Some(GroundContact {
            point: hit.point,
            normal: reading.normal,
            surface: hit.surface,
            triangle: hit.triangle,
            is_vert: hit_matches_color(world, &hit, params.vert_color, params.color_tolerance),
        });
        let support = match (&front, &back) {
            (Some(f), Some(b)) => (f.point.y + b.point.y) * 0.5,
            _ => hit.point.y,
        };
        let rest_height = support + SNAP_OFFSET;
        if !airborne && (snapped || body.position.y < rest_height) {
            body.position.y = rest_height;
        }
    }

    reading.grounded = reading.raw_grounded && !body.ignore_ground;
    body.grounded = reading.grounded;
    if reading.raw_grounded {
        body.ground_normal = reading.normal;
        body.last_contact = reading.contact;
    }
    reading
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::geometry::Rgba;
    use crate::game::physics::PhysicsWorld;
    use crate::game::rails::TaggedMesh;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;

    const DT: f32 = 1.0 / 60.0;

    fn floor(color: Rgba) -> PhysicsWorld {
        let mut world = PhysicsWorld::new();
        world
            .add_surface(&TaggedMesh::floor(Vector3::zeros(), 20.0, 20.0, color), Layer::Ground)
            .unwrap();
        world
    }

    fn body_at(y: f32) -> SkaterBody {
        SkaterBody::new(Vector3::new(0.0, y, 0.0), UnitQuaternion::identity())
    }

    #[test]
    fn test_grounded_on_floor() {
        let world = floor(Rgba::new(0.5, 0.5, 0.5, 0.0));
        let params = PhysicsParameterTable::default();
        let mut body = body_at(0.05);
        let reading = sample_ground(&mut body, &world, &params, false, DT);
        assert!(reading.grounded);
        assert_relative_eq!(reading.normal, Vector3::y(), epsilon = 1.0e-4);
        assert!(!reading.contact.unwrap().is_vert);
        assert!(body.grounded);
    }

    #[test]
    fn test_snap_lifts_only_outside_air() {
        let world = floor(Rgba::new(0.5, 0.5, 0.5, 0.0));
        let params = PhysicsParameterTable::default();

        let mut rolling = body_at(0.45);
        assert!(sample_ground(&mut rolling, &world, &params, false, DT).grounded);
        assert_relative_eq!(rolling.position.y, SNAP_OFFSET, epsilon = 1.0e-4);

        let mut flying = body_at(0.45);
        assert!(!sample_ground(&mut flying, &world, &params, true, DT).grounded);
        assert_relative_eq!(flying.position.y, 0.45);
    }

    #[test]
    fn test_ignore_ground_overrides() {
        let world = floor(Rgba::new(0.5, 0.5, 0.5, 0.0));
        let params = PhysicsParameterTable::default();
        let mut body = body_at(0.05);
        body.ignore_ground = true;
        let reading = sample_ground(&mut body, &world, &params, true, DT);
        assert!(reading.raw_grounded);
        assert!(!reading.grounded);
        assert!(!body.grounded);
    }

    #[test]
    fn test_vert_colour_classifies_contact() {
        let world = floor(Rgba::new(0.0, 1.0, 0.0, 0.0));
        let params = PhysicsParameterTable::default();
        let mut body = body_at(0.05);
        let reading = sample_ground(&mut body, &world, &params, false, DT);
        assert!(reading.contact.unwrap().is_vert);
        assert!(body.last_contact.unwrap().is_vert);
    }

    #[test]
    fn test_disabled_mask_never_grounds() {
        let world = floor(Rgba::new(0.5, 0.5, 0.5, 0.0));
        let params = PhysicsParameterTable::default();
        let mut body = body_at(0.05);
        body.collision_mask.ground = false;
        assert!(!sample_ground(&mut body, &world, &params, false, DT).raw_grounded);
    }

    #[test]
    fn test_fast_fall_does_not_tunnel() {
        let world = floor(Rgba::new(0.5, 0.5, 0.5, 0.0));
        let params = PhysicsParameterTable::default();
        // Already a little below the floor after a large integration step.
        let mut body = body_at(-0.15);
        body.velocity.y = -20.0;
        assert!(sample_ground(&mut body, &world, &params, true, DT).raw_grounded);
    }
}
