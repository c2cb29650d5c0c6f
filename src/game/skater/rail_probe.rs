use nalgebra::Vector3;

use super::body::SkaterBody;
use super::StateContext;
use crate::game::constants::rail_probe::{
    BOARD_HEIGHT, DETECTION_DISTANCE, ENTRY_ANGLE_DEGREES, MAX_VERTICAL_OFFSET,
};
use crate::game::geometry::{Hit, Layer};
use crate::game::math::{angle_degrees, flatten, look_rotation};
use crate::game::rails::RailId;

/// Rail chosen by a probe, handed to Grinding on the next physics tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrindRequest {
    pub rail: RailId,
    /// Closest point on the rail path
    pub point: Vector3<f32>,
    /// Travel direction along the rail, unit length
    pub direction: Vector3<f32>,
    /// Distance along the rail path of `point`
    pub distance: f32,
    pub normal: Vector3<f32>,
}

/// Which set of feelers to cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeelerSet {
    /// Compact pattern under the board while rolling
    Ground,
    /// Wider pattern with sideways and upward reach while in the air
    Air,
}

const GROUND_FEELERS: [[f32; 3]; 9] = [
    [-0.3, -0.15, 0.4],
    [0.0, -0.15, 0.4],
    [0.3, -0.15, 0.4],
    [-0.3, -0.15, 0.0],
    [0.0, -0.15, 0.0],
    [0.3, -0.15, 0.0],
    [-0.3, -0.15, -0.4],
    [0.0, -0.15, -0.4],
    [0.3, -0.15, -0.4],
];

const AIR_EXTRA_FEELERS: [[f32; 3]; 6] = [
    [0.4, 0.0, 0.0],
    [-0.4, 0.0, 0.0],
    [0.3, 0.0, 0.4],
    [-0.3, 0.0, 0.4],
    [0.3, 0.0, -0.4],
    [-0.3, 0.0, -0.4],
];

const GROUND_DIRECTIONS: [[f32; 3]; 7] = [
    [0.0, -1.0, 0.0],
    [0.0, -0.9, 0.1],
    [0.0, -0.9, -0.1],
    [0.1, -0.9, 0.0],
    [-0.1, -0.9, 0.0],
    [0.3, -0.9, 0.0],
    [-0.3, -0.9, 0.0],
];

const AIR_DIRECTIONS: [[f32; 3]; 13] = [
    [0.0, -1.0, 0.0],
    [0.0, -0.9, 0.1],
    [0.0, -0.9, -0.1],
    [0.1, -0.9, 0.0],
    [-0.1, -0.9, 0.0],
    [0.0, -0.7, 0.3],
    [0.0, -0.7, -0.3],
    [1.0, 0.0, 0.0],
    [-1.0, 0.0, 0.0],
    [0.707, 0.707, 0.0],
    [-0.707, 0.707, 0.0],
    [0.0, 0.3, 1.0],
    [0.0, 0.3, -1.0],
];

/// Combined-distance cutoff that lets a far-below hit through the vertical filter
const COMBINED_ACCEPT: f32 = 1.25;

struct RailCandidate {
    rail: RailId,
    hit: Hit,
    score: f32,
}

fn feelers(set: FeelerSet) -> Vec<Vector3<f32>> {
    let mut out: Vec<Vector3<f32>> = GROUND_FEELERS.iter().map(|p| Vector3::from(*p)).collect();
    if set == FeelerSet::Air {
        out.extend(AIR_EXTRA_FEELERS.iter().map(|p| Vector3::from(*p)));
    }
    out
}

fn directions(set: FeelerSet) -> impl Iterator<Item = Vector3<f32>> {
    let table: &'static [[f32; 3]] = match set {
        FeelerSet::Ground => &GROUND_DIRECTIONS,
        FeelerSet::Air => &AIR_DIRECTIONS,
    };
    table.iter().map(|d| Vector3::from(*d).normalize())
}

/// Casts the feeler pattern and returns the rail hit with the best combined
/// horizontal and vertical offset.
fn best_rail_hit(body: &SkaterBody, ctx: &StateContext, set: FeelerSet) -> Option<RailCandidate> {
    let mut best: Option<RailCandidate> = None;
    for feeler in feelers(set) {
        let origin = body.transform_point(&feeler);
        for local_dir in directions(set) {
            let dir = body.rotation * local_dir;
            let Some(hit) = ctx.world.probe(&origin, &dir, DETECTION_DISTANCE, Layer::Rail) else {
                continue;
            };
            let Some(rail) = ctx.world.rail_at(hit.surface) else {
                continue;
            };
            let offset = hit.point - origin;
            let vertical = offset.dot(&hit.normal).abs();
            let horizontal = (offset - hit.normal * offset.dot(&hit.normal)).norm();
            let score = horizontal + 0.5 * vertical;

            if dir.y < -0.5 && vertical > MAX_VERTICAL_OFFSET {
                continue;
            }
            if vertical > MAX_VERTICAL_OFFSET && score >= COMBINED_ACCEPT {
                continue;
            }
            if best.as_ref().map_or(true, |b| score < b.score) {
                best = Some(RailCandidate { rail, hit, score });
            }
        }
    }
    best
}

/// Looks for a grindable rail around the board and, on success, snaps the
/// body onto it and returns the grind request.
///
/// Entry requires horizontal travel within the entry angle of either rail
/// direction. The body is placed just above the rail, faces along the chosen
/// direction and keeps at least the minimum grind speed, boosted.
pub fn probe_for_rail(
    body: &mut SkaterBody,
    ctx: &StateContext,
    set: FeelerSet,
) -> Option<GrindRequest> {
    if !body.collision_mask.allows(Layer::Rail) || ctx.rails.is_empty() {
        return None;
    }
    let candidate = best_rail_hit(body, ctx, set)?;
    let Some(path) = ctx.rails.get(candidate.rail) else {
        tracing::warn!(rail = candidate.rail.0, "rail collider has no registered path");
        return None;
    };
    let nearest = path.nearest_point(&candidate.hit.point);

    let travel = flatten(&body.velocity)
        .try_normalize(1.0e-4)
        .unwrap_or_else(|| body.facing());
    let direction = if angle_degrees(&travel, &nearest.tangent) <= ENTRY_ANGLE_DEGREES {
        nearest.tangent
    } else if angle_degrees(&travel, &-nearest.tangent) <= ENTRY_ANGLE_DEGREES {
        -nearest.tangent
    } else {
        tracing::debug!(rail = candidate.rail.0, "rail rejected, approach angle too steep");
        return None;
    };

    let speed_along = body.velocity.dot(&direction).abs();
    let entry_speed = speed_along.max(ctx.params.min_grind_speed) * ctx.params.grind_entry_speed_boost;
    body.position = nearest.point + Vector3::y() * BOARD_HEIGHT;
    body.rotation = look_rotation(&direction, &Vector3::y());
    body.velocity = direction * entry_speed;

    tracing::debug!(
        rail = candidate.rail.0,
        distance = nearest.distance,
        speed = entry_speed,
        "rail detected"
    );
    Some(GrindRequest {
        rail: candidate.rail,
        point: nearest.point,
        direction,
        distance: nearest.distance,
        normal: candidate.hit.normal,
    })
}
