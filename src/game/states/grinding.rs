use nalgebra::Vector3;
use std::sync::Arc;

use super::{JumpCharge, LocomotionState, StateKind, Transition};
use crate::game::balance::BalanceKind;
use crate::game::constants::grind::{
    COLLISION_RESTORE_DELAY, LEAN_DEADZONE, PUSH_DEADZONE, ROTATION_ALIGN_SPEED,
    SPEED_BAIL_GRACE, STUCK_MOVEMENT, STUCK_TIME_LIMIT,
};
use crate::game::constants::rail_probe::BOARD_HEIGHT;
use crate::game::events::{GrindEndReason, SkaterEvent};
use crate::game::geometry::CollisionMask;
use crate::game::math::{flatten, lerp_vec, look_rotation, slerp};
use crate::game::rails::{RailId, RailPath};
use crate::game::scheduler::ScheduledTask;
use crate::game::skater::{GrindRequest, SkaterCore, StateContext};

/// Riding a rail path.
///
/// The body is driven by distance along the path rather than integrated.
/// Position and heading are eased toward the path each tick.
#[derive(Debug, Clone)]
pub struct Grinding {
    request: GrindRequest,
    path: Option<Arc<RailPath>>,
    distance: f32,
    /// +1 travels toward increasing distance, -1 toward decreasing
    direction: f32,
    speed: f32,
    elapsed: f32,
    stuck_time: f32,
    last_position: Vector3<f32>,
    jump: JumpCharge,
    push_direction: Vector3<f32>,
    end_reason: GrindEndReason,
}

impl Grinding {
    pub fn new(request: GrindRequest) -> Self {
        Self {
            request,
            path: None,
            distance: request.distance,
            direction: 1.0,
            speed: 0.0,
            elapsed: 0.0,
            stuck_time: 0.0,
            last_position: request.point,
            jump: JumpCharge::default(),
            push_direction: Vector3::zeros(),
            end_reason: GrindEndReason::Interrupted,
        }
    }

    pub fn rail(&self) -> RailId {
        self.request.rail
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    fn travel(&self, tangent: &Vector3<f32>) -> Vector3<f32> {
        tangent * self.direction
    }

    /// World-space push from the held move intent, relative to the board.
    /// Zero inside the deadzone.
    fn held_push(core: &SkaterCore) -> Vector3<f32> {
        let axis = core.intent.move_axis;
        if axis.norm() <= PUSH_DEADZONE {
            return Vector3::zeros();
        }
        let push = core.body.right() * axis.x + core.body.forward() * axis.y;
        flatten(&push).try_normalize(1.0e-6).unwrap_or_else(Vector3::zeros)
    }

    fn launch_off_end(&mut self, core: &mut SkaterCore, path: &RailPath, ctx: &StateContext) -> Transition {
        let sample = path.point_at_distance(self.distance);
        core.body.velocity = self.travel(&sample.tangent) * self.speed * ctx.params.grind.jump_boost;
        self.end_reason = GrindEndReason::RailEnd;
        tracing::debug!(rail = self.request.rail.0, distance = self.distance, "rail end reached");
        Transition::Airborne
    }

    fn bail(&mut self) -> Transition {
        self.end_reason = GrindEndReason::Bail;
        Transition::Bailed
    }
}

impl LocomotionState for Grinding {
    fn enter(&mut self, core: &mut SkaterCore, ctx: &StateContext) -> Option<Transition> {
        let Some(path) = ctx.rails.get(self.request.rail).cloned() else {
            tracing::warn!(rail = self.request.rail.0, "grind target is not a registered rail");
            return Some(Transition::Airborne);
        };
        if path.length() <= 0.0 {
            tracing::warn!(rail = self.request.rail.0, "grind target has zero length");
            return Some(Transition::Airborne);
        }

        let grind = &ctx.params.grind;
        self.distance = path.normalize_distance(self.request.distance);
        let tangent = path.point_at_distance(self.distance).tangent;
        self.direction = if self.request.direction.dot(&tangent) >= 0.0 { 1.0 } else { -1.0 };
        let incoming = core.body.velocity.dot(&tangent).abs();
        self.speed = (incoming * grind.speed_boost).clamp(grind.min_speed, grind.max_speed);

        let body = &mut core.body;
        body.grinding = true;
        body.grounded = false;
        body.collision_mask = CollisionMask::NONE;
        body.velocity = self.travel(&tangent) * self.speed;
        body.angular_velocity = Vector3::zeros();
        self.last_position = body.position;

        // A restore still pending from the previous grind would re-enable probes mid-rail.
        core.scheduler.clear();
        let is_switch = core.body.switch_stance;
        core.balance
            .start(BalanceKind::Grind, ctx.params, &core.stats, is_switch);
        core.emit(SkaterEvent::GrindStarted {
            rail: self.request.rail,
        });
        tracing::info!(
            rail = self.request.rail.0,
            distance = self.distance,
            speed = self.speed,
            "grind started"
        );
        self.path = Some(path);
        None
    }

    fn logic_update(&mut self, core: &mut SkaterCore, ctx: &StateContext) -> Option<Transition> {
        if core.balance.has_bailed() {
            tracing::info!(balance = core.balance.value(), "lost balance on rail");
            return Some(self.bail());
        }
        if self.elapsed > SPEED_BAIL_GRACE && self.speed < ctx.params.grind.min_speed_to_bail {
            tracing::info!(speed = self.speed, "too slow to hold the grind");
            return Some(self.bail());
        }

        if !self.jump.is_charging() {
            self.push_direction = Self::held_push(core);
        }
        if let Some(ratio) = self.jump.update(&mut core.intent, ctx.dt) {
            let path = self.path.as_ref()?;
            let tangent = path.point_at_distance(self.distance).tangent;
            let params = ctx.params;
            let force = core.switched_value(params, params.grind_exit_jump_force, core.stats.ollie);
            core.body.velocity = Vector3::y() * force
                + self.travel(&tangent) * self.speed * params.grind.jump_boost
                + self.push_direction * params.grind.directional_push_force;
            core.body.ignore_ground = true;
            self.end_reason = GrindEndReason::JumpOff;
            tracing::debug!(ratio, force, "grind jump off");
            return Some(Transition::Airborne);
        }
        None
    }

    fn physics_update(&mut self, core: &mut SkaterCore, ctx: &StateContext) -> Option<Transition> {
        let path = self.path.clone()?;
        let grind = &ctx.params.grind;
        let dt = ctx.dt;
        self.elapsed += dt;

        // Push intent counts along the travel direction: pulling back while
        // grinding backward speeds up, anything else bleeds speed.
        let along = core.intent.push() * self.direction;
        if along > LEAN_DEADZONE {
            self.speed += grind.acceleration * dt;
        } else {
            self.speed -= grind.deceleration * dt;
        }
        self.speed = self.speed.clamp(grind.min_speed, grind.max_speed);

        self.distance += self.speed * self.direction * dt;
        let length = path.length();
        if path.is_closed() {
            self.distance = path.normalize_distance(self.distance);
        } else {
            self.distance = self.distance.clamp(0.0, length);
            let at_end = if self.direction > 0.0 {
                self.distance >= length - grind.end_distance
            } else {
                self.distance <= grind.end_distance
            };
            if at_end {
                return Some(self.launch_off_end(core, &path, ctx));
            }
        }

        let sample = path.point_at_distance(self.distance);
        let travel = self.travel(&sample.tangent);
        let target = sample.point + Vector3::y() * BOARD_HEIGHT;
        let body = &mut core.body;
        body.position = lerp_vec(&body.position, &target, grind.snap_strength * dt);
        let heading = look_rotation(&travel, &Vector3::y());
        body.rotation = slerp(&body.rotation, &heading, ROTATION_ALIGN_SPEED * dt);
        body.velocity = travel * self.speed;

        let lean = core.intent.lean();
        core.balance.update(lean, dt, &mut core.rng);

        let moved = (core.body.position - self.last_position).norm_squared();
        self.last_position = core.body.position;
        if moved < (STUCK_MOVEMENT * dt).powi(2) {
            self.stuck_time += dt;
            if self.stuck_time >= STUCK_TIME_LIMIT {
                tracing::warn!(
                    rail = self.request.rail.0,
                    stuck_time = self.stuck_time,
                    "stuck on rail, bailing"
                );
                return Some(self.bail());
            }
        } else {
            self.stuck_time = 0.0;
        }
        None
    }

    fn exit(&mut self, core: &mut SkaterCore, ctx: &StateContext, _next: StateKind) {
        if self.path.is_none() {
            return;
        }
        core.balance.stop();
        core.body.grinding = false;
        core.scheduler
            .schedule(ctx.now, COLLISION_RESTORE_DELAY, ScheduledTask::RestoreCollision);
        core.emit(SkaterEvent::GrindEnded {
            rail: self.request.rail,
            reason: self.end_reason,
        });
        tracing::info!(rail = self.request.rail.0, reason = ?self.end_reason, "grind ended");
    }
}
