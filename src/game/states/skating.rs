use nalgebra::Vector3;

use super::{JumpCharge, LocomotionState, SkatingEntry, StateKind, Transition, VertLaunch};
use crate::game::constants::air::SPECIAL_OLLIE_MULTIPLIER;
use crate::game::constants::landing::{
    ALIGN_FACTOR_MAX, ALIGN_FACTOR_MIN, BACKWARD_BIAS_BONUS, BACKWARD_SPEED_FACTOR,
    FACING_BIAS_FAST, FACING_BIAS_SLOW, FACING_BIAS_SPEED, RETENTION_MAX, RETENTION_MIN,
    SLOW_LANDING_FACTOR, SLOW_LANDING_SPEED, SWITCH_BIAS_FACTOR,
};
use crate::game::constants::manual::MIN_SPEED as MIN_MANUAL_SPEED;
use crate::game::constants::skating::{
    BRAKE_THRESHOLD, CONTINUE_MOMENTUM, GROUND_ALIGN_SPEED, LANDING_DAMPING,
    LANDING_TRANSITION_TIME, MIN_SPEED, PUSH_FORCE, TURN_RATE_MAX, TURN_RATE_MIN, VELOCITY_LERP,
};
use crate::game::math::{
    flatten, from_to_rotation, lerp, lerp_vec, look_rotation, move_towards, project_on_plane,
    rotate_towards, yaw,
};
use crate::game::skater::{probe_for_rail, FeelerSet, SkaterCore, StateContext};

/// Rolling on the ground.
///
/// Speed is tracked separately from the body velocity: the body velocity
/// converges on `facing × speed` so turns carve instead of snapping.
#[derive(Debug, Clone)]
pub struct Skating {
    entry: SkatingEntry,
    jump: JumpCharge,
    speed: f32,
    landing_blend: Option<LandingBlend>,
}

#[derive(Debug, Clone, Copy)]
struct LandingBlend {
    elapsed: f32,
    target: Vector3<f32>,
}

impl Skating {
    pub fn new(entry: SkatingEntry) -> Self {
        Self {
            entry,
            jump: JumpCharge::default(),
            speed: 0.0,
            landing_blend: None,
        }
    }

    pub fn entry(&self) -> SkatingEntry {
        self.entry
    }

    /// Speed the state is steering toward this tick.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn is_charging(&self) -> bool {
        self.jump.is_charging()
    }

    pub fn is_landing(&self) -> bool {
        self.landing_blend.is_some()
    }

    fn land(&mut self, core: &mut SkaterCore, switched: bool) {
        let body = &mut core.body;
        let horizontal = project_on_plane(&body.velocity, &body.ground_normal);
        let mut speed = horizontal.norm();
        let facing = body.facing();

        if speed > SLOW_LANDING_SPEED {
            let velocity_dir = horizontal / speed;
            let alignment = velocity_dir.dot(&facing);
            let mut facing_bias = lerp(FACING_BIAS_SLOW, FACING_BIAS_FAST, speed / FACING_BIAS_SPEED);
            if alignment < 0.0 {
                facing_bias += BACKWARD_BIAS_BONUS;
                speed *= BACKWARD_SPEED_FACTOR;
            }
            facing_bias = lerp(facing_bias, 1.0, lerp(0.4, 0.8, core.stats.spin / 10.0));
            if switched {
                facing_bias *= SWITCH_BIAS_FACTOR;
            }

            let blended = lerp_vec(&velocity_dir, &facing, facing_bias)
                .try_normalize(1.0e-6)
                .unwrap_or(facing);
            let retention = lerp(RETENTION_MIN, RETENTION_MAX, alignment * 0.5 + 0.5);
            body.velocity = blended * speed * retention;
            body.rotation = look_rotation(&blended, &Vector3::y());
            self.landing_blend = Some(LandingBlend {
                elapsed: 0.0,
                target: facing,
            });
            tracing::info!(
                speed = body.velocity.norm(),
                facing_bias,
                retention,
                switched,
                "landed"
            );
        } else {
            body.velocity = facing * speed * SLOW_LANDING_FACTOR;
            body.rotation = look_rotation(&facing, &Vector3::y());
            tracing::info!(speed = body.velocity.norm(), "landed slow");
        }
        body.angular_velocity = Vector3::zeros();
        body.velocity *= LANDING_DAMPING;
    }

    /// Pulls the velocity heading toward the pre-landing facing for a short window.
    fn update_landing_blend(&mut self, core: &mut SkaterCore, dt: f32) {
        let Some(blend) = self.landing_blend.as_mut() else {
            return;
        };
        blend.elapsed += dt;
        if blend.elapsed >= LANDING_TRANSITION_TIME {
            self.landing_blend = None;
            return;
        }
        let horizontal = flatten(&core.body.velocity);
        let speed = horizontal.norm();
        if speed > MIN_SPEED {
            let progress = blend.elapsed / LANDING_TRANSITION_TIME;
            let align = lerp(ALIGN_FACTOR_MIN, ALIGN_FACTOR_MAX, progress);
            let blended = lerp_vec(&(horizontal / speed), &blend.target, align)
                .try_normalize(1.0e-6)
                .unwrap_or(blend.target);
            core.body.velocity = blended * speed;
        }
    }

    fn ollie(&mut self, core: &mut SkaterCore, ctx: &StateContext, ratio: f32) -> Transition {
        let params = ctx.params;
        let base = params.stat_value(params.ollie_vertical_force, core.stats.ollie);
        let mut vertical = lerp(base * 0.5, base, ratio);
        let boost_base = params.stat_value(params.ollie_forward_boost, core.stats.ollie);
        let mut forward_boost = lerp(boost_base * 0.2, boost_base, ratio);

        let vert_contact = core.body.last_contact.filter(|c| c.is_vert);
        if vert_contact.is_some() {
            let vert_base = params.stat_value(params.vert_jump_force, core.stats.ollie);
            vertical = lerp(vert_base * 0.5, vert_base, ratio);
            forward_boost = 0.0;
        }
        if core.special_active {
            vertical *= SPECIAL_OLLIE_MULTIPLIER;
        }

        let body = &mut core.body;
        body.velocity = flatten(&body.velocity) + body.forward() * forward_boost + Vector3::y() * vertical;
        body.grounded = false;
        body.ignore_ground = true;
        tracing::debug!(ratio, vertical, forward_boost, vert = vert_contact.is_some(), "ollie");

        match vert_contact {
            Some(contact) => Transition::VertAir(VertLaunch {
                position: body.position,
                normal: contact.normal,
            }),
            None => Transition::Airborne,
        }
    }

    fn align_to_ground(core: &mut SkaterCore, dt: f32) {
        let body = &mut core.body;
        let target = from_to_rotation(&body.up(), &body.ground_normal) * body.rotation;
        body.rotation = rotate_towards(&body.rotation, &target, GROUND_ALIGN_SPEED * dt);
    }

    fn turn(core: &mut SkaterCore, dt: f32) {
        let input = core.intent.lean();
        if input.abs() <= 0.1 {
            return;
        }
        let rate = lerp(TURN_RATE_MIN, TURN_RATE_MAX, core.stats.spin / 10.0);
        let slowdown = lerp(1.0, 0.7, core.body.velocity.norm() / 5.0);
        core.body.rotation = yaw(&core.body.rotation, input * rate * dt * slowdown);
    }

    fn drive(&mut self, core: &mut SkaterCore, ctx: &StateContext) {
        let params = ctx.params;
        let stats = core.stats;
        let dt = ctx.dt;
        let body = &mut core.body;
        let normal = body.ground_normal;

        let momentum = project_on_plane(&body.velocity, &normal).norm();
        let direction = project_on_plane(&body.forward(), &normal)
            .try_normalize(1.0e-6)
            .unwrap_or_else(|| body.facing());
        let max_speed = params.stat_value(params.max_push_speed, stats.speed);

        if self.jump.is_charging() {
            let max_charge_speed = params.stat_value(params.max_jump_charge_speed, stats.speed);
            let boost = params.stat_value(params.jump_charge_boost, stats.accel) * self.jump.ratio();
            self.speed = (momentum + boost * dt).min(max_charge_speed);
        } else if core.intent.push() < BRAKE_THRESHOLD {
            self.speed = (momentum - params.brake_force * dt).max(0.0);
            if self.speed < MIN_SPEED {
                self.speed = 0.0;
                body.velocity = Vector3::zeros();
                return;
            }
        } else {
            let acceleration = params.stat_value(params.acceleration, stats.accel);
            self.speed = move_towards(momentum, max_speed, acceleration * dt).min(max_speed);
            self.speed = (self.speed - params.coast_deceleration * dt).max(0.0);
        }

        let target = direction * self.speed;
        body.velocity = lerp_vec(&body.velocity, &target, dt * VELOCITY_LERP);
    }
}

impl LocomotionState for Skating {
    fn enter(&mut self, core: &mut SkaterCore, ctx: &StateContext) -> Option<Transition> {
        self.jump.reset();
        self.landing_blend = None;
        match self.entry {
            SkatingEntry::Push => {
                core.body.velocity = core.body.facing() * PUSH_FORCE;
            }
            SkatingEntry::Landing { switched } => self.land(core, switched),
            SkatingEntry::Continue => {
                let body = &mut core.body;
                body.velocity = project_on_plane(&body.velocity, &body.ground_normal) * CONTINUE_MOMENTUM;
            }
        }
        // Entry never charges, so the push cap applies from the first tick.
        let max_speed = ctx.params.stat_value(ctx.params.max_push_speed, core.stats.speed);
        let body = &mut core.body;
        self.speed = project_on_plane(&body.velocity, &body.ground_normal).norm();
        if self.speed > max_speed {
            body.velocity *= max_speed / self.speed;
            tracing::debug!(speed = self.speed, max_speed, "entry speed capped");
            self.speed = max_speed;
        }
        None
    }

    fn logic_update(&mut self, core: &mut SkaterCore, ctx: &StateContext) -> Option<Transition> {
        if let Some(ratio) = self.jump.update(&mut core.intent, ctx.dt) {
            return Some(self.ollie(core, ctx, ratio));
        }

        let horizontal = core.body.horizontal_speed();
        if core.intent.take_trick_alt() && horizontal > MIN_MANUAL_SPEED {
            return Some(Transition::Manual);
        }
        if horizontal <= MIN_SPEED && !self.jump.is_charging() && self.landing_blend.is_none() {
            return Some(Transition::StandingStill);
        }

        if core.intent.grind_held
            && !core.grind_input_consumed
            && core.pending_grind.is_none()
            && core.body.velocity.norm() >= ctx.params.min_grind_speed
        {
            if let Some(request) = probe_for_rail(&mut core.body, ctx, FeelerSet::Ground) {
                core.pending_grind = Some(request);
                core.grind_input_consumed = true;
            }
        }
        None
    }

    fn physics_update(&mut self, core: &mut SkaterCore, ctx: &StateContext) -> Option<Transition> {
        if self.landing_blend.is_some() {
            self.update_landing_blend(core, ctx.dt);
            return None;
        }
        Self::align_to_ground(core, ctx.dt);
        Self::turn(core, ctx.dt);
        self.drive(core, ctx);
        None
    }

    fn exit(&mut self, _core: &mut SkaterCore, _ctx: &StateContext, _next: StateKind) {
        self.jump.reset();
        self.landing_blend = None;
    }
}
