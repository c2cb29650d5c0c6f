use nalgebra::Vector3;

use super::{JumpCharge, LocomotionState, SkatingEntry, Transition};
use crate::game::constants::air::SPECIAL_OLLIE_MULTIPLIER;
use crate::game::constants::standing::{PUSH_THRESHOLD, ROTATION_SPEED};
use crate::game::math::{lerp, yaw};
use crate::game::skater::{SkaterCore, StateContext};

/// At rest on the ground. Turns in place, pushes off, or ollies straight up.
#[derive(Debug, Clone, Default)]
pub struct StandingStill {
    jump: JumpCharge,
}

impl LocomotionState for StandingStill {
    fn enter(&mut self, core: &mut SkaterCore, _ctx: &StateContext) -> Option<Transition> {
        self.jump.reset();
        core.body.velocity = Vector3::zeros();
        core.body.angular_velocity = Vector3::zeros();
        None
    }

    fn logic_update(&mut self, core: &mut SkaterCore, ctx: &StateContext) -> Option<Transition> {
        let turn = core.intent.lean();
        if turn.abs() > 0.1 {
            core.body.rotation = yaw(&core.body.rotation, turn * ROTATION_SPEED * ctx.dt);
        }

        if let Some(ratio) = self.jump.update(&mut core.intent, ctx.dt) {
            let base = ctx
                .params
                .stat_value(ctx.params.ollie_vertical_force, core.stats.ollie);
            let mut vertical = lerp(base * 0.5, base, ratio);
            if core.special_active {
                vertical *= SPECIAL_OLLIE_MULTIPLIER;
            }
            core.body.velocity = Vector3::y() * vertical;
            core.body.grounded = false;
            core.body.ignore_ground = true;
            tracing::debug!(ratio, vertical, "standing ollie");
            return Some(Transition::Airborne);
        }

        if !self.jump.is_charging() && core.intent.push() > PUSH_THRESHOLD {
            return Some(Transition::Skating(SkatingEntry::Push));
        }
        None
    }

    fn physics_update(&mut self, core: &mut SkaterCore, _ctx: &StateContext) -> Option<Transition> {
        if !self.jump.is_charging() {
            core.body.velocity = Vector3::zeros();
        }
        None
    }
}
