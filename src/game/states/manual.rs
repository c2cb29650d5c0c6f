use super::{LocomotionState, SkatingEntry, StateKind, Transition};
use crate::game::balance::BalanceKind;
use crate::game::constants::manual::{MIN_SPEED, SPEED_DECAY};
use crate::game::math::project_on_plane;
use crate::game::skater::{SkaterCore, StateContext};

/// Wheelie on the back (or, pushing forward on entry, the front) truck.
#[derive(Debug, Clone, Default)]
pub struct Manual {
    nose: bool,
    speed: f32,
}

impl Manual {
    pub fn is_nose_manual(&self) -> bool {
        self.nose
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }
}

impl LocomotionState for Manual {
    fn enter(&mut self, core: &mut SkaterCore, ctx: &StateContext) -> Option<Transition> {
        self.nose = core.intent.push() > 0.0;
        self.speed = core.body.horizontal_speed();
        let is_switch = core.body.switch_stance;
        core.balance
            .start(BalanceKind::Manual, ctx.params, &core.stats, is_switch);
        tracing::info!(nose = self.nose, speed = self.speed, "manual started");
        None
    }

    fn logic_update(&mut self, core: &mut SkaterCore, ctx: &StateContext) -> Option<Transition> {
        if core.balance.has_bailed() {
            tracing::info!(balance = core.balance.value(), "lost balance in manual");
            return Some(Transition::Bailed);
        }
        if core.intent.take_jump_down() {
            let base = ctx
                .params
                .stat_value(ctx.params.ollie_vertical_force, core.stats.ollie);
            core.body.velocity.y = base * 0.5;
            core.body.grounded = false;
            core.body.ignore_ground = true;
            return Some(Transition::Airborne);
        }
        if self.speed < MIN_SPEED {
            return Some(Transition::Skating(SkatingEntry::Continue));
        }
        None
    }

    fn physics_update(&mut self, core: &mut SkaterCore, ctx: &StateContext) -> Option<Transition> {
        self.speed *= SPEED_DECAY;
        let body = &mut core.body;
        let direction = project_on_plane(&body.forward(), &body.ground_normal)
            .try_normalize(1.0e-6)
            .unwrap_or_else(|| body.facing());
        body.velocity = direction * self.speed;
        let lean = core.intent.lean();
        core.balance.update(lean, ctx.dt, &mut core.rng);
        None
    }

    fn exit(&mut self, core: &mut SkaterCore, _ctx: &StateContext, _next: StateKind) {
        core.balance.stop();
    }
}
