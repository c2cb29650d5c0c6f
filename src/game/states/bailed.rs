use nalgebra::Vector3;

use super::{LocomotionState, SkatingEntry, Transition};
use crate::game::constants::bailed::{DURATION, ENTRY_MOMENTUM, FRICTION};
use crate::game::events::SkaterEvent;
use crate::game::math::{project_on_plane, yaw_only};
use crate::game::skater::{SkaterCore, StateContext};

/// Crashed. Slides to a stop, then rolls on.
#[derive(Debug, Clone, Default)]
pub struct Bailed {
    elapsed: f32,
}

impl Bailed {
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl LocomotionState for Bailed {
    fn enter(&mut self, core: &mut SkaterCore, _ctx: &StateContext) -> Option<Transition> {
        let body = &mut core.body;
        body.velocity *= ENTRY_MOMENTUM;
        body.angular_velocity = Vector3::zeros();
        body.rotation = yaw_only(&body.rotation);
        core.emit(SkaterEvent::Bailed);
        tracing::info!("bailed");
        None
    }

    fn logic_update(&mut self, _core: &mut SkaterCore, _ctx: &StateContext) -> Option<Transition> {
        if self.elapsed >= DURATION {
            return Some(Transition::Skating(SkatingEntry::Continue));
        }
        None
    }

    fn physics_update(&mut self, core: &mut SkaterCore, ctx: &StateContext) -> Option<Transition> {
        self.elapsed += ctx.dt;
        let body = &mut core.body;
        if body.grounded {
            body.velocity = project_on_plane(&body.velocity, &body.ground_normal);
        }
        body.velocity.x *= FRICTION.powf(ctx.dt * 60.0);
        body.velocity.z *= FRICTION.powf(ctx.dt * 60.0);
        None
    }
}
