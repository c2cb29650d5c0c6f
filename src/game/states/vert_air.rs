use super::airborne::{apply_air_gravity, apply_air_spin, settle_landing};
use super::{LocomotionState, StateKind, Transition, VertLaunch};
use crate::game::constants::air::IGNORE_GROUND_WINDOW;
use crate::game::events::SkaterEvent;
use crate::game::skater::{SkaterCore, StateContext};

/// Air off a vert wall: straight up and back down over the launch point,
/// with spin as the only freedom.
#[derive(Debug, Clone)]
pub struct VertAir {
    launch: VertLaunch,
    airtime: f32,
    total_yaw: f32,
    spin_rate: f32,
}

impl VertAir {
    pub fn new(launch: VertLaunch) -> Self {
        Self {
            launch,
            airtime: 0.0,
            total_yaw: 0.0,
            spin_rate: 0.0,
        }
    }

    pub fn launch(&self) -> &VertLaunch {
        &self.launch
    }

    pub fn total_yaw(&self) -> f32 {
        self.total_yaw
    }

    fn lock_to_launch(&self, core: &mut SkaterCore) {
        core.body.position.x = self.launch.position.x;
        core.body.position.z = self.launch.position.z;
        core.body.velocity.x = 0.0;
        core.body.velocity.z = 0.0;
    }
}

impl LocomotionState for VertAir {
    fn enter(&mut self, core: &mut SkaterCore, _ctx: &StateContext) -> Option<Transition> {
        core.body.grounded = false;
        self.lock_to_launch(core);
        tracing::debug!(
            normal = ?self.launch.normal,
            vertical = core.body.velocity.y,
            "vert launch"
        );
        None
    }

    fn physics_update(&mut self, core: &mut SkaterCore, ctx: &StateContext) -> Option<Transition> {
        let dt = ctx.dt;
        self.airtime += dt;
        if core.body.ignore_ground && self.airtime >= IGNORE_GROUND_WINDOW {
            core.body.ignore_ground = false;
        }
        apply_air_gravity(&mut core.body, dt);
        self.total_yaw += apply_air_spin(core, &mut self.spin_rate, dt);
        self.lock_to_launch(core);
        None
    }

    fn exit(&mut self, core: &mut SkaterCore, _ctx: &StateContext, next: StateKind) {
        if next == StateKind::Skating {
            let switch_stance = core.body.switch_stance;
            core.emit(SkaterEvent::Landed {
                clean: true,
                trick: None,
                switch_stance,
            });
        }
        settle_landing(&mut core.body);
    }
}
