use super::ground_sensor::sample_ground;
use super::state_machine::StateMachine;
use super::transitions;
use super::{SkaterCore, StateContext};
use crate::game::constants::physics::GRAVITY;
use crate::game::geometry::CollisionMask;
use crate::game::scheduler::ScheduledTask;

/// Executes the phases of one fixed physics step.
/// deferred tasks -> ground sensing -> contact transitions -> state physics -> gravity -> integration.
pub(super) fn run_physics_tick(core: &mut SkaterCore, machine: &mut StateMachine, ctx: &StateContext) {
    // Run deferred tasks that came due.
    for task in core.scheduler.poll(ctx.now) {
        match task {
            ScheduledTask::RestoreCollision => {
                core.body.collision_mask = CollisionMask::ALL;
                tracing::debug!("collision restored");
            }
        }
    }

    // Sense ground.
    let was_grounded = core.body.grounded;
    let reading = sample_ground(
        &mut core.body,
        ctx.world,
        ctx.params,
        machine.kind().is_airborne(),
        ctx.dt,
    );

    // Landing, takeoff and grind entry.
    if let Some(transition) = transitions::evaluate(machine, core, was_grounded, &reading) {
        machine.change_state(transition, core, ctx);
    }

    // Active state physics.
    machine.physics_update(core, ctx);

    // World gravity only for ground states that lost contact; air states run their own.
    let kind = machine.kind();
    if !core.body.grounded && !core.body.grinding && !kind.is_airborne() {
        core.body.velocity.y -= GRAVITY * ctx.dt;
    }

    // Integrate. Grinding places the body on the rail itself.
    let grinding = core.body.grinding;
    core.body.integrate(ctx.dt, !grinding);

    core.intent.clear_edges();
}
