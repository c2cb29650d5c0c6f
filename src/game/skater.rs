use nalgebra::{UnitQuaternion, Vector3};
use rand::rngs::StdRng;
use rand::SeedableRng;

mod body;
mod ground_sensor;
mod rail_probe;
mod state_machine;
mod tick_pipeline;
mod transitions;

pub use body::{GroundContact, SkaterBody};
pub use ground_sensor::{sample_ground, GroundReading};
pub use rail_probe::{probe_for_rail, FeelerSet, GrindRequest};
pub use state_machine::StateMachine;
pub use transitions::{resolve_stance, StanceResolution};

use super::balance::BalanceMeter;
use super::events::{GrindEndReason, SkaterEvent};
use super::geometry::GeometryQuery;
use super::intent::Intent;
use super::rails::RailNetwork;
use super::scheduler::Scheduler;
use super::states::{SkaterState, StateKind};
use crate::config::{PhysicsParameterTable, SkaterStats, StatRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SkaterId(pub u32);

/// Read-only world access for one tick, built by the simulation and handed to every state.
#[derive(Clone, Copy)]
pub struct StateContext<'a> {
    pub params: &'a PhysicsParameterTable,
    pub world: &'a dyn GeometryQuery,
    pub rails: &'a RailNetwork,
    /// Frame delta for logic ticks, the fixed step for physics ticks
    pub dt: f32,
    /// Simulation clock in seconds
    pub now: f64,
}

/// Everything a state may mutate besides its own data.
#[derive(Debug, Clone)]
pub struct SkaterCore {
    pub body: SkaterBody,
    pub stats: SkaterStats,
    pub intent: Intent,
    pub balance: BalanceMeter,
    pub scheduler: Scheduler,
    pub events: Vec<SkaterEvent>,
    /// Set by rail detection, consumed by the next physics tick's transition pass
    pub pending_grind: Option<GrindRequest>,
    /// Blocks re-snapping to a rail until grind input is released
    pub grind_input_consumed: bool,
    pub special_active: bool,
    pub rng: StdRng,
}

impl SkaterCore {
    fn new(body: SkaterBody, stats: SkaterStats, seed: u64) -> Self {
        Self {
            body,
            stats,
            intent: Intent::default(),
            balance: BalanceMeter::new(),
            scheduler: Scheduler::new(),
            events: Vec::new(),
            pending_grind: None,
            grind_input_consumed: false,
            special_active: false,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Stat lookup scaled for the current stance.
    pub fn switched_value(&self, params: &PhysicsParameterTable, range: StatRange, stat: f32) -> f32 {
        params.switched_value(range, stat, self.body.switch_stance)
    }

    pub fn emit(&mut self, event: SkaterEvent) {
        self.events.push(event);
    }
}

/// One simulated skater: body, controls and locomotion state machine.
#[derive(Debug, Clone)]
pub struct Skater {
    id: SkaterId,
    core: SkaterCore,
    machine: StateMachine,
    enabled: bool,
}

impl Skater {
    pub fn new(
        id: SkaterId,
        position: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        stats: SkaterStats,
        seed: u64,
    ) -> Self {
        Self {
            id,
            core: SkaterCore::new(SkaterBody::new(position, rotation), stats, seed),
            machine: StateMachine::new(),
            enabled: true,
        }
    }

    pub fn id(&self) -> SkaterId {
        self.id
    }

    pub fn body(&self) -> &SkaterBody {
        &self.core.body
    }

    /// Direct body access for hosts that teleport or script the skater.
    pub fn body_mut(&mut self) -> &mut SkaterBody {
        &mut self.core.body
    }

    pub fn stats(&self) -> &SkaterStats {
        &self.core.stats
    }

    pub fn balance(&self) -> &BalanceMeter {
        &self.core.balance
    }

    pub fn intent(&self) -> &Intent {
        &self.core.intent
    }

    pub fn state(&self) -> &SkaterState {
        self.machine.current()
    }

    pub fn state_kind(&self) -> StateKind {
        self.machine.kind()
    }

    pub fn previous_state_kind(&self) -> Option<StateKind> {
        self.machine.previous()
    }

    pub fn time_in_state(&self) -> f32 {
        self.machine.time_in_state()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn disable(&mut self) {
        self.enabled = false;
    }

    /// Merges a host input sample into the latched intent.
    pub fn set_intent(&mut self, sample: &Intent) {
        self.core.intent.apply_sample(sample);
    }

    /// Queues a grind entry for the next physics tick. Rail probes use this
    /// internally; hosts can use it to script a grind.
    pub fn request_grind(&mut self, request: GrindRequest) {
        self.core.pending_grind = Some(request);
    }

    pub fn set_special_active(&mut self, active: bool) {
        self.core.special_active = active;
    }

    pub fn is_special_active(&self) -> bool {
        self.core.special_active
    }

    pub fn drain_events(&mut self) -> Vec<SkaterEvent> {
        std::mem::take(&mut self.core.events)
    }

    /// Puts the skater back at rest in StandingStill at the given pose.
    pub fn reset(&mut self, position: Vector3<f32>, rotation: UnitQuaternion<f32>) {
        if let Some(grind) = self.machine.current().as_grinding() {
            let rail = grind.rail();
            self.core.emit(SkaterEvent::GrindEnded {
                rail,
                reason: GrindEndReason::Interrupted,
            });
        }
        self.core.body = SkaterBody::new(position, rotation);
        self.core.balance.stop();
        self.core.scheduler.clear();
        self.core.intent = Intent::default();
        self.core.pending_grind = None;
        self.core.grind_input_consumed = false;
        self.core.special_active = false;
        self.machine = StateMachine::new();
        tracing::debug!(skater = self.id.0, "skater reset");
    }

    /// Frame-rate logic tick: input handling and state-driven transitions.
    pub fn logic_update(&mut self, ctx: &StateContext) {
        if !self.enabled {
            return;
        }
        self.machine.start(&mut self.core, ctx);
        if !self.core.intent.grind_held {
            self.core.grind_input_consumed = false;
        }
        self.machine.logic_update(&mut self.core, ctx);
    }

    /// Fixed-step physics tick.
    pub fn fixed_update(&mut self, ctx: &StateContext) {
        if !self.enabled {
            return;
        }
        self.machine.start(&mut self.core, ctx);
        tick_pipeline::run_physics_tick(&mut self.core, &mut self.machine, ctx);
    }
}
