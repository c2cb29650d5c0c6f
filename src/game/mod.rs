pub mod balance;
pub mod constants;
pub mod events;
pub mod geometry;
pub mod intent;
pub mod math;
pub mod physics;
pub mod rails;
pub mod scheduler;
pub mod skater;
pub mod states;

use nalgebra::{UnitQuaternion, Vector3};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{PhysicsParameterTable, SkaterStats};
use constants::physics::{MAX_FRAME_DELTA, TIMESTEP};
use events::SkaterEvent;
use geometry::GeometryQuery;
use intent::Intent;
use rails::RailNetwork;
use skater::{Skater, SkaterId, StateContext};

/// Setup-time failures. Runtime degradations never surface here.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("no physics parameter table was provided")]
    MissingParameterTable,

    #[error("unknown skater {0:?}")]
    UnknownSkater(SkaterId),
}

/// Owns the world, the rails, the tuning and every skater, and drives them
/// with one logic tick per frame plus fixed 60 Hz physics ticks.
pub struct Simulation<W: GeometryQuery> {
    world: W,
    rails: RailNetwork,
    params: Option<Arc<PhysicsParameterTable>>,
    skaters: Vec<Skater>,
    seed: u64,
    /// Seconds of simulated physics time
    clock: f64,
    accumulator: f32,
    physics_ticks: u64,
    pub paused: bool,
}

impl<W: GeometryQuery> Simulation<W> {
    pub fn new(world: W, rails: RailNetwork, params: Arc<PhysicsParameterTable>) -> Self {
        Self::build(world, rails, Some(params))
    }

    /// A simulation with no parameter table. Skaters spawned into it are
    /// inert: they are created, reported once, and never ticked.
    pub fn without_parameters(world: W, rails: RailNetwork) -> Self {
        Self::build(world, rails, None)
    }

    fn build(world: W, rails: RailNetwork, params: Option<Arc<PhysicsParameterTable>>) -> Self {
        Self {
            world,
            rails,
            params,
            skaters: Vec::new(),
            seed: 0,
            clock: 0.0,
            accumulator: 0.0,
            physics_ticks: 0,
            paused: false,
        }
    }

    /// Base seed for skater balance wobble; each skater offsets it by its id.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn rails(&self) -> &RailNetwork {
        &self.rails
    }

    pub fn params(&self) -> Result<&PhysicsParameterTable, SetupError> {
        self.params.as_deref().ok_or(SetupError::MissingParameterTable)
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn physics_ticks(&self) -> u64 {
        self.physics_ticks
    }

    pub fn skater_ids(&self) -> impl Iterator<Item = SkaterId> + '_ {
        self.skaters.iter().map(|s| s.id())
    }

    pub fn spawn_skater(
        &mut self,
        position: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        stats: SkaterStats,
    ) -> SkaterId {
        let id = SkaterId(self.skaters.len() as u32);
        let mut skater = Skater::new(id, position, rotation, stats, self.seed.wrapping_add(id.0 as u64));
        if self.params.is_none() {
            tracing::error!(
                skater = id.0,
                error = %SetupError::MissingParameterTable,
                "skater spawned without a parameter table, it will not move"
            );
            skater.disable();
        } else {
            tracing::debug!(skater = id.0, ?position, "skater spawned");
        }
        self.skaters.push(skater);
        id
    }

    pub fn skater(&self, id: SkaterId) -> Result<&Skater, SetupError> {
        self.skaters
            .get(id.0 as usize)
            .ok_or(SetupError::UnknownSkater(id))
    }

    pub fn skater_mut(&mut self, id: SkaterId) -> Result<&mut Skater, SetupError> {
        self.skaters
            .get_mut(id.0 as usize)
            .ok_or(SetupError::UnknownSkater(id))
    }

    pub fn set_intent(&mut self, id: SkaterId, sample: &Intent) -> Result<(), SetupError> {
        self.skater_mut(id)?.set_intent(sample);
        Ok(())
    }

    pub fn drain_events(&mut self, id: SkaterId) -> Result<Vec<SkaterEvent>, SetupError> {
        Ok(self.skater_mut(id)?.drain_events())
    }

    /// One logic tick for every skater.
    pub fn update(&mut self, frame_dt: f32) {
        if self.paused {
            return;
        }
        let Some(params) = self.params.as_deref() else {
            return;
        };
        let ctx = StateContext {
            params,
            world: &self.world,
            rails: &self.rails,
            dt: frame_dt,
            now: self.clock,
        };
        for skater in self.skaters.iter_mut() {
            skater.logic_update(&ctx);
        }
    }

    /// One physics tick of `dt` seconds for every skater.
    pub fn fixed_update(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        let Some(params) = self.params.as_deref() else {
            return;
        };
        self.clock += dt as f64;
        self.physics_ticks += 1;
        let ctx = StateContext {
            params,
            world: &self.world,
            rails: &self.rails,
            dt,
            now: self.clock,
        };
        for skater in self.skaters.iter_mut() {
            skater.fixed_update(&ctx);
        }
    }

    /// Exactly one logic tick and one physics tick, both of `dt`.
    pub fn step(&mut self, dt: f32) {
        self.update(dt);
        self.fixed_update(dt);
    }

    /// Frame driver: one logic tick, then as many fixed physics ticks as the
    /// accumulated time allows. Returns the number of physics ticks run.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if self.paused {
            return 0;
        }
        self.update(frame_dt);
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DELTA);
        let mut ticks = 0;
        while self.accumulator >= TIMESTEP {
            self.fixed_update(TIMESTEP);
            self.accumulator -= TIMESTEP;
            ticks += 1;
        }
        ticks
    }
}
