//! Locomotion states.
//!
//! Each state owns the data for one physical regime and implements
//! [`LocomotionState`]. States never switch themselves: they return a
//! [`Transition`] and the skater's state machine applies it, so `enter` and
//! `exit` always run in a well-defined order.

mod airborne;
mod bailed;
mod grinding;
mod manual;
mod skating;
mod standing;
mod vert_air;

pub use airborne::{Airborne, TrickKind};
pub use bailed::Bailed;
pub use grinding::Grinding;
pub use manual::Manual;
pub use skating::Skating;
pub use standing::StandingStill;
pub use vert_air::VertAir;

use nalgebra::Vector3;
use std::fmt;

use super::constants::skating::MAX_JUMP_CHARGE_TIME;
use super::intent::Intent;
use super::math::clamp01;
use super::skater::{GrindRequest, SkaterCore, StateContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    StandingStill,
    Skating,
    Airborne,
    VertAir,
    Grinding,
    Manual,
    Bailed,
}

impl StateKind {
    pub fn name(&self) -> &'static str {
        match self {
            StateKind::StandingStill => "StandingStill",
            StateKind::Skating => "Skating",
            StateKind::Airborne => "Airborne",
            StateKind::VertAir => "VertAir",
            StateKind::Grinding => "Grinding",
            StateKind::Manual => "Manual",
            StateKind::Bailed => "Bailed",
        }
    }

    /// States that run their own fake gravity and can land.
    pub fn is_airborne(&self) -> bool {
        matches!(self, StateKind::Airborne | StateKind::VertAir)
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How Skating was entered; decides how it initializes velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkatingEntry {
    /// Kick off from standing
    Push,
    /// Touchdown from an air state. `switched` is set when the landing flipped stance.
    Landing { switched: bool },
    /// Rolling on from Manual or Bailed
    Continue,
}

/// Launch data for an ollie off (or a roll-out over) a vert surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertLaunch {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
}

/// A requested state change, applied by the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    StandingStill,
    Skating(SkatingEntry),
    Airborne,
    VertAir(VertLaunch),
    Grinding(GrindRequest),
    Manual,
    Bailed,
}

impl Transition {
    pub fn target(&self) -> StateKind {
        match self {
            Transition::StandingStill => StateKind::StandingStill,
            Transition::Skating(_) => StateKind::Skating,
            Transition::Airborne => StateKind::Airborne,
            Transition::VertAir(_) => StateKind::VertAir,
            Transition::Grinding(_) => StateKind::Grinding,
            Transition::Manual => StateKind::Manual,
            Transition::Bailed => StateKind::Bailed,
        }
    }
}

/// Shared state contract.
///
/// `logic_update` runs once per rendered frame with the frame delta in
/// `ctx.dt`; `physics_update` runs on the fixed 60 Hz step. A returned
/// transition is applied immediately, before anything else reads the state.
pub trait LocomotionState {
    fn enter(&mut self, _core: &mut SkaterCore, _ctx: &StateContext) -> Option<Transition> {
        None
    }

    fn logic_update(&mut self, _core: &mut SkaterCore, _ctx: &StateContext) -> Option<Transition> {
        None
    }

    fn physics_update(&mut self, _core: &mut SkaterCore, _ctx: &StateContext) -> Option<Transition> {
        None
    }

    /// Runs before the next state's `enter`. `next` is the state being entered.
    fn exit(&mut self, _core: &mut SkaterCore, _ctx: &StateContext, _next: StateKind) {}
}

/// The active state and its data.
#[derive(Debug, Clone)]
pub enum SkaterState {
    StandingStill(StandingStill),
    Skating(Skating),
    Airborne(Airborne),
    VertAir(VertAir),
    Grinding(Grinding),
    Manual(Manual),
    Bailed(Bailed),
}

impl Default for SkaterState {
    fn default() -> Self {
        SkaterState::StandingStill(StandingStill::default())
    }
}

impl From<Transition> for SkaterState {
    fn from(transition: Transition) -> Self {
        match transition {
            Transition::StandingStill => SkaterState::StandingStill(StandingStill::default()),
            Transition::Skating(entry) => SkaterState::Skating(Skating::new(entry)),
            Transition::Airborne => SkaterState::Airborne(Airborne::default()),
            Transition::VertAir(launch) => SkaterState::VertAir(VertAir::new(launch)),
            Transition::Grinding(request) => SkaterState::Grinding(Grinding::new(request)),
            Transition::Manual => SkaterState::Manual(Manual::default()),
            Transition::Bailed => SkaterState::Bailed(Bailed::default()),
        }
    }
}

impl SkaterState {
    pub fn kind(&self) -> StateKind {
        match self {
            SkaterState::StandingStill(_) => StateKind::StandingStill,
            SkaterState::Skating(_) => StateKind::Skating,
            SkaterState::Airborne(_) => StateKind::Airborne,
            SkaterState::VertAir(_) => StateKind::VertAir,
            SkaterState::Grinding(_) => StateKind::Grinding,
            SkaterState::Manual(_) => StateKind::Manual,
            SkaterState::Bailed(_) => StateKind::Bailed,
        }
    }

    pub fn as_state_mut(&mut self) -> &mut dyn LocomotionState {
        match self {
            SkaterState::StandingStill(s) => s,
            SkaterState::Skating(s) => s,
            SkaterState::Airborne(s) => s,
            SkaterState::VertAir(s) => s,
            SkaterState::Grinding(s) => s,
            SkaterState::Manual(s) => s,
            SkaterState::Bailed(s) => s,
        }
    }

    /// Total yaw accumulated in the current air session, in degrees.
    pub fn air_yaw_degrees(&self) -> Option<f32> {
        match self {
            SkaterState::Airborne(s) => Some(s.total_yaw()),
            SkaterState::VertAir(s) => Some(s.total_yaw()),
            _ => None,
        }
    }

    pub fn as_grinding(&self) -> Option<&Grinding> {
        match self {
            SkaterState::Grinding(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_skating(&self) -> Option<&Skating> {
        match self {
            SkaterState::Skating(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_airborne(&self) -> Option<&Airborne> {
        match self {
            SkaterState::Airborne(s) => Some(s),
            _ => None,
        }
    }
}

/// Hold-to-charge, release-to-jump tracking shared by the jumping states.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JumpCharge {
    charging: bool,
    time: f32,
}

impl JumpCharge {
    /// Advances the charge and returns the charge ratio on the tick the jump is released.
    ///
    /// A press and release sampled in the same frame jumps at ratio 0. Letting
    /// go without a release edge cancels the charge.
    pub fn update(&mut self, intent: &mut Intent, dt: f32) -> Option<f32> {
        let pressed = intent.take_jump_down();
        if !self.charging && (pressed || intent.jump_held) {
            self.charging = true;
            self.time = 0.0;
        }
        if !self.charging {
            return None;
        }
        if intent.take_jump_up() {
            let ratio = self.ratio();
            self.reset();
            return Some(ratio);
        }
        if intent.jump_held {
            self.time = (self.time + dt).min(MAX_JUMP_CHARGE_TIME);
        } else {
            self.reset();
        }
        None
    }

    pub fn is_charging(&self) -> bool {
        self.charging
    }

    pub fn ratio(&self) -> f32 {
        clamp01(self.time / MAX_JUMP_CHARGE_TIME)
    }

    pub fn reset(&mut self) {
        self.charging = false;
        self.time = 0.0;
    }
}
