use nalgebra::Vector3;

use super::{LocomotionState, StateKind, Transition};
use crate::game::constants::air::{
    AIR_RESISTANCE, BOUNCE_FACTOR, FAKE_GRAVITY, FALLING_GRAVITY_MULTIPLIER, GRIND_PROBE_AIRTIME,
    IGNORE_GROUND_WINDOW, LANDING_TILT, MAX_BOUNCE, RISING_GRAVITY_MULTIPLIER, SPIN_DAMPING,
    SPIN_INPUT_DEADZONE, SPIN_SPEED_MAX, SPIN_SPEED_MIN, TRICK_COMPLETE_AIRTIME,
    TRICK_COMPLETE_ROTATION, TRICK_COMPLETE_TILT, TRICK_MIN_AIRTIME, TRICK_ROTATION_SPEED,
};
use crate::game::events::SkaterEvent;
use crate::game::math::{lerp, tilt_degrees, yaw, yaw_only};
use crate::game::skater::{probe_for_rail, FeelerSet, SkaterBody, SkaterCore, StateContext};

/// Flip tricks available in the air.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrickKind {
    Kickflip,
    Heelflip,
    ThreeSixtyFlip,
}

impl TrickKind {
    pub fn name(&self) -> &'static str {
        match self {
            TrickKind::Kickflip => "Kickflip",
            TrickKind::Heelflip => "Heelflip",
            TrickKind::ThreeSixtyFlip => "360 Flip",
        }
    }

    /// Body-local rotation axis, signed for the flip direction.
    fn axis(&self) -> Vector3<f32> {
        match self {
            TrickKind::Kickflip => Vector3::z(),
            TrickKind::Heelflip => -Vector3::z(),
            TrickKind::ThreeSixtyFlip => (Vector3::z() + Vector3::y() * 0.5).normalize(),
        }
    }

    fn speed_multiplier(&self) -> f32 {
        match self {
            TrickKind::ThreeSixtyFlip => 1.2,
            _ => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveTrick {
    kind: TrickKind,
    /// Degrees per second
    rate: f32,
    rotation: f32,
}

/// Ballistic flight with a floaty fake gravity.
///
/// Enter keeps whatever velocity the launching state produced.
#[derive(Debug, Clone, Default)]
pub struct Airborne {
    airtime: f32,
    total_yaw: f32,
    spin_rate: f32,
    trick: Option<ActiveTrick>,
}

impl Airborne {
    pub fn airtime(&self) -> f32 {
        self.airtime
    }

    pub fn total_yaw(&self) -> f32 {
        self.total_yaw
    }

    pub fn active_trick(&self) -> Option<TrickKind> {
        self.trick.map(|t| t.kind)
    }

    fn start_trick(&mut self, core: &mut SkaterCore, kind: TrickKind) {
        let rate = TRICK_ROTATION_SPEED * core.stats.flip_speed / 5.0 * kind.speed_multiplier();
        core.body.angular_velocity = kind.axis() * rate.to_radians();
        self.trick = Some(ActiveTrick {
            kind,
            rate,
            rotation: 0.0,
        });
        tracing::debug!(trick = kind.name(), rate, "trick started");
    }

    fn update_trick(&mut self, core: &mut SkaterCore, dt: f32) {
        let Some(trick) = self.trick.as_mut() else {
            return;
        };
        trick.rotation += trick.rate * dt;
        let tilt = tilt_degrees(&core.body.rotation);
        if trick.rotation.abs() > TRICK_COMPLETE_ROTATION
            && tilt < TRICK_COMPLETE_TILT
            && self.airtime > TRICK_COMPLETE_AIRTIME
        {
            let kind = trick.kind;
            let rotation = trick.rotation;
            self.trick = None;
            core.body.angular_velocity *= 0.2;
            core.emit(SkaterEvent::TrickCompleted {
                name: kind.name(),
                rotation_degrees: rotation,
            });
            tracing::info!(trick = kind.name(), rotation, "trick completed");
        }
    }
}

/// Fake gravity, heavier on the way down.
pub(super) fn apply_air_gravity(body: &mut SkaterBody, dt: f32) {
    let multiplier = if body.velocity.y > 0.0 {
        RISING_GRAVITY_MULTIPLIER
    } else {
        FALLING_GRAVITY_MULTIPLIER
    };
    body.velocity.y -= FAKE_GRAVITY * multiplier * dt;
}

/// Spin from horizontal intent, decaying once released. Returns the yaw applied in degrees.
pub(super) fn apply_air_spin(core: &mut SkaterCore, spin_rate: &mut f32, dt: f32) -> f32 {
    let input = core.intent.lean();
    if input.abs() > SPIN_INPUT_DEADZONE {
        *spin_rate = input * lerp(SPIN_SPEED_MIN, SPIN_SPEED_MAX, core.stats.spin / 10.0);
    } else {
        *spin_rate *= SPIN_DAMPING.powf(dt * 60.0);
    }
    let delta = *spin_rate * dt;
    if delta != 0.0 {
        core.body.rotation = yaw(&core.body.rotation, delta);
    }
    delta
}

/// Leaves the air: vertical velocity is zeroed or turned into a small bounce,
/// spin stops and the board is levelled.
pub(super) fn settle_landing(body: &mut SkaterBody) {
    body.velocity.y = if body.velocity.y < 0.0 {
        (-body.velocity.y * BOUNCE_FACTOR).min(MAX_BOUNCE)
    } else {
        0.0
    };
    body.angular_velocity = Vector3::zeros();
    body.rotation = yaw_only(&body.rotation);
    body.ignore_ground = false;
}

impl LocomotionState for Airborne {
    fn enter(&mut self, core: &mut SkaterCore, _ctx: &StateContext) -> Option<Transition> {
        core.body.grounded = false;
        None
    }

    fn logic_update(&mut self, core: &mut SkaterCore, _ctx: &StateContext) -> Option<Transition> {
        if self.trick.is_some() || self.airtime < TRICK_MIN_AIRTIME {
            return None;
        }
        if core.intent.take_trick_primary() {
            self.start_trick(core, TrickKind::Kickflip);
        } else if core.intent.take_trick_alt() {
            self.start_trick(core, TrickKind::Heelflip);
        } else if core.intent.take_trick_special() {
            self.start_trick(core, TrickKind::ThreeSixtyFlip);
        }
        None
    }

    fn physics_update(&mut self, core: &mut SkaterCore, ctx: &StateContext) -> Option<Transition> {
        let dt = ctx.dt;
        self.airtime += dt;
        if core.body.ignore_ground && self.airtime >= IGNORE_GROUND_WINDOW {
            core.body.ignore_ground = false;
        }

        apply_air_gravity(&mut core.body, dt);
        let resistance = AIR_RESISTANCE.powf(dt * 60.0);
        core.body.velocity.x *= resistance;
        core.body.velocity.z *= resistance;

        self.total_yaw += apply_air_spin(core, &mut self.spin_rate, dt);
        self.update_trick(core, dt);

        if self.airtime >= GRIND_PROBE_AIRTIME
            && core.intent.grind_held
            && !core.grind_input_consumed
            && core.pending_grind.is_none()
            && core.body.velocity.norm() >= ctx.params.min_grind_speed
        {
            if let Some(request) = probe_for_rail(&mut core.body, ctx, FeelerSet::Air) {
                core.pending_grind = Some(request);
                core.grind_input_consumed = true;
                self.spin_rate = 0.0;
                core.body.angular_velocity = Vector3::zeros();
            }
        }
        None
    }

    fn exit(&mut self, core: &mut SkaterCore, _ctx: &StateContext, next: StateKind) {
        if next == StateKind::Skating {
            let tilt = tilt_degrees(&core.body.rotation);
            let unfinished = self.trick.map(|t| t.kind);
            let clean = unfinished.is_none() || tilt <= LANDING_TILT;
            if !clean {
                tracing::info!(trick = ?unfinished.map(|k| k.name()), tilt, "failed trick landing");
            }
            let switch_stance = core.body.switch_stance;
            core.emit(SkaterEvent::Landed {
                clean,
                trick: unfinished.map(|k| k.name()),
                switch_stance,
            });
        }
        settle_landing(&mut core.body);
        self.trick = None;
    }
}
