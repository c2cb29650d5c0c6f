use super::ground_sensor::GroundReading;
use super::state_machine::StateMachine;
use super::SkaterCore;
use crate::game::constants::landing::STANCE_WINDOW;
use crate::game::states::{SkatingEntry, StateKind, Transition, VertLaunch};

/// Stance outcome of a landing, from the yaw accumulated in the air.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StanceResolution {
    /// Within the window around 0°
    Keep,
    /// Within the window around 180°
    Toggle,
    /// Between the windows; lands without a stance change
    BailZone,
}

/// Classifies an accumulated air yaw (any number of turns) into a stance outcome.
pub fn resolve_stance(total_yaw_degrees: f32) -> StanceResolution {
    let angle = (total_yaw_degrees + 180.0).rem_euclid(360.0) - 180.0;
    if angle.abs() <= STANCE_WINDOW {
        StanceResolution::Keep
    } else if angle.abs() >= 180.0 - STANCE_WINDOW {
        StanceResolution::Toggle
    } else {
        StanceResolution::BailZone
    }
}

/// Contact-driven transitions, checked once per physics tick before the
/// active state's physics. Grinding owns its own exits and is skipped.
///
/// Priority: landing, then takeoff, then a pending grind request.
pub(super) fn evaluate(
    machine: &StateMachine,
    core: &mut SkaterCore,
    was_grounded: bool,
    reading: &GroundReading,
) -> Option<Transition> {
    let kind = machine.kind();
    if kind == StateKind::Grinding {
        return None;
    }

    if kind.is_airborne() && reading.raw_grounded && core.body.velocity.y <= 0.0 {
        let yaw = machine.current().air_yaw_degrees().unwrap_or(0.0);
        let switched = match resolve_stance(yaw) {
            StanceResolution::Keep => false,
            StanceResolution::Toggle => {
                core.body.switch_stance = !core.body.switch_stance;
                true
            }
            StanceResolution::BailZone => {
                tracing::debug!(yaw, "landed between stance windows");
                false
            }
        };
        core.pending_grind = None;
        return Some(Transition::Skating(SkatingEntry::Landing { switched }));
    }

    if was_grounded && !reading.grounded && !kind.is_airborne() {
        return Some(match core.body.last_contact {
            Some(contact) if contact.is_vert => Transition::VertAir(VertLaunch {
                position: core.body.position,
                normal: contact.normal,
            }),
            _ => Transition::Airborne,
        });
    }

    let request = core.pending_grind.take()?;
    if kind == StateKind::VertAir {
        tracing::debug!(rail = request.rail.0, "grind request dropped during vert air");
        return None;
    }
    Some(Transition::Grinding(request))
}
