use super::{SkaterCore, StateContext};
use crate::game::events::SkaterEvent;
use crate::game::states::{SkaterState, StateKind, Transition};

/// Upper bound on transitions chained through `enter` within one change
const MAX_CHAINED_TRANSITIONS: usize = 8;

/// Holds the active state and applies transitions in exit → enter order.
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    current: SkaterState,
    previous: Option<StateKind>,
    time_in_state: f32,
    started: bool,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &SkaterState {
        &self.current
    }

    pub fn kind(&self) -> StateKind {
        self.current.kind()
    }

    pub fn previous(&self) -> Option<StateKind> {
        self.previous
    }

    pub fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    /// Enters the initial state the first time the skater ticks.
    pub fn start(&mut self, core: &mut SkaterCore, ctx: &StateContext) {
        if self.started {
            return;
        }
        self.started = true;
        if let Some(next) = self.current.as_state_mut().enter(core, ctx) {
            self.change_state(next, core, ctx);
        }
    }

    pub fn logic_update(&mut self, core: &mut SkaterCore, ctx: &StateContext) {
        self.time_in_state += ctx.dt;
        if let Some(next) = self.current.as_state_mut().logic_update(core, ctx) {
            self.change_state(next, core, ctx);
        }
    }

    pub fn physics_update(&mut self, core: &mut SkaterCore, ctx: &StateContext) {
        if let Some(next) = self.current.as_state_mut().physics_update(core, ctx) {
            self.change_state(next, core, ctx);
        }
    }

    /// Exits the current state and enters the requested one. A transition
    /// returned from `enter` is applied right away, up to a small chain limit.
    pub fn change_state(&mut self, transition: Transition, core: &mut SkaterCore, ctx: &StateContext) {
        let mut pending = Some(transition);
        let mut hops = 0;
        while let Some(transition) = pending.take() {
            if hops == MAX_CHAINED_TRANSITIONS {
                tracing::warn!(
                    state = %self.current.kind(),
                    dropped = %transition.target(),
                    "transition chain limit reached"
                );
                break;
            }
            hops += 1;

            let from = self.current.kind();
            let to = transition.target();
            self.current.as_state_mut().exit(core, ctx, to);
            self.previous = Some(from);
            self.current = SkaterState::from(transition);
            self.time_in_state = 0.0;
            core.emit(SkaterEvent::StateChanged { from, to });
            tracing::debug!(%from, %to, "state changed");

            pending = self.current.as_state_mut().enter(core, ctx);
        }
    }
}
