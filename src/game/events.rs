use super::rails::RailId;
use super::states::StateKind;

/// Notifications produced by a skater for scoring, UI and replay layers.
#[derive(Debug, Clone, PartialEq)]
pub enum SkaterEvent {
    StateChanged {
        from: StateKind,
        to: StateKind,
    },
    TrickCompleted {
        name: &'static str,
        rotation_degrees: f32,
    },
    /// Touchdown after an air session. `trick` names a flip still spinning at touchdown.
    Landed {
        clean: bool,
        trick: Option<&'static str>,
        switch_stance: bool,
    },
    GrindStarted {
        rail: RailId,
    },
    GrindEnded {
        rail: RailId,
        reason: GrindEndReason,
    },
    Bailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrindEndReason {
    RailEnd,
    JumpOff,
    Bail,
    /// Any other exit, e.g. a reset
    Interrupted,
}
