use rand::Rng;

use crate::config::{PhysicsParameterTable, SkaterStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceKind {
    Grind,
    Manual,
}

/// Bounded lean oscillator driving grind and manual balance.
///
/// The value starts centered, is pushed by lean input and a wobble that grows
/// with session time, and is pulled back toward zero by lean gravity. It never
/// leaves `±bail_threshold × 1.1`; crossing `±bail_threshold` is a bail.
#[derive(Debug, Clone)]
pub struct BalanceMeter {
    value: f32,
    active: bool,
    kind: BalanceKind,
    elapsed: f32,
    lean_gravity: f32,
    lean_acceleration: f32,
    wobble_base: f32,
    wobble_growth: f32,
    wobble_max: f32,
    bail_threshold: f32,
}

impl Default for BalanceMeter {
    fn default() -> Self {
        Self::new()
    }
}

/// Sign with zero counted as positive.
fn sign1(x: f32) -> f32 {
    if x >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

impl BalanceMeter {
    pub fn new() -> Self {
        Self {
            value: 0.0,
            active: false,
            kind: BalanceKind::Grind,
            elapsed: 0.0,
            lean_gravity: 0.0,
            lean_acceleration: 0.0,
            wobble_base: 0.0,
            wobble_growth: 0.0,
            wobble_max: 0.0,
            bail_threshold: 1.0,
        }
    }

    /// Resets the meter and loads this session's curves from the parameter table.
    pub fn start(
        &mut self,
        kind: BalanceKind,
        params: &PhysicsParameterTable,
        stats: &SkaterStats,
        is_switch: bool,
    ) {
        let (curve, stat) = match kind {
            BalanceKind::Grind => (&params.balance.grind, stats.rail_balance),
            BalanceKind::Manual => (&params.balance.manual, stats.manual),
        };
        self.kind = kind;
        self.value = 0.0;
        self.elapsed = 0.0;
        self.active = true;
        self.lean_gravity = params.switched_value(curve.lean_gravity, stat, is_switch);
        self.lean_acceleration = params.switched_value(curve.lean_acceleration, stat, is_switch);
        self.wobble_base = params.stat_value(curve.wobble_base, stat);
        self.wobble_growth = params.stat_value(curve.wobble_growth, stat);
        self.wobble_max = curve.wobble_max;
        self.bail_threshold = curve.bail_threshold;
        tracing::debug!(
            ?kind,
            lean_gravity = self.lean_gravity,
            lean_acceleration = self.lean_acceleration,
            "balance started"
        );
    }

    /// One physics step. `lean` is the horizontal move intent in `-1..=1`.
    pub fn update<R: Rng + ?Sized>(&mut self, lean: f32, dt: f32, rng: &mut R) {
        if !self.active {
            return;
        }
        self.elapsed += dt;

        // 1. lean input
        self.value += lean * self.lean_acceleration * dt;

        // 2. wobble, growing with session time
        let magnitude =
            (self.wobble_base + self.wobble_growth * self.elapsed).clamp(0.0, self.wobble_max.max(0.0));
        self.value += rng.gen_range(-1.0f32..=1.0) * magnitude * dt;

        // 3. lean gravity, unless actively fighting it
        let resisting = sign1(self.value) != sign1(lean) && lean.abs() >= 0.1;
        if self.value != 0.0 && (!resisting || self.lean_gravity <= 0.0) {
            let pulled = self.value - sign1(self.value) * self.lean_gravity * dt;
            self.value = if sign1(pulled) != sign1(self.value) { 0.0 } else { pulled };
        }

        // 4. clamp just past the bail line
        let limit = self.bail_threshold * 1.1;
        self.value = self.value.clamp(-limit, limit);
    }

    pub fn stop(&mut self) {
        if self.active {
            tracing::debug!(kind = ?self.kind, value = self.value, "balance stopped");
        }
        self.active = false;
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn kind(&self) -> BalanceKind {
        self.kind
    }

    pub fn bail_threshold(&self) -> f32 {
        self.bail_threshold
    }

    pub fn has_bailed(&self) -> bool {
        self.active && self.value.abs() > self.bail_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    fn started(kind: BalanceKind) -> BalanceMeter {
        let mut meter = BalanceMeter::new();
        meter.start(kind, &PhysicsParameterTable::default(), &SkaterStats::default(), false);
        meter
    }

    #[test]
    fn test_inactive_meter_ignores_updates() {
        let mut meter = BalanceMeter::new();
        let mut rng = StdRng::seed_from_u64(1);
        meter.update(1.0, DT, &mut rng);
        assert_eq!(meter.value(), 0.0);
        assert!(!meter.has_bailed());
    }

    #[test]
    fn test_constant_lean_bails() {
        let mut meter = started(BalanceKind::Grind);
        let mut rng = StdRng::seed_from_u64(7);
        let mut ticks = 0;
        while !meter.has_bailed() && ticks < 600 {
            meter.update(1.0, DT, &mut rng);
            ticks += 1;
        }
        assert!(meter.has_bailed(), "meter never crossed the threshold");
        assert!(meter.value() > 1.0);
    }

    #[test]
    fn test_value_stays_within_clamp() {
        let mut params = PhysicsParameterTable::default();
        params.balance.grind.wobble_base = crate::config::StatRange::new(50.0, 50.0);
        params.balance.grind.wobble_max = 50.0;
        let mut meter = BalanceMeter::new();
        meter.start(BalanceKind::Grind, &params, &SkaterStats::default(), false);
        let mut rng = StdRng::seed_from_u64(3);
        for i in 0..2000 {
            let lean = if i % 3 == 0 { -1.0 } else { 1.0 };
            meter.update(lean, 0.1, &mut rng);
            assert!(meter.value().abs() <= meter.bail_threshold() * 1.1 + 1.0e-6);
        }
    }

    #[test]
    fn test_gravity_does_not_cross_center() {
        let mut params = PhysicsParameterTable::default();
        params.balance.grind.wobble_base = crate::config::StatRange::new(0.0, 0.0);
        params.balance.grind.wobble_growth = crate::config::StatRange::new(0.0, 0.0);
        let mut meter = BalanceMeter::new();
        meter.start(BalanceKind::Grind, &params, &SkaterStats::default(), false);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..10 {
            meter.update(1.0, DT, &mut rng);
        }
        assert!(meter.value() > 0.0);
        for _ in 0..600 {
            meter.update(0.0, DT, &mut rng);
            assert!(meter.value() >= 0.0);
        }
        assert_eq!(meter.value(), 0.0);
    }

    #[test]
    fn test_stop_clears_bail() {
        let mut meter = started(BalanceKind::Manual);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..600 {
            meter.update(1.0, DT, &mut rng);
        }
        assert!(meter.has_bailed());
        meter.stop();
        assert!(!meter.has_bailed());
        assert!(!meter.is_active());
    }

    #[test]
    fn test_switch_weakens_response() {
        let params = PhysicsParameterTable::default();
        let stats = SkaterStats::default();
        let mut regular = BalanceMeter::new();
        let mut switch = BalanceMeter::new();
        regular.start(BalanceKind::Grind, &params, &stats, false);
        switch.start(BalanceKind::Grind, &params, &stats, true);
        assert!(switch.lean_acceleration < regular.lean_acceleration);
        assert!(switch.lean_gravity < regular.lean_gravity);
    }
}
