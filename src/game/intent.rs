use nalgebra::Vector2;

/// Abstract skater controls, sampled once per logic tick by the host.
///
/// Edge flags (`*_down`, `*_up`, tricks) latch until a state consumes them or
/// the next physics tick ends, so a press sampled between physics ticks is
/// never lost. Level flags (`*_held`) and the move vector are overwritten on
/// every sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Intent {
    /// `x` steers/leans (right positive), `y` pushes (positive) or brakes (negative)
    pub move_axis: Vector2<f32>,
    pub jump_down: bool,
    pub jump_held: bool,
    pub jump_up: bool,
    pub grind_down: bool,
    pub grind_held: bool,
    pub trick_primary: bool,
    pub trick_alt: bool,
    pub trick_special: bool,
}

impl Intent {
    /// Merges a fresh host sample: levels replace, edges accumulate.
    pub fn apply_sample(&mut self, sample: &Intent) {
        self.move_axis = Vector2::new(
            sample.move_axis.x.clamp(-1.0, 1.0),
            sample.move_axis.y.clamp(-1.0, 1.0),
        );
        self.jump_held = sample.jump_held;
        self.grind_held = sample.grind_held;
        self.jump_down |= sample.jump_down;
        self.jump_up |= sample.jump_up;
        self.grind_down |= sample.grind_down;
        self.trick_primary |= sample.trick_primary;
        self.trick_alt |= sample.trick_alt;
        self.trick_special |= sample.trick_special;
    }

    pub fn take_jump_down(&mut self) -> bool {
        std::mem::take(&mut self.jump_down)
    }

    pub fn take_jump_up(&mut self) -> bool {
        std::mem::take(&mut self.jump_up)
    }

    pub fn take_trick_primary(&mut self) -> bool {
        std::mem::take(&mut self.trick_primary)
    }

    pub fn take_trick_alt(&mut self) -> bool {
        std::mem::take(&mut self.trick_alt)
    }

    pub fn take_trick_special(&mut self) -> bool {
        std::mem::take(&mut self.trick_special)
    }

    /// Drops unconsumed edges at the end of a physics tick.
    pub fn clear_edges(&mut self) {
        self.jump_down = false;
        self.jump_up = false;
        self.grind_down = false;
        self.trick_primary = false;
        self.trick_alt = false;
        self.trick_special = false;
    }

    pub fn lean(&self) -> f32 {
        self.move_axis.x
    }

    pub fn push(&self) -> f32 {
        self.move_axis.y
    }
}
