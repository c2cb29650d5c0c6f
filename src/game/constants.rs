//! Locomotion constants that are not part of the tunable parameter table.
//! Grouped per subsystem so each state reads its own block.

/// Simulation loop constants
pub mod physics {
    /// Fixed timestep for physics simulation (60 Hz)
    pub const TIMESTEP: f32 = 1.0 / 60.0;

    /// Largest frame delta fed into the fixed-step accumulator
    pub const MAX_FRAME_DELTA: f32 = 0.25;

    /// World gravity in m/s² applied to grounded-type states that lose contact
    pub const GRAVITY: f32 = 9.81;

    /// Per-second retention factor for body angular velocity
    pub const ANGULAR_DRAG: f32 = 0.98;
}

/// Ground probe layout, in body-local space
pub mod ground {
    /// Height of the wheel probe origins above the body origin
    pub const PROBE_HEIGHT: f32 = 0.1;

    /// Distance from center to the front/back truck probes along local Z
    pub const WHEEL_OFFSET: f32 = 0.4;

    /// Distance from center to the side probes along local X
    pub const SIDE_OFFSET: f32 = 0.3;

    /// Length of the wheel probes
    pub const PROBE_DISTANCE: f32 = 0.3;

    /// Length of the fallback snap probe from the center
    pub const SNAP_DISTANCE: f32 = 0.7;

    /// Height above the contact point the body rests at after a snap
    pub const SNAP_OFFSET: f32 = 0.05;
}

/// Rail probe geometry shared by Skating and Airborne
pub mod rail_probe {
    pub const DETECTION_DISTANCE: f32 = 2.5;

    /// Hits further than this along the hit normal are ignored when probing downward
    pub const MAX_VERTICAL_OFFSET: f32 = 2.0;

    /// Largest angle in degrees between travel and either rail tangent direction
    pub const ENTRY_ANGLE_DEGREES: f32 = 60.0;

    /// Height above the rail the board snaps to
    pub const BOARD_HEIGHT: f32 = 0.1;
}

/// StandingStill tuning
pub mod standing {
    /// Turn rate in degrees per second
    pub const ROTATION_SPEED: f32 = 540.0;

    /// Forward intent needed to start pushing
    pub const PUSH_THRESHOLD: f32 = 0.5;
}

/// Skating tuning
pub mod skating {
    /// Speed given by the first push out of StandingStill
    pub const PUSH_FORCE: f32 = 6.0;

    /// Horizontal speed below which the skater comes to a stop
    pub const MIN_SPEED: f32 = 0.5;

    pub const MAX_JUMP_CHARGE_TIME: f32 = 1.0;

    /// Duration of the post-landing heading blend
    pub const LANDING_TRANSITION_TIME: f32 = 0.15;

    /// Rate at which velocity converges on the target heading
    pub const VELOCITY_LERP: f32 = 15.0;

    /// Degrees per second the board tilts toward the ground normal
    pub const GROUND_ALIGN_SPEED: f32 = 15.0;

    /// Turn rate range in degrees per second, sampled by the spin stat
    pub const TURN_RATE_MIN: f32 = 120.0;
    pub const TURN_RATE_MAX: f32 = 180.0;

    /// Fraction of momentum kept when entering from a non-landing state
    pub const CONTINUE_MOMENTUM: f32 = 0.95;

    /// Extra damping applied to landing speed
    pub const LANDING_DAMPING: f32 = 0.98;

    /// Brake input threshold on the move intent's Y axis
    pub const BRAKE_THRESHOLD: f32 = -0.1;
}

/// Airborne and VertAir tuning
pub mod air {
    pub const FAKE_GRAVITY: f32 = 25.0;
    pub const RISING_GRAVITY_MULTIPLIER: f32 = 0.6;
    pub const FALLING_GRAVITY_MULTIPLIER: f32 = 1.0;

    /// Velocity retention per 60 Hz frame
    pub const AIR_RESISTANCE: f32 = 0.995;

    /// Spin rate range in degrees per second, sampled by the spin stat
    pub const SPIN_SPEED_MIN: f32 = 180.0;
    pub const SPIN_SPEED_MAX: f32 = 270.0;

    /// Spin retention per 60 Hz frame when no spin input is held
    pub const SPIN_DAMPING: f32 = 0.95;

    pub const SPIN_INPUT_DEADZONE: f32 = 0.1;

    /// Flip rotation speed in degrees per second at flip stat 5
    pub const TRICK_ROTATION_SPEED: f32 = 360.0;

    /// Airtime needed before a trick can start
    pub const TRICK_MIN_AIRTIME: f32 = 0.2;

    /// Rotation, tilt and airtime a flip must reach to complete
    pub const TRICK_COMPLETE_ROTATION: f32 = 330.0;
    pub const TRICK_COMPLETE_TILT: f32 = 20.0;
    pub const TRICK_COMPLETE_AIRTIME: f32 = 0.5;

    /// Largest tilt in degrees that still counts as a clean landing
    pub const LANDING_TILT: f32 = 30.0;

    pub const BOUNCE_FACTOR: f32 = 0.15;
    pub const MAX_BOUNCE: f32 = 2.0;

    /// Airtime after which the post-ollie ground override is released
    pub const IGNORE_GROUND_WINDOW: f32 = 0.05;

    /// Airtime needed before rail probing starts
    pub const GRIND_PROBE_AIRTIME: f32 = 0.1;

    /// Special meter multiplier on ollie force
    pub const SPECIAL_OLLIE_MULTIPLIER: f32 = 1.2;
}

/// Landing stance resolution
pub mod landing {
    /// Half-width in degrees of the regular and switch landing windows
    pub const STANCE_WINDOW: f32 = 45.0;

    pub const FACING_BIAS_SLOW: f32 = 0.9;
    pub const FACING_BIAS_FAST: f32 = 0.8;
    /// Speed at which the fast facing bias fully applies
    pub const FACING_BIAS_SPEED: f32 = 15.0;
    pub const BACKWARD_BIAS_BONUS: f32 = 0.1;
    pub const BACKWARD_SPEED_FACTOR: f32 = 0.8;
    pub const SWITCH_BIAS_FACTOR: f32 = 0.1;

    pub const RETENTION_MIN: f32 = 0.7;
    pub const RETENTION_MAX: f32 = 0.9;

    pub const ALIGN_FACTOR_MIN: f32 = 0.2;
    pub const ALIGN_FACTOR_MAX: f32 = 0.6;

    /// Landing speeds at or below this are replaced by a slow roll along facing
    pub const SLOW_LANDING_SPEED: f32 = 1.0;
    pub const SLOW_LANDING_FACTOR: f32 = 0.7;
}

/// Grinding timings
pub mod grind {
    /// Seconds after entry before low speed can bail
    pub const SPEED_BAIL_GRACE: f32 = 0.2;

    /// Seconds without meaningful movement before bailing
    pub const STUCK_TIME_LIMIT: f32 = 0.75;

    /// Per-second movement below which a tick counts as stuck
    pub const STUCK_MOVEMENT: f32 = 0.01;

    /// Slerp rate toward the rail-aligned orientation
    pub const ROTATION_ALIGN_SPEED: f32 = 15.0;

    /// Delay before ground and rail probes are re-enabled after a grind
    pub const COLLISION_RESTORE_DELAY: f64 = 0.05;

    pub const LEAN_DEADZONE: f32 = 0.1;

    /// Move intent magnitude needed before a jump off pushes sideways
    pub const PUSH_DEADZONE: f32 = 0.1;
}

/// Manual tuning
pub mod manual {
    pub const MIN_SPEED: f32 = 2.0;

    /// Speed retention per physics tick
    pub const SPEED_DECAY: f32 = 0.95;
}

/// Bailed tuning
pub mod bailed {
    pub const DURATION: f32 = 1.0;

    /// Velocity kept on entry
    pub const ENTRY_MOMENTUM: f32 = 0.1;

    /// Velocity retention per 60 Hz frame
    pub const FRICTION: f32 = 0.8;
}
