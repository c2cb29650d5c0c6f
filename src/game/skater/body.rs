use nalgebra::{UnitQuaternion, Vector3};

use crate::game::constants::physics::ANGULAR_DRAG;
use crate::game::geometry::{CollisionMask, SurfaceId};
use crate::game::math;

/// The ground surface most recently touched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundContact {
    pub point: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub surface: SurfaceId,
    pub triangle: Option<u32>,
    /// Tagged with the vert colour
    pub is_vert: bool,
}

/// Kinematic body of a skater. States write velocity and orientation; the
/// tick pipeline integrates.
#[derive(Debug, Clone, PartialEq)]
pub struct SkaterBody {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub velocity: Vector3<f32>,
    /// Body-local angular velocity in rad/s
    pub angular_velocity: Vector3<f32>,
    pub grounded: bool,
    pub grinding: bool,
    pub switch_stance: bool,
    /// Forces the ground sensor to report airborne, set by ollies
    pub ignore_ground: bool,
    pub collision_mask: CollisionMask,
    pub ground_normal: Vector3<f32>,
    pub last_contact: Option<GroundContact>,
}

impl SkaterBody {
    pub fn new(position: Vector3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self {
            position,
            rotation,
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            grounded: false,
            grinding: false,
            switch_stance: false,
            ignore_ground: false,
            collision_mask: CollisionMask::ALL,
            ground_normal: Vector3::y(),
            last_contact: None,
        }
    }

    pub fn forward(&self) -> Vector3<f32> {
        math::forward(&self.rotation)
    }

    pub fn right(&self) -> Vector3<f32> {
        math::right(&self.rotation)
    }

    pub fn up(&self) -> Vector3<f32> {
        math::up(&self.rotation)
    }

    /// Local offset to world space.
    pub fn transform_point(&self, local: &Vector3<f32>) -> Vector3<f32> {
        self.position + self.rotation * local
    }

    pub fn horizontal_speed(&self) -> f32 {
        math::flatten(&self.velocity).norm()
    }

    /// Flattened heading, falling back to +Z when the board points straight up or down.
    pub fn facing(&self) -> Vector3<f32> {
        math::flatten(&self.forward())
            .try_normalize(1.0e-6)
            .unwrap_or_else(Vector3::z)
    }

    /// Applies velocity and angular velocity for one step.
    pub fn integrate(&mut self, dt: f32, move_position: bool) {
        if move_position {
            self.position += self.velocity * dt;
        }
        if self.angular_velocity.norm_squared() > 0.0 {
            let step = UnitQuaternion::from_scaled_axis(self.angular_velocity * dt);
            self.rotation = self.rotation * step;
            self.angular_velocity *= ANGULAR_DRAG.powf(dt);
        }
    }
}
