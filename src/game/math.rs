//! Small vector and rotation helpers shared by the locomotion states.
//!
//! Conventions: Y is up, the board faces local +Z and local +X is its right side.

use nalgebra::{UnitQuaternion, Vector3};

/// Linear interpolation with `t` clamped to `0..=1`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * clamp01(t)
}

pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

pub fn lerp_vec(a: &Vector3<f32>, b: &Vector3<f32>, t: f32) -> Vector3<f32> {
    a + (b - a) * clamp01(t)
}

/// Moves `current` toward `target` by at most `max_delta`.
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// Drops the vertical component.
pub fn flatten(v: &Vector3<f32>) -> Vector3<f32> {
    Vector3::new(v.x, 0.0, v.z)
}

pub fn project_on_plane(v: &Vector3<f32>, normal: &Vector3<f32>) -> Vector3<f32> {
    match normal.try_normalize(1.0e-6) {
        Some(n) => v - n * v.dot(&n),
        None => *v,
    }
}

/// Unsigned angle between two vectors in degrees. Zero vectors compare as 0°.
pub fn angle_degrees(a: &Vector3<f32>, b: &Vector3<f32>) -> f32 {
    if a.norm_squared() < 1.0e-12 || b.norm_squared() < 1.0e-12 {
        return 0.0;
    }
    a.angle(b).to_degrees()
}

pub fn forward(rotation: &UnitQuaternion<f32>) -> Vector3<f32> {
    rotation * Vector3::z()
}

pub fn right(rotation: &UnitQuaternion<f32>) -> Vector3<f32> {
    rotation * Vector3::x()
}

pub fn up(rotation: &UnitQuaternion<f32>) -> Vector3<f32> {
    rotation * Vector3::y()
}

/// Rotation whose local +Z points along `forward`, keeping local +Y near `up`.
pub fn look_rotation(forward: &Vector3<f32>, up: &Vector3<f32>) -> UnitQuaternion<f32> {
    if forward.norm_squared() < 1.0e-12 || forward.cross(up).norm_squared() < 1.0e-12 {
        return UnitQuaternion::identity();
    }
    UnitQuaternion::face_towards(forward, up)
}

/// World-space yaw turn: positive degrees turn the board toward its right.
pub fn yaw(rotation: &UnitQuaternion<f32>, degrees: f32) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), degrees.to_radians()) * rotation
}

/// Removes pitch and roll, keeping only heading.
pub fn yaw_only(rotation: &UnitQuaternion<f32>) -> UnitQuaternion<f32> {
    let heading = flatten(&forward(rotation));
    if heading.norm_squared() < 1.0e-8 {
        // Pointing straight up or down: recover heading from the up vector instead.
        let fallback = flatten(&-up(rotation));
        return look_rotation(&fallback, &Vector3::y());
    }
    look_rotation(&heading, &Vector3::y())
}

/// Rotates `from` toward `to` by at most `max_degrees`.
pub fn rotate_towards(
    from: &UnitQuaternion<f32>,
    to: &UnitQuaternion<f32>,
    max_degrees: f32,
) -> UnitQuaternion<f32> {
    let angle = from.angle_to(to).to_degrees();
    if angle <= max_degrees || angle < 1.0e-4 {
        return *to;
    }
    slerp(from, to, max_degrees / angle)
}

/// Spherical interpolation with `t` clamped, falling back to `to` for antipodal inputs.
pub fn slerp(from: &UnitQuaternion<f32>, to: &UnitQuaternion<f32>, t: f32) -> UnitQuaternion<f32> {
    from.try_slerp(to, clamp01(t), 1.0e-6).unwrap_or(*to)
}

/// Shortest rotation taking `from` onto `to`.
pub fn from_to_rotation(from: &Vector3<f32>, to: &Vector3<f32>) -> UnitQuaternion<f32> {
    UnitQuaternion::rotation_between(from, to).unwrap_or_else(UnitQuaternion::identity)
}

/// Tilt of the board's up vector away from world up, in degrees.
pub fn tilt_degrees(rotation: &UnitQuaternion<f32>) -> f32 {
    angle_degrees(&up(rotation), &Vector3::y())
}
