//! First-person camera with a rate-based motion model.
//!
//! The camera splits "set desired rate" from "integrate": input handling
//! writes angular and linear rates every frame, and [`Camera::animate`]
//! folds them into position and orientation once per tick, *after* the
//! frame is rendered. Rendering therefore always sees the pre-update
//! camera state for the tick, and input polling frequency is decoupled
//! from the simulation step.
//!
//! Angles are in degrees. The rate constants the demo feeds in (±0.2 per
//! frame) come from the classic keyboard bindings and are only sensible as
//! degrees; conversion to radians happens at the matrix boundary.

use glam::{Mat4, Vec3};

/// A free-flying first-person camera.
///
/// Yaw 0 looks toward −Z; positive yaw turns left, positive pitch looks
/// up. Pitch is deliberately not clamped at ±90°: flying over the poles
/// inverts the view, and that disorientation is part of the demo's
/// established behavior.
#[derive(Clone, Debug)]
pub struct Camera {
    position: Vec3,
    /// Horizontal angle in degrees.
    yaw: f32,
    /// Vertical angle in degrees.
    pitch: f32,
    /// Degrees added to yaw per `animate` call.
    yaw_rate: f32,
    /// Degrees added to pitch per `animate` call.
    pitch_rate: f32,
    /// Units moved along the facing vector per `animate` call.
    speed: f32,
    view: Mat4,
}

impl Camera {
    /// Create a camera at the given world position, looking toward −Z.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        let mut camera = Self {
            position: Vec3::new(x, y, z),
            yaw: 0.0,
            pitch: 0.0,
            yaw_rate: 0.0,
            pitch_rate: 0.0,
            speed: 0.0,
            view: Mat4::IDENTITY,
        };
        camera.update_view_matrix();
        camera
    }

    /// Set the yaw rate in degrees per frame.
    pub fn set_yaw_rate(&mut self, rate: f32) {
        self.yaw_rate = rate;
    }

    /// Set the pitch rate in degrees per frame.
    pub fn set_pitch_rate(&mut self, rate: f32) {
        self.pitch_rate = rate;
    }

    /// Set the forward speed in units per frame. Negative moves backward.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Current position.
    pub fn coords(&self) -> Vec3 {
        self.position
    }

    /// Current yaw in degrees.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Current pitch in degrees.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Current forward speed in units per frame.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Recompute the cached view matrix from the current position and
    /// orientation. Must run before the renderer consumes
    /// [`view_matrix`](Self::view_matrix) for the frame.
    pub fn update_view_matrix(&mut self) {
        self.view = Mat4::from_rotation_x(-self.pitch.to_radians())
            * Mat4::from_rotation_y(-self.yaw.to_radians())
            * Mat4::from_translation(-self.position);
    }

    /// The view matrix as of the last [`update_view_matrix`](Self::update_view_matrix).
    ///
    /// Also used by placement logic to inspect the facing direction, see
    /// [`placement_offset`](crate::input::placement_offset).
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    /// Unit vector the camera is looking along.
    pub fn facing(&self) -> Vec3 {
        let (yaw_sin, yaw_cos) = self.yaw.to_radians().sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.to_radians().sin_cos();
        Vec3::new(-yaw_sin * pitch_cos, pitch_sin, -yaw_cos * pitch_cos)
    }

    /// Integrate the current rates into position and orientation.
    ///
    /// Called once per tick, after rendering. Integration is linear:
    /// yaw and pitch each advance by their rate, and the position moves
    /// `speed` units along the facing vector. Pitch is not clamped.
    pub fn animate(&mut self) {
        self.yaw += self.yaw_rate;
        self.pitch += self.pitch_rate;
        if self.speed != 0.0 {
            self.position += self.facing() * self.speed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn animate_is_idempotent_under_zero_rates() {
        let mut camera = Camera::new(1.0, 2.0, 3.0);
        for _ in 0..10 {
            camera.animate();
        }
        assert_eq!(camera.coords(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(camera.yaw(), 0.0);
        assert_eq!(camera.pitch(), 0.0);
    }

    #[test]
    fn yaw_integrates_linearly() {
        let mut camera = Camera::new(0.0, 0.0, 0.0);
        camera.set_yaw_rate(0.2);
        for _ in 0..10 {
            camera.animate();
        }
        assert!((camera.yaw() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn one_second_of_forward_motion_covers_three_units() {
        // 60 frames at 0.05 units per frame.
        let mut camera = Camera::new(0.0, 0.0, 10.0);
        camera.set_speed(0.05);
        for _ in 0..60 {
            camera.animate();
        }
        let pos = camera.coords();
        assert!((pos.z - 7.0).abs() < 1e-4, "moved to z = {}", pos.z);
        assert!(pos.x.abs() < 1e-5);
        assert!(pos.y.abs() < 1e-5);
        assert_eq!(camera.yaw(), 0.0);
        assert_eq!(camera.pitch(), 0.0);
    }

    #[test]
    fn facing_follows_yaw() {
        let mut camera = Camera::new(0.0, 0.0, 0.0);
        camera.set_yaw_rate(90.0);
        camera.animate();
        // Positive yaw turns left: facing swings from −Z toward −X.
        let facing = camera.facing();
        assert!((facing.x - -1.0).abs() < 1e-5);
        assert!(facing.z.abs() < 1e-5);
    }

    #[test]
    fn pitch_is_not_clamped_past_the_pole() {
        let mut camera = Camera::new(0.0, 0.0, 0.0);
        camera.set_pitch_rate(45.0);
        for _ in 0..3 {
            camera.animate();
        }
        assert!((camera.pitch() - 135.0).abs() < 1e-5);
    }

    #[test]
    fn view_matrix_inverts_position() {
        let mut camera = Camera::new(0.0, 0.0, 10.0);
        camera.update_view_matrix();
        let origin = camera.view_matrix() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        // The world origin lands 10 units in front of the camera.
        assert!((origin.z - -10.0).abs() < 1e-5);
    }
}
