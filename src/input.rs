//! Keyboard state and the fixed demo bindings.
//!
//! [`InputState`] is an explicit value object: the host feeds it raw
//! window events (or synthesizes presses directly in tests), and once per
//! tick [`handle_input`] maps the current key state onto camera rates.
//! Nothing in here reads global state, which keeps input deterministic
//! and injectable.
//!
//! The bindings are fixed and reproduced exactly:
//!
//! | Keys              | Effect                      |
//! |-------------------|-----------------------------|
//! | PageUp / PageDown | pitch rate ±0.2 °/frame     |
//! | Left / A          | yaw rate +0.2 °/frame       |
//! | Right / D         | yaw rate −0.2 °/frame       |
//! | Up / W            | speed +0.05 units/frame     |
//! | Down / S          | speed −0.05 units/frame     |
//! | Space (release)   | place a block (host-driven) |

use std::collections::HashSet;

use glam::{Mat4, Vec3};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::camera::Camera;

/// Pitch and yaw rate applied while a look key is held, degrees per frame.
pub const TURN_RATE: f32 = 0.2;
/// Speed applied while a move key is held, units per frame.
pub const MOVE_SPEED: f32 = 0.05;
/// Distance a placed block is offset from the camera.
pub const PLACE_DISTANCE: f32 = 3.0;

/// Polled keyboard state for one tick.
///
/// Tracks which keys are currently held and which were released since the
/// last [`begin_frame`](Self::begin_frame), the edge the space-bar
/// placement trigger needs.
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
    released: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a winit window event into the key state. Non-keyboard events
    /// are ignored.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if let PhysicalKey::Code(key) = event.physical_key {
                match event.state {
                    ElementState::Pressed => self.press(key),
                    ElementState::Released => self.release(key),
                }
            }
        }
    }

    /// Record a key press.
    pub fn press(&mut self, key: KeyCode) {
        self.held.insert(key);
    }

    /// Record a key release.
    pub fn release(&mut self, key: KeyCode) {
        self.held.remove(&key);
        self.released.insert(key);
    }

    /// Clear per-frame edge state. Call at the end of each tick.
    pub fn begin_frame(&mut self) {
        self.released.clear();
    }

    /// True while the key is held down.
    pub fn key_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// True if the key was released since the last `begin_frame`.
    pub fn key_released(&self, key: KeyCode) -> bool {
        self.released.contains(&key)
    }
}

/// Apply the fixed bindings to the camera for this tick.
///
/// Each rate group falls back to zero when none of its keys are held, so
/// motion stops as soon as keys are released. Runs before the frame is
/// rendered; the rates take effect in the post-render
/// [`Camera::animate`] call.
pub fn handle_input(input: &InputState, camera: &mut Camera) {
    if input.key_held(KeyCode::PageUp) {
        camera.set_pitch_rate(TURN_RATE);
    } else if input.key_held(KeyCode::PageDown) {
        camera.set_pitch_rate(-TURN_RATE);
    } else {
        camera.set_pitch_rate(0.0);
    }

    if input.key_held(KeyCode::ArrowLeft) || input.key_held(KeyCode::KeyA) {
        camera.set_yaw_rate(TURN_RATE);
    } else if input.key_held(KeyCode::ArrowRight) || input.key_held(KeyCode::KeyD) {
        camera.set_yaw_rate(-TURN_RATE);
    } else {
        camera.set_yaw_rate(0.0);
    }

    if input.key_held(KeyCode::ArrowUp) || input.key_held(KeyCode::KeyW) {
        camera.set_speed(MOVE_SPEED);
    } else if input.key_held(KeyCode::ArrowDown) || input.key_held(KeyCode::KeyS) {
        camera.set_speed(-MOVE_SPEED);
    } else {
        camera.set_speed(0.0);
    }
}

/// Where to place a new block relative to the camera, snapped to whichever
/// cardinal axis the camera currently faces.
///
/// Reads the view matrix directly: element `m[2]` (world X seen along the
/// view Z axis) picks the ±X branch, element `m[10]` the ±Z branch. Both
/// can fire at once near diagonals, and Y is never offset; placed blocks
/// stay on the camera's horizontal plane in this flat-world demo.
pub fn placement_offset(view: &Mat4) -> Vec3 {
    let m = view.to_cols_array();
    let mut offset = Vec3::ZERO;

    if m[2] > 0.5 {
        offset.x = -PLACE_DISTANCE;
    } else if m[2] < -0.5 {
        offset.x = PLACE_DISTANCE;
    }

    if m[10] > 0.5 {
        offset.z = -PLACE_DISTANCE;
    } else if m[10] < -0.5 {
        offset.z = PLACE_DISTANCE;
    }

    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_with_yaw(yaw_degrees: f32) -> Camera {
        let mut camera = Camera::new(0.0, 0.0, 0.0);
        camera.set_yaw_rate(yaw_degrees);
        camera.animate();
        camera.update_view_matrix();
        camera
    }

    #[test]
    fn held_keys_set_rates_and_release_zeroes_them() {
        let mut input = InputState::new();
        let mut camera = Camera::new(0.0, 0.0, 0.0);

        input.press(KeyCode::KeyW);
        input.press(KeyCode::KeyA);
        input.press(KeyCode::PageDown);
        handle_input(&input, &mut camera);
        assert_eq!(camera.speed(), MOVE_SPEED);

        camera.animate();
        assert!((camera.yaw() - TURN_RATE).abs() < 1e-6);
        assert!((camera.pitch() + TURN_RATE).abs() < 1e-6);

        input.release(KeyCode::KeyW);
        input.release(KeyCode::KeyA);
        input.release(KeyCode::PageDown);
        handle_input(&input, &mut camera);
        assert_eq!(camera.speed(), 0.0);

        let yaw = camera.yaw();
        camera.animate();
        assert_eq!(camera.yaw(), yaw);
    }

    #[test]
    fn arrow_and_letter_keys_are_interchangeable() {
        let mut input = InputState::new();
        let mut camera = Camera::new(0.0, 0.0, 0.0);

        input.press(KeyCode::ArrowUp);
        handle_input(&input, &mut camera);
        assert_eq!(camera.speed(), MOVE_SPEED);

        input.release(KeyCode::ArrowUp);
        input.press(KeyCode::KeyS);
        handle_input(&input, &mut camera);
        assert_eq!(camera.speed(), -MOVE_SPEED);
    }

    #[test]
    fn space_release_is_edge_triggered() {
        let mut input = InputState::new();
        input.press(KeyCode::Space);
        assert!(!input.key_released(KeyCode::Space));

        input.release(KeyCode::Space);
        assert!(input.key_released(KeyCode::Space));

        input.begin_frame();
        assert!(!input.key_released(KeyCode::Space));
    }

    #[test]
    fn facing_minus_z_places_toward_minus_z() {
        let camera = camera_with_yaw(0.0);
        let offset = placement_offset(&camera.view_matrix());
        assert_eq!(offset, Vec3::new(0.0, 0.0, -PLACE_DISTANCE));
    }

    #[test]
    fn facing_minus_x_places_toward_minus_x() {
        // Yaw 90° turns left from −Z to −X; view element m[2] goes above 0.5.
        let camera = camera_with_yaw(90.0);
        assert!(camera.view_matrix().to_cols_array()[2] > 0.5);

        let offset = placement_offset(&camera.view_matrix());
        assert_eq!(offset.x, -PLACE_DISTANCE);
        assert_eq!(offset.y, 0.0);
    }

    #[test]
    fn facing_plus_z_places_toward_plus_z() {
        let camera = camera_with_yaw(180.0);
        let offset = placement_offset(&camera.view_matrix());
        assert_eq!(offset.z, PLACE_DISTANCE);
    }

    #[test]
    fn one_second_of_w_moves_three_units_forward() {
        // 60 ticks of polling at 0.05 units per frame.
        let mut input = InputState::new();
        let mut camera = Camera::new(0.0, 0.0, 10.0);
        input.press(KeyCode::KeyW);

        for _ in 0..60 {
            handle_input(&input, &mut camera);
            camera.animate();
        }

        let pos = camera.coords();
        assert!((pos.z - 7.0).abs() < 1e-4);
        assert_eq!(camera.yaw(), 0.0);
        assert_eq!(camera.pitch(), 0.0);
    }

    #[test]
    fn space_release_appends_one_block_with_snapped_offset() {
        use crate::scene::Scene;
        use crate::geometry::Geometry;
        use glam::Vec4;

        let mut input = InputState::new();
        let mut camera = Camera::new(5.0, 0.0, 2.0);
        camera.set_yaw_rate(90.0);
        camera.animate();
        camera.update_view_matrix();
        assert!(camera.view_matrix().to_cols_array()[2] > 0.5);

        let mut scene = Scene::new();
        input.press(KeyCode::Space);
        input.release(KeyCode::Space);

        // The host's placement path: one release, one appended block.
        if input.key_released(KeyCode::Space) {
            let position = camera.coords() + placement_offset(&camera.view_matrix());
            let mut block = Geometry::block();
            block.set_translate(position.x, position.y, position.z);
            scene.add(block);
        }
        input.begin_frame();
        if input.key_released(KeyCode::Space) {
            panic!("placement must fire exactly once per release");
        }

        assert_eq!(scene.len(), 1);
        let origin = scene.draw_list()[0].model * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(origin.x, 5.0 - PLACE_DISTANCE);
        assert_eq!(origin.y, 0.0);
    }

    #[test]
    fn placement_never_offsets_y() {
        for yaw in [0.0, 45.0, 90.0, 135.0, 180.0, 270.0] {
            let camera = camera_with_yaw(yaw);
            assert_eq!(placement_offset(&camera.view_matrix()).y, 0.0);
        }
    }
}
