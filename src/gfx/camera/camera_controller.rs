use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use super::orbit_camera::OrbitCamera;

/// One line of a wheel scroll, in pixels, for trackpads reporting pixels
const PIXELS_PER_LINE: f32 = 40.0;

/// Maps raw mouse and keyboard input onto orbit camera motion
///
/// Drag rotates, shift+drag pans, the wheel zooms, shift+C resets.
pub struct CameraController {
    pub rotate_speed: f32,
    /// Fraction of the distance travelled per wheel line
    pub zoom_speed: f32,
    pub pan_speed: f32,
    is_shift_held: bool,
    is_mouse_pressed: bool,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: 0.002,
            is_shift_held: false,
            is_mouse_pressed: false,
        }
    }

    pub fn process_events(&mut self, event: &DeviceEvent, window: &Window, camera: &mut OrbitCamera) {
        if self.apply(event, camera) {
            window.request_redraw();
        }
    }

    /// Queues the motion `event` asks for; true when the camera will move
    pub fn apply(&mut self, event: &DeviceEvent, camera: &mut OrbitCamera) -> bool {
        match event {
            DeviceEvent::Button { button: 0, state } => {
                self.is_mouse_pressed = *state == ElementState::Pressed;
                false
            }
            DeviceEvent::MouseWheel { delta } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, lines) => *lines,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32 / PIXELS_PER_LINE,
                };
                camera.add_distance(-lines * self.zoom_speed);
                true
            }
            DeviceEvent::MouseMotion { delta: (dx, dy) } if self.is_mouse_pressed => {
                let (dx, dy) = (*dx as f32, *dy as f32);
                if self.is_shift_held {
                    camera.pan((-dx * self.pan_speed, dy * self.pan_speed));
                } else {
                    camera.add_yaw(-dx * self.rotate_speed);
                    camera.add_pitch(dy * self.rotate_speed);
                }
                true
            }
            _ => false,
        }
    }

    pub fn process_keyed_events(&mut self, event: &KeyEvent, camera: &mut OrbitCamera) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        match code {
            KeyCode::ShiftLeft | KeyCode::ShiftRight => {
                self.is_shift_held = event.state == ElementState::Pressed;
            }
            KeyCode::KeyC if self.is_shift_held && event.state == ElementState::Pressed => {
                log::info!("Resetting camera to its initial view");
                camera.reset_to_default();
            }
            _ => (),
        }
    }
}
