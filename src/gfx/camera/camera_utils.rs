use cgmath::{Matrix4, Point3};
use winit::{
    event::{DeviceEvent, KeyEvent},
    window::Window,
};

use super::{camera_controller::CameraController, orbit_camera::OrbitCamera};

pub struct CameraManager {
    pub camera: OrbitCamera,
    pub controller: CameraController,
}

impl CameraManager {
    pub fn new(camera: OrbitCamera, controller: CameraController) -> Self {
        Self { camera, controller }
    }

    pub fn process_event(&mut self, event: &DeviceEvent, window: &Window) {
        self.controller
            .process_events(event, window, &mut self.camera);
    }

    pub fn process_keyboard_event(&mut self, event: &KeyEvent) {
        self.controller
            .process_keyed_events(event, &mut self.camera);
    }

    /// Advances the damped orbit by `delta_seconds`
    pub fn update(&mut self, delta_seconds: f32) {
        self.camera.update(delta_seconds);
    }
}

/// Anything the renderer can look through
pub trait Camera {
    fn view(&self) -> Matrix4<f32>;
    /// Clip-space projection, already in wgpu depth range
    fn projection(&self) -> Matrix4<f32>;
    fn eye_position(&self) -> Point3<f32>;

    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection() * self.view()
    }
}
