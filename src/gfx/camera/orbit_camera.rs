use super::camera_utils::Camera;
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Input accumulated by the controller and not yet applied to the camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingMotion {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub pan: Vector3<f32>,
}

impl Default for PendingMotion {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: 0.0,
            pan: Vector3::zero(),
        }
    }
}

/// Damped orbit camera looking at `target` from spherical coordinates
///
/// Controller input is accumulated into [`PendingMotion`]; every
/// [`update`](OrbitCamera::update) applies a time-scaled fraction of it, so
/// motion eases out over several frames instead of stopping dead.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    /// Fraction of pending motion applied per 60 Hz frame, in `(0, 1]`
    pub damping: f32,
    pending: PendingMotion,
    home: (f32, f32, f32, Vector3<f32>),
}

impl Camera for OrbitCamera {
    fn view(&self) -> Matrix4<f32> {
        self.view_matrix()
    }

    fn projection(&self) -> Matrix4<f32> {
        self.projection_matrix()
    }

    fn eye_position(&self) -> Point3<f32> {
        Point3::from_vec(self.eye)
    }
}

impl OrbitCamera {
    pub fn new(distance: f32, pitch: f32, yaw: f32, target: Vector3<f32>, aspect: f32) -> Self {
        let mut camera = Self {
            distance,
            pitch,
            yaw,
            eye: Vector3::zero(), // Will be auto-calculated in `update_eye()` nevertheless.
            target,
            up: Vector3::unit_y(),
            bounds: OrbitCameraBounds::default(),
            aspect,
            fovy: Rad(std::f32::consts::PI / 4.0),
            znear: 0.1,
            zfar: 1000.0,
            damping: 1.0,
            pending: PendingMotion::default(),
            home: (distance, pitch, yaw, target),
        };
        camera.update_eye();
        camera
    }

    /// Builds a camera at `eye` looking at `target`
    pub fn looking_at(eye: Vector3<f32>, target: Vector3<f32>, fovy: Deg<f32>, aspect: f32) -> Self {
        let offset = eye - target;
        let distance = offset.magnitude();
        let pitch = if distance > 0.0 {
            (offset.y / distance).clamp(-1.0, 1.0).asin()
        } else {
            0.0
        };
        let yaw = offset.x.atan2(offset.z);

        let mut camera = Self::new(distance, pitch, yaw, target, aspect);
        camera.fovy = fovy.into();
        camera
    }

    pub fn with_clip(mut self, znear: f32, zfar: f32) -> Self {
        self.znear = znear;
        self.zfar = zfar;
        self
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping.clamp(f32::EPSILON, 1.0);
        self
    }

    pub fn pending(&self) -> PendingMotion {
        self.pending
    }

    pub fn reset_to_default(&mut self) {
        let (distance, pitch, yaw, target) = self.home;
        self.distance = distance;
        self.pitch = pitch;
        self.yaw = yaw;
        self.target = target;
        self.pending = PendingMotion::default();

        self.update_eye();
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(
            self.bounds.min_distance.unwrap_or(f32::EPSILON),
            self.bounds.max_distance.unwrap_or(f32::MAX),
        );
        self.update_eye();
    }

    /// Queues a zoom step as a fraction of the current distance
    pub fn add_distance(&mut self, fraction: f32) {
        self.pending.distance += self.distance * fraction;
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        self.update_eye();
    }

    pub fn add_pitch(&mut self, delta: f32) {
        self.pending.pitch += delta;
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        let mut bounded_yaw = yaw;
        if let Some(min_yaw) = self.bounds.min_yaw {
            bounded_yaw = bounded_yaw.max(min_yaw);
        }
        if let Some(max_yaw) = self.bounds.max_yaw {
            bounded_yaw = bounded_yaw.min(max_yaw);
        }
        self.yaw = bounded_yaw;
        self.update_eye();
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.pending.yaw += delta;
    }

    /// Queues a pan relative to the current view direction
    /// delta.0 = horizontal pan (left/right relative to camera view)
    /// delta.1 = vertical pan (up/down relative to camera view)
    pub fn pan(&mut self, delta: (f32, f32)) {
        let (right, up) = self.screen_axes();

        // Scale pan movement by distance for consistent feel at all zoom levels
        let pan_scale = self.distance * 0.1;
        self.pending.pan += (right * delta.0 + up * delta.1) * pan_scale;
    }

    /// Applies a time-scaled share of the pending motion
    pub fn update(&mut self, delta_seconds: f32) {
        if delta_seconds <= 0.0 {
            return;
        }

        let keep = (1.0 - self.damping).powf(delta_seconds * 60.0);
        let blend = 1.0 - keep;

        let step = self.pending;
        self.pending.yaw *= keep;
        self.pending.pitch *= keep;
        self.pending.distance *= keep;
        self.pending.pan *= keep;

        self.target += step.pan * blend;
        self.yaw += step.yaw * blend;
        self.set_yaw(self.yaw);
        self.set_pitch(self.pitch + step.pitch * blend);
        self.set_distance(self.distance + step.distance * blend);
    }

    /// Camera right and up vectors in world space
    pub fn screen_axes(&self) -> (Vector3<f32>, Vector3<f32>) {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward).normalize();
        (right, up)
    }

    /// Recomputes the eye after changing `distance`, `pitch`, `yaw` or `target`.
    fn update_eye(&mut self) {
        self.eye =
            calculate_cartesian_eye_position(self.pitch, self.yaw, self.distance, self.target);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(
            Point3::from_vec(self.eye),
            Point3::from_vec(self.target),
            self.up,
        )
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraBounds {
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub min_yaw: Option<f32>,
    pub max_yaw: Option<f32>,
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_distance: None,
            max_distance: None,
            min_pitch: -std::f32::consts::PI / 2.0 + 0.01,
            max_pitch: std::f32::consts::PI / 2.0 - 0.01,
            min_yaw: None,
            max_yaw: None,
        }
    }
}

fn calculate_cartesian_eye_position(
    pitch: f32,
    yaw: f32,
    distance: f32,
    target: Vector3<f32>,
) -> Vector3<f32> {
    Vector3::new(
        distance * yaw.sin() * pitch.cos(),
        distance * pitch.sin(),
        distance * yaw.cos() * pitch.cos(),
    ) + target
}
