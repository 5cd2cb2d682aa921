//! Rendering of the scene graph
//!
//! [`SceneRenderer`] is the seam between the update step and the GPU: the
//! controller only ever asks a renderer to capture a cube around a point or
//! to draw the graph through a camera. [`RenderEngine`] is the wgpu
//! implementation; tests use a recording double.

pub mod frame;
pub mod pipeline_manager;
pub mod render_pass_ext;
pub mod render_engine;

use cgmath::Point3;

use crate::gfx::camera::Camera;
use crate::gfx::scene::{CubeCameraSettings, SceneGraph};

// Re-export main types
pub use frame::{plan_frame, CubeFaceCamera, FramePlan, ViewSetup};
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use render_engine::{RenderEngine, RenderSetupError};

/// A request to render the six faces around `origin` into the capture cube
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeCapture {
    pub origin: Point3<f32>,
    pub settings: CubeCameraSettings,
}

impl CubeCapture {
    pub fn face_cameras(&self) -> [CubeFaceCamera; 6] {
        CubeFaceCamera::faces(self.origin, self.settings.near, self.settings.far)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("surface texture unavailable: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

pub trait SceneRenderer {
    /// Renders the graph as it is now into the capture cube
    fn capture_cube(&mut self, graph: &SceneGraph, capture: &CubeCapture);

    fn render(&mut self, graph: &SceneGraph, camera: &dyn Camera) -> Result<(), RenderError>;
}
