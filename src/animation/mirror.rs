use cgmath::{EuclideanSpace, Point3};

use crate::gfx::rendering::{CubeCapture, SceneRenderer};
use crate::gfx::scene::{CubeCameraSettings, NodeKey, NodeKind, SceneError, SceneGraph};

/// Keeps the mirror's environment cube in step with the room
#[derive(Debug, Clone, Copy)]
pub struct MirrorState {
    pub mirror: NodeKey,
    pub camera: NodeKey,
    pub captures: u64,
}

impl MirrorState {
    pub fn new(mirror: NodeKey, camera: NodeKey) -> Self {
        Self {
            mirror,
            camera,
            captures: 0,
        }
    }

    /// Re-renders the cube around the mirror
    ///
    /// The mirror is hidden for the capture so it does not appear in its own
    /// reflection, and is visible again when this returns.
    pub fn refresh(
        &mut self,
        graph: &mut SceneGraph,
        renderer: &mut dyn SceneRenderer,
    ) -> Result<CubeCapture, SceneError> {
        let origin = graph
            .world_position(self.mirror)
            .ok_or(SceneError::MissingNode(self.mirror))?;

        let camera = graph
            .node_mut(self.camera)
            .ok_or(SceneError::MissingNode(self.camera))?;
        camera.set_position(origin);
        let settings = match camera.kind {
            NodeKind::CubeCamera(settings) => settings,
            _ => CubeCameraSettings {
                near: 0.1,
                far: 5000.0,
                resolution: 512,
            },
        };

        let capture = CubeCapture {
            origin: Point3::from_vec(origin),
            settings,
        };

        graph.set_visible(self.mirror, false)?;
        renderer.capture_cube(graph, &capture);
        graph.set_visible(self.mirror, true)?;

        self.captures += 1;
        Ok(capture)
    }
}
