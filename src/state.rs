//! # Scene Controller
//!
//! Owns the room and runs one update step per displayed frame:
//!
//! 1. ease the camera towards its pending motion,
//! 2. re-capture the mirror's environment with the mirror hidden,
//! 3. move the butterfly and swap its wing frame when it turns,
//! 4. commit the panel and rebuild only the parts whose parameters changed,
//! 5. attach assets whose loads finished, unless a newer rebuild superseded
//!    them.

use std::sync::Arc;

use cgmath::{Deg, Vector3};

use crate::animation::{ButterflyState, MirrorState, Pose};
use crate::assets::{AssetManager, AssetSource, Completion, GenerationCounter};
use crate::config::{DemoConfig, CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
use crate::gfx::rendering::{RenderError, SceneRenderer};
use crate::gfx::scene::{NodeKind, SceneError, SceneGraph};
use crate::params::{Invalidation, ParameterPanel};
use crate::room::{RoomBuilder, RoomNodes};

const CAMERA_EYE: Vector3<f32> = Vector3::new(-400.0, 175.0, 50.0);
const CAMERA_TARGET: Vector3<f32> = Vector3::new(-13.0, 75.0, 2.0);
const CAMERA_FOV: Deg<f32> = Deg(38.0);
const CAMERA_NEAR: f32 = 1.0;
const CAMERA_FAR: f32 = 10000.0;
/// Longest step one tick takes; a stalled window resumes where it left off
const MAX_FRAME_DELTA: f32 = 0.1;

/// What one update step did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub rebuilt: Invalidation,
    pub attached: usize,
    pub discarded: usize,
    pub butterfly_flipped: bool,
}

/// The room camera, looking in through the open side
pub fn room_camera(aspect: f32, damping: f32) -> CameraManager {
    let camera = OrbitCamera::looking_at(CAMERA_EYE, CAMERA_TARGET, CAMERA_FOV, aspect)
        .with_clip(CAMERA_NEAR, CAMERA_FAR)
        .with_damping(damping);
    CameraManager::new(camera, CameraController::new(0.005, 0.1))
}

pub struct SceneController {
    graph: SceneGraph,
    nodes: RoomNodes,
    builder: RoomBuilder,
    panel: ParameterPanel,
    butterfly: ButterflyState,
    butterfly_speed: f32,
    mirror: MirrorState,
    camera: CameraManager,
    generations: GenerationCounter,
    assets: AssetManager,
    rebuilds: u64,
}

impl SceneController {
    /// Builds the room from `config`; assets stream in over later ticks
    pub fn new(config: &DemoConfig, source: Arc<dyn AssetSource>) -> Result<Self, SceneError> {
        let panel = ParameterPanel::new(config.initial, config.panel);
        let mut graph = SceneGraph::new();
        let mut builder = RoomBuilder::new(config.show_flower_heads);
        let mut assets = AssetManager::new(source);
        let mut generations = GenerationCounter::new();

        let nodes = builder.build(&mut graph, panel.committed(), &mut assets, &mut generations)?;
        let mirror = MirrorState::new(nodes.mirror, nodes.mirror_camera);

        let aspect = CANVAS_WIDTH as f32 / CANVAS_HEIGHT as f32;
        Ok(Self {
            graph,
            nodes,
            builder,
            panel,
            butterfly: ButterflyState::new(),
            butterfly_speed: config.butterfly_speed,
            mirror,
            camera: room_camera(aspect, config.camera_damping),
            generations,
            assets,
            rebuilds: 0,
        })
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn nodes(&self) -> &RoomNodes {
        &self.nodes
    }

    pub fn panel(&self) -> &ParameterPanel {
        &self.panel
    }

    /// Where the parameter widgets write
    pub fn panel_mut(&mut self) -> &mut ParameterPanel {
        &mut self.panel
    }

    pub fn camera(&self) -> &CameraManager {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraManager {
        &mut self.camera
    }

    pub fn butterfly(&self) -> &ButterflyState {
        &self.butterfly
    }

    pub fn mirror(&self) -> &MirrorState {
        &self.mirror
    }

    /// Number of ticks that rebuilt at least one part of the room
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn loads_in_flight(&self) -> usize {
        self.assets.in_flight()
    }

    pub fn tick(
        &mut self,
        delta_seconds: f32,
        renderer: &mut dyn SceneRenderer,
    ) -> Result<FrameReport, SceneError> {
        let delta = frame_delta(delta_seconds);

        self.camera.update(delta);
        self.mirror.refresh(&mut self.graph, renderer)?;

        let butterfly_flipped = self.butterfly.advance(delta, self.butterfly_speed);
        self.place_butterfly(butterfly_flipped)?;

        let rebuilt = self.panel.commit();
        if !rebuilt.is_empty() {
            self.builder.rebuild(
                &mut self.graph,
                &mut self.nodes,
                self.panel.committed(),
                rebuilt,
                &mut self.assets,
                &mut self.generations,
            )?;
            self.rebuilds += 1;
            log::debug!("Rebuilt {rebuilt:?}");
        }

        let completions = self.assets.poll();
        let (attached, discarded) = self.apply(completions)?;

        Ok(FrameReport {
            rebuilt,
            attached,
            discarded,
            butterfly_flipped,
        })
    }

    /// Draws the room through the orbit camera
    pub fn render(&self, renderer: &mut dyn SceneRenderer) -> Result<(), RenderError> {
        renderer.render(&self.graph, &self.camera.camera)
    }

    /// Blocks until every load in flight has finished and applies the results
    pub fn wait_for_assets(&mut self) -> Result<(usize, usize), SceneError> {
        let completions = self.assets.wait_all();
        self.apply(completions)
    }

    fn place_butterfly(&mut self, flipped: bool) -> Result<(), SceneError> {
        let key = self.nodes.butterfly;
        let textures = self.nodes.textures;
        let node = self
            .graph
            .node_mut(key)
            .ok_or(SceneError::MissingNode(key))?;

        if flipped {
            if let NodeKind::Sprite(material) = &mut node.kind {
                material.map = Some(match self.butterfly.pose {
                    Pose::Front => textures.butterfly_front,
                    Pose::Back => textures.butterfly_back,
                });
            }
        }
        node.set_position(self.butterfly.path_point());
        Ok(())
    }

    /// Fills texture slots and attaches current-generation models; returns
    /// (attached, discarded)
    fn apply(&mut self, completions: Vec<Completion>) -> Result<(usize, usize), SceneError> {
        let (mut attached, mut discarded) = (0, 0);

        for completion in completions {
            match completion {
                Completion::Texture { slot, path, result } => match result {
                    Ok(image) => {
                        self.graph.fill_texture(slot, image);
                    }
                    Err(err) => log::warn!("Texture {path} unavailable: {err}"),
                },
                Completion::CubeTexture { slot, result } => match result {
                    Ok(faces) => {
                        self.graph.fill_cube_texture(slot, faces);
                    }
                    Err(err) => log::warn!("Skybox unavailable: {err}"),
                },
                Completion::Model {
                    target,
                    generation,
                    path,
                    result,
                } => match result {
                    Ok(model) => {
                        if self.builder.attach(
                            &mut self.graph,
                            &self.nodes,
                            target,
                            generation,
                            path,
                            &model,
                        )? {
                            attached += 1;
                        } else {
                            discarded += 1;
                            log::debug!(
                                "Discarded {path} from superseded generation {}",
                                generation.value()
                            );
                        }
                    }
                    Err(err) => log::warn!("Model {path} unavailable, leaving it out: {err}"),
                },
            }
        }

        Ok((attached, discarded))
    }
}

fn frame_delta(delta_seconds: f32) -> f32 {
    if delta_seconds.is_finite() {
        delta_seconds.clamp(0.0, MAX_FRAME_DELTA)
    } else {
        0.0
    }
}
