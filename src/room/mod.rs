//! # Room Builder
//!
//! Assembles the decorative room into a [`SceneGraph`] from the committed
//! [`SceneParameters`]: lights, fog, the vase with its flowers, the walls with
//! the window and mirror, the skybox, the butterfly sprite and the helper
//! overlays.
//!
//! The room is split into parts that can be rebuilt independently. Walls,
//! skybox, lights and butterfly are built once; the vase subtree and the
//! helper subtree are discarded and rebuilt when their parameters change, and
//! fog is updated in place. Every vase rebuild takes a new [`Generation`] so
//! models that finish loading after a newer rebuild are not attached to it.

pub mod flora;
pub mod helpers;
pub mod models;
pub mod vase;
pub mod walls;

use std::collections::HashMap;

use cgmath::Vector3;

use crate::assets::{
    paths, AssetManager, Generation, GenerationCounter, ModelTarget, PreparedModel,
};
use crate::gfx::scene::{
    rgb, Background, CubeCameraSettings, CubeTextureKey, Fog, Light, NodeKey, NodeTag,
    SceneError, SceneGraph, SpriteMaterial, TextureKey, VisualNode,
};
use crate::params::{Invalidation, SceneParameters};

use helpers::HelperShapes;
use models::ModelHandles;
use vase::VaseShapes;

pub use flora::{sunflower_placements, FlowerPlacement};

/// Resolution of each mirror capture face
pub const MIRROR_RESOLUTION: u32 = 512;

/// Clear colour used when the skybox has not loaded
pub const CLEAR_COLOR: [f32; 3] = rgb(0xAAAAAA);

const BUTTERFLY_SIZE: f32 = 20.0;
pub const BUTTERFLY_START: [f32; 3] = [0.0, 50.0, 0.0];

/// Texture slots the update step swaps between
#[derive(Debug, Clone, Copy)]
pub struct RoomTextures {
    pub wall: TextureKey,
    pub butterfly_front: TextureKey,
    pub butterfly_back: TextureKey,
    pub skybox: CubeTextureKey,
}

/// Keys of everything the builder placed
#[derive(Debug, Clone)]
pub struct RoomNodes {
    pub lights: NodeKey,
    pub vase: NodeKey,
    pub flora: NodeKey,
    pub flower_heads: NodeKey,
    pub walls: NodeKey,
    pub mirror: NodeKey,
    pub mirror_camera: NodeKey,
    pub butterfly: NodeKey,
    pub helpers: NodeKey,
    pub textures: RoomTextures,
    pub vase_generation: Generation,
}

/// Builds and rebuilds the room
#[derive(Debug)]
pub struct RoomBuilder {
    show_flower_heads: bool,
    vase_shapes: Option<VaseShapes>,
    helper_shapes: HelperShapes,
    models: HashMap<&'static str, ModelHandles>,
}

impl RoomBuilder {
    pub fn new(show_flower_heads: bool) -> Self {
        Self {
            show_flower_heads,
            vase_shapes: None,
            helper_shapes: HelperShapes::default(),
            models: HashMap::new(),
        }
    }

    /// Builds every part of the room
    pub fn build(
        &mut self,
        graph: &mut SceneGraph,
        params: &SceneParameters,
        assets: &mut AssetManager,
        generations: &mut GenerationCounter,
    ) -> Result<RoomNodes, SceneError> {
        let lights = build_lights(graph)?;
        apply_fog(graph, params);

        let skybox = assets.cube_texture(graph, "skybox", paths::SKYBOX_FACES);
        graph.background = Background::CubeMap(skybox);

        let wall = assets.texture(graph, paths::WALL_TEXTURE);
        let walls = walls::build_walls(graph, wall)?;

        let [x, y, z] = walls::MIRROR_POSITION;
        let mirror_camera = graph.add_root(
            VisualNode::cube_camera(
                "mirror camera",
                CubeCameraSettings {
                    near: 0.1,
                    far: 5000.0,
                    resolution: MIRROR_RESOLUTION,
                },
            )
            .with_tag(NodeTag::MirrorCamera)
            .with_position(x, y, z),
        );

        let butterfly_front = assets.texture(graph, paths::BUTTERFLY_FRONT);
        let butterfly_back = assets.texture(graph, paths::BUTTERFLY_BACK);
        let butterfly = build_butterfly(graph, butterfly_front);

        let vase_generation = generations.next();
        let vase = self.build_vase(graph, params, assets, vase_generation)?;

        let helpers = helpers::build_helpers(graph, &mut self.helper_shapes, params)?;

        log::info!("Room built with {} nodes", graph.node_count());

        Ok(RoomNodes {
            lights,
            vase: vase.root,
            flora: vase.flora,
            flower_heads: vase.heads,
            walls: walls.root,
            mirror: walls.mirror,
            mirror_camera,
            butterfly,
            helpers,
            textures: RoomTextures {
                wall,
                butterfly_front,
                butterfly_back,
                skybox,
            },
            vase_generation,
        })
    }

    /// Discards and recreates only the parts named in `invalidation`
    pub fn rebuild(
        &mut self,
        graph: &mut SceneGraph,
        nodes: &mut RoomNodes,
        params: &SceneParameters,
        invalidation: Invalidation,
        assets: &mut AssetManager,
        generations: &mut GenerationCounter,
    ) -> Result<(), SceneError> {
        if invalidation.contains(Invalidation::VASE) {
            graph.remove_subtree(nodes.vase);
            nodes.vase_generation = generations.next();
            let vase = self.build_vase(graph, params, assets, nodes.vase_generation)?;
            nodes.vase = vase.root;
            nodes.flora = vase.flora;
            nodes.flower_heads = vase.heads;
            log::debug!("Rebuilt vase (generation {})", nodes.vase_generation.value());
        }

        if invalidation.contains(Invalidation::HELPERS) {
            graph.remove_subtree(nodes.helpers);
            nodes.helpers = helpers::build_helpers(graph, &mut self.helper_shapes, params)?;
            log::debug!("Rebuilt helpers");
        }

        if invalidation.contains(Invalidation::FOG) {
            apply_fog(graph, params);
        }

        Ok(())
    }

    /// Places a finished model load; returns false when `generation` has been
    /// superseded and the model was not attached
    pub fn attach(
        &mut self,
        graph: &mut SceneGraph,
        nodes: &RoomNodes,
        target: ModelTarget,
        generation: Generation,
        path: &'static str,
        model: &PreparedModel,
    ) -> Result<bool, SceneError> {
        if generation != nodes.vase_generation {
            return Ok(false);
        }

        let vase = vase::VaseNodes {
            root: nodes.vase,
            flora: nodes.flora,
            heads: nodes.flower_heads,
        };
        self.place_model(graph, &vase, target, path, model)?;
        Ok(true)
    }

    fn place_model(
        &mut self,
        graph: &mut SceneGraph,
        vase: &vase::VaseNodes,
        target: ModelTarget,
        path: &'static str,
        model: &PreparedModel,
    ) -> Result<(), SceneError> {
        let handles = self
            .models
            .entry(path)
            .or_insert_with(|| ModelHandles::upload(graph, path, model));

        let placed = match target {
            ModelTarget::Sunflowers => flora::place_sunflowers(graph, vase.flora, handles)?,
            ModelTarget::FlowerHeads => flora::place_flower_heads(graph, vase.heads, handles)?,
        };
        log::debug!("Attached {placed} copies of {path}");
        Ok(())
    }

    /// Builds the vase and attaches its models now when they are cached,
    /// otherwise requests them for `generation`
    fn build_vase(
        &mut self,
        graph: &mut SceneGraph,
        params: &SceneParameters,
        assets: &mut AssetManager,
        generation: Generation,
    ) -> Result<vase::VaseNodes, SceneError> {
        let shapes = *self
            .vase_shapes
            .get_or_insert_with(|| VaseShapes::new(graph));
        let vase = vase::build_vase(graph, &shapes, params)?;

        let mut requests = vec![(ModelTarget::Sunflowers, flora::sunflower_request())];
        if self.show_flower_heads {
            requests.push((ModelTarget::FlowerHeads, flora::flower_head_request()));
        }

        for (target, request) in requests {
            if let Some(model) = assets.model(target, generation, request) {
                self.place_model(graph, &vase, target, request.path(), &model)?;
            }
        }

        Ok(vase)
    }
}

fn build_lights(graph: &mut SceneGraph) -> Result<NodeKey, SceneError> {
    let root = graph.add_root(VisualNode::group("lights").with_tag(NodeTag::Light));
    graph.add_child(
        root,
        VisualNode::light(
            "ambient light",
            Light::Ambient {
                color: rgb(0x222222),
            },
        )
        .with_tag(NodeTag::Light),
    )?;

    for position in [
        Vector3::new(200.0, 400.0, 500.0),
        Vector3::new(-500.0, 250.0, -200.0),
        Vector3::new(-100.0, 50.0, -200.0),
    ] {
        let mut light = VisualNode::light(
            "directional light",
            Light::Directional {
                color: rgb(0xFFFFFF),
                intensity: 1.0,
                cast_shadow: true,
            },
        )
        .with_tag(NodeTag::Light);
        light.set_position(position);
        graph.add_child(root, light)?;
    }
    Ok(root)
}

fn apply_fog(graph: &mut SceneGraph, params: &SceneParameters) {
    graph.fog = Some(Fog {
        color: params.fog_color,
        density: params.fog_density,
    });
}

fn build_butterfly(graph: &mut SceneGraph, front: TextureKey) -> NodeKey {
    let [x, y, z] = BUTTERFLY_START;
    let mut butterfly = VisualNode::sprite("butterfly", SpriteMaterial::new(front))
        .with_tag(NodeTag::Butterfly)
        .with_position(x, y, z);
    butterfly.scale_xyz(Vector3::new(BUTTERFLY_SIZE, BUTTERFLY_SIZE, 1.0));
    graph.add_root(butterfly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{loader::tests::MemorySource, Completion};
    use std::sync::Arc;

    fn setup(show_flower_heads: bool) -> (SceneGraph, RoomBuilder, AssetManager, GenerationCounter) {
        (
            SceneGraph::new(),
            RoomBuilder::new(show_flower_heads),
            AssetManager::new(Arc::new(MemorySource::room())),
            GenerationCounter::new(),
        )
    }

    fn attach_all(
        builder: &mut RoomBuilder,
        graph: &mut SceneGraph,
        nodes: &RoomNodes,
        completions: Vec<Completion>,
    ) -> (usize, usize) {
        let (mut attached, mut stale) = (0, 0);
        for completion in completions {
            if let Completion::Model {
                target,
                generation,
                path,
                result: Ok(model),
            } = completion
            {
                match builder.attach(graph, nodes, target, generation, path, &model) {
                    Ok(true) => attached += 1,
                    Ok(false) => stale += 1,
                    Err(err) => panic!("attach failed: {err}"),
                }
            }
        }
        (attached, stale)
    }

    #[test]
    fn test_initial_build_places_every_part() {
        let (mut graph, mut builder, mut assets, mut generations) = setup(true);
        let params = SceneParameters::default();
        let nodes = builder
            .build(&mut graph, &params, &mut assets, &mut generations)
            .expect("room builds");

        assert_eq!(graph.count_by_tag(NodeTag::Light), 5);
        assert_eq!(graph.lights().len(), 4);
        assert_eq!(graph.count_by_tag(NodeTag::Mirror), 1);
        assert_eq!(graph.count_by_tag(NodeTag::Butterfly), 1);
        assert_eq!(graph.background, Background::CubeMap(nodes.textures.skybox));
        assert_eq!(
            graph.fog,
            Some(Fog {
                color: params.fog_color,
                density: 0.00025
            })
        );
        // models are still loading
        assert_eq!(graph.count_by_tag(NodeTag::Sunflower), 0);

        let completions = assets.wait_all();
        assert_eq!(attach_all(&mut builder, &mut graph, &nodes, completions), (2, 0));
        assert_eq!(graph.count_by_tag(NodeTag::Sunflower), 24);
        assert_eq!(graph.count_by_tag(NodeTag::FlowerHead), 5);
    }

    #[test]
    fn test_flower_heads_can_be_left_out() {
        let (mut graph, mut builder, mut assets, mut generations) = setup(false);
        let nodes = builder
            .build(&mut graph, &SceneParameters::default(), &mut assets, &mut generations)
            .expect("room builds");
        let completions = assets.wait_all();
        assert_eq!(attach_all(&mut builder, &mut graph, &nodes, completions), (1, 0));
        assert_eq!(graph.count_by_tag(NodeTag::FlowerHead), 0);
    }

    #[test]
    fn test_helper_rebuild_leaves_vase_alone() {
        let (mut graph, mut builder, mut assets, mut generations) = setup(false);
        let params = SceneParameters::default();
        let mut nodes = builder
            .build(&mut graph, &params, &mut assets, &mut generations)
            .expect("room builds");
        let vase = nodes.vase;
        let vase_generation = nodes.vase_generation;

        let axes_on = SceneParameters { axes: true, ..params };
        builder
            .rebuild(
                &mut graph,
                &mut nodes,
                &axes_on,
                Invalidation::HELPERS,
                &mut assets,
                &mut generations,
            )
            .expect("helpers rebuild");

        assert_eq!(nodes.vase, vase);
        assert_eq!(nodes.vase_generation, vase_generation);
        assert_eq!(graph.count_by_tag(NodeTag::Axes), 4);

        // the vase's sunflower load is still current
        let completions = assets.wait_all();
        assert_eq!(attach_all(&mut builder, &mut graph, &nodes, completions), (1, 0));
    }

    #[test]
    fn test_rebuilds_during_first_load_share_one_request() {
        let source = Arc::new(MemorySource::room());
        let mut graph = SceneGraph::new();
        let mut builder = RoomBuilder::new(false);
        let mut assets = AssetManager::new(source.clone());
        let mut generations = GenerationCounter::new();
        let params = SceneParameters::default();
        let mut nodes = builder
            .build(&mut graph, &params, &mut assets, &mut generations)
            .expect("room builds");

        for step in 1..=10 {
            let moved = SceneParameters {
                vase_x: step as f32,
                ..params
            };
            builder
                .rebuild(
                    &mut graph,
                    &mut nodes,
                    &moved,
                    Invalidation::VASE,
                    &mut assets,
                    &mut generations,
                )
                .expect("vase rebuild");
        }

        let completions = assets.wait_all();
        assert_eq!(source.count_requests(paths::SUNFLOWER_MODEL), 1);
        assert_eq!(attach_all(&mut builder, &mut graph, &nodes, completions), (1, 0));
        assert_eq!(graph.count_by_tag(NodeTag::Sunflower), 24);
        assert_eq!(graph.count_by_tag(NodeTag::Vase), 1);
    }

    #[test]
    fn test_model_for_older_generation_is_not_attached() {
        let (mut graph, mut builder, mut assets, mut generations) = setup(false);
        let params = SceneParameters::default();
        let mut nodes = builder
            .build(&mut graph, &params, &mut assets, &mut generations)
            .expect("room builds");
        let first = nodes.vase_generation;
        let completions = assets.wait_all();
        attach_all(&mut builder, &mut graph, &nodes, completions);

        let moved = SceneParameters { vase_x: 40.0, ..params };
        builder
            .rebuild(
                &mut graph,
                &mut nodes,
                &moved,
                Invalidation::VASE,
                &mut assets,
                &mut generations,
            )
            .expect("vase rebuild");
        assert!(nodes.vase_generation > first);

        let model = assets
            .cache()
            .model(paths::SUNFLOWER_MODEL)
            .expect("model is cached");
        let attached = builder
            .attach(
                &mut graph,
                &nodes,
                ModelTarget::Sunflowers,
                first,
                paths::SUNFLOWER_MODEL,
                &model,
            )
            .expect("attach");
        assert!(!attached);
        assert_eq!(graph.count_by_tag(NodeTag::Sunflower), 24);
    }

    #[test]
    fn test_cached_model_attaches_during_rebuild() {
        let (mut graph, mut builder, mut assets, mut generations) = setup(false);
        let params = SceneParameters::default();
        let mut nodes = builder
            .build(&mut graph, &params, &mut assets, &mut generations)
            .expect("room builds");
        let completions = assets.wait_all();
        attach_all(&mut builder, &mut graph, &nodes, completions);
        let geometries = graph.geometry_count();

        let turned = SceneParameters { vase_rotation: 1.0, ..params };
        builder
            .rebuild(
                &mut graph,
                &mut nodes,
                &turned,
                Invalidation::VASE,
                &mut assets,
                &mut generations,
            )
            .expect("vase rebuild");

        assert_eq!(assets.in_flight(), 0);
        assert_eq!(graph.count_by_tag(NodeTag::Sunflower), 24);
        assert_eq!(graph.geometry_count(), geometries);
    }
}
