use cgmath::Rad;

use crate::gfx::{
    geometry::generate_frustum,
    scene::{GeometryKey, Material, NodeKey, NodeTag, SceneError, SceneGraph, VisualNode},
};
use crate::params::SceneParameters;

pub const VASE_RADIUS: f32 = 10.0;
pub const VASE_HEIGHT: f32 = 40.0;
const VASE_SEGMENTS: u32 = 18;

/// Geometry of the two vase halves, shared by every rebuild
#[derive(Debug, Clone, Copy)]
pub struct VaseShapes {
    lower: GeometryKey,
    upper: GeometryKey,
}

impl VaseShapes {
    pub fn new(graph: &mut SceneGraph) -> Self {
        let r = VASE_RADIUS;
        let half = VASE_HEIGHT / 2.0;
        Self {
            lower: graph.insert_geometry(generate_frustum(2.0 * r, r, half, VASE_SEGMENTS)),
            upper: graph.insert_geometry(generate_frustum(1.2 * r, 2.0 * r, half, VASE_SEGMENTS)),
        }
    }
}

/// Keys of a freshly built vase
#[derive(Debug, Clone, Copy)]
pub struct VaseNodes {
    pub root: NodeKey,
    /// Parent of the sunflower copies
    pub flora: NodeKey,
    /// Parent of the flower-head copies
    pub heads: NodeKey,
}

/// Moves the vase with three local-axis steps: along x, turn, then along the
/// turned z axis
pub fn place_vase(node: &mut VisualNode, params: &SceneParameters) {
    node.reset_transform();
    node.translate_x(params.vase_x);
    node.rotate_y(Rad(params.vase_rotation));
    node.translate_z(params.vase_z);
}

pub fn build_vase(
    graph: &mut SceneGraph,
    shapes: &VaseShapes,
    params: &SceneParameters,
) -> Result<VaseNodes, SceneError> {
    let mut vase = VisualNode::group("vase")
        .with_tag(NodeTag::Vase)
        .with_shadows();
    place_vase(&mut vase, params);
    let root = graph.add_root(vase);

    graph.add_child(
        root,
        VisualNode::mesh("vase lower", shapes.lower, Material::lambert(0xCCC486))
            .with_tag(NodeTag::VaseBody)
            .with_position(0.0, VASE_HEIGHT / 4.0, 0.0),
    )?;
    graph.add_child(
        root,
        VisualNode::mesh(
            "vase upper",
            shapes.upper,
            Material::phong(0xC4B029, 0xC4B029, 80.0),
        )
        .with_tag(NodeTag::VaseBody)
        .with_position(0.0, 3.0 * VASE_HEIGHT / 4.0, 0.0),
    )?;

    let flora = graph.add_child(root, VisualNode::group("sunflowers").with_tag(NodeTag::Flora))?;
    let heads = graph.add_child(root, VisualNode::group("flower heads").with_tag(NodeTag::Flora))?;

    Ok(VaseNodes { root, flora, heads })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vase_transform_order() {
        let params = SceneParameters {
            vase_x: 50.0,
            vase_z: -20.0,
            vase_rotation: 1.2,
            ..Default::default()
        };
        let mut graph = SceneGraph::new();
        let shapes = VaseShapes::new(&mut graph);
        let vase = build_vase(&mut graph, &shapes, &params).expect("vase builds");

        let position = graph.world_position(vase.root).expect("vase is in the graph");
        let expected_x = 50.0 + -20.0 * 1.2f32.sin();
        let expected_z = -20.0 * 1.2f32.cos();
        assert!((position.x - expected_x).abs() < 1e-4);
        assert!(position.y.abs() < 1e-6);
        assert!((position.z - expected_z).abs() < 1e-4);
    }

    #[test]
    fn test_vase_halves_sit_on_each_other() {
        let mut graph = SceneGraph::new();
        let shapes = VaseShapes::new(&mut graph);
        let vase = build_vase(&mut graph, &shapes, &SceneParameters::default())
            .expect("vase builds");

        let bodies = graph.find_by_tag(NodeTag::VaseBody);
        assert_eq!(bodies.len(), 2);
        let mut heights: Vec<f32> = bodies
            .iter()
            .filter_map(|&key| graph.world_position(key))
            .map(|p| p.y)
            .collect();
        heights.sort_by(f32::total_cmp);
        assert_eq!(heights, vec![10.0, 30.0]);
        assert_eq!(graph.descendants(vase.root).len(), 5);
    }

    #[test]
    fn test_place_vase_replaces_previous_transform() {
        let mut node = VisualNode::group("vase");
        let params = SceneParameters {
            vase_x: 10.0,
            ..Default::default()
        };
        place_vase(&mut node, &params);
        place_vase(&mut node, &params);
        assert!((node.position().x - 10.0).abs() < 1e-6);
    }
}
