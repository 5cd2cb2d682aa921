//! Sunflowers around the vase and the flower heads above it

use std::f32::consts::PI;

use cgmath::{Rad, Vector3};

use crate::assets::{paths, ModelRequest};
use crate::gfx::scene::{NodeKey, NodeTag, SceneError, SceneGraph, VisualNode};

use super::{models::ModelHandles, vase::VASE_HEIGHT};

pub const SUNFLOWER_TIERS: u32 = 3;
pub const SUNFLOWERS_PER_TIER: u32 = 8;
pub const TIER_SPACING: f32 = 5.0;

pub const FLOWER_HEAD_COUNT: u32 = 5;
const FLOWER_HEAD_RING: f32 = 8.0;
const FLOWER_HEAD_SIZE: f32 = 10.0;

/// Where one sunflower copy goes, relative to the vase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowerPlacement {
    pub tier: u32,
    pub index: u32,
    /// Turn about the vase axis, radians
    pub angle: f32,
    pub height: f32,
}

/// Rings of flowers stacked `spacing` apart, each ring turned half a slot
/// further than the one below
pub fn sunflower_placements(tiers: u32, per_tier: u32, spacing: f32) -> Vec<FlowerPlacement> {
    let slot = PI / (per_tier as f32 / 2.0);
    let stagger = PI / per_tier as f32;

    (0..tiers)
        .flat_map(|tier| {
            (0..per_tier).map(move |index| FlowerPlacement {
                tier,
                index,
                angle: slot * index as f32 + stagger * tier as f32,
                height: spacing * (tier + 1) as f32,
            })
        })
        .collect()
}

pub fn sunflower_request() -> ModelRequest {
    ModelRequest::Textured {
        obj: paths::SUNFLOWER_MODEL,
        texture: paths::SUNFLOWER_TEXTURE,
        size: 0.40 * VASE_HEIGHT / 40.0,
        x_rotation: Rad(-PI / 2.0 + PI / 12.0),
    }
}

pub fn flower_head_request() -> ModelRequest {
    ModelRequest::WithMaterials {
        obj: paths::FLOWER_HEAD_MODEL,
        mtl: paths::FLOWER_HEAD_MATERIALS,
        size: FLOWER_HEAD_SIZE,
    }
}

/// Fills `flora` with copies of one sunflower template
pub fn place_sunflowers(
    graph: &mut SceneGraph,
    flora: NodeKey,
    model: &ModelHandles,
) -> Result<usize, SceneError> {
    let template = graph.add_child(
        flora,
        VisualNode::group("sunflower").with_tag(NodeTag::Sunflower),
    )?;
    model.instantiate(graph, template)?;

    let placements = sunflower_placements(SUNFLOWER_TIERS, SUNFLOWERS_PER_TIER, TIER_SPACING);
    for (n, placement) in placements.iter().enumerate() {
        let key = if n == 0 {
            template
        } else {
            graph.clone_subtree(template, flora)?
        };
        let node = graph.node_mut(key).ok_or(SceneError::MissingNode(key))?;
        node.reset_transform();
        node.translate_y(placement.height);
        node.rotate_y(Rad(placement.angle));
    }

    Ok(placements.len())
}

/// Evenly spaced ring of flower-head positions at height `y`
pub fn flower_head_positions(count: u32, radius: f32, y: f32) -> Vec<Vector3<f32>> {
    let step = 2.0 * PI / count as f32;
    (0..count)
        .map(|i| {
            let angle = step * i as f32;
            Vector3::new(angle.sin() * radius, y, angle.cos() * radius)
        })
        .collect()
}

/// Fills `heads` with upside-down flower heads hovering above the vase
pub fn place_flower_heads(
    graph: &mut SceneGraph,
    heads: NodeKey,
    model: &ModelHandles,
) -> Result<usize, SceneError> {
    let positions = flower_head_positions(FLOWER_HEAD_COUNT, FLOWER_HEAD_RING, VASE_HEIGHT + 35.0);
    for position in &positions {
        let mut head = VisualNode::group("flower head").with_tag(NodeTag::FlowerHead);
        head.translate(*position);
        head.rotate_x(Rad(PI));
        let key = graph.add_child(heads, head)?;
        model.instantiate(graph, key)?;
    }
    Ok(positions.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{PreparedMesh, PreparedModel};
    use crate::gfx::geometry::generate_cube;
    use cgmath::{Matrix4, SquareMatrix};
    use std::sync::Arc;

    fn cube_model(graph: &mut SceneGraph) -> ModelHandles {
        let model = PreparedModel {
            meshes: vec![PreparedMesh {
                name: "cube".into(),
                geometry: Arc::new(generate_cube()),
                diffuse: None,
            }],
            texture: None,
            transform: Matrix4::identity(),
        };
        ModelHandles::upload(graph, "cube", &model)
    }

    #[test]
    fn test_placements_follow_ring_formula() {
        let placements = sunflower_placements(3, 8, 5.0);
        assert_eq!(placements.len(), 24);

        for p in &placements {
            let expected = PI / 4.0 * p.index as f32 + PI / 8.0 * p.tier as f32;
            assert!((p.angle - expected).abs() < 1e-6);
            assert_eq!(p.height, 5.0 * (p.tier + 1) as f32);
        }
        assert_eq!(placements[8].tier, 1);
        assert!((placements[8].angle - PI / 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_twenty_four_sunflowers_share_one_geometry() {
        let mut graph = SceneGraph::new();
        let flora = graph.add_root(VisualNode::group("flora"));
        let model = cube_model(&mut graph);
        let geometries = graph.geometry_count();

        let placed = place_sunflowers(&mut graph, flora, &model).expect("flowers placed");
        assert_eq!(placed, 24);
        assert_eq!(graph.count_by_tag(NodeTag::Sunflower), 24);
        assert_eq!(graph.geometry_count(), geometries);

        let mut heights: Vec<f32> = graph
            .find_by_tag(NodeTag::Sunflower)
            .into_iter()
            .filter_map(|key| graph.world_position(key))
            .map(|p| p.y)
            .collect();
        heights.sort_by(f32::total_cmp);
        heights.dedup();
        assert_eq!(heights, vec![5.0, 10.0, 15.0]);
    }

    #[test]
    fn test_flower_heads_ring() {
        let positions = flower_head_positions(5, 8.0, 75.0);
        assert_eq!(positions.len(), 5);
        assert!((positions[0].z - 8.0).abs() < 1e-6);
        for p in &positions {
            assert!(((p.x * p.x + p.z * p.z).sqrt() - 8.0).abs() < 1e-4);
            assert_eq!(p.y, 75.0);
        }

        let mut graph = SceneGraph::new();
        let heads = graph.add_root(VisualNode::group("heads"));
        let model = cube_model(&mut graph);
        assert_eq!(place_flower_heads(&mut graph, heads, &model), Ok(5));
        assert_eq!(graph.count_by_tag(NodeTag::FlowerHead), 5);
    }
}
