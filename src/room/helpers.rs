//! Optional overlays: ground plane, reference grids and coordinate axes

use std::{collections::HashMap, f32::consts::FRAC_PI_2};

use cgmath::Rad;

use crate::gfx::{
    geometry::{generate_frustum, generate_grid, generate_plane, GridPlane},
    scene::{
        BasicMaterial, GeometryKey, Material, NodeKey, NodeTag, SceneError, SceneGraph,
        VisualNode,
    },
};
use crate::params::SceneParameters;

const HELPER_SIZE: f32 = 10000.0;
/// One line every `HELPER_SIZE * GRID_SCALE` units
const GRID_SCALE: f32 = 0.01;
const GRID_LINE_WIDTH: f32 = 1.0;
const AXIS_LENGTH: f32 = 200.0;
const AXIS_RADIUS: f32 = 1.0;

/// Helper geometry, created the first time each overlay is shown
#[derive(Debug, Default)]
pub struct HelperShapes {
    shapes: HashMap<NodeTag, GeometryKey>,
}

impl HelperShapes {
    fn get(&mut self, graph: &mut SceneGraph, tag: NodeTag) -> GeometryKey {
        *self.shapes.entry(tag).or_insert_with(|| {
            let divisions = (1.0 / GRID_SCALE) as u32;
            let geometry = match tag {
                NodeTag::Ground => generate_plane(HELPER_SIZE, HELPER_SIZE, 1, 1),
                NodeTag::GridXZ => generate_grid(HELPER_SIZE, divisions, GRID_LINE_WIDTH, GridPlane::XZ),
                NodeTag::GridYZ => generate_grid(HELPER_SIZE, divisions, GRID_LINE_WIDTH, GridPlane::YZ),
                NodeTag::GridXY => generate_grid(HELPER_SIZE, divisions, GRID_LINE_WIDTH, GridPlane::XY),
                _ => generate_frustum(AXIS_RADIUS, AXIS_RADIUS, AXIS_LENGTH, 16),
            };
            graph.insert_geometry(geometry)
        })
    }
}

fn grid_material() -> Material {
    Material::Basic(BasicMaterial {
        color: [0.0, 0.0, 0.0],
        transparent: true,
        opacity: 0.2,
        ..Default::default()
    })
}

/// Builds the helper group with one child per enabled overlay
pub fn build_helpers(
    graph: &mut SceneGraph,
    shapes: &mut HelperShapes,
    params: &SceneParameters,
) -> Result<NodeKey, SceneError> {
    let root = graph.add_root(VisualNode::group("helpers").with_tag(NodeTag::Helpers));

    if params.ground {
        let plane = shapes.get(graph, NodeTag::Ground);
        graph.add_child(
            root,
            VisualNode::mesh("ground", plane, Material::basic_color(0xF0F0F0))
                .with_tag(NodeTag::Ground)
                .with_position(0.0, -0.2, 0.0),
        )?;
    }

    for (enabled, tag, name) in [
        (params.grid_x, NodeTag::GridXZ, "XZ grid"),
        (params.grid_y, NodeTag::GridYZ, "YZ grid"),
        (params.grid_z, NodeTag::GridXY, "XY grid"),
    ] {
        if enabled {
            let grid = shapes.get(graph, tag);
            graph.add_child(root, VisualNode::mesh(name, grid, grid_material()).with_tag(tag))?;
        }
    }

    if params.axes {
        build_axes(graph, shapes, root)?;
    }

    Ok(root)
}

fn build_axes(
    graph: &mut SceneGraph,
    shapes: &mut HelperShapes,
    parent: NodeKey,
) -> Result<NodeKey, SceneError> {
    let axes = graph.add_child(parent, VisualNode::group("axes").with_tag(NodeTag::Axes))?;
    let cylinder = shapes.get(graph, NodeTag::Axes);
    let half = AXIS_LENGTH / 2.0;

    // The cylinder runs along +Y; tip the X and Z copies over
    let mut x = VisualNode::mesh("x axis", cylinder, Material::basic_color(0xFF0000))
        .with_tag(NodeTag::Axes);
    x.rotate_z(Rad(-FRAC_PI_2));
    x.translate_y(half);

    let y = VisualNode::mesh("y axis", cylinder, Material::basic_color(0x00FF00))
        .with_tag(NodeTag::Axes)
        .with_position(0.0, half, 0.0);

    let mut z = VisualNode::mesh("z axis", cylinder, Material::basic_color(0x0000FF))
        .with_tag(NodeTag::Axes);
    z.rotate_x(Rad(FRAC_PI_2));
    z.translate_y(half);

    for axis in [x, y, z] {
        graph.add_child(axes, axis)?;
    }
    Ok(axes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_enabled_overlays_are_built() {
        let mut graph = SceneGraph::new();
        let mut shapes = HelperShapes::default();

        let root = build_helpers(&mut graph, &mut shapes, &SceneParameters::default())
            .expect("helpers build");
        assert_eq!(graph.descendants(root).len(), 1);

        let params = SceneParameters {
            grid_y: true,
            axes: true,
            ..Default::default()
        };
        let root = build_helpers(&mut graph, &mut shapes, &params).expect("helpers build");
        assert_eq!(graph.count_by_tag(NodeTag::GridYZ), 1);
        assert_eq!(graph.count_by_tag(NodeTag::GridXZ), 0);
        assert_eq!(graph.count_by_tag(NodeTag::Axes), 4);
        assert!(graph.descendants(root).len() > 1);
    }

    #[test]
    fn test_axes_point_along_their_axis() {
        let mut graph = SceneGraph::new();
        let mut shapes = HelperShapes::default();
        let params = SceneParameters {
            axes: true,
            ..Default::default()
        };
        build_helpers(&mut graph, &mut shapes, &params).expect("helpers build");

        let centres: Vec<_> = graph
            .find_by_tag(NodeTag::Axes)
            .into_iter()
            .filter(|&key| graph.node(key).is_some_and(|n| n.name.ends_with("axis")))
            .filter_map(|key| graph.world_position(key).map(|p| (graph.node(key).map(|n| n.name.clone()), p)))
            .collect();
        assert_eq!(centres.len(), 3);
        for (name, p) in centres {
            let (along, rest) = match name.as_deref() {
                Some("x axis") => (p.x, p.y.abs() + p.z.abs()),
                Some("y axis") => (p.y, p.x.abs() + p.z.abs()),
                _ => (p.z, p.x.abs() + p.y.abs()),
            };
            assert!((along - 100.0).abs() < 1e-3, "{name:?} at {p:?}");
            assert!(rest < 1e-3);
        }
    }

    #[test]
    fn test_geometry_is_reused_across_rebuilds() {
        let mut graph = SceneGraph::new();
        let mut shapes = HelperShapes::default();
        let params = SceneParameters {
            grid_x: true,
            ..Default::default()
        };
        let first = build_helpers(&mut graph, &mut shapes, &params).expect("helpers build");
        let count = graph.geometry_count();
        graph.remove_subtree(first);
        build_helpers(&mut graph, &mut shapes, &params).expect("helpers build");
        assert_eq!(graph.geometry_count(), count);
    }
}
