//! Room shell: textured walls, the floor, the window and the mirror

use crate::gfx::{
    geometry::generate_box,
    scene::{
        BasicMaterial, EnvMap, Material, NodeKey, NodeTag, SceneError, SceneGraph, TextureKey,
        VisualNode,
    },
};

/// Mirror panel position; the capture camera follows it
pub const MIRROR_POSITION: [f32; 3] = [149.0, 75.0, 0.0];

/// Window opening in the left wall
const WINDOW_POSITION: [f32; 3] = [60.0, 80.0, -175.0];

#[derive(Debug, Clone, Copy)]
pub struct WallNodes {
    pub root: NodeKey,
    pub mirror: NodeKey,
}

struct Slab {
    name: &'static str,
    size: [f32; 3],
    position: [f32; 3],
}

const fn slab(name: &'static str, size: [f32; 3], position: [f32; 3]) -> Slab {
    Slab {
        name,
        size,
        position,
    }
}

/// Blue wall pieces; the left wall is four pieces around the window
const WALL_SLABS: [Slab; 6] = [
    slab("back wall", [10.0, 181.0, 350.0], [160.0, 80.0, 0.0]),
    slab("left wall", [70.0, 181.0, 10.0], [130.0, 80.0, -175.0]),
    slab("left wall", [70.0, 181.0, 10.0], [-4.0, 80.0, -175.0]),
    slab("left wall", [70.0, 53.0, 10.0], [60.0, 16.0, -175.0]),
    slab("left wall", [70.0, 53.0, 10.0], [60.0, 144.0, -175.0]),
    slab("right wall", [204.0, 181.0, 10.0], [63.0, 80.0, 175.0]),
];

fn add_slab(
    graph: &mut SceneGraph,
    parent: NodeKey,
    slab: &Slab,
    material: Material,
    tag: NodeTag,
) -> Result<NodeKey, SceneError> {
    let [w, h, d] = slab.size;
    let [x, y, z] = slab.position;
    let geometry = graph.insert_geometry(generate_box(w, h, d));
    graph.add_child(
        parent,
        VisualNode::mesh(slab.name, geometry, material)
            .with_tag(tag)
            .with_position(x, y, z),
    )
}

pub fn build_walls(graph: &mut SceneGraph, wall_texture: TextureKey) -> Result<WallNodes, SceneError> {
    let root = graph.add_root(VisualNode::group("walls").with_tag(NodeTag::Walls));

    let mirror = add_slab(
        graph,
        root,
        &slab("mirror", [1.0, 100.0, 100.0], MIRROR_POSITION),
        Material::Basic(BasicMaterial {
            env_map: Some(EnvMap::MirrorCapture),
            reflectivity: 1.0,
            ..Default::default()
        }),
        NodeTag::Mirror,
    )?;

    for wall in &WALL_SLABS {
        add_slab(graph, root, wall, Material::basic_textured(wall_texture), NodeTag::Wall)?;
    }

    let floor = add_slab(
        graph,
        root,
        &slab("floor", [200.0, 10.0, 350.0], [61.0, -5.0, 0.0]),
        Material::basic_color(0xC4B029),
        NodeTag::Wall,
    )?;
    if let Some(node) = graph.node_mut(floor) {
        node.cast_shadow = true;
        node.receive_shadow = true;
    }

    add_slab(
        graph,
        root,
        &slab("window", [70.0, 75.0, 5.0], WINDOW_POSITION),
        Material::Basic(BasicMaterial {
            color: [0.0, 0.0, 0.0],
            transparent: true,
            opacity: 0.2,
            ..Default::default()
        }),
        NodeTag::Window,
    )?;
    for frame in [
        slab("window frame", [3.0, 75.0, 1.0], WINDOW_POSITION),
        slab("window frame", [70.0, 3.0, 1.0], WINDOW_POSITION),
    ] {
        add_slab(graph, root, &frame, Material::lambert(0xB07B00), NodeTag::Window)?;
    }

    Ok(WallNodes { root, mirror })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn test_room_shell_layout() {
        let mut graph = SceneGraph::new();
        let texture = graph.create_texture("wall");
        let walls = build_walls(&mut graph, texture).expect("walls build");

        // six blue pieces plus the floor
        assert_eq!(graph.count_by_tag(NodeTag::Wall), 7);
        assert_eq!(graph.count_by_tag(NodeTag::Window), 3);
        assert_eq!(graph.count_by_tag(NodeTag::Mirror), 1);
        assert_eq!(
            graph.world_position(walls.mirror),
            Some(Vector3::new(149.0, 75.0, 0.0))
        );

        let textured = graph
            .find_by_tag(NodeTag::Wall)
            .into_iter()
            .filter_map(|key| graph.node(key))
            .filter(|node| match &node.kind {
                crate::gfx::scene::NodeKind::Mesh { material, .. } => material.map() == Some(texture),
                _ => false,
            })
            .count();
        assert_eq!(textured, 6);
    }

    #[test]
    fn test_window_pane_is_translucent() {
        let mut graph = SceneGraph::new();
        let texture = graph.create_texture("wall");
        build_walls(&mut graph, texture).expect("walls build");

        let translucent = graph
            .draw_list()
            .iter()
            .filter(|item| match item.kind {
                crate::gfx::scene::DrawKind::Mesh { material, .. } => material.is_transparent(),
                _ => false,
            })
            .count();
        assert_eq!(translucent, 1);
    }
}
