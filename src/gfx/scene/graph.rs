use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix, Vector3};
use slotmap::{new_key_type, SlotMap};

use crate::gfx::geometry::GeometryData;

use super::{
    material::{Material, SpriteMaterial},
    node::{Light, NodeKind, NodeTag, VisualNode},
    texture::{CubeTextureSlot, ImageData, TextureSlot},
};

new_key_type! {
    pub struct NodeKey;
    pub struct GeometryKey;
    pub struct TextureKey;
    pub struct CubeTextureKey;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("node {0:?} is not in the scene graph")]
    MissingNode(NodeKey),
}

/// Exponential-squared fog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: [f32; 3],
    pub density: f32,
}

impl Fog {
    /// Fraction of the fog colour mixed in at `distance`
    pub fn factor(&self, distance: f32) -> f32 {
        let d = self.density * distance;
        (1.0 - (-d * d).exp()).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Background {
    Color([f32; 3]),
    CubeMap(CubeTextureKey),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawKind {
    Mesh {
        geometry: GeometryKey,
        material: Material,
    },
    Sprite(SpriteMaterial),
}

/// A visible drawable with its world transform
#[derive(Debug, Clone, Copy)]
pub struct DrawItem {
    pub key: NodeKey,
    pub world: Matrix4<f32>,
    pub kind: DrawKind,
}

/// A visible light with its world transform
#[derive(Debug, Clone, Copy)]
pub struct PlacedLight {
    pub light: Light,
    pub world: Matrix4<f32>,
}

impl PlacedLight {
    pub fn position(&self) -> Vector3<f32> {
        self.world.w.truncate()
    }
}

/// Retained scene graph: node tree plus geometry and texture stores
///
/// Nodes live in a slot map so whole subtrees can be discarded and rebuilt
/// without invalidating keys held for other subtrees. `revision` is bumped on
/// every structural change (nodes added or removed, geometry inserted,
/// texture filled) so renderers know when to resynchronise GPU resources.
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, VisualNode>,
    roots: Vec<NodeKey>,
    geometries: SlotMap<GeometryKey, Arc<GeometryData>>,
    textures: SlotMap<TextureKey, TextureSlot>,
    cube_textures: SlotMap<CubeTextureKey, CubeTextureSlot>,
    pub fog: Option<Fog>,
    pub background: Background,
    revision: u64,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
            geometries: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            cube_textures: SlotMap::with_key(),
            fog: None,
            background: Background::Color([0.0, 0.0, 0.0]),
            revision: 0,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// Adds a node at the top level of the scene
    pub fn add_root(&mut self, mut node: VisualNode) -> NodeKey {
        node.parent = None;
        node.children.clear();
        let key = self.nodes.insert(node);
        self.roots.push(key);
        self.touch();
        key
    }

    /// Adds a node under `parent`
    pub fn add_child(&mut self, parent: NodeKey, mut node: VisualNode) -> Result<NodeKey, SceneError> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::MissingNode(parent));
        }

        node.parent = Some(parent);
        node.children.clear();
        let key = self.nodes.insert(node);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(key);
        }
        self.touch();
        Ok(key)
    }

    /// Removes a node and all of its descendants, returning how many nodes went
    pub fn remove_subtree(&mut self, key: NodeKey) -> usize {
        let Some(parent) = self.nodes.get(key).map(|node| node.parent) else {
            return 0;
        };

        match parent {
            Some(parent_key) => {
                if let Some(parent) = self.nodes.get_mut(parent_key) {
                    parent.children.retain(|&child| child != key);
                }
            }
            None => self.roots.retain(|&root| root != key),
        }

        let doomed = self.descendants(key);
        for k in &doomed {
            self.nodes.remove(*k);
        }
        self.touch();
        doomed.len()
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn node(&self, key: NodeKey) -> Option<&VisualNode> {
        self.nodes.get(key)
    }

    /// Mutable node access; transform edits do not bump the revision
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut VisualNode> {
        self.nodes.get_mut(key)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    pub fn set_visible(&mut self, key: NodeKey, visible: bool) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(key).ok_or(SceneError::MissingNode(key))?;
        node.visible = visible;
        Ok(())
    }

    /// `key` followed by all of its descendants, depth first
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            if let Some(node) = self.nodes.get(k) {
                out.push(k);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Product of every ancestor's transform with the node's own
    pub fn world_transform(&self, key: NodeKey) -> Option<Matrix4<f32>> {
        let mut node = self.nodes.get(key)?;
        let mut world = node.transform;
        while let Some(parent) = node.parent.and_then(|p| self.nodes.get(p)) {
            world = parent.transform * world;
            node = parent;
        }
        Some(world)
    }

    pub fn world_position(&self, key: NodeKey) -> Option<Vector3<f32>> {
        self.world_transform(key).map(|m| m.w.truncate())
    }

    /// Visible only when the node and all its ancestors are visible
    pub fn is_effectively_visible(&self, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            match self.nodes.get(k) {
                Some(node) if node.visible => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    pub fn find_by_tag(&self, tag: NodeTag) -> Vec<NodeKey> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.tag == tag)
            .map(|(key, _)| key)
            .collect()
    }

    pub fn count_by_tag(&self, tag: NodeTag) -> usize {
        self.nodes.values().filter(|node| node.tag == tag).count()
    }

    /// Deep-copies the subtree at `source` under `parent`
    pub fn clone_subtree(&mut self, source: NodeKey, parent: NodeKey) -> Result<NodeKey, SceneError> {
        let node = self
            .nodes
            .get(source)
            .ok_or(SceneError::MissingNode(source))?
            .clone();
        let children = node.children.clone();

        let copy = self.add_child(parent, node)?;
        for child in children {
            self.clone_subtree(child, copy)?;
        }
        Ok(copy)
    }

    fn walk_visible(&self, mut visit: impl FnMut(NodeKey, &VisualNode, Matrix4<f32>)) {
        let mut stack: Vec<(NodeKey, Matrix4<f32>)> = self
            .roots
            .iter()
            .rev()
            .map(|&root| (root, Matrix4::identity()))
            .collect();

        while let Some((key, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let world = parent_world * node.transform;
            visit(key, node, world);
            stack.extend(node.children.iter().rev().map(|&child| (child, world)));
        }
    }

    /// Meshes and sprites that would be drawn this frame
    pub fn draw_list(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        self.walk_visible(|key, node, world| {
            let kind = match &node.kind {
                NodeKind::Mesh { geometry, material } => DrawKind::Mesh {
                    geometry: *geometry,
                    material: *material,
                },
                NodeKind::Sprite(material) => DrawKind::Sprite(*material),
                _ => return,
            };
            items.push(DrawItem { key, world, kind });
        });
        items
    }

    /// Lights that currently contribute to shading
    pub fn lights(&self) -> Vec<PlacedLight> {
        let mut lights = Vec::new();
        self.walk_visible(|_, node, world| {
            if let NodeKind::Light(light) = node.kind {
                lights.push(PlacedLight { light, world });
            }
        });
        lights
    }

    pub fn insert_geometry(&mut self, geometry: GeometryData) -> GeometryKey {
        self.touch();
        self.geometries.insert(Arc::new(geometry))
    }

    /// Inserts geometry that is already shared elsewhere, such as a cached model
    pub fn insert_shared_geometry(&mut self, geometry: Arc<GeometryData>) -> GeometryKey {
        self.touch();
        self.geometries.insert(geometry)
    }

    pub fn geometry(&self, key: GeometryKey) -> Option<&Arc<GeometryData>> {
        self.geometries.get(key)
    }

    pub fn geometries(&self) -> impl Iterator<Item = (GeometryKey, &Arc<GeometryData>)> {
        self.geometries.iter()
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    /// Creates an empty texture slot to be filled when its image arrives
    pub fn create_texture(&mut self, label: impl Into<String>) -> TextureKey {
        self.textures.insert(TextureSlot {
            label: label.into(),
            image: None,
            version: 0,
        })
    }

    /// Fills a texture slot; returns false when the slot no longer exists
    pub fn fill_texture(&mut self, key: TextureKey, image: Arc<ImageData>) -> bool {
        let Some(slot) = self.textures.get_mut(key) else {
            return false;
        };
        slot.image = Some(image);
        slot.version += 1;
        self.touch();
        true
    }

    pub fn texture(&self, key: TextureKey) -> Option<&TextureSlot> {
        self.textures.get(key)
    }

    pub fn textures(&self) -> impl Iterator<Item = (TextureKey, &TextureSlot)> {
        self.textures.iter()
    }

    pub fn create_cube_texture(&mut self, label: impl Into<String>) -> CubeTextureKey {
        self.cube_textures.insert(CubeTextureSlot {
            label: label.into(),
            faces: None,
            version: 0,
        })
    }

    pub fn fill_cube_texture(&mut self, key: CubeTextureKey, faces: [Arc<ImageData>; 6]) -> bool {
        let Some(slot) = self.cube_textures.get_mut(key) else {
            return false;
        };
        slot.faces = Some(Arc::new(faces));
        slot.version += 1;
        self.touch();
        true
    }

    pub fn cube_texture(&self, key: CubeTextureKey) -> Option<&CubeTextureSlot> {
        self.cube_textures.get(key)
    }

    pub fn cube_textures(&self) -> impl Iterator<Item = (CubeTextureKey, &CubeTextureSlot)> {
        self.cube_textures.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_cube;

    fn mesh_node(graph: &mut SceneGraph, name: &str) -> VisualNode {
        let geometry = graph.insert_geometry(generate_cube());
        VisualNode::mesh(name, geometry, Material::default())
    }

    #[test]
    fn test_remove_subtree_removes_descendants() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(VisualNode::group("root"));
        let child = graph.add_child(root, VisualNode::group("child")).unwrap();
        let leaf = mesh_node(&mut graph, "leaf");
        graph.add_child(child, leaf).unwrap();
        let other = graph.add_root(VisualNode::group("other"));

        assert_eq!(graph.remove_subtree(root), 3);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.roots(), &[other]);
        assert!(!graph.contains(child));
    }

    #[test]
    fn test_remove_child_detaches_from_parent() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(VisualNode::group("root"));
        let child = graph.add_child(root, VisualNode::group("child")).unwrap();

        graph.remove_subtree(child);
        assert!(graph.node(root).unwrap().children().is_empty());
    }

    #[test]
    fn test_add_child_to_missing_parent_fails() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(VisualNode::group("root"));
        graph.remove_subtree(root);

        let result = graph.add_child(root, VisualNode::group("orphan"));
        assert_eq!(result, Err(SceneError::MissingNode(root)));
    }

    #[test]
    fn test_world_transform_composes_ancestors() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(VisualNode::group("root").with_position(10.0, 0.0, 0.0));
        let child = graph
            .add_child(root, VisualNode::group("child").with_position(0.0, 5.0, 0.0))
            .unwrap();

        assert_eq!(
            graph.world_position(child),
            Some(Vector3::new(10.0, 5.0, 0.0))
        );
    }

    #[test]
    fn test_hidden_parent_hides_children_in_draw_list() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(VisualNode::group("root"));
        let leaf = mesh_node(&mut graph, "leaf");
        let leaf = graph.add_child(root, leaf).unwrap();

        assert_eq!(graph.draw_list().len(), 1);
        graph.set_visible(root, false).unwrap();
        assert!(graph.draw_list().is_empty());
        assert!(!graph.is_effectively_visible(leaf));
    }

    #[test]
    fn test_clone_subtree_copies_children() {
        let mut graph = SceneGraph::new();
        let template = graph.add_root(VisualNode::group("template"));
        let leaf = mesh_node(&mut graph, "leaf");
        graph.add_child(template, leaf).unwrap();
        let target = graph.add_root(VisualNode::group("target"));

        let copy = graph.clone_subtree(template, target).unwrap();
        assert_eq!(graph.descendants(copy).len(), 2);
        assert_eq!(graph.node_count(), 5);
    }

    #[test]
    fn test_revision_tracks_structure() {
        let mut graph = SceneGraph::new();
        let before = graph.revision();
        let root = graph.add_root(VisualNode::group("root"));
        assert!(graph.revision() > before);

        let before = graph.revision();
        graph.node_mut(root).unwrap().translate_x(1.0);
        assert_eq!(graph.revision(), before);
    }

    #[test]
    fn test_fill_texture_bumps_version() {
        let mut graph = SceneGraph::new();
        let key = graph.create_texture("wall");
        assert!(graph.texture(key).unwrap().image.is_none());

        assert!(graph.fill_texture(key, Arc::new(ImageData::solid(1, 1, [0; 4]))));
        assert_eq!(graph.texture(key).unwrap().version, 1);
    }

    #[test]
    fn test_fog_factor_grows_with_distance() {
        let fog = Fog {
            color: [0.5; 3],
            density: 0.001,
        };
        assert_eq!(fog.factor(0.0), 0.0);
        assert!(fog.factor(500.0) < fog.factor(1500.0));
        assert!(fog.factor(1.0e6) <= 1.0);
    }
}
