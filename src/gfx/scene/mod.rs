//! # Scene Graph Module
//!
//! Retained-mode description of everything in the room. The scene builder
//! writes subtrees into a [`SceneGraph`]; the animation step mutates node
//! transforms and visibility; renderers read it back every frame.
//!
//! ## Key Components
//!
//! - [`SceneGraph`] - Node tree plus geometry and texture stores
//! - [`VisualNode`] - A group, mesh, sprite, light or cube camera
//! - [`Material`] - Basic, Lambert and Phong surface descriptions
//! - [`Vertex3D`] - GPU vertex layout with position, normal and UV
//!
//! ## Usage
//!
//! ```no_run
//! use sunroom::gfx::scene::{SceneGraph, VisualNode};
//!
//! let mut graph = SceneGraph::new();
//! let vase = graph.add_root(VisualNode::group("vase"));
//! if let Some(node) = graph.node_mut(vase) {
//!     node.translate_x(50.0);
//! }
//! ```

pub mod graph;
pub mod material;
pub mod node;
pub mod texture;
pub mod vertex;

// Re-export main types
pub use graph::{
    Background, CubeTextureKey, DrawItem, DrawKind, Fog, GeometryKey, NodeKey, PlacedLight,
    SceneError, SceneGraph, TextureKey,
};
pub use material::{rgb, BasicMaterial, EnvMap, Material, SpriteMaterial};
pub use node::{CubeCameraSettings, Light, NodeKind, NodeTag, VisualNode};
pub use texture::{CubeTextureSlot, ImageData, TextureSlot};
pub use vertex::Vertex3D;
