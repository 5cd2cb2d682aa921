//! Scene graph nodes
//!
//! A [`VisualNode`] is a placed object: a group, a mesh, a sprite, a light or
//! a cube camera. Its local transform is a single matrix edited by sequential
//! local-axis operations, the same way an object is moved with
//! `translate_x`/`rotate_y` in retained-mode scene libraries: each call
//! post-multiplies the current transform, so later operations happen in the
//! frame produced by earlier ones.

use cgmath::{Matrix4, Rad, SquareMatrix, Vector3};

use super::{
    graph::{GeometryKey, NodeKey},
    material::{Material, SpriteMaterial},
};

/// Role of a node in the room, used for lookups and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeTag {
    None,
    Light,
    Vase,
    VaseBody,
    Sunflower,
    FlowerHead,
    Flora,
    Walls,
    Wall,
    Window,
    Mirror,
    MirrorCamera,
    Butterfly,
    Helpers,
    GridXZ,
    GridYZ,
    GridXY,
    Ground,
    Axes,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    /// Uniform light reaching every surface
    Ambient { color: [f32; 3] },
    /// Light shining from the node's world position towards the origin
    Directional {
        color: [f32; 3],
        intensity: f32,
        cast_shadow: bool,
    },
}

/// Render-to-cube-texture camera settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeCameraSettings {
    pub near: f32,
    pub far: f32,
    pub resolution: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh {
        geometry: GeometryKey,
        material: Material,
    },
    Sprite(SpriteMaterial),
    Light(Light),
    CubeCamera(CubeCameraSettings),
}

/// A placed object in the scene graph
#[derive(Debug, Clone)]
pub struct VisualNode {
    pub name: String,
    pub tag: NodeTag,
    pub kind: NodeKind,
    pub transform: Matrix4<f32>,
    pub visible: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
}

impl VisualNode {
    /// Creates a node with identity transformation
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            tag: NodeTag::None,
            kind,
            transform: Matrix4::identity(),
            visible: true,
            cast_shadow: false,
            receive_shadow: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, geometry: GeometryKey, material: Material) -> Self {
        Self::new(name, NodeKind::Mesh { geometry, material })
    }

    pub fn sprite(name: impl Into<String>, material: SpriteMaterial) -> Self {
        Self::new(name, NodeKind::Sprite(material))
    }

    pub fn light(name: impl Into<String>, light: Light) -> Self {
        Self::new(name, NodeKind::Light(light))
    }

    pub fn cube_camera(name: impl Into<String>, settings: CubeCameraSettings) -> Self {
        Self::new(name, NodeKind::CubeCamera(settings))
    }

    pub fn with_tag(mut self, tag: NodeTag) -> Self {
        self.tag = tag;
        self
    }

    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.set_position(Vector3::new(x, y, z));
        self
    }

    pub fn with_shadows(mut self) -> Self {
        self.cast_shadow = true;
        self.receive_shadow = true;
        self
    }

    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = transform;
        self
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// Local translation component
    pub fn position(&self) -> Vector3<f32> {
        self.transform.w.truncate()
    }

    /// Replaces the translation, keeping rotation and scale
    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.transform.w = position.extend(1.0);
    }

    /// Apply translation in the node's local frame
    pub fn translate(&mut self, translation: Vector3<f32>) {
        self.transform = self.transform * Matrix4::from_translation(translation);
    }

    pub fn translate_x(&mut self, distance: f32) {
        self.translate(Vector3::new(distance, 0.0, 0.0));
    }

    pub fn translate_y(&mut self, distance: f32) {
        self.translate(Vector3::new(0.0, distance, 0.0));
    }

    pub fn translate_z(&mut self, distance: f32) {
        self.translate(Vector3::new(0.0, 0.0, distance));
    }

    /// Apply rotation around the local X axis
    pub fn rotate_x(&mut self, angle: Rad<f32>) {
        self.transform = self.transform * Matrix4::from_angle_x(angle);
    }

    /// Apply rotation around the local Y axis
    pub fn rotate_y(&mut self, angle: Rad<f32>) {
        self.transform = self.transform * Matrix4::from_angle_y(angle);
    }

    /// Apply rotation around the local Z axis
    pub fn rotate_z(&mut self, angle: Rad<f32>) {
        self.transform = self.transform * Matrix4::from_angle_z(angle);
    }

    /// Non-uniform scale applied in the local frame
    pub fn scale_xyz(&mut self, scale: Vector3<f32>) {
        self.transform = self.transform * Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z);
    }

    /// Reset to identity matrix
    pub fn reset_transform(&mut self) {
        self.transform = Matrix4::identity();
    }
}
