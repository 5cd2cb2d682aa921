//! CPU side of a frame: what gets drawn, in which order and with which uniforms
//!
//! Everything here is plain data so it can be checked without a GPU. The
//! render engine turns a [`FramePlan`] into passes.

use cgmath::{
    perspective, Deg, EuclideanSpace, InnerSpace, Matrix, Matrix4, Point3, SquareMatrix, Vector3,
    Vector4, Zero,
};

use crate::gfx::camera::{orbit_camera::OPENGL_TO_WGPU_MATRIX, Camera};
use crate::gfx::scene::{
    Background, CubeTextureKey, DrawKind, EnvMap, GeometryKey, Light, Material, SceneGraph,
    TextureKey,
};

pub const MAX_LIGHTS: usize = 4;

pub const SHADE_BASIC: f32 = 0.0;
pub const SHADE_LAMBERT: f32 = 1.0;
pub const SHADE_PHONG: f32 = 2.0;

/// Fragments of sprites below this alpha are discarded
const SPRITE_ALPHA_CUTOFF: f32 = 0.05;

/// Per-view uniform block, bound at group 0. Must match `Frame` in scene.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    /// Inverse of the projection times the rotation-only view, for the skybox
    pub sky_inverse: [[f32; 4]; 4],
    pub eye: [f32; 4],
    pub ambient: [f32; 4],
    /// Fog colour with the exp2 density in `w`
    pub fog: [f32; 4],
    /// Direction towards each light with its intensity in `w`
    pub light_directions: [[f32; 4]; MAX_LIGHTS],
    pub light_colors: [[f32; 4]; MAX_LIGHTS],
    pub light_count: [u32; 4],
}

/// Per-draw uniform block, bound at group 1. Must match `Object` in scene.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    /// Base colour with opacity in `w`
    pub color: [f32; 4],
    /// Specular colour with shininess in `w`
    pub specular: [f32; 4],
    /// x: shading model, y: textured, z: reflectivity, w: alpha cutoff
    pub params: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawGeometry {
    Mesh(GeometryKey),
    /// The shared unit quad used by every sprite
    SpriteQuad,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedDraw {
    pub geometry: DrawGeometry,
    pub texture: Option<TextureKey>,
    /// Samples the mirror capture cube
    pub reflects: bool,
    pub object: ObjectUniform,
    /// Distance from the eye, used for ordering
    pub depth: f32,
}

/// Everything the engine needs to record one view of the scene
#[derive(Debug, Clone)]
pub struct FramePlan {
    pub uniform: FrameUniform,
    pub clear: [f32; 3],
    pub sky: Option<CubeTextureKey>,
    /// Front to back
    pub opaque: Vec<PlannedDraw>,
    /// Back to front, drawn after the opaque list with blending
    pub transparent: Vec<PlannedDraw>,
}

/// View and projection of whatever is looking at the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSetup {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub eye: Point3<f32>,
}

impl ViewSetup {
    pub fn from_camera(camera: &dyn Camera) -> Self {
        Self {
            view: camera.view(),
            projection: camera.projection(),
            eye: camera.eye_position(),
        }
    }
}

/// Look direction and up vector of each cube face, in +X, -X, +Y, -Y, +Z, -Z
/// layer order
const CUBE_FACES: [([f32; 3], [f32; 3]); 6] = [
    ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
];

/// One face of a cube capture
///
/// Cube textures are addressed as seen from inside the cube, so the
/// projection mirrors x; faces rendered this way can be sampled with plain
/// world-space directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeFaceCamera {
    pub origin: Point3<f32>,
    pub face: usize,
    pub near: f32,
    pub far: f32,
}

impl CubeFaceCamera {
    pub fn faces(origin: Point3<f32>, near: f32, far: f32) -> [CubeFaceCamera; 6] {
        std::array::from_fn(|face| CubeFaceCamera {
            origin,
            face,
            near,
            far,
        })
    }
}

impl Camera for CubeFaceCamera {
    fn view(&self) -> Matrix4<f32> {
        let (direction, up) = CUBE_FACES[self.face % 6];
        Matrix4::look_to_rh(self.origin, Vector3::from(direction), Vector3::from(up))
    }

    fn projection(&self) -> Matrix4<f32> {
        Matrix4::from_nonuniform_scale(-1.0, 1.0, 1.0)
            * OPENGL_TO_WGPU_MATRIX
            * perspective(Deg(90.0), 1.0, self.near, self.far)
    }

    fn eye_position(&self) -> Point3<f32> {
        self.origin
    }
}

/// Turns a sprite's world transform into one that faces the viewer
///
/// Keeps the sprite's centre and its x/y scale, takes the orientation from
/// the camera.
pub fn billboard(world: Matrix4<f32>, view: Matrix4<f32>) -> Matrix4<f32> {
    let centre = world.w;
    let scale_x = world.x.truncate().magnitude();
    let scale_y = world.y.truncate().magnitude();

    // rows of the view rotation are the camera axes in world space
    let right = view.row(0).truncate();
    let up = view.row(1).truncate();
    let back = view.row(2).truncate();

    Matrix4::from_cols(
        (right * scale_x).extend(0.0),
        (up * scale_y).extend(0.0),
        back.extend(0.0),
        centre,
    )
}

fn normal_matrix(model: Matrix4<f32>) -> Matrix4<f32> {
    model
        .invert()
        .map(|inverse| inverse.transpose())
        .unwrap_or(model)
}

fn object_for_material(model: Matrix4<f32>, material: &Material) -> ObjectUniform {
    let (color, opacity, specular, params) = match material {
        Material::Basic(basic) => {
            let reflectivity = match basic.env_map {
                Some(EnvMap::MirrorCapture) => basic.reflectivity,
                None => 0.0,
            };
            let opacity = if basic.transparent { basic.opacity } else { 1.0 };
            (
                basic.color,
                opacity,
                [0.0; 4],
                [SHADE_BASIC, basic.map.is_some() as u32 as f32, reflectivity, 0.0],
            )
        }
        Material::Lambert { color, map } => (
            *color,
            1.0,
            [0.0; 4],
            [SHADE_LAMBERT, map.is_some() as u32 as f32, 0.0, 0.0],
        ),
        Material::Phong {
            color,
            specular,
            shininess,
        } => (
            *color,
            1.0,
            [specular[0], specular[1], specular[2], *shininess],
            [SHADE_PHONG, 0.0, 0.0, 0.0],
        ),
    };

    ObjectUniform {
        model: model.into(),
        normal: normal_matrix(model).into(),
        color: [color[0], color[1], color[2], opacity],
        specular,
        params,
    }
}

fn frame_uniform(graph: &SceneGraph, setup: &ViewSetup) -> FrameUniform {
    let mut ambient = [0.0f32; 3];
    let mut directions = [[0.0f32; 4]; MAX_LIGHTS];
    let mut colors = [[0.0f32; 4]; MAX_LIGHTS];
    let mut count = 0usize;

    for placed in graph.lights() {
        match placed.light {
            Light::Ambient { color } => {
                for (sum, c) in ambient.iter_mut().zip(color) {
                    *sum += c;
                }
            }
            Light::Directional {
                color, intensity, ..
            } => {
                if count == MAX_LIGHTS {
                    log::warn!("Ignoring directional light beyond the first {MAX_LIGHTS}");
                    continue;
                }
                // shines from its position towards the origin
                let position = placed.position();
                let towards = if position.is_zero() {
                    Vector3::unit_y()
                } else {
                    position.normalize()
                };
                directions[count] = towards.extend(intensity).into();
                colors[count] = [color[0], color[1], color[2], 1.0];
                count += 1;
            }
        }
    }

    let fog = graph
        .fog
        .map(|fog| [fog.color[0], fog.color[1], fog.color[2], fog.density])
        .unwrap_or([0.0; 4]);

    let mut rotation_only = setup.view;
    rotation_only.w = Vector4::new(0.0, 0.0, 0.0, 1.0);
    let sky_inverse = (setup.projection * rotation_only)
        .invert()
        .unwrap_or_else(Matrix4::identity);

    FrameUniform {
        view_proj: (setup.projection * setup.view).into(),
        sky_inverse: sky_inverse.into(),
        eye: setup.eye.to_homogeneous().into(),
        ambient: [ambient[0], ambient[1], ambient[2], 1.0],
        fog,
        light_directions: directions,
        light_colors: colors,
        light_count: [count as u32, 0, 0, 0],
    }
}

/// Collects the visible scene as seen from `setup`
///
/// `fallback_clear` is used when the background is a cube map whose faces
/// have not arrived yet.
pub fn plan_frame(graph: &SceneGraph, setup: &ViewSetup, fallback_clear: [f32; 3]) -> FramePlan {
    let (clear, sky) = match graph.background {
        Background::Color(color) => (color, None),
        Background::CubeMap(key) => {
            let loaded = graph
                .cube_texture(key)
                .is_some_and(|slot| slot.faces.is_some());
            (fallback_clear, loaded.then_some(key))
        }
    };

    let mut opaque = Vec::new();
    let mut transparent = Vec::new();

    for item in graph.draw_list() {
        let depth = (Point3::from_vec(item.world.w.truncate()) - setup.eye).magnitude();
        match item.kind {
            DrawKind::Mesh { geometry, material } => {
                let draw = PlannedDraw {
                    geometry: DrawGeometry::Mesh(geometry),
                    texture: material.map(),
                    reflects: matches!(
                        material,
                        Material::Basic(basic) if basic.env_map.is_some()
                    ),
                    object: object_for_material(item.world, &material),
                    depth,
                };
                if material.is_transparent() {
                    transparent.push(draw);
                } else {
                    opaque.push(draw);
                }
            }
            DrawKind::Sprite(sprite) => {
                let model = billboard(item.world, setup.view);
                transparent.push(PlannedDraw {
                    geometry: DrawGeometry::SpriteQuad,
                    texture: sprite.map,
                    reflects: false,
                    object: ObjectUniform {
                        model: model.into(),
                        normal: normal_matrix(model).into(),
                        color: [sprite.color[0], sprite.color[1], sprite.color[2], 1.0],
                        specular: [0.0; 4],
                        params: [
                            SHADE_BASIC,
                            sprite.map.is_some() as u32 as f32,
                            0.0,
                            SPRITE_ALPHA_CUTOFF,
                        ],
                    },
                    depth,
                });
            }
        }
    }

    opaque.sort_by(|a, b| a.depth.total_cmp(&b.depth));
    transparent.sort_by(|a, b| b.depth.total_cmp(&a.depth));

    FramePlan {
        uniform: frame_uniform(graph, setup),
        clear,
        sky,
        opaque,
        transparent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_cube;
    use crate::gfx::scene::{rgb, BasicMaterial, Fog, SpriteMaterial, VisualNode};

    fn eye_at(x: f32, y: f32, z: f32) -> ViewSetup {
        let eye = Point3::new(x, y, z);
        ViewSetup {
            view: Matrix4::look_at_rh(eye, Point3::new(0.0, 0.0, 0.0), Vector3::unit_y()),
            projection: OPENGL_TO_WGPU_MATRIX * perspective(Deg(38.0), 1.5, 1.0, 10000.0),
            eye,
        }
    }

    fn clip(camera: &dyn Camera, point: Point3<f32>) -> Vector3<f32> {
        let p = camera.build_view_projection_matrix() * point.to_homogeneous();
        p.truncate() / p.w
    }

    #[test]
    fn test_draw_order() {
        let mut graph = SceneGraph::new();
        let cube = graph.insert_geometry(generate_cube());
        let glass = Material::Basic(BasicMaterial {
            transparent: true,
            opacity: 0.2,
            ..Default::default()
        });
        for (name, z, material) in [
            ("near solid", 10.0, Material::lambert(0xFF0000)),
            ("far solid", -50.0, Material::lambert(0x00FF00)),
            ("near glass", 20.0, glass),
            ("far glass", -80.0, glass),
        ] {
            graph.add_root(VisualNode::mesh(name, cube, material).with_position(0.0, 0.0, z));
        }

        let plan = plan_frame(&graph, &eye_at(0.0, 0.0, 100.0), [0.5; 3]);
        assert_eq!(plan.opaque.len(), 2);
        assert_eq!(plan.transparent.len(), 2);
        assert!(plan.opaque[0].depth < plan.opaque[1].depth);
        assert!(plan.transparent[0].depth > plan.transparent[1].depth);
        assert_eq!(plan.transparent[0].object.color[3], 0.2);
    }

    #[test]
    fn test_hidden_nodes_are_not_planned() {
        let mut graph = SceneGraph::new();
        let cube = graph.insert_geometry(generate_cube());
        let mirror = graph.add_root(VisualNode::mesh(
            "mirror",
            cube,
            Material::Basic(BasicMaterial {
                env_map: Some(EnvMap::MirrorCapture),
                ..Default::default()
            }),
        ));

        let plan = plan_frame(&graph, &eye_at(0.0, 0.0, 100.0), [0.5; 3]);
        assert!(plan.opaque[0].reflects);
        assert_eq!(plan.opaque[0].object.params[2], 1.0);

        graph.set_visible(mirror, false).expect("mirror exists");
        let plan = plan_frame(&graph, &eye_at(0.0, 0.0, 100.0), [0.5; 3]);
        assert!(plan.opaque.is_empty());
    }

    #[test]
    fn test_lights_and_fog_are_packed() {
        let mut graph = SceneGraph::new();
        graph.add_root(VisualNode::light(
            "ambient",
            Light::Ambient {
                color: rgb(0x222222),
            },
        ));
        let mut sun = VisualNode::light(
            "sun",
            Light::Directional {
                color: [1.0; 3],
                intensity: 0.5,
                cast_shadow: false,
            },
        );
        sun.set_position(Vector3::new(0.0, 10.0, 0.0));
        graph.add_root(sun);
        graph.fog = Some(Fog {
            color: rgb(0x808080),
            density: 0.00025,
        });

        let uniform = plan_frame(&graph, &eye_at(0.0, 0.0, 100.0), [0.5; 3]).uniform;
        assert_eq!(uniform.light_count[0], 1);
        assert_eq!(uniform.light_directions[0], [0.0, 1.0, 0.0, 0.5]);
        assert!((uniform.ambient[0] - 0x22 as f32 / 255.0).abs() < 1e-6);
        assert_eq!(uniform.fog[3], 0.00025);
    }

    #[test]
    fn test_unloaded_skybox_falls_back_to_clear_colour() {
        let mut graph = SceneGraph::new();
        let sky = graph.create_cube_texture("sky");
        graph.background = Background::CubeMap(sky);

        let clear = rgb(0xAAAAAA);
        let plan = plan_frame(&graph, &eye_at(0.0, 0.0, 100.0), clear);
        assert_eq!(plan.sky, None);
        assert_eq!(plan.clear, clear);

        let face = std::sync::Arc::new(crate::gfx::scene::ImageData::solid(1, 1, [0, 0, 255, 255]));
        graph.fill_cube_texture(sky, std::array::from_fn(|_| face.clone()));
        assert_eq!(plan_frame(&graph, &eye_at(0.0, 0.0, 100.0), clear).sky, Some(sky));
    }

    #[test]
    fn test_cube_faces_look_along_their_axis() {
        let origin = Point3::new(149.0, 75.0, 0.0);
        for camera in CubeFaceCamera::faces(origin, 0.1, 5000.0) {
            let (direction, _) = CUBE_FACES[camera.face];
            let ahead = origin + Vector3::from(direction) * 10.0;
            let p = clip(&camera, ahead);
            assert!(p.x.abs() < 1e-4 && p.y.abs() < 1e-4, "face {}: {p:?}", camera.face);
            assert!((0.0..=1.0).contains(&p.z));
        }
    }

    #[test]
    fn test_cube_face_orientation_matches_texture_layout() {
        let origin = Point3::new(0.0, 0.0, 0.0);
        let faces = CubeFaceCamera::faces(origin, 0.1, 100.0);

        // +X face: +Z is on the left, +Y at the top
        let p = clip(&faces[0], Point3::new(10.0, 2.0, 2.0));
        assert!(p.x < 0.0 && p.y > 0.0);

        // +Y face: -Z at the top, -X on the left
        let p = clip(&faces[2], Point3::new(-2.0, 10.0, -2.0));
        assert!(p.x < 0.0 && p.y > 0.0);

        // +Z face: -X on the left
        let p = clip(&faces[4], Point3::new(-2.0, 0.0, 10.0));
        assert!(p.x < 0.0);
    }

    #[test]
    fn test_sprite_faces_the_camera() {
        let mut graph = SceneGraph::new();
        let texture = graph.create_texture("butterfly");
        let mut sprite = VisualNode::sprite("butterfly", SpriteMaterial::new(texture))
            .with_position(0.0, 50.0, 0.0);
        sprite.scale_xyz(Vector3::new(20.0, 20.0, 1.0));
        graph.add_root(sprite);

        let setup = eye_at(-400.0, 175.0, 50.0);
        let plan = plan_frame(&graph, &setup, [0.5; 3]);
        assert_eq!(plan.transparent.len(), 1);

        let model = Matrix4::from(plan.transparent[0].object.model);
        let centre = model.w.truncate();
        assert_eq!(centre, Vector3::new(0.0, 50.0, 0.0));
        assert!((model.x.truncate().magnitude() - 20.0).abs() < 1e-3);

        let facing = model.z.truncate();
        let to_eye = (setup.eye.to_vec() - centre).normalize();
        assert!(facing.dot(to_eye) > 0.99);
    }
}
