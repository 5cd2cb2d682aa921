//! Asset locations, relative to the configured asset root

/// Skybox faces in cube order: +X, -X, +Y, -Y, +Z, -Z
pub const SKYBOX_FACES: [&str; 6] = [
    "textures/skybox2/skybox_1.jpg",
    "textures/skybox2/skybox_2.jpg",
    "textures/skybox2/skybox_up.jpg",
    "textures/skybox2/skybox_down.jpg",
    "textures/skybox2/skybox_3.jpg",
    "textures/skybox2/skybox_4.jpg",
];

pub const WALL_TEXTURE: &str = "textures/blue_wall.jpg";

pub const SUNFLOWER_MODEL: &str = "textures/sunFlower/sunFlowerStructure.obj";
pub const SUNFLOWER_TEXTURE: &str = "textures/sunFlower/sunFlowerMap.jpg";

pub const FLOWER_HEAD_MODEL: &str = "textures/headSunFlower/model.obj";
pub const FLOWER_HEAD_MATERIALS: &str = "textures/headSunFlower/model.mtl";

pub const BUTTERFLY_FRONT: &str = "textures/butterfly/1.png";
pub const BUTTERFLY_BACK: &str = "textures/butterfly/2.png";
