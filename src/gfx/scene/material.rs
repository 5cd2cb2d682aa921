//! Surface materials for meshes and sprites
//!
//! Mirrors the small set of shading models the room uses: unlit, Lambert,
//! Phong and camera-facing sprites. Colours are linear RGB in `0.0..=1.0`.

use super::graph::TextureKey;

/// Converts a `0xRRGGBB` literal into an RGB triple
pub const fn rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    ]
}

/// Environment map sources a basic material can reflect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvMap {
    /// The cube texture refreshed every frame by the mirror capture
    MirrorCapture,
}

/// Unlit material, optionally textured, translucent or reflective
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicMaterial {
    pub color: [f32; 3],
    pub map: Option<TextureKey>,
    pub opacity: f32,
    pub transparent: bool,
    pub env_map: Option<EnvMap>,
    pub reflectivity: f32,
}

impl Default for BasicMaterial {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            map: None,
            opacity: 1.0,
            transparent: false,
            env_map: None,
            reflectivity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    Basic(BasicMaterial),
    /// Diffuse-only lighting
    Lambert {
        color: [f32; 3],
        map: Option<TextureKey>,
    },
    /// Diffuse plus specular highlight
    Phong {
        color: [f32; 3],
        specular: [f32; 3],
        shininess: f32,
    },
}

impl Material {
    pub fn basic_color(hex: u32) -> Self {
        Material::Basic(BasicMaterial {
            color: rgb(hex),
            ..Default::default()
        })
    }

    pub fn basic_textured(map: TextureKey) -> Self {
        Material::Basic(BasicMaterial {
            map: Some(map),
            ..Default::default()
        })
    }

    pub fn lambert(hex: u32) -> Self {
        Material::Lambert {
            color: rgb(hex),
            map: None,
        }
    }

    pub fn phong(hex: u32, specular: u32, shininess: f32) -> Self {
        Material::Phong {
            color: rgb(hex),
            specular: rgb(specular),
            shininess,
        }
    }

    pub fn color(&self) -> [f32; 3] {
        match self {
            Material::Basic(basic) => basic.color,
            Material::Lambert { color, .. } | Material::Phong { color, .. } => *color,
        }
    }

    pub fn map(&self) -> Option<TextureKey> {
        match self {
            Material::Basic(basic) => basic.map,
            Material::Lambert { map, .. } => *map,
            Material::Phong { .. } => None,
        }
    }

    /// Whether the material needs blending and back-to-front ordering
    pub fn is_transparent(&self) -> bool {
        matches!(self, Material::Basic(basic) if basic.transparent && basic.opacity < 1.0)
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::Basic(BasicMaterial::default())
    }
}

/// Material of a camera-facing sprite
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteMaterial {
    pub map: Option<TextureKey>,
    pub color: [f32; 3],
}

impl SpriteMaterial {
    pub fn new(map: TextureKey) -> Self {
        Self {
            map: Some(map),
            color: [1.0, 1.0, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_from_hex() {
        assert_eq!(rgb(0xFFFFFF), [1.0, 1.0, 1.0]);
        assert_eq!(rgb(0x000000), [0.0, 0.0, 0.0]);
        let vase = rgb(0xC4B029);
        assert!((vase[0] - 196.0 / 255.0).abs() < 1e-6);
        assert!((vase[1] - 176.0 / 255.0).abs() < 1e-6);
        assert!((vase[2] - 41.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_transparency_requires_opacity_below_one() {
        let window = Material::Basic(BasicMaterial {
            color: rgb(0x000000),
            opacity: 0.2,
            transparent: true,
            ..Default::default()
        });
        assert!(window.is_transparent());

        let opaque_flag = Material::Basic(BasicMaterial {
            transparent: true,
            ..Default::default()
        });
        assert!(!opaque_flag.is_transparent());
        assert!(!Material::lambert(0xB07B00).is_transparent());
    }
}
