//! CPU-side texture slots
//!
//! Textures are referenced by key as soon as a material is built and filled
//! in later when their image finishes loading. A slot without an image is
//! drawn with a plain white texture.

use std::sync::Arc;

/// Decoded RGBA8 image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl ImageData {
    /// Single-colour image, mostly useful as a placeholder
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self {
            width,
            height,
            rgba,
        }
    }

    pub fn byte_len(&self) -> usize {
        self.rgba.len()
    }
}

/// 2D texture slot
#[derive(Debug, Clone)]
pub struct TextureSlot {
    pub label: String,
    pub image: Option<Arc<ImageData>>,
    /// Bumped every time the image is replaced
    pub version: u64,
}

/// Six-face cube texture slot, faces ordered +X, -X, +Y, -Y, +Z, -Z
#[derive(Debug, Clone)]
pub struct CubeTextureSlot {
    pub label: String,
    pub faces: Option<Arc<[Arc<ImageData>; 6]>>,
    pub version: u64,
}
