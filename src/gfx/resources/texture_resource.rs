//! Texture resource management for wgpu
//!
//! Depth buffers, 2D textures decoded from images, cube textures for the
//! skybox, and the render-to-cube target the mirror reflects.

use std::borrow::Cow;
use std::sync::Arc;

use crate::gfx::scene::ImageData;

/// Colour format of every sampled texture and of the mirror capture
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// GPU texture resource containing texture, view, and sampler
#[derive(Clone)]
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

fn linear_sampler(device: &wgpu::Device, label: &str, address_mode: wgpu::AddressMode) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

fn write_layer(queue: &wgpu::Queue, texture: &wgpu::Texture, layer: u32, size: u32, height: u32, rgba: &[u8]) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * size),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width: size,
            height,
            depth_or_array_layers: 1,
        },
    );
}

/// Face pixels at `size` x `size`, resampled when the face differs
fn square_face(face: &ImageData, size: u32) -> Cow<'_, [u8]> {
    if face.width == size && face.height == size {
        return Cow::Borrowed(&face.rgba);
    }
    match image::RgbaImage::from_raw(face.width, face.height, face.rgba.clone()) {
        Some(buffer) => Cow::Owned(
            image::imageops::resize(&buffer, size, size, image::imageops::FilterType::Triangle)
                .into_raw(),
        ),
        None => Cow::Owned(vec![0; (size * size * 4) as usize]),
    }
}

impl TextureResource {
    /// Standard depth buffer format used throughout the engine
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = linear_sampler(device, label, wgpu::AddressMode::ClampToEdge);

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Uploads a decoded image as a repeating 2D texture
    pub fn from_image(device: &wgpu::Device, queue: &wgpu::Queue, image: &ImageData, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width.max(1),
                height: image.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        if image.byte_len() == (image.width * image.height * 4) as usize && image.width > 0 {
            write_layer(queue, &texture, 0, image.width, image.height, &image.rgba);
        } else {
            log::warn!("Texture {label} has inconsistent pixel data, leaving it blank");
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = linear_sampler(device, label, wgpu::AddressMode::Repeat);
        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Uploads six faces as a cube texture, sized after the first face
    pub fn cube_from_images(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[Arc<ImageData>; 6],
        label: &str,
    ) -> Self {
        let size = faces[0].width.max(faces[0].height).max(1);
        let resource = Self::empty_cube(device, size, label, wgpu::TextureUsages::COPY_DST);
        for (layer, face) in faces.iter().enumerate() {
            let pixels = square_face(face, size);
            write_layer(queue, &resource.texture, layer as u32, size, size, &pixels);
        }
        resource
    }

    /// 1x1 cube of a single colour, bound wherever no real cube is needed
    pub fn solid_cube(device: &wgpu::Device, queue: &wgpu::Queue, color: [u8; 4], label: &str) -> Self {
        let face = Arc::new(ImageData::solid(1, 1, color));
        Self::cube_from_images(device, queue, &std::array::from_fn(|_| face.clone()), label)
    }

    fn empty_cube(device: &wgpu::Device, size: u32, label: &str, usage: wgpu::TextureUsages) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            array_layer_count: Some(6),
            ..Default::default()
        });
        let sampler = linear_sampler(device, label, wgpu::AddressMode::ClampToEdge);
        Self {
            texture,
            view,
            sampler,
        }
    }
}

/// Cube texture the scene is rendered into, one face at a time
pub struct CubeRenderTarget {
    pub cube: TextureResource,
    pub faces: [wgpu::TextureView; 6],
    pub depth: TextureResource,
    pub resolution: u32,
}

impl CubeRenderTarget {
    pub fn new(device: &wgpu::Device, resolution: u32) -> Self {
        let resolution = resolution.max(1);
        let cube = TextureResource::empty_cube(
            device,
            resolution,
            "Mirror Capture",
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        let faces = std::array::from_fn(|layer| {
            cube.texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("Mirror Capture Face"),
                dimension: Some(wgpu::TextureViewDimension::D2),
                base_array_layer: layer as u32,
                array_layer_count: Some(1),
                ..Default::default()
            })
        });
        let depth = TextureResource::create_depth_texture(device, resolution, resolution, "Mirror Capture Depth");

        Self {
            cube,
            faces,
            depth,
            resolution,
        }
    }
}
