//! Bind group layouts and uniform buffers shared by every scene pipeline
//!
//! | group | contents                                   | offset  |
//! |-------|--------------------------------------------|---------|
//! | 0     | [`FrameUniform`] (camera, lights, fog)      | dynamic |
//! | 1     | [`ObjectUniform`] (transform, material)     | dynamic |
//! | 2     | base colour texture + sampler              |         |
//! | 3     | environment cube texture + sampler         |         |

use crate::gfx::rendering::frame::{FrameUniform, ObjectUniform};
use crate::wgpu_utils::{
    binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc,
    DynamicUniformBuffer,
};

use super::TextureResource;

/// Main view plus the six capture faces
pub const FRAME_SLOTS: usize = 7;

const INITIAL_OBJECTS: usize = 256;

pub struct GlobalBindings {
    frame_layout: BindGroupLayoutWithDesc,
    object_layout: BindGroupLayoutWithDesc,
    texture_layout: BindGroupLayoutWithDesc,
    cube_layout: BindGroupLayoutWithDesc,
    pub frames: DynamicUniformBuffer<FrameUniform>,
    pub objects: DynamicUniformBuffer<ObjectUniform>,
    frame_group: wgpu::BindGroup,
    object_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let frame_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform_dynamic(
                std::mem::size_of::<FrameUniform>() as u64,
            ))
            .create(device, "Frame Bind Group Layout");
        let object_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform_dynamic(
                std::mem::size_of::<ObjectUniform>() as u64,
            ))
            .create(device, "Object Bind Group Layout");
        let texture_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Texture Bind Group Layout");
        let cube_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_cube())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Cube Bind Group Layout");

        let frames = DynamicUniformBuffer::new(device, FRAME_SLOTS);
        let objects = DynamicUniformBuffer::new(device, INITIAL_OBJECTS);

        let frame_group = BindGroupBuilder::new(&frame_layout)
            .resource(frames.binding_resource())
            .create(device, "Frame Bind Group");
        let object_group = BindGroupBuilder::new(&object_layout)
            .resource(objects.binding_resource())
            .create(device, "Object Bind Group");

        Self {
            frame_layout,
            object_layout,
            texture_layout,
            cube_layout,
            frames,
            objects,
            frame_group,
            object_group,
        }
    }

    /// Layouts in group order, for pipeline creation
    pub fn bind_group_layouts(&self) -> Vec<wgpu::BindGroupLayout> {
        vec![
            self.frame_layout.layout.clone(),
            self.object_layout.layout.clone(),
            self.texture_layout.layout.clone(),
            self.cube_layout.layout.clone(),
        ]
    }

    pub fn write_frame(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, slot: usize, frame: FrameUniform) {
        if self.frames.write(device, queue, slot, &[frame]) {
            self.frame_group = BindGroupBuilder::new(&self.frame_layout)
                .resource(self.frames.binding_resource())
                .create(device, "Frame Bind Group");
        }
    }

    pub fn write_objects(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        first: usize,
        objects: &[ObjectUniform],
    ) {
        if self.objects.write(device, queue, first, objects) {
            log::debug!("Object uniforms grown to {} slots", self.objects.capacity());
            self.object_group = BindGroupBuilder::new(&self.object_layout)
                .resource(self.objects.binding_resource())
                .create(device, "Object Bind Group");
        }
    }

    pub fn frame_group(&self) -> &wgpu::BindGroup {
        &self.frame_group
    }

    pub fn object_group(&self) -> &wgpu::BindGroup {
        &self.object_group
    }

    pub fn texture_group(&self, device: &wgpu::Device, texture: &TextureResource, label: &str) -> wgpu::BindGroup {
        BindGroupBuilder::new(&self.texture_layout)
            .texture(&texture.view)
            .sampler(&texture.sampler)
            .create(device, label)
    }

    pub fn cube_group(&self, device: &wgpu::Device, cube: &TextureResource, label: &str) -> wgpu::BindGroup {
        BindGroupBuilder::new(&self.cube_layout)
            .texture(&cube.view)
            .sampler(&cube.sampler)
            .create(device, label)
    }
}
