//! Uploaded meshes and the render pass helpers that draw them

use wgpu::util::DeviceExt;
use wgpu::*;

use crate::gfx::geometry::GeometryData;

/// Vertex and index buffers of one geometry
pub struct GpuMesh {
    pub vertex_buffer: Buffer,
    pub index_buffer: Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &Device, geometry: &GeometryData, label: &str) -> Self {
        let vertices = geometry.to_vertices();
        let vertex_buffer = device.create_buffer_init(&util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(&vertices),
            usage: BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
        }
    }
}

/// Extension trait for RenderPass to draw uploaded meshes
pub trait RenderPassExt {
    fn draw_mesh(&mut self, mesh: &GpuMesh);
}

impl RenderPassExt for RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &GpuMesh) {
        if mesh.index_count == 0 {
            return;
        }
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}
