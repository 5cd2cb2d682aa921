//! # Procedural Geometry Generation
//!
//! Procedural primitives for everything in the room that is not loaded from an
//! OBJ file: wall boxes, the vase frustums, helper grids and axes, and the
//! sprite quad.
//!
//! All generators use a Y-up, right-handed frame with counter-clockwise
//! winding, matching the rest of the scene graph.
//!
//! ## Usage
//!
//! ```rust
//! use sunroom::gfx::geometry::{generate_box, generate_frustum};
//!
//! // A 10 x 181 x 350 wall slab centred on the origin
//! let wall = generate_box(10.0, 181.0, 350.0);
//!
//! // The lower half of the vase: wide on top, narrow at the bottom
//! let lower = generate_frustum(20.0, 10.0, 20.0, 18);
//! ```

pub mod primitives;

pub use primitives::*;

/// Generated (or loaded) triangle geometry ready for GPU upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    /// Create a new empty geometry data structure
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of vertices in this geometry
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles in this geometry
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Appends another geometry, re-basing its indices
    pub fn append(&mut self, other: &GeometryData) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.normals.extend_from_slice(&other.normals);
        self.tex_coords.extend_from_slice(&other.tex_coords);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Recomputes smooth vertex normals from the triangle list.
    ///
    /// Face normals are accumulated unnormalised, so larger triangles weigh
    /// more, then each vertex normal is normalised. Vertices referenced by no
    /// triangle get an up-facing normal.
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![[0.0f32; 3]; self.vertices.len()];

        for triangle in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            );
            let (Some(v0), Some(v1), Some(v2)) = (
                self.vertices.get(i0),
                self.vertices.get(i1),
                self.vertices.get(i2),
            ) else {
                continue;
            };

            let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
            let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
            let face_normal = [
                edge1[1] * edge2[2] - edge1[2] * edge2[1],
                edge1[2] * edge2[0] - edge1[0] * edge2[2],
                edge1[0] * edge2[1] - edge1[1] * edge2[0],
            ];

            for &index in &[i0, i1, i2] {
                normals[index][0] += face_normal[0];
                normals[index][1] += face_normal[1];
                normals[index][2] += face_normal[2];
            }
        }

        for normal in &mut normals {
            let length = (normal[0].powi(2) + normal[1].powi(2) + normal[2].powi(2)).sqrt();
            if length > f32::EPSILON {
                normal[0] /= length;
                normal[1] /= length;
                normal[2] /= length;
            } else {
                *normal = [0.0, 1.0, 0.0];
            }
        }

        self.normals = normals;
    }

    /// Convert to the interleaved vertex format used by the renderer
    pub fn to_vertices(&self) -> Vec<crate::gfx::scene::vertex::Vertex3D> {
        use crate::gfx::scene::vertex::Vertex3D;

        (0..self.vertices.len())
            .map(|i| Vertex3D {
                position: self.vertices[i],
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                tex_coord: self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_vertex_normals_flat_triangle() {
        let mut data = GeometryData {
            vertices: vec![[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]],
            indices: vec![0, 1, 2],
            ..Default::default()
        };
        data.compute_vertex_normals();

        for normal in &data.normals {
            assert!((normal[1] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_unreferenced_vertex_gets_up_normal() {
        let mut data = GeometryData {
            vertices: vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [5.0, 5.0, 5.0]],
            indices: vec![0, 1, 2],
            ..Default::default()
        };
        data.compute_vertex_normals();
        assert_eq!(data.normals.len(), 4);
        assert_eq!(data.normals[3], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_append_rebases_indices() {
        let mut a = generate_quad();
        let b = generate_quad();
        a.append(&b);
        assert_eq!(a.vertex_count(), 8);
        assert_eq!(a.indices[6..], [4, 5, 6, 6, 7, 4]);
    }
}
