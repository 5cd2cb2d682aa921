//! # Primitive Shape Generation
//!
//! Boxes, frustums, planes, grids and quads. All shapes carry normals and
//! texture coordinates.

use super::GeometryData;
use std::f32::consts::PI;

/// Generate a unit cube centered at the origin
///
/// Returns a cube with vertices from -0.5 to 0.5 on all axes.
/// Each face has its own four vertices so normals stay flat.
pub fn generate_cube() -> GeometryData {
    let mut data = GeometryData::new();

    #[rustfmt::skip]
    let positions = [
        // Front face (+Z)
        [-0.5, -0.5,  0.5], [ 0.5, -0.5,  0.5], [ 0.5,  0.5,  0.5], [-0.5,  0.5,  0.5],
        // Back face (-Z)
        [ 0.5, -0.5, -0.5], [-0.5, -0.5, -0.5], [-0.5,  0.5, -0.5], [ 0.5,  0.5, -0.5],
        // Left face (-X)
        [-0.5, -0.5, -0.5], [-0.5, -0.5,  0.5], [-0.5,  0.5,  0.5], [-0.5,  0.5, -0.5],
        // Right face (+X)
        [ 0.5, -0.5,  0.5], [ 0.5, -0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5,  0.5,  0.5],
        // Top face (+Y)
        [-0.5,  0.5,  0.5], [ 0.5,  0.5,  0.5], [ 0.5,  0.5, -0.5], [-0.5,  0.5, -0.5],
        // Bottom face (-Y)
        [-0.5, -0.5, -0.5], [ 0.5, -0.5, -0.5], [ 0.5, -0.5,  0.5], [-0.5, -0.5,  0.5],
    ];

    let face_normals = [
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
        [-1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
    ];

    data.vertices = positions.to_vec();
    for normal in face_normals {
        for tex_coord in [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]] {
            data.normals.push(normal);
            data.tex_coords.push(tex_coord);
        }
    }

    for face in 0..6u32 {
        let base = face * 4;
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    data
}

/// Generate an axis-aligned box centered at the origin
///
/// # Arguments
/// * `width` - Extent along X
/// * `height` - Extent along Y
/// * `depth` - Extent along Z
pub fn generate_box(width: f32, height: f32, depth: f32) -> GeometryData {
    let mut data = generate_cube();
    for vertex in &mut data.vertices {
        vertex[0] *= width;
        vertex[1] *= height;
        vertex[2] *= depth;
    }
    data
}

/// Generate a closed frustum (truncated cone) along the Y axis
///
/// # Arguments
/// * `radius_top` - Radius of the cap at `+height/2`
/// * `radius_bottom` - Radius of the cap at `-height/2`
/// * `height` - Total height
/// * `segments` - Number of radial segments
///
/// A radius of zero on either end produces a cone without that cap.
pub fn generate_frustum(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    segments: u32,
) -> GeometryData {
    let mut data = GeometryData::new();

    let segs = segments.max(3);
    let half_height = height * 0.5;
    let slope = if height.abs() > f32::EPSILON {
        (radius_bottom - radius_top) / height
    } else {
        0.0
    };

    // Side vertices, bottom/top pairs
    for i in 0..=segs {
        let u = i as f32 / segs as f32;
        let theta = u * 2.0 * PI;
        let (sin_t, cos_t) = theta.sin_cos();

        let normal_len = (1.0 + slope * slope).sqrt();
        let normal = [sin_t / normal_len, slope / normal_len, cos_t / normal_len];

        data.vertices
            .push([radius_bottom * sin_t, -half_height, radius_bottom * cos_t]);
        data.normals.push(normal);
        data.tex_coords.push([u, 1.0]);

        data.vertices
            .push([radius_top * sin_t, half_height, radius_top * cos_t]);
        data.normals.push(normal);
        data.tex_coords.push([u, 0.0]);
    }

    for i in 0..segs {
        let bottom = i * 2;
        let top = bottom + 1;
        let next_bottom = bottom + 2;
        let next_top = bottom + 3;

        data.indices
            .extend_from_slice(&[bottom, next_bottom, next_top, next_top, top, bottom]);
    }

    if radius_top > 0.0 {
        push_cap(&mut data, radius_top, half_height, segs, true);
    }
    if radius_bottom > 0.0 {
        push_cap(&mut data, radius_bottom, -half_height, segs, false);
    }

    data
}

fn push_cap(data: &mut GeometryData, radius: f32, y: f32, segs: u32, top: bool) {
    let normal = if top { [0.0, 1.0, 0.0] } else { [0.0, -1.0, 0.0] };

    let center = data.vertices.len() as u32;
    data.vertices.push([0.0, y, 0.0]);
    data.normals.push(normal);
    data.tex_coords.push([0.5, 0.5]);

    let rim_start = data.vertices.len() as u32;
    for i in 0..=segs {
        let theta = i as f32 / segs as f32 * 2.0 * PI;
        let (sin_t, cos_t) = theta.sin_cos();
        data.vertices.push([radius * sin_t, y, radius * cos_t]);
        data.normals.push(normal);
        data.tex_coords.push([0.5 + 0.5 * sin_t, 0.5 + 0.5 * cos_t]);
    }

    for i in 0..segs {
        let current = rim_start + i;
        let next = current + 1;
        if top {
            data.indices.extend_from_slice(&[center, current, next]);
        } else {
            data.indices.extend_from_slice(&[center, next, current]);
        }
    }
}

/// Generate a flat plane in the XZ plane with its normal along +Y
///
/// # Arguments
/// * `width` - Extent along X
/// * `depth` - Extent along Z
/// * `width_segments` - Number of subdivisions along X
/// * `depth_segments` - Number of subdivisions along Z
pub fn generate_plane(
    width: f32,
    depth: f32,
    width_segments: u32,
    depth_segments: u32,
) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(1);
    let d_segs = depth_segments.max(1);

    for z in 0..=d_segs {
        let v = z as f32 / d_segs as f32;
        for x in 0..=w_segs {
            let u = x as f32 / w_segs as f32;
            data.vertices
                .push([(u - 0.5) * width, 0.0, (v - 0.5) * depth]);
            data.normals.push([0.0, 1.0, 0.0]);
            data.tex_coords.push([u, v]);
        }
    }

    for z in 0..d_segs {
        for x in 0..w_segs {
            let i = z * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;

            data.indices.extend_from_slice(&[i, next_row, i + 1]);
            data.indices
                .extend_from_slice(&[next_row, next_row + 1, i + 1]);
        }
    }

    data
}

/// Generate a unit quad in the XY plane facing +Z, used for sprites
pub fn generate_quad() -> GeometryData {
    GeometryData {
        vertices: vec![
            [-0.5, -0.5, 0.0],
            [0.5, -0.5, 0.0],
            [0.5, 0.5, 0.0],
            [-0.5, 0.5, 0.0],
        ],
        normals: vec![[0.0, 0.0, 1.0]; 4],
        tex_coords: vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
        indices: vec![0, 1, 2, 2, 3, 0],
    }
}

/// Plane a helper grid lies in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridPlane {
    /// Horizontal grid (the floor plane)
    XZ,
    /// Vertical grid facing X
    YZ,
    /// Vertical grid facing Z
    XY,
}

impl GridPlane {
    fn place(self, u: f32, v: f32) -> [f32; 3] {
        match self {
            GridPlane::XZ => [u, 0.0, v],
            GridPlane::YZ => [0.0, u, v],
            GridPlane::XY => [u, v, 0.0],
        }
    }

    fn normal(self) -> [f32; 3] {
        match self {
            GridPlane::XZ => [0.0, 1.0, 0.0],
            GridPlane::YZ => [1.0, 0.0, 0.0],
            GridPlane::XY => [0.0, 0.0, 1.0],
        }
    }
}

/// Generate a line grid as thin quads lying in `plane`
///
/// # Arguments
/// * `size` - Total extent of the grid on both in-plane axes
/// * `divisions` - Number of cells per side; `divisions + 1` lines per axis
/// * `line_width` - Width of each line quad
pub fn generate_grid(size: f32, divisions: u32, line_width: f32, plane: GridPlane) -> GeometryData {
    let mut data = GeometryData::new();

    let divisions = divisions.max(1);
    let half = size * 0.5;
    let half_line = line_width * 0.5;
    let step = size / divisions as f32;
    let normal = plane.normal();

    let mut push_quad = |corners: [(f32, f32); 4]| {
        let base = data.vertices.len() as u32;
        for (i, (u, v)) in corners.into_iter().enumerate() {
            data.vertices.push(plane.place(u, v));
            data.normals.push(normal);
            data.tex_coords.push([(i % 2) as f32, (i / 2) as f32]);
        }
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    };

    for i in 0..=divisions {
        let offset = -half + i as f32 * step;

        // Line running along the first in-plane axis
        push_quad([
            (-half, offset - half_line),
            (half, offset - half_line),
            (half, offset + half_line),
            (-half, offset + half_line),
        ]);

        // Line running along the second in-plane axis
        push_quad([
            (offset - half_line, -half),
            (offset + half_line, -half),
            (offset + half_line, half),
            (offset - half_line, half),
        ]);
    }

    data
}
