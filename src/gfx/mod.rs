//! # Graphics Module
//!
//! Everything between the scene description and the pixels.
//!
//! - **Camera System** ([`camera`]) - damped orbit camera and its controls
//! - **Geometry** ([`geometry`]) - generated primitives
//! - **Scene Graph** ([`scene`]) - nodes, materials, lights and texture slots
//! - **Rendering** ([`rendering`]) - frame planning, the wgpu engine and the
//!   mirror's cube capture
//! - **Resources** ([`resources`]) - GPU textures, uniform buffers and bind groups

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
