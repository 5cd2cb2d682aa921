//! Sunroom
//!
//! A small decorative room rendered with wgpu: a textured vase with
//! sunflowers, a mirror reflecting the room through a cube capture, a
//! skybox behind a window, fog and a sprite butterfly. A Dear ImGui panel
//! edits grid display, vase placement and fog while the demo runs.

pub mod animation;
pub mod app;
pub mod assets;
pub mod config;
pub mod gfx;
pub mod params;
pub mod room;
pub mod state;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::{SetupError, SunroomApp};
pub use config::DemoConfig;
pub use state::SceneController;
