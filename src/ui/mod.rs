//! # User Interface Module
//!
//! Dear ImGui tweak panel for the room.
//!
//! [`UiManager`] owns the ImGui context and draws it with wgpu on top of
//! the finished frame; [`parameter_panel`] lays out the widgets and writes
//! into the staging [`ParameterPanel`](crate::params::ParameterPanel).
//!
//! ## Input Handling
//!
//! Window events go to the UI first. While the panel wants the mouse or
//! keyboard, the orbit camera receives nothing.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::UiManager;
pub use panel::parameter_panel;
