//! Per-frame motion: the butterfly's path and the mirror capture

pub mod butterfly;
pub mod mirror;

pub use butterfly::{ButterflyState, Pose, DEFAULT_SPEED, TURN_POINT};
pub use mirror::MirrorState;
