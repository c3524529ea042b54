//! Per-frame animation of the backdrop

pub mod driver;

pub use driver::{target_zoom, AnimationDriver, AnimationState, FrameReport, SceneHandles};
