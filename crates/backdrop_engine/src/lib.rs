//! # Backdrop Engine
//!
//! A scroll-reactive 3D background for long-form pages. Two environments, an
//! office floor and a glass tower, share one scene graph; the page's scroll
//! position drives camera zoom, pan and rotation, and a page-owned mode
//! selection cross-fades between the two.
//!
//! ## Features
//!
//! - **Scene Builder**: primitive and composite generators over a shared
//!   material palette
//! - **Input Sampler**: normalised scroll fraction and viewport-derived frustum
//! - **Animation Driver**: frame-rate independent exponential smoothing of
//!   every animated quantity
//! - **Lifecycle**: mount, frame loop and idempotent teardown against any
//!   [`lifecycle::Host`]
//! - **Headless**: in-memory host and render backend for tests and tooling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use backdrop_engine::prelude::*;
//!
//! fn main() -> Result<(), LifecycleError> {
//!     let mut host = HeadlessHost::new(Viewport::new(1280, 720), 4000.0);
//!     let mode = ModeCell::new(Mode::Workplace);
//!     let mut controller = SceneController::mount(&mut host, ControllerConfig::default(), mode.reader())?;
//!
//!     host.scroll_to_fraction(0.5);
//!     mode.set(Mode::Building);
//!     host.run_for(&mut controller, 2.0, 1.0 / 60.0);
//!
//!     controller.unmount(&mut host);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod animation;
pub mod config;
pub mod foundation;
pub mod input;
pub mod lifecycle;
pub mod render;
pub mod scene;
pub mod settings;

#[cfg(test)]
mod controller_tests;

/// Common imports for embedding the backdrop
pub mod prelude {
    pub use crate::{
        animation::{AnimationDriver, AnimationState, FrameReport, SceneHandles},
        config::{Config, ConfigError},
        foundation::{
            math::{Mat4, Transform, Vec3},
            time::{FrameClock, Stopwatch},
        },
        input::{Mode, ModeCell, ModeReader, ScrollMetrics, Viewport},
        lifecycle::{FrameToken, HeadlessHost, Host, HostEvent, LifecycleError, SceneController, SurfaceStyle},
        render::{HeadlessBackend, OrthographicCamera, RenderBackend, RenderError},
        scene::{build_scene, BuiltScene, SceneGraph},
        settings::ControllerConfig,
    };
}
