//! # Scene Controller
//!
//! Owns one mount of the backdrop: the graphics context, the scene graph,
//! the camera, the input sampler and the animation driver, plus the host
//! registrations (surface, listeners, pending frame) that tie them to the
//! page.
//!
//! ```text
//!   host scroll/resize ──► handle_event ──► InputSampler ──► ScrollWriter
//!                                                                │
//!   host frame ─────────► on_frame ◄── ScrollReader ◄────────────┘
//!                            │    ◄── ModeReader (page-owned mode)
//!                            ▼
//!                    AnimationDriver ──► SceneGraph / camera ──► backend
//! ```
//!
//! Teardown happens in [`SceneController::unmount`] and is idempotent.
//! Frames and events that arrive after teardown are ignored.

use thiserror::Error;

use super::host::{FrameToken, Host, HostEvent, ListenerId, SurfaceId, SurfaceStyle};
use crate::animation::{AnimationDriver, AnimationState, FrameReport, SceneHandles};
use crate::config::ConfigError;
use crate::foundation::time::FrameClock;
use crate::input::{InputSampler, ModeReader, ScrollReader};
use crate::render::backend::{RenderBackend, RenderError};
use crate::render::camera::OrthographicCamera;
use crate::scene::{build_scene, DisposalReport, SceneGraph};
use crate::settings::ControllerConfig;

/// Mount and remount failures
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// `remount` was called on a controller that is still mounted
    #[error("Scene controller is already mounted")]
    AlreadyMounted,

    /// The host could not provide a graphics context
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// The supplied configuration is invalid
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Per-mount state that only exists while mounted
struct Live<B> {
    backend: B,
    graph: SceneGraph,
    camera: OrthographicCamera,
    sampler: InputSampler,
    scroll: ScrollReader,
    driver: AnimationDriver,
    clock: FrameClock,
    frames_rendered: u64,
    render_failed: bool,
    last_report: Option<FrameReport>,
}

/// Scroll-reactive backdrop controller
pub struct SceneController<H: Host> {
    config: ControllerConfig,
    mode: ModeReader,
    live: Option<Live<H::Backend>>,
    surface: Option<SurfaceId>,
    listeners: Vec<ListenerId>,
    frame: Option<FrameToken>,
    last_disposal: Option<DisposalReport>,
    mounts: u32,
}

impl<H: Host> SceneController<H> {
    /// Mount a controller into `host`
    ///
    /// Validates `config`, creates the graphics context, builds the scene,
    /// attaches the output surface, subscribes to scroll and resize events
    /// and schedules the first frame.
    ///
    /// # Errors
    /// `LifecycleError::Config` for invalid settings and
    /// `LifecycleError::Render` when no graphics context is available. Nothing
    /// is registered with the host in either case.
    pub fn mount(host: &mut H, config: ControllerConfig, mode: ModeReader) -> Result<Self, LifecycleError> {
        let mut controller = Self {
            config,
            mode,
            live: None,
            surface: None,
            listeners: Vec::new(),
            frame: None,
            last_disposal: None,
            mounts: 0,
        };
        controller.remount(host)?;
        Ok(controller)
    }

    /// Mount again after [`unmount`](Self::unmount), starting from fresh
    /// scene and animation state
    ///
    /// # Errors
    /// `LifecycleError::AlreadyMounted` if the controller is still mounted,
    /// otherwise as for [`mount`](Self::mount).
    pub fn remount(&mut self, host: &mut H) -> Result<(), LifecycleError> {
        if self.is_mounted() {
            return Err(LifecycleError::AlreadyMounted);
        }
        self.config.validate()?;

        let mut backend = host.create_backend(&self.config.renderer)?;
        let viewport = host.viewport();
        let pixel_ratio = host.device_pixel_ratio().min(self.config.renderer.max_pixel_ratio);
        backend.set_pixel_ratio(pixel_ratio);
        if let Err(err) = backend.set_size(viewport.width, viewport.height) {
            log::warn!("Initial surface size rejected: {err}");
        }

        let built = build_scene(&self.config.renderer);
        let handles = SceneHandles {
            root: built.root,
            workplace: built.workplace,
            building: built.building,
        };

        let (sampler, scroll) = InputSampler::new(
            self.config.camera.frustum_half_height,
            viewport,
            host.scroll_metrics(),
        );
        let mode = self.mode.get();
        let driver = AnimationDriver::new(&self.config, handles, mode);
        let camera = OrthographicCamera::from_config(&self.config.camera, viewport.aspect(), driver.state().zoom);

        self.live = Some(Live {
            backend,
            graph: built.graph,
            camera,
            sampler,
            scroll,
            driver,
            clock: FrameClock::new(self.config.smoothing.max_frame_delta),
            frames_rendered: 0,
            render_failed: false,
            last_report: None,
        });

        self.surface = Some(host.attach_surface(&SurfaceStyle::from(&self.config.surface)));
        self.listeners.push(host.subscribe(HostEvent::Scroll));
        self.listeners.push(host.subscribe(HostEvent::Resize));
        self.frame = Some(host.request_frame());
        self.mounts += 1;

        log::info!(
            "Scene controller mounted ({}x{} @ {:.2}x, mode {})",
            viewport.width,
            viewport.height,
            pixel_ratio,
            mode
        );
        Ok(())
    }

    /// Deliver a host event
    ///
    /// Events arriving after unmount are ignored.
    pub fn handle_event(&mut self, host: &mut H, event: HostEvent) {
        let Some(live) = self.live.as_mut() else {
            log::trace!("Ignoring {event:?} on unmounted controller");
            return;
        };

        match event {
            HostEvent::Scroll => {
                let fraction = live.sampler.on_scroll(host.scroll_metrics());
                log::trace!("Scroll fraction {fraction:.4}");
            }
            HostEvent::Resize => {
                let viewport = host.viewport();
                let bounds = live.sampler.on_resize(viewport, host.scroll_metrics());
                live.camera.set_bounds(bounds);
                live.backend
                    .set_pixel_ratio(host.device_pixel_ratio().min(self.config.renderer.max_pixel_ratio));
                match live.backend.set_size(viewport.width, viewport.height) {
                    Ok(()) => log::info!("Backdrop resized to {}x{}", viewport.width, viewport.height),
                    Err(err) => log::warn!("Resize to {}x{} rejected: {err}", viewport.width, viewport.height),
                }
            }
        }
    }

    /// Run one frame callback
    ///
    /// `token` must be the frame this controller last requested; anything
    /// else (a frame cancelled by unmount, a duplicate delivery) is ignored
    /// and returns `None`. After a successful render the next frame is
    /// requested. A render failure is logged once and stops the loop, leaving
    /// the last drawn frame in place.
    pub fn on_frame(&mut self, host: &mut H, token: FrameToken, timestamp: f64) -> Option<FrameReport> {
        if self.frame != Some(token) {
            log::trace!("Ignoring stale frame {token:?}");
            return None;
        }
        self.frame = None;
        let live = self.live.as_mut()?;

        let delta = live.clock.tick(timestamp);
        let report = live
            .driver
            .step(delta, live.scroll.get(), self.mode.get(), &mut live.graph, &mut live.camera);
        live.last_report = Some(report);

        match live.backend.render(&live.graph, &live.camera) {
            Ok(_) => {
                live.frames_rendered += 1;
                self.frame = Some(host.request_frame());
            }
            Err(err) => {
                if !live.render_failed {
                    live.render_failed = true;
                    log::warn!("Backdrop render failed, leaving background static: {err}");
                }
            }
        }

        Some(report)
    }

    /// Tear down this mount
    ///
    /// Cancels the pending frame, removes listeners, disposes the graphics
    /// context and every scene resource, then detaches the surface. Safe to
    /// call any number of times.
    pub fn unmount(&mut self, host: &mut H) {
        if !self.is_mounted() {
            log::debug!("Unmount on an unmounted controller ignored");
            return;
        }

        if let Some(token) = self.frame.take() {
            host.cancel_frame(token);
        }
        for listener in self.listeners.drain(..) {
            host.unsubscribe(listener);
        }
        if let Some(mut live) = self.live.take() {
            live.backend.dispose();
            let report = live.graph.dispose();
            log::debug!(
                "Disposed {} nodes, {} geometries, {} materials after {} frames",
                report.nodes,
                report.geometries,
                report.materials,
                live.frames_rendered
            );
            self.last_disposal = Some(report);
        }
        if let Some(surface) = self.surface.take() {
            host.detach_surface(surface);
        }

        log::info!("Scene controller unmounted");
    }

    /// Whether anything is still registered with the host
    pub fn is_mounted(&self) -> bool {
        self.live.is_some() || self.surface.is_some() || self.frame.is_some() || !self.listeners.is_empty()
    }

    /// Settings this controller was mounted with
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Frame callback currently scheduled
    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.frame
    }

    /// Animation scalars of the current mount
    pub fn animation(&self) -> Option<&AnimationState> {
        self.live.as_ref().map(|live| live.driver.state())
    }

    /// Nodes animated by the current mount
    pub fn handles(&self) -> Option<SceneHandles> {
        self.live.as_ref().map(|live| live.driver.handles())
    }

    /// Scene graph of the current mount
    pub fn graph(&self) -> Option<&SceneGraph> {
        self.live.as_ref().map(|live| &live.graph)
    }

    /// Camera of the current mount
    pub fn camera(&self) -> Option<&OrthographicCamera> {
        self.live.as_ref().map(|live| &live.camera)
    }

    /// Graphics context of the current mount
    pub fn backend(&self) -> Option<&H::Backend> {
        self.live.as_ref().map(|live| &live.backend)
    }

    /// Mutable graphics context of the current mount
    pub fn backend_mut(&mut self) -> Option<&mut H::Backend> {
        self.live.as_mut().map(|live| &mut live.backend)
    }

    /// Scroll fraction last published by the sampler
    pub fn scroll_fraction(&self) -> Option<f32> {
        self.live.as_ref().map(|live| live.sampler.fraction())
    }

    /// Result of the most recent frame
    pub fn last_report(&self) -> Option<FrameReport> {
        self.live.as_ref().and_then(|live| live.last_report)
    }

    /// Frames successfully rendered by the current mount
    pub fn frames_rendered(&self) -> u64 {
        self.live.as_ref().map_or(0, |live| live.frames_rendered)
    }

    /// What the most recent unmount released
    pub fn last_disposal(&self) -> Option<DisposalReport> {
        self.last_disposal
    }

    /// How many times this controller has been mounted
    pub fn mount_count(&self) -> u32 {
        self.mounts
    }
}

impl<H: Host> Drop for SceneController<H> {
    fn drop(&mut self) {
        if self.is_mounted() {
            log::warn!("Scene controller dropped while mounted; host registrations leak until the page unloads");
        }
    }
}
