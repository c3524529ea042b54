//! Backdrop demo application
//!
//! Mounts the scroll-reactive backdrop on the headless host and plays back a
//! scripted visitor session: idle at the top of the page, read down through
//! the workplace section, switch to the building view, rotate the device,
//! reach the footer, switch back and scroll home. A summary of the animation
//! is logged every half second of simulated time.
//!
//! ```text
//! backdrop_demo [settings.toml|settings.ron]
//! ```

use backdrop_engine::config::{Config, ConfigError};
use backdrop_engine::foundation::logging;
use backdrop_engine::foundation::time::Stopwatch;
use backdrop_engine::input::{Mode, ModeCell, Viewport};
use backdrop_engine::lifecycle::{HeadlessHost, LifecycleError, SceneController};
use backdrop_engine::settings::ControllerConfig;
use rand::Rng;
use thiserror::Error;

const FRAME_DELTA: f64 = 1.0 / 60.0;
const SUMMARY_INTERVAL: u64 = 30;
const DOCUMENT_HEIGHT: f64 = 5400.0;

#[derive(Error, Debug)]
enum DemoError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),
}

/// One step of the scripted session
#[derive(Debug, Clone, Copy)]
enum Action {
    /// Let the animation run with no input
    Idle { seconds: f64 },
    /// Scroll smoothly to a fraction of the page over `seconds`
    ScrollTo { fraction: f64, seconds: f64 },
    /// Flip the workplace/building selector
    ToggleMode,
    /// Resize the viewport
    Resize { width: u32, height: u32 },
}

const SESSION: &[Action] = &[
    Action::Idle { seconds: 2.0 },
    Action::ScrollTo { fraction: 0.35, seconds: 3.0 },
    Action::Idle { seconds: 1.0 },
    Action::ToggleMode,
    Action::Idle { seconds: 1.5 },
    Action::Resize { width: 820, height: 1180 },
    Action::ScrollTo { fraction: 1.0, seconds: 4.0 },
    Action::Idle { seconds: 1.0 },
    Action::ToggleMode,
    Action::Idle { seconds: 1.5 },
    Action::ScrollTo { fraction: 0.0, seconds: 2.5 },
    Action::Idle { seconds: 2.0 },
];

struct BackdropDemo {
    host: HeadlessHost,
    mode: ModeCell,
    controller: SceneController<HeadlessHost>,
    scroll: f64,
    frames: u64,
}

impl BackdropDemo {
    fn new(config: ControllerConfig) -> Result<Self, DemoError> {
        log::info!("Creating backdrop demo...");
        let mut host = HeadlessHost::new(Viewport::new(1440, 900), DOCUMENT_HEIGHT).with_pixel_ratio(2.0);
        let mode = ModeCell::new(Mode::Workplace);
        let controller = SceneController::mount(&mut host, config, mode.reader())?;

        if let Some(graph) = controller.graph() {
            let stats = graph.resources().stats();
            log::info!(
                "Scene ready: {} nodes, {} geometries, {} materials, {} lights",
                graph.node_count(),
                stats.live_geometries,
                stats.live_materials,
                graph.lights().len()
            );
        }

        Ok(Self {
            host,
            mode,
            controller,
            scroll: 0.0,
            frames: 0,
        })
    }

    fn frame(&mut self) {
        let Some(report) = self.host.pump_frame(&mut self.controller, FRAME_DELTA) else {
            return;
        };
        self.frames += 1;

        if self.frames % SUMMARY_INTERVAL == 0 {
            let draws = self.controller.backend().map_or(0, |b| b.last_stats().draw_calls);
            log::info!(
                "t={:5.2}s scroll {:.3} (sampled {:.3})  blend {:.3}  zoom {:.3}  yaw {:.3}  pan ({:+.2}, {:+.2})  draws {}",
                self.host.time(),
                report.scroll,
                report.scroll_target,
                report.blend,
                report.zoom,
                report.rotation,
                report.pan.x,
                report.pan.y,
                draws
            );
        }
    }

    fn perform(&mut self, action: Action, rng: &mut impl Rng) {
        log::debug!("Session step: {action:?}");
        match action {
            Action::Idle { seconds } => {
                for _ in 0..frame_count(seconds) {
                    self.frame();
                }
            }
            Action::ScrollTo { fraction, seconds } => {
                let start = self.scroll;
                let frames = frame_count(seconds).max(1);
                for i in 1..=frames {
                    let t = i as f64 / frames as f64;
                    // Wheel input arrives in uneven bursts
                    let jitter = if i < frames { rng.gen_range(-0.004..0.004) } else { 0.0 };
                    self.scroll = start + (fraction - start) * ease_in_out(t) + jitter;
                    self.host.scroll_to_fraction(self.scroll);
                    self.frame();
                }
                self.scroll = fraction;
            }
            Action::ToggleMode => {
                let next = self.mode.get().toggled();
                log::info!("Visitor selected {next}");
                self.mode.set(next);
            }
            Action::Resize { width, height } => {
                log::info!("Viewport resized to {width}x{height}");
                self.host.resize(width, height);
            }
        }
    }

    fn run(&mut self) {
        let mut rng = rand::thread_rng();
        for action in SESSION {
            self.perform(*action, &mut rng);
        }
    }

    fn shutdown(mut self) {
        self.controller.unmount(&mut self.host);
        if let Some(report) = self.controller.last_disposal() {
            log::info!(
                "Released {} nodes, {} geometries, {} materials",
                report.nodes,
                report.geometries,
                report.materials
            );
        }
        log::info!(
            "Host after unmount: {} listeners, {} pending frames, {} surfaces",
            self.host.listener_count(),
            self.host.pending_frame_count(),
            self.host.surface_count()
        );
    }
}

fn frame_count(seconds: f64) -> usize {
    (seconds / FRAME_DELTA).round().max(0.0) as usize
}

fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

fn load_config() -> Result<ControllerConfig, DemoError> {
    let config = match std::env::args().nth(1) {
        Some(path) => ControllerConfig::load_from_file(&path)?,
        None => ControllerConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load settings: {e}");
            std::process::exit(1);
        }
    };

    logging::init_with_level(&config.log_level);

    log::info!("Starting backdrop demo");
    let stopwatch = Stopwatch::start_new();

    let mut demo = match BackdropDemo::new(config) {
        Ok(demo) => demo,
        Err(e) => {
            log::error!("Failed to mount backdrop: {e}");
            std::process::exit(1);
        }
    };
    demo.run();
    let frames = demo.frames;
    let simulated = demo.host.time();
    demo.shutdown();

    log::info!(
        "Backdrop demo finished: {frames} frames, {simulated:.1}s simulated in {:.1} ms",
        stopwatch.elapsed_millis()
    );
}
