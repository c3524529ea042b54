//! # Animation Driver
//!
//! Advances the backdrop by one display frame. Given the frame delta, the
//! sampled scroll fraction and the active mode, it
//!
//! 1. smooths the displayed scroll value toward the sampled one,
//! 2. smooths the mode-blend scalar toward 0 (workplace) or 1 (building),
//! 3. accumulates idle spin, tapering to nothing as the visitor scrolls,
//! 4. smooths camera zoom toward a power-law curve of scroll,
//! 5. smooths the root pan toward the active mode's scroll mapping,
//! 6. sets the root yaw,
//! 7. cross-fades the two subtrees by uniform scale and hides the faded one,
//! 8. moves the subtrees apart vertically while they cross-fade.
//!
//! Every smoothed quantity uses exact exponential decay over the frame delta
//! (see [`utils::smoothing_factor`]), so motion looks the same at 30, 60 or
//! 144 Hz and never overshoots. Zoom can opt into the per-frame form through
//! [`ZoomPolicy::PerFrame`].

use crate::foundation::math::{utils, Vec2};
use crate::input::Mode;
use crate::render::camera::OrthographicCamera;
use crate::scene::{NodeId, SceneGraph};
use crate::settings::{
    ControllerConfig, PanConfig, RotationConfig, SmoothingConfig, TransitionConfig, ZoomConfig, ZoomPolicy,
};

/// Scene nodes the driver writes to every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneHandles {
    /// Shared root: panned and rotated
    pub root: NodeId,
    /// Workplace subtree: scaled by `1 - blend`
    pub workplace: NodeId,
    /// Building subtree: scaled by `blend`
    pub building: NodeId,
}

/// Mutable animation scalars for one mount
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    /// Displayed (smoothed) scroll fraction
    pub scroll: f32,
    /// Mode-blend scalar in `[0, 1]`
    pub blend: f32,
    /// Accumulated idle spin in radians
    pub auto_rotation: f32,
    /// Current camera zoom
    pub zoom: f32,
    /// Current root pan offset (x, y)
    pub pan: Vec2,
}

impl AnimationState {
    /// Values at mount time: top of the page, no spin, wide zoom, and the
    /// blend already settled on the initially selected mode
    pub fn initial(mode: Mode, zoom: &ZoomConfig) -> Self {
        Self {
            scroll: 0.0,
            blend: mode.blend_target(),
            auto_rotation: 0.0,
            zoom: zoom.wide,
            pan: Vec2::zeros(),
        }
    }

    fn is_finite(&self) -> bool {
        self.scroll.is_finite()
            && self.blend.is_finite()
            && self.auto_rotation.is_finite()
            && self.zoom.is_finite()
            && self.pan.iter().all(|v| v.is_finite())
    }
}

/// What one frame computed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Delta actually applied, in seconds
    pub delta: f32,
    /// Sampled scroll fraction after guarding
    pub scroll_target: f32,
    /// Smoothed scroll
    pub scroll: f32,
    /// Mode-blend scalar
    pub blend: f32,
    /// Idle spin added this frame
    pub spin_step: f32,
    /// Root yaw
    pub rotation: f32,
    /// Zoom target for this frame's scroll
    pub target_zoom: f32,
    /// Camera zoom after smoothing
    pub zoom: f32,
    /// Root pan offset
    pub pan: Vec2,
    /// Workplace subtree scale
    pub workplace_scale: f32,
    /// Building subtree scale
    pub building_scale: f32,
    /// Whether the workplace subtree is drawn
    pub workplace_visible: bool,
    /// Whether the building subtree is drawn
    pub building_visible: bool,
}

/// Per-frame animation of the backdrop scene
#[derive(Debug, Clone)]
pub struct AnimationDriver {
    smoothing: SmoothingConfig,
    zoom: ZoomConfig,
    rotation: RotationConfig,
    pan: PanConfig,
    transition: TransitionConfig,
    zoom_rate: f32,
    handles: SceneHandles,
    state: AnimationState,
    last_mode: Mode,
}

impl AnimationDriver {
    /// Create a driver for the given scene, starting settled on `mode`
    pub fn new(config: &ControllerConfig, handles: SceneHandles, mode: Mode) -> Self {
        Self {
            smoothing: config.smoothing.clone(),
            zoom: config.zoom.clone(),
            rotation: config.rotation.clone(),
            pan: config.pan.clone(),
            transition: config.transition.clone(),
            zoom_rate: config.zoom_rate(),
            handles,
            state: AnimationState::initial(mode, &config.zoom),
            last_mode: mode,
        }
    }

    /// Current animation scalars
    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    /// Nodes this driver animates
    pub fn handles(&self) -> SceneHandles {
        self.handles
    }

    /// Zoom the camera converges to at scroll fraction `scroll`
    pub fn target_zoom(&self, scroll: f32) -> f32 {
        target_zoom(&self.zoom, scroll)
    }

    /// Idle spin speed (rad/s) at scroll fraction `scroll`
    ///
    /// Full speed at the top of the page, falling linearly to zero at
    /// `taper_end`.
    pub fn spin_speed(&self, scroll: f32) -> f32 {
        spin_speed(&self.rotation, scroll)
    }

    /// Root pan offset the given mode maps `scroll` to
    pub fn pan_target(&self, mode: Mode, scroll: f32) -> Vec2 {
        pan_target(&self.pan, mode, scroll)
    }

    /// Advance one frame and write the result into `graph` and `camera`
    pub fn step(
        &mut self,
        delta: f32,
        scroll_target: f32,
        mode: Mode,
        graph: &mut SceneGraph,
        camera: &mut OrthographicCamera,
    ) -> FrameReport {
        let delta = utils::clamp(utils::finite_or(delta, 0.0), 0.0, self.smoothing.max_frame_delta);
        let scroll_target = utils::clamp(utils::finite_or(scroll_target, 0.0), 0.0, 1.0);

        if !self.state.is_finite() {
            log::warn!("Animation state became non-finite ({:?}); resetting", self.state);
            // Settle on the current selection so recovery does not replay a cross-fade
            self.state = AnimationState::initial(mode, &self.zoom);
        }
        if mode != self.last_mode {
            log::debug!("Mode transition {} -> {} at blend {:.3}", self.last_mode, mode, self.state.blend);
            self.last_mode = mode;
        }

        let state = &mut self.state;

        let factor = utils::smoothing_factor(self.smoothing.scroll_rate, delta);
        state.scroll = utils::clamp(utils::approach(state.scroll, scroll_target, factor), 0.0, 1.0);
        let scroll = state.scroll;

        let factor = utils::smoothing_factor(self.smoothing.mode_rate, delta);
        state.blend = utils::clamp(utils::approach(state.blend, mode.blend_target(), factor), 0.0, 1.0);
        let blend = state.blend;

        let spin_step = spin_speed(&self.rotation, scroll) * delta;
        state.auto_rotation += spin_step;

        let target_zoom = target_zoom(&self.zoom, scroll);
        let factor = match self.smoothing.zoom_policy {
            ZoomPolicy::TimeScaled => utils::smoothing_factor(self.zoom_rate, delta),
            ZoomPolicy::PerFrame => self.smoothing.zoom_lag_per_frame,
        };
        state.zoom = utils::approach(state.zoom, target_zoom, factor);
        camera.zoom = state.zoom;

        let pan_target = pan_target(&self.pan, mode, scroll);
        let factor = utils::smoothing_factor(self.smoothing.pan_rate, delta);
        state.pan += (pan_target - state.pan) * factor;

        let rotation = self.rotation.base_angle + state.auto_rotation + scroll * self.rotation.scroll_rotation;
        let pan = state.pan;
        let zoom = state.zoom;

        if let Some(root) = graph.node_mut(self.handles.root) {
            root.transform.position.x = pan.x;
            root.transform.position.y = pan.y;
            root.transform.rotation.y = rotation;
        }

        let workplace_scale = 1.0 - blend;
        let building_scale = blend;
        let epsilon = self.transition.visibility_epsilon;
        let separation = self.transition.separation;
        let workplace_visible = apply_subtree(graph, self.handles.workplace, workplace_scale, blend * separation, epsilon);
        let building_visible = apply_subtree(
            graph,
            self.handles.building,
            building_scale,
            -(1.0 - blend) * separation,
            epsilon,
        );

        let report = FrameReport {
            delta,
            scroll_target,
            scroll,
            blend,
            spin_step,
            rotation,
            target_zoom,
            zoom,
            pan,
            workplace_scale,
            building_scale,
            workplace_visible,
            building_visible,
        };
        log::trace!("{report:?}");
        report
    }
}

/// `lerp(wide, detailed, scroll ^ exponent)` with `scroll` clamped to `[0, 1]`
pub fn target_zoom(zoom: &ZoomConfig, scroll: f32) -> f32 {
    let scroll = utils::clamp(utils::finite_or(scroll, 0.0), 0.0, 1.0);
    utils::lerp(zoom.wide, zoom.detailed, scroll.powf(zoom.exponent))
}

fn spin_speed(rotation: &RotationConfig, scroll: f32) -> f32 {
    let taper = (1.0 - scroll / rotation.taper_end).max(0.0);
    rotation.auto_spin_speed * utils::finite_or(taper, 0.0)
}

fn pan_target(pan: &PanConfig, mode: Mode, scroll: f32) -> Vec2 {
    let target = match mode {
        Mode::Workplace => pan.workplace,
        Mode::Building => pan.building,
    };
    Vec2::new(target.x, target.y) * scroll
}

fn apply_subtree(graph: &mut SceneGraph, id: NodeId, scale: f32, height: f32, epsilon: f32) -> bool {
    let visible = scale > epsilon;
    if let Some(node) = graph.node_mut(id) {
        node.transform.set_uniform_scale(scale);
        node.transform.position.y = height;
        node.visible = visible;
    }
    visible
}
