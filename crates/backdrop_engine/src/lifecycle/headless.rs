//! In-memory host
//!
//! A scrollable document with a viewport, a frame scheduler driven by a
//! simulated clock and bookkeeping of every registration the controller
//! makes. Events are queued when the document changes and delivered by
//! [`HeadlessHost::dispatch`]; frames are delivered by
//! [`HeadlessHost::pump_frame`].

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::controller::SceneController;
use super::host::{FrameToken, Host, HostEvent, ListenerId, SurfaceId, SurfaceStyle};
use crate::animation::FrameReport;
use crate::input::{ScrollMetrics, Viewport};
use crate::render::backend::{HeadlessBackend, RenderError};
use crate::settings::RendererConfig;

/// Host backed by plain data
#[derive(Debug)]
pub struct HeadlessHost {
    viewport: Viewport,
    document_height: f64,
    scroll_offset: f64,
    pixel_ratio: f32,
    time: f64,
    next_id: u64,
    listeners: BTreeMap<ListenerId, HostEvent>,
    pending_frames: BTreeSet<FrameToken>,
    surfaces: BTreeMap<SurfaceId, SurfaceStyle>,
    queued: VecDeque<HostEvent>,
    context_failure: Option<String>,
    contexts_created: u32,
}

impl HeadlessHost {
    /// Create a host with the given viewport and total document height
    pub fn new(viewport: Viewport, document_height: f64) -> Self {
        Self {
            viewport,
            document_height,
            scroll_offset: 0.0,
            pixel_ratio: 1.0,
            time: 0.0,
            next_id: 1,
            listeners: BTreeMap::new(),
            pending_frames: BTreeSet::new(),
            surfaces: BTreeMap::new(),
            queued: VecDeque::new(),
            context_failure: None,
            contexts_created: 0,
        }
    }

    /// Set the device pixel ratio
    pub fn with_pixel_ratio(mut self, ratio: f32) -> Self {
        self.pixel_ratio = ratio;
        self
    }

    /// Make every later context creation fail with `reason`
    pub fn fail_context_creation(&mut self, reason: impl Into<String>) {
        self.context_failure = Some(reason.into());
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn notify(&mut self, event: HostEvent) {
        if self.listeners.values().any(|kind| *kind == event) {
            self.queued.push_back(event);
        }
    }

    /// Scroll the document to `offset`. Offsets are not clamped, so
    /// overscroll can be simulated.
    pub fn scroll_to(&mut self, offset: f64) {
        self.scroll_offset = offset;
        self.notify(HostEvent::Scroll);
    }

    /// Scroll so that the normalised fraction is `fraction`
    pub fn scroll_to_fraction(&mut self, fraction: f64) {
        let scrollable = (self.document_height - f64::from(self.viewport.height)).max(0.0);
        self.scroll_to(scrollable * fraction);
    }

    /// Resize the viewport
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
        self.notify(HostEvent::Resize);
    }

    /// Change the document height without an event, as content loading would
    pub fn set_document_height(&mut self, height: f64) {
        self.document_height = height;
    }

    /// Deliver queued events to `controller`; returns how many were delivered
    pub fn dispatch(&mut self, controller: &mut SceneController<Self>) -> usize {
        let mut delivered = 0;
        while let Some(event) = self.queued.pop_front() {
            controller.handle_event(self, event);
            delivered += 1;
        }
        delivered
    }

    /// Advance the clock by `delta` seconds, deliver queued events, then run
    /// every frame callback that was pending
    ///
    /// Returns the report of the last frame that ran.
    pub fn pump_frame(&mut self, controller: &mut SceneController<Self>, delta: f64) -> Option<FrameReport> {
        self.dispatch(controller);
        self.time += delta;
        let now = self.time;
        let due = std::mem::take(&mut self.pending_frames);
        let mut report = None;
        for token in due {
            if let Some(frame) = controller.on_frame(self, token, now) {
                report = Some(frame);
            }
        }
        report
    }

    /// Pump frames at `delta` until `duration` seconds have elapsed
    ///
    /// Returns every frame report in order. A `delta` that is not positive
    /// and finite runs no frames.
    pub fn run_for(&mut self, controller: &mut SceneController<Self>, duration: f64, delta: f64) -> Vec<FrameReport> {
        if !(delta > 0.0 && delta.is_finite()) {
            log::warn!("Ignoring run_for with frame delta {delta}");
            return Vec::new();
        }
        let frames = (duration / delta).round().max(0.0) as usize;
        (0..frames)
            .filter_map(|_| self.pump_frame(controller, delta))
            .collect()
    }

    /// Simulated time in seconds
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Frame callbacks waiting to run
    pub fn pending_frame_count(&self) -> usize {
        self.pending_frames.len()
    }

    /// Tokens of frame callbacks waiting to run
    pub fn pending_frames(&self) -> Vec<FrameToken> {
        self.pending_frames.iter().copied().collect()
    }

    /// Attached surfaces
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Style of an attached surface
    pub fn surface_style(&self, surface: SurfaceId) -> Option<&SurfaceStyle> {
        self.surfaces.get(&surface)
    }

    /// Every style currently attached
    pub fn surface_styles(&self) -> impl Iterator<Item = &SurfaceStyle> {
        self.surfaces.values()
    }

    /// Graphics contexts handed out so far
    pub fn contexts_created(&self) -> u32 {
        self.contexts_created
    }
}

impl Host for HeadlessHost {
    type Backend = HeadlessBackend;

    fn scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            offset: self.scroll_offset,
            scroll_height: self.document_height,
            viewport_height: f64::from(self.viewport.height),
        }
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    fn create_backend(&mut self, renderer: &RendererConfig) -> Result<HeadlessBackend, RenderError> {
        if let Some(reason) = &self.context_failure {
            return Err(RenderError::ContextUnavailable(reason.clone()));
        }
        self.contexts_created += 1;
        log::debug!(
            "Created headless context #{} (antialias {}, shadows {}, high performance {}, clear {:?})",
            self.contexts_created,
            renderer.antialias,
            renderer.shadows,
            renderer.high_performance,
            renderer.clear_color
        );
        Ok(HeadlessBackend::from_config(renderer))
    }

    fn attach_surface(&mut self, style: &SurfaceStyle) -> SurfaceId {
        let id = SurfaceId(self.next_id());
        self.surfaces.insert(id, style.clone());
        id
    }

    fn detach_surface(&mut self, surface: SurfaceId) {
        self.surfaces.remove(&surface);
    }

    fn subscribe(&mut self, event: HostEvent) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.listeners.insert(id, event);
        id
    }

    fn unsubscribe(&mut self, listener: ListenerId) {
        self.listeners.remove(&listener);
    }

    fn request_frame(&mut self) -> FrameToken {
        let token = FrameToken(self.next_id());
        self.pending_frames.insert(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.pending_frames.remove(&token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_only_queued_for_listeners() {
        let mut host = HeadlessHost::new(Viewport::new(800, 600), 3000.0);
        host.scroll_to(100.0);
        assert!(host.queued.is_empty());

        let listener = host.subscribe(HostEvent::Scroll);
        host.scroll_to(200.0);
        host.resize(1024, 768);
        assert_eq!(host.queued.len(), 1);

        host.unsubscribe(listener);
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_frame_bookkeeping() {
        let mut host = HeadlessHost::new(Viewport::new(800, 600), 3000.0);
        let a = host.request_frame();
        let b = host.request_frame();
        assert_ne!(a, b);
        host.cancel_frame(a);
        host.cancel_frame(a);
        assert_eq!(host.pending_frames(), vec![b]);
    }

    #[test]
    fn test_scroll_to_fraction() {
        let mut host = HeadlessHost::new(Viewport::new(800, 600), 2600.0);
        host.scroll_to_fraction(0.5);
        assert_eq!(host.scroll_metrics().offset, 1000.0);
    }

    #[test]
    fn test_backend_receives_renderer_settings() {
        let mut host = HeadlessHost::new(Viewport::new(800, 600), 600.0);
        let renderer = RendererConfig {
            clear_color: [0.0, 0.0, 0.0, 0.5],
            high_performance: false,
            ..RendererConfig::default()
        };
        let backend = host.create_backend(&renderer).unwrap();
        assert_eq!(backend.clear_color(), [0.0, 0.0, 0.0, 0.5]);
        assert!(!backend.high_performance());
    }

    #[test]
    fn test_context_failure() {
        let mut host = HeadlessHost::new(Viewport::new(800, 600), 600.0);
        host.fail_context_creation("no webgl");
        assert_eq!(
            host.create_backend(&RendererConfig::default()).err(),
            Some(RenderError::ContextUnavailable("no webgl".into()))
        );
        assert_eq!(host.contexts_created(), 0);
    }
}
