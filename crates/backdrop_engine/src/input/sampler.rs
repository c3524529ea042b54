//! Scroll and viewport sampling
//!
//! Event handlers call [`InputSampler::on_scroll`] and
//! [`InputSampler::on_resize`]. The normalised scroll fraction is published
//! through a single-writer/single-reader channel: the sampler owns the only
//! [`ScrollWriter`] and the frame loop owns the only [`ScrollReader`].

use std::cell::Cell;
use std::rc::Rc;

use crate::foundation::math::utils;
use crate::render::camera::FrustumBounds;

/// Document scroll state as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    /// Vertical scroll offset of the viewport top
    pub offset: f64,
    /// Total document height
    pub scroll_height: f64,
    /// Visible height
    pub viewport_height: f64,
}

impl ScrollMetrics {
    /// Distance the document can actually scroll
    pub fn scrollable(&self) -> f64 {
        self.scroll_height - self.viewport_height
    }
}

/// Viewport size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl Viewport {
    /// Create a viewport
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height; 1 for an empty viewport
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }
}

/// Reduce scroll metrics to a fraction in `[0, 1]`
///
/// A page that cannot scroll yields 0. Overscroll (negative offsets, or
/// offsets past the end during a bounce) clamps to the nearest bound and
/// any non-finite input yields 0.
pub fn normalize_scroll(metrics: ScrollMetrics) -> f32 {
    let scrollable = metrics.scrollable();
    if !(scrollable > 0.0) || !metrics.offset.is_finite() {
        return 0.0;
    }
    let fraction = (metrics.offset / scrollable) as f32;
    utils::clamp(utils::finite_or(fraction, 0.0), 0.0, 1.0)
}

/// Create a connected scroll writer/reader pair starting at `initial`
pub fn scroll_channel(initial: f32) -> (ScrollWriter, ScrollReader) {
    let cell = Rc::new(Cell::new(initial));
    (
        ScrollWriter { cell: Rc::clone(&cell) },
        ScrollReader { cell },
    )
}

/// Write end of the scroll channel; held by the sampler
#[derive(Debug)]
pub struct ScrollWriter {
    cell: Rc<Cell<f32>>,
}

impl ScrollWriter {
    /// Publish a new fraction; the last write wins
    pub fn publish(&self, fraction: f32) {
        self.cell.set(fraction);
    }
}

/// Read end of the scroll channel; held by the frame loop
#[derive(Debug)]
pub struct ScrollReader {
    cell: Rc<Cell<f32>>,
}

impl ScrollReader {
    /// Most recently published fraction
    pub fn get(&self) -> f32 {
        self.cell.get()
    }
}

/// Tracks the scroll fraction and the viewport-derived frustum
#[derive(Debug)]
pub struct InputSampler {
    writer: ScrollWriter,
    frustum_half_height: f32,
    viewport: Viewport,
    bounds: FrustumBounds,
    fraction: f32,
}

impl InputSampler {
    /// Create a sampler for the given viewport and initial scroll state
    ///
    /// Returns the read end of the scroll channel alongside the sampler.
    pub fn new(frustum_half_height: f32, viewport: Viewport, metrics: ScrollMetrics) -> (Self, ScrollReader) {
        let fraction = normalize_scroll(metrics);
        let (writer, reader) = scroll_channel(fraction);
        let sampler = Self {
            writer,
            frustum_half_height,
            viewport,
            bounds: FrustumBounds::from_aspect(viewport.aspect(), frustum_half_height),
            fraction,
        };
        (sampler, reader)
    }

    /// Handle a scroll event; returns the published fraction
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) -> f32 {
        self.fraction = normalize_scroll(metrics);
        self.writer.publish(self.fraction);
        self.fraction
    }

    /// Handle a resize event; returns the new frustum bounds
    ///
    /// The scrollable distance depends on the viewport height, so the scroll
    /// fraction is re-sampled as well.
    pub fn on_resize(&mut self, viewport: Viewport, metrics: ScrollMetrics) -> FrustumBounds {
        self.viewport = viewport;
        self.bounds = FrustumBounds::from_aspect(viewport.aspect(), self.frustum_half_height);
        self.on_scroll(metrics);
        self.bounds
    }

    /// Last published fraction
    pub fn fraction(&self) -> f32 {
        self.fraction
    }

    /// Current viewport
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Current frustum bounds
    pub fn bounds(&self) -> FrustumBounds {
        self.bounds
    }
}
