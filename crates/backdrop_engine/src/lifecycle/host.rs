//! Host environment abstraction
//!
//! Everything the controller needs from the page it is embedded in: scroll
//! and viewport state, a graphics context, a place to attach its output
//! surface, event subscriptions and frame scheduling.

use crate::input::{ScrollMetrics, Viewport};
use crate::render::backend::{RenderBackend, RenderError};
use crate::settings::{RendererConfig, SurfaceConfig};

/// Handle of a registered event listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

/// Handle of a requested frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameToken(pub u64);

/// Handle of an attached output surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(pub u64);

/// Host signals the controller subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEvent {
    /// Document scroll position changed
    Scroll,
    /// Viewport was resized
    Resize,
}

/// Presentation of the output surface
///
/// A full-viewport layer fixed behind the page content.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceStyle {
    /// Stacking order
    pub z_index: i32,
    /// Layer opacity in `[0, 1]`
    pub opacity: f32,
    /// Whether the layer receives pointer events
    pub pointer_events: bool,
    /// Whether the layer's content can be selected
    pub selectable: bool,
}

impl From<&SurfaceConfig> for SurfaceStyle {
    fn from(config: &SurfaceConfig) -> Self {
        Self {
            z_index: config.z_index,
            opacity: config.opacity.clamp(0.0, 1.0),
            pointer_events: config.pointer_events,
            selectable: config.selectable,
        }
    }
}

impl SurfaceStyle {
    /// Inline CSS for hosts backed by a DOM
    pub fn to_css(&self) -> String {
        format!(
            "position: fixed; inset: 0; z-index: {}; opacity: {}; pointer-events: {}; user-select: {};",
            self.z_index,
            self.opacity,
            if self.pointer_events { "auto" } else { "none" },
            if self.selectable { "auto" } else { "none" },
        )
    }
}

/// Environment the scene controller is mounted into
pub trait Host {
    /// Graphics context type this host creates
    type Backend: RenderBackend;

    /// Current document scroll state
    fn scroll_metrics(&self) -> ScrollMetrics;

    /// Current viewport size
    fn viewport(&self) -> Viewport;

    /// Device pixel ratio of the display
    fn device_pixel_ratio(&self) -> f32;

    /// Create a graphics context
    ///
    /// # Errors
    /// `RenderError::ContextUnavailable` when the environment has no usable
    /// graphics support.
    fn create_backend(&mut self, renderer: &RendererConfig) -> Result<Self::Backend, RenderError>;

    /// Insert the output surface into the page
    fn attach_surface(&mut self, style: &SurfaceStyle) -> SurfaceId;

    /// Remove a previously attached surface. Unknown ids are ignored.
    fn detach_surface(&mut self, surface: SurfaceId);

    /// Start delivering `event` to the controller
    fn subscribe(&mut self, event: HostEvent) -> ListenerId;

    /// Stop delivering events to `listener`. Unknown ids are ignored.
    fn unsubscribe(&mut self, listener: ListenerId);

    /// Schedule one frame callback at the next display refresh
    fn request_frame(&mut self) -> FrameToken;

    /// Cancel a scheduled frame callback. Unknown or already fired tokens
    /// are ignored.
    fn cancel_frame(&mut self, token: FrameToken);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_surface_is_inert_background() {
        let style = SurfaceStyle::from(&SurfaceConfig::default());
        assert!(!style.pointer_events);
        assert!(!style.selectable);
        assert_eq!(style.z_index, 0);
        assert_eq!(
            style.to_css(),
            "position: fixed; inset: 0; z-index: 0; opacity: 0.7; pointer-events: none; user-select: none;"
        );
    }
}
