//! Input sampling
//!
//! Page signals consumed by the controller: the externally selected mode
//! and the scroll/viewport state.

pub mod mode;
pub mod sampler;

pub use mode::{Mode, ModeCell, ModeReader, ParseModeError};
pub use sampler::{normalize_scroll, scroll_channel, InputSampler, ScrollMetrics, ScrollReader, ScrollWriter, Viewport};
