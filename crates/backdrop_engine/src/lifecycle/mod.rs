//! Mount, frame loop and teardown of the backdrop

pub mod controller;
pub mod headless;
pub mod host;

pub use controller::{LifecycleError, SceneController};
pub use headless::HeadlessHost;
pub use host::{FrameToken, Host, HostEvent, ListenerId, SurfaceId, SurfaceStyle};
