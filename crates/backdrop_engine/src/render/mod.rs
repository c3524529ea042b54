//! Rendering module
//!
//! Backend-agnostic rendering types: materials, primitive geometry, the
//! resource registry that owns them, the orthographic camera, and the
//! backend trait a graphics context implements.

pub mod backend;
pub mod camera;
pub mod material;
pub mod mesh;
pub mod resources;

pub use backend::{BackendResult, FrameStats, HeadlessBackend, RenderBackend, RenderError};
pub use camera::{FrustumBounds, OrthographicCamera};
pub use material::{rgb_hex, Material};
pub use mesh::{Geometry, Mesh, Vertex};
pub use resources::{GeometryHandle, MaterialHandle, ResourceRegistry, ResourceStats};
