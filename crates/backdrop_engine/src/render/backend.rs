//! Backend abstraction for drawing a scene graph
//!
//! The controller only needs four things from a graphics context: resize the
//! drawing buffer, set the pixel ratio, draw a scene through a camera, and
//! release everything. `HeadlessBackend` implements that contract in memory
//! and records what it was asked to draw.

use slotmap::SecondaryMap;
use thiserror::Error;

use super::camera::OrthographicCamera;
use super::mesh::Mesh;
use super::resources::GeometryHandle;
use crate::scene::{NodeId, SceneGraph};
use crate::settings::RendererConfig;

/// Rendering errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The host could not create a graphics context
    #[error("Graphics context unavailable: {0}")]
    ContextUnavailable(String),

    /// The context was lost after creation
    #[error("Graphics context lost")]
    ContextLost,

    /// Drawing buffer dimensions were rejected
    #[error("Invalid surface size {width}x{height}")]
    InvalidSurfaceSize {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// The backend was used after `dispose`
    #[error("Render backend already disposed")]
    Disposed,
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Counters for one rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Nodes reached by the visible traversal
    pub visited_nodes: usize,
    /// Mesh draws issued
    pub draw_calls: usize,
    /// Triangles submitted
    pub triangles: u64,
    /// Geometries tessellated for the first time this frame
    pub uploads: usize,
}

/// Graphics context used by the scene controller
pub trait RenderBackend {
    /// Resize the drawing buffer to the viewport size in CSS pixels
    fn set_size(&mut self, width: u32, height: u32) -> BackendResult<()>;

    /// Set the device pixel ratio (already capped by the caller)
    fn set_pixel_ratio(&mut self, ratio: f32);

    /// Draw the visible part of `scene` through `camera`
    fn render(&mut self, scene: &SceneGraph, camera: &OrthographicCamera) -> BackendResult<FrameStats>;

    /// Release the context. Must tolerate being called more than once.
    fn dispose(&mut self);

    /// Whether `dispose` has run
    fn is_disposed(&self) -> bool;
}

/// In-memory backend that records draws instead of rasterizing
///
/// Each geometry is tessellated on first draw and kept until `dispose`, the
/// way a GPU backend keeps uploaded vertex buffers.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    clear_color: [f32; 4],
    high_performance: bool,
    meshes: SecondaryMap<GeometryHandle, Mesh>,
    uploaded_bytes: usize,
    width: u32,
    height: u32,
    pixel_ratio: f32,
    frames_rendered: u64,
    last_stats: FrameStats,
    last_zoom: Option<f32>,
    last_drawn: Vec<NodeId>,
    context_lost: bool,
    disposed: bool,
    dispose_calls: u32,
}

impl HeadlessBackend {
    /// Create a backend with an empty drawing buffer
    pub fn new() -> Self {
        Self {
            pixel_ratio: 1.0,
            ..Self::default()
        }
    }

    /// Create a backend honouring the renderer settings it can express
    pub fn from_config(renderer: &RendererConfig) -> Self {
        Self {
            clear_color: renderer.clear_color,
            high_performance: renderer.high_performance,
            ..Self::new()
        }
    }

    /// RGBA colour the drawing buffer is cleared to
    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    /// Whether the high-performance adapter was requested
    pub fn high_performance(&self) -> bool {
        self.high_performance
    }

    /// Geometries currently tessellated
    pub fn cached_meshes(&self) -> usize {
        self.meshes.len()
    }

    /// Vertex bytes produced by tessellation since creation
    pub fn uploaded_bytes(&self) -> usize {
        self.uploaded_bytes
    }

    /// Simulate losing the graphics context; later renders fail
    pub fn lose_context(&mut self) {
        self.context_lost = true;
    }

    /// Drawing buffer size in device pixels
    pub fn buffer_size(&self) -> (u32, u32) {
        let scale = |v: u32| (v as f32 * self.pixel_ratio).round() as u32;
        (scale(self.width), scale(self.height))
    }

    /// Viewport size in CSS pixels
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Current pixel ratio
    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Frames successfully rendered
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Counters of the most recent frame
    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Camera zoom used by the most recent frame
    pub fn last_zoom(&self) -> Option<f32> {
        self.last_zoom
    }

    /// Mesh nodes drawn by the most recent frame
    pub fn last_drawn(&self) -> &[NodeId] {
        &self.last_drawn
    }

    /// How many times `dispose` was called
    pub fn dispose_calls(&self) -> u32 {
        self.dispose_calls
    }
}

impl RenderBackend for HeadlessBackend {
    fn set_size(&mut self, width: u32, height: u32) -> BackendResult<()> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSurfaceSize { width, height });
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = if ratio.is_finite() && ratio > 0.0 { ratio } else { 1.0 };
    }

    fn render(&mut self, scene: &SceneGraph, camera: &OrthographicCamera) -> BackendResult<FrameStats> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        if self.context_lost {
            return Err(RenderError::ContextLost);
        }

        let resources = scene.resources();
        let mut stats = FrameStats::default();
        self.last_drawn.clear();

        let drawn = &mut self.last_drawn;
        let meshes = &mut self.meshes;
        let mut uploaded = 0;
        let visited = scene.traverse_visible(&mut |id, node, _world| {
            let Some(binding) = node.mesh else {
                return;
            };
            let Some(geometry) = resources.get_geometry(binding.geometry) else {
                return;
            };
            if !meshes.contains_key(binding.geometry) {
                let mesh = Mesh::from_geometry(geometry);
                uploaded += mesh.vertex_bytes().len();
                stats.uploads += 1;
                meshes.insert(binding.geometry, mesh);
            }
            if let Some(mesh) = meshes.get(binding.geometry) {
                stats.draw_calls += 1;
                stats.triangles += mesh.triangle_count() as u64;
                drawn.push(id);
            }
        });
        stats.visited_nodes = visited;
        self.uploaded_bytes += uploaded;

        self.frames_rendered += 1;
        self.last_stats = stats;
        self.last_zoom = Some(camera.zoom);
        log::trace!(
            "Headless frame {}: {} nodes visited, {} draws, {} triangles",
            self.frames_rendered,
            stats.visited_nodes,
            stats.draw_calls,
            stats.triangles
        );
        Ok(stats)
    }

    fn dispose(&mut self) {
        self.dispose_calls += 1;
        if !self.disposed {
            self.disposed = true;
            self.last_drawn.clear();
            self.meshes.clear();
            log::debug!("Headless backend disposed after {} frames", self.frames_rendered);
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::mesh::Geometry;
    use crate::render::resources::ResourceRegistry;
    use crate::scene::{MeshBinding, ShadowFlags};
    use crate::foundation::math::Transform;
    use crate::settings::CameraConfig;

    #[test]
    fn test_zero_size_rejected() {
        let mut backend = HeadlessBackend::new();
        assert_eq!(
            backend.set_size(0, 600),
            Err(RenderError::InvalidSurfaceSize { width: 0, height: 600 })
        );
        assert!(backend.set_size(800, 600).is_ok());
        backend.set_pixel_ratio(2.0);
        assert_eq!(backend.buffer_size(), (1600, 1200));
    }

    #[test]
    fn test_render_after_dispose_fails() {
        let mut backend = HeadlessBackend::new();
        let scene = SceneGraph::new();
        let camera = OrthographicCamera::from_config(&CameraConfig::default(), 1.0, 1.0);
        assert!(backend.render(&scene, &camera).is_ok());
        backend.dispose();
        backend.dispose();
        assert_eq!(backend.dispose_calls(), 2);
        assert_eq!(backend.render(&scene, &camera), Err(RenderError::Disposed));
    }

    #[test]
    fn test_lost_context() {
        let mut backend = HeadlessBackend::new();
        backend.lose_context();
        let scene = SceneGraph::new();
        let camera = OrthographicCamera::from_config(&CameraConfig::default(), 1.0, 1.0);
        assert_eq!(backend.render(&scene, &camera), Err(RenderError::ContextLost));
    }

    #[test]
    fn test_renderer_settings_are_kept() {
        let renderer = RendererConfig {
            clear_color: [0.1, 0.2, 0.3, 0.0],
            high_performance: false,
            ..RendererConfig::default()
        };
        let backend = HeadlessBackend::from_config(&renderer);
        assert_eq!(backend.clear_color(), [0.1, 0.2, 0.3, 0.0]);
        assert!(!backend.high_performance());
        assert_eq!(backend.pixel_ratio(), 1.0);
    }

    #[test]
    fn test_shared_geometry_tessellated_once() {
        let mut scene = SceneGraph::new();
        let binding = {
            let resources: &mut ResourceRegistry = scene.resources_mut();
            MeshBinding {
                geometry: resources.geometry(Geometry::cuboid(1.0, 1.0, 1.0)),
                material: resources.material(crate::render::material::Material::new()),
            }
        };
        for _ in 0..3 {
            scene
                .add_mesh(scene.root(), binding, Transform::identity(), ShadowFlags::empty())
                .unwrap();
        }
        let camera = OrthographicCamera::from_config(&CameraConfig::default(), 1.0, 1.0);
        let mut backend = HeadlessBackend::new();

        let first = backend.render(&scene, &camera).unwrap();
        assert_eq!(first.draw_calls, 3);
        assert_eq!(first.triangles, 36);
        assert_eq!(first.uploads, 1);
        assert_eq!(backend.cached_meshes(), 1);
        assert_eq!(backend.uploaded_bytes(), 24 * std::mem::size_of::<crate::render::mesh::Vertex>());

        let second = backend.render(&scene, &camera).unwrap();
        assert_eq!(second.uploads, 0);
        assert_eq!(second.triangles, 36);

        backend.dispose();
        assert_eq!(backend.cached_meshes(), 0);
    }
}
