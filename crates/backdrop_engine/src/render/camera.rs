//! # Orthographic Camera
//!
//! Isometric-style "blueprint" camera. The frustum extents follow the
//! viewport aspect ratio and a zoom factor divides them, so zooming in
//! shows a smaller slice of the scene at the same projection.

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::settings::CameraConfig;

/// Frustum half-extents before zoom is applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumBounds {
    /// Left edge (negative)
    pub left: f32,
    /// Right edge
    pub right: f32,
    /// Top edge
    pub top: f32,
    /// Bottom edge (negative)
    pub bottom: f32,
}

impl FrustumBounds {
    /// Bounds for a viewport with the given aspect ratio and half height `d`
    ///
    /// The vertical extent is fixed at `±d` and the horizontal extent is
    /// `±d * aspect`. A degenerate aspect ratio falls back to square.
    pub fn from_aspect(aspect: f32, d: f32) -> Self {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        Self {
            left: -d * aspect,
            right: d * aspect,
            top: d,
            bottom: -d,
        }
    }

    /// Width over height of the bounds
    pub fn aspect(&self) -> f32 {
        (self.right - self.left) / (self.top - self.bottom)
    }
}

/// Orthographic projection camera
#[derive(Debug, Clone)]
pub struct OrthographicCamera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation
    pub up: Vec3,

    /// Unzoomed frustum extents
    pub bounds: FrustumBounds,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,

    /// Zoom factor; extents are divided by this
    pub zoom: f32,
}

impl OrthographicCamera {
    /// Create a camera from settings for a viewport of the given aspect ratio
    pub fn from_config(config: &CameraConfig, aspect: f32, zoom: f32) -> Self {
        Self {
            position: Vec3::from(config.position),
            target: Vec3::from(config.target),
            up: Vec3::new(0.0, 1.0, 0.0),
            bounds: FrustumBounds::from_aspect(aspect, config.frustum_half_height),
            near: config.near,
            far: config.far,
            zoom,
        }
    }

    /// Replace the frustum extents (viewport resize)
    pub fn set_bounds(&mut self, bounds: FrustumBounds) {
        if (self.bounds.aspect() - bounds.aspect()).abs() > 0.01 {
            log::debug!("Camera aspect ratio changed: {:.3} -> {:.3}", self.bounds.aspect(), bounds.aspect());
        }
        self.bounds = bounds;
    }

    /// Frustum extents after zoom: (left, right, top, bottom)
    pub fn zoomed_extents(&self) -> (f32, f32, f32, f32) {
        let zoom = if self.zoom > 0.0 && self.zoom.is_finite() { self.zoom } else { 1.0 };
        (
            self.bounds.left / zoom,
            self.bounds.right / zoom,
            self.bounds.top / zoom,
            self.bounds.bottom / zoom,
        )
    }

    /// Generate view matrix for world-to-camera space transformation
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// Generate the zoomed orthographic projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        let (left, right, top, bottom) = self.zoomed_extents();
        Mat4::orthographic(left, right, bottom, top, self.near, self.far)
    }

    /// Combined view-projection matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
