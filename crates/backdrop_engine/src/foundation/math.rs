//! Math utilities and types
//!
//! Provides the vector/matrix aliases used by the scene graph and camera, the
//! node `Transform`, and the scalar helpers the animation driver is built on
//! (interpolation, clamping, exponential smoothing).

pub use nalgebra::{Matrix4, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Local transform of a scene node
///
/// Rotation is stored as XYZ Euler angles in radians. The animation driver
/// writes single axes every frame (root yaw, subtree height), which is far
/// more natural on Euler angles than on a quaternion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position relative to the parent node
    pub position: Vec3,

    /// Euler rotation (x, y, z) in radians, applied in X then Y then Z order
    pub rotation: Vec3,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Set all three scale components to the same factor
    pub fn set_uniform_scale(&mut self, factor: f32) {
        self.scale = Vec3::new(factor, factor, factor);
    }

    /// Uniform scale factor, taken from the X component
    pub fn uniform_scale(&self) -> f32 {
        self.scale.x
    }

    /// Convert to a transformation matrix (T * Rz * Ry * Rx * S)
    pub fn to_matrix(&self) -> Mat4 {
        let rotation = Mat4::rotation_z(self.rotation.z)
            * Mat4::rotation_y(self.rotation.y)
            * Mat4::rotation_x(self.rotation.x);
        Mat4::new_translation(&self.position) * rotation * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        self.to_matrix().transform_point(&point)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 4
    pub const QUARTER_PI: f32 = PI * 0.25;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Clamp a value between min and max
    pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
        if value < min {
            min
        } else if value > max {
            max
        } else {
            value
        }
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Replace NaN and infinities with `fallback`
    pub fn finite_or(value: f32, fallback: f32) -> f32 {
        if value.is_finite() {
            value
        } else {
            fallback
        }
    }

    /// Fraction of the remaining distance covered by exponential smoothing
    /// at `rate` (1/s) over `delta` seconds.
    ///
    /// This is the exact solution of `dx/dt = rate * (target - x)`, so the
    /// result always lies in `[0, 1)`: a smoothed value never overshoots its
    /// target no matter how long a frame takes. For small `rate * delta` it
    /// matches the `rate * delta` step of the explicit Euler form.
    pub fn smoothing_factor(rate: f32, delta: f32) -> f32 {
        if rate <= 0.0 || delta <= 0.0 || !rate.is_finite() || !delta.is_finite() {
            return 0.0;
        }
        1.0 - (-rate * delta).exp()
    }

    /// Convert a fixed per-frame lag (e.g. "move 10% of the way each frame")
    /// at a reference frame rate into an equivalent continuous rate in 1/s.
    pub fn per_frame_lag_to_rate(lag: f32, reference_hz: f32) -> f32 {
        let lag = clamp(lag, 0.0, 0.999_999);
        -(1.0 - lag).ln() * reference_hz
    }

    /// Move `current` toward `target` by `factor` of the remaining distance
    pub fn approach(current: f32, target: f32, factor: f32) -> f32 {
        current + (target - current) * factor
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Create an orthographic projection matrix mapping depth to [0, 1]
    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Create a right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let width = right - left;
        let height = top - bottom;
        let depth = far - near;

        let mut result = Mat4::identity();
        result[(0, 0)] = 2.0 / width;
        result[(1, 1)] = 2.0 / height;
        result[(2, 2)] = -1.0 / depth;
        result[(0, 3)] = -(right + left) / width;
        result[(1, 3)] = -(top + bottom) / height;
        result[(2, 3)] = -near / depth;
        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let translation = Mat4::new(
            1.0, 0.0, 0.0, -eye.x,
            0.0, 1.0, 0.0, -eye.y,
            0.0, 0.0, 1.0, -eye.z,
            0.0, 0.0, 0.0, 1.0,
        );

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        rotation * translation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_smoothing_factor_bounds() {
        assert_eq!(utils::smoothing_factor(4.0, 0.0), 0.0);
        assert_eq!(utils::smoothing_factor(4.0, f32::NAN), 0.0);
        assert!(utils::smoothing_factor(4.0, 1000.0) <= 1.0);
        assert_relative_eq!(utils::smoothing_factor(4.0, 1.0 / 600.0), 4.0 / 600.0, epsilon = 1e-4);
    }

    #[test]
    fn test_per_frame_lag_round_trips_at_reference_rate() {
        let rate = utils::per_frame_lag_to_rate(0.1, 60.0);
        assert_relative_eq!(utils::smoothing_factor(rate, 1.0 / 60.0), 0.1, epsilon = 1e-5);
    }

    #[test]
    fn test_finite_or() {
        assert_eq!(utils::finite_or(f32::NAN, 0.0), 0.0);
        assert_eq!(utils::finite_or(f32::NEG_INFINITY, 0.5), 0.5);
        assert_eq!(utils::finite_or(0.25, 0.0), 0.25);
    }

    #[test]
    fn test_transform_matrix_applies_scale_then_translation() {
        let mut transform = Transform::from_position(Vec3::new(0.0, 2.0, 0.0));
        transform.set_uniform_scale(0.5);
        let p = transform.transform_point(Point3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(1.0, 2.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_orthographic_maps_extents_to_ndc() {
        let proj = Mat4::orthographic(-2.0, 2.0, -1.0, 1.0, 1.0, 11.0);
        let corner = proj.transform_point(&Point3::new(2.0, 1.0, -1.0));
        assert_relative_eq!(corner.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(corner.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(corner.z, 0.0, epsilon = 1e-6);
    }
}
