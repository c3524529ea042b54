//! # Controller Settings
//!
//! Every tunable constant of the backdrop lives here: camera framing, the
//! smoothing rates of each interpolated quantity, the zoom curve, rotation
//! and pan mappings, the mode cross-fade, renderer options and the style of
//! the output surface.
//!
//! All sections use `#[serde(default)]`, so a settings file only needs to
//! name the values it changes:
//!
//! ```toml
//! log_level = "debug"
//!
//! [zoom]
//! detailed = 4.0
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::foundation::math::constants;
use crate::render::material::rgb_hex;

/// # Camera Configuration
///
/// Orthographic "blueprint" camera. The frustum is `2 * frustum_half_height`
/// world units tall and as wide as the viewport aspect ratio demands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Half of the vertical frustum extent in world units
    pub frustum_half_height: f32,
    /// Near clipping plane distance
    pub near: f32,
    /// Far clipping plane distance
    pub far: f32,
    /// Eye position in world space
    pub position: [f32; 3],
    /// Look-at target in world space
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frustum_half_height: 14.0,
            near: 1.0,
            far: 1000.0,
            position: [35.0, 35.0, 35.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

/// How camera zoom follows its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoomPolicy {
    /// Exponential smoothing scaled by frame delta, like every other
    /// interpolated quantity. The per-frame lag is converted to an equivalent
    /// rate at the reference frame rate.
    TimeScaled,
    /// Fixed fraction of the remaining distance per rendered frame,
    /// regardless of frame duration. Converges faster on high refresh rate
    /// displays.
    PerFrame,
}

/// # Smoothing Configuration
///
/// Rates are in 1/s and are applied as exact exponential decay over the
/// frame delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Rate at which the displayed scroll value follows the sampled one
    pub scroll_rate: f32,
    /// Rate at which the mode-blend scalar follows the selected mode
    pub mode_rate: f32,
    /// Rate at which the root pan offset follows its target
    pub pan_rate: f32,
    /// Fraction of the remaining zoom distance covered per reference frame
    pub zoom_lag_per_frame: f32,
    /// Frame rate the zoom lag is defined against
    pub zoom_reference_hz: f32,
    /// Whether zoom smoothing is delta-scaled or per-frame
    pub zoom_policy: ZoomPolicy,
    /// Longest frame delta fed to the animation, in seconds
    pub max_frame_delta: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            scroll_rate: 4.0,
            mode_rate: 5.0,
            pan_rate: 2.0,
            zoom_lag_per_frame: 0.1,
            zoom_reference_hz: 60.0,
            zoom_policy: ZoomPolicy::TimeScaled,
            max_frame_delta: 0.1,
        }
    }
}

/// # Zoom Curve
///
/// `target = lerp(wide, detailed, scroll ^ exponent)`. An exponent below 1
/// zooms in quickly near the top of the page and levels off further down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    /// Zoom at scroll 0
    pub wide: f32,
    /// Zoom at scroll 1
    pub detailed: f32,
    /// Power-law exponent applied to the scroll fraction, in (0, 1]
    pub exponent: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            wide: 1.2,
            detailed: 3.4,
            exponent: 0.5,
        }
    }
}

/// # Rotation Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Constant yaw applied to the root, in radians
    pub base_angle: f32,
    /// Idle spin speed at scroll 0, in radians per second
    pub auto_spin_speed: f32,
    /// Scroll fraction at which idle spin has tapered to zero
    pub taper_end: f32,
    /// Additional yaw per unit of scroll, in radians
    pub scroll_rotation: f32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            base_angle: constants::QUARTER_PI,
            auto_spin_speed: 0.05,
            taper_end: 0.3,
            scroll_rotation: constants::PI,
        }
    }
}

/// Root offset reached at scroll 1 for one mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanTarget {
    /// Horizontal offset
    pub x: f32,
    /// Vertical offset
    pub y: f32,
}

/// # Pan Configuration
///
/// Each mode pans the root linearly from the origin (scroll 0) to its own
/// target (scroll 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanConfig {
    /// Workplace: drift toward the upper-left desk cluster
    pub workplace: PanTarget,
    /// Building: slide down the tower to reveal upper floors
    pub building: PanTarget,
}

impl Default for PanConfig {
    fn default() -> Self {
        Self {
            workplace: PanTarget { x: -4.0, y: 2.0 },
            building: PanTarget { x: 0.0, y: -18.0 },
        }
    }
}

/// # Mode Transition Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Subtrees scaled below this are hidden and skipped by the renderer
    pub visibility_epsilon: f32,
    /// Vertical distance the fading subtree travels away from the origin
    pub separation: f32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            visibility_epsilon: 0.01,
            separation: 30.0,
        }
    }
}

/// Distance fog settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogConfig {
    /// Fog colour (linear RGB 0..1)
    pub color: [f32; 3],
    /// Distance at which fog starts
    pub near: f32,
    /// Distance at which fog is opaque
    pub far: f32,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            color: rgb_hex(0x00FD_FCF8),
            near: 35.0,
            far: 160.0,
        }
    }
}

/// # Renderer Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Request multisample antialiasing
    pub antialias: bool,
    /// Ask for the high-performance adapter where the host offers a choice
    pub high_performance: bool,
    /// Clear colour (RGBA); fully transparent so page content shows through
    pub clear_color: [f32; 4],
    /// Upper bound for the device pixel ratio used for the drawing buffer
    pub max_pixel_ratio: f32,
    /// Enable shadow mapping
    pub shadows: bool,
    /// Shadow map edge length in texels
    pub shadow_map_size: u32,
    /// Distance fog
    pub fog: FogConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            antialias: true,
            high_performance: true,
            clear_color: [0.0, 0.0, 0.0, 0.0],
            max_pixel_ratio: 2.0,
            shadows: true,
            shadow_map_size: 2048,
            fog: FogConfig::default(),
        }
    }
}

/// # Output Surface Style
///
/// The surface is always a fixed, full-viewport layer. These fields control
/// how it sits relative to the page content above it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Stacking order of the layer
    pub z_index: i32,
    /// Layer opacity, 0..1
    pub opacity: f32,
    /// Whether the layer may receive pointer events
    pub pointer_events: bool,
    /// Whether the layer may be selected
    pub selectable: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            z_index: 0,
            opacity: 0.7,
            pointer_events: false,
            selectable: false,
        }
    }
}

/// # Complete Controller Configuration
///
/// Top-level settings for one scene controller mount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Camera framing
    pub camera: CameraConfig,
    /// Smoothing rates
    pub smoothing: SmoothingConfig,
    /// Zoom curve
    pub zoom: ZoomConfig,
    /// Rotation behaviour
    pub rotation: RotationConfig,
    /// Per-mode pan mapping
    pub pan: PanConfig,
    /// Mode cross-fade
    pub transition: TransitionConfig,
    /// Renderer options
    pub renderer: RendererConfig,
    /// Output surface style
    pub surface: SurfaceConfig,
    /// Default log filter used by binaries embedding the controller
    pub log_level: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            smoothing: SmoothingConfig::default(),
            zoom: ZoomConfig::default(),
            rotation: RotationConfig::default(),
            pan: PanConfig::default(),
            transition: TransitionConfig::default(),
            renderer: RendererConfig::default(),
            surface: SurfaceConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if let Some((name, value)) = self.float_fields().into_iter().find(|(_, value)| !value.is_finite()) {
            return invalid(format!("{name} must be finite, got {value}"));
        }

        let camera = &self.camera;
        if !(camera.frustum_half_height > 0.0) {
            return invalid(format!("camera.frustum_half_height must be positive, got {}", camera.frustum_half_height));
        }
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return invalid(format!("camera clip planes must satisfy 0 < near < far, got {} / {}", camera.near, camera.far));
        }

        let smoothing = &self.smoothing;
        for (name, rate) in [
            ("scroll_rate", smoothing.scroll_rate),
            ("mode_rate", smoothing.mode_rate),
            ("pan_rate", smoothing.pan_rate),
            ("zoom_reference_hz", smoothing.zoom_reference_hz),
            ("max_frame_delta", smoothing.max_frame_delta),
        ] {
            if !(rate > 0.0 && rate.is_finite()) {
                return invalid(format!("smoothing.{name} must be positive, got {rate}"));
            }
        }
        if !(smoothing.zoom_lag_per_frame > 0.0 && smoothing.zoom_lag_per_frame < 1.0) {
            return invalid(format!("smoothing.zoom_lag_per_frame must be in (0, 1), got {}", smoothing.zoom_lag_per_frame));
        }

        let zoom = &self.zoom;
        if !(zoom.wide > 0.0 && zoom.detailed >= zoom.wide) {
            return invalid(format!("zoom bounds must satisfy 0 < wide <= detailed, got {} / {}", zoom.wide, zoom.detailed));
        }
        if !(zoom.exponent > 0.0 && zoom.exponent <= 1.0) {
            return invalid(format!("zoom.exponent must be in (0, 1], got {}", zoom.exponent));
        }

        if !(self.rotation.taper_end > 0.0 && self.rotation.taper_end <= 1.0) {
            return invalid(format!("rotation.taper_end must be in (0, 1], got {}", self.rotation.taper_end));
        }
        if self.rotation.auto_spin_speed < 0.0 {
            return invalid(format!("rotation.auto_spin_speed must not be negative, got {}", self.rotation.auto_spin_speed));
        }

        let epsilon = self.transition.visibility_epsilon;
        if !(epsilon > 0.0 && epsilon < 1.0) {
            return invalid(format!("transition.visibility_epsilon must be in (0, 1), got {epsilon}"));
        }

        if !(self.renderer.max_pixel_ratio >= 1.0) {
            return invalid(format!("renderer.max_pixel_ratio must be at least 1, got {}", self.renderer.max_pixel_ratio));
        }
        if !(0.0..=1.0).contains(&self.surface.opacity) {
            return invalid(format!("surface.opacity must be in [0, 1], got {}", self.surface.opacity));
        }

        Ok(())
    }

    fn float_fields(&self) -> Vec<(&'static str, f32)> {
        let camera = &self.camera;
        let smoothing = &self.smoothing;
        let fog = &self.renderer.fog;
        let mut fields = vec![
            ("camera.frustum_half_height", camera.frustum_half_height),
            ("camera.near", camera.near),
            ("camera.far", camera.far),
            ("smoothing.scroll_rate", smoothing.scroll_rate),
            ("smoothing.mode_rate", smoothing.mode_rate),
            ("smoothing.pan_rate", smoothing.pan_rate),
            ("smoothing.zoom_lag_per_frame", smoothing.zoom_lag_per_frame),
            ("smoothing.zoom_reference_hz", smoothing.zoom_reference_hz),
            ("smoothing.max_frame_delta", smoothing.max_frame_delta),
            ("zoom.wide", self.zoom.wide),
            ("zoom.detailed", self.zoom.detailed),
            ("zoom.exponent", self.zoom.exponent),
            ("rotation.base_angle", self.rotation.base_angle),
            ("rotation.auto_spin_speed", self.rotation.auto_spin_speed),
            ("rotation.taper_end", self.rotation.taper_end),
            ("rotation.scroll_rotation", self.rotation.scroll_rotation),
            ("pan.workplace.x", self.pan.workplace.x),
            ("pan.workplace.y", self.pan.workplace.y),
            ("pan.building.x", self.pan.building.x),
            ("pan.building.y", self.pan.building.y),
            ("transition.visibility_epsilon", self.transition.visibility_epsilon),
            ("transition.separation", self.transition.separation),
            ("renderer.max_pixel_ratio", self.renderer.max_pixel_ratio),
            ("renderer.fog.near", fog.near),
            ("renderer.fog.far", fog.far),
            ("surface.opacity", self.surface.opacity),
        ];
        fields.extend(camera.position.iter().map(|v| ("camera.position", *v)));
        fields.extend(camera.target.iter().map(|v| ("camera.target", *v)));
        fields.extend(fog.color.iter().map(|v| ("renderer.fog.color", *v)));
        fields.extend(self.renderer.clear_color.iter().map(|v| ("renderer.clear_color", *v)));
        fields
    }

    /// Continuous zoom smoothing rate derived from the per-frame lag
    pub fn zoom_rate(&self) -> f32 {
        crate::foundation::math::utils::per_frame_lag_to_rate(
            self.smoothing.zoom_lag_per_frame,
            self.smoothing.zoom_reference_hz,
        )
    }
}

impl Config for ControllerConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ControllerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.camera.frustum_half_height, 14.0);
        assert_eq!(config.zoom.exponent, 0.5);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ControllerConfig = toml::from_str(
            r#"
            log_level = "debug"

            [zoom]
            detailed = 4.0

            [smoothing]
            zoom_policy = "PerFrame"
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.zoom.detailed, 4.0);
        assert_eq!(config.zoom.wide, 1.2);
        assert_eq!(config.smoothing.zoom_policy, ZoomPolicy::PerFrame);
        assert_eq!(config.smoothing.scroll_rate, 4.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ron_round_trip() {
        let mut config = ControllerConfig::default();
        config.pan.building.y = -24.0;
        let text = ron::ser::to_string(&config).unwrap();
        let parsed: ControllerConfig = ron::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_inverted_zoom_bounds_rejected() {
        let mut config = ControllerConfig::default();
        config.zoom.wide = 5.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_exponent_above_one_rejected() {
        let mut config = ControllerConfig::default();
        config.zoom.exponent = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_rate_rejected() {
        let mut config = ControllerConfig::default();
        config.smoothing.mode_rate = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let config: ControllerConfig = toml::from_str("[pan.building]\nx = 0.0\ny = nan\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config: ControllerConfig = toml::from_str("[zoom]\ndetailed = inf\n").unwrap();
        assert!(config.validate().is_err());

        let cases: [fn(&mut ControllerConfig); 8] = [
            |c| c.pan.workplace.x = f32::INFINITY,
            |c| c.rotation.base_angle = f32::NAN,
            |c| c.rotation.scroll_rotation = f32::NEG_INFINITY,
            |c| c.rotation.auto_spin_speed = f32::NAN,
            |c| c.transition.separation = f32::NAN,
            |c| c.camera.position[1] = f32::INFINITY,
            |c| c.renderer.clear_color[3] = f32::NAN,
            |c| c.renderer.fog.far = f32::INFINITY,
        ];
        for mutate in cases {
            let mut config = ControllerConfig::default();
            mutate(&mut config);
            assert!(config.validate().is_err(), "accepted {config:?}");
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let result = ControllerConfig::default().save_to_file("settings.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
