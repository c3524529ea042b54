//! Material system for rendering

/// Convert a packed `0xRRGGBB` colour to normalized RGB
pub fn rgb_hex(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    ]
}

/// Physically based surface description
///
/// Covers both the standard metal/rough model and the transmissive glass
/// used for the tower facade.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Base color (RGB)
    pub base_color: [f32; 3],

    /// Metallic factor (0.0 = dielectric, 1.0 = metallic)
    pub metallic: f32,

    /// Roughness factor (0.0 = mirror, 1.0 = completely rough)
    pub roughness: f32,

    /// Alpha/transparency (0.0 = transparent, 1.0 = opaque)
    pub alpha: f32,

    /// Emitted colour (RGB)
    pub emissive: [f32; 3],

    /// Multiplier on the emitted colour
    pub emissive_intensity: f32,

    /// Light transmission through the surface (0.0 = none)
    pub transmission: f32,

    /// Index of refraction for transmissive surfaces
    pub ior: f32,

    /// Thickness used for transmissive volume attenuation
    pub thickness: f32,
}

impl Material {
    /// Create a new material with default properties
    pub fn new() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 1.0,
            alpha: 1.0,
            emissive: [0.0, 0.0, 0.0],
            emissive_intensity: 1.0,
            transmission: 0.0,
            ior: 1.5,
            thickness: 0.0,
        }
    }

    /// Set the base color from a packed `0xRRGGBB` value
    pub fn with_hex(mut self, hex: u32) -> Self {
        self.base_color = rgb_hex(hex);
        self
    }

    /// Set the metallic factor
    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic = metallic.clamp(0.0, 1.0);
        self
    }

    /// Set the roughness factor
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    /// Set the alpha/transparency
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    /// Make the surface glow with a packed `0xRRGGBB` colour
    pub fn with_emissive(mut self, hex: u32, intensity: f32) -> Self {
        self.emissive = rgb_hex(hex);
        self.emissive_intensity = intensity.max(0.0);
        self
    }

    /// Configure light transmission (glass)
    pub fn with_transmission(mut self, transmission: f32, ior: f32, thickness: f32) -> Self {
        self.transmission = transmission.clamp(0.0, 1.0);
        self.ior = ior.max(1.0);
        self.thickness = thickness.max(0.0);
        self
    }

    /// Whether the material needs blending
    pub fn is_transparent(&self) -> bool {
        self.alpha < 1.0 || self.transmission > 0.0
    }

    /// Whether the material emits light
    pub fn is_emissive(&self) -> bool {
        self.emissive_intensity > 0.0 && self.emissive.iter().any(|c| *c > 0.0)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new()
    }
}
