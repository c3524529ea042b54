//! Shared material palette for the backdrop scene

use crate::render::material::Material;
use crate::render::resources::{MaterialHandle, ResourceRegistry};

/// Warm amber used for accents, screens and sensors
pub const AMBER: u32 = 0x00D9_7706;
/// Sky blue used for glass and cool activity lights
pub const SKY: u32 = 0x007D_D3FC;

/// Handles to every shared material, allocated once per scene
#[derive(Debug, Clone, Copy)]
pub struct MaterialPalette {
    /// Off-white wall
    pub wall: MaterialHandle,
    /// Amber feature wall and desk accessories
    pub wall_accent: MaterialHandle,
    /// Floor slabs and floor plates
    pub floor: MaterialHandle,
    /// Warm wood desk tops
    pub desk: MaterialHandle,
    /// Dark slate chairs
    pub chair: MaterialHandle,
    /// Navy metallic monitor casings
    pub monitor: MaterialHandle,
    /// Glowing monitor screens
    pub screen: MaterialHandle,
    /// Brushed metal legs, fins and spire
    pub metal: MaterialHandle,
    /// Transmissive facade glass
    pub glass: MaterialHandle,
    /// Plant foliage
    pub plant: MaterialHandle,
    /// Dark structural core, pots and crown
    pub core: MaterialHandle,
    /// Bright IoT sensor nodes
    pub sensor: MaterialHandle,
    /// Amber floor activity
    pub activity_warm: MaterialHandle,
    /// Blue floor activity
    pub activity_cool: MaterialHandle,
}

impl MaterialPalette {
    /// Allocate the palette in `registry`
    pub fn allocate(registry: &mut ResourceRegistry) -> Self {
        let mut add = |material: Material| registry.material(material);
        Self {
            wall: add(Material::new().with_hex(0x00F5_F5F4).with_roughness(0.8)),
            wall_accent: add(Material::new().with_hex(AMBER).with_roughness(0.7)),
            floor: add(Material::new().with_hex(0x00E7_E5E4).with_roughness(1.0)),
            desk: add(Material::new().with_hex(0x00D4_A373).with_roughness(0.6)),
            chair: add(Material::new().with_hex(0x0033_4155).with_roughness(0.9)),
            monitor: add(Material::new().with_hex(0x000F_172A).with_roughness(0.2).with_metallic(0.8)),
            screen: add(Material::new().with_hex(0x001C_1917).with_emissive(AMBER, 0.8)),
            metal: add(Material::new().with_hex(0x00CB_D5E1).with_metallic(0.9).with_roughness(0.1)),
            glass: add(
                Material::new()
                    .with_hex(SKY)
                    .with_alpha(0.4)
                    .with_roughness(0.1)
                    .with_transmission(0.8, 1.5, 1.2),
            ),
            plant: add(Material::new().with_hex(0x0016_6534).with_roughness(1.0)),
            core: add(Material::new().with_hex(0x001E_293B).with_roughness(0.4)),
            sensor: add(Material::new().with_hex(AMBER).with_emissive(AMBER, 3.0)),
            activity_warm: add(Material::new().with_hex(AMBER).with_emissive(AMBER, 0.5)),
            activity_cool: add(Material::new().with_hex(SKY).with_emissive(SKY, 0.5)),
        }
    }
}
