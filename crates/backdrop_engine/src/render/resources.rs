//! GPU-adjacent resource registry
//!
//! Geometry descriptors and materials are allocated here and referenced from
//! scene nodes by handle. Primitives that share a shape or a palette entry
//! share one allocation. Every allocation is released exactly once: a second
//! release of the same handle is a no-op, which is what makes scene disposal
//! safe to call twice.

use slotmap::{new_key_type, SlotMap};

use super::material::Material;
use super::mesh::Geometry;

new_key_type! {
    /// Handle to a geometry allocation
    pub struct GeometryHandle;

    /// Handle to a material allocation
    pub struct MaterialHandle;
}

/// Totals of live and released allocations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceStats {
    /// Geometries currently allocated
    pub live_geometries: usize,
    /// Materials currently allocated
    pub live_materials: usize,
    /// Geometries released since creation
    pub disposed_geometries: usize,
    /// Materials released since creation
    pub disposed_materials: usize,
}

impl ResourceStats {
    /// Sum of live allocations of every kind
    pub fn live_total(&self) -> usize {
        self.live_geometries + self.live_materials
    }
}

/// Owner of every geometry and material referenced by a scene graph
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    geometries: SlotMap<GeometryHandle, Geometry>,
    materials: SlotMap<MaterialHandle, Material>,
    disposed_geometries: usize,
    disposed_materials: usize,
}

impl ResourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a geometry, reusing an identical live allocation when present
    pub fn geometry(&mut self, geometry: Geometry) -> GeometryHandle {
        if let Some((handle, _)) = self.geometries.iter().find(|(_, g)| **g == geometry) {
            return handle;
        }
        self.geometries.insert(geometry)
    }

    /// Allocate a material. Materials are never deduplicated: palette entries
    /// are shared by handle, one-off materials get their own allocation.
    pub fn material(&mut self, material: Material) -> MaterialHandle {
        self.materials.insert(material)
    }

    /// Look up a geometry
    pub fn get_geometry(&self, handle: GeometryHandle) -> Option<&Geometry> {
        self.geometries.get(handle)
    }

    /// Look up a material
    pub fn get_material(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle)
    }

    /// Release a geometry; returns false if it was already released
    pub fn dispose_geometry(&mut self, handle: GeometryHandle) -> bool {
        let released = self.geometries.remove(handle).is_some();
        if released {
            self.disposed_geometries += 1;
        }
        released
    }

    /// Release a material; returns false if it was already released
    pub fn dispose_material(&mut self, handle: MaterialHandle) -> bool {
        let released = self.materials.remove(handle).is_some();
        if released {
            self.disposed_materials += 1;
        }
        released
    }

    /// Release anything still allocated, returning how many were freed
    pub fn dispose_all(&mut self) -> usize {
        let count = self.geometries.len() + self.materials.len();
        self.disposed_geometries += self.geometries.len();
        self.disposed_materials += self.materials.len();
        self.geometries.clear();
        self.materials.clear();
        count
    }

    /// Current allocation totals
    pub fn stats(&self) -> ResourceStats {
        ResourceStats {
            live_geometries: self.geometries.len(),
            live_materials: self.materials.len(),
            disposed_geometries: self.disposed_geometries,
            disposed_materials: self.disposed_materials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_geometry_is_shared() {
        let mut registry = ResourceRegistry::new();
        let a = registry.geometry(Geometry::cuboid(1.0, 2.0, 3.0));
        let b = registry.geometry(Geometry::cuboid(1.0, 2.0, 3.0));
        let c = registry.geometry(Geometry::cuboid(1.0, 2.0, 4.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(registry.stats().live_geometries, 2);
    }

    #[test]
    fn test_dispose_is_exactly_once() {
        let mut registry = ResourceRegistry::new();
        let handle = registry.material(Material::new());
        assert!(registry.dispose_material(handle));
        assert!(!registry.dispose_material(handle));
        let stats = registry.stats();
        assert_eq!(stats.live_materials, 0);
        assert_eq!(stats.disposed_materials, 1);
    }

    #[test]
    fn test_dispose_all() {
        let mut registry = ResourceRegistry::new();
        registry.geometry(Geometry::sphere(1.0, 8, 8));
        registry.material(Material::new());
        registry.material(Material::new());
        assert_eq!(registry.dispose_all(), 3);
        assert_eq!(registry.dispose_all(), 0);
        assert_eq!(registry.stats().live_total(), 0);
    }
}
