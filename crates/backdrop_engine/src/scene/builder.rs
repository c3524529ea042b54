//! Scene builder
//!
//! Constructs the two backdrop environments under one shared root:
//!
//! ```text
//! scene root
//!  └── root (panned and rotated by the animation driver)
//!       ├── workplace   open-plan office floor   (Mode A)
//!       └── building    nine-storey glass tower  (Mode B)
//! ```
//!
//! Construction takes nothing but the renderer settings (for fog and shadow
//! map size) and a random source. Randomness only perturbs cosmetic details
//! such as chair angles, sensor scatter and which corner of a floor is lit;
//! the layout itself is fixed.

use rand::Rng;

use super::palette::{MaterialPalette, AMBER, SKY};
use super::scene_graph::{Fog, Light, LightKind, MeshBinding, NodeId, SceneGraph, ShadowFlags};
use crate::foundation::math::{Transform, Vec3};
use crate::render::material::rgb_hex;
use crate::render::mesh::Geometry;
use crate::render::resources::MaterialHandle;
use crate::settings::RendererConfig;

const FLOOR_COUNT: usize = 9;
const FLOOR_HEIGHT: f32 = 2.8;
const PODIUM_HEIGHT: f32 = 1.8;
const SENSOR_COUNT: usize = 10;
const CYLINDER_SEGMENTS: u32 = 16;

/// Handles produced by a scene build
#[derive(Debug)]
pub struct BuiltScene {
    /// The graph, owning every node and resource
    pub graph: SceneGraph,
    /// Shared transform root both environments hang from
    pub root: NodeId,
    /// Workplace subtree (Mode A)
    pub workplace: NodeId,
    /// Building subtree (Mode B)
    pub building: NodeId,
}

/// Build both environments using the thread-local random source
pub fn build_scene(renderer: &RendererConfig) -> BuiltScene {
    build_scene_with_rng(renderer, &mut rand::thread_rng())
}

/// Build both environments with an explicit random source
pub fn build_scene_with_rng<R: Rng + ?Sized>(renderer: &RendererConfig, rng: &mut R) -> BuiltScene {
    let mut graph = SceneGraph::new();
    let palette = MaterialPalette::allocate(graph.resources_mut());

    let scene_root = graph.root();
    let root = add_group(&mut graph, scene_root);
    let workplace = add_group(&mut graph, root);
    let building = add_group(&mut graph, root);

    let mut assembler = Assembler { graph: &mut graph, palette, rng };
    assembler.workplace(workplace);
    assembler.building(building);

    add_lights(&mut graph, renderer);
    graph.set_fog(Some(Fog {
        color: renderer.fog.color,
        near: renderer.fog.near,
        far: renderer.fog.far,
    }));

    log::debug!(
        "Built backdrop scene: {} nodes, {} workplace meshes, {} building meshes, {} geometries, {} materials",
        graph.node_count(),
        graph.mesh_count(workplace),
        graph.mesh_count(building),
        graph.resources().stats().live_geometries,
        graph.resources().stats().live_materials
    );

    BuiltScene { graph, root, workplace, building }
}

// Parents created here always exist, so a failed attach is unreachable;
// fall back to the scene root rather than panicking.
fn add_group(graph: &mut SceneGraph, parent: NodeId) -> NodeId {
    graph.add_group(parent).unwrap_or_else(|| graph.root())
}

fn add_lights(graph: &mut SceneGraph, renderer: &RendererConfig) {
    graph.add_light(Light {
        kind: LightKind::Ambient,
        color: [1.0, 1.0, 1.0],
        intensity: 0.7,
        position: Vec3::zeros(),
    });
    graph.add_light(Light {
        kind: LightKind::Directional {
            cast_shadow: renderer.shadows,
            shadow_map_size: renderer.shadow_map_size,
        },
        color: [1.0, 1.0, 1.0],
        intensity: 1.8,
        position: Vec3::new(25.0, 50.0, 40.0),
    });
    graph.add_light(Light {
        kind: LightKind::Point { distance: 50.0 },
        color: rgb_hex(AMBER),
        intensity: 2.0,
        position: Vec3::new(0.0, 10.0, 0.0),
    });
    graph.add_light(Light {
        kind: LightKind::Directional {
            cast_shadow: false,
            shadow_map_size: 0,
        },
        color: rgb_hex(SKY),
        intensity: 0.6,
        position: Vec3::new(-30.0, 15.0, -30.0),
    });
}

struct Assembler<'a, R: Rng + ?Sized> {
    graph: &'a mut SceneGraph,
    palette: MaterialPalette,
    rng: &'a mut R,
}

impl<R: Rng + ?Sized> Assembler<'_, R> {
    fn group_at(&mut self, parent: NodeId, position: Vec3) -> NodeId {
        let id = add_group(self.graph, parent);
        if let Some(node) = self.graph.node_mut(id) {
            node.transform.position = position;
        }
        id
    }

    fn mesh(&mut self, parent: NodeId, geometry: Geometry, material: MaterialHandle, position: Vec3) -> NodeId {
        let geometry = self.graph.resources_mut().geometry(geometry);
        let binding = MeshBinding { geometry, material };
        self.graph
            .add_mesh(parent, binding, Transform::from_position(position), ShadowFlags::BOTH)
            .unwrap_or(parent)
    }

    /// Box resting on `y` (its base, not its center, sits at `y`)
    fn cuboid(&mut self, parent: NodeId, size: (f32, f32, f32), material: MaterialHandle, at: (f32, f32, f32)) -> NodeId {
        let (w, h, d) = size;
        let (x, y, z) = at;
        self.mesh(parent, Geometry::cuboid(w, h, d), material, Vec3::new(x, y + h * 0.5, z))
    }

    /// Cylinder resting on `y`
    fn cylinder(&mut self, parent: NodeId, radius: f32, height: f32, material: MaterialHandle, at: (f32, f32, f32)) -> NodeId {
        let (x, y, z) = at;
        self.mesh(
            parent,
            Geometry::cylinder(radius, height, CYLINDER_SEGMENTS),
            material,
            Vec3::new(x, y + height * 0.5, z),
        )
    }

    /// Sphere centered on the given point
    fn sphere(&mut self, parent: NodeId, radius: f32, segments: u32, material: MaterialHandle, at: (f32, f32, f32)) -> NodeId {
        let (x, y, z) = at;
        self.mesh(parent, Geometry::sphere(radius, segments, segments), material, Vec3::new(x, y, z))
    }

    fn workplace(&mut self, parent: NodeId) {
        let p = self.palette;

        // Shell
        self.cuboid(parent, (20.0, 0.4, 16.0), p.floor, (0.0, -0.2, 0.0));
        self.cuboid(parent, (0.3, 5.0, 16.0), p.wall, (-10.0, 0.0, 0.0));
        self.cuboid(parent, (12.0, 5.0, 0.3), p.wall, (-4.0, 0.0, -8.0));
        self.cuboid(parent, (4.0, 5.0, 0.3), p.wall_accent, (8.0, 0.0, -8.0));

        for i in 0..3 {
            for j in 0..2 {
                self.desk_unit(parent, -5.0 + i as f32 * 5.5, -3.0 + j as f32 * 5.5);
            }
        }

        self.plant(parent, -8.0, 4.0);
        self.plant(parent, 8.0, -5.0);

        for _ in 0..SENSOR_COUNT {
            let x = self.rng.gen_range(-9.0..9.0);
            let z = self.rng.gen_range(-7.0..7.0);
            self.sphere(parent, 0.12, 12, p.sensor, (x, 0.1, z));
        }
    }

    /// Desk with legs, monitor, chair and an accessory, centered on (x, z)
    fn desk_unit(&mut self, parent: NodeId, x: f32, z: f32) -> NodeId {
        let p = self.palette;
        let desk = self.group_at(parent, Vec3::new(x, 0.0, z));

        for (lx, lz) in [(-1.1, -0.6), (1.1, -0.6), (-1.1, 0.6), (1.1, 0.6)] {
            self.cuboid(desk, (0.08, 0.75, 0.08), p.metal, (lx, 0.0, lz));
        }
        self.cuboid(desk, (2.4, 0.1, 1.4), p.desk, (0.0, 0.75, 0.0));

        // Monitor: base, neck, casing, then a thin screen in front of the
        // casing so the two faces never share a depth
        self.cuboid(desk, (0.4, 0.05, 0.3), p.monitor, (0.0, 0.85, -0.4));
        self.cuboid(desk, (0.1, 0.4, 0.1), p.monitor, (0.0, 0.85, -0.45));
        self.cuboid(desk, (0.9, 0.55, 0.06), p.monitor, (0.0, 1.05, -0.4));
        self.cuboid(desk, (0.84, 0.49, 0.005), p.screen, (0.0, 1.05, -0.4 + 0.035));

        let chair = self.group_at(desk, Vec3::new(0.0, 0.0, 0.8));
        let swivel = self.rng.gen_range(-0.35..0.35);
        if let Some(node) = self.graph.node_mut(chair) {
            node.transform.rotation.y = swivel;
        }
        self.cuboid(chair, (0.6, 0.1, 0.6), p.chair, (0.0, 0.45, 0.0));
        self.cuboid(chair, (0.6, 0.8, 0.1), p.chair, (0.0, 0.45, 0.3));
        self.cylinder(chair, 0.05, 0.45, p.metal, (0.0, 0.0, 0.0));

        self.cuboid(desk, (0.3, 0.02, 0.2), p.wall_accent, (0.7, 0.85, 0.2));
        desk
    }

    /// Cylindrical pot with spherical foliage
    fn plant(&mut self, parent: NodeId, x: f32, z: f32) -> NodeId {
        let p = self.palette;
        let plant = self.group_at(parent, Vec3::new(x, 0.0, z));
        self.cylinder(plant, 0.25, 0.6, p.core, (0.0, 0.0, 0.0));
        self.sphere(plant, 0.4, 8, p.plant, (0.0, 0.9, 0.0));
        plant
    }

    /// Rooftop air handler: housing with a fan drum on top
    fn hvac_unit(&mut self, parent: NodeId, x: f32, y: f32, z: f32) -> NodeId {
        let p = self.palette;
        let unit = self.group_at(parent, Vec3::new(x, y, z));
        self.cuboid(unit, (1.6, 0.8, 1.2), p.metal, (0.0, 0.0, 0.0));
        self.cylinder(unit, 0.45, 0.1, p.core, (0.0, 0.8, 0.0));
        unit
    }

    fn building(&mut self, parent: NodeId) {
        let p = self.palette;

        self.cuboid(parent, (15.0, PODIUM_HEIGHT, 15.0), p.wall, (0.0, 0.0, 0.0));
        self.cuboid(parent, (6.0, 28.0, 6.0), p.core, (0.0, 0.0, 0.0));

        for i in 0..FLOOR_COUNT {
            let y = PODIUM_HEIGHT + i as f32 * FLOOR_HEIGHT;
            self.cuboid(parent, (12.5, 0.25, 12.5), p.floor, (0.0, y, 0.0));

            let activity = if i % 2 == 0 { p.activity_warm } else { p.activity_cool };
            let ax = self.rng.gen_range(-3.0..3.0);
            let az = self.rng.gen_range(-3.0..3.0);
            self.cuboid(parent, (3.0, 0.8, 3.0), activity, (ax, y + 0.3, az));

            self.cuboid(parent, (12.4, FLOOR_HEIGHT - 0.25, 12.4), p.glass, (0.0, y + 0.25, 0.0));

            self.cuboid(parent, (0.2, FLOOR_HEIGHT, 0.4), p.metal, (6.2, y, 0.0));
            self.cuboid(parent, (0.2, FLOOR_HEIGHT, 0.4), p.metal, (-6.2, y, 0.0));
            self.cuboid(parent, (0.4, FLOOR_HEIGHT, 0.2), p.metal, (0.0, y, 6.2));
            self.cuboid(parent, (0.4, FLOOR_HEIGHT, 0.2), p.metal, (0.0, y, -6.2));
        }

        // Crown, roof plant and spire
        self.cuboid(parent, (9.0, 4.0, 9.0), p.core, (0.0, 27.0, 0.0));
        self.hvac_unit(parent, -2.5, 31.0, -2.5);
        self.hvac_unit(parent, 2.5, 31.0, 2.5);
        self.cuboid(parent, (1.0, 6.0, 1.0), p.metal, (0.0, 31.0, 0.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn build() -> BuiltScene {
        build_scene_with_rng(&RendererConfig::default(), &mut StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_subtrees_hang_from_shared_root() {
        let scene = build();
        let root = scene.graph.node(scene.root).unwrap();
        assert_eq!(root.children(), &[scene.workplace, scene.building]);
        assert_eq!(root.parent(), Some(scene.graph.root()));
    }

    #[test]
    fn test_fixed_primitive_counts() {
        let scene = build();
        // shell 4 + 6 desks * 13 + 2 plants * 2 + 10 sensors
        assert_eq!(scene.graph.mesh_count(scene.workplace), 96);
        // podium + core + 9 floors * 7 + crown + 2 hvac * 2 + spire
        assert_eq!(scene.graph.mesh_count(scene.building), 71);
    }

    #[test]
    fn test_subtrees_are_disjoint() {
        let scene = build();
        let mut workplace_nodes = Vec::new();
        scene.graph.walk(scene.workplace, &mut |id, _| workplace_nodes.push(id));
        let mut overlap = 0;
        scene.graph.walk(scene.building, &mut |id, _| {
            if workplace_nodes.contains(&id) {
                overlap += 1;
            }
        });
        assert_eq!(overlap, 0);
    }

    #[test]
    fn test_random_detail_stays_on_the_floor() {
        for seed in 0..8 {
            let scene = build_scene_with_rng(&RendererConfig::default(), &mut StdRng::seed_from_u64(seed));
            for child in scene.graph.node(scene.workplace).unwrap().children() {
                let node = scene.graph.node(*child).unwrap();
                let p = node.transform.position;
                assert!(p.x.abs() <= 10.0 && p.z.abs() <= 8.0, "node escaped the floor at {p:?}");
            }
        }
    }

    #[test]
    fn test_lights_and_fog() {
        let scene = build();
        assert_eq!(scene.graph.lights().len(), 4);
        let fog = scene.graph.fog().unwrap();
        assert_eq!((fog.near, fog.far), (35.0, 160.0));
        assert!(matches!(
            scene.graph.lights()[1].kind,
            LightKind::Directional { cast_shadow: true, shadow_map_size: 2048 }
        ));
    }

    #[test]
    fn test_shapes_are_shared() {
        let scene = build();
        let stats = scene.graph.resources().stats();
        // 14 palette entries, and far fewer geometries than meshes
        assert_eq!(stats.live_materials, 14);
        assert!(stats.live_geometries < 167 / 2);
    }
}
