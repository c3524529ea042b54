//! Scene graph
//!
//! An arena-backed tree of transform nodes. Group nodes only carry a
//! transform; mesh nodes additionally reference a geometry and a material in
//! the graph's `ResourceRegistry`. Hiding a node hides its whole subtree and
//! the renderer never descends into it.

use bitflags::bitflags;
use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::{Mat4, Transform, Vec3};
use crate::render::resources::{GeometryHandle, MaterialHandle, ResourceRegistry};

new_key_type! {
    /// Handle to a node in a `SceneGraph`
    pub struct NodeId;
}

bitflags! {
    /// Shadow participation of a mesh node
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ShadowFlags: u8 {
        /// Node occludes light in shadow maps
        const CAST = 1 << 0;
        /// Node is darkened by shadows
        const RECEIVE = 1 << 1;
        /// Both
        const BOTH = Self::CAST.bits() | Self::RECEIVE.bits();
    }
}

/// Geometry + material pair drawn at a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBinding {
    /// Shape
    pub geometry: GeometryHandle,
    /// Surface
    pub material: MaterialHandle,
}

/// One node of the tree
#[derive(Debug, Clone)]
pub struct Node {
    /// Local transform relative to the parent
    pub transform: Transform,
    /// Hidden nodes are skipped together with their descendants
    pub visible: bool,
    /// Drawable payload; `None` for pure groups
    pub mesh: Option<MeshBinding>,
    /// Shadow participation
    pub shadows: ShadowFlags,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn group(parent: Option<NodeId>) -> Self {
        Self {
            transform: Transform::identity(),
            visible: true,
            mesh: None,
            shadows: ShadowFlags::empty(),
            parent,
            children: Vec::new(),
        }
    }

    /// Parent node, `None` for the scene root
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Direct children in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Light source kinds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Uniform fill light
    Ambient,
    /// Parallel light from `position` toward the origin
    Directional {
        /// Whether this light renders a shadow map
        cast_shadow: bool,
        /// Shadow map edge length in texels
        shadow_map_size: u32,
    },
    /// Omni light with a falloff distance
    Point {
        /// Distance at which the light reaches zero
        distance: f32,
    },
}

/// Light recorded on the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// Kind and kind-specific parameters
    pub kind: LightKind,
    /// Colour (RGB)
    pub color: [f32; 3],
    /// Intensity multiplier
    pub intensity: f32,
    /// World position (ignored for ambient lights)
    pub position: Vec3,
}

/// Linear distance fog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    /// Fog colour (RGB)
    pub color: [f32; 3],
    /// Start distance
    pub near: f32,
    /// Fully fogged distance
    pub far: f32,
}

/// Mesh node reached by a visible traversal, with its composed world matrix
#[derive(Debug, Clone, Copy)]
pub struct DrawItem {
    /// Node being drawn
    pub node: NodeId,
    /// What to draw
    pub mesh: MeshBinding,
    /// Local-to-world matrix
    pub world: Mat4,
    /// Shadow participation
    pub shadows: ShadowFlags,
}

/// What a disposal pass released
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisposalReport {
    /// Nodes removed from the arena
    pub nodes: usize,
    /// Geometry allocations released
    pub geometries: usize,
    /// Material allocations released
    pub materials: usize,
}

/// Scene graph with its resources, lights and fog
#[derive(Debug)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
    resources: ResourceRegistry,
    lights: Vec<Light>,
    fog: Option<Fog>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create a graph containing only the scene root
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::group(None));
        Self {
            nodes,
            root,
            resources: ResourceRegistry::new(),
            lights: Vec::new(),
            fog: None,
        }
    }

    /// The scene root
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Resource registry backing the mesh nodes
    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    /// Mutable access to the resource registry (for allocation)
    pub fn resources_mut(&mut self) -> &mut ResourceRegistry {
        &mut self.resources
    }

    /// Add an empty group under `parent`
    ///
    /// Returns `None` if `parent` does not exist.
    pub fn add_group(&mut self, parent: NodeId) -> Option<NodeId> {
        self.attach(parent, Node::group(Some(parent)))
    }

    /// Add a mesh node under `parent`
    ///
    /// Returns `None` if `parent` does not exist.
    pub fn add_mesh(&mut self, parent: NodeId, mesh: MeshBinding, transform: Transform, shadows: ShadowFlags) -> Option<NodeId> {
        let mut node = Node::group(Some(parent));
        node.mesh = Some(mesh);
        node.transform = transform;
        node.shadows = shadows;
        self.attach(parent, node)
    }

    fn attach(&mut self, parent: NodeId, node: Node) -> Option<NodeId> {
        if !self.nodes.contains_key(parent) {
            log::warn!("Tried to attach a node to a missing parent {parent:?}");
            return None;
        }
        let id = self.nodes.insert(node);
        self.nodes[parent].children.push(id);
        Some(id)
    }

    /// Record a light
    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Lights in insertion order
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Set or clear the scene fog
    pub fn set_fog(&mut self, fog: Option<Fog>) {
        self.fog = fog;
    }

    /// Scene fog
    pub fn fog(&self) -> Option<Fog> {
        self.fog
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look up a node mutably
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Total nodes in the arena, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of mesh nodes in the subtree rooted at `id`
    pub fn mesh_count(&self, id: NodeId) -> usize {
        let mut count = 0;
        self.walk(id, &mut |_, node| {
            if node.mesh.is_some() {
                count += 1;
            }
        });
        count
    }

    /// Depth-first pre-order walk over every node below and including `id`,
    /// visible or not
    pub fn walk(&self, id: NodeId, visit: &mut impl FnMut(NodeId, &Node)) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else { continue };
            visit(current, node);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    /// Local-to-world matrix of a node
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut matrix = self.nodes.get(id)?.transform.to_matrix();
        let mut parent = self.nodes[id].parent;
        while let Some(pid) = parent {
            let node = self.nodes.get(pid)?;
            matrix = node.transform.to_matrix() * matrix;
            parent = node.parent;
        }
        Some(matrix)
    }

    /// Whether a node and all of its ancestors are visible
    pub fn is_effectively_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(cid) = current {
            match self.nodes.get(cid) {
                Some(node) if node.visible => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Visit every visible node, composing world matrices on the way down.
    ///
    /// A hidden node is not visited and neither are its descendants. Returns
    /// the number of nodes visited.
    pub fn traverse_visible(&self, visit: &mut impl FnMut(NodeId, &Node, &Mat4)) -> usize {
        let mut visited = 0;
        let mut stack = vec![(self.root, Mat4::identity())];
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get(id) else { continue };
            if !node.visible {
                continue;
            }
            let world = parent_world * node.transform.to_matrix();
            visit(id, node, &world);
            visited += 1;
            for child in node.children.iter().rev() {
                stack.push((*child, world));
            }
        }
        visited
    }

    /// Collect every visible mesh node as a draw item
    pub fn collect_draws(&self) -> Vec<DrawItem> {
        let mut draws = Vec::new();
        self.traverse_visible(&mut |id, node, world| {
            if let Some(mesh) = node.mesh {
                draws.push(DrawItem {
                    node: id,
                    mesh,
                    world: *world,
                    shadows: node.shadows,
                });
            }
        });
        draws
    }

    /// Release every resource referenced from the tree and clear it
    ///
    /// Disposal walks the whole graph rather than trusting a list of
    /// allocation sites, so shared handles are released exactly once and
    /// nothing reachable is missed. Anything left in the registry afterwards
    /// was never attached to a node and is released as well. Calling this a
    /// second time releases nothing.
    pub fn dispose(&mut self) -> DisposalReport {
        let mut bindings = Vec::new();
        self.walk(self.root, &mut |_, node| {
            if let Some(mesh) = node.mesh {
                bindings.push(mesh);
            }
        });

        let mut report = DisposalReport::default();
        for binding in bindings {
            if self.resources.dispose_geometry(binding.geometry) {
                report.geometries += 1;
            }
            if self.resources.dispose_material(binding.material) {
                report.materials += 1;
            }
        }

        let orphans = self.resources.stats();
        if orphans.live_total() > 0 {
            log::warn!(
                "Releasing {} geometries and {} materials not attached to any node",
                orphans.live_geometries,
                orphans.live_materials
            );
            report.geometries += orphans.live_geometries;
            report.materials += orphans.live_materials;
            self.resources.dispose_all();
        }

        // Keep the root so the graph stays structurally valid
        report.nodes = self.nodes.len().saturating_sub(1);
        let root = self.root;
        self.nodes.retain(|id, _| id == root);
        if let Some(root) = self.nodes.get_mut(root) {
            root.children.clear();
        }
        self.lights.clear();
        self.fog = None;

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::material::Material;
    use crate::render::mesh::Geometry;
    use approx::assert_relative_eq;

    fn mesh(graph: &mut SceneGraph) -> MeshBinding {
        let geometry = graph.resources_mut().geometry(Geometry::cuboid(1.0, 1.0, 1.0));
        let material = graph.resources_mut().material(Material::new());
        MeshBinding { geometry, material }
    }

    #[test]
    fn test_world_matrix_composes_parents() {
        let mut graph = SceneGraph::new();
        let group = graph.add_group(graph.root()).unwrap();
        graph.node_mut(group).unwrap().transform.position = Vec3::new(0.0, 10.0, 0.0);
        graph.node_mut(group).unwrap().transform.set_uniform_scale(0.5);

        let binding = mesh(&mut graph);
        let leaf = graph
            .add_mesh(group, binding, Transform::from_position(Vec3::new(2.0, 0.0, 0.0)), ShadowFlags::BOTH)
            .unwrap();

        let world = graph.world_matrix(leaf).unwrap();
        let origin = world.transform_point(&crate::foundation::math::Point3::origin());
        assert_relative_eq!(origin.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(origin.y, 10.0, epsilon = 1e-6);
    }

    #[test]
    fn test_hidden_subtree_is_not_traversed() {
        let mut graph = SceneGraph::new();
        let shown = graph.add_group(graph.root()).unwrap();
        let hidden = graph.add_group(graph.root()).unwrap();
        for parent in [shown, hidden, hidden] {
            let binding = mesh(&mut graph);
            graph.add_mesh(parent, binding, Transform::identity(), ShadowFlags::empty()).unwrap();
        }
        graph.node_mut(hidden).unwrap().visible = false;

        let mut visited = Vec::new();
        let count = graph.traverse_visible(&mut |id, _, _| visited.push(id));
        assert_eq!(count, 3); // root, shown group, its mesh
        assert!(!visited.contains(&hidden));
        assert_eq!(graph.collect_draws().len(), 1);
        assert_eq!(graph.mesh_count(hidden), 2);
    }

    #[test]
    fn test_dispose_releases_shared_handles_once() {
        let mut graph = SceneGraph::new();
        let geometry = graph.resources_mut().geometry(Geometry::cuboid(1.0, 1.0, 1.0));
        let material = graph.resources_mut().material(Material::new());
        let shared = MeshBinding { geometry, material };
        for _ in 0..4 {
            graph.add_mesh(graph.root(), shared, Transform::identity(), ShadowFlags::empty()).unwrap();
        }
        let orphan = graph.resources_mut().material(Material::new());

        let report = graph.dispose();
        assert_eq!(report.nodes, 4);
        assert_eq!(report.geometries, 1);
        assert_eq!(report.materials, 2);
        assert!(graph.resources().get_material(orphan).is_none());
        assert_eq!(graph.node_count(), 1);

        assert_eq!(graph.dispose(), DisposalReport::default());
    }

    #[test]
    fn test_add_to_missing_parent() {
        let mut graph = SceneGraph::new();
        let group = graph.add_group(graph.root()).unwrap();
        graph.dispose();
        assert!(graph.add_group(group).is_none());
    }
}
