//! Primitive geometry and tessellated meshes
//!
//! Scene nodes reference a `Geometry` descriptor (a box, cylinder or sphere
//! with its parameters). Backends that upload vertex buffers turn a
//! descriptor into a `Mesh` with `Mesh::from_geometry`. All primitives are
//! centered on their local origin.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::Vec3;

/// Parametric primitive shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    /// Axis-aligned box
    Box {
        /// Extent along X
        width: f32,
        /// Extent along Y
        height: f32,
        /// Extent along Z
        depth: f32,
    },
    /// Y-aligned cylinder (or truncated cone)
    Cylinder {
        /// Radius of the top cap
        radius_top: f32,
        /// Radius of the bottom cap
        radius_bottom: f32,
        /// Extent along Y
        height: f32,
        /// Number of faces around the circumference
        radial_segments: u32,
    },
    /// UV sphere
    Sphere {
        /// Sphere radius
        radius: f32,
        /// Segments around the equator
        width_segments: u32,
        /// Segments from pole to pole
        height_segments: u32,
    },
}

impl Geometry {
    /// Box primitive
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Self::Box { width, height, depth }
    }

    /// Straight cylinder primitive
    pub fn cylinder(radius: f32, height: f32, radial_segments: u32) -> Self {
        Self::Cylinder {
            radius_top: radius,
            radius_bottom: radius,
            height,
            radial_segments: radial_segments.max(3),
        }
    }

    /// Sphere primitive
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self::Sphere {
            radius,
            width_segments: width_segments.max(3),
            height_segments: height_segments.max(2),
        }
    }

    /// Full height of the primitive along Y
    pub fn height(&self) -> f32 {
        match *self {
            Self::Box { height, .. } | Self::Cylinder { height, .. } => height,
            Self::Sphere { radius, .. } => radius * 2.0,
        }
    }

    /// Half extents of the local bounding box
    pub fn half_extents(&self) -> Vec3 {
        match *self {
            Self::Box { width, height, depth } => Vec3::new(width, height, depth) * 0.5,
            Self::Cylinder { radius_top, radius_bottom, height, .. } => {
                let r = radius_top.max(radius_bottom);
                Vec3::new(r, height * 0.5, r)
            }
            Self::Sphere { radius, .. } => Vec3::new(radius, radius, radius),
        }
    }

    /// Number of triangles `Mesh::from_geometry` produces
    pub fn triangle_count(&self) -> u32 {
        match *self {
            Self::Box { .. } => 12,
            Self::Cylinder { radial_segments, .. } => radial_segments * 4,
            Self::Sphere { width_segments, height_segments, .. } => {
                width_segments * height_segments.saturating_sub(1) * 2
            }
        }
    }
}

/// 3D vertex data structure for rendering
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in 3D space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self { position, normal, tex_coord }
    }
}

/// Triangle mesh: vertices plus a triangle-list index buffer
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex data
    pub vertices: Vec<Vertex>,

    /// Index data for triangles
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new mesh
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Tessellate a primitive descriptor
    pub fn from_geometry(geometry: &Geometry) -> Self {
        match *geometry {
            Geometry::Box { width, height, depth } => Self::cuboid(width, height, depth),
            Geometry::Cylinder { radius_top, radius_bottom, height, radial_segments } => {
                Self::cylinder(radius_top, radius_bottom, height, radial_segments)
            }
            Geometry::Sphere { radius, width_segments, height_segments } => {
                Self::sphere(radius, width_segments, height_segments)
            }
        }
    }

    /// Number of triangles in the index buffer
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Raw vertex bytes ready for a GPU upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let (hx, hy, hz) = (width * 0.5, height * 0.5, depth * 0.5);
        // (normal, tangent u, tangent v) per face; corners are n ± u ± v
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (n, u, v) in faces {
            let base = vertices.len() as u32;
            for (su, sv, uv) in [(-1.0, -1.0, [0.0, 1.0]), (1.0, -1.0, [1.0, 1.0]), (1.0, 1.0, [1.0, 0.0]), (-1.0, 1.0, [0.0, 0.0])] {
                let position = [
                    (n[0] + u[0] * su + v[0] * sv) * hx,
                    (n[1] + u[1] * su + v[1] * sv) * hy,
                    (n[2] + u[2] * su + v[2] * sv) * hz,
                ];
                vertices.push(Vertex::new(position, n, uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::new(vertices, indices)
    }

    fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, segments: u32) -> Self {
        let half = height * 0.5;
        let slope = (radius_bottom - radius_top) / height.max(f32::EPSILON);
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        // Side: two rings with outward normals
        for i in 0..=segments {
            let u = i as f32 / segments as f32;
            let theta = u * std::f32::consts::TAU;
            let (sin, cos) = theta.sin_cos();
            let normal = Vec3::new(sin, slope, cos).normalize();
            let n = [normal.x, normal.y, normal.z];
            vertices.push(Vertex::new([radius_top * sin, half, radius_top * cos], n, [u, 0.0]));
            vertices.push(Vertex::new([radius_bottom * sin, -half, radius_bottom * cos], n, [u, 1.0]));
        }
        for i in 0..segments {
            let top = i * 2;
            let bottom = top + 1;
            let next_top = top + 2;
            let next_bottom = top + 3;
            indices.extend_from_slice(&[top, bottom, next_bottom, top, next_bottom, next_top]);
        }

        // Caps: center fan
        for (y, radius, ny) in [(half, radius_top, 1.0_f32), (-half, radius_bottom, -1.0)] {
            let center = vertices.len() as u32;
            vertices.push(Vertex::new([0.0, y, 0.0], [0.0, ny, 0.0], [0.5, 0.5]));
            for i in 0..segments {
                let theta = i as f32 / segments as f32 * std::f32::consts::TAU;
                let (sin, cos) = theta.sin_cos();
                vertices.push(Vertex::new(
                    [radius * sin, y, radius * cos],
                    [0.0, ny, 0.0],
                    [0.5 + sin * 0.5, 0.5 + cos * 0.5],
                ));
            }
            for i in 0..segments {
                let a = center + 1 + i;
                let b = center + 1 + (i + 1) % segments;
                if ny > 0.0 {
                    indices.extend_from_slice(&[center, a, b]);
                } else {
                    indices.extend_from_slice(&[center, b, a]);
                }
            }
        }

        Self::new(vertices, indices)
    }

    fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
        let mut indices = Vec::new();

        for y in 0..=height_segments {
            let v = y as f32 / height_segments as f32;
            let phi = v * std::f32::consts::PI;
            for x in 0..=width_segments {
                let u = x as f32 / width_segments as f32;
                let theta = u * std::f32::consts::TAU;
                let normal = [-theta.cos() * phi.sin(), phi.cos(), theta.sin() * phi.sin()];
                let position = [normal[0] * radius, normal[1] * radius, normal[2] * radius];
                vertices.push(Vertex::new(position, normal, [u, v]));
            }
        }

        let row = width_segments + 1;
        for y in 0..height_segments {
            for x in 0..width_segments {
                let a = y * row + x + 1;
                let b = y * row + x;
                let c = (y + 1) * row + x;
                let d = (y + 1) * row + x + 1;
                // Degenerate triangles at the poles are skipped
                if y != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if y != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self::new(vertices, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_unit_normals(mesh: &Mesh) {
        for vertex in &mesh.vertices {
            let n = Vec3::from(vertex.normal);
            assert!((n.magnitude() - 1.0).abs() < 1e-4, "normal {:?} is not unit length", vertex.normal);
        }
    }

    #[test]
    fn test_box_tessellation() {
        let geometry = Geometry::cuboid(2.0, 4.0, 6.0);
        let mesh = Mesh::from_geometry(&geometry);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangle_count() as u32, geometry.triangle_count());
        assert_unit_normals(&mesh);

        let max_y = mesh.vertices.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        assert!((max_y - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_cylinder_tessellation() {
        let geometry = Geometry::cylinder(0.25, 0.6, 12);
        let mesh = Mesh::from_geometry(&geometry);
        assert_eq!(mesh.triangle_count() as u32, geometry.triangle_count());
        assert_unit_normals(&mesh);
        assert!(mesh.indices.iter().all(|i| (*i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn test_sphere_tessellation() {
        let geometry = Geometry::sphere(0.4, 8, 8);
        let mesh = Mesh::from_geometry(&geometry);
        assert_eq!(mesh.vertices.len(), 81);
        assert_eq!(mesh.triangle_count() as u32, geometry.triangle_count());
        assert_unit_normals(&mesh);
    }

    #[test]
    fn test_vertex_bytes_length() {
        let mesh = Mesh::from_geometry(&Geometry::cuboid(1.0, 1.0, 1.0));
        assert_eq!(mesh.vertex_bytes().len(), 24 * std::mem::size_of::<Vertex>());
    }

    #[test]
    fn test_degenerate_sphere_counts_no_triangles() {
        let geometry = Geometry::Sphere { radius: 1.0, width_segments: 8, height_segments: 0 };
        assert_eq!(geometry.triangle_count(), 0);
        assert_eq!(Mesh::from_geometry(&geometry).triangle_count(), 0);
    }

    #[test]
    fn test_half_extents() {
        assert_eq!(Geometry::sphere(0.5, 8, 8).half_extents(), Vec3::new(0.5, 0.5, 0.5));
        assert_eq!(Geometry::cuboid(2.0, 1.0, 4.0).height(), 1.0);
    }
}
