use crate::model::ModelGeometry;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::collections::HashSet;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    };
}

/// Shell geometry ready for upload: flat-shaded faces plus a unique edge list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<u32>,
    /// Line list indices, one pair per shared edge.
    pub edges: Vec<u32>,
}

impl MeshData {
    /// Builds mesh data from validated geometry. Each face gets its own vertex
    /// copies so its normal stays flat; polygons are fan-triangulated.
    pub fn from_geometry(model: &ModelGeometry) -> Self {
        let mut mesh = MeshData::default();
        let mut seen_edges = HashSet::new();

        for face in &model.faces {
            let corners: Vec<Vec3> = face
                .iter()
                .filter_map(|&i| model.vertices.get(i as usize).copied())
                .collect();
            if corners.len() < 3 || corners.len() != face.len() {
                continue;
            }

            let normal = face_normal(&corners);
            let base = mesh.vertices.len() as u32;
            mesh.vertices.extend(corners.iter().map(|p| Vertex {
                position: p.to_array(),
                normal: normal.to_array(),
            }));

            for i in 1..corners.len() as u32 - 1 {
                mesh.triangles.extend_from_slice(&[base, base + i, base + i + 1]);
            }

            for (i, &a) in face.iter().enumerate() {
                let next = (i + 1) % face.len();
                let b = face[next];
                if seen_edges.insert((a.min(b), a.max(b))) {
                    mesh.edges.extend_from_slice(&[base + i as u32, base + next as u32]);
                }
            }
        }

        mesh
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len() / 2
    }
}

/// Newell's method; robust for slightly non-planar polygons.
fn face_normal(corners: &[Vec3]) -> Vec3 {
    let mut normal = Vec3::ZERO;
    for (i, current) in corners.iter().enumerate() {
        let next = corners[(i + 1) % corners.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal.normalize_or(Vec3::Z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::shapes::dodecahedron;
    use approx::assert_relative_eq;

    fn two_triangles() -> ModelGeometry {
        ModelGeometry::builder()
            .led(Vec3::ZERO)
            .vertices([
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ])
            .face([0, 1, 2])
            .face([0, 2, 3])
            .build()
    }

    #[test]
    fn shared_edges_are_emitted_once() {
        let mesh = MeshData::from_geometry(&two_triangles());
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.edge_count(), 5);
    }

    #[test]
    fn counter_clockwise_face_points_up_z() {
        let mesh = MeshData::from_geometry(&two_triangles());
        for vertex in &mesh.vertices {
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn polygons_are_fan_triangulated() {
        let model = ModelGeometry::builder()
            .led(Vec3::ZERO)
            .vertices([Vec3::X, Vec3::Y, Vec3::NEG_X, Vec3::NEG_Y, Vec3::new(0.5, -0.5, 0.0)])
            .face([0, 1, 2, 3, 4])
            .build();
        let mesh = MeshData::from_geometry(&model);
        assert_eq!(mesh.triangles, vec![0, 1, 2, 0, 2, 3, 0, 3, 4]);
        assert_eq!(mesh.edge_count(), 5);
    }

    #[test]
    fn dodecahedron_normals_point_outward() {
        let model = dodecahedron(10.0, 1);
        let mesh = MeshData::from_geometry(&model);
        assert_eq!(mesh.triangle_count(), 36);
        assert_eq!(mesh.edge_count(), 30);
        for vertex in &mesh.vertices {
            let position = Vec3::from_array(vertex.position);
            let normal = Vec3::from_array(vertex.normal);
            assert_relative_eq!(normal.length(), 1.0, epsilon = 1e-5);
            assert!(normal.dot(position) > 0.0);
        }
    }

    #[test]
    fn no_faces_is_empty() {
        let model = ModelGeometry::builder().led(Vec3::ZERO).build();
        assert!(MeshData::from_geometry(&model).is_empty());
    }
}
