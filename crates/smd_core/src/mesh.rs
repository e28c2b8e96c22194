//! Mesh geometry representation for imported SMD models.
//!
//! A `Mesh` owns flat, index-aligned vertex arrays (positions, normals,
//! UVs, tangents), one index buffer per material slot, and optional
//! skinning data. It is GPU-agnostic; `vertex_buffer()` and
//! `skinned_vertex_buffer()` produce interleaved `Pod` vertices that can
//! be uploaded with `bytemuck::cast_slice`.

use bytemuck::{Pod, Zeroable};
use smd_math::{Aabb, Mat4, Vec2, Vec3, Vec4};

/// Maximum number of bone influences stored per vertex.
pub const MAX_BONE_INFLUENCES: usize = 4;

/// Up to four (bone index, weight) influences for one vertex.
///
/// Unused slots hold bone 0 with weight 0.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoneWeight {
    pub bone_indices: [i32; MAX_BONE_INFLUENCES],
    pub weights: [f32; MAX_BONE_INFLUENCES],
}

impl BoneWeight {
    /// Write one influence slot. Slots past the fourth are ignored.
    pub fn set(&mut self, slot: usize, bone_index: i32, weight: f32) {
        if slot < MAX_BONE_INFLUENCES {
            self.bone_indices[slot] = bone_index;
            self.weights[slot] = weight;
        }
    }

    /// Sum of all four weights.
    pub fn total_weight(&self) -> f32 {
        self.weights.iter().sum()
    }

    /// Influences with a non-zero weight, in slot order.
    pub fn influences(&self) -> impl Iterator<Item = (i32, f32)> + '_ {
        self.bone_indices
            .iter()
            .copied()
            .zip(self.weights.iter().copied())
            .filter(|&(_, w)| w != 0.0)
    }
}

/// Triangle indices rendered with a single material.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubMesh {
    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,
}

impl SubMesh {
    pub fn new(indices: Vec<u32>) -> Self {
        Self { indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Skinning data for a rigged mesh.
#[derive(Clone, Debug, Default)]
pub struct Skin {
    /// One entry per vertex
    pub bone_weights: Vec<BoneWeight>,

    /// One inverse bind matrix per bone, in bone table order
    pub bind_poses: Vec<Mat4>,
}

/// An indexed triangle mesh partitioned into submeshes.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,

    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals, taken from the source file as-is
    pub normals: Vec<Vec3>,

    /// UV coordinates (one per vertex)
    pub uvs: Vec<Vec2>,

    /// Tangents with handedness in `w`; empty until `recalculate_tangents()`
    pub tangents: Vec<Vec4>,

    /// One index buffer per material slot
    pub submeshes: Vec<SubMesh>,

    /// Present only for rigged meshes
    pub skin: Option<Skin>,

    /// Axis-aligned bounding box
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a mesh from parallel vertex arrays. Submeshes start empty.
    pub fn new(
        name: impl Into<String>,
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        uvs: Vec<Vec2>,
    ) -> Self {
        let bounds = Aabb::from_positions(&positions);
        Self {
            name: name.into(),
            positions,
            normals,
            uvs,
            tangents: Vec::new(),
            submeshes: Vec::new(),
            skin: None,
            bounds,
        }
    }

    pub fn set_submeshes(&mut self, submeshes: Vec<SubMesh>) {
        self.submeshes = submeshes;
    }

    pub fn set_skin(&mut self, skin: Skin) {
        self.skin = Some(skin);
    }

    /// Recompute the bounding box from the current positions.
    pub fn recalculate_bounds(&mut self) {
        self.bounds = Aabb::from_positions(&self.positions);
    }

    /// Recompute per-vertex tangents from positions, UVs and the stored normals.
    ///
    /// Triangle UV derivatives are accumulated per vertex, then
    /// orthogonalised against the normal. `w` holds the bitangent sign.
    pub fn recalculate_tangents(&mut self) {
        let vertex_count = self.positions.len();
        let mut tan_u = vec![Vec3::ZERO; vertex_count];
        let mut tan_v = vec![Vec3::ZERO; vertex_count];

        for [a, b, c] in self.triangles() {
            let (i0, i1, i2) = (a as usize, b as usize, c as usize);
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }
            let (Some(&uv0), Some(&uv1), Some(&uv2)) =
                (self.uvs.get(i0), self.uvs.get(i1), self.uvs.get(i2))
            else {
                continue;
            };

            let edge1 = self.positions[i1] - self.positions[i0];
            let edge2 = self.positions[i2] - self.positions[i0];
            let duv1 = uv1 - uv0;
            let duv2 = uv2 - uv0;

            let det = duv1.x * duv2.y - duv2.x * duv1.y;
            if det.abs() <= f32::EPSILON {
                continue;
            }
            let r = 1.0 / det;

            let sdir = (edge1 * duv2.y - edge2 * duv1.y) * r;
            let tdir = (edge2 * duv1.x - edge1 * duv2.x) * r;

            for i in [i0, i1, i2] {
                tan_u[i] += sdir;
                tan_v[i] += tdir;
            }
        }

        self.tangents = (0..vertex_count)
            .map(|i| {
                let n = self
                    .normals
                    .get(i)
                    .copied()
                    .unwrap_or(Vec3::ZERO)
                    .normalize_or_zero();
                let n = if n == Vec3::ZERO { Vec3::Z } else { n };
                let t = tan_u[i];

                let mut tangent = (t - n * n.dot(t)).normalize_or_zero();
                if tangent == Vec3::ZERO {
                    tangent = n.any_orthonormal_vector();
                }

                let w = if n.cross(t).dot(tan_v[i]) < 0.0 { -1.0 } else { 1.0 };
                tangent.extend(w)
            })
            .collect();
    }

    /// Iterate over every triangle of every submesh, in submesh order.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.submeshes
            .iter()
            .flat_map(|s| s.indices.chunks_exact(3))
            .map(|c| [c[0], c[1], c[2]])
    }

    pub fn is_skinned(&self) -> bool {
        self.skin.is_some()
    }

    /// Get the number of triangles across all submeshes.
    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(SubMesh::triangle_count).sum()
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    /// Extract triangle vertices as flat array of [Vec3; 3] triplets.
    ///
    /// Triangles referencing out-of-range vertices are skipped with a warning.
    pub fn extract_triangle_vertices(&self) -> Vec<[Vec3; 3]> {
        let mut triangles = Vec::with_capacity(self.triangle_count());

        for [i0, i1, i2] in self.triangles() {
            let (i0, i1, i2) = (i0 as usize, i1 as usize, i2 as usize);
            if i0 >= self.positions.len()
                || i1 >= self.positions.len()
                || i2 >= self.positions.len()
            {
                log::warn!(
                    "Invalid triangle indices: [{}, {}, {}], vertex count: {}",
                    i0,
                    i1,
                    i2,
                    self.positions.len()
                );
                continue;
            }

            triangles.push([self.positions[i0], self.positions[i1], self.positions[i2]]);
        }

        triangles
    }

    /// Interleave the static vertex attributes for GPU upload.
    pub fn vertex_buffer(&self) -> Vec<MeshVertex> {
        (0..self.vertex_count())
            .map(|i| MeshVertex {
                position: self.positions[i].to_array(),
                normal: self.normals.get(i).copied().unwrap_or(Vec3::ZERO).to_array(),
                uv: self.uvs.get(i).copied().unwrap_or(Vec2::ZERO).to_array(),
                tangent: self.tangents.get(i).copied().unwrap_or(Vec4::ZERO).to_array(),
            })
            .collect()
    }

    /// Interleave vertex attributes plus bone influences. `None` for static meshes.
    pub fn skinned_vertex_buffer(&self) -> Option<Vec<SkinnedVertex>> {
        let skin = self.skin.as_ref()?;

        let vertices = self
            .vertex_buffer()
            .into_iter()
            .enumerate()
            .map(|(i, base)| {
                let weight = skin.bone_weights.get(i).copied().unwrap_or_default();
                SkinnedVertex {
                    position: base.position,
                    normal: base.normal,
                    uv: base.uv,
                    tangent: base.tangent,
                    joints: weight.bone_indices.map(|b| b.max(0) as u32),
                    weights: weight.weights,
                }
            })
            .collect();

        Some(vertices)
    }
}

/// Interleaved static vertex.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tangent: [f32; 4],
}

/// Interleaved skinned vertex.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SkinnedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tangent: [f32; 4],
    pub joints: [u32; 4],
    pub weights: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ];
        let normals = vec![Vec3::Z; 4];
        let uvs = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
        ];
        let mut mesh = Mesh::new("quad", positions, normals, uvs);
        mesh.set_submeshes(vec![SubMesh::new(vec![0, 1, 2]), SubMesh::new(vec![1, 3, 2])]);
        mesh
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = quad();

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.submesh_count(), 2);
        assert!(!mesh.is_skinned());
        assert!(mesh.tangents.is_empty());
    }

    #[test]
    fn test_triangles_follow_submesh_order() {
        let mesh = quad();
        let tris: Vec<_> = mesh.triangles().collect();
        assert_eq!(tris, vec![[0, 1, 2], [1, 3, 2]]);
    }

    #[test]
    fn test_bounds_computation() {
        let mut mesh = quad();
        mesh.positions.push(Vec3::new(-1.0, -2.0, -3.0));
        mesh.recalculate_bounds();

        assert_eq!(mesh.bounds.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(mesh.bounds.max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_recalculate_tangents() {
        let mut mesh = quad();
        mesh.recalculate_tangents();

        assert_eq!(mesh.tangents.len(), 4);
        for t in &mesh.tangents {
            assert!((t.truncate() - Vec3::X).length() < 0.001);
            assert_eq!(t.w, 1.0);
        }
    }

    #[test]
    fn test_tangents_mirrored_uvs() {
        let mut mesh = quad();
        for uv in &mut mesh.uvs {
            uv.y = -uv.y;
        }
        mesh.recalculate_tangents();

        for t in &mesh.tangents {
            assert_eq!(t.w, -1.0);
        }
    }

    #[test]
    fn test_tangents_degenerate_uvs() {
        let mut mesh = quad();
        mesh.uvs = vec![Vec2::ZERO; 4];
        mesh.recalculate_tangents();

        for t in &mesh.tangents {
            let tangent = t.truncate();
            assert!((tangent.length() - 1.0).abs() < 0.001);
            assert!(tangent.dot(Vec3::Z).abs() < 0.001);
        }
    }

    #[test]
    fn test_normals_are_not_touched() {
        let mut mesh = quad();
        mesh.normals[0] = Vec3::new(0.0, 1.0, 0.0);
        mesh.recalculate_tangents();
        mesh.recalculate_bounds();
        assert_eq!(mesh.normals[0], Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_extract_triangle_vertices() {
        let mesh = quad();
        let triangles = mesh.extract_triangle_vertices();

        assert_eq!(triangles.len(), 2);
        assert_eq!(triangles[1][0], mesh.positions[1]);
        assert_eq!(triangles[1][1], mesh.positions[3]);
        assert_eq!(triangles[1][2], mesh.positions[2]);
    }

    #[test]
    fn test_bone_weight_slots() {
        let mut weight = BoneWeight::default();
        weight.set(0, 3, 0.75);
        weight.set(2, 5, 0.25);
        weight.set(4, 9, 1.0);

        assert_eq!(weight.bone_indices, [3, 0, 5, 0]);
        assert!((weight.total_weight() - 1.0).abs() < 1e-6);
        let influences: Vec<_> = weight.influences().collect();
        assert_eq!(influences, vec![(3, 0.75), (5, 0.25)]);
    }

    #[test]
    fn test_vertex_buffers() {
        let mut mesh = quad();
        mesh.recalculate_tangents();
        assert!(mesh.skinned_vertex_buffer().is_none());

        let vertices = mesh.vertex_buffer();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[3].position, [1.0, 1.0, 0.0]);
        assert_eq!(bytemuck::cast_slice::<MeshVertex, u8>(&vertices).len(), 4 * 48);

        let mut weight = BoneWeight::default();
        weight.set(1, 2, 1.0);
        mesh.set_skin(Skin {
            bone_weights: vec![weight; 4],
            bind_poses: vec![Mat4::IDENTITY; 3],
        });
        let skinned = mesh.skinned_vertex_buffer().unwrap();
        assert_eq!(skinned[0].joints, [0, 2, 0, 0]);
        assert_eq!(skinned[0].weights, [0.0, 1.0, 0.0, 0.0]);
    }
}
