//! Sub-mesh data: skinned source meshes, per-frame vertex snapshots and the
//! merged static mesh handed to artifact sinks.

use glam::{Affine3A, Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::errors::{BakeError, Result};

/// Deformed vertices of one sub-mesh at one sampled time, in the sub-mesh's
/// fixed vertex order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexSnapshot {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

impl VertexSnapshot {
    #[must_use]
    pub fn with_capacity(vertex_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count),
            normals: Vec::with_capacity(vertex_count),
        }
    }

    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Applies an affine transform to every vertex in place. Normals go
    /// through the inverse-transpose so they stay perpendicular to the
    /// surface under non-uniform scale.
    pub fn transform(&mut self, matrix: &Affine3A) {
        for p in &mut self.positions {
            *p = matrix.transform_point3(*p);
        }
        let inverse_transpose = normal_matrix(Mat3::from(matrix.matrix3));
        for n in &mut self.normals {
            *n = (inverse_transpose * *n).normalize_or_zero();
        }
    }
}

/// Inverse-transpose of `m`, or `m` itself when it is singular.
#[must_use]
pub fn normal_matrix(m: Mat3) -> Mat3 {
    if m.determinant().abs() <= f32::EPSILON {
        return m;
    }
    m.inverse().transpose()
}

/// A skinned sub-mesh in bind pose.
///
/// Every attribute array has one entry per vertex. Up to four joint
/// influences per vertex.
#[derive(Debug, Clone)]
pub struct SkinnedSubMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub joints: Vec<[u16; 4]>,
    pub weights: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
}

impl SkinnedSubMesh {
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Checks attribute lengths, joint indices and triangle indices.
    pub fn validate(&self, joint_count: usize) -> Result<()> {
        let n = self.positions.len();
        if self.normals.len() != n || self.joints.len() != n || self.weights.len() != n {
            return Err(BakeError::InvalidRig(format!(
                "sub-mesh '{}': attribute lengths differ (positions {n}, normals {}, joints {}, weights {})",
                self.name,
                self.normals.len(),
                self.joints.len(),
                self.weights.len()
            )));
        }
        if let Some(joint) = self
            .joints
            .iter()
            .flatten()
            .find(|&&j| usize::from(j) >= joint_count)
        {
            return Err(BakeError::InvalidRig(format!(
                "sub-mesh '{}' references joint {joint}, skeleton has {joint_count}",
                self.name
            )));
        }
        if let Some(index) = self.indices.iter().find(|&&i| i as usize >= n) {
            return Err(BakeError::InvalidRig(format!(
                "sub-mesh '{}' index {index} out of range ({n} vertices)",
                self.name
            )));
        }
        Ok(())
    }

    /// Linear blend skinning with the given joint matrices.
    ///
    /// Weights are normalised per vertex; a vertex with no weight keeps its
    /// bind pose.
    #[must_use]
    pub fn skin(&self, joint_matrices: &[Mat4]) -> VertexSnapshot {
        let mut out = VertexSnapshot::with_capacity(self.vertex_count());
        let normal_matrices: Vec<Mat3> = joint_matrices
            .iter()
            .map(|m| normal_matrix(Mat3::from_mat4(*m)))
            .collect();

        for i in 0..self.vertex_count() {
            let position = self.positions[i];
            let normal = self.normals[i];
            let weights = self.weights[i];
            let total: f32 = weights.iter().sum();

            if total <= f32::EPSILON {
                out.positions.push(position);
                out.normals.push(normal);
                continue;
            }

            let mut pos = Vec3::ZERO;
            let mut norm = Vec3::ZERO;
            for (&joint, &weight) in self.joints[i].iter().zip(&weights) {
                if weight == 0.0 {
                    continue;
                }
                let joint = usize::from(joint);
                let m = joint_matrices.get(joint).copied().unwrap_or(Mat4::IDENTITY);
                let n = normal_matrices.get(joint).copied().unwrap_or(Mat3::IDENTITY);
                let w = weight / total;
                pos += m.transform_point3(position) * w;
                norm += (n * normal) * w;
            }

            out.positions.push(pos);
            out.normals.push(norm.normalize_or_zero());
        }

        out
    }
}

/// Vertex and index ranges of one sub-mesh inside a [`StaticMesh`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubMeshRange {
    pub name: String,
    pub base_vertex: usize,
    pub vertex_count: usize,
    pub first_index: usize,
    pub index_count: usize,
}

/// All sub-meshes merged into one renderable mesh.
///
/// Vertex `j` of this mesh is column `j` of every baked animation grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub submeshes: Vec<SubMeshRange>,
}

impl StaticMesh {
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Concatenates sub-meshes in order, rebasing each sub-mesh's indices onto
/// its first vertex in the merged buffer.
#[must_use]
pub fn combine_submeshes(submeshes: &[SkinnedSubMesh]) -> StaticMesh {
    let mut mesh = StaticMesh::default();

    for sub in submeshes {
        let base_vertex = mesh.positions.len();
        let first_index = mesh.indices.len();

        mesh.positions.extend_from_slice(&sub.positions);
        mesh.normals.extend_from_slice(&sub.normals);
        mesh.indices
            .extend(sub.indices.iter().map(|&i| i + base_vertex as u32));

        mesh.submeshes.push(SubMeshRange {
            name: sub.name.clone(),
            base_vertex,
            vertex_count: sub.vertex_count(),
            first_index,
            index_count: sub.indices.len(),
        });
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(name: &str, offset: f32) -> SkinnedSubMesh {
        SkinnedSubMesh {
            name: name.to_string(),
            positions: vec![
                Vec3::new(offset, 0.0, 0.0),
                Vec3::new(offset + 1.0, 0.0, 0.0),
                Vec3::new(offset + 1.0, 1.0, 0.0),
                Vec3::new(offset, 1.0, 0.0),
            ],
            normals: vec![Vec3::Z; 4],
            joints: vec![[0, 1, 0, 0]; 4],
            weights: vec![[0.5, 0.5, 0.0, 0.0]; 4],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    #[test]
    fn combine_rebases_indices() {
        let mesh = combine_submeshes(&[quad("a", 0.0), quad("b", 5.0)]);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(&mesh.indices[6..], &[4, 5, 6, 4, 6, 7]);
        assert_eq!(mesh.submeshes[1].base_vertex, 4);
        assert_eq!(mesh.submeshes[1].first_index, 6);
    }

    #[test]
    fn skin_blends_joint_matrices() {
        let sub = quad("a", 0.0);
        let matrices = [Mat4::IDENTITY, Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0))];
        let snapshot = sub.skin(&matrices);
        // Half identity, half +2Y
        assert!((snapshot.positions[0].y - 1.0).abs() < 1e-6);
        assert!((snapshot.normals[0] - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn unweighted_vertex_keeps_bind_pose() {
        let mut sub = quad("a", 0.0);
        sub.weights[2] = [0.0; 4];
        let snapshot = sub.skin(&[Mat4::from_translation(Vec3::X); 2]);
        assert_eq!(snapshot.positions[2], sub.positions[2]);
    }

    #[test]
    fn non_uniform_scale_keeps_normals_perpendicular() {
        let mut snapshot = VertexSnapshot {
            positions: vec![Vec3::ZERO],
            normals: vec![Vec3::new(1.0, 1.0, 0.0).normalize()],
        };
        snapshot.transform(&Affine3A::from_scale(Vec3::new(2.0, 1.0, 1.0)));
        let expected = Vec3::new(0.5, 1.0, 0.0).normalize();
        assert!((snapshot.normals[0] - expected).length() < 1e-5, "{}", snapshot.normals[0]);
    }

    #[test]
    fn skinned_normals_use_inverse_transpose() {
        let mut sub = quad("a", 0.0);
        sub.normals = vec![Vec3::new(1.0, 1.0, 0.0).normalize(); 4];
        sub.weights = vec![[1.0, 0.0, 0.0, 0.0]; 4];
        let snapshot = sub.skin(&[Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0)), Mat4::IDENTITY]);
        // Tangent along (1, -1, 0) scales to (2, -1, 0); the normal must stay perpendicular
        let tangent = Vec3::new(2.0, -1.0, 0.0);
        assert!(snapshot.normals[0].dot(tangent).abs() < 1e-5);
        assert!((snapshot.normals[0].length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn singular_matrix_falls_back_to_itself() {
        let flat = Mat3::from_diagonal(Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(normal_matrix(flat), flat);
    }

    #[test]
    fn validate_catches_bad_joint() {
        let sub = quad("a", 0.0);
        assert!(sub.validate(2).is_ok());
        assert!(matches!(sub.validate(1), Err(BakeError::InvalidRig(_))));
    }
}
