//! The posable-asset seam between the baker and whatever owns the rig.

use glam::Affine3A;

use crate::animation::AnimationClip;
use crate::errors::Result;
use crate::mesh::{StaticMesh, VertexSnapshot};

/// A rigged mesh made of one or more sub-meshes that can be posed at any
/// time of any of its clips.
///
/// Sub-mesh order and per-sub-mesh vertex counts must not change between
/// poses. Posing mutates internal pose state, so callers sample one clip at
/// a time; posing twice with the same `(clip, time)` must produce the same
/// snapshots.
pub trait AnimatableAsset {
    fn name(&self) -> &str;

    /// Vertex count of each sub-mesh, in the fixed sub-mesh order.
    fn submesh_vertex_counts(&self) -> Vec<usize>;

    fn clips(&self) -> &[AnimationClip];

    /// Poses the asset at `time` seconds into clip `clip`.
    fn pose(&mut self, clip: usize, time: f32) -> Result<()>;

    /// Deformed vertices of every sub-mesh for the current pose, in rig-root
    /// space.
    fn read_back(&self) -> Vec<VertexSnapshot>;

    /// Bind-pose geometry merged in the same sub-mesh order as
    /// [`read_back`](Self::read_back).
    fn merged_mesh(&self) -> StaticMesh;

    /// Rig-root to world transform.
    fn root_transform(&self) -> Affine3A {
        Affine3A::IDENTITY
    }

    fn total_vertex_count(&self) -> usize {
        self.submesh_vertex_counts().iter().sum()
    }
}
