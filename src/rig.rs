use glam::Affine3A;

use crate::animation::{AnimationClip, ClipBinding, TargetPath, TrackData};
use crate::asset::AnimatableAsset;
use crate::errors::{BakeError, Result};
use crate::mesh::{SkinnedSubMesh, StaticMesh, VertexSnapshot, combine_submeshes};
use crate::skeleton::Skeleton;

/// A skeleton, the sub-meshes it deforms and the clips that drive it.
///
/// This is the in-crate [`AnimatableAsset`]: posing resets the skeleton to
/// rest, applies every bound track sampled at the requested time, then
/// recomputes the skinning matrices. Reading back runs CPU linear blend
/// skinning over each sub-mesh.
#[derive(Debug, Clone)]
pub struct SkinnedRig {
    name: String,
    skeleton: Skeleton,
    submeshes: Vec<SkinnedSubMesh>,
    clips: Vec<AnimationClip>,
    // bindings[i] belongs to clips[i]
    bindings: Vec<ClipBinding>,
    root_transform: Affine3A,
}

impl SkinnedRig {
    pub fn new(
        name: &str,
        skeleton: Skeleton,
        submeshes: Vec<SkinnedSubMesh>,
        clips: Vec<AnimationClip>,
    ) -> Result<Self> {
        for sub in &submeshes {
            sub.validate(skeleton.joint_count())?;
        }

        let bindings = clips
            .iter()
            .map(|clip| ClipBinding::bind(&skeleton, clip))
            .collect();

        Ok(Self {
            name: name.to_string(),
            skeleton,
            submeshes,
            clips,
            bindings,
            root_transform: Affine3A::IDENTITY,
        })
    }

    #[must_use]
    pub fn with_root_transform(mut self, root_transform: Affine3A) -> Self {
        self.root_transform = root_transform;
        self
    }

    pub fn add_clip(&mut self, clip: AnimationClip) {
        self.bindings.push(ClipBinding::bind(&self.skeleton, &clip));
        self.clips.push(clip);
    }

    #[must_use]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    #[must_use]
    pub fn submeshes(&self) -> &[SkinnedSubMesh] {
        &self.submeshes
    }

    /// Returns the skeleton to its rest pose.
    pub fn reset_pose(&mut self) {
        self.skeleton.reset_to_rest();
        self.skeleton.update_world_matrices();
    }
}

impl AnimatableAsset for SkinnedRig {
    fn name(&self) -> &str {
        &self.name
    }

    fn submesh_vertex_counts(&self) -> Vec<usize> {
        self.submeshes.iter().map(SkinnedSubMesh::vertex_count).collect()
    }

    fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    fn pose(&mut self, clip: usize, time: f32) -> Result<()> {
        let count = self.clips.len();
        let (Some(anim), Some(binding)) = (self.clips.get(clip), self.bindings.get(clip)) else {
            return Err(BakeError::ClipIndexOutOfBounds { index: clip, count });
        };

        self.skeleton.reset_to_rest();

        for (track, joint) in anim.tracks.iter().zip(&binding.joints) {
            let Some(local) = (*joint).and_then(|j| self.skeleton.local_mut(j)) else {
                continue;
            };
            match (&track.data, track.target) {
                (TrackData::Vector3(t), TargetPath::Translation) => {
                    if let Some(v) = t.sample(time) {
                        local.translation = v;
                    }
                }
                (TrackData::Vector3(t), TargetPath::Scale) => {
                    if let Some(v) = t.sample(time) {
                        local.scale = v;
                    }
                }
                (TrackData::Quaternion(t), TargetPath::Rotation) => {
                    if let Some(q) = t.sample(time) {
                        local.rotation = q;
                    }
                }
                _ => {}
            }
        }

        self.skeleton.update_world_matrices();
        Ok(())
    }

    fn read_back(&self) -> Vec<VertexSnapshot> {
        let matrices = self.skeleton.joint_matrices();
        self.submeshes.iter().map(|sub| sub.skin(matrices)).collect()
    }

    fn merged_mesh(&self) -> StaticMesh {
        combine_submeshes(&self.submeshes)
    }

    fn root_transform(&self) -> Affine3A {
        self.root_transform
    }
}
