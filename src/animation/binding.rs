use crate::animation::clip::AnimationClip;
use crate::skeleton::Skeleton;

/// Track-to-joint resolution for one clip on one skeleton.
///
/// `joints[i]` is the joint driven by `clip.tracks[i]`, or `None` when the
/// skeleton has no joint of that name.
#[derive(Debug, Clone, Default)]
pub struct ClipBinding {
    pub joints: Vec<Option<usize>>,
}

impl ClipBinding {
    pub fn bind(skeleton: &Skeleton, clip: &AnimationClip) -> Self {
        let joints = clip
            .tracks
            .iter()
            .map(|track| {
                let joint = skeleton.find_joint(&track.joint);
                if joint.is_none() {
                    log::debug!(
                        "Clip '{}': no joint named '{}', track ignored",
                        clip.name,
                        track.joint
                    );
                }
                joint
            })
            .collect();

        Self { joints }
    }

    /// Number of tracks that found a joint.
    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.joints.iter().filter(|j| j.is_some()).count()
    }
}
