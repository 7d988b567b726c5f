use rustc_hash::FxHashSet;

use crate::asset::AnimatableAsset;
use crate::errors::BakeError;

/// Result of enumerating an asset's clips.
#[derive(Debug, Default)]
pub struct ClipSet {
    /// Indices into [`AnimatableAsset::clips`] of bakeable clips, in asset
    /// order.
    pub bakeable: Vec<usize>,
    /// Clips that cannot be baked, with the reason.
    pub rejected: Vec<(String, BakeError)>,
}

/// Lists the distinct clips of `asset` and sorts out the ones that are not
/// plain time-indexed poses.
///
/// Clips are distinguished by name; a repeated name keeps its first
/// occurrence.
pub fn enumerate_clips<A: AnimatableAsset + ?Sized>(asset: &A) -> ClipSet {
    let mut set = ClipSet::default();
    let mut seen = FxHashSet::default();

    for (index, clip) in asset.clips().iter().enumerate() {
        if !seen.insert(clip.name.as_str()) {
            log::warn!(
                "Asset '{}': duplicate clip name '{}' (#{index}) ignored",
                asset.name(),
                clip.name
            );
            continue;
        }

        if clip.kind.is_time_indexed() {
            set.bakeable.push(index);
        } else {
            set.rejected.push((
                clip.name.clone(),
                BakeError::UnsupportedClip {
                    clip: clip.name.clone(),
                    kind: clip.kind,
                },
            ));
        }
    }

    set
}
