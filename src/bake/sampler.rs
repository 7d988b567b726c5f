//! Frame sampling: how many rows a clip gets, at which times, and the
//! per-frame vertex snapshots.

use crate::animation::AnimationClip;
use crate::asset::AnimatableAsset;
use crate::config::{BakeSettings, VertexSpace};
use crate::errors::{BakeError, GridAxis, Result};
use crate::mesh::VertexSnapshot;

// Rounding slack for `sample_rate * duration`, in f32 ULPs of the product.
// Covers the error of two f32 inputs (e.g. 29.999998 for 30) and nothing
// more, so genuinely fractional frame counts still floor.
const FRAME_ULPS: f64 = 4.0;

/// `floor(rate * duration) + 1`, tolerant of f32 representation error.
fn raw_frame_count(rate: f32, duration: f32) -> f64 {
    let product = f64::from(rate) * f64::from(duration);
    let slack = product.abs() * f64::from(f32::EPSILON) * FRAME_ULPS;
    (product + slack).floor() + 1.0
}

/// Frame count and spacing for one clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameLayout {
    /// Number of rows; always a power of two.
    pub frame_count: u32,
    /// Seconds between consecutive rows; `0.0` for a single-row clip.
    pub interval: f32,
    pub duration: f32,
}

impl FrameLayout {
    /// Computes the layout for `clip`:
    ///
    /// `frame_count = next_pow2(floor(rate * duration) + 1)` and
    /// `interval = duration / (frame_count - 1)`.
    ///
    /// The `+ 1` keeps both ends of the clip. A product within a few f32 ULPs
    /// below an integer counts as that integer. Rounding always goes up, so the
    /// grid never holds fewer rows than the clip has native frames.
    pub fn for_clip(clip: &AnimationClip, settings: &BakeSettings) -> Result<Self> {
        let duration = clip.duration;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(BakeError::DegenerateClip {
                clip: clip.name.clone(),
                reason: format!("duration is {duration}"),
            });
        }

        let rate = settings.effective_sample_rate(clip.sample_rate);
        if !rate.is_finite() || rate <= 0.0 {
            return Err(BakeError::DegenerateClip {
                clip: clip.name.clone(),
                reason: format!("sample rate is {rate}"),
            });
        }

        let max = settings.max_texture_dimension;
        let raw = raw_frame_count(rate, duration);
        if raw > f64::from(max) {
            let size = if raw < 9.0e18 {
                (raw as u64).checked_next_power_of_two().unwrap_or(u64::MAX)
            } else {
                u64::MAX
            };
            return Err(BakeError::DimensionOverflow {
                clip: clip.name.clone(),
                axis: GridAxis::Height,
                size,
                max,
            });
        }

        let frame_count = (raw as u64).next_power_of_two();
        if frame_count > u64::from(max) {
            return Err(BakeError::DimensionOverflow {
                clip: clip.name.clone(),
                axis: GridAxis::Height,
                size: frame_count,
                max,
            });
        }
        let frame_count = frame_count as u32;

        let interval = if frame_count > 1 {
            duration / (frame_count - 1) as f32
        } else {
            0.0
        };

        Ok(Self {
            frame_count,
            interval,
            duration,
        })
    }

    /// Time of row `frame`. The last row lands exactly on `duration`.
    #[must_use]
    pub fn sample_time(&self, frame: u32) -> f32 {
        if self.frame_count <= 1 {
            0.0
        } else if frame + 1 >= self.frame_count {
            self.duration
        } else {
            frame as f32 * self.interval
        }
    }
}

/// Every sampled frame of one clip.
#[derive(Debug, Clone)]
pub struct ClipSamples {
    pub clip: String,
    pub layout: FrameLayout,
    /// `frames[row][submesh]`
    pub frames: Vec<Vec<VertexSnapshot>>,
}

/// Poses `asset` at each row time of clip `clip` and reads back the
/// deformed sub-meshes.
///
/// Frames are sampled strictly in order; the asset's pose state is left at
/// the clip's last frame.
pub fn sample_clip<A: AnimatableAsset + ?Sized>(
    asset: &mut A,
    clip: usize,
    settings: &BakeSettings,
) -> Result<ClipSamples> {
    let count = asset.clips().len();
    let anim = asset
        .clips()
        .get(clip)
        .ok_or(BakeError::ClipIndexOutOfBounds { index: clip, count })?;
    let name = anim.name.clone();
    let layout = FrameLayout::for_clip(anim, settings)?;

    log::debug!(
        "Clip '{name}': {:.3}s -> {} frames, {:.5}s apart",
        layout.duration,
        layout.frame_count,
        layout.interval
    );

    let world = match settings.vertex_space {
        VertexSpace::Local => None,
        VertexSpace::World => Some(asset.root_transform()),
    };

    let mut frames = Vec::with_capacity(layout.frame_count as usize);
    for frame in 0..layout.frame_count {
        asset.pose(clip, layout.sample_time(frame))?;
        let mut snapshots = asset.read_back();
        if let Some(matrix) = &world {
            for snapshot in &mut snapshots {
                snapshot.transform(matrix);
            }
        }
        frames.push(snapshots);
    }

    Ok(ClipSamples {
        clip: name,
        layout,
        frames,
    })
}
