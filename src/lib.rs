//! Bakes skinned animation clips into vertex animation textures (VAT).
//!
//! Each clip is sampled at a power-of-two number of evenly spaced times; the
//! deformed position and normal of every vertex land in two float grids
//! (column = vertex, row = frame), so a bone-less mesh can replay the clip
//! on the GPU from nothing but an elapsed time.
//!
//! ```rust,ignore
//! use vat::prelude::*;
//!
//! let mut sink = MemorySink::new();
//! let report = Baker::new(BakeSettings::default())
//!     .bake_batch(&mut targets, &mut sink, |_| std::ops::ControlFlow::Continue(()));
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod animation;
pub mod asset;
pub mod bake;
pub mod config;
pub mod errors;
pub mod mesh;
pub mod playback;
pub mod primitives;
pub mod rig;
pub mod skeleton;

pub use animation::{AnimationClip, ClipKind, InterpolationMode, KeyframeTrack, Track};
pub use asset::AnimatableAsset;
pub use bake::{
    ArtifactSink, BakeReport, BakeTarget, BakedAnimationMap, Baker, DirectorySink, MemorySink,
};
pub use config::{BakeSettings, VertexSpace};
pub use errors::{BakeError, Result};
pub use mesh::{SkinnedSubMesh, StaticMesh, VertexSnapshot};
pub use rig::SkinnedRig;
pub use skeleton::{Joint, JointTransform, Skeleton};

pub mod prelude {
    pub use crate::animation::{AnimationClip, ClipKind, InterpolationMode, KeyframeTrack, Track};
    pub use crate::asset::AnimatableAsset;
    pub use crate::bake::{
        ArtifactSink, BakeProgress, BakeReport, BakeTarget, BakedAnimationMap, Baker,
        DirectorySink, MemorySink,
    };
    pub use crate::config::{BakeSettings, VertexSpace};
    pub use crate::errors::{BakeError, Result};
    pub use crate::playback::{LoopMode, VatPlayback};
    pub use crate::rig::SkinnedRig;
}
