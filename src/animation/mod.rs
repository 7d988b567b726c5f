pub mod values;
pub mod tracks;
pub mod clip;
pub mod binding;

pub use clip::{AnimationClip, ClipKind, TargetPath, Track, TrackData, DEFAULT_SAMPLE_RATE};
pub use binding::ClipBinding;
pub use tracks::{InterpolationMode, KeyframeTrack};
pub use values::Interpolatable;
