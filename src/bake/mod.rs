//! The baking pipeline.
//!
//! ```text
//! Baker ─▶ enumerate_clips ─▶ { sample_clip ─▶ LayoutPacker::pack } per clip ─▶ ArtifactSink
//! ```

pub mod clips;
pub mod sampler;
pub mod packer;
pub mod orchestrator;
pub mod sink;

pub use clips::{ClipSet, enumerate_clips};
pub use sampler::{ClipSamples, FrameLayout, sample_clip};
pub use packer::{AnimationGrid, BakedAnimationMap, LayoutPacker};
pub use orchestrator::{BakeProgress, BakeReport, BakeTarget, Baker, FailedAsset, SkippedClip};
pub use sink::{ArtifactSink, AssetArtifacts, DirectorySink, MemorySink, VatManifest, VatMaterial};
