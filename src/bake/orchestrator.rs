//! Bake orchestration: clip enumeration, sampling and packing for every clip
//! of every target, with failures recorded per clip / per asset.

use std::ops::ControlFlow;

use crate::asset::AnimatableAsset;
use crate::bake::clips::enumerate_clips;
use crate::bake::packer::{BakedAnimationMap, LayoutPacker};
use crate::bake::sampler::sample_clip;
use crate::bake::sink::ArtifactSink;
use crate::config::BakeSettings;
use crate::errors::{BakeError, Result};

/// One entry of a batch. `asset` is `None` when the target carries no
/// posable rig.
#[derive(Debug, Clone)]
pub struct BakeTarget<A> {
    pub name: String,
    pub asset: Option<A>,
}

impl<A: AnimatableAsset> BakeTarget<A> {
    #[must_use]
    pub fn new(asset: A) -> Self {
        Self {
            name: asset.name().to_string(),
            asset: Some(asset),
        }
    }

    #[must_use]
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            asset: None,
        }
    }
}

/// Handed to the progress callback before each clip is baked.
#[derive(Debug, Clone, Copy)]
pub struct BakeProgress<'a> {
    pub asset_index: usize,
    pub asset_count: usize,
    pub asset: &'a str,
    pub clip: &'a str,
}

impl BakeProgress<'_> {
    /// Fraction of assets already completed, in `[0, 1)`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.asset_count == 0 {
            return 0.0;
        }
        self.asset_index as f32 / self.asset_count as f32
    }
}

#[derive(Debug)]
pub struct SkippedClip {
    pub asset: String,
    pub clip: String,
    pub error: BakeError,
}

#[derive(Debug)]
pub struct FailedAsset {
    pub asset: String,
    pub error: BakeError,
}

/// Summary of one batch.
#[derive(Debug, Default)]
pub struct BakeReport {
    /// Clips whose map reached the sink.
    pub succeeded: usize,
    pub skipped: Vec<SkippedClip>,
    pub failed_assets: Vec<FailedAsset>,
    /// The progress callback stopped the batch early.
    pub cancelled: bool,
}

impl BakeReport {
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    fn skip(&mut self, asset: &str, clip: &str, error: BakeError) {
        log::warn!("Skipping '{asset}/{clip}': {error}");
        self.skipped.push(SkippedClip {
            asset: asset.to_string(),
            clip: clip.to_string(),
            error,
        });
    }

    fn fail(&mut self, asset: &str, error: BakeError) {
        log::warn!("Skipping asset '{asset}': {error}");
        self.failed_assets.push(FailedAsset {
            asset: asset.to_string(),
            error,
        });
    }
}

/// Drives enumeration, sampling, packing and sink hand-off.
///
/// Stateless between runs; every call is an independent batch. Assets are
/// processed strictly one after another since posing mutates shared pose
/// state.
#[derive(Debug, Clone, Default)]
pub struct Baker {
    settings: BakeSettings,
}

impl Baker {
    #[must_use]
    pub fn new(settings: BakeSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &BakeSettings {
        &self.settings
    }

    /// Samples and packs a single clip.
    pub fn bake_clip<A: AnimatableAsset + ?Sized>(
        &self,
        asset: &mut A,
        packer: &LayoutPacker,
        clip: usize,
    ) -> Result<BakedAnimationMap> {
        let max = self.settings.max_texture_dimension;
        if let Some(anim) = asset.clips().get(clip) {
            // Reject wide assets before paying for the sampling
            packer.grid_width(&anim.name, max)?;
        }
        let samples = sample_clip(asset, clip, &self.settings)?;
        packer.pack(&samples, max)
    }

    /// Bakes every clip of one asset into `sink`.
    pub fn bake_asset<A, S>(&self, asset: &mut A, sink: &mut S) -> BakeReport
    where
        A: AnimatableAsset + ?Sized,
        S: ArtifactSink + ?Sized,
    {
        let mut report = BakeReport::default();
        let name = asset.name().to_string();
        let flow = self.bake_entry(&name, asset, sink, &mut report, &mut keep_going, 0, 1);
        // `keep_going` never breaks
        debug_assert!(flow.is_continue());
        log_summary(&report);
        report
    }

    /// Bakes every target in order.
    ///
    /// `progress` runs before each clip; returning `ControlFlow::Break`
    /// stops the batch at that boundary. Maps already handed to the sink
    /// stay there.
    pub fn bake_batch<A, S, F>(
        &self,
        targets: &mut [BakeTarget<A>],
        sink: &mut S,
        mut progress: F,
    ) -> BakeReport
    where
        A: AnimatableAsset,
        S: ArtifactSink + ?Sized,
        F: FnMut(&BakeProgress<'_>) -> ControlFlow<()>,
    {
        let mut report = BakeReport::default();
        let asset_count = targets.len();

        for (asset_index, target) in targets.iter_mut().enumerate() {
            let Some(asset) = target.asset.as_mut() else {
                report.fail(&target.name, BakeError::MissingAsset(target.name.clone()));
                continue;
            };

            let flow = self.bake_entry(
                &target.name,
                asset,
                sink,
                &mut report,
                &mut progress,
                asset_index,
                asset_count,
            );
            if flow.is_break() {
                report.cancelled = true;
                log::info!("Bake cancelled after asset '{}'", target.name);
                break;
            }
        }

        log_summary(&report);
        report
    }

    fn bake_entry<A, S, F>(
        &self,
        name: &str,
        asset: &mut A,
        sink: &mut S,
        report: &mut BakeReport,
        progress: &mut F,
        asset_index: usize,
        asset_count: usize,
    ) -> ControlFlow<()>
    where
        A: AnimatableAsset + ?Sized,
        S: ArtifactSink + ?Sized,
        F: FnMut(&BakeProgress<'_>) -> ControlFlow<()>,
    {
        let counts = asset.submesh_vertex_counts();
        if counts.is_empty() || counts.iter().all(|&c| c == 0) {
            report.fail(name, BakeError::MissingAsset(name.to_string()));
            return ControlFlow::Continue(());
        }

        let packer = LayoutPacker::new(counts);
        let clips = enumerate_clips(asset);
        log::info!(
            "Baking '{name}': {} vertices, {} clips ({} unsupported)",
            packer.total_vertex_count(),
            clips.bakeable.len(),
            clips.rejected.len()
        );
        for (clip, error) in clips.rejected {
            report.skip(name, &clip, error);
        }

        if let Err(error) = sink.begin_asset(name, &asset.merged_mesh()) {
            report.fail(name, error);
            return ControlFlow::Continue(());
        }

        let mut flow = ControlFlow::Continue(());
        for index in clips.bakeable {
            let clip_name = asset.clips()[index].name.clone();

            flow = progress(&BakeProgress {
                asset_index,
                asset_count,
                asset: name,
                clip: &clip_name,
            });
            if flow.is_break() {
                break;
            }

            match self.bake_clip(asset, &packer, index) {
                Ok(map) => {
                    let (width, height) = (map.width(), map.height());
                    match sink.accept(name, map) {
                        Ok(()) => {
                            log::info!("Baked '{name}/{clip_name}' ({width}x{height})");
                            report.succeeded += 1;
                        }
                        Err(error) => report.skip(name, &clip_name, error),
                    }
                }
                Err(error) if error.is_clip_local() => report.skip(name, &clip_name, error),
                Err(error) => {
                    report.fail(name, error);
                    break;
                }
            }
        }

        if let Err(error) = sink.finish_asset(name) {
            report.fail(name, error);
        }
        flow
    }
}

fn keep_going(_: &BakeProgress<'_>) -> ControlFlow<()> {
    ControlFlow::Continue(())
}

fn log_summary(report: &BakeReport) {
    log::info!(
        "Bake finished: {} succeeded, {} skipped, {} assets failed{}",
        report.succeeded,
        report.skipped.len(),
        report.failed_assets.len(),
        if report.cancelled { " (cancelled)" } else { "" }
    );
}
