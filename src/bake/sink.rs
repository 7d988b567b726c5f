//! Artifact sinks: where baked maps go once a clip is done.
//!
//! The orchestrator calls [`ArtifactSink::begin_asset`] once per asset with
//! the merged mesh, [`ArtifactSink::accept`] once per baked clip, and
//! [`ArtifactSink::finish_asset`] when the asset's clips are exhausted (or the
//! batch is cancelled). Maps already accepted are never retracted.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::bake::packer::{AnimationGrid, BakedAnimationMap};
use crate::errors::{BakeError, Result};
use crate::mesh::StaticMesh;

pub trait ArtifactSink {
    fn begin_asset(&mut self, asset: &str, mesh: &StaticMesh) -> Result<()>;

    /// Takes ownership of one clip's baked map.
    fn accept(&mut self, asset: &str, map: BakedAnimationMap) -> Result<()>;

    fn finish_asset(&mut self, asset: &str) -> Result<()>;
}

// ============================================================================
// In-memory sink
// ============================================================================

/// Everything baked for one asset.
#[derive(Debug, Clone)]
pub struct AssetArtifacts {
    pub name: String,
    pub mesh: StaticMesh,
    pub maps: Vec<BakedAnimationMap>,
}

impl AssetArtifacts {
    #[must_use]
    pub fn map(&self, clip: &str) -> Option<&BakedAnimationMap> {
        self.maps.iter().find(|m| m.name == clip)
    }
}

/// Keeps every artifact in memory, in the order received.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub assets: Vec<AssetArtifacts>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn asset(&self, name: &str) -> Option<&AssetArtifacts> {
        self.assets.iter().find(|a| a.name == name)
    }

    /// Total number of maps received across all assets.
    #[must_use]
    pub fn map_count(&self) -> usize {
        self.assets.iter().map(|a| a.maps.len()).sum()
    }
}

impl ArtifactSink for MemorySink {
    fn begin_asset(&mut self, asset: &str, mesh: &StaticMesh) -> Result<()> {
        self.assets.push(AssetArtifacts {
            name: asset.to_string(),
            mesh: mesh.clone(),
            maps: Vec::new(),
        });
        Ok(())
    }

    fn accept(&mut self, asset: &str, map: BakedAnimationMap) -> Result<()> {
        match self.assets.iter_mut().rev().find(|a| a.name == asset) {
            Some(entry) => {
                entry.maps.push(map);
                Ok(())
            }
            None => Err(BakeError::MissingAsset(asset.to_string())),
        }
    }

    fn finish_asset(&mut self, _asset: &str) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Directory sink
// ============================================================================

/// Material description for one baked clip: the two textures a VAT shader
/// samples plus the clip length it needs to map time onto rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VatMaterial {
    pub name: String,
    pub clip: String,
    /// Source material this one is derived from, when the sink has templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    pub duration: f32,
    /// Relative to the manifest's directory.
    pub position_texture: String,
    pub normal_texture: String,
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    pub vertex_count: usize,
}

/// Per-asset manifest written next to the textures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VatManifest {
    pub asset: String,
    pub mesh: String,
    pub vertex_count: usize,
    /// Sorted by material name.
    pub materials: Vec<VatMaterial>,
}

impl VatManifest {
    /// Materials derived from `template`, or the template-less ones for
    /// `None`.
    pub fn materials_for<'a>(
        &'a self,
        template: Option<&'a str>,
    ) -> impl Iterator<Item = &'a VatMaterial> + 'a {
        self.materials
            .iter()
            .filter(move |m| m.template.as_deref() == template)
    }
}

/// Writes textures (OpenEXR, RGBA32F), the merged mesh and a manifest under
/// `<root>/<asset>/`. Existing files are overwritten.
///
/// ```text
/// <root>/<asset>/<asset>.mesh.json
/// <root>/<asset>/<asset>.vat.json
/// <root>/<asset>/positions/<asset>_<clip>.exr
/// <root>/<asset>/normals/<asset>_<clip>.exr
/// ```
///
/// Clip names that sanitise to the same file stem get a numeric suffix
/// (`walk`, `walk_1`, ...). With material templates, every clip gets one
/// material per template, named `<asset>_<template>_<clip>`, all sharing the
/// clip's two textures.
#[derive(Debug)]
pub struct DirectorySink {
    root: PathBuf,
    templates: Vec<String>,
    pending: Option<VatManifest>,
    // Clip stems already taken by the pending asset
    used_stems: FxHashSet<String>,
    manifests: Vec<PathBuf>,
}

const POSITIONS_DIR: &str = "positions";
const NORMALS_DIR: &str = "normals";

impl DirectorySink {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            templates: Vec::new(),
            pending: None,
            used_stems: FxHashSet::default(),
            manifests: Vec::new(),
        }
    }

    /// Emits one material per clip for each of `templates`.
    #[must_use]
    pub fn with_material_templates<I, S>(mut self, templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.templates = templates.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    /// Manifests written so far.
    #[must_use]
    pub fn manifests(&self) -> &[PathBuf] {
        &self.manifests
    }

    fn asset_dir(&self, asset: &str) -> PathBuf {
        self.root.join(sanitize_file_name(asset))
    }

    /// First free stem for `clip` within the pending asset.
    fn claim_stem(&mut self, clip: &str) -> String {
        let base = sanitize_file_name(clip);
        let mut stem = base.clone();
        let mut suffix = 1;
        while self.used_stems.contains(&stem) {
            stem = format!("{base}_{suffix}");
            suffix += 1;
        }
        if stem != base {
            log::warn!("Clip '{clip}' collides with another clip's file name, writing as '{stem}'");
        }
        self.used_stems.insert(stem.clone());
        stem
    }

    fn write_grid(path: &Path, grid: &AnimationGrid) -> Result<()> {
        let image = image::Rgba32FImage::from_raw(grid.width(), grid.height(), grid.as_flat().to_vec())
            .ok_or_else(|| {
                BakeError::ImageEncode(format!(
                    "{}x{} grid does not match its texel buffer",
                    grid.width(),
                    grid.height()
                ))
            })?;
        image.save(path)?;
        Ok(())
    }
}

impl ArtifactSink for DirectorySink {
    fn begin_asset(&mut self, asset: &str, mesh: &StaticMesh) -> Result<()> {
        let dir = self.asset_dir(asset);
        fs::create_dir_all(dir.join(POSITIONS_DIR))?;
        fs::create_dir_all(dir.join(NORMALS_DIR))?;

        let mesh_file = format!("{}.mesh.json", sanitize_file_name(asset));
        let writer = BufWriter::new(File::create(dir.join(&mesh_file))?);
        serde_json::to_writer(writer, mesh)?;

        self.used_stems.clear();
        self.pending = Some(VatManifest {
            asset: asset.to_string(),
            mesh: mesh_file,
            vertex_count: mesh.vertex_count(),
            materials: Vec::new(),
        });
        Ok(())
    }

    fn accept(&mut self, asset: &str, map: BakedAnimationMap) -> Result<()> {
        if !self.pending.as_ref().is_some_and(|m| m.asset == asset) {
            return Err(BakeError::MissingAsset(asset.to_string()));
        }

        let dir = self.asset_dir(asset);
        let asset_stem = sanitize_file_name(asset);
        let clip_stem = self.claim_stem(&map.name);
        let texture_stem = format!("{asset_stem}_{clip_stem}");
        let position_texture = format!("{POSITIONS_DIR}/{texture_stem}.exr");
        let normal_texture = format!("{NORMALS_DIR}/{texture_stem}.exr");

        Self::write_grid(&dir.join(&position_texture), &map.positions)?;
        Self::write_grid(&dir.join(&normal_texture), &map.normals)?;

        let material = |name: String, template: Option<String>| VatMaterial {
            name,
            clip: map.name.clone(),
            template,
            duration: map.duration,
            position_texture: position_texture.clone(),
            normal_texture: normal_texture.clone(),
            width: map.width(),
            height: map.height(),
            frame_count: map.frame_count,
            vertex_count: map.vertex_count,
        };

        let materials: Vec<VatMaterial> = if self.templates.is_empty() {
            vec![material(texture_stem.clone(), None)]
        } else {
            self.templates
                .iter()
                .map(|template| {
                    let name = format!("{asset_stem}_{}_{clip_stem}", sanitize_file_name(template));
                    material(name, Some(template.clone()))
                })
                .collect()
        };

        if let Some(manifest) = self.pending.as_mut() {
            manifest.materials.extend(materials);
        }
        Ok(())
    }

    fn finish_asset(&mut self, asset: &str) -> Result<()> {
        let Some(mut manifest) = self.pending.take().filter(|m| m.asset == asset) else {
            return Err(BakeError::MissingAsset(asset.to_string()));
        };
        manifest.materials.sort_by(|a, b| a.name.cmp(&b.name));

        let path = self
            .asset_dir(asset)
            .join(format!("{}.vat.json", sanitize_file_name(asset)));
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, &manifest)?;

        log::info!("Wrote {} ({} materials)", path.display(), manifest.materials.len());
        self.manifests.push(path);
        Ok(())
    }
}

/// Replaces characters that are awkward in file names.
///
/// The result is always a single path component: separators become `_`,
/// and names made only of dots (`.`, `..`) are turned into underscores so
/// they cannot point at the current or parent directory.
fn sanitize_file_name(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "_".to_string()
    } else if stem.chars().all(|c| c == '.') {
        "_".repeat(stem.len())
    } else {
        stem
    }
}
