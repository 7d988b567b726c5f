//! Bake Pipeline Tests
//!
//! Tests for:
//! - Grid dimensions and row/column layout of baked maps
//! - Clip enumeration (unsupported kinds, duplicate names)
//! - Per-clip and per-asset failure handling in batches
//! - Progress callbacks and cancellation
//! - Vertex space selection
//! - End-to-end baking of a skinned rig

use std::f32::consts::FRAC_PI_2;
use std::ops::ControlFlow;

use glam::{Affine3A, Vec3};

use vat::animation::{AnimationClip, ClipKind};
use vat::asset::AnimatableAsset;
use vat::bake::{BakeProgress, BakeTarget, Baker, LayoutPacker, MemorySink, sample_clip};
use vat::config::{BakeSettings, VertexSpace};
use vat::errors::{BakeError, GridAxis, Result};
use vat::mesh::{StaticMesh, SubMeshRange, VertexSnapshot};
use vat::primitives::{ColumnOptions, create_bend_clip, create_column_skeleton, create_skinned_column};
use vat::rig::SkinnedRig;

const EPSILON: f32 = 1e-4;

fn approx_vec(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < EPSILON
}

// ============================================================================
// Test asset
// ============================================================================

/// Vertices move in straight lines: `base + velocity * t`, independent of
/// which clip is playing.
struct DriftAsset {
    name: String,
    counts: Vec<usize>,
    clips: Vec<AnimationClip>,
    root: Affine3A,
    time: f32,
    poses: usize,
}

impl DriftAsset {
    fn new(name: &str, counts: Vec<usize>, clips: Vec<AnimationClip>) -> Self {
        Self {
            name: name.to_string(),
            counts,
            clips,
            root: Affine3A::IDENTITY,
            time: 0.0,
            poses: 0,
        }
    }

    fn base(submesh: usize, vertex: usize) -> Vec3 {
        Vec3::new(submesh as f32 * 100.0 + vertex as f32, 0.0, 0.0)
    }

    fn velocity(vertex: usize) -> Vec3 {
        Vec3::new(0.0, 1.0 + vertex as f32, 0.0)
    }

    fn expected(submesh: usize, vertex: usize, time: f32) -> Vec3 {
        Self::base(submesh, vertex) + Self::velocity(vertex) * time
    }
}

impl AnimatableAsset for DriftAsset {
    fn name(&self) -> &str {
        &self.name
    }

    fn submesh_vertex_counts(&self) -> Vec<usize> {
        self.counts.clone()
    }

    fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    fn pose(&mut self, clip: usize, time: f32) -> Result<()> {
        if clip >= self.clips.len() {
            return Err(BakeError::ClipIndexOutOfBounds {
                index: clip,
                count: self.clips.len(),
            });
        }
        self.time = time;
        self.poses += 1;
        Ok(())
    }

    fn read_back(&self) -> Vec<VertexSnapshot> {
        self.counts
            .iter()
            .enumerate()
            .map(|(s, &count)| VertexSnapshot {
                positions: (0..count).map(|v| Self::expected(s, v, self.time)).collect(),
                normals: vec![Vec3::Z; count],
            })
            .collect()
    }

    fn merged_mesh(&self) -> StaticMesh {
        let mut mesh = StaticMesh::default();
        for (s, &count) in self.counts.iter().enumerate() {
            mesh.submeshes.push(SubMeshRange {
                name: format!("part_{s}"),
                base_vertex: mesh.positions.len(),
                vertex_count: count,
                first_index: 0,
                index_count: 0,
            });
            mesh.positions.extend((0..count).map(|v| Self::base(s, v)));
            mesh.normals.extend(std::iter::repeat_n(Vec3::Z, count));
        }
        mesh
    }

    fn root_transform(&self) -> Affine3A {
        self.root
    }
}

fn legacy(name: &str, duration: f32) -> AnimationClip {
    AnimationClip::new(name, Vec::new()).with_duration(duration)
}

fn two_part_asset(clips: Vec<AnimationClip>) -> DriftAsset {
    DriftAsset::new("crate", vec![10, 6], clips)
}

fn keep_going(_: &BakeProgress<'_>) -> ControlFlow<()> {
    ControlFlow::Continue(())
}

// ============================================================================
// Layout
// ============================================================================

#[test]
fn one_second_clip_fills_sixteen_by_thirty_two() {
    let mut asset = two_part_asset(vec![legacy("walk", 1.0)]);
    let mut sink = MemorySink::new();

    let report = Baker::default().bake_asset(&mut asset, &mut sink);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.skipped_count(), 0);

    let map = sink.asset("crate").unwrap().map("walk").unwrap();
    assert_eq!((map.width(), map.height()), (16, 32));
    assert_eq!(map.frame_count, 32);
    assert_eq!(map.vertex_count, 16);
    assert_eq!(asset.poses, 32);

    // First and last rows are exact poses at 0s and 1s
    for v in 0..10 {
        assert_eq!(map.position(v, 0), Some(DriftAsset::expected(0, v, 0.0)));
        assert_eq!(map.position(v, 31), Some(DriftAsset::expected(0, v, 1.0)));
    }
    for v in 0..6 {
        assert_eq!(map.position(10 + v, 0), Some(DriftAsset::expected(1, v, 0.0)));
        assert_eq!(map.position(10 + v, 31), Some(DriftAsset::expected(1, v, 1.0)));
    }
}

#[test]
fn rows_are_evenly_spaced() {
    let mut asset = two_part_asset(vec![legacy("walk", 1.0)]);
    let mut sink = MemorySink::new();
    Baker::default().bake_asset(&mut asset, &mut sink);

    let map = sink.asset("crate").unwrap().map("walk").unwrap();
    for row in 0..32 {
        let t = row as f32 / 31.0;
        let p = map.position(3, row).unwrap();
        assert!(approx_vec(p, DriftAsset::expected(0, 3, t)), "row {row}: {p}");
    }
}

#[test]
fn submesh_columns_are_stable_across_frames() {
    let mut asset = two_part_asset(vec![legacy("walk", 0.5)]);
    let packer = LayoutPacker::new(asset.submesh_vertex_counts());
    assert_eq!(packer.offsets(), &[0, 10]);

    let map = Baker::default().bake_clip(&mut asset, &packer, 0).unwrap();
    for row in 0..map.height() {
        // x only encodes the source vertex, so it never changes down a column
        for column in 0..16 {
            let (s, v) = if column < 10 { (0, column) } else { (1, column - 10) };
            let p = map.position(column, row).unwrap();
            assert_eq!(p.x, DriftAsset::base(s, v).x);
        }
    }
}

#[test]
fn padding_and_alpha() {
    let mut asset = DriftAsset::new("odd", vec![5], vec![legacy("idle", 0.1)]);
    let packer = LayoutPacker::new(asset.submesh_vertex_counts());
    let map = Baker::default().bake_clip(&mut asset, &packer, 0).unwrap();

    assert_eq!(map.width(), 8);
    for row in 0..map.height() {
        for x in 0..5 {
            assert_eq!(map.positions.texel(x, row).unwrap()[3], 1.0);
            assert_eq!(map.normals.texel(x, row).unwrap(), [0.0, 0.0, 1.0, 1.0]);
        }
        for x in 5..8 {
            assert_eq!(map.positions.texel(x, row), Some([0.0; 4]));
            assert_eq!(map.normals.texel(x, row), Some([0.0; 4]));
        }
    }
}

#[test]
fn baking_is_deterministic() {
    let clips = vec![legacy("walk", 0.7), legacy("run", 0.4)];
    let mut first = MemorySink::new();
    let mut second = MemorySink::new();

    Baker::default().bake_asset(&mut two_part_asset(clips.clone()), &mut first);
    Baker::default().bake_asset(&mut two_part_asset(clips), &mut second);

    let a = &first.asset("crate").unwrap().maps;
    let b = &second.asset("crate").unwrap().maps;
    assert_eq!(a, b);
}

#[test]
fn sample_rate_override_changes_height() {
    let settings = BakeSettings {
        sample_rate_override: Some(60.0),
        ..Default::default()
    };
    let mut asset = two_part_asset(vec![legacy("walk", 1.0)]);
    let samples = sample_clip(&mut asset, 0, &settings).unwrap();
    // floor(60) + 1 = 61 -> 64
    assert_eq!(samples.layout.frame_count, 64);
    assert_eq!(samples.frames.len(), 64);
}

// ============================================================================
// Clip enumeration & failures
// ============================================================================

#[test]
fn unsupported_clip_is_skipped_with_diagnostic() {
    let mut asset = two_part_asset(vec![
        legacy("walk", 1.0),
        legacy("aim", 1.0).with_kind(ClipKind::Humanoid),
        legacy("run", 0.5),
    ]);
    let mut sink = MemorySink::new();

    let report = Baker::default().bake_asset(&mut asset, &mut sink);
    assert_eq!(report.succeeded, 2);
    assert_eq!(sink.map_count(), 2);
    assert_eq!(report.skipped_count(), 1);

    let skipped = &report.skipped[0];
    assert_eq!(skipped.clip, "aim");
    assert!(matches!(
        skipped.error,
        BakeError::UnsupportedClip {
            kind: ClipKind::Humanoid,
            ..
        }
    ));
}

#[test]
fn zero_duration_clip_is_degenerate() {
    let mut asset = two_part_asset(vec![legacy("pose", 0.0), legacy("walk", 1.0)]);
    let mut sink = MemorySink::new();

    let report = Baker::default().bake_asset(&mut asset, &mut sink);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.skipped[0].clip, "pose");
    assert!(matches!(report.skipped[0].error, BakeError::DegenerateClip { .. }));
    assert!(sink.asset("crate").unwrap().map("walk").is_some());
}

#[test]
fn duplicate_clip_names_bake_once() {
    let mut asset = two_part_asset(vec![legacy("walk", 1.0), legacy("walk", 2.0)]);
    let mut sink = MemorySink::new();

    let report = Baker::default().bake_asset(&mut asset, &mut sink);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.skipped_count(), 0);
    let map = sink.asset("crate").unwrap().map("walk").unwrap();
    assert_eq!(map.duration, 1.0);
}

#[test]
fn dimension_overflow_skips_only_the_tall_clip() {
    let settings = BakeSettings {
        max_texture_dimension: 16,
        ..Default::default()
    };
    let mut asset = two_part_asset(vec![legacy("long", 1.0), legacy("short", 0.2)]);
    let mut sink = MemorySink::new();

    let report = Baker::new(settings).bake_asset(&mut asset, &mut sink);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.skipped[0].clip, "long");
    assert!(matches!(
        report.skipped[0].error,
        BakeError::DimensionOverflow {
            axis: GridAxis::Height,
            size: 32,
            max: 16,
            ..
        }
    ));
    assert_eq!(sink.asset("crate").unwrap().map("short").unwrap().height(), 8);
}

#[test]
fn wide_asset_overflows_before_sampling() {
    let settings = BakeSettings {
        max_texture_dimension: 8,
        ..Default::default()
    };
    let mut asset = two_part_asset(vec![legacy("walk", 0.1)]);
    let mut sink = MemorySink::new();

    let report = Baker::new(settings).bake_asset(&mut asset, &mut sink);
    assert_eq!(report.succeeded, 0);
    assert!(matches!(
        report.skipped[0].error,
        BakeError::DimensionOverflow {
            axis: GridAxis::Width,
            size: 16,
            ..
        }
    ));
    assert_eq!(asset.poses, 0);
}

#[test]
fn missing_asset_does_not_stop_the_batch() {
    let mut targets = vec![
        BakeTarget::empty("ghost"),
        BakeTarget::new(two_part_asset(vec![legacy("walk", 1.0)])),
    ];
    let mut sink = MemorySink::new();

    let report = Baker::default().bake_batch(&mut targets, &mut sink, keep_going);
    assert_eq!(report.failed_assets.len(), 1);
    assert_eq!(report.failed_assets[0].asset, "ghost");
    assert!(matches!(report.failed_assets[0].error, BakeError::MissingAsset(_)));
    assert_eq!(report.succeeded, 1);
    assert!(!report.cancelled);
}

#[test]
fn asset_without_vertices_is_missing() {
    let mut asset = DriftAsset::new("hollow", vec![0, 0], vec![legacy("walk", 1.0)]);
    let mut sink = MemorySink::new();

    let report = Baker::default().bake_asset(&mut asset, &mut sink);
    assert!(matches!(report.failed_assets[0].error, BakeError::MissingAsset(_)));
    assert!(sink.assets.is_empty());
}

// ============================================================================
// Progress & cancellation
// ============================================================================

#[test]
fn progress_runs_before_each_clip() {
    let mut targets = vec![
        BakeTarget::new(DriftAsset::new("a", vec![4], vec![legacy("x", 0.2), legacy("y", 0.2)])),
        BakeTarget::new(DriftAsset::new("b", vec![4], vec![legacy("z", 0.2)])),
    ];
    let mut sink = MemorySink::new();
    let mut seen = Vec::new();

    let report = Baker::default().bake_batch(&mut targets, &mut sink, |p| {
        seen.push((p.asset.to_string(), p.clip.to_string(), p.fraction()));
        ControlFlow::Continue(())
    });

    assert_eq!(report.succeeded, 3);
    assert_eq!(
        seen,
        vec![
            ("a".to_string(), "x".to_string(), 0.0),
            ("a".to_string(), "y".to_string(), 0.0),
            ("b".to_string(), "z".to_string(), 0.5),
        ]
    );
}

#[test]
fn cancelling_keeps_finished_maps() {
    let mut targets = vec![
        BakeTarget::new(DriftAsset::new("a", vec![4], vec![legacy("x", 0.2), legacy("y", 0.2)])),
        BakeTarget::new(DriftAsset::new("b", vec![4], vec![legacy("z", 0.2)])),
    ];
    let mut sink = MemorySink::new();
    let mut calls = 0;

    let report = Baker::default().bake_batch(&mut targets, &mut sink, |_| {
        calls += 1;
        if calls == 2 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });

    assert!(report.cancelled);
    assert_eq!(report.succeeded, 1);
    assert_eq!(sink.map_count(), 1);
    assert!(sink.asset("a").unwrap().map("x").is_some());
    assert!(sink.asset("b").is_none());
}

// ============================================================================
// Vertex space
// ============================================================================

#[test]
fn world_space_applies_root_transform() {
    let mut asset = two_part_asset(vec![legacy("walk", 1.0)]);
    asset.root = Affine3A::from_translation(Vec3::new(0.0, 0.0, 5.0));

    let local = sample_clip(&mut asset, 0, &BakeSettings::default()).unwrap();
    let world = sample_clip(
        &mut asset,
        0,
        &BakeSettings {
            vertex_space: VertexSpace::World,
            ..Default::default()
        },
    )
    .unwrap();

    let l = &local.frames[0][1];
    let w = &world.frames[0][1];
    assert!(approx_vec(w.positions[2], l.positions[2] + Vec3::new(0.0, 0.0, 5.0)));
    assert!(approx_vec(w.normals[2], l.normals[2]));
}

#[test]
fn world_space_normals_survive_non_uniform_scale() {
    let options = ColumnOptions::default();
    let mut rig = SkinnedRig::new(
        "column",
        create_column_skeleton(&options).unwrap(),
        vec![create_skinned_column("body", &options).unwrap()],
        vec![create_bend_clip("bend", &options, 1.0, FRAC_PI_2)],
    )
    .unwrap()
    .with_root_transform(Affine3A::from_scale(Vec3::new(2.0, 1.0, 1.0)));

    let settings = BakeSettings {
        vertex_space: VertexSpace::World,
        ..Default::default()
    };
    let samples = sample_clip(&mut rig, 0, &settings).unwrap();

    // Frame 0 is the bind pose: side normals (cos, 0, sin) under scale (2, 1, 1)
    let snapshot = &samples.frames[0][0];
    let bind = &rig.submeshes()[0].normals;
    for (baked, rest) in snapshot.normals.iter().zip(bind) {
        let expected = Vec3::new(rest.x * 0.5, rest.y, rest.z).normalize();
        assert!(approx_vec(*baked, expected), "{baked} != {expected}");
    }
}

// ============================================================================
// Skinned rig end to end
// ============================================================================

#[test]
fn column_rig_bakes_bind_pose_into_first_row() {
    let options = ColumnOptions::default();
    let mut rig = SkinnedRig::new(
        "column",
        create_column_skeleton(&options).unwrap(),
        vec![create_skinned_column("body", &options).unwrap()],
        vec![create_bend_clip("bend", &options, 1.0, FRAC_PI_2)],
    )
    .unwrap();
    let mut sink = MemorySink::new();

    let report = Baker::default().bake_asset(&mut rig, &mut sink);
    assert_eq!(report.succeeded, 1);

    let artifacts = sink.asset("column").unwrap();
    assert_eq!(artifacts.mesh.vertex_count(), 72);

    let map = artifacts.map("bend").unwrap();
    assert_eq!((map.width(), map.height()), (128, 32));
    for (v, bind) in artifacts.mesh.positions.iter().enumerate() {
        assert!(approx_vec(map.position(v, 0).unwrap(), *bind));
        // The bend returns to rest at the end of the clip
        assert!(approx_vec(map.position(v, 31).unwrap(), *bind));
    }
}
