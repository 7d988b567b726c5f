//! Procedural skinned geometry: a jointed column that bends, for demos and
//! tests.

use std::f32::consts::TAU;

use glam::{Quat, Vec3};

use crate::animation::{AnimationClip, InterpolationMode, KeyframeTrack, Track};
use crate::errors::{BakeError, Result};
use crate::mesh::SkinnedSubMesh;
use crate::skeleton::{Joint, JointTransform, Skeleton};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnOptions {
    pub height: f32,
    pub radius: f32,
    /// Vertices around the circumference.
    pub sides: u32,
    /// Height subdivisions; the column has `rings + 1` vertex rings.
    pub rings: u32,
    /// Joints stacked along +Y, each `height / joints` long.
    pub joints: u32,
}

impl Default for ColumnOptions {
    fn default() -> Self {
        Self {
            height: 2.0,
            radius: 0.25,
            sides: 8,
            rings: 8,
            joints: 4,
        }
    }
}

impl ColumnOptions {
    fn validate(&self) -> Result<()> {
        if self.sides < 3 || self.rings == 0 || self.joints == 0 || self.height <= 0.0 {
            return Err(BakeError::InvalidRig(format!("degenerate column options {self:?}")));
        }
        Ok(())
    }

    #[inline]
    fn segment(&self) -> f32 {
        self.height / self.joints as f32
    }
}

#[must_use]
pub fn joint_name(index: u32) -> String {
    format!("bone_{index}")
}

/// A chain of joints `bone_0 .. bone_{n-1}` from the origin up +Y.
pub fn create_column_skeleton(options: &ColumnOptions) -> Result<Skeleton> {
    options.validate()?;
    let segment = options.segment();

    let joints = (0..options.joints)
        .map(|i| {
            let (parent, offset) = if i == 0 {
                (None, Vec3::ZERO)
            } else {
                (Some(i as usize - 1), Vec3::new(0.0, segment, 0.0))
            };
            Joint::new(&joint_name(i), parent, JointTransform::from_translation(offset))
        })
        .collect();

    Skeleton::from_rest_pose(joints)
}

/// An open cylinder skinned to the column skeleton.
///
/// Each vertex is weighted to its own joint and blends linearly into the
/// neighbouring joint near segment boundaries.
pub fn create_skinned_column(name: &str, options: &ColumnOptions) -> Result<SkinnedSubMesh> {
    options.validate()?;
    let segment = options.segment();
    let last_joint = options.joints as usize - 1;
    let ring_size = options.sides as usize;
    let vertex_count = (options.rings as usize + 1) * ring_size;

    let mut mesh = SkinnedSubMesh {
        name: name.to_string(),
        positions: Vec::with_capacity(vertex_count),
        normals: Vec::with_capacity(vertex_count),
        joints: Vec::with_capacity(vertex_count),
        weights: Vec::with_capacity(vertex_count),
        indices: Vec::with_capacity(options.rings as usize * ring_size * 6),
    };

    for ring in 0..=options.rings {
        let y = options.height * ring as f32 / options.rings as f32;
        let (joints, weights) = column_weights(y / segment, last_joint);

        for side in 0..options.sides {
            let angle = TAU * side as f32 / options.sides as f32;
            let (sin, cos) = angle.sin_cos();
            mesh.positions.push(Vec3::new(cos * options.radius, y, sin * options.radius));
            mesh.normals.push(Vec3::new(cos, 0.0, sin));
            mesh.joints.push(joints);
            mesh.weights.push(weights);
        }
    }

    for ring in 0..options.rings as usize {
        for side in 0..ring_size {
            let a = (ring * ring_size + side) as u32;
            let b = (ring * ring_size + (side + 1) % ring_size) as u32;
            let c = a + ring_size as u32;
            let d = b + ring_size as u32;
            mesh.indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }

    Ok(mesh)
}

fn column_weights(s: f32, last_joint: usize) -> ([u16; 4], [f32; 4]) {
    let own = (s.floor().max(0.0) as usize).min(last_joint);
    let local = (s - own as f32).clamp(0.0, 1.0);

    if local < 0.5 && own > 0 {
        let w = 0.5 - local;
        ([own as u16, own as u16 - 1, 0, 0], [1.0 - w, w, 0.0, 0.0])
    } else if local > 0.5 && own < last_joint {
        let w = local - 0.5;
        ([own as u16, own as u16 + 1, 0, 0], [1.0 - w, w, 0.0, 0.0])
    } else {
        ([own as u16, 0, 0, 0], [1.0, 0.0, 0.0, 0.0])
    }
}

/// Bends every non-root joint about +Z by up to `angle / (joints - 1)`
/// radians and back over `duration` seconds.
#[must_use]
pub fn create_bend_clip(name: &str, options: &ColumnOptions, duration: f32, angle: f32) -> AnimationClip {
    let per_joint = if options.joints > 1 {
        angle / (options.joints - 1) as f32
    } else {
        angle
    };
    let times = vec![0.0, duration * 0.5, duration];
    let keys = vec![
        Quat::IDENTITY,
        Quat::from_rotation_z(per_joint),
        Quat::IDENTITY,
    ];

    let tracks = (1..options.joints)
        .map(|i| {
            Track::rotation(
                &joint_name(i),
                KeyframeTrack::new(times.clone(), keys.clone(), InterpolationMode::Linear),
            )
        })
        .collect();

    AnimationClip::new(name, tracks).with_duration(duration)
}

/// Moves the root joint along `offset` over `duration` seconds.
#[must_use]
pub fn create_slide_clip(name: &str, duration: f32, offset: Vec3) -> AnimationClip {
    let track = KeyframeTrack::new(
        vec![0.0, duration],
        vec![Vec3::ZERO, offset],
        InterpolationMode::Linear,
    );
    AnimationClip::new(name, vec![Track::translation(&joint_name(0), track)]).with_duration(duration)
}
