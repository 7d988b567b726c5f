//! Layout packing: frame rows of concatenated sub-mesh vertices, stacked into
//! two power-of-two RGBA float grids.

use glam::Vec3;
use half::f16;

use crate::bake::sampler::{ClipSamples, FrameLayout};
use crate::errors::{BakeError, GridAxis, Result};
use crate::mesh::VertexSnapshot;

/// A `width × height` grid of RGBA float texels, row-major, row 0 first.
///
/// Written texels hold `(x, y, z, 1.0)`; padding texels stay all zero.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationGrid {
    width: u32,
    height: u32,
    texels: Vec<[f32; 4]>,
}

impl AnimationGrid {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            texels: vec![[0.0; 4]; width as usize * height as usize],
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// Writes `value` into texel `(x, y)`. Out-of-range writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, value: Vec3) {
        if let Some(i) = self.offset(x, y) {
            self.texels[i] = [value.x, value.y, value.z, 1.0];
        }
    }

    #[must_use]
    pub fn texel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        self.offset(x, y).map(|i| self.texels[i])
    }

    /// The xyz channels of texel `(x, y)`.
    #[must_use]
    pub fn value(&self, x: u32, y: u32) -> Option<Vec3> {
        self.texel(x, y).map(|[r, g, b, _]| Vec3::new(r, g, b))
    }

    /// All texels of row `y`, including padding columns.
    #[must_use]
    pub fn row(&self, y: u32) -> Option<&[[f32; 4]]> {
        let start = self.offset(0, y)?;
        Some(&self.texels[start..start + self.width as usize])
    }

    #[must_use]
    pub fn texels(&self) -> &[[f32; 4]] {
        &self.texels
    }

    /// Texels flattened to `r, g, b, a, r, g, b, a, ...`.
    #[must_use]
    pub fn as_flat(&self) -> &[f32] {
        self.texels.as_flattened()
    }

    /// Texels converted to half floats, for RGBA16F textures.
    #[must_use]
    pub fn to_rgba16f(&self) -> Vec<f16> {
        self.as_flat().iter().copied().map(f16::from_f32).collect()
    }
}

/// The baked output of one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct BakedAnimationMap {
    pub name: String,
    /// Clip length in seconds.
    pub duration: f32,
    /// Rows actually sampled; equal to the grid height.
    pub frame_count: u32,
    /// Columns holding vertex data; the rest of each row is padding.
    pub vertex_count: usize,
    pub positions: AnimationGrid,
    pub normals: AnimationGrid,
}

impl BakedAnimationMap {
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.positions.width()
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.positions.height()
    }

    /// Fractional row for an elapsed `time`, clamped to the clip.
    #[must_use]
    pub fn frame_position(&self, time: f32) -> f32 {
        if self.frame_count <= 1 || self.duration <= 0.0 {
            return 0.0;
        }
        (time / self.duration).clamp(0.0, 1.0) * (self.frame_count - 1) as f32
    }

    /// Nearest row for an elapsed `time`.
    #[must_use]
    pub fn row_for_time(&self, time: f32) -> u32 {
        self.frame_position(time).round() as u32
    }

    #[must_use]
    pub fn position(&self, vertex: usize, frame: u32) -> Option<Vec3> {
        if vertex >= self.vertex_count {
            return None;
        }
        self.positions.value(vertex as u32, frame)
    }

    #[must_use]
    pub fn normal(&self, vertex: usize, frame: u32) -> Option<Vec3> {
        if vertex >= self.vertex_count {
            return None;
        }
        self.normals.value(vertex as u32, frame)
    }
}

/// Column layout shared by every clip of one asset.
///
/// Sub-mesh `i` occupies columns `offsets[i]..offsets[i] + counts[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPacker {
    counts: Vec<usize>,
    offsets: Vec<usize>,
    total: usize,
}

impl LayoutPacker {
    /// `counts` are the sub-mesh vertex counts in the asset's fixed order.
    #[must_use]
    pub fn new(counts: Vec<usize>) -> Self {
        let mut offsets = Vec::with_capacity(counts.len());
        let mut total = 0;
        for &count in &counts {
            offsets.push(total);
            total += count;
        }
        Self {
            counts,
            offsets,
            total,
        }
    }

    #[inline]
    #[must_use]
    pub fn total_vertex_count(&self) -> usize {
        self.total
    }

    /// First column of each sub-mesh.
    #[inline]
    #[must_use]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Grid width for this layout, checked against `max`.
    pub fn grid_width(&self, clip: &str, max: u32) -> Result<u32> {
        let width = (self.total as u64).max(1).next_power_of_two();
        if width > u64::from(max) {
            return Err(BakeError::DimensionOverflow {
                clip: clip.to_string(),
                axis: GridAxis::Width,
                size: width,
                max,
            });
        }
        Ok(width as u32)
    }

    /// Copies every sampled frame into row `frame` of the two grids.
    ///
    /// Fails when the grid would be wider than `max`, or when a frame's
    /// sub-mesh list does not match this layout.
    pub fn pack(&self, samples: &ClipSamples, max: u32) -> Result<BakedAnimationMap> {
        let FrameLayout {
            frame_count,
            duration,
            ..
        } = samples.layout;
        let width = self.grid_width(&samples.clip, max)?;

        let mut positions = AnimationGrid::new(width, frame_count);
        let mut normals = AnimationGrid::new(width, frame_count);

        for (row, frame) in samples.frames.iter().enumerate() {
            self.check_frame(&samples.clip, row, frame)?;

            for ((snapshot, &offset), &count) in frame.iter().zip(&self.offsets).zip(&self.counts) {
                for v in 0..count {
                    let column = (offset + v) as u32;
                    positions.set(column, row as u32, snapshot.positions[v]);
                    normals.set(column, row as u32, snapshot.normals[v]);
                }
            }
        }

        Ok(BakedAnimationMap {
            name: samples.clip.clone(),
            duration,
            frame_count,
            vertex_count: self.total,
            positions,
            normals,
        })
    }

    fn check_frame(&self, clip: &str, row: usize, frame: &[VertexSnapshot]) -> Result<()> {
        if frame.len() != self.counts.len() {
            return Err(BakeError::TopologyChanged {
                clip: clip.to_string(),
                frame: row,
                submesh: frame.len().min(self.counts.len()),
                expected: self.counts.len(),
                actual: frame.len(),
            });
        }
        for (submesh, (snapshot, &expected)) in frame.iter().zip(&self.counts).enumerate() {
            let actual = snapshot.positions.len().min(snapshot.normals.len());
            if snapshot.positions.len() != expected || snapshot.normals.len() != expected {
                return Err(BakeError::TopologyChanged {
                    clip: clip.to_string(),
                    frame: row,
                    submesh,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}
