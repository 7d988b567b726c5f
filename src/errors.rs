//! Error Types
//!
//! This module defines the error types used throughout the baker.
//!
//! # Overview
//!
//! The main error type [`BakeError`] covers every failure mode:
//! - Clips that cannot be baked (unsupported kind, degenerate timing)
//! - Texture dimension limits
//! - Missing or malformed rigs
//! - Artifact writing (I/O, image encoding, JSON)
//!
//! None of these are fatal to a batch. The orchestrator uses
//! [`BakeError::is_clip_local`] to decide whether a failure skips a single
//! clip or the whole asset entry.

use thiserror::Error;

use crate::animation::ClipKind;

/// Texture axis that exceeded the configured maximum dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridAxis {
    /// Columns (vertex count).
    Width,
    /// Rows (frame count).
    Height,
}

impl std::fmt::Display for GridAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridAxis::Width => f.write_str("width"),
            GridAxis::Height => f.write_str("height"),
        }
    }
}

/// The main error type for the baker.
#[derive(Error, Debug)]
pub enum BakeError {
    // ========================================================================
    // Clip Errors (skip the clip, continue with the next one)
    // ========================================================================
    /// The clip cannot be sampled by simple time indexing.
    #[error("Clip '{clip}' is not bakeable: {kind:?} clips cannot be sampled by time")]
    UnsupportedClip {
        /// Clip name
        clip: String,
        /// The clip's declared kind
        kind: ClipKind,
    },

    /// The clip has zero/negative duration or an unusable sample rate.
    #[error("Clip '{clip}' is degenerate: {reason}")]
    DegenerateClip {
        /// Clip name
        clip: String,
        /// Human readable reason
        reason: String,
    },

    /// Vertex count or frame count exceeds the maximum texture dimension.
    #[error("Clip '{clip}' needs texture {axis} {size}, maximum is {max}")]
    DimensionOverflow {
        /// Clip name
        clip: String,
        /// Which axis overflowed
        axis: GridAxis,
        /// Required size (already rounded to a power of two)
        size: u64,
        /// Configured limit
        max: u32,
    },

    /// A sampled frame did not match the asset's fixed vertex layout.
    #[error(
        "Clip '{clip}' frame {frame}: sub-mesh {submesh} has {actual} vertices, expected {expected}"
    )]
    TopologyChanged {
        /// Clip name
        clip: String,
        /// Frame row index
        frame: usize,
        /// Sub-mesh index
        submesh: usize,
        /// Vertex count declared by the asset
        expected: usize,
        /// Vertex count found in the snapshot
        actual: usize,
    },

    /// A clip index did not refer to any clip of the asset.
    #[error("Clip index out of bounds: {index} (asset has {count} clips)")]
    ClipIndexOutOfBounds {
        /// The invalid index
        index: usize,
        /// Number of clips on the asset
        count: usize,
    },

    // ========================================================================
    // Asset Errors (skip the whole asset entry)
    // ========================================================================
    /// No posable rig was found on the target.
    #[error("No posable rig found on '{0}'")]
    MissingAsset(String),

    /// The rig data is internally inconsistent.
    #[error("Invalid rig: {0}")]
    InvalidRig(String),

    // ========================================================================
    // Artifact Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image encoding error.
    #[error("Image encode error: {0}")]
    ImageEncode(String),
}

impl BakeError {
    /// Returns `true` when the failure concerns a single clip and the
    /// remaining clips of the same asset can still be baked.
    #[must_use]
    pub fn is_clip_local(&self) -> bool {
        !matches!(self, Self::MissingAsset(_) | Self::InvalidRig(_))
    }
}

impl From<image::ImageError> for BakeError {
    fn from(err: image::ImageError) -> Self {
        BakeError::ImageEncode(err.to_string())
    }
}

/// Alias for `Result<T, BakeError>`.
pub type Result<T> = std::result::Result<T, BakeError>;
