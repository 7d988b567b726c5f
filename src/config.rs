//! Bake Settings
//!
//! Knobs shared by every clip of a batch. Settings can be built in code or
//! read from JSON; absent keys keep their defaults.
//!
//! ```rust,ignore
//! use vat::config::{BakeSettings, VertexSpace};
//!
//! let settings = BakeSettings {
//!     vertex_space: VertexSpace::World,
//!     ..Default::default()
//! };
//!
//! let settings = BakeSettings::from_json_str(r#"{ "max_texture_dimension": 4096 }"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Largest texture edge most desktop GPUs accept.
pub const DEFAULT_MAX_TEXTURE_DIMENSION: u32 = 16384;

/// Coordinate space of the baked vertex data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexSpace {
    /// Rig-root space; the runtime object's transform places the mesh.
    #[default]
    Local,
    /// Rig-root space multiplied by the rig's root transform.
    World,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeSettings {
    /// Upper bound for both grid width (vertices) and height (frames).
    pub max_texture_dimension: u32,
    pub vertex_space: VertexSpace,
    /// When set, used instead of each clip's native sample rate.
    pub sample_rate_override: Option<f32>,
}

impl Default for BakeSettings {
    fn default() -> Self {
        Self {
            max_texture_dimension: DEFAULT_MAX_TEXTURE_DIMENSION,
            vertex_space: VertexSpace::Local,
            sample_rate_override: None,
        }
    }
}

impl BakeSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sample rate to use for a clip whose native rate is `native`.
    #[inline]
    #[must_use]
    pub fn effective_sample_rate(&self, native: f32) -> f32 {
        self.sample_rate_override.unwrap_or(native)
    }
}
