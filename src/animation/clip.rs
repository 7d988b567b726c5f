use glam::{Quat, Vec3};

use crate::animation::tracks::KeyframeTrack;

/// Default native sample rate for clips that do not declare one.
pub const DEFAULT_SAMPLE_RATE: f32 = 30.0;

/// How a clip is meant to be evaluated.
///
/// Only [`ClipKind::Legacy`] clips are plain time-indexed poses; the others
/// depend on a runtime graph (retargeting, layering) and are not bakeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipKind {
    Legacy,
    Generic,
    Humanoid,
    Additive,
}

impl ClipKind {
    #[inline]
    #[must_use]
    pub fn is_time_indexed(self) -> bool {
        matches!(self, Self::Legacy)
    }
}

/// Joint property driven by a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetPath {
    Translation,
    Rotation,
    Scale,
}

#[derive(Debug, Clone)]
pub enum TrackData {
    Vector3(KeyframeTrack<Vec3>),
    Quaternion(KeyframeTrack<Quat>),
}

impl TrackData {
    #[must_use]
    pub fn end_time(&self) -> f32 {
        match self {
            TrackData::Vector3(track) => track.end_time(),
            TrackData::Quaternion(track) => track.end_time(),
        }
    }
}

/// One animated joint property.
#[derive(Debug, Clone)]
pub struct Track {
    /// Name of the joint this track drives.
    pub joint: String,
    pub target: TargetPath,
    pub data: TrackData,
}

impl Track {
    #[must_use]
    pub fn translation(joint: &str, track: KeyframeTrack<Vec3>) -> Self {
        Self {
            joint: joint.to_string(),
            target: TargetPath::Translation,
            data: TrackData::Vector3(track),
        }
    }

    #[must_use]
    pub fn rotation(joint: &str, track: KeyframeTrack<Quat>) -> Self {
        Self {
            joint: joint.to_string(),
            target: TargetPath::Rotation,
            data: TrackData::Quaternion(track),
        }
    }

    #[must_use]
    pub fn scale(joint: &str, track: KeyframeTrack<Vec3>) -> Self {
        Self {
            joint: joint.to_string(),
            target: TargetPath::Scale,
            data: TrackData::Vector3(track),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    /// Length in seconds.
    pub duration: f32,
    /// Native frames per second.
    pub sample_rate: f32,
    pub kind: ClipKind,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    /// Creates a legacy clip whose duration is the last key time over all
    /// tracks.
    #[must_use]
    pub fn new(name: &str, tracks: Vec<Track>) -> Self {
        let duration = tracks
            .iter()
            .map(|t| t.data.end_time())
            .fold(0.0_f32, f32::max);

        Self {
            name: name.to_string(),
            duration,
            sample_rate: DEFAULT_SAMPLE_RATE,
            kind: ClipKind::Legacy,
            tracks,
        }
    }

    #[must_use]
    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: ClipKind) -> Self {
        self.kind = kind;
        self
    }
}
