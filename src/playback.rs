//! Runtime-side time keeping for baked clips.
//!
//! A VAT renderable only needs an elapsed time; the shader turns it into a
//! row with the same mapping as [`BakedAnimationMap::frame_position`].

use crate::bake::BakedAnimationMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Stop on the last row.
    Once,
    /// Wrap back to row 0.
    #[default]
    Loop,
    /// Play forward, then backward.
    PingPong,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VatPlayback {
    pub duration: f32,
    /// Playhead. Ping-pong playback runs it over twice the clip length.
    pub time: f32,
    pub time_scale: f32,
    pub loop_mode: LoopMode,
    pub paused: bool,
}

impl VatPlayback {
    #[must_use]
    pub fn new(duration: f32, loop_mode: LoopMode) -> Self {
        Self {
            duration,
            time: 0.0,
            time_scale: 1.0,
            loop_mode,
            paused: false,
        }
    }

    #[must_use]
    pub fn for_map(map: &BakedAnimationMap, loop_mode: LoopMode) -> Self {
        Self::new(map.duration, loop_mode)
    }

    /// Advances by `dt` seconds and returns the wrapped time to feed the
    /// shader.
    pub fn advance(&mut self, dt: f32) -> f32 {
        if self.paused || self.duration <= 0.0 {
            return self.clip_time();
        }

        let duration = self.duration;
        let t = self.time + dt * self.time_scale;

        self.time = match self.loop_mode {
            LoopMode::Once => {
                if t >= duration || t < 0.0 {
                    self.paused = true;
                }
                t.clamp(0.0, duration)
            }
            LoopMode::Loop => t.rem_euclid(duration),
            // Kept unreflected in [0, 2 * duration) so direction survives
            LoopMode::PingPong => t.rem_euclid(duration * 2.0),
        };
        self.clip_time()
    }

    /// Position inside the clip, in `[0, duration]`.
    #[must_use]
    pub fn clip_time(&self) -> f32 {
        match self.loop_mode {
            LoopMode::PingPong if self.time > self.duration => 2.0 * self.duration - self.time,
            _ => self.time,
        }
    }

    /// Nearest baked row for the current time.
    #[must_use]
    pub fn row(&self, map: &BakedAnimationMap) -> u32 {
        map.row_for_time(self.clip_time())
    }
}
