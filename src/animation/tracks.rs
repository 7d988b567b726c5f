use crate::animation::values::Interpolatable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    Linear,
    Step,
    CubicSpline,
}

/// Keyframed values over time.
///
/// For [`InterpolationMode::CubicSpline`] `values` holds three entries per key
/// (`in_tangent`, `value`, `out_tangent`), glTF style.
#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    pub times: Vec<f32>,
    pub values: Vec<T>,
    pub interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    #[must_use]
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Self {
        Self {
            times,
            values,
            interpolation,
        }
    }

    /// Time of the last key, or `0.0` for an empty track.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Evaluates the track at `time`.
    ///
    /// Stateless: the same `time` always yields the same value, which is what
    /// frame baking relies on. Times outside the key range clamp to the first
    /// or last key. Returns `None` when the track has no keys or its value
    /// array is too short for the interpolation mode.
    #[must_use]
    pub fn sample(&self, time: f32) -> Option<T> {
        let len = self.times.len();
        if len == 0 {
            return None;
        }
        let stride = match self.interpolation {
            InterpolationMode::CubicSpline => 3,
            _ => 1,
        };
        if self.values.len() < len * stride {
            return None;
        }

        // First key strictly after `time`
        let next = self.times.partition_point(|&t| t <= time);
        if next == 0 {
            return Some(self.key_value(0));
        }
        if next >= len {
            return Some(self.key_value(len - 1));
        }

        let index = next - 1;
        let t0 = self.times[index];
        let t1 = self.times[next];
        let dt = t1 - t0;
        let s = if dt > 1e-6 { ((time - t0) / dt).clamp(0.0, 1.0) } else { 0.0 };

        Some(match self.interpolation {
            InterpolationMode::Step => self.key_value(index),
            InterpolationMode::Linear => {
                T::interpolate_linear(self.key_value(index), self.key_value(next), s)
            }
            InterpolationMode::CubicSpline => T::interpolate_cubic(
                self.values[index * 3 + 1],
                self.values[index * 3 + 2],
                self.values[next * 3],
                self.values[next * 3 + 1],
                s,
                dt,
            ),
        })
    }

    fn key_value(&self, index: usize) -> T {
        match self.interpolation {
            InterpolationMode::CubicSpline => self.values[index * 3 + 1],
            _ => self.values[index],
        }
    }
}
