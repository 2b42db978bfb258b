//! Keyframed animation curves.
//!
//! Segments between keys are cubic Hermite splines with explicit in/out tangents,
//! expressed as slopes (dv/dt). Outside the key range the curve holds the first or
//! last value.
//!
//! # Contracts
//! - **Invariant**: keys are sorted by strictly increasing time.
//! - **Invariant**: all key fields are finite, except tangents, where an infinite
//!   tangent makes its segment stepped.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Samples used by [`AnimationCurve::time_for_value`] before bisecting.
const SEARCH_SAMPLES: usize = 256;
const BISECT_ITERATIONS: usize = 32;

/// A single curve key.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    pub in_tangent: f32,
    pub out_tangent: f32,
}

impl Keyframe {
    pub const fn new(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }

    /// A key with zero tangents.
    pub const fn flat(time: f32, value: f32) -> Self {
        Self::new(time, value, 0.0, 0.0)
    }
}

#[derive(Clone, Debug, PartialEq, Error, Diagnostic)]
pub enum CurveError {
    #[error("duplicate keyframe time: {time}")]
    #[diagnostic(
        code(ds::curve::duplicate_time),
        help("Keyframe times must be strictly increasing")
    )]
    DuplicateKeyframeTime { time: f32 },

    #[error("keyframe field `{field}` is not finite")]
    #[diagnostic(code(ds::curve::not_finite))]
    NotFinite { field: &'static str },

    #[error("curve scale must be positive, got {scale}")]
    #[diagnostic(code(ds::curve::scale))]
    InvalidScale { scale: f32 },

    #[error("pauses of {pauses}s do not fit in an effective duration of {effective}s")]
    #[diagnostic(
        code(ds::curve::pause_overflow),
        help("Lengthen the clip or shorten its wait tags")
    )]
    PausesExceedDuration { pauses: f32, effective: f32 },

    #[error("effective reveal duration is zero")]
    #[diagnostic(
        code(ds::curve::zero_duration),
        help("Duration must exceed start offset + end offset")
    )]
    ZeroDuration,
}

/// A sorted sequence of keyframes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationCurve {
    keys: Vec<Keyframe>,
}

impl AnimationCurve {
    /// Builds a curve, sorting the keys.
    pub fn new(mut keys: Vec<Keyframe>) -> Result<Self, CurveError> {
        for key in &keys {
            if !key.time.is_finite() {
                return Err(CurveError::NotFinite { field: "time" });
            }
            if !key.value.is_finite() {
                return Err(CurveError::NotFinite { field: "value" });
            }
            if key.in_tangent.is_nan() || key.out_tangent.is_nan() {
                return Err(CurveError::NotFinite { field: "tangent" });
            }
        }
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        if let Some(pair) = keys.windows(2).find(|pair| pair[0].time == pair[1].time) {
            return Err(CurveError::DuplicateKeyframeTime { time: pair[0].time });
        }
        Ok(Self { keys })
    }

    /// Straight line from `(t0, v0)` to `(t1, v1)`.
    pub fn linear(t0: f32, v0: f32, t1: f32, v1: f32) -> Self {
        let slope = if t1 != t0 { (v1 - v0) / (t1 - t0) } else { 0.0 };
        Self {
            keys: vec![
                Keyframe::new(t0, v0, slope, slope),
                Keyframe::new(t1, v1, slope, slope),
            ],
        }
    }

    /// Smoothstep from `(t0, v0)` to `(t1, v1)` with flat ends.
    pub fn ease_in_out(t0: f32, v0: f32, t1: f32, v1: f32) -> Self {
        Self {
            keys: vec![Keyframe::flat(t0, v0), Keyframe::flat(t1, v1)],
        }
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn start_time(&self) -> Option<f32> {
        self.keys.first().map(|k| k.time)
    }

    pub fn end_time(&self) -> Option<f32> {
        self.keys.last().map(|k| k.time)
    }

    /// Index of the segment containing `time`, if `time` is strictly inside the key range.
    fn segment(&self, time: f32) -> Option<usize> {
        let first = self.keys.first()?;
        let last = self.keys.last()?;
        if time <= first.time || time >= last.time {
            return None;
        }
        Some(self.keys.partition_point(|k| k.time <= time) - 1)
    }

    /// Evaluates the curve at `time`. An empty curve evaluates to zero.
    pub fn evaluate(&self, time: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }
        match self.segment(time) {
            Some(index) => hermite(&self.keys[index], &self.keys[index + 1], time),
            None => last.value,
        }
    }

    /// Analytic slope at `time`; zero outside the key range.
    pub fn derivative(&self, time: f32) -> f32 {
        match self.segment(time) {
            Some(index) => hermite_slope(&self.keys[index], &self.keys[index + 1], time),
            None => 0.0,
        }
    }

    /// Copy with times scaled by `scale_x` and values by `scale_y`.
    ///
    /// Tangents scale by `scale_y / scale_x`, which keeps every segment the exact
    /// affine image of the original.
    pub fn scaled(&self, scale_x: f32, scale_y: f32) -> Result<Self, CurveError> {
        if !(scale_x > 0.0) || !scale_x.is_finite() {
            return Err(CurveError::InvalidScale { scale: scale_x });
        }
        let tangent_scale = scale_y / scale_x;
        Ok(Self {
            keys: self
                .keys
                .iter()
                .map(|key| Keyframe {
                    time: key.time * scale_x,
                    value: key.value * scale_y,
                    in_tangent: key.in_tangent * tangent_scale,
                    out_tangent: key.out_tangent * tangent_scale,
                })
                .collect(),
        })
    }

    /// Earliest time at which the curve reaches `value`, searching forward from the first key.
    ///
    /// Coarse sampling followed by bisection; assumes the curve rises through `value` once
    /// in the bracketing interval.
    pub fn time_for_value(&self, value: f32) -> Option<f32> {
        let first = self.keys.first()?;
        let last = self.keys.last()?;
        if first.value >= value {
            return Some(first.time);
        }
        let span = last.time - first.time;
        let mut previous = first.time;
        for step in 1..=SEARCH_SAMPLES {
            let time = first.time + span * step as f32 / SEARCH_SAMPLES as f32;
            if self.evaluate(time) >= value {
                let (mut low, mut high) = (previous, time);
                for _ in 0..BISECT_ITERATIONS {
                    let mid = 0.5 * (low + high);
                    if self.evaluate(mid) >= value {
                        high = mid;
                    } else {
                        low = mid;
                    }
                }
                return Some(high);
            }
            previous = time;
        }
        None
    }

    /// Inserts a flat hold of `length` at `time`, shifting every later key.
    ///
    /// The segment containing `time` is split with its own value and slope, so the
    /// curve before and after the hold keeps its shape.
    pub fn insert_hold(&mut self, time: f32, length: f32) {
        if self.keys.is_empty() || length <= 0.0 {
            return;
        }
        let value = self.evaluate(time);
        let slope = self.derivative(time);
        let position = self.keys.partition_point(|k| k.time < time);

        if let Some(existing) = self.keys.get(position).copied() {
            if existing.time == time {
                for key in &mut self.keys[position + 1..] {
                    key.time += length;
                }
                self.keys[position].out_tangent = 0.0;
                self.keys.insert(
                    position + 1,
                    Keyframe::new(time + length, existing.value, 0.0, existing.out_tangent),
                );
                return;
            }
        }

        // Holding before the first key or after the last one only needs a flat pair.
        let (in_slope, out_slope) = if position == 0 || position == self.keys.len() {
            (0.0, 0.0)
        } else {
            (slope, slope)
        };
        for key in &mut self.keys[position..] {
            key.time += length;
        }
        self.keys.insert(position, Keyframe::new(time, value, in_slope, 0.0));
        self.keys.insert(
            position + 1,
            Keyframe::new(time + length, value, 0.0, out_slope),
        );
    }
}

fn hermite(k0: &Keyframe, k1: &Keyframe, time: f32) -> f32 {
    let dt = k1.time - k0.time;
    if dt <= 0.0 {
        return k1.value;
    }
    let m0 = k0.out_tangent * dt;
    let m1 = k1.in_tangent * dt;
    if !m0.is_finite() || !m1.is_finite() {
        return k0.value;
    }
    let t = (time - k0.time) / dt;
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    h00 * k0.value + h10 * m0 + h01 * k1.value + h11 * m1
}

fn hermite_slope(k0: &Keyframe, k1: &Keyframe, time: f32) -> f32 {
    let dt = k1.time - k0.time;
    if dt <= 0.0 {
        return 0.0;
    }
    let m0 = k0.out_tangent * dt;
    let m1 = k1.in_tangent * dt;
    if !m0.is_finite() || !m1.is_finite() {
        return 0.0;
    }
    let t = (time - k0.time) / dt;
    let t2 = t * t;
    let d00 = 6.0 * t2 - 6.0 * t;
    let d10 = 3.0 * t2 - 4.0 * t + 1.0;
    let d01 = -6.0 * t2 + 6.0 * t;
    let d11 = 3.0 * t2 - 2.0 * t;
    (d00 * k0.value + d10 * m0 + d01 * k1.value + d11 * m1) / dt
}

#[cfg(test)]
#[path = "tests/curve_tests.rs"]
mod tests;
