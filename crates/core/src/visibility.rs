//! Typewriter reveal timing.
//!
//! A [`VisibilityCurve`] maps playback time to the fraction of a dialogue line that is
//! visible. The authored (editor) curve is defined over the normalized reveal interval
//! `[0, 1]`; the runtime curve is a copy that wait tags may rescale.
//!
//! # Contracts
//! - **Invariant**: `start_offset + end_offset <= duration` after every setter.
//! - **Invariant**: [`VisibilityCurve::interval_at`] is always within `[0, 1]`.
//! - **Postcondition**: [`VisibilityCurve::apply_pauses`] derives the runtime curve from the
//!   editor keys only, so reapplying it never compounds.

use serde::{Deserialize, Serialize};

use crate::curve::{AnimationCurve, CurveError};
use crate::tags::WaitPoint;

/// Half-width of the central difference used by [`VisibilityCurve::tangent_at`].
pub const TANGENT_EPSILON: f32 = 0.001;

/// Most frames [`VisibilityCurve::time_for_index`] samples; longer clips use a coarser step.
pub const MAX_SCAN_FRAMES: usize = 1 << 16;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisibilityCurve {
    editor: AnimationCurve,
    runtime: AnimationCurve,
    duration: f32,
    start_offset: f32,
    end_offset: f32,
}

impl VisibilityCurve {
    /// A curve revealing over `duration` seconds, with no offsets.
    pub fn new(editor: AnimationCurve, duration: f32) -> Self {
        let duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        Self {
            runtime: editor.clone(),
            editor,
            duration,
            start_offset: 0.0,
            end_offset: 0.0,
        }
    }

    /// Linear reveal from nothing to the whole line.
    pub fn linear(duration: f32) -> Self {
        Self::new(AnimationCurve::linear(0.0, 0.0, 1.0, 1.0), duration)
    }

    pub fn with_offsets(mut self, start_offset: f32, end_offset: f32) -> Self {
        self.set_start_offset(start_offset);
        self.set_end_offset(end_offset);
        self
    }

    pub fn editor(&self) -> &AnimationCurve {
        &self.editor
    }

    pub fn runtime(&self) -> &AnimationCurve {
        &self.runtime
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn start_offset(&self) -> f32 {
        self.start_offset
    }

    pub fn end_offset(&self) -> f32 {
        self.end_offset
    }

    /// Seconds between the end of the start offset and the start of the end offset.
    pub fn effective_duration(&self) -> f32 {
        self.duration - self.start_offset - self.end_offset
    }

    /// Clamped so the offsets never exceed the duration.
    pub fn set_start_offset(&mut self, offset: f32) {
        self.start_offset = fit_offset(offset, self.end_offset, self.duration);
    }

    /// Clamped so the offsets never exceed the duration.
    pub fn set_end_offset(&mut self, offset: f32) {
        self.end_offset = fit_offset(offset, self.start_offset, self.duration);
    }

    /// Changes the duration, shrinking the end offset first and then the start offset if needed.
    pub fn set_duration(&mut self, duration: f32) {
        self.duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        if self.start_offset + self.end_offset > self.duration {
            self.start_offset = self.start_offset.min(self.duration);
            self.end_offset = fit_offset(self.end_offset, self.start_offset, self.duration);
        }
    }

    /// Replaces the authored curve and discards any rescaled runtime keys.
    pub fn set_editor(&mut self, editor: AnimationCurve) {
        self.runtime = editor.clone();
        self.editor = editor;
    }

    /// Restores the runtime curve to the authored keys.
    pub fn reset_runtime(&mut self) {
        self.runtime = self.editor.clone();
    }

    /// Normalized reveal position at `time` for a clip starting at `start_time`.
    ///
    /// A zero effective duration reveals everything as soon as the start offset elapses.
    pub fn interval_at(&self, time: f32, start_time: f32) -> f32 {
        let elapsed = time - start_time - self.start_offset;
        let effective = self.effective_duration();
        if effective <= 0.0 {
            return if elapsed >= 0.0 { 1.0 } else { 0.0 };
        }
        let interval = (elapsed / effective).clamp(0.0, 1.0);
        if interval.is_nan() {
            0.0
        } else {
            interval
        }
    }

    pub fn visibility_at(&self, time: f32, start_time: f32) -> f32 {
        self.runtime
            .evaluate(self.interval_at(time, start_time))
            .clamp(0.0, 1.0)
    }

    /// Number of characters visible at `time`.
    pub fn index_at(&self, time: f32, start_time: f32, text_len: usize) -> usize {
        (self.visibility_at(time, start_time) * text_len as f32).round() as usize
    }

    /// First frame at which `index` characters are visible.
    ///
    /// Scans forward from `start_time` in steps of `frame_step` seconds until the clip ends.
    /// Clips longer than [`MAX_SCAN_FRAMES`] frames are scanned with a proportionally larger
    /// step, so the answer is then accurate to `duration / MAX_SCAN_FRAMES`.
    ///
    /// Index zero with a positive start offset resolves to the frame where the reveal begins
    /// rather than to `start_time`. Returns `None` when no frame qualifies, for example when
    /// `index` exceeds `text_len`.
    pub fn time_for_index(
        &self,
        index: usize,
        start_time: f32,
        text_len: usize,
        frame_step: f32,
    ) -> Option<f32> {
        if index > text_len || !(frame_step > 0.0) {
            return None;
        }
        let frame_step = frame_step.max(self.duration / MAX_SCAN_FRAMES as f32);
        let frames = ((self.duration / frame_step).ceil() as usize).min(MAX_SCAN_FRAMES);
        let end = start_time + self.duration;
        let first_reveal = index == 0 && self.start_offset > 0.0;
        let mut previous = 0.0f32;
        for frame in 0..=frames {
            let time = if frame == frames {
                end
            } else {
                (start_time + frame as f32 * frame_step).min(end)
            };
            if first_reveal {
                let visibility = self.visibility_at(time, start_time);
                if previous <= 0.0 && visibility > 0.0 {
                    return Some(time);
                }
                previous = visibility;
            } else if self.index_at(time, start_time, text_len) >= index {
                return Some(time);
            }
        }
        None
    }

    /// Reveal speed at `time`, as the slope of the runtime curve over the normalized interval.
    pub fn tangent_at(&self, time: f32, start_time: f32) -> f32 {
        let interval = self.interval_at(time, start_time);
        let low = (interval - TANGENT_EPSILON).max(0.0);
        let high = (interval + TANGENT_EPSILON).min(1.0);
        if high <= low {
            return 0.0;
        }
        (self.runtime.evaluate(high) - self.runtime.evaluate(low)) / (high - low)
    }

    /// Rebuilds the runtime curve from the editor keys with a hold for every wait.
    ///
    /// The authored curve is first compressed in time by `(effective - pauses) / effective`,
    /// then each wait inserts a flat segment of `seconds / effective` at the point where exactly
    /// `index` characters are visible. The total normalized length is unchanged.
    pub fn apply_pauses(&mut self, waits: &[WaitPoint], text_len: usize) -> Result<(), CurveError> {
        self.reset_runtime();
        if waits.is_empty() {
            return Ok(());
        }
        let effective = self.effective_duration();
        if effective <= 0.0 {
            return Err(CurveError::ZeroDuration);
        }
        let pauses: f32 = waits.iter().map(|wait| wait.seconds).sum();
        if pauses >= effective {
            return Err(CurveError::PausesExceedDuration { pauses, effective });
        }

        let scaled = self.editor.scaled((effective - pauses) / effective, 1.0)?;
        let mut holds: Vec<(f32, f32)> = waits
            .iter()
            .filter(|wait| wait.seconds > 0.0)
            .filter_map(|wait| {
                let target = if text_len == 0 {
                    0.0
                } else {
                    wait.index.min(text_len) as f32 / text_len as f32
                };
                let at = scaled.time_for_value(target).or(scaled.end_time())?;
                Some((at, wait.seconds / effective))
            })
            .collect();
        // Latest first, so inserting a hold never moves a position still to be processed.
        holds.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut runtime = scaled;
        for (at, length) in holds {
            runtime.insert_hold(at, length);
        }
        self.runtime = runtime;
        Ok(())
    }
}

/// Largest offset up to `wanted` that fits beside `other` within `duration`.
///
/// Steps down by single ulps so the sum never rounds above `duration`.
fn fit_offset(wanted: f32, other: f32, duration: f32) -> f32 {
    let mut offset = wanted.max(0.0).min(duration - other).max(0.0);
    while offset > 0.0 && offset + other > duration {
        offset = f32::from_bits(offset.to_bits() - 1);
    }
    offset
}

#[cfg(test)]
#[path = "tests/visibility_tests.rs"]
mod tests;
