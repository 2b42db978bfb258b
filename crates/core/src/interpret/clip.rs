use serde::{Deserialize, Serialize};

use crate::graph::NodeId;
use crate::tags::{TagInstance, TextEffects};
use crate::visibility::VisibilityCurve;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClipKind {
    Dialogue,
    Choice,
    Action,
    Marker,
    Blend,
}

/// One timed unit of output handed to the scheduler.
///
/// Marker clips carry the marker name in `text`; blend clips carry their target there.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub kind: ClipKind,
    pub node: NodeId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub actor: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    pub start_time: f32,
    pub duration: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagInstance>,
    #[serde(default, skip_serializing_if = "TextEffects::is_empty")]
    pub effects: TextEffects,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<VisibilityCurve>,
}

impl Clip {
    pub fn new(kind: ClipKind, node: NodeId, start_time: f32, duration: f32) -> Self {
        Self {
            kind,
            node,
            actor: String::new(),
            text: String::new(),
            choices: Vec::new(),
            start_time,
            duration,
            tags: Vec::new(),
            effects: TextEffects::default(),
            visibility: None,
        }
    }

    pub fn end_time(&self) -> f32 {
        self.start_time + self.duration
    }

    /// Characters visible at absolute `time`; the whole text when the clip has no reveal curve.
    pub fn visible_chars(&self, time: f32) -> usize {
        let len = self.text.chars().count();
        match &self.visibility {
            Some(curve) => curve.index_at(time, self.start_time, len),
            None => len,
        }
    }

    /// First sampled time at which `index` characters are visible, scanning in `frame_step`
    /// increments. Clips without a reveal curve show everything at `start_time`.
    pub fn reveal_time(&self, index: usize, frame_step: f32) -> Option<f32> {
        let len = self.text.chars().count();
        match &self.visibility {
            Some(curve) => curve.time_for_index(index, self.start_time, len, frame_step),
            None => (index <= len).then_some(self.start_time),
        }
    }
}

/// Clips in emission order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipSequence {
    clips: Vec<Clip>,
}

impl ClipSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, clip: Clip) {
        self.clips.push(clip);
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Clip> {
        self.clips.iter()
    }

    /// Latest end time over all clips, 0 when empty.
    pub fn end_time(&self) -> f32 {
        self.clips
            .iter()
            .map(Clip::end_time)
            .fold(0.0, f32::max)
    }

    pub fn extend(&mut self, other: ClipSequence) {
        self.clips.extend(other.clips);
    }

    pub fn into_vec(self) -> Vec<Clip> {
        self.clips
    }
}

impl<'a> IntoIterator for &'a ClipSequence {
    type Item = &'a Clip;
    type IntoIter = std::slice::Iter<'a, Clip>;

    fn into_iter(self) -> Self::IntoIter {
        self.clips.iter()
    }
}

impl IntoIterator for ClipSequence {
    type Item = Clip;
    type IntoIter = std::vec::IntoIter<Clip>;

    fn into_iter(self) -> Self::IntoIter {
        self.clips.into_iter()
    }
}
