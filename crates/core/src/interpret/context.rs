use serde::{Deserialize, Serialize};

use crate::graph::{NodeId, NodeIndex};
use crate::processor::Variables;
use crate::registry::NodeKind;

use super::clip::{Clip, ClipKind};

/// Timing of the clip the next node is placed after.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviousContext {
    pub node: Option<NodeId>,
    pub kind: Option<ClipKind>,
    pub start_time: f32,
    pub duration: f32,
}

impl PreviousContext {
    /// Context before the first clip of a walk.
    pub fn origin() -> Self {
        Self::default()
    }

    pub fn end_time(&self) -> f32 {
        self.start_time + self.duration
    }

    /// Context after `clip` has been emitted.
    ///
    /// Markers leave the context untouched. Actions overlay the previous clip, so the
    /// context widens to cover both.
    pub fn advance(self, clip: &Clip) -> Self {
        match clip.kind {
            ClipKind::Marker => self,
            ClipKind::Action => {
                let start = self.start_time.min(clip.start_time);
                let end = self.end_time().max(clip.end_time());
                Self {
                    node: Some(clip.node),
                    kind: Some(clip.kind),
                    start_time: start,
                    duration: end - start,
                }
            }
            _ => Self {
                node: Some(clip.node),
                kind: Some(clip.kind),
                start_time: clip.start_time,
                duration: clip.duration,
            },
        }
    }
}

/// A walk parked on a branching node until the scheduler picks an option.
///
/// Holds everything [`super::Walker::resume`] needs, so the same suspension can be resumed
/// more than once with the same result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Suspension {
    pub node: NodeIndex,
    pub node_id: NodeId,
    pub kind: NodeKind,
    pub options: Vec<String>,
    pub previous: PreviousContext,
    pub variables: Variables,
}

impl Suspension {
    pub fn option_count(&self) -> usize {
        self.options.len()
    }
}

/// Mutable state threaded through one uninterrupted walk.
#[derive(Clone, Debug, Default)]
pub(crate) struct WalkState {
    pub previous: PreviousContext,
    pub variables: Variables,
    pub steps: usize,
}
