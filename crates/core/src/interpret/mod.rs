//! Graph interpretation.
//!
//! A [`Walker`] starts at a named entry node and follows continue edges, letting each node
//! kind emit clips into a [`ClipSequence`]. Choice and action nodes park the walk in a
//! [`Suspension`]; the scheduler resumes it later with the option the player picked.
//!
//! # Contracts
//! - **Precondition**: the graph is not mutated between a suspension and its resume.
//! - **Invariant**: clips appear in emission order, each placed relative to the
//!   [`PreviousContext`] left by the clip before it.
//! - **Postcondition**: resuming the same suspension with the same option yields the same clips.
//! - **Postcondition**: a walk that visits more nodes than `max_walk_depth` without suspending
//!   fails with [`WalkError::DepthExceeded`]. Revisiting nodes is otherwise allowed and
//!   re-emits their clips.

use miette::Diagnostic;
use thiserror::Error;

use crate::curve::CurveError;
use crate::graph::NodeId;
use crate::processor::ProcessorError;
use crate::registry::NodeKind;
use crate::tags::TagError;

mod clip;
mod context;
mod walker;

pub use clip::{Clip, ClipKind, ClipSequence};
pub use context::{PreviousContext, Suspension};
pub use walker::{Walk, WalkOutcome, Walker};

#[derive(Clone, Debug, PartialEq, Error, Diagnostic)]
pub enum WalkError {
    #[error("no entry node named `{name}`")]
    #[diagnostic(code(ds::walk::entry))]
    MissingEntry { name: String },

    #[error("node {node} offers {available} options, option {option} was chosen")]
    #[diagnostic(code(ds::walk::option))]
    InvalidOption {
        node: NodeId,
        option: usize,
        available: usize,
    },

    #[error("suspension at node {node} does not belong to this graph")]
    #[diagnostic(code(ds::walk::stale))]
    StaleSuspension { node: NodeId },

    #[error("node {node} requires payload key `{key}`")]
    #[diagnostic(code(ds::walk::missing_field))]
    MissingField { node: NodeId, key: &'static str },

    #[error("payload key `{key}` of node {node}: {reason}")]
    #[diagnostic(code(ds::walk::invalid_field))]
    InvalidField {
        node: NodeId,
        key: &'static str,
        reason: String,
    },

    #[error("text of node {node} is {length} bytes, limit is {limit}")]
    #[diagnostic(
        code(ds::walk::text_length),
        help("Raise `limits.max_text_length` in the runtime config")
    )]
    TextTooLong {
        node: NodeId,
        length: usize,
        limit: usize,
    },

    #[error("node {node} expected a boolean input, found {found}")]
    #[diagnostic(code(ds::walk::not_boolean))]
    NotBoolean { node: NodeId, found: &'static str },

    #[error("node {node} expected a numeric input, found {found}")]
    #[diagnostic(code(ds::walk::not_numeric))]
    NotNumeric { node: NodeId, found: &'static str },

    #[error("walk visited more than {limit} nodes without suspending, last at {node}")]
    #[diagnostic(
        code(ds::walk::depth),
        help("Check the graph for a loop with no choice in it, or raise `max_walk_depth`")
    )]
    DepthExceeded { node: NodeId, limit: usize },

    #[error("node {node} of kind {kind} cannot take part in the flow")]
    #[diagnostic(code(ds::walk::not_interpretable))]
    NotInterpretable { node: NodeId, kind: NodeKind },

    #[error("node index {index} is not part of the graph")]
    #[diagnostic(code(ds::walk::unknown_node))]
    UnknownNode { index: u32 },

    #[error("text of node {node} has malformed tags")]
    #[diagnostic(code(ds::walk::tag))]
    Tag {
        node: NodeId,
        #[source]
        source: TagError,
    },

    #[error("data input of node {node} failed to evaluate")]
    #[diagnostic(code(ds::walk::processor))]
    Processor {
        node: NodeId,
        #[source]
        source: ProcessorError,
    },

    #[error("reveal curve of node {node} is invalid")]
    #[diagnostic(code(ds::walk::curve))]
    Curve {
        node: NodeId,
        #[source]
        source: CurveError,
    },
}

#[cfg(test)]
#[path = "../tests/walker_tests.rs"]
mod tests;
