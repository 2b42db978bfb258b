//! Processor evaluation.
//!
//! Processor nodes form small expression trees wired into the data sockets of flow nodes.
//! A value is pulled on demand: [`ProcessorContext::get_value`] resolves every input of the
//! node depth-first, in input order, then applies the node's [`process`] function.
//!
//! # Contracts
//! - **Invariant**: nothing is cached; each pull re-evaluates the whole upstream tree.
//! - **Postcondition**: a pull deeper than the configured limit fails with
//!   [`ProcessorError::DepthExceeded`] instead of recursing without bound.

use std::collections::BTreeMap;
use std::fmt;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::graph::{Graph, Node, NodeId, NodeIndex};
use crate::registry::NodeKind;
use crate::value::Value;

/// Blackboard variables visible to `Property` processors and written by `Set` nodes.
pub type Variables = BTreeMap<String, Value>;

#[derive(Clone, Debug, PartialEq, Error, Diagnostic)]
pub enum ProcessorError {
    #[error("unsupported comparison `{value}`")]
    #[diagnostic(
        code(ds::processor::comparison),
        help("Use 0..=5 or one of Equal, NotEqual, Less, LessOrEqual, Greater, GreaterOrEqual")
    )]
    UnsupportedComparison { value: String },

    #[error("processor {node} expected a number, found {found}")]
    #[diagnostic(code(ds::processor::not_numeric))]
    NotNumeric { node: NodeId, found: &'static str },

    #[error("processor {node} expected a boolean, found {found}")]
    #[diagnostic(code(ds::processor::not_boolean))]
    NotBoolean { node: NodeId, found: &'static str },

    #[error("input {port} of node {node} is not connected")]
    #[diagnostic(code(ds::processor::missing_input))]
    MissingInput { node: NodeId, port: i32 },

    #[error("processor {node} has no `{key}` in its payload")]
    #[diagnostic(code(ds::processor::missing_payload))]
    MissingPayload { node: NodeId, key: &'static str },

    #[error("processor {node} reads unknown property `{name}`")]
    #[diagnostic(code(ds::processor::unknown_property))]
    UnknownProperty { node: NodeId, name: String },

    #[error("node {node} is a {kind} node, not a processor")]
    #[diagnostic(code(ds::processor::not_a_processor))]
    NotAProcessor { node: NodeId, kind: NodeKind },

    #[error("processor {node} has no output port {port}")]
    #[diagnostic(code(ds::processor::output))]
    NoSuchOutput { node: NodeId, port: i32 },

    #[error("node index {index} is not part of the graph")]
    #[diagnostic(code(ds::processor::unknown_node))]
    UnknownNode { index: u32 },

    #[error("processor pull exceeded depth {limit} at node {node}")]
    #[diagnostic(
        code(ds::processor::depth),
        help("Processor trees must not contain cycles")
    )]
    DepthExceeded { node: NodeId, limit: usize },
}

/// The six numeric comparisons a `Compare` processor can apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Comparison {
    pub const ALL: [Comparison; 6] = [
        Comparison::Equal,
        Comparison::NotEqual,
        Comparison::Less,
        Comparison::LessOrEqual,
        Comparison::Greater,
        Comparison::GreaterOrEqual,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Comparison::Equal => "Equal",
            Comparison::NotEqual => "NotEqual",
            Comparison::Less => "Less",
            Comparison::LessOrEqual => "LessOrEqual",
            Comparison::Greater => "Greater",
            Comparison::GreaterOrEqual => "GreaterOrEqual",
        }
    }

    /// Accepts the variant name or its operator symbol.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Equal" | "==" => Some(Comparison::Equal),
            "NotEqual" | "!=" => Some(Comparison::NotEqual),
            "Less" | "<" => Some(Comparison::Less),
            "LessOrEqual" | "<=" => Some(Comparison::LessOrEqual),
            "Greater" | ">" => Some(Comparison::Greater),
            "GreaterOrEqual" | ">=" => Some(Comparison::GreaterOrEqual),
            _ => None,
        }
    }

    /// Decodes a payload value: an integer discriminant or a name.
    pub fn from_value(value: &Value) -> Result<Self, ProcessorError> {
        match value {
            Value::Int(raw) => Self::try_from(*raw),
            Value::String(name) => {
                Self::from_name(name).ok_or_else(|| ProcessorError::UnsupportedComparison {
                    value: name.clone(),
                })
            }
            other => Err(ProcessorError::UnsupportedComparison {
                value: other.to_string(),
            }),
        }
    }

    pub fn evaluate(self, left: f64, right: f64) -> bool {
        match self {
            Comparison::Equal => left == right,
            Comparison::NotEqual => left != right,
            Comparison::Less => left < right,
            Comparison::LessOrEqual => left <= right,
            Comparison::Greater => left > right,
            Comparison::GreaterOrEqual => left >= right,
        }
    }
}

impl TryFrom<i64> for Comparison {
    type Error = ProcessorError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        usize::try_from(raw)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or(ProcessorError::UnsupportedComparison {
                value: raw.to_string(),
            })
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Computes a processor node's `output` from its already resolved inputs.
///
/// Every built-in processor has exactly one output, port 0.
pub fn process(
    node: &Node,
    inputs: &[Value],
    output: i32,
    variables: &Variables,
) -> Result<Value, ProcessorError> {
    if node.kind.is_processor() && output != 0 {
        return Err(ProcessorError::NoSuchOutput {
            node: node.id,
            port: output,
        });
    }
    let input = |index: usize| {
        inputs.get(index).ok_or(ProcessorError::MissingInput {
            node: node.id,
            port: index as i32,
        })
    };
    let number = |index: usize| -> Result<f64, ProcessorError> {
        let value = input(index)?;
        value.as_f64().ok_or(ProcessorError::NotNumeric {
            node: node.id,
            found: value.kind_name(),
        })
    };
    let boolean = |index: usize| -> Result<bool, ProcessorError> {
        let value = input(index)?;
        value.as_bool().ok_or(ProcessorError::NotBoolean {
            node: node.id,
            found: value.kind_name(),
        })
    };
    let payload = |key: &'static str| {
        node.payload.get(key).ok_or(ProcessorError::MissingPayload {
            node: node.id,
            key,
        })
    };

    match node.kind {
        NodeKind::Value => payload("value").cloned(),
        NodeKind::Compare => {
            let comparison = Comparison::from_value(payload("comparison")?)?;
            Ok(Value::Bool(comparison.evaluate(number(0)?, number(1)?)))
        }
        NodeKind::Property => {
            let name = payload("property")?
                .as_str()
                .ok_or(ProcessorError::MissingPayload {
                    node: node.id,
                    key: "property",
                })?;
            variables
                .get(name)
                .cloned()
                .ok_or_else(|| ProcessorError::UnknownProperty {
                    node: node.id,
                    name: name.to_string(),
                })
        }
        NodeKind::Not => Ok(Value::Bool(!boolean(0)?)),
        NodeKind::And => Ok(Value::Bool(boolean(0)? & boolean(1)?)),
        NodeKind::Or => Ok(Value::Bool(boolean(0)? | boolean(1)?)),
        kind => Err(ProcessorError::NotAProcessor {
            node: node.id,
            kind,
        }),
    }
}

/// Read-only view used to pull processor values out of a graph.
#[derive(Clone, Copy, Debug)]
pub struct ProcessorContext<'a> {
    graph: &'a Graph,
    variables: &'a Variables,
    max_depth: Option<usize>,
}

impl<'a> ProcessorContext<'a> {
    pub fn new(graph: &'a Graph, variables: &'a Variables) -> Self {
        Self {
            graph,
            variables,
            max_depth: None,
        }
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Evaluates the processor at `node`, as seen from its output `port`.
    pub fn get_value(&self, node: NodeIndex, port: i32) -> Result<Value, ProcessorError> {
        self.get_value_at(node, port, 0)
    }

    /// Evaluates whatever feeds input `port` of `consumer`.
    pub fn pull_input(&self, consumer: NodeIndex, port: i32) -> Result<Value, ProcessorError> {
        self.pull_input_at(consumer, port, 0)
    }

    fn pull_input_at(
        &self,
        consumer: NodeIndex,
        port: i32,
        depth: usize,
    ) -> Result<Value, ProcessorError> {
        let node = self.node(consumer)?;
        let source = self
            .graph
            .source(consumer, port)
            .ok_or(ProcessorError::MissingInput {
                node: node.id,
                port,
            })?;
        self.get_value_at(source.node, source.number, depth + 1)
    }

    fn get_value_at(
        &self,
        index: NodeIndex,
        port: i32,
        depth: usize,
    ) -> Result<Value, ProcessorError> {
        let node = self.node(index)?;
        if let Some(limit) = self.max_depth {
            if depth > limit {
                warn!(node = %node.id, limit, "processor depth guard tripped");
                return Err(ProcessorError::DepthExceeded {
                    node: node.id,
                    limit,
                });
            }
        }
        if !node.kind.is_processor() {
            return Err(ProcessorError::NotAProcessor {
                node: node.id,
                kind: node.kind,
            });
        }

        let layout = node.kind.layout(&node.payload);
        let mut inputs = Vec::with_capacity(layout.inputs as usize);
        for input in 0..layout.inputs as i32 {
            inputs.push(self.pull_input_at(index, input, depth)?);
        }
        process(node, &inputs, port, self.variables)
    }

    fn node(&self, index: NodeIndex) -> Result<&'a Node, ProcessorError> {
        self.graph
            .node(index)
            .ok_or(ProcessorError::UnknownNode { index: index.0 })
    }
}

#[cfg(test)]
#[path = "tests/processor_tests.rs"]
mod tests;
