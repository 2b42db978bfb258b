//! The flat JSON document a graph is stored as.
//!
//! ```json
//! {
//!   "Version": 1,
//!   "ObjectID": "intro",
//!   "Properties": [{ "ID": "...", "Type": "Int", "Name": "gold", "Value": 3 }],
//!   "Nodes": [{ "ID": "<32 hex>", "Type": "DialogueNode", "Binder": "Dialogue" }],
//!   "Edges": [{ "OutputPort": { "NodeID": "<32 hex>", "PortNumber": 0 },
//!               "InputPort":  { "NodeID": "<32 hex>", "PortNumber": 0 } }],
//!   "Positions": [{ "x": 0, "y": 0 }],
//!   "Data": [{ "actorID": "hero", "text": "Hello" }]
//! }
//! ```
//!
//! `Positions` and `Data` run parallel to `Nodes`. Ids stay strings here; the deserializer
//! validates them so errors can name the offending value.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::Limits;
use crate::deserialize::DeserializeError;
use crate::graph::{Graph, Position};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct GraphDocument {
    pub version: i32,
    #[serde(rename = "ObjectID", default)]
    pub object_id: String,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
    #[serde(default)]
    pub positions: Vec<Position>,
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct PropertyRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Type", default)]
    pub kind: String,
    pub name: String,
    pub value: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct NodeRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Type", default)]
    pub node_type: String,
    pub binder: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct EdgeRecord {
    pub output_port: PortRecord,
    pub input_port: PortRecord,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct PortRecord {
    #[serde(rename = "NodeID")]
    pub node_id: String,
    /// Negative numbers address secondary sockets, see [`crate::graph::flip`].
    pub port_number: i32,
}

impl GraphDocument {
    /// JSON schema of the document format.
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(GraphDocument)
    }

    /// Parses a document, refusing inputs larger than `limits.max_document_bytes`.
    pub fn from_json(input: &str, limits: &Limits) -> Result<Self, DeserializeError> {
        if input.len() > limits.max_document_bytes {
            return Err(DeserializeError::DocumentTooLarge {
                size: input.len(),
                limit: limits.max_document_bytes,
            });
        }
        serde_json::from_str(input).map_err(|err| json_deserialize_error(input, &err))
    }

    pub fn to_json_pretty(&self) -> Result<String, DeserializeError> {
        serde_json::to_string_pretty(self).map_err(|err| DeserializeError::Json {
            message: err.to_string(),
            src: String::new(),
            span: (0, 0).into(),
        })
    }
}

impl Graph {
    /// Writes the graph back into document form.
    ///
    /// Ids use the dashless form and edges keep arena order. Positions are emitted for every
    /// node as soon as one node carries one.
    pub fn to_document(&self) -> GraphDocument {
        let any_position = self.nodes().any(|(_, node)| node.position.is_some());
        GraphDocument {
            version: self.version,
            object_id: self.object_id.clone(),
            properties: self
                .properties()
                .iter()
                .map(|property| PropertyRecord {
                    id: property.id.simple().to_string(),
                    kind: property.kind.clone(),
                    name: property.name.clone(),
                    value: property.value.to_json(),
                })
                .collect(),
            nodes: self
                .nodes()
                .map(|(_, node)| NodeRecord {
                    id: node.id.to_string(),
                    node_type: node.node_type.clone(),
                    binder: node.binder.clone(),
                })
                .collect(),
            edges: self
                .edges()
                .iter()
                .filter_map(|edge| {
                    let output = self.node(edge.output.node)?;
                    let input = self.node(edge.input.node)?;
                    Some(EdgeRecord {
                        output_port: PortRecord {
                            node_id: output.id.to_string(),
                            port_number: edge.output.number,
                        },
                        input_port: PortRecord {
                            node_id: input.id.to_string(),
                            port_number: edge.input.number,
                        },
                    })
                })
                .collect(),
            positions: if any_position {
                self.nodes()
                    .map(|(_, node)| node.position.unwrap_or_default())
                    .collect()
            } else {
                Vec::new()
            },
            data: self
                .nodes()
                .map(|(_, node)| serde_json::Value::Object(node.payload.to_json_object()))
                .collect(),
        }
    }
}

#[cold]
#[inline(never)]
fn json_deserialize_error(input: &str, err: &serde_json::Error) -> DeserializeError {
    let offset = json_error_offset(input, err);
    let (window, local_offset) = json_error_window(input, offset);
    let span_len = usize::from(local_offset < window.len());
    DeserializeError::Json {
        message: err.to_string(),
        src: window,
        span: (local_offset, span_len).into(),
    }
}

/// Byte offset of serde_json's line/column position.
fn json_error_offset(input: &str, error: &serde_json::Error) -> usize {
    let (line, column) = (error.line(), error.column());
    if line == 0 || column == 0 {
        return 0;
    }
    let mut offset = 0usize;
    for (number, chunk) in input.split_inclusive('\n').enumerate() {
        if number + 1 == line {
            let byte_index = chunk
                .char_indices()
                .nth(column - 1)
                .map(|(index, _)| index)
                .unwrap_or(chunk.len().saturating_sub(1));
            return offset + byte_index;
        }
        offset += chunk.len();
    }
    input.len().saturating_sub(1)
}

/// Source excerpt around `offset`, cut on char boundaries, and the offset within it.
fn json_error_window(input: &str, offset: usize) -> (String, usize) {
    const CONTEXT: usize = 120;
    let mut start = offset.saturating_sub(CONTEXT);
    let mut end = (offset + 1 + CONTEXT).min(input.len());
    while start > 0 && !input.is_char_boundary(start) {
        start -= 1;
    }
    while end < input.len() && !input.is_char_boundary(end) {
        end += 1;
    }
    (input[start..end].to_string(), offset.saturating_sub(start))
}
