//! Document to graph conversion.
//!
//! Runs in two passes: nodes first, so that edges in the second pass can reference any node
//! regardless of document order.
//!
//! # Contracts
//! - **Precondition**: `Data` has one entry per node; `Positions` is empty or has one per node.
//! - **Postcondition**: every edge endpoint exists and every port is declared by its node's layout.
//! - **Postcondition**: data sockets are fed by processor nodes only.
//! - **Postcondition**: any failure yields an error naming the offending id, binder or port.
//!   No partial graph is returned.

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::config::Limits;
use crate::document::{GraphDocument, PortRecord};
use crate::graph::{Direction, Graph, Node, NodeId, NodeIndex, PortRef, PortSlot, PropertyDef};
use crate::registry::{NodeKind, NodeRegistry};
use crate::value::{Payload, Value};
use crate::version::{is_supported, GRAPH_FORMAT_VERSION};

/// Payload key holding an entry node's name.
pub const ENTRY_NAME_KEY: &str = "inputName";

#[derive(Debug, Error, Diagnostic)]
pub enum DeserializeError {
    #[error("invalid graph document: {message}")]
    #[diagnostic(code(ds::deser::json))]
    Json {
        message: String,
        #[source_code]
        src: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("document is {size} bytes, limit is {limit}")]
    #[diagnostic(
        code(ds::deser::too_large),
        help("Raise `limits.max_document_bytes` in the runtime config")
    )]
    DocumentTooLarge { size: usize, limit: usize },

    #[error("document version {found} is newer than supported version {supported}")]
    #[diagnostic(code(ds::deser::version))]
    UnsupportedVersion { found: i32, supported: i32 },

    #[error("`{field}` has {found} entries but `Nodes` has {expected}")]
    #[diagnostic(code(ds::deser::parallel_array))]
    ParallelArrayMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("malformed id `{value}` in {field}")]
    #[diagnostic(
        code(ds::deser::guid),
        help("Node ids are 32 hex digits without dashes")
    )]
    InvalidGuid { value: String, field: &'static str },

    #[error("node {node} has unknown binder `{binder}`")]
    #[diagnostic(code(ds::deser::binder))]
    UnknownBinder { node: NodeId, binder: String },

    #[error("node id {node} appears more than once")]
    #[diagnostic(code(ds::deser::duplicate_node))]
    DuplicateNode { node: NodeId },

    #[error("entry name `{name}` is used by more than one input node")]
    #[diagnostic(code(ds::deser::duplicate_entry))]
    DuplicateEntry { name: String },

    #[error("input node {node} has no `inputName`")]
    #[diagnostic(code(ds::deser::entry_name))]
    MissingEntryName { node: NodeId },

    #[error("edge {edge} references node {node}, which is not in the document")]
    #[diagnostic(code(ds::deser::dangling))]
    DanglingNode { edge: usize, node: NodeId },

    #[error("edge {edge} uses {direction} port {port} of node {node}, which declares {declared}")]
    #[diagnostic(code(ds::deser::port_range))]
    PortOutOfRange {
        edge: usize,
        node: NodeId,
        port: i32,
        direction: Direction,
        declared: u32,
    },

    #[error("edge {edge} connects a second edge to single {direction} port {port} of node {node}")]
    #[diagnostic(code(ds::deser::port_capacity))]
    PortCapacity {
        edge: usize,
        node: NodeId,
        port: i32,
        direction: Direction,
    },

    #[error("edge {edge} feeds data socket {port} of node {target} from {kind} node {node}")]
    #[diagnostic(
        code(ds::deser::data_source),
        help("Data sockets take values from processor nodes only")
    )]
    DataSourceNotProcessor {
        edge: usize,
        node: NodeId,
        kind: NodeKind,
        target: NodeId,
        port: i32,
    },

    #[error("payload of node {node} is not an object")]
    #[diagnostic(code(ds::deser::payload))]
    PayloadNotObject { node: NodeId },

    #[error("payload key `{key}` of node {node}: {reason}")]
    #[diagnostic(
        code(ds::deser::payload_value),
        help("Payload values are booleans, numbers, strings or arrays of those")
    )]
    InvalidPayload {
        node: NodeId,
        key: String,
        reason: String,
    },

    #[error("property `{name}`: {reason}")]
    #[diagnostic(code(ds::deser::property))]
    InvalidProperty { name: String, reason: String },
}

/// Parses and deserializes a JSON document in one step.
pub fn deserialize_str(
    input: &str,
    registry: &NodeRegistry,
    limits: &Limits,
) -> Result<Graph, DeserializeError> {
    let document = GraphDocument::from_json(input, limits)?;
    deserialize(&document, registry)
}

/// Builds a [`Graph`] from a parsed document.
#[instrument(skip_all, fields(object_id = %document.object_id, nodes = document.nodes.len()))]
pub fn deserialize(
    document: &GraphDocument,
    registry: &NodeRegistry,
) -> Result<Graph, DeserializeError> {
    if !is_supported(document.version) {
        return Err(DeserializeError::UnsupportedVersion {
            found: document.version,
            supported: GRAPH_FORMAT_VERSION,
        });
    }
    let node_count = document.nodes.len();
    if document.data.len() != node_count {
        return Err(DeserializeError::ParallelArrayMismatch {
            field: "Data",
            expected: node_count,
            found: document.data.len(),
        });
    }
    if !document.positions.is_empty() && document.positions.len() != node_count {
        return Err(DeserializeError::ParallelArrayMismatch {
            field: "Positions",
            expected: node_count,
            found: document.positions.len(),
        });
    }

    let mut graph = Graph::new(document.object_id.clone());
    graph.version = document.version;

    for record in &document.properties {
        let id = Uuid::parse_str(&record.id).map_err(|_| DeserializeError::InvalidGuid {
            value: record.id.clone(),
            field: "Properties.ID",
        })?;
        let value =
            Value::from_json(&record.value).map_err(|shape| DeserializeError::InvalidProperty {
                name: record.name.clone(),
                reason: shape.to_string(),
            })?;
        graph.add_property(PropertyDef {
            id,
            kind: record.kind.clone(),
            name: record.name.clone(),
            value,
        });
    }

    // Pass 1: nodes and entry names.
    for (position, record) in document.nodes.iter().enumerate() {
        let id = NodeId::parse(&record.id).ok_or_else(|| DeserializeError::InvalidGuid {
            value: record.id.clone(),
            field: "Nodes.ID",
        })?;
        let kind = registry
            .resolve(&record.binder)
            .ok_or_else(|| DeserializeError::UnknownBinder {
                node: id,
                binder: record.binder.clone(),
            })?;
        let payload = decode_payload(id, &document.data[position])?;

        let mut node = Node::new(id, kind, payload).with_binder(&record.binder, &record.node_type);
        if let Some(at) = document.positions.get(position) {
            node = node.with_position(*at);
        }
        let entry_name = if kind == NodeKind::Input {
            let name = node
                .payload
                .str(ENTRY_NAME_KEY)
                .ok_or(DeserializeError::MissingEntryName { node: id })?;
            Some(name.to_string())
        } else {
            None
        };

        let index = graph
            .add_node(node)
            .ok_or(DeserializeError::DuplicateNode { node: id })?;
        if let Some(name) = entry_name {
            if graph.register_entry(name.clone(), index).is_some() {
                return Err(DeserializeError::DuplicateEntry { name });
            }
        }
    }

    // Pass 2: edges.
    for (edge, record) in document.edges.iter().enumerate() {
        let (output, _) = resolve_port(&graph, edge, &record.output_port, Direction::Output)?;
        let (input, input_id) = resolve_port(&graph, edge, &record.input_port, Direction::Input)?;
        let data_socket = PortSlot::from_number(input.number).is_secondary();
        if let Some(source) = graph
            .node(output.node)
            .filter(|source| data_socket && !source.kind.is_processor())
        {
            return Err(DeserializeError::DataSourceNotProcessor {
                edge,
                node: source.id,
                kind: source.kind,
                target: input_id,
                port: input.number,
            });
        }
        graph
            .connect(output, input)
            .ok_or(DeserializeError::DanglingNode {
                edge,
                node: input_id,
            })?;
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        entries = graph.entries().count(),
        "graph deserialized"
    );
    Ok(graph)
}

fn decode_payload(node: NodeId, data: &serde_json::Value) -> Result<Payload, DeserializeError> {
    match data {
        serde_json::Value::Object(map) => {
            Payload::from_json_object(map).map_err(|(key, shape)| {
                DeserializeError::InvalidPayload {
                    node,
                    key,
                    reason: shape.to_string(),
                }
            })
        }
        serde_json::Value::Null => Ok(Payload::new()),
        _ => Err(DeserializeError::PayloadNotObject { node }),
    }
}

/// Validates one edge endpoint against the node's declared layout and port capacity.
fn resolve_port(
    graph: &Graph,
    edge: usize,
    record: &PortRecord,
    direction: Direction,
) -> Result<(PortRef, NodeId), DeserializeError> {
    let field = match direction {
        Direction::Output => "Edges.OutputPort.NodeID",
        Direction::Input => "Edges.InputPort.NodeID",
    };
    let id = NodeId::parse(&record.node_id).ok_or_else(|| DeserializeError::InvalidGuid {
        value: record.node_id.clone(),
        field,
    })?;
    let index: NodeIndex = graph
        .index_of(id)
        .ok_or(DeserializeError::DanglingNode { edge, node: id })?;
    let node = graph
        .node(index)
        .ok_or(DeserializeError::DanglingNode { edge, node: id })?;

    let number = record.port_number;
    let layout = node.kind.layout(&node.payload);
    if !layout.contains(direction, number) {
        return Err(DeserializeError::PortOutOfRange {
            edge,
            node: id,
            port: number,
            direction,
            declared: layout.declared(direction, number),
        });
    }
    if node
        .port(direction, number)
        .is_some_and(|port| !port.accepts())
    {
        return Err(DeserializeError::PortCapacity {
            edge,
            node: id,
            port: number,
            direction,
        });
    }
    let port = PortRef {
        node: index,
        direction,
        number,
    };
    Ok((port, id))
}

#[cfg(test)]
#[path = "tests/deserialize_tests.rs"]
mod tests;
