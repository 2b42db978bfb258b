use std::collections::{BTreeMap, HashMap};
use std::ops::Index;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::node::{Node, NodeId};
use super::port::{Direction, Edge, EdgeId, NodeIndex, Port, PortRef};
use crate::value::Value;
use crate::version::GRAPH_FORMAT_VERSION;

/// A blackboard variable declared by the document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub id: Uuid,
    /// Declared type name, carried through unchanged.
    pub kind: String,
    pub name: String,
    pub value: Value,
}

/// Arena of nodes and edges addressed by [`NodeIndex`] and [`EdgeId`].
///
/// Built once by the deserializer and read thereafter. Cycles are allowed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    pub version: i32,
    pub object_id: String,
    properties: Vec<PropertyDef>,
    nodes: Vec<Node>,
    index_by_id: HashMap<NodeId, NodeIndex>,
    edges: Vec<Edge>,
    entries: BTreeMap<String, NodeIndex>,
}

impl Graph {
    pub fn new(object_id: impl Into<String>) -> Self {
        Self {
            version: GRAPH_FORMAT_VERSION,
            object_id: object_id.into(),
            ..Self::default()
        }
    }

    /// Adds a node, or returns `None` if its id is already present.
    pub fn add_node(&mut self, node: Node) -> Option<NodeIndex> {
        if self.index_by_id.contains_key(&node.id) {
            return None;
        }
        let index = NodeIndex(self.nodes.len() as u32);
        self.index_by_id.insert(node.id, index);
        self.nodes.push(node);
        Some(index)
    }

    pub fn add_property(&mut self, property: PropertyDef) {
        self.properties.push(property);
    }

    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    /// Names an entry node. Returns the node previously registered under `name`.
    pub fn register_entry(&mut self, name: impl Into<String>, node: NodeIndex) -> Option<NodeIndex> {
        self.entries.insert(name.into(), node)
    }

    pub fn entry_index(&self, name: &str) -> Option<NodeIndex> {
        self.entries.get(name).copied()
    }

    /// Looks up the node registered under an entry name.
    pub fn find_entry_node(&self, name: &str) -> Option<&Node> {
        self.entry_index(name).and_then(|index| self.node(index))
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, NodeIndex)> {
        self.entries.iter().map(|(name, index)| (name.as_str(), *index))
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.get())
    }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.index_by_id.get(&id).copied()
    }

    pub fn node_by_id(&self, id: NodeId) -> Option<&Node> {
        self.index_of(id).and_then(|index| self.node(index))
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeIndex(index as u32), node))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.get())
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Creates the addressed port if missing. `None` if the node does not exist.
    pub fn insert_port(&mut self, port: PortRef) -> Option<&mut Port> {
        let node = self.nodes.get_mut(port.node.get())?;
        Some(node.insert_port(port.direction, port.number))
    }

    pub fn port(&self, port: PortRef) -> Option<&Port> {
        self.node(port.node)?.port(port.direction, port.number)
    }

    /// Connects two ports of opposite direction, creating them as needed.
    ///
    /// Returns `None` without touching the graph when both ports share a direction or
    /// either node is missing. Capacity is not enforced here.
    pub fn connect(&mut self, a: PortRef, b: PortRef) -> Option<EdgeId> {
        if a.direction == b.direction {
            return None;
        }
        let (output, input) = if a.direction == Direction::Output {
            (a, b)
        } else {
            (b, a)
        };
        if self.node(output.node).is_none() || self.node(input.node).is_none() {
            return None;
        }
        let id = EdgeId(self.edges.len() as u32);
        self.insert_port(output)?.attach(id);
        self.insert_port(input)?.attach(id);
        self.edges.push(Edge { id, output, input });
        Some(id)
    }

    /// Input ports fed by an output port, in connection order.
    pub fn targets(&self, node: NodeIndex, output: i32) -> impl Iterator<Item = PortRef> + '_ {
        self.linked(node, Direction::Output, output)
            .map(|edge| edge.input)
    }

    /// Output ports feeding an input port, in connection order.
    pub fn sources(&self, node: NodeIndex, input: i32) -> impl Iterator<Item = PortRef> + '_ {
        self.linked(node, Direction::Input, input)
            .map(|edge| edge.output)
    }

    /// Node reached through the first edge of an output port.
    pub fn follow_output(&self, node: NodeIndex, output: i32) -> Option<NodeIndex> {
        self.targets(node, output).next().map(|port| port.node)
    }

    /// The output port wired into an input port, if any.
    pub fn source(&self, node: NodeIndex, input: i32) -> Option<PortRef> {
        self.sources(node, input).next()
    }

    fn linked(
        &self,
        node: NodeIndex,
        direction: Direction,
        number: i32,
    ) -> impl Iterator<Item = &Edge> + '_ {
        self.node(node)
            .and_then(|node| node.port(direction, number))
            .map(|port| port.edges())
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.edge(*id))
    }
}

impl Index<NodeIndex> for Graph {
    type Output = Node;

    fn index(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.get()]
    }
}
