use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::port::{Capacity, Direction, Port};
use crate::registry::NodeKind;
use crate::value::Payload;

/// Stable node identity, written as 32 lowercase hex digits without dashes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parses the dashless "N" form only.
    pub fn parse(text: &str) -> Option<Self> {
        if text.len() != 32 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Uuid::parse_str(text).ok().map(Self)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for NodeId {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text).ok_or_else(|| format!("`{text}` is not a 32-digit hex id"))
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Editor canvas position. Kept for round trips, never read by the runtime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// A dialogue or processor node with its lazily created ports.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// Binder string the kind was resolved from.
    pub binder: String,
    /// Editor view type, carried through unchanged.
    pub node_type: String,
    pub kind: NodeKind,
    pub payload: Payload,
    pub position: Option<Position>,
    inputs: BTreeMap<i32, Port>,
    outputs: BTreeMap<i32, Port>,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind, payload: Payload) -> Self {
        Self {
            id,
            binder: kind.name().to_string(),
            node_type: kind.name().to_string(),
            kind,
            payload,
            position: None,
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn with_binder(mut self, binder: impl Into<String>, node_type: impl Into<String>) -> Self {
        self.binder = binder.into();
        self.node_type = node_type.into();
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    fn ports_mut(&mut self, direction: Direction) -> &mut BTreeMap<i32, Port> {
        match direction {
            Direction::Input => &mut self.inputs,
            Direction::Output => &mut self.outputs,
        }
    }

    fn ports_ref(&self, direction: Direction) -> &BTreeMap<i32, Port> {
        match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        }
    }

    /// Returns the port at `number`, creating it on first use.
    ///
    /// Requesting an existing port returns it with its edges intact.
    pub fn insert_port(&mut self, direction: Direction, number: i32) -> &mut Port {
        let capacity: Capacity = self.kind.capacity(direction, number);
        self.ports_mut(direction)
            .entry(number)
            .or_insert_with(|| Port::new(direction, number, capacity))
    }

    pub fn port(&self, direction: Direction, number: i32) -> Option<&Port> {
        self.ports_ref(direction).get(&number)
    }

    /// Ports in ascending number order, secondary sockets first.
    pub fn ports(&self, direction: Direction) -> impl Iterator<Item = &Port> {
        self.ports_ref(direction).values()
    }

    pub fn input(&self, number: i32) -> Option<&Port> {
        self.port(Direction::Input, number)
    }

    pub fn output(&self, number: i32) -> Option<&Port> {
        self.port(Direction::Output, number)
    }
}
