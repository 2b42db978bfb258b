//! Binder resolution.
//!
//! Documents name each node's behavior with a binder string. The [`NodeRegistry`] maps
//! those strings to a closed set of [`NodeKind`]s; hosts can add aliases at startup.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::{Capacity, Direction, PortSlot};
use crate::value::Payload;

/// Every node behavior the runtime understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    Input,
    Dialogue,
    Choice,
    Action,
    Set,
    Condition,
    Marker,
    Blend,
    Value,
    Compare,
    Property,
    Not,
    And,
    Or,
}

impl NodeKind {
    pub const ALL: [NodeKind; 14] = [
        NodeKind::Input,
        NodeKind::Dialogue,
        NodeKind::Choice,
        NodeKind::Action,
        NodeKind::Set,
        NodeKind::Condition,
        NodeKind::Marker,
        NodeKind::Blend,
        NodeKind::Value,
        NodeKind::Compare,
        NodeKind::Property,
        NodeKind::Not,
        NodeKind::And,
        NodeKind::Or,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Input => "Input",
            NodeKind::Dialogue => "Dialogue",
            NodeKind::Choice => "Choice",
            NodeKind::Action => "Action",
            NodeKind::Set => "Set",
            NodeKind::Condition => "Condition",
            NodeKind::Marker => "Marker",
            NodeKind::Blend => "Blend",
            NodeKind::Value => "Value",
            NodeKind::Compare => "Compare",
            NodeKind::Property => "Property",
            NodeKind::Not => "Not",
            NodeKind::And => "And",
            NodeKind::Or => "Or",
        }
    }

    /// Processors compute values; everything else takes part in the flow.
    pub fn is_processor(self) -> bool {
        matches!(
            self,
            NodeKind::Value
                | NodeKind::Compare
                | NodeKind::Property
                | NodeKind::Not
                | NodeKind::And
                | NodeKind::Or
        )
    }

    /// Kinds that wait for the scheduler to pick an output.
    pub fn is_branching(self) -> bool {
        matches!(self, NodeKind::Choice | NodeKind::Action)
    }

    /// Declared sockets for a node of this kind carrying `payload`.
    pub fn layout(self, payload: &Payload) -> PortLayout {
        let flow = |inputs: u32, outputs: u32| PortLayout {
            inputs,
            outputs,
            data_inputs: 0,
            data_outputs: 0,
        };
        let options = |key: &str| payload.sequence_len(key) as u32;
        match self {
            NodeKind::Input => flow(0, 1),
            NodeKind::Dialogue | NodeKind::Marker => flow(1, 1),
            NodeKind::Choice => flow(1, options("choices")),
            NodeKind::Action => flow(1, options("actions")),
            NodeKind::Set | NodeKind::Blend => PortLayout {
                data_inputs: 1,
                ..flow(1, 1)
            },
            NodeKind::Condition => PortLayout {
                data_inputs: 1,
                ..flow(1, 2)
            },
            NodeKind::Value | NodeKind::Property => flow(0, 1),
            NodeKind::Not => flow(1, 1),
            NodeKind::Compare | NodeKind::And | NodeKind::Or => flow(2, 1),
        }
    }

    /// Data sockets and processor inputs take one edge; everything else fans in and out.
    pub fn capacity(self, direction: Direction, number: i32) -> Capacity {
        let single = direction == Direction::Input
            && (PortSlot::from_number(number).is_secondary() || self.is_processor());
        if single {
            Capacity::Single
        } else {
            Capacity::Multi
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared socket counts per direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortLayout {
    pub inputs: u32,
    pub outputs: u32,
    pub data_inputs: u32,
    pub data_outputs: u32,
}

impl PortLayout {
    /// Whether a port number is declared for `direction`.
    pub fn contains(&self, direction: Direction, number: i32) -> bool {
        let (primary, secondary) = self.counts(direction);
        match PortSlot::from_number(number) {
            PortSlot::Primary(index) => index < primary,
            PortSlot::Secondary(index) => index < secondary,
        }
    }

    /// Declared count for the collection `number` falls in.
    pub fn declared(&self, direction: Direction, number: i32) -> u32 {
        let (primary, secondary) = self.counts(direction);
        if PortSlot::from_number(number).is_secondary() {
            secondary
        } else {
            primary
        }
    }

    fn counts(&self, direction: Direction) -> (u32, u32) {
        match direction {
            Direction::Input => (self.inputs, self.data_inputs),
            Direction::Output => (self.outputs, self.data_outputs),
        }
    }
}

/// String binder to node kind table.
#[derive(Clone, Debug, Default)]
pub struct NodeRegistry {
    binders: BTreeMap<String, NodeKind>,
}

impl NodeRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every kind registered under its own name.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for kind in NodeKind::ALL {
            registry.register(kind.name(), kind);
        }
        registry
    }

    /// Binds `binder` to `kind`, returning the previous binding.
    pub fn register(&mut self, binder: impl Into<String>, kind: NodeKind) -> Option<NodeKind> {
        self.binders.insert(binder.into(), kind)
    }

    pub fn resolve(&self, binder: &str) -> Option<NodeKind> {
        self.binders.get(binder).copied()
    }

    /// Reverse lookup: the canonical binder when it maps to `kind`, else the first alias.
    pub fn binder_for(&self, kind: NodeKind) -> Option<&str> {
        if self.binders.get(kind.name()) == Some(&kind) {
            return Some(kind.name());
        }
        self.binders
            .iter()
            .find(|(_, bound)| **bound == kind)
            .map(|(binder, _)| binder.as_str())
    }

    pub fn binders(&self) -> impl Iterator<Item = (&str, NodeKind)> {
        self.binders.iter().map(|(binder, kind)| (binder.as_str(), *kind))
    }
}
