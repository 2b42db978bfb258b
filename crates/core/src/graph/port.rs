//! Ports, edges and the signed port-number encoding.
//!
//! Non-negative port numbers address primary (flow) sockets. Negative numbers address
//! secondary (data) sockets: secondary socket `i` is stored as `-(i + 1)`. The transform is
//! its own inverse, so [`flip`] both encodes and decodes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Output port that continues the walk on every linear node.
pub const CONTINUE_PORT: i32 = 0;

/// Maps between primary and secondary numbering. `flip(flip(n)) == n` for every `n`.
///
/// Bitwise not is `-(n + 1)` in two's complement without the overflow at `i32::MAX`.
pub const fn flip(number: i32) -> i32 {
    !number
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// A decoded port number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortSlot {
    /// Horizontal flow socket.
    Primary(u32),
    /// Vertical data socket.
    Secondary(u32),
}

impl PortSlot {
    pub fn from_number(number: i32) -> Self {
        if number >= 0 {
            PortSlot::Primary(number as u32)
        } else {
            PortSlot::Secondary(flip(number) as u32)
        }
    }

    /// The signed number stored in documents and port maps.
    pub fn number(self) -> i32 {
        match self {
            PortSlot::Primary(index) => index as i32,
            PortSlot::Secondary(index) => flip(index as i32),
        }
    }

    pub fn is_secondary(self) -> bool {
        matches!(self, PortSlot::Secondary(_))
    }
}

impl fmt::Display for PortSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortSlot::Primary(index) => write!(f, "{index}"),
            PortSlot::Secondary(index) => write!(f, "secondary {index}"),
        }
    }
}

/// How many edges a port accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capacity {
    Single,
    Multi,
}

/// Position of a node in the graph arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

/// Position of an edge in the graph arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

impl EdgeId {
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

/// Addresses one port of one node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub node: NodeIndex,
    pub direction: Direction,
    pub number: i32,
}

impl PortRef {
    pub fn output(node: NodeIndex, number: i32) -> Self {
        Self {
            node,
            direction: Direction::Output,
            number,
        }
    }

    pub fn input(node: NodeIndex, number: i32) -> Self {
        Self {
            node,
            direction: Direction::Input,
            number,
        }
    }
}

/// A connection point owned by a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Port {
    pub direction: Direction,
    pub number: i32,
    pub capacity: Capacity,
    edges: Vec<EdgeId>,
}

impl Port {
    pub fn new(direction: Direction, number: i32, capacity: Capacity) -> Self {
        Self {
            direction,
            number,
            capacity,
            edges: Vec::new(),
        }
    }

    pub fn slot(&self) -> PortSlot {
        PortSlot::from_number(self.number)
    }

    /// Edges in connection order.
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn is_connected(&self) -> bool {
        !self.edges.is_empty()
    }

    /// Whether one more edge fits.
    pub fn accepts(&self) -> bool {
        self.capacity == Capacity::Multi || self.edges.is_empty()
    }

    pub(crate) fn attach(&mut self, edge: EdgeId) {
        self.edges.push(edge);
    }
}

/// A single output-to-input connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub id: EdgeId,
    pub output: PortRef,
    pub input: PortRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_is_an_involution() {
        for number in [0, 1, 2, 7, 1000, i32::MAX - 1, i32::MAX, -1, -2, i32::MIN] {
            assert_eq!(flip(flip(number)), number);
        }
        for index in [0, 1, 5, 1 << 20, i32::MAX] {
            assert!(flip(index) < 0);
        }
    }

    #[test]
    fn slots_round_trip_through_numbers() {
        assert_eq!(PortSlot::from_number(3), PortSlot::Primary(3));
        assert_eq!(PortSlot::from_number(-1), PortSlot::Secondary(0));
        assert_eq!(PortSlot::from_number(-4), PortSlot::Secondary(3));
        for number in [-100, -2, -1, 0, 1, 42] {
            assert_eq!(PortSlot::from_number(number).number(), number);
        }
    }

    #[test]
    fn single_capacity_accepts_one_edge() {
        let mut port = Port::new(Direction::Input, -1, Capacity::Single);
        assert!(port.accepts());
        port.attach(EdgeId(0));
        assert!(!port.accepts());

        let mut multi = Port::new(Direction::Output, 0, Capacity::Multi);
        multi.attach(EdgeId(0));
        assert!(multi.accepts());
    }
}
