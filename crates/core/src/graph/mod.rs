//! In-memory dialogue graph.
//!
//! Nodes live in an arena owned by [`Graph`] and are addressed by [`NodeIndex`]. Ports are
//! created lazily on first connection and keyed per node by their signed port number, so
//! indices need not be contiguous. Every edge joins exactly one output port to one input port.
//!
//! # Contracts
//! - **Invariant**: every edge endpoint names a node of the same graph.
//! - **Invariant**: an edge is registered on both of its ports.
//! - **Postcondition**: [`Graph::connect`] between ports of one direction creates nothing.

mod analysis;
mod export;
pub mod model;
pub mod node;
pub mod port;

pub use analysis::GraphStats;
pub use model::{Graph, PropertyDef};
pub use node::{Node, NodeId, Position};
pub use port::{
    flip, Capacity, Direction, Edge, EdgeId, NodeIndex, Port, PortRef, PortSlot, CONTINUE_PORT,
};

#[cfg(test)]
#[path = "../tests/graph_tests.rs"]
mod tests;
