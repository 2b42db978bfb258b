//! Reachability and summary statistics.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::model::Graph;
use super::port::NodeIndex;
use crate::registry::NodeKind;

/// Counts describing a graph's shape.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub reachable_nodes: usize,
    pub unreachable_nodes: usize,
    pub entry_count: usize,
    pub dialogue_count: usize,
    /// Choice, action and condition nodes.
    pub branch_count: usize,
    pub processor_count: usize,
    pub edge_count: usize,
}

impl Graph {
    /// Nodes a walk can touch: everything downstream of an entry, plus the processors
    /// feeding those nodes.
    pub fn reachable(&self) -> HashSet<NodeIndex> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();

        for (_, entry) in self.entries() {
            if visited.insert(entry) {
                queue.push_back(entry);
            }
        }

        // Flow edges forward.
        while let Some(index) = queue.pop_front() {
            for edge in self.edges().iter().filter(|edge| edge.output.node == index) {
                if visited.insert(edge.input.node) {
                    queue.push_back(edge.input.node);
                }
            }
        }

        // Data edges backward into processor trees.
        queue.extend(visited.iter().copied());
        while let Some(index) = queue.pop_front() {
            for edge in self.edges().iter().filter(|edge| edge.input.node == index) {
                let source = edge.output.node;
                let is_processor = self
                    .node(source)
                    .map(|node| node.kind.is_processor())
                    .unwrap_or(false);
                if is_processor && visited.insert(source) {
                    queue.push_back(source);
                }
            }
        }
        visited
    }

    /// Nodes no walk can touch, in arena order.
    pub fn unreachable_nodes(&self) -> Vec<NodeIndex> {
        let reachable = self.reachable();
        self.nodes()
            .map(|(index, _)| index)
            .filter(|index| !reachable.contains(index))
            .collect()
    }

    pub fn stats(&self) -> GraphStats {
        let reachable_nodes = self.reachable().len();
        let count = |predicate: fn(NodeKind) -> bool| {
            self.nodes().filter(|(_, node)| predicate(node.kind)).count()
        };
        GraphStats {
            total_nodes: self.node_count(),
            reachable_nodes,
            unreachable_nodes: self.node_count() - reachable_nodes,
            entry_count: self.entries().count(),
            dialogue_count: count(|kind| kind == NodeKind::Dialogue),
            branch_count: count(|kind| {
                matches!(kind, NodeKind::Choice | NodeKind::Action | NodeKind::Condition)
            }),
            processor_count: count(NodeKind::is_processor),
            edge_count: self.edge_count(),
        }
    }
}
