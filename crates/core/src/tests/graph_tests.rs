use super::*;
use crate::registry::NodeKind;
use crate::value::{Payload, Value};

fn node(kind: NodeKind) -> Node {
    Node::new(NodeId::new_v4(), kind, Payload::new())
}

fn add(graph: &mut Graph, kind: NodeKind) -> NodeIndex {
    graph.add_node(node(kind)).unwrap()
}

#[test]
fn test_node_id_accepts_only_dashless_hex() {
    let text = "0123456789abcdef0123456789ABCDEF";
    let id = NodeId::parse(text).unwrap();
    assert_eq!(id.to_string(), text.to_lowercase());
    assert_eq!(NodeId::parse(&id.to_string()), Some(id));

    assert_eq!(NodeId::parse("01234567-89ab-cdef-0123-456789abcdef"), None);
    assert_eq!(NodeId::parse("0123456789abcdef0123456789abcdeg"), None);
    assert_eq!(NodeId::parse("0123"), None);
}

#[test]
fn test_insert_port_is_idempotent() {
    let mut graph = Graph::new("test");
    let a = add(&mut graph, NodeKind::Dialogue);
    let b = add(&mut graph, NodeKind::Dialogue);
    graph
        .connect(PortRef::output(a, 0), PortRef::input(b, 0))
        .unwrap();

    let port = graph.insert_port(PortRef::output(a, 0)).unwrap();
    assert_eq!(port.edges().len(), 1);
    assert_eq!(graph[a].ports(Direction::Output).count(), 1);
}

#[test]
fn test_ports_are_sparse_and_ordered() {
    let mut graph = Graph::new("test");
    let a = add(&mut graph, NodeKind::Condition);
    graph.insert_port(PortRef::input(a, 7)).unwrap();
    graph.insert_port(PortRef::input(a, flip(0))).unwrap();
    graph.insert_port(PortRef::input(a, 0)).unwrap();
    let numbers: Vec<i32> = graph[a].ports(Direction::Input).map(|p| p.number).collect();
    assert_eq!(numbers, vec![-1, 0, 7]);
    assert_eq!(graph[a].input(-1).unwrap().slot(), PortSlot::Secondary(0));
}

#[test]
fn test_same_direction_connection_creates_nothing() {
    let mut graph = Graph::new("test");
    let a = add(&mut graph, NodeKind::Dialogue);
    let b = add(&mut graph, NodeKind::Dialogue);

    assert_eq!(graph.connect(PortRef::output(a, 0), PortRef::output(b, 0)), None);
    assert_eq!(graph.connect(PortRef::input(a, 0), PortRef::input(b, 0)), None);
    assert_eq!(graph.edge_count(), 0);
    assert!(graph[a].output(0).is_none());
    assert!(graph[b].input(0).is_none());
}

#[test]
fn test_connection_registers_on_both_ports() {
    let mut graph = Graph::new("test");
    let a = add(&mut graph, NodeKind::Dialogue);
    let b = add(&mut graph, NodeKind::Dialogue);

    // Argument order does not matter; the edge always runs output to input.
    let id = graph
        .connect(PortRef::input(b, 0), PortRef::output(a, 0))
        .unwrap();
    let edge = graph.edge(id).unwrap();
    assert_eq!(edge.output, PortRef::output(a, 0));
    assert_eq!(edge.input, PortRef::input(b, 0));
    assert_eq!(graph[a].output(0).unwrap().edges(), &[id]);
    assert_eq!(graph[b].input(0).unwrap().edges(), &[id]);
}

#[test]
fn test_connect_to_missing_node_fails() {
    let mut graph = Graph::new("test");
    let a = add(&mut graph, NodeKind::Dialogue);
    assert_eq!(
        graph.connect(PortRef::output(a, 0), PortRef::input(NodeIndex(9), 0)),
        None
    );
    assert!(graph[a].output(0).is_none());
}

#[test]
fn test_fan_out_and_follow() {
    let mut graph = Graph::new("test");
    let a = add(&mut graph, NodeKind::Dialogue);
    let b = add(&mut graph, NodeKind::Dialogue);
    let c = add(&mut graph, NodeKind::Dialogue);
    graph.connect(PortRef::output(a, 0), PortRef::input(b, 0));
    graph.connect(PortRef::output(a, 0), PortRef::input(c, 0));

    let targets: Vec<NodeIndex> = graph.targets(a, 0).map(|p| p.node).collect();
    assert_eq!(targets, vec![b, c]);
    assert_eq!(graph.follow_output(a, 0), Some(b));
    assert_eq!(graph.follow_output(a, 1), None);
    assert_eq!(graph.source(c, 0), Some(PortRef::output(a, 0)));
}

#[test]
fn test_cycles_are_allowed() {
    let mut graph = Graph::new("test");
    let a = add(&mut graph, NodeKind::Dialogue);
    let b = add(&mut graph, NodeKind::Dialogue);
    graph.connect(PortRef::output(a, 0), PortRef::input(b, 0));
    graph.connect(PortRef::output(b, 0), PortRef::input(a, 0));
    graph.connect(PortRef::output(a, 0), PortRef::input(a, 0));
    assert_eq!(graph.edge_count(), 3);
    assert_eq!(graph.follow_output(b, 0), Some(a));
}

#[test]
fn test_duplicate_ids_are_rejected() {
    let mut graph = Graph::new("test");
    let first = node(NodeKind::Dialogue);
    let copy = first.clone();
    assert!(graph.add_node(first).is_some());
    assert!(graph.add_node(copy).is_none());
    assert_eq!(graph.node_count(), 1);
}

#[test]
fn test_entries_resolve_to_nodes() {
    let mut graph = Graph::new("test");
    let entry = add(&mut graph, NodeKind::Input);
    assert_eq!(graph.register_entry("start", entry), None);
    assert_eq!(graph.find_entry_node("start").unwrap().kind, NodeKind::Input);
    assert!(graph.find_entry_node("missing").is_none());
}

#[test]
fn test_reachability_includes_processor_trees() {
    let mut graph = Graph::new("test");
    let entry = add(&mut graph, NodeKind::Input);
    let condition = add(&mut graph, NodeKind::Condition);
    let value = add(&mut graph, NodeKind::Value);
    let orphan = add(&mut graph, NodeKind::Dialogue);
    graph.register_entry("start", entry);
    graph.connect(PortRef::output(entry, 0), PortRef::input(condition, 0));
    graph.connect(PortRef::output(value, 0), PortRef::input(condition, flip(0)));

    assert_eq!(graph.unreachable_nodes(), vec![orphan]);
    let stats = graph.stats();
    assert_eq!(stats.total_nodes, 4);
    assert_eq!(stats.reachable_nodes, 3);
    assert_eq!(stats.unreachable_nodes, 1);
    assert_eq!(stats.branch_count, 1);
    assert_eq!(stats.processor_count, 1);
    assert_eq!(stats.edge_count, 2);
}

#[test]
fn test_dot_export_marks_entries_and_data_edges() {
    let mut graph = Graph::new("test");
    let mut payload = Payload::new();
    payload.insert("inputName", Value::String("start".into()));
    let entry = graph
        .add_node(Node::new(NodeId::new_v4(), NodeKind::Input, payload))
        .unwrap();
    let set = add(&mut graph, NodeKind::Set);
    let value = add(&mut graph, NodeKind::Value);
    graph.register_entry("start", entry);
    graph.connect(PortRef::output(entry, 0), PortRef::input(set, 0));
    graph.connect(PortRef::output(value, 0), PortRef::input(set, -1));

    let dot = graph.to_dot();
    assert!(dot.starts_with("digraph DialogueGraph {"));
    assert!(dot.contains("n0 [label=\"Input\\nstart\" shape=box color=green];"));
    assert!(dot.contains("n2 -> n1 [style=dashed"));
    assert!(dot.contains("n0 -> n1 [style=solid"));
}
