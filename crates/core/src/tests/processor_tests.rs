use super::*;
use crate::graph::{flip, PortRef};
use crate::value::Payload;

fn processor(kind: NodeKind, entries: &[(&str, Value)]) -> Node {
    let payload: Payload = entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();
    Node::new(NodeId::new_v4(), kind, payload)
}

fn add(graph: &mut Graph, kind: NodeKind, entries: &[(&str, Value)]) -> NodeIndex {
    graph.add_node(processor(kind, entries)).unwrap()
}

fn wire(graph: &mut Graph, from: NodeIndex, to: NodeIndex, input: i32) {
    graph
        .connect(PortRef::output(from, 0), PortRef::input(to, input))
        .unwrap();
}

#[test]
fn test_comparison_greater() {
    let node = processor(
        NodeKind::Compare,
        &[("comparison", Value::String("Greater".into()))],
    );
    let vars = Variables::new();
    let result = process(&node, &[Value::Float(5.0), Value::Float(3.0)], 0, &vars).unwrap();
    assert_eq!(result, Value::Bool(true));
    let result = process(&node, &[Value::Float(3.0), Value::Float(5.0)], 0, &vars).unwrap();
    assert_eq!(result, Value::Bool(false));
}

#[test]
fn test_comparison_decoding() {
    assert_eq!(Comparison::try_from(4).unwrap(), Comparison::Greater);
    assert_eq!(Comparison::from_name("<="), Some(Comparison::LessOrEqual));
    for (index, comparison) in Comparison::ALL.iter().enumerate() {
        assert_eq!(Comparison::try_from(index as i64).unwrap(), *comparison);
        assert_eq!(Comparison::from_name(comparison.name()), Some(*comparison));
    }

    assert!(matches!(
        Comparison::try_from(6),
        Err(ProcessorError::UnsupportedComparison { ref value }) if value == "6"
    ));
    assert!(Comparison::try_from(-1).is_err());
    assert!(Comparison::from_value(&Value::String("Roughly".into())).is_err());
    assert!(Comparison::from_value(&Value::Bool(true)).is_err());
}

#[test]
fn test_unsupported_comparison_fails_evaluation() {
    let node = processor(NodeKind::Compare, &[("comparison", Value::Int(9))]);
    let err = process(
        &node,
        &[Value::Int(1), Value::Int(2)],
        0,
        &Variables::new(),
    )
    .unwrap_err();
    assert!(matches!(err, ProcessorError::UnsupportedComparison { .. }));
}

#[test]
fn test_integer_inputs_compare_numerically() {
    let node = processor(NodeKind::Compare, &[("comparison", Value::Int(0))]);
    let result = process(
        &node,
        &[Value::Int(2), Value::Float(2.0)],
        0,
        &Variables::new(),
    )
    .unwrap();
    assert_eq!(result, Value::Bool(true));

    let err = process(
        &node,
        &[Value::String("2".into()), Value::Int(2)],
        0,
        &Variables::new(),
    )
    .unwrap_err();
    assert!(matches!(err, ProcessorError::NotNumeric { found: "string", .. }));
}

#[test]
fn test_logic_processors() {
    let vars = Variables::new();
    let t = Value::Bool(true);
    let f = Value::Bool(false);
    let not = processor(NodeKind::Not, &[]);
    let and = processor(NodeKind::And, &[]);
    let or = processor(NodeKind::Or, &[]);

    assert_eq!(process(&not, &[t.clone()], 0, &vars).unwrap(), f);
    assert_eq!(process(&and, &[t.clone(), f.clone()], 0, &vars).unwrap(), f);
    assert_eq!(process(&or, &[t.clone(), f.clone()], 0, &vars).unwrap(), t);
    assert!(matches!(
        process(&not, &[Value::Int(1)], 0, &vars),
        Err(ProcessorError::NotBoolean { found: "int", .. })
    ));
    assert!(matches!(
        process(&not, &[t], 1, &vars),
        Err(ProcessorError::NoSuchOutput { port: 1, .. })
    ));
}

#[test]
fn test_property_reads_variables() {
    let node = processor(NodeKind::Property, &[("property", Value::String("gold".into()))]);
    let mut vars = Variables::new();
    assert!(matches!(
        process(&node, &[], 0, &vars),
        Err(ProcessorError::UnknownProperty { ref name, .. }) if name == "gold"
    ));
    vars.insert("gold".into(), Value::Int(12));
    assert_eq!(process(&node, &[], 0, &vars).unwrap(), Value::Int(12));
}

#[test]
fn test_flow_node_is_not_a_processor() {
    let node = processor(NodeKind::Dialogue, &[]);
    assert!(matches!(
        process(&node, &[], 0, &Variables::new()),
        Err(ProcessorError::NotAProcessor {
            kind: NodeKind::Dialogue,
            ..
        })
    ));
}

#[test]
fn test_get_value_pulls_tree_in_input_order() {
    // (gold >= 10) && !(visited)
    let mut graph = Graph::new("test");
    let gold = add(
        &mut graph,
        NodeKind::Property,
        &[("property", Value::String("gold".into()))],
    );
    let ten = add(&mut graph, NodeKind::Value, &[("value", Value::Int(10))]);
    let compare = add(
        &mut graph,
        NodeKind::Compare,
        &[("comparison", Value::String(">=".into()))],
    );
    let visited = add(
        &mut graph,
        NodeKind::Property,
        &[("property", Value::String("visited".into()))],
    );
    let not = add(&mut graph, NodeKind::Not, &[]);
    let and = add(&mut graph, NodeKind::And, &[]);
    wire(&mut graph, gold, compare, 0);
    wire(&mut graph, ten, compare, 1);
    wire(&mut graph, visited, not, 0);
    wire(&mut graph, compare, and, 0);
    wire(&mut graph, not, and, 1);

    let mut vars = Variables::new();
    vars.insert("gold".into(), Value::Int(12));
    vars.insert("visited".into(), Value::Bool(false));
    let context = ProcessorContext::new(&graph, &vars);
    assert_eq!(context.get_value(and, 0).unwrap(), Value::Bool(true));

    vars.insert("gold".into(), Value::Int(3));
    let context = ProcessorContext::new(&graph, &vars);
    assert_eq!(context.get_value(and, 0).unwrap(), Value::Bool(false));
}

#[test]
fn test_pull_input_reads_data_socket() {
    let mut graph = Graph::new("test");
    let value = add(&mut graph, NodeKind::Value, &[("value", Value::Bool(true))]);
    let condition = add(&mut graph, NodeKind::Condition, &[]);
    wire(&mut graph, value, condition, flip(0));

    let vars = Variables::new();
    let context = ProcessorContext::new(&graph, &vars);
    assert_eq!(context.pull_input(condition, flip(0)).unwrap(), Value::Bool(true));
    assert!(matches!(
        context.pull_input(condition, 0),
        Err(ProcessorError::MissingInput { port: 0, .. })
    ));
}

#[test]
fn test_missing_input_is_reported() {
    let mut graph = Graph::new("test");
    let value = add(&mut graph, NodeKind::Value, &[("value", Value::Int(1))]);
    let compare = add(&mut graph, NodeKind::Compare, &[("comparison", Value::Int(0))]);
    wire(&mut graph, value, compare, 0);

    let vars = Variables::new();
    let err = ProcessorContext::new(&graph, &vars)
        .get_value(compare, 0)
        .unwrap_err();
    assert!(matches!(err, ProcessorError::MissingInput { port: 1, .. }));
}

#[test]
fn test_cycle_trips_depth_guard() {
    let mut graph = Graph::new("test");
    let a = add(&mut graph, NodeKind::Not, &[]);
    let b = add(&mut graph, NodeKind::Not, &[]);
    wire(&mut graph, a, b, 0);
    wire(&mut graph, b, a, 0);

    let vars = Variables::new();
    let err = ProcessorContext::new(&graph, &vars)
        .with_max_depth(Some(8))
        .get_value(a, 0)
        .unwrap_err();
    assert!(matches!(err, ProcessorError::DepthExceeded { limit: 8, .. }));
}

#[test]
fn test_value_node_requires_payload() {
    let mut graph = Graph::new("test");
    let value = add(&mut graph, NodeKind::Value, &[]);
    let vars = Variables::new();
    assert!(matches!(
        ProcessorContext::new(&graph, &vars).get_value(value, 0),
        Err(ProcessorError::MissingPayload { key: "value", .. })
    ));
}
