#![allow(dead_code)]

use serde_json::{json, Value as Json};

/// Node id `n` in the 32-digit hex form documents use.
pub fn id(n: u32) -> String {
    format!("{n:032x}")
}

/// Builds graph documents node by node.
#[derive(Default)]
pub struct DocBuilder {
    object_id: String,
    properties: Vec<Json>,
    nodes: Vec<Json>,
    positions: Vec<Json>,
    edges: Vec<Json>,
    data: Vec<Json>,
}

impl DocBuilder {
    pub fn new(object_id: &str) -> Self {
        Self {
            object_id: object_id.to_string(),
            ..Self::default()
        }
    }

    pub fn node(mut self, n: u32, binder: &str, data: Json) -> Self {
        self.nodes.push(json!({
            "ID": id(n),
            "Type": format!("{binder}Node"),
            "Binder": binder
        }));
        self.positions
            .push(json!({ "x": (n as i32) * 200, "y": 0 }));
        self.data.push(data);
        self
    }

    pub fn entry(self, n: u32, name: &str) -> Self {
        self.node(n, "Input", json!({ "inputName": name }))
    }

    pub fn line(self, n: u32, actor: &str, text: &str, duration: f32) -> Self {
        self.node(
            n,
            "Dialogue",
            json!({ "actorID": actor, "text": text, "duration": duration }),
        )
    }

    pub fn edge(mut self, from: u32, out: i32, to: u32, input: i32) -> Self {
        self.edges.push(json!({
            "OutputPort": { "NodeID": id(from), "PortNumber": out },
            "InputPort": { "NodeID": id(to), "PortNumber": input }
        }));
        self
    }

    pub fn property(mut self, name: &str, kind: &str, value: Json) -> Self {
        let n = 0xabc0_0000u32 + self.properties.len() as u32;
        self.properties.push(json!({
            "ID": id(n),
            "Type": kind,
            "Name": name,
            "Value": value
        }));
        self
    }

    pub fn to_json(&self) -> Json {
        json!({
            "Version": 1,
            "ObjectID": self.object_id,
            "Properties": self.properties,
            "Nodes": self.nodes,
            "Edges": self.edges,
            "Positions": self.positions,
            "Data": self.data
        })
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.to_json()).expect("document serializes")
    }
}

/// A short branching scene: a greeting, a choice, two replies and a flag check.
///
/// ```text
/// start -> greet -> ask --0--> accept -> set(helped) -> cond(helped) --0--> thanks
///                      \--1--> refuse ----------------------------/ --1--> shrug
/// ```
pub fn branching_scene() -> DocBuilder {
    DocBuilder::new("market")
        .property("helped", "Bool", json!(false))
        .entry(1, "start")
        .line(2, "merchant", "Good morning", 2.0)
        .node(
            3,
            "Choice",
            json!({ "text": "Help the merchant", "choices": ["Yes", "No"], "duration": 3.0 }),
        )
        .line(4, "hero", "Of course", 1.5)
        .node(5, "Set", json!({ "property": "helped" }))
        .node(6, "Value", json!({ "value": true }))
        .line(7, "hero", "Not today", 1.0)
        .node(8, "Condition", json!({}))
        .node(9, "Property", json!({ "property": "helped" }))
        .line(10, "merchant", "Thank you<wait=0.5/> friend", 2.5)
        .line(11, "merchant", "Suit yourself", 1.0)
        .node(12, "Marker", json!({ "marker": "end" }))
        .edge(1, 0, 2, 0)
        .edge(2, 0, 3, 0)
        .edge(3, 0, 4, 0)
        .edge(3, 1, 7, 0)
        .edge(4, 0, 5, 0)
        .edge(6, 0, 5, -1)
        .edge(5, 0, 8, 0)
        .edge(7, 0, 8, 0)
        .edge(9, 0, 8, -1)
        .edge(8, 0, 10, 0)
        .edge(8, 1, 11, 0)
        .edge(10, 0, 12, 0)
        .edge(11, 0, 12, 0)
}
