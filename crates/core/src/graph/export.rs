use super::model::Graph;
use super::port::PortSlot;
use crate::registry::NodeKind;

const PREVIEW_CHARS: usize = 40;

impl Graph {
    /// Renders the graph in Graphviz DOT format.
    ///
    /// Entries are green, unreachable nodes red. Data edges are dashed.
    pub fn to_dot(&self) -> String {
        let reachable = self.reachable();
        let entries: Vec<_> = self.entries().map(|(_, index)| index).collect();

        let mut dot = String::from("digraph DialogueGraph {\n");
        dot.push_str("    rankdir=LR;\n");
        dot.push_str("    node [shape=box];\n\n");

        for (index, node) in self.nodes() {
            let color = if !reachable.contains(&index) {
                "red"
            } else if entries.contains(&index) {
                "green"
            } else {
                "black"
            };
            let detail = match node.kind {
                NodeKind::Input => node.payload.str("inputName").map(str::to_string),
                NodeKind::Dialogue => Some(format!(
                    "{}: {}",
                    node.payload.str("actorID").unwrap_or("?"),
                    preview(node.payload.str("text").unwrap_or(""))
                )),
                NodeKind::Choice => node.payload.strings("choices").map(|c| c.join(" | ")),
                NodeKind::Action => node.payload.strings("actions").map(|a| a.join(" | ")),
                NodeKind::Set | NodeKind::Property => {
                    node.payload.str("property").map(str::to_string)
                }
                NodeKind::Marker => node.payload.str("marker").map(str::to_string),
                NodeKind::Blend => node.payload.str("target").map(str::to_string),
                NodeKind::Value => node.payload.get("value").map(ToString::to_string),
                NodeKind::Compare => node.payload.get("comparison").map(ToString::to_string),
                NodeKind::Condition | NodeKind::Not | NodeKind::And | NodeKind::Or => None,
            };
            let label = match detail {
                Some(detail) => format!("{}\\n{}", node.kind, escape(&detail)),
                None => node.kind.to_string(),
            };
            let shape = match node.kind {
                NodeKind::Choice | NodeKind::Action | NodeKind::Condition => "diamond",
                kind if kind.is_processor() => "ellipse",
                _ => "box",
            };
            dot.push_str(&format!(
                "    n{} [label=\"{}\" shape={} color={}];\n",
                index.0, label, shape, color
            ));
        }

        dot.push('\n');

        for edge in self.edges() {
            let data = PortSlot::from_number(edge.input.number).is_secondary()
                || self
                    .node(edge.output.node)
                    .map(|node| node.kind.is_processor())
                    .unwrap_or(false);
            let style = if data { "dashed" } else { "solid" };
            dot.push_str(&format!(
                "    n{} -> n{} [style={} label=\"{}\"];\n",
                edge.output.node.0, edge.input.node.0, style, edge.output.number
            ));
        }

        dot.push_str("}\n");
        dot
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let cut: String = text.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
