//! Example: Walking a Dialogue Graph
//!
//! Loads a small branching graph, prints its analysis, then walks it twice, once per
//! choice, showing clip timing and the reveal progress of each line.

use dialogue_graph::{DialogueSystem, DsResult, WalkOutcome};

const GRAPH: &str = r#"{
    "Version": 1,
    "ObjectID": "crossroads",
    "Nodes": [
        { "ID": "00000000000000000000000000000001", "Type": "InputNode", "Binder": "Input" },
        { "ID": "00000000000000000000000000000002", "Type": "DialogueNode", "Binder": "Dialogue" },
        { "ID": "00000000000000000000000000000003", "Type": "ChoiceNode", "Binder": "Choice" },
        { "ID": "00000000000000000000000000000004", "Type": "DialogueNode", "Binder": "Dialogue" },
        { "ID": "00000000000000000000000000000005", "Type": "DialogueNode", "Binder": "Dialogue" }
    ],
    "Edges": [
        { "OutputPort": { "NodeID": "00000000000000000000000000000001", "PortNumber": 0 },
          "InputPort":  { "NodeID": "00000000000000000000000000000002", "PortNumber": 0 } },
        { "OutputPort": { "NodeID": "00000000000000000000000000000002", "PortNumber": 0 },
          "InputPort":  { "NodeID": "00000000000000000000000000000003", "PortNumber": 0 } },
        { "OutputPort": { "NodeID": "00000000000000000000000000000003", "PortNumber": 0 },
          "InputPort":  { "NodeID": "00000000000000000000000000000004", "PortNumber": 0 } },
        { "OutputPort": { "NodeID": "00000000000000000000000000000003", "PortNumber": 1 },
          "InputPort":  { "NodeID": "00000000000000000000000000000005", "PortNumber": 0 } }
    ],
    "Data": [
        { "inputName": "start" },
        { "actorID": "Narrator", "text": "Two roads <wait=0.5/>diverge.", "duration": 3.0 },
        { "choices": ["Left", "Right"] },
        { "actorID": "Narrator", "text": "You went <gradient=#ff8800,#ffee00>left</gradient>.", "duration": 2.0 },
        { "actorID": "Narrator", "text": "You went <b>right</b>.", "duration": 2.0 }
    ]
}"#;

fn main() -> DsResult<()> {
    println!("=== Dialogue Graph Walk Example ===\n");

    let system = DialogueSystem::default();
    let graph = system.load_graph(GRAPH)?;

    let stats = graph.stats();
    println!(
        "{} nodes ({} reachable), {} edges, {} branching\n",
        stats.total_nodes, stats.reachable_nodes, stats.edge_count, stats.branch_count
    );

    let walker = system.walker(&graph);
    let first = walker.start("start")?;
    let WalkOutcome::Suspended(suspension) = &first.outcome else {
        println!("walk finished without a choice");
        return Ok(());
    };

    for (option, label) in suspension.options.iter().enumerate() {
        println!("--- choosing {label} ---");
        let rest = walker.resume(suspension, option)?;
        for clip in first.clips.iter().chain(rest.clips.iter()) {
            println!(
                "{:>5.2}s +{:<4.2} {:?} {}: {}",
                clip.start_time, clip.duration, clip.kind, clip.actor, clip.text
            );
            if clip.visibility.is_some() {
                let len = clip.text.chars().count();
                let progress: Vec<String> = (0..=4)
                    .map(|quarter| {
                        let time = clip.start_time + clip.duration * quarter as f32 / 4.0;
                        format!("{}/{len}", clip.visible_chars(time))
                    })
                    .collect();
                println!("        reveal {}", progress.join(" "));
                if let Some(done) = clip.reveal_time(len, system.config().frame_step()) {
                    println!("        fully shown at {done:.2}s");
                }
            }
        }
        println!();
    }

    Ok(())
}
