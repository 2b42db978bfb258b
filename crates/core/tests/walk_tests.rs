use dialogue_graph::graph::NodeId;
use dialogue_graph::tags::{CustomTagDef, TagBehavior, TagShape};
use dialogue_graph::{
    ClipKind, DialogueSystem, DsError, RuntimeConfig, Value, WalkError, WalkOutcome,
};
use miette::Diagnostic;
use serde_json::json;

mod common;
use common::{branching_scene, id, DocBuilder};

#[test]
fn deserialize_then_walk_two_node_graph() {
    let document = DocBuilder::new("intro")
        .entry(1, "start")
        .node(
            2,
            "Dialogue",
            json!({ "actorID": "hero", "text": "Hello <b>world</b>" }),
        )
        .edge(1, 0, 2, 0)
        .to_json_string();

    let system = DialogueSystem::default();
    let graph = system.load_graph(&document).unwrap();
    let entry = graph.find_entry_node("start").unwrap();
    assert_eq!(entry.id, NodeId::parse(&id(1)).unwrap());

    let walk = system.walker(&graph).start("start").unwrap();
    assert_eq!(walk.outcome, WalkOutcome::Finished);
    assert_eq!(walk.clips.len(), 1);
    let clip = &walk.clips.clips()[0];
    assert_eq!(clip.actor, "hero");
    assert!(clip.text.contains("<b>world</b>"));
    assert!(clip.tags.iter().all(|tag| tag.name != "b"));
}

#[test]
fn branching_scene_accept_path_sets_flag() {
    let system = DialogueSystem::default();
    let graph = system
        .load_graph(&branching_scene().to_json_string())
        .unwrap();

    let walk = system.run(&graph, "start", &[0]).unwrap();
    assert!(walk.is_finished());
    assert_eq!(walk.variables.get("helped"), Some(&Value::Bool(true)));

    let kinds: Vec<ClipKind> = walk.clips.iter().map(|clip| clip.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ClipKind::Dialogue,
            ClipKind::Choice,
            ClipKind::Dialogue,
            ClipKind::Dialogue,
            ClipKind::Marker
        ]
    );
    let thanks = &walk.clips.clips()[3];
    assert_eq!(thanks.text, "Thank you friend");
    assert_eq!(thanks.start_time, 6.5);
    assert_eq!(thanks.effects.waits[0].index, 9);
    // Reveal pauses after "Thank you" for the wait.
    let pause = thanks.reveal_time(9, system.config().frame_step()).unwrap();
    assert_eq!(thanks.visible_chars(pause + 0.25), 9);
    let shown = thanks.reveal_time(thanks.text.chars().count(), 1.0 / 60.0).unwrap();
    assert!(shown > pause + 0.5 && shown <= thanks.end_time());
}

#[test]
fn branching_scene_refuse_path_keeps_flag() {
    let system = DialogueSystem::default();
    let graph = system
        .load_graph(&branching_scene().to_json_string())
        .unwrap();

    let walk = system.run(&graph, "start", &[1]).unwrap();
    assert_eq!(walk.variables.get("helped"), Some(&Value::Bool(false)));
    let texts: Vec<&str> = walk.clips.iter().map(|clip| clip.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["Good morning", "Help the merchant", "Not today", "Suit yourself", "end"]
    );
    assert_eq!(walk.clips.end_time(), 7.0);
}

#[test]
fn written_document_walks_the_same() {
    let system = DialogueSystem::default();
    let graph = system
        .load_graph(&branching_scene().to_json_string())
        .unwrap();
    let document = graph.to_document();
    let reloaded = system
        .load_graph(&document.to_json_pretty().unwrap())
        .unwrap();
    let rebuilt = system.load_document(&document).unwrap();

    assert_eq!(reloaded.node_count(), graph.node_count());
    assert_eq!(reloaded.edge_count(), graph.edge_count());
    for choice in 0..2 {
        let before = system.run(&graph, "start", &[choice]).unwrap();
        assert_eq!(before, system.run(&reloaded, "start", &[choice]).unwrap());
        assert_eq!(before, system.run(&rebuilt, "start", &[choice]).unwrap());
    }
}

#[test]
fn scene_analysis_counts_every_node() {
    let system = DialogueSystem::default();
    let graph = system
        .load_graph(&branching_scene().to_json_string())
        .unwrap();
    let stats = graph.stats();
    assert_eq!(stats.total_nodes, 12);
    assert_eq!(stats.unreachable_nodes, 0);
    assert_eq!(stats.entry_count, 1);
    assert_eq!(stats.processor_count, 2);
    assert!(graph.to_dot().contains("Choice"));
}

#[test]
fn config_file_drives_defaults_and_guards() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runtime.toml");
    std::fs::write(
        &path,
        "default_dialogue_duration = 1.25\nmax_walk_depth = 3\n\n[limits]\nmax_text_length = 64\n",
    )
    .unwrap();
    let system = DialogueSystem::from_config_file(&path).unwrap();
    assert_eq!(system.config().limits.max_text_length, 64);

    let graph = system
        .load_graph(
            &DocBuilder::new("config")
                .entry(1, "start")
                .node(2, "Dialogue", json!({ "text": "One" }))
                .node(3, "Dialogue", json!({ "text": "Two" }))
                .edge(1, 0, 2, 0)
                .edge(2, 0, 3, 0)
                .to_json_string(),
        )
        .unwrap();
    let walk = system.walker(&graph).start("start").unwrap();
    assert_eq!(walk.clips.clips()[1].start_time, 1.25);

    let graph = system
        .load_graph(
            &DocBuilder::new("loop")
                .entry(1, "start")
                .node(2, "Dialogue", json!({ "text": "again" }))
                .edge(1, 0, 2, 0)
                .edge(2, 0, 2, 0)
                .to_json_string(),
        )
        .unwrap();
    assert!(matches!(
        system.walker(&graph).start("start"),
        Err(WalkError::DepthExceeded { limit: 3, .. })
    ));
}

#[test]
fn unknown_config_keys_are_rejected() {
    let err = RuntimeConfig::from_toml_str("frame_rate = 30\nframes = 2\n").unwrap_err();
    assert!(err.to_string().contains("frames"));
}

#[test]
fn errors_surface_through_umbrella_with_codes() {
    let system = DialogueSystem::default();
    let graph = system
        .load_graph(&branching_scene().to_json_string())
        .unwrap();

    let err = system.run(&graph, "nowhere", &[]).unwrap_err();
    assert!(matches!(err, DsError::Walk(WalkError::MissingEntry { .. })));
    assert_eq!(err.code().unwrap().to_string(), "ds::walk::entry");

    let broken = branching_scene()
        .edge(1, 0, 99, 0)
        .to_json_string();
    let err: DsError = system.load_graph(&broken).unwrap_err().into();
    assert_eq!(err.code().unwrap().to_string(), "ds::deser::dangling");
    assert!(err.to_string().contains(&id(99)));
}

#[test]
fn host_tags_are_stripped_and_reported() {
    let mut system = DialogueSystem::default();
    system
        .tag_registry_mut()
        .register(CustomTagDef::new("shake", TagShape::Span, TagBehavior::Host))
        .unwrap();
    let parsed = system.parse_text("Look <shake>out</shake>!").unwrap();
    assert_eq!(parsed.text, "Look out!");
    assert_eq!(parsed.tags.len(), 1);
    assert_eq!((parsed.tags[0].start, parsed.tags[0].length), (5, 3));
    assert_eq!(parsed.tags[0].behavior, TagBehavior::Host);

    assert!(system
        .tag_registry_mut()
        .register(CustomTagDef::new("b", TagShape::Span, TagBehavior::Host))
        .is_err());
}
