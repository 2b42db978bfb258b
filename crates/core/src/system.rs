//! The runtime context shared by loading, parsing and walking.
//!
//! A [`DialogueSystem`] is built once at startup and passed by reference. It owns the
//! configuration and both registries, so there is no global state.

use std::path::Path;

use tracing::info;

use crate::config::{ConfigError, RuntimeConfig};
use crate::deserialize::{deserialize, deserialize_str, DeserializeError};
use crate::document::GraphDocument;
use crate::error::DsResult;
use crate::graph::Graph;
use crate::interpret::{Walk, Walker};
use crate::registry::NodeRegistry;
use crate::tags::{ParsedText, TagError, TagParser, TagRegistry};

#[derive(Clone, Debug)]
pub struct DialogueSystem {
    config: RuntimeConfig,
    nodes: NodeRegistry,
    tags: TagRegistry,
}

impl Default for DialogueSystem {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl DialogueSystem {
    /// A system with the built-in node kinds and custom tags.
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_registries(config, NodeRegistry::with_builtins(), TagRegistry::with_builtins())
    }

    pub fn with_registries(config: RuntimeConfig, nodes: NodeRegistry, tags: TagRegistry) -> Self {
        Self {
            config,
            nodes,
            tags,
        }
    }

    /// Loads and validates a TOML config, then builds a system from it.
    pub fn from_config_file(path: &Path) -> Result<Self, ConfigError> {
        let config = RuntimeConfig::load(path)?;
        info!(path = %path.display(), "runtime config loaded");
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn node_registry(&self) -> &NodeRegistry {
        &self.nodes
    }

    pub fn node_registry_mut(&mut self) -> &mut NodeRegistry {
        &mut self.nodes
    }

    pub fn tag_registry(&self) -> &TagRegistry {
        &self.tags
    }

    pub fn tag_registry_mut(&mut self) -> &mut TagRegistry {
        &mut self.tags
    }

    /// Parses and deserializes a JSON graph document under the configured limits.
    pub fn load_graph(&self, json: &str) -> Result<Graph, DeserializeError> {
        deserialize_str(json, &self.nodes, &self.config.limits)
    }

    pub fn load_document(&self, document: &GraphDocument) -> Result<Graph, DeserializeError> {
        deserialize(document, &self.nodes)
    }

    pub fn parse_text(&self, text: &str) -> Result<ParsedText, TagError> {
        TagParser::new(&self.tags).parse(text)
    }

    pub fn walker<'a>(&'a self, graph: &'a Graph) -> Walker<'a> {
        Walker::new(graph, self)
    }

    /// Walks `graph` from `entry`, answering suspensions with `choices` in order.
    pub fn run(&self, graph: &Graph, entry: &str, choices: &[usize]) -> DsResult<Walk> {
        Ok(self.walker(graph).run(entry, choices)?)
    }
}
