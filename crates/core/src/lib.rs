//! Dialogue graph runtime.
//!
//! Loads authored dialogue graphs from their JSON document form, walks them from a named
//! entry into timed [`Clip`]s, and derives per-character reveal timing from inline text tags.
//!
//! ```no_run
//! use dialogue_graph::{DialogueSystem, WalkOutcome};
//!
//! # fn main() -> dialogue_graph::DsResult<()> {
//! let system = DialogueSystem::default();
//! let graph = system.load_graph(&std::fs::read_to_string("intro.json").unwrap_or_default())?;
//! let walk = system.walker(&graph).start("start")?;
//! for clip in &walk.clips {
//!     println!("{:>6.2}s {}: {}", clip.start_time, clip.actor, clip.text);
//! }
//! if let WalkOutcome::Suspended(suspension) = &walk.outcome {
//!     let _rest = system.walker(&graph).resume(suspension, 0)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod curve;
pub mod deserialize;
pub mod document;
mod error;
pub mod graph;
pub mod interpret;
pub mod processor;
pub mod registry;
mod system;
pub mod tags;
pub mod value;
pub mod version;
pub mod visibility;

pub use config::{ConfigError, Limits, RuntimeConfig};
pub use curve::{AnimationCurve, CurveError, Keyframe};
pub use deserialize::{deserialize, deserialize_str, DeserializeError, ENTRY_NAME_KEY};
pub use document::GraphDocument;
pub use error::{DsError, DsResult};
pub use graph::{Graph, GraphStats, Node, NodeId, NodeIndex, PortRef};
pub use interpret::{
    Clip, ClipKind, ClipSequence, PreviousContext, Suspension, Walk, WalkError, WalkOutcome, Walker,
};
pub use processor::{Comparison, ProcessorContext, ProcessorError, Variables};
pub use registry::{NodeKind, NodeRegistry};
pub use system::DialogueSystem;
pub use tags::{ParsedText, TagError, TagInstance, TagParser, TagRegistry, TextEffects};
pub use value::{Payload, Value};
pub use version::GRAPH_FORMAT_VERSION;
pub use visibility::VisibilityCurve;
