use tracing::{debug, instrument, trace, warn};

use crate::curve::{AnimationCurve, Keyframe};
use crate::graph::{flip, Graph, Node, NodeIndex, CONTINUE_PORT};
use crate::processor::{ProcessorContext, Variables};
use crate::registry::NodeKind;
use crate::system::DialogueSystem;
use crate::tags::{ParsedText, TextEffects};
use crate::value::Value;
use crate::visibility::VisibilityCurve;

use super::clip::{Clip, ClipKind, ClipSequence};
use super::context::{PreviousContext, Suspension, WalkState};
use super::WalkError;

/// Data socket read by set, condition and blend nodes.
const DATA_SOCKET: i32 = flip(0);

#[derive(Clone, Debug, PartialEq)]
pub enum WalkOutcome {
    Finished,
    Suspended(Suspension),
}

/// Result of one uninterrupted stretch of walking.
#[derive(Clone, Debug, PartialEq)]
pub struct Walk {
    pub clips: ClipSequence,
    pub outcome: WalkOutcome,
    /// Variables as they stood when the stretch ended.
    pub variables: Variables,
}

impl Walk {
    pub fn suspension(&self) -> Option<&Suspension> {
        match &self.outcome {
            WalkOutcome::Suspended(suspension) => Some(suspension),
            WalkOutcome::Finished => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.outcome, WalkOutcome::Finished)
    }
}

/// What a node asks the walker to do after interpreting it.
#[derive(Clone, Debug, PartialEq)]
enum Flow {
    Continue(i32),
    Suspend(Vec<String>),
}

type InterpretFn =
    fn(&Walker<'_>, Step<'_>, &mut WalkState, &mut ClipSequence) -> Result<Flow, WalkError>;

/// The node being interpreted and its arena index.
#[derive(Clone, Copy)]
struct Step<'n> {
    index: NodeIndex,
    node: &'n Node,
}

#[derive(Clone, Copy)]
struct Interpreter {
    kind: NodeKind,
    interpret: InterpretFn,
}

const INTERPRETERS: &[Interpreter] = &[
    Interpreter {
        kind: NodeKind::Input,
        interpret: interpret_input,
    },
    Interpreter {
        kind: NodeKind::Dialogue,
        interpret: interpret_dialogue,
    },
    Interpreter {
        kind: NodeKind::Choice,
        interpret: interpret_choice,
    },
    Interpreter {
        kind: NodeKind::Action,
        interpret: interpret_action,
    },
    Interpreter {
        kind: NodeKind::Set,
        interpret: interpret_set,
    },
    Interpreter {
        kind: NodeKind::Condition,
        interpret: interpret_condition,
    },
    Interpreter {
        kind: NodeKind::Marker,
        interpret: interpret_marker,
    },
    Interpreter {
        kind: NodeKind::Blend,
        interpret: interpret_blend,
    },
];

fn interpreter_for(kind: NodeKind) -> Option<&'static Interpreter> {
    INTERPRETERS
        .iter()
        .find(|interpreter| interpreter.kind == kind)
}

/// Walks one graph on behalf of a [`DialogueSystem`].
#[derive(Clone, Debug)]
pub struct Walker<'a> {
    graph: &'a Graph,
    system: &'a DialogueSystem,
    variables: Variables,
}

impl<'a> Walker<'a> {
    /// A walker whose variables start from the graph's property definitions.
    pub fn new(graph: &'a Graph, system: &'a DialogueSystem) -> Self {
        let variables = graph
            .properties()
            .iter()
            .map(|property| (property.name.clone(), property.value.clone()))
            .collect();
        Self {
            graph,
            system,
            variables,
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn graph(&self) -> &'a Graph {
        self.graph
    }

    /// Walks from the entry node named `entry` until the flow ends or suspends.
    #[instrument(skip_all, fields(object_id = %self.graph.object_id, entry = %entry))]
    pub fn start(&self, entry: &str) -> Result<Walk, WalkError> {
        let start = self
            .graph
            .entry_index(entry)
            .ok_or_else(|| WalkError::MissingEntry {
                name: entry.to_string(),
            })?;
        let mut state = WalkState {
            previous: PreviousContext::origin(),
            variables: self.variables.clone(),
            steps: 0,
        };
        let mut clips = ClipSequence::new();
        let outcome = self.walk_from(start, &mut state, &mut clips)?;
        Ok(Walk {
            clips,
            outcome,
            variables: state.variables,
        })
    }

    /// Continues a suspended walk along output `option` of the suspended node.
    ///
    /// An option with no outgoing edge ends the walk with no further clips.
    #[instrument(skip_all, fields(object_id = %self.graph.object_id, node = %suspension.node_id, option = option))]
    pub fn resume(&self, suspension: &Suspension, option: usize) -> Result<Walk, WalkError> {
        let belongs = self
            .graph
            .node(suspension.node)
            .is_some_and(|node| node.id == suspension.node_id);
        if !belongs {
            return Err(WalkError::StaleSuspension {
                node: suspension.node_id,
            });
        }
        let available = suspension.option_count();
        if option >= available {
            return Err(WalkError::InvalidOption {
                node: suspension.node_id,
                option,
                available,
            });
        }

        let mut state = WalkState {
            previous: suspension.previous,
            variables: suspension.variables.clone(),
            steps: 0,
        };
        let mut clips = ClipSequence::new();
        let port = i32::try_from(option).map_err(|_| WalkError::InvalidOption {
            node: suspension.node_id,
            option,
            available,
        })?;
        let outcome = match self.graph.follow_output(suspension.node, port) {
            Some(next) => self.walk_from(next, &mut state, &mut clips)?,
            None => WalkOutcome::Finished,
        };
        Ok(Walk {
            clips,
            outcome,
            variables: state.variables,
        })
    }

    /// Starts at `entry` and answers each suspension with the next of `choices`.
    ///
    /// Clips of every stretch are concatenated. Stops early when the walk finishes; a walk
    /// still suspended after the last choice is returned as such.
    pub fn run(&self, entry: &str, choices: &[usize]) -> Result<Walk, WalkError> {
        let mut walk = self.start(entry)?;
        for &choice in choices {
            let Some(suspension) = walk.suspension() else {
                break;
            };
            let next = self.resume(suspension, choice)?;
            walk.clips.extend(next.clips);
            walk.outcome = next.outcome;
            walk.variables = next.variables;
        }
        Ok(walk)
    }

    fn walk_from(
        &self,
        start: NodeIndex,
        state: &mut WalkState,
        clips: &mut ClipSequence,
    ) -> Result<WalkOutcome, WalkError> {
        let mut current = start;
        loop {
            let node = self.node(current)?;
            state.steps += 1;
            if let Some(limit) = self.system.config().max_walk_depth {
                if state.steps > limit {
                    warn!(node = %node.id, limit, "walk depth guard tripped");
                    return Err(WalkError::DepthExceeded {
                        node: node.id,
                        limit,
                    });
                }
            }
            trace!(node = %node.id, kind = %node.kind, step = state.steps, "interpret");

            let interpreter =
                interpreter_for(node.kind).ok_or(WalkError::NotInterpretable {
                    node: node.id,
                    kind: node.kind,
                })?;
            let step = Step {
                index: current,
                node,
            };
            match (interpreter.interpret)(self, step, state, clips)? {
                Flow::Continue(port) => match self.graph.follow_output(current, port) {
                    Some(next) => current = next,
                    None => {
                        trace!(node = %node.id, port, "flow ends");
                        return Ok(WalkOutcome::Finished);
                    }
                },
                Flow::Suspend(options) if options.is_empty() => {
                    return Ok(WalkOutcome::Finished);
                }
                Flow::Suspend(options) => {
                    debug!(node = %node.id, options = options.len(), "walk suspended");
                    return Ok(WalkOutcome::Suspended(Suspension {
                        node: current,
                        node_id: node.id,
                        kind: node.kind,
                        options,
                        previous: state.previous,
                        variables: state.variables.clone(),
                    }));
                }
            }
        }
    }

    fn node(&self, index: NodeIndex) -> Result<&'a Node, WalkError> {
        self.graph
            .node(index)
            .ok_or(WalkError::UnknownNode { index: index.0 })
    }

    /// Pulls the processor tree feeding the data socket of `node`.
    fn pull(&self, step: Step<'_>, variables: &Variables) -> Result<Value, WalkError> {
        ProcessorContext::new(self.graph, variables)
            .with_max_depth(self.system.config().max_processor_depth)
            .pull_input(step.index, DATA_SOCKET)
            .map_err(|source| WalkError::Processor {
                node: step.node.id,
                source,
            })
    }

    fn has_data_input(&self, node: &Node) -> bool {
        node.input(DATA_SOCKET).is_some_and(|port| port.is_connected())
    }

    /// Parses the payload `text` under the configured length limit.
    fn parse_payload_text(&self, node: &Node) -> Result<(ParsedText, TextEffects), WalkError> {
        let raw = node.payload.str("text").unwrap_or_default();
        let limit = self.system.config().limits.max_text_length;
        if raw.len() > limit {
            return Err(WalkError::TextTooLong {
                node: node.id,
                length: raw.len(),
                limit,
            });
        }
        let tag_error = |source| WalkError::Tag {
            node: node.id,
            source,
        };
        let parsed = self.system.parse_text(raw).map_err(tag_error)?;
        let effects = TextEffects::from_tags(&parsed.tags).map_err(tag_error)?;
        Ok((parsed, effects))
    }

    fn visibility_for(
        &self,
        node: &Node,
        duration: f32,
        effects: &TextEffects,
        text_len: usize,
    ) -> Result<VisibilityCurve, WalkError> {
        let config = self.system.config();
        let start_offset = node
            .payload
            .f32("startOffset")
            .unwrap_or(config.default_start_offset);
        let end_offset = node
            .payload
            .f32("endOffset")
            .unwrap_or(config.default_end_offset);
        let mut curve =
            VisibilityCurve::new(editor_curve(node)?, duration).with_offsets(start_offset, end_offset);
        if !effects.waits.is_empty() {
            curve
                .apply_pauses(&effects.waits, text_len)
                .map_err(|source| WalkError::Curve {
                    node: node.id,
                    source,
                })?;
        }
        Ok(curve)
    }
}

fn emit(state: &mut WalkState, clips: &mut ClipSequence, clip: Clip) {
    state.previous = state.previous.advance(&clip);
    clips.push(clip);
}

fn non_negative(value: Option<f32>, default: f32) -> f32 {
    value.filter(|v| v.is_finite()).unwrap_or(default).max(0.0)
}

fn string_list(node: &Node, key: &'static str) -> Result<Vec<String>, WalkError> {
    if node.payload.get(key).is_none() {
        return Ok(Vec::new());
    }
    node.payload
        .strings(key)
        .ok_or_else(|| WalkError::InvalidField {
            node: node.id,
            key,
            reason: "expected a list of strings".to_string(),
        })
}

/// Reads `curve` as `[time, value, inTangent, outTangent]` keys; linear when absent.
fn editor_curve(node: &Node) -> Result<AnimationCurve, WalkError> {
    let Some(keys) = node.payload.sequence("curve") else {
        return Ok(AnimationCurve::linear(0.0, 0.0, 1.0, 1.0));
    };
    let invalid = |reason: &str| WalkError::InvalidField {
        node: node.id,
        key: "curve",
        reason: reason.to_string(),
    };
    if keys.is_empty() {
        return Err(invalid("needs at least one keyframe"));
    }

    let mut frames = Vec::with_capacity(keys.len());
    for key in keys {
        let numbers: Option<Vec<f32>> = key
            .as_sequence()
            .and_then(|parts| parts.iter().map(|part| part.as_f64().map(|v| v as f32)).collect());
        match numbers.as_deref() {
            Some(&[time, value, in_tangent, out_tangent]) => {
                frames.push(Keyframe::new(time, value, in_tangent, out_tangent));
            }
            _ => return Err(invalid("keys are [time, value, inTangent, outTangent]")),
        }
    }
    AnimationCurve::new(frames).map_err(|source| WalkError::Curve {
        node: node.id,
        source,
    })
}

// =============================================================================
// Node interpreters
// =============================================================================

fn interpret_input(
    _walker: &Walker<'_>,
    _step: Step<'_>,
    _state: &mut WalkState,
    _clips: &mut ClipSequence,
) -> Result<Flow, WalkError> {
    Ok(Flow::Continue(CONTINUE_PORT))
}

fn interpret_dialogue(
    walker: &Walker<'_>,
    step: Step<'_>,
    state: &mut WalkState,
    clips: &mut ClipSequence,
) -> Result<Flow, WalkError> {
    let node = step.node;
    let config = walker.system.config();
    let (parsed, effects) = walker.parse_payload_text(node)?;
    let duration = non_negative(node.payload.f32("duration"), config.default_dialogue_duration);
    let visibility = walker.visibility_for(node, duration, &effects, parsed.char_len())?;

    let mut clip = Clip::new(
        ClipKind::Dialogue,
        node.id,
        state.previous.end_time(),
        duration,
    );
    clip.actor = node.payload.str("actorID").unwrap_or_default().to_string();
    clip.text = parsed.text;
    clip.tags = parsed.tags;
    clip.effects = effects;
    clip.visibility = Some(visibility);
    emit(state, clips, clip);
    Ok(Flow::Continue(CONTINUE_PORT))
}

fn interpret_choice(
    walker: &Walker<'_>,
    step: Step<'_>,
    state: &mut WalkState,
    clips: &mut ClipSequence,
) -> Result<Flow, WalkError> {
    let node = step.node;
    let choices = string_list(node, "choices")?;
    let duration = non_negative(
        node.payload.f32("duration"),
        walker.system.config().default_choice_duration,
    );
    let mut clip = Clip::new(ClipKind::Choice, node.id, state.previous.end_time(), duration);
    let (prompt, effects) = walker.parse_payload_text(node)?;
    clip.actor = node.payload.str("actorID").unwrap_or_default().to_string();
    clip.text = prompt.text;
    clip.tags = prompt.tags;
    clip.effects = effects;
    clip.choices = choices.clone();
    emit(state, clips, clip);
    Ok(Flow::Suspend(choices))
}

/// Actions overlay the previous clip instead of following it.
fn interpret_action(
    walker: &Walker<'_>,
    step: Step<'_>,
    state: &mut WalkState,
    clips: &mut ClipSequence,
) -> Result<Flow, WalkError> {
    let node = step.node;
    let actions = string_list(node, "actions")?;
    let delay = non_negative(node.payload.f32("delay"), 0.0);
    let duration = non_negative(
        node.payload.f32("duration"),
        walker.system.config().default_choice_duration,
    );
    let mut clip = Clip::new(
        ClipKind::Action,
        node.id,
        state.previous.start_time + delay,
        duration,
    );
    clip.choices = actions.clone();
    emit(state, clips, clip);
    Ok(Flow::Suspend(actions))
}

fn interpret_set(
    walker: &Walker<'_>,
    step: Step<'_>,
    state: &mut WalkState,
    _clips: &mut ClipSequence,
) -> Result<Flow, WalkError> {
    let node = step.node;
    let property = node
        .payload
        .str("property")
        .ok_or(WalkError::MissingField {
            node: node.id,
            key: "property",
        })?;
    let value = walker.pull(step, &state.variables)?;
    trace!(node = %node.id, property, %value, "set");
    state.variables.insert(property.to_string(), value);
    Ok(Flow::Continue(CONTINUE_PORT))
}

/// Output 0 when the data input is true, output 1 otherwise.
fn interpret_condition(
    walker: &Walker<'_>,
    step: Step<'_>,
    state: &mut WalkState,
    _clips: &mut ClipSequence,
) -> Result<Flow, WalkError> {
    let node = step.node;
    let value = walker.pull(step, &state.variables)?;
    let passed = value.as_bool().ok_or(WalkError::NotBoolean {
        node: node.id,
        found: value.kind_name(),
    })?;
    Ok(Flow::Continue(if passed { 0 } else { 1 }))
}

fn interpret_marker(
    _walker: &Walker<'_>,
    step: Step<'_>,
    state: &mut WalkState,
    clips: &mut ClipSequence,
) -> Result<Flow, WalkError> {
    let node = step.node;
    let mut clip = Clip::new(ClipKind::Marker, node.id, state.previous.end_time(), 0.0);
    clip.text = node.payload.str("marker").unwrap_or_default().to_string();
    emit(state, clips, clip);
    Ok(Flow::Continue(CONTINUE_PORT))
}

/// A connected data input overrides the payload `duration`.
fn interpret_blend(
    walker: &Walker<'_>,
    step: Step<'_>,
    state: &mut WalkState,
    clips: &mut ClipSequence,
) -> Result<Flow, WalkError> {
    let node = step.node;
    let duration = if walker.has_data_input(node) {
        let value = walker.pull(step, &state.variables)?;
        let seconds = value.as_f64().ok_or(WalkError::NotNumeric {
            node: node.id,
            found: value.kind_name(),
        })?;
        non_negative(Some(seconds as f32), 0.0)
    } else {
        non_negative(node.payload.f32("duration"), 0.0)
    };
    let mut clip = Clip::new(ClipKind::Blend, node.id, state.previous.end_time(), duration);
    clip.text = node.payload.str("target").unwrap_or_default().to_string();
    emit(state, clips, clip);
    Ok(Flow::Continue(CONTINUE_PORT))
}
