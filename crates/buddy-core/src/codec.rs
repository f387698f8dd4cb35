//! Command protocol codec.
//!
//! Models rarely answer with bare JSON. They prepend prose, wrap the object
//! in code fences, or ramble after it. Decoding is therefore two steps:
//!
//! 1. [`extract_first_json_object`] cuts out the first balanced `{...}` span
//! 2. [`decode`] parses that span and validates it against the closed
//!    command schema
//!
//! A reply that fails either step produces no command at all.

use buddy_types::{Command, CommandType, EntityGuid, QuestId, SpellId};
use serde_json::Value;

/// Errors from decoding a model reply.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// No balanced brace-delimited object was found.
    #[error("no JSON object found in reply")]
    NoObject,

    /// The extracted span is not valid JSON.
    #[error("invalid JSON in reply: {source}")]
    Json {
        /// The underlying parse error.
        #[from]
        source: serde_json::Error,
    },

    /// A required field is absent or has the wrong JSON type.
    #[error("missing or malformed field `{0}`")]
    MissingField(&'static str),

    /// `command.type` is not one of the recognised commands.
    #[error("unknown command type `{0}`")]
    UnknownType(String),

    /// A required parameter is absent or not of the expected kind.
    #[error("command `{command}` has missing or invalid param `{param}`")]
    InvalidParam {
        /// The command being decoded.
        command: CommandType,
        /// The offending parameter name.
        param: &'static str,
    },
}

/// A validated model decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// The command to dispatch.
    pub command: Command,
    /// Stated reasoning, if present and non-empty.
    pub reasoning: Option<String>,
    /// Chat line to say, if present and non-empty.
    pub say: Option<String>,
    /// Compact JSON text of the `command` object as received.
    pub raw_command: String,
    /// The `command` object as received.
    pub command_value: Value,
}

/// Return the first balanced brace-delimited span of `input`.
///
/// Scans left to right keeping a nesting depth: every `{` increments it and
/// every `}` decrements it. The span starts at the first `{` seen at depth
/// zero and ends at the `}` that brings the depth back to zero. Braces inside
/// JSON strings are counted like any other, and a stray `}` before the first
/// `{` leaves the depth off by one for the rest of the scan.
pub fn extract_first_json_object(input: &str) -> Option<&str> {
    let mut depth: i64 = 0;
    let mut start: Option<usize> = None;

    for (index, ch) in input.char_indices() {
        match ch {
            '{' => {
                if depth == 0 {
                    start = Some(index);
                }
                depth = depth.saturating_add(1);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    if let Some(begin) = start {
                        return input.get(begin..=index);
                    }
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract, parse and validate the command object in a model reply.
///
/// # Errors
///
/// Returns a [`CodecError`] describing the first problem found. Nothing is
/// partially decoded.
pub fn decode(raw: &str) -> Result<Decision, CodecError> {
    let span = extract_first_json_object(raw).ok_or(CodecError::NoObject)?;
    let root: Value = serde_json::from_str(span)?;

    let command_value = root
        .get("command")
        .filter(|v| v.is_object())
        .ok_or(CodecError::MissingField("command"))?;
    let command = decode_command(command_value)?;

    Ok(Decision {
        command,
        reasoning: optional_text(&root, "reasoning"),
        say: optional_text(&root, "say"),
        raw_command: command_value.to_string(),
        command_value: command_value.clone(),
    })
}

/// Validate a `command` object (`{"type": .., "params": {..}}`).
///
/// # Errors
///
/// Returns a [`CodecError`] for an unknown type or a missing or mistyped
/// parameter.
pub fn decode_command(value: &Value) -> Result<Command, CodecError> {
    let tag = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingField("command.type"))?;
    let params = value
        .get("params")
        .filter(|p| p.is_object())
        .ok_or(CodecError::MissingField("command.params"))?;
    let kind = CommandType::from_wire(tag).ok_or_else(|| CodecError::UnknownType(tag.to_owned()))?;

    let command = match kind {
        CommandType::MoveTo => Command::MoveTo {
            x: float_param(params, kind, "x")?,
            y: float_param(params, kind, "y")?,
            z: float_param(params, kind, "z")?,
        },
        CommandType::Attack => Command::Attack {
            target: EntityGuid(int_param(params, kind, "guid")?),
        },
        CommandType::Interact => Command::Interact {
            target: EntityGuid(int_param(params, kind, "guid")?),
        },
        CommandType::Spell => Command::CastSpell {
            spell: SpellId(int_param(params, kind, "spellid")?),
            target: match params.get("guid") {
                None | Some(Value::Null) => None,
                Some(_) => Some(EntityGuid(int_param(params, kind, "guid")?)),
            },
        },
        CommandType::Loot => Command::Loot,
        CommandType::AcceptQuest => Command::AcceptQuest {
            quest: QuestId(int_param(params, kind, "id")?),
        },
        CommandType::TurnInQuest => Command::TurnInQuest {
            quest: QuestId(int_param(params, kind, "id")?),
        },
        CommandType::Follow => Command::Follow,
        CommandType::Stop => Command::Stop,
    };
    Ok(command)
}

fn optional_text(root: &Value, field: &str) -> Option<String> {
    root.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

/// A non-negative integer that fits in `u32`, given as a JSON number or a
/// decimal string.
fn int_param(params: &Value, command: CommandType, param: &'static str) -> Result<u32, CodecError> {
    let invalid = || CodecError::InvalidParam { command, param };
    match params.get(param) {
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse::<u32>().ok().ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// A finite coordinate, given as a JSON number or a decimal string.
#[allow(clippy::cast_possible_truncation)]
fn float_param(params: &Value, command: CommandType, param: &'static str) -> Result<f32, CodecError> {
    let invalid = || CodecError::InvalidParam { command, param };
    let value = match params.get(param) {
        Some(Value::Number(n)) => n.as_f64().ok_or_else(invalid)?,
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().ok_or_else(invalid)?,
        _ => return Err(invalid()),
    };
    let narrowed = value as f32;
    if narrowed.is_finite() {
        Ok(narrowed)
    } else {
        Err(invalid())
    }
}
