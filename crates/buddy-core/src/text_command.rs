//! Parser for the manual control syntax.
//!
//! Operators and scripts drive an agent with short whitespace-separated
//! commands such as `move to -9347 256 65` or `spell 133 2241`. Verbs are
//! matched exactly and in lower case. Tokens after the last expected
//! argument are ignored; `say` takes the rest of the line verbatim.

use core::str::FromStr;

use buddy_types::Command;

/// Errors from parsing a control string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextCommandError {
    /// The input was empty or whitespace.
    #[error("empty command")]
    Empty,

    /// The first word is not a known verb.
    #[error("unknown command `{0}`")]
    UnknownVerb(String),

    /// A required argument was not given.
    #[error("`{verb}` is missing its {argument} argument")]
    MissingArgument {
        /// The verb being parsed.
        verb: &'static str,
        /// Name of the missing argument.
        argument: &'static str,
    },

    /// An argument did not parse as a number.
    #[error("`{verb}`: `{value}` is not a valid {argument}")]
    InvalidNumber {
        /// The verb being parsed.
        verb: &'static str,
        /// Name of the argument.
        argument: &'static str,
        /// The text that failed to parse.
        value: String,
    },
}

/// A parsed control string.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlInput {
    /// One of the nine agent commands.
    Command(Command),
    /// Say a line in chat.
    Say(String),
}

impl core::fmt::Display for ControlInput {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Command(command) => write!(f, "{command}"),
            Self::Say(text) => write!(f, "say {text}"),
        }
    }
}

impl FromStr for ControlInput {
    type Err = TextCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parse one control string.
///
/// # Errors
///
/// Returns a [`TextCommandError`] for an empty input, an unknown verb, or a
/// missing or non-numeric argument.
pub fn parse(input: &str) -> Result<ControlInput, TextCommandError> {
    let input = input.trim_start();
    let (verb, rest) = input
        .split_once(char::is_whitespace)
        .unwrap_or((input, ""));
    if verb.is_empty() {
        return Err(TextCommandError::Empty);
    }
    let mut args = rest.split_whitespace();

    let command = match verb {
        "move" => {
            if args.next() != Some("to") {
                return Err(TextCommandError::MissingArgument {
                    verb: "move to",
                    argument: "`to`",
                });
            }
            Command::MoveTo {
                x: required(&mut args, "move to", "x")?,
                y: required(&mut args, "move to", "y")?,
                z: required(&mut args, "move to", "z")?,
            }
        }
        "attack" => Command::Attack {
            target: required(&mut args, "attack", "guid")?,
        },
        "interact" => Command::Interact {
            target: required(&mut args, "interact", "guid")?,
        },
        "spell" => Command::CastSpell {
            spell: required(&mut args, "spell", "spell id")?,
            target: optional(&mut args, "spell", "target guid")?,
        },
        "say" => {
            let text = rest.trim();
            if text.is_empty() {
                return Err(TextCommandError::MissingArgument {
                    verb: "say",
                    argument: "message",
                });
            }
            return Ok(ControlInput::Say(text.to_owned()));
        }
        "loot" => Command::Loot,
        "follow" => Command::Follow,
        "stop" => Command::Stop,
        "acceptquest" => Command::AcceptQuest {
            quest: required(&mut args, "acceptquest", "quest id")?,
        },
        "turninquest" => Command::TurnInQuest {
            quest: required(&mut args, "turninquest", "quest id")?,
        },
        other => return Err(TextCommandError::UnknownVerb(other.to_owned())),
    };
    Ok(ControlInput::Command(command))
}

fn required<'a, T: FromStr>(
    args: &mut impl Iterator<Item = &'a str>,
    verb: &'static str,
    argument: &'static str,
) -> Result<T, TextCommandError> {
    optional(args, verb, argument)?
        .ok_or(TextCommandError::MissingArgument { verb, argument })
}

fn optional<'a, T: FromStr>(
    args: &mut impl Iterator<Item = &'a str>,
    verb: &'static str,
    argument: &'static str,
) -> Result<Option<T>, TextCommandError> {
    args.next()
        .map(|raw| {
            raw.parse::<T>()
                .ok()
                .ok_or_else(|| TextCommandError::InvalidNumber {
                    verb,
                    argument,
                    value: raw.to_owned(),
                })
        })
        .transpose()
}
