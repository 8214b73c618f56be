//! Line commands read from stdin.
//!
//! | Command | Effect |
//! |---------|--------|
//! | `dispatch <channel> [json]` | host-internal dispatch |
//! | `echo <n> <channel> [json]` | surface `n` sends through the relay |
//! | `post <n> <channel> [json]` | surface `n` posts to host listeners |
//! | `invoke <n> <channel> [json]` | surface `n` makes a blocking call |
//! | `open` | opens another surface |
//! | `close <n>` | closes surface `n` |
//! | `surfaces` | lists open surfaces |
//! | `q`, `quit` | exits |
//!
//! A payload that is not valid JSON is sent as a JSON string.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use shellbus_event::Channel;

/// How a surface sends, for the surface-originated commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Via {
    Echo,
    Post,
    Invoke,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Dispatch {
        channel: Channel,
        payload: Value,
    },
    Surface {
        via: Via,
        surface: usize,
        channel: Channel,
        payload: Value,
    },
    Open,
    Close(usize),
    Surfaces,
    Quit,
}

impl Command {
    /// Parses one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = split_word(line);

        let command = match word {
            "q" | "quit" => Self::Quit,
            "open" => Self::Open,
            "surfaces" => Self::Surfaces,
            "close" => Self::Close(surface_number(rest)?),
            "dispatch" => {
                let (channel, payload) = channel_and_payload(rest)?;
                Self::Dispatch { channel, payload }
            }
            "echo" | "post" | "invoke" => {
                let via = match word {
                    "echo" => Via::Echo,
                    "post" => Via::Post,
                    _ => Via::Invoke,
                };
                let (number, rest) = split_word(rest);
                let (channel, payload) = channel_and_payload(rest)?;
                Self::Surface {
                    via,
                    surface: surface_number(number)?,
                    channel,
                    payload,
                }
            }
            other => bail!("unknown command: {other}"),
        };
        Ok(Some(command))
    }
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (input, ""),
    }
}

fn surface_number(word: &str) -> Result<usize> {
    let word = word.trim();
    if word.is_empty() {
        bail!("missing surface number");
    }
    word.parse()
        .with_context(|| format!("invalid surface number: {word}"))
}

fn channel_and_payload(input: &str) -> Result<(Channel, Value)> {
    let (name, payload) = split_word(input);
    if name.is_empty() {
        bail!("missing channel");
    }
    let channel = Channel::parse(name)?;
    Ok((channel, parse_payload(payload)))
}

fn parse_payload(raw: &str) -> Value {
    let raw = raw.trim();
    if raw.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
