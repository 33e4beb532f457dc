//! Downlink payload normalization
//!
//! Callers describe a downlink payload in several shapes: a list of byte
//! values, a single integer, base64 text, a keyword command, or plain
//! ASCII text. All of them are reduced to the raw bytes that end up in
//! the queue item's `data` field.
//!
//! Rules are applied in a fixed order:
//!   1. raw bytes pass through unchanged
//!   2. a list of integers packs one byte per element (0-255 each)
//!   3. an integer becomes a single byte (0-255)
//!   4. text that decodes as padded standard base64 yields the decoded bytes
//!   5. `on` / `off` (any case) yield [`ON_BYTE`] / [`OFF_BYTE`]
//!   6. any other ASCII text is sent as-is
//!
//! Anything else is an error; nothing is truncated or guessed.

use base64::Engine;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Byte sent for the `on` command
pub const ON_BYTE: u8 = 0x01;
/// Byte sent for the `off` command
pub const OFF_BYTE: u8 = 0x00;

/// A downlink payload as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Bytes(Vec<u8>),
    Integer(i64),
    Sequence(Vec<i64>),
    Text(String),
}

/// Keyword commands accepted in place of a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    On,
    Off,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("payload value {0} is outside the byte range 0-255")]
    OutOfRange(String),

    #[error("payload element {index} ({value}) is outside the byte range 0-255")]
    ElementOutOfRange { index: usize, value: String },

    #[error("payload element {index} is not an integer")]
    MixedSequence { index: usize },

    #[error("text payload contains non-ASCII characters")]
    NonAscii,

    #[error("unsupported payload type: {0}")]
    Unsupported(&'static str),

    #[error("unknown command '{0}', expected 'on' or 'off'")]
    UnknownCommand(String),
}

impl Command {
    pub fn byte(self) -> u8 {
        match self {
            Command::On => ON_BYTE,
            Command::Off => OFF_BYTE,
        }
    }
}

impl FromStr for Command {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("on") {
            Ok(Command::On)
        } else if s.eq_ignore_ascii_case("off") {
            Ok(Command::Off)
        } else {
            Err(PayloadError::UnknownCommand(s.to_string()))
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::On => write!(f, "on"),
            Command::Off => write!(f, "off"),
        }
    }
}

impl TryFrom<&Value> for Payload {
    type Error = PayloadError;

    /// Classify a JSON value into one of the accepted payload shapes
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(Payload::Text(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Payload::Integer(i))
                } else if n.is_u64() {
                    // Positive but wider than i64
                    Err(PayloadError::OutOfRange(n.to_string()))
                } else {
                    Err(PayloadError::Unsupported("fractional number"))
                }
            }
            Value::Array(items) => {
                let mut sequence = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    match item {
                        Value::Number(n) if n.is_i64() || n.is_u64() => match n.as_i64() {
                            Some(i) => sequence.push(i),
                            None => {
                                return Err(PayloadError::ElementOutOfRange {
                                    index,
                                    value: n.to_string(),
                                })
                            }
                        },
                        _ => return Err(PayloadError::MixedSequence { index }),
                    }
                }
                Ok(Payload::Sequence(sequence))
            }
            Value::Null => Err(PayloadError::Unsupported("null")),
            Value::Bool(_) => Err(PayloadError::Unsupported("boolean")),
            Value::Object(_) => Err(PayloadError::Unsupported("object")),
        }
    }
}

/// Reduce a payload to the raw bytes placed in the downlink
pub fn normalize(payload: Payload) -> Result<Vec<u8>, PayloadError> {
    match payload {
        Payload::Bytes(bytes) => Ok(bytes),
        Payload::Sequence(values) => values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                u8::try_from(value).map_err(|_| PayloadError::ElementOutOfRange {
                    index,
                    value: value.to_string(),
                })
            })
            .collect(),
        Payload::Integer(value) => u8::try_from(value)
            .map(|b| vec![b])
            .map_err(|_| PayloadError::OutOfRange(value.to_string())),
        Payload::Text(text) => normalize_text(text),
    }
}

fn normalize_text(text: String) -> Result<Vec<u8>, PayloadError> {
    if let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(&text) {
        return Ok(bytes);
    }

    if let Ok(command) = text.parse::<Command>() {
        return Ok(vec![command.byte()]);
    }

    if !text.is_ascii() {
        return Err(PayloadError::NonAscii);
    }

    Ok(text.into_bytes())
}
