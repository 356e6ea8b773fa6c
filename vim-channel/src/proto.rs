//! Messages of Vim's JSON channel mode.
//!
//! Vim sends `[n, payload]`; a positive `n` is a request we acknowledge with
//! `[n, reply]`. Our own calls carry a negative id and Vim answers them with
//! `[id, result]`.

use serde_json::Value;
use serde_json::json;

use crate::error::ChannelError;
use crate::error::Result;

/// What Vim answers when it could not evaluate a call.
pub const VIM_ERROR: &str = "ERROR";

#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// Answer to one of our calls; `id` is the negative id we sent.
    Reply { id: i64, result: Value },
    /// A message initiated by the editor. `id == 0` expects no answer.
    Request { id: i64, payload: Value },
}

impl Incoming {
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(ChannelError::Malformed(format!(
                "expected [id, payload], got {value}"
            )));
        };
        let [id, payload]: [Value; 2] = items.try_into().map_err(|items: Vec<Value>| {
            ChannelError::Malformed(format!("expected 2 elements, got {}", items.len()))
        })?;
        let Some(id) = id.as_i64() else {
            return Err(ChannelError::Malformed(format!("non-integer id: {id}")));
        };
        Ok(if id < 0 {
            Incoming::Reply {
                id,
                result: payload,
            }
        } else {
            Incoming::Request { id, payload }
        })
    }
}

pub fn expr(expr: &str, id: i64) -> Value {
    json!(["expr", expr, id])
}

pub fn call(func: &str, args: Vec<Value>, id: i64) -> Value {
    json!(["call", func, args, id])
}

pub fn ex(command: &str) -> Value {
    json!(["ex", command])
}

pub fn redraw(force: bool) -> Value {
    json!(["redraw", if force { "force" } else { "" }])
}

pub fn reply(id: i64, value: Value) -> Value {
    json!([id, value])
}

/// Newline-terminated wire form of `message`.
pub fn encode(message: &Value) -> Vec<u8> {
    let mut bytes = message.to_string().into_bytes();
    bytes.push(b'\n');
    bytes
}

/// Splits a byte stream into JSON values. A value may arrive in pieces and
/// one read may carry several values.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Next complete value, `None` until more bytes are needed. A malformed
    /// value is reported once and the rest of the line it sits on is dropped.
    pub fn next_frame(&mut self) -> Option<Result<Value>> {
        let (next, consumed) = {
            let mut stream =
                serde_json::Deserializer::from_slice(&self.buffer).into_iter::<Value>();
            let next = stream.next();
            (next, stream.byte_offset())
        };
        match next {
            None => {
                // Only whitespace left.
                self.buffer.clear();
                None
            }
            Some(Ok(value)) => {
                self.buffer.drain(..consumed);
                Some(Ok(value))
            }
            Some(Err(err)) if err.is_eof() => None,
            Some(Err(err)) => {
                let at = error_offset(&self.buffer, err.line(), err.column());
                let skip = self.buffer[at..]
                    .iter()
                    .position(|byte| *byte == b'\n')
                    .map_or(self.buffer.len(), |pos| at + pos + 1);
                self.buffer.drain(..skip);
                Some(Err(err.into()))
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.iter().all(u8::is_ascii_whitespace)
    }
}

/// Byte offset of the 1-based `line`/`column` position serde_json reports.
fn error_offset(buffer: &[u8], line: usize, column: usize) -> usize {
    let line_start = match line.checked_sub(2) {
        Some(newlines) => buffer
            .iter()
            .enumerate()
            .filter(|(_, byte)| **byte == b'\n')
            .nth(newlines)
            .map_or(buffer.len(), |(pos, _)| pos + 1),
        None => 0,
    };
    (line_start + column.saturating_sub(1)).min(buffer.len())
}
