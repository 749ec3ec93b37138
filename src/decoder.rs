//! Decoder for newline-delimited JSON generation streams.
//!
//! The body of a generation response is not one JSON document. The server
//! flushes one small object per line while it generates:
//!
//! ```text
//! {"model":"llama3","response":"Hel","done":false}
//! {"model":"llama3","response":"lo","done":false}
//! {"model":"llama3","response":"","done":true,"context":[1,2,3]}
//! ```
//!
//! Every line is parsed on its own and only the `response`, `context` and
//! `error` fields are looked at. Anything else the server adds is ignored.

use crate::context::ConversationContext;
use crate::error::Result;
use crate::protocol::StreamEvent;
use futures::{Stream, StreamExt, stream};
use serde_json::Value;
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("context token `{0}` is not an integer")]
    MalformedContext(String),
}

/// Incremental line decoder. Bytes may arrive split at any position, including
/// inside a multi-byte character; only complete lines are decoded.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
    halted: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the body and drain the events of every completed line.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.halted {
            return events;
        }

        self.buffer.extend_from_slice(bytes);

        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.drain(..=newline_pos).collect::<Vec<_>>();
            if self.consume_line(&line[..line.len() - 1], &mut events) {
                break;
            }
        }

        events
    }

    /// Decode whatever is left once the body ends. The last line of a body is
    /// not required to carry a trailing newline.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.halted {
            return events;
        }

        let rest = std::mem::take(&mut self.buffer);
        self.consume_line(&rest, &mut events);
        events
    }

    /// True once an error line has been seen. No further events are produced.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    fn consume_line(&mut self, raw: &[u8], events: &mut Vec<StreamEvent>) -> bool {
        let line = String::from_utf8_lossy(raw);
        if decode_line(&line, events) {
            self.halted = true;
            self.buffer.clear();
        }
        self.halted
    }
}

/// Decode a single line into `events`. Returns true if the line carried an
/// error and the stream must not be read any further.
pub fn decode_line(line: &str, events: &mut Vec<StreamEvent>) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return false;
    }

    let value = match serde_json::from_str::<Value>(line) {
        Ok(value) => value,
        Err(err) => {
            debug!(%err, line, "skipping stream line that is not JSON");
            return false;
        }
    };

    let Some(object) = value.as_object() else {
        debug!(line, "skipping stream line that is not an object");
        return false;
    };

    if let Some(error) = object.get("error").filter(|value| !value.is_null()) {
        events.push(StreamEvent::Error(error_message(error)));
        return true;
    }

    if let Some(text) = object.get("response").and_then(Value::as_str) {
        events.push(StreamEvent::TextDelta(text.to_owned()));
    }

    if let Some(context) = object.get("context").filter(|value| !value.is_null()) {
        match parse_context(context) {
            Ok(context) => events.push(StreamEvent::ContextFinal(context)),
            Err(err) => warn!(%err, "discarding context update"),
        }
    }

    false
}

/// Parse the `context` array. Integers are taken as is; numeric strings are
/// accepted after trimming and blank strings are skipped.
pub fn parse_context(value: &Value) -> std::result::Result<ConversationContext, DecodeError> {
    let Some(items) = value.as_array() else {
        return Err(DecodeError::MalformedContext(value.to_string()));
    };

    let mut tokens = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Number(number) => {
                let token = number
                    .as_i64()
                    .ok_or_else(|| DecodeError::MalformedContext(number.to_string()))?;
                tokens.push(token);
            }
            Value::String(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let token = trimmed
                    .parse::<i64>()
                    .map_err(|_| DecodeError::MalformedContext(raw.clone()))?;
                tokens.push(token);
            }
            other => return Err(DecodeError::MalformedContext(other.to_string())),
        }
    }

    Ok(ConversationContext::from(tokens))
}

fn error_message(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        Value::Object(fields) => fields
            .get("message")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

struct DecodeState<S> {
    body: S,
    decoder: StreamDecoder,
    pending: VecDeque<StreamEvent>,
    exhausted: bool,
}

/// Lazily decode a response body into events. Each event is yielded as soon as
/// the line carrying it has arrived; the body is never buffered as a whole.
/// The stream ends after the body ends or right after an `Error` event.
pub fn decode_stream<S>(body: S) -> impl Stream<Item = Result<StreamEvent>>
where
    S: Stream<Item = Result<Vec<u8>>> + Unpin,
{
    let state = DecodeState {
        body,
        decoder: StreamDecoder::new(),
        pending: VecDeque::new(),
        exhausted: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((Ok(event), state));
            }
            if state.exhausted || state.decoder.is_halted() {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.feed(&chunk);
                    state.pending.extend(events);
                }
                Some(Err(err)) => {
                    state.exhausted = true;
                    return Some((Err(err), state));
                }
                None => {
                    state.exhausted = true;
                    let events = state.decoder.finish();
                    state.pending.extend(events);
                }
            }
        }
    })
}

/// Scan a complete body for an error report, ignoring everything else. Used
/// on non-success replies, where the body is usually a single `{"error": ..}`.
pub fn find_error(body: &str) -> Option<String> {
    let mut decoder = StreamDecoder::new();
    let mut events = decoder.feed(body.as_bytes());
    events.extend(decoder.finish());
    events.into_iter().find_map(|event| match event {
        StreamEvent::Error(message) => Some(message),
        _ => None,
    })
}
