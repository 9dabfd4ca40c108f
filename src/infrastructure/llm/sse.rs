//! Incremental decoding of SSE (`data: {...}`) and NDJSON chat streams

use std::collections::VecDeque;
use std::pin::Pin;

use futures::{stream, Stream, StreamExt};
use serde::Deserialize;

use super::http_client::ByteStream;
use crate::domain::{DomainError, EventStream, StreamChunk, TransportEvent, Usage};

const DONE_SENTINEL: &str = "[DONE]";

/// Framing of the response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// Only `data:` lines carry payloads
    Sse,
    /// Every line is a JSON payload; a `data:` prefix is tolerated
    Ndjson,
}

/// Splits a byte stream into payload lines.
///
/// Bytes are buffered until a newline arrives, so multibyte characters split
/// across reads are decoded intact.
#[derive(Debug)]
pub struct LineDecoder {
    format: FrameFormat,
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new(format: FrameFormat) -> Self {
        Self {
            format,
            buffer: Vec::new(),
        }
    }

    /// Feed bytes, returning the payloads of every line they complete
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(payload) = self.payload(&line[..line.len() - 1]) {
                payloads.push(payload);
            }
        }

        payloads
    }

    /// Flush a trailing line that never got its newline
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        self.payload(&rest)
    }

    fn payload(&self, raw: &[u8]) -> Option<String> {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();

        if line.is_empty() {
            return None;
        }

        if let Some(data) = line.strip_prefix("data:") {
            return Some(data.strip_prefix(' ').unwrap_or(data).to_string());
        }

        match self.format {
            FrameFormat::Ndjson => Some(line.to_string()),
            FrameFormat::Sse => None,
        }
    }
}

/// Translate one payload into transport events.
///
/// Unparseable payloads are logged and yield nothing. An `error` object sent
/// in-band by the server is returned as a provider error.
pub fn decode_payload(provider: &str, payload: &str) -> Result<Vec<TransportEvent>, DomainError> {
    if payload.trim() == DONE_SENTINEL {
        return Ok(vec![TransportEvent::Done]);
    }

    let frame: StreamFrame = match serde_json::from_str(payload) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(provider = %provider, error = %e, payload = %payload, "Skipping malformed stream frame");
            return Ok(vec![]);
        }
    };

    if let Some(error) = frame.error {
        return Err(DomainError::provider(provider, error_message(&error)));
    }

    let mut events = Vec::new();

    if let Some(delta) = frame
        .choices
        .and_then(|choices| choices.into_iter().next())
        .and_then(|choice| choice.delta)
    {
        push_chunk(&mut events, delta.reasoning_content.or(delta.reasoning), StreamChunk::Reasoning);
        push_chunk(&mut events, delta.content, StreamChunk::Content);
    }

    if let Some(message) = frame.message {
        push_chunk(&mut events, message.thinking, StreamChunk::Reasoning);
        push_chunk(&mut events, message.content, StreamChunk::Content);
    }

    if let Some(usage) = frame.usage {
        events.push(TransportEvent::Usage(Usage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }));
    }

    if frame.done {
        if let Some(prompt_eval_count) = frame.prompt_eval_count {
            events.push(TransportEvent::Usage(Usage {
                prompt_tokens: Some(prompt_eval_count),
                completion_tokens: frame.eval_count,
                total_tokens: Some(
                    prompt_eval_count.saturating_add(frame.eval_count.unwrap_or(0)),
                ),
            }));
        }
        events.push(TransportEvent::Done);
    }

    Ok(events)
}

fn push_chunk(
    events: &mut Vec<TransportEvent>,
    text: Option<String>,
    make: fn(String) -> StreamChunk,
) {
    if let Some(text) = text.filter(|t| !t.is_empty()) {
        events.push(TransportEvent::Chunk(make(text)));
    }
}

fn error_message(error: &serde_json::Value) -> String {
    match error {
        serde_json::Value::String(message) => message.clone(),
        other => other
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    }
}

/// Stream of items decoded from a response body
pub type DecodedStream<T> = Pin<Box<dyn Stream<Item = Result<T, DomainError>> + Send>>;

/// Decode a response body into transport events.
///
/// Reading stops after the first terminal signal; remaining bytes are dropped.
pub fn decode_stream(provider: &'static str, bytes: ByteStream, format: FrameFormat) -> EventStream {
    decode_lines(
        bytes,
        format,
        move |payload| decode_payload(provider, payload),
        |event| *event == TransportEvent::Done,
    )
}

/// Split a body into payload lines and run `decode` on each one.
///
/// A read error or a decode error ends the stream after being yielded, as
/// does any item for which `is_terminal` holds.
pub fn decode_lines<T, F>(
    bytes: ByteStream,
    format: FrameFormat,
    decode: F,
    is_terminal: fn(&T) -> bool,
) -> DecodedStream<T>
where
    T: Send + 'static,
    F: Fn(&str) -> Result<Vec<T>, DomainError> + Send + 'static,
{
    let state = DecodeState {
        bytes,
        decoder: LineDecoder::new(format),
        decode,
        is_terminal,
        pending: VecDeque::new(),
        exhausted: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }

            if state.exhausted {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let payloads = state.decoder.push(&chunk);
                    state.enqueue(payloads);
                }
                Some(Err(e)) => {
                    state.exhausted = true;
                    state.pending.push_back(Err(e));
                }
                None => {
                    state.exhausted = true;
                    let trailing = state.decoder.finish();
                    state.enqueue(trailing);
                }
            }
        }
    })
    .boxed()
}

struct DecodeState<T, F> {
    bytes: ByteStream,
    decoder: LineDecoder,
    decode: F,
    is_terminal: fn(&T) -> bool,
    pending: VecDeque<Result<T, DomainError>>,
    exhausted: bool,
}

impl<T, F> DecodeState<T, F>
where
    F: Fn(&str) -> Result<Vec<T>, DomainError>,
{
    fn enqueue(&mut self, payloads: impl IntoIterator<Item = String>) {
        for payload in payloads {
            match (self.decode)(&payload) {
                Ok(items) => {
                    for item in items {
                        let terminal = (self.is_terminal)(&item);
                        self.pending.push_back(Ok(item));
                        if terminal {
                            self.exhausted = true;
                            return;
                        }
                    }
                }
                Err(e) => {
                    self.exhausted = true;
                    self.pending.push_back(Err(e));
                    return;
                }
            }
        }
    }
}

// Union of the OpenAI chunk and Ollama frame shapes

#[derive(Debug, Deserialize)]
struct StreamFrame {
    choices: Option<Vec<FrameChoice>>,
    message: Option<FrameMessage>,
    usage: Option<FrameUsage>,
    #[serde(default)]
    done: bool,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FrameChoice {
    delta: Option<FrameDelta>,
}

#[derive(Debug, Deserialize)]
struct FrameDelta {
    content: Option<String>,
    reasoning_content: Option<String>,
    reasoning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FrameMessage {
    content: Option<String>,
    thinking: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FrameUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}
