use std::collections::VecDeque;
use std::pin::Pin;

use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use memchr::memchr;
use tokio::time::Instant;

use crate::api::GenerateContentResponse;
use crate::core::gateway::GatewayError;

/// Raw body chunks as delivered by the transport.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, String>> + Send>>;

/// Decoded text fragments, in arrival order.
pub type FragmentStream = BoxStream<'static, Result<String, GatewayError>>;

#[derive(Debug, Clone, PartialEq)]
enum SseEvent {
    Fragment(String),
    Error(GatewayError),
    Done,
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

fn handle_data_payload(payload: &str) -> Option<SseEvent> {
    if payload == "[DONE]" {
        return Some(SseEvent::Done);
    }
    if payload.trim().is_empty() {
        return None;
    }

    let value = match serde_json::from_str::<serde_json::Value>(payload) {
        Ok(value) => value,
        Err(_) => {
            return Some(SseEvent::Error(GatewayError::Api {
                reason: format_api_error(payload),
            }))
        }
    };

    if value.get("error").is_some() {
        return Some(SseEvent::Error(GatewayError::Api {
            reason: format_api_error(payload),
        }));
    }

    match serde_json::from_value::<GenerateContentResponse>(value) {
        Ok(response) => {
            if let Some(reason) = response.block_reason() {
                return Some(SseEvent::Error(GatewayError::Api {
                    reason: format!("Prompt blocked: {reason}"),
                }));
            }
            if let Some(reason) = response.finish_reason().filter(|reason| *reason != "STOP") {
                tracing::warn!(reason, "reply ended early");
            }
            let text = response.text();
            if text.is_empty() {
                None
            } else {
                Some(SseEvent::Fragment(text))
            }
        }
        Err(_) => Some(SseEvent::Error(GatewayError::Api {
            reason: format_api_error(payload),
        })),
    }
}

fn process_sse_line(line: &str) -> Option<SseEvent> {
    extract_data_payload(line).and_then(handle_data_payload)
}

/// Splits a byte stream into SSE lines. Partial lines are held until their
/// newline arrives.
#[derive(Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            let line = String::from_utf8_lossy(&self.buffer[..newline_pos]);
            events.extend(process_sse_line(line.trim()));
            self.buffer.drain(..=newline_pos);
        }

        events
    }

    fn finish(&mut self) -> Vec<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        process_sse_line(String::from_utf8_lossy(&rest).trim())
            .into_iter()
            .collect()
    }
}

struct SseState {
    bytes: ByteStream,
    decoder: SseDecoder,
    queue: VecDeque<SseEvent>,
    exhausted: bool,
}

pub fn sse_fragments(bytes: ByteStream) -> FragmentStream {
    let state = SseState {
        bytes,
        decoder: SseDecoder::default(),
        queue: VecDeque::new(),
        exhausted: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.queue.pop_front() {
                match event {
                    SseEvent::Fragment(text) => return Some((Ok(text), state)),
                    SseEvent::Error(err) => {
                        state.queue.clear();
                        state.exhausted = true;
                        return Some((Err(err), state));
                    }
                    SseEvent::Done => return None,
                }
            }
            if state.exhausted {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(&chunk);
                    state.queue.extend(events);
                }
                Some(Err(reason)) => {
                    state.exhausted = true;
                    return Some((Err(GatewayError::Transport { reason }), state));
                }
                None => {
                    state.exhausted = true;
                    let events = state.decoder.finish();
                    state.queue.extend(events);
                }
            }
        }
    })
    .boxed()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Streaming,
    Completed,
    Failed,
}

/// A reply that is still arriving.
///
/// Yields text fragments until the reply completes or fails; once either
/// happens every further call returns `None`. A handle cannot be rewound.
pub struct StreamHandle {
    fragments: FragmentStream,
    state: StreamState,
    deadline: Option<Instant>,
}

impl StreamHandle {
    pub fn new(fragments: FragmentStream) -> Self {
        Self {
            fragments,
            state: StreamState::Streaming,
            deadline: None,
        }
    }

    pub fn from_sse(bytes: ByteStream) -> Self {
        Self::new(sse_fragments(bytes))
    }

    pub fn from_fragments(items: Vec<Result<String, GatewayError>>) -> Self {
        Self::new(stream::iter(items).boxed())
    }

    /// Fail the stream with `GatewayError::Timeout` if it is still running at
    /// `deadline`.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub async fn next_fragment(&mut self) -> Option<Result<String, GatewayError>> {
        if self.state != StreamState::Streaming {
            return None;
        }

        let next = match self.deadline {
            Some(deadline) => {
                match tokio::time::timeout_at(deadline, self.fragments.next()).await {
                    Ok(next) => next,
                    Err(_) => Some(Err(GatewayError::Timeout)),
                }
            }
            None => self.fragments.next().await,
        };

        match next {
            Some(Ok(text)) => Some(Ok(text)),
            Some(Err(err)) => {
                self.state = StreamState::Failed;
                Some(Err(err))
            }
            None => {
                self.state = StreamState::Completed;
                None
            }
        }
    }
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.trim().to_string()
    })
}

/// Turn an error body into a one-line summary followed by the raw payload.
///
/// Gemini wraps errors in a JSON array for some status codes, so the first
/// element is inspected when the top level is an array.
pub fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API Error: <empty>".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let inspected = match &json_value {
            serde_json::Value::Array(items) => items.first().unwrap_or(&json_value),
            other => other,
        };
        if let Ok(compact) = serde_json::to_string(&json_value) {
            if let Some(summary) = extract_error_summary(inspected) {
                if !summary.is_empty() {
                    return format!("API Error: {summary}");
                }
            }
            return format!("API Error: {compact}");
        }
    }

    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("API Error: {collapsed}")
}
