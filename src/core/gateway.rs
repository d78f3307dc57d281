//! Translation of a transcript into a generation request, and the call that
//! starts a streamed reply.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use futures_util::StreamExt;
use tokio::time::Instant;
use tracing::debug;

use crate::api::{Content, ContentPart, GenerateContentRequest, GenerationConfig, InlineData};
use crate::core::chat_stream::{format_api_error, StreamHandle};
use crate::core::message::{Part, Turn};
use crate::core::transcript::Transcript;
use crate::utils::url::stream_generate_url;

/// A failed or interrupted generation. Always recoverable at the session
/// level: the transcript stays usable for the next turn.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// The request was rejected before a stream was established.
    Request { reason: String },
    /// The network failed, before or during the stream.
    Transport { reason: String },
    /// The API reported an error inside the stream.
    Api { reason: String },
    /// The reply did not finish before the deadline.
    Timeout,
    /// Generation settings were out of range.
    InvalidSettings { reason: String },
}

impl GatewayError {
    pub fn reason(&self) -> String {
        match self {
            GatewayError::Request { reason }
            | GatewayError::Transport { reason }
            | GatewayError::Api { reason }
            | GatewayError::InvalidSettings { reason } => reason.clone(),
            GatewayError::Timeout => "timeout".to_string(),
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason())
    }
}

impl Error for GatewayError {}

/// Sampling parameters. Construction validates the ranges, so a value of
/// this type is always acceptable to the API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    temperature: f32,
    max_output_tokens: u32,
}

impl GenerationSettings {
    pub fn new(temperature: f32, max_output_tokens: u32) -> Result<Self, GatewayError> {
        if !(0.0..=1.0).contains(&temperature) {
            return Err(GatewayError::InvalidSettings {
                reason: format!("temperature must be between 0 and 1, got {temperature}"),
            });
        }
        if max_output_tokens == 0 {
            return Err(GatewayError::InvalidSettings {
                reason: "max_output_tokens must be positive".to_string(),
            });
        }
        Ok(Self {
            temperature,
            max_output_tokens,
        })
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }
}

/// The transcript in the API's content shape, seed turns included.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub contents: Vec<Content>,
}

impl ModelRequest {
    pub fn to_wire(&self, settings: &GenerationSettings) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: self.contents.clone(),
            generation_config: GenerationConfig {
                temperature: settings.temperature(),
                max_output_tokens: settings.max_output_tokens(),
            },
        }
    }
}

fn content_part(part: &Part) -> ContentPart {
    match part {
        Part::Text(text) => ContentPart::Text { text: text.clone() },
        Part::Image(image) => ContentPart::InlineData {
            inline_data: InlineData {
                mime_type: image.format.mime_type().to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(&image.source),
            },
        },
    }
}

fn content(turn: &Turn) -> Content {
    Content {
        role: turn.role.to_api_role().to_string(),
        parts: turn.parts.iter().map(content_part).collect(),
    }
}

pub fn build_request(transcript: &Transcript) -> ModelRequest {
    ModelRequest {
        contents: transcript.turns().iter().map(content).collect(),
    }
}

/// Something that can turn a request into a streamed reply.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn generate(
        &self,
        request: &ModelRequest,
        settings: &GenerationSettings,
    ) -> Result<StreamHandle, GatewayError>;
}

/// Gemini REST backend.
pub struct GeminiGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Option<Duration>,
}

impl GeminiGateway {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            timeout: None,
        }
    }

    /// Bound the whole exchange, from sending the request to the last
    /// fragment.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

async fn within_deadline<F: std::future::Future>(
    deadline: Option<Instant>,
    future: F,
) -> Result<F::Output, GatewayError> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, future)
            .await
            .map_err(|_| GatewayError::Timeout),
        None => Ok(future.await),
    }
}

#[async_trait]
impl ModelGateway for GeminiGateway {
    async fn generate(
        &self,
        request: &ModelRequest,
        settings: &GenerationSettings,
    ) -> Result<StreamHandle, GatewayError> {
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        let url = stream_generate_url(&self.base_url, &self.model);
        debug!(
            model = %self.model,
            turns = request.contents.len(),
            "sending streamGenerateContent request"
        );

        let send = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&request.to_wire(settings))
            .send();

        let response = within_deadline(deadline, send)
            .await?
            .map_err(|err| GatewayError::Transport {
                reason: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = within_deadline(deadline, response.text())
                .await?
                .unwrap_or_else(|_| "<no body>".to_string());
            debug!(%status, "generation request rejected");
            return Err(GatewayError::Request {
                reason: format!("{} ({status})", format_api_error(&error_text)),
            });
        }

        let bytes = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|err| err.to_string())
        });

        Ok(StreamHandle::from_sse(Box::pin(bytes)).with_deadline(deadline))
    }
}
