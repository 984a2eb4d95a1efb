//! Provider Interface & Factory (spec §4.1).
//!
//! A fixed capability set (`complete`, `stream`, `health_check`) over a
//! finite variant list, selected by configuration name — the "dynamic
//! dispatch → polymorphic set + factory" design note (spec §9). The
//! teacher SDK only ever spoke to one local OpenAI-compatible server; this
//! generalizes its request-building/HTTP/SSE code (`src/client.rs`'s
//! `query()`, `src/utils.rs`'s SSE parsing) into a trait implemented by
//! four variants that all share the wire codec in [`wire`].

pub mod hosted;
pub mod local;
pub mod salvage;
pub mod streaming;
pub mod wire;

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::Stream;

use crate::config::{OrchestratorConfig, ProviderKind};
use crate::error::{Error, Result};
use crate::types::{Message, MessageRole, StreamChunk, ToolSchema};

pub use hosted::HostedProvider;
pub use local::LocalInferenceProvider;

/// A lazy sequence of [`StreamChunk`]s. Cancellation is tied to dropping
/// the stream, which drops the underlying HTTP response body and closes
/// the connection (spec §5).
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

/// The capability set every provider variant implements.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable name, used in `Message.metrics.provider` and logs.
    fn name(&self) -> &str;

    /// Whether this variant serves a vision-capable model (spec §4.5
    /// media-attachment bypass).
    fn has_vision_model(&self) -> bool;

    /// Non-streaming completion, used by the intent classifier and the
    /// warm-memory summarizer.
    async fn complete(
        &self,
        messages: &[Message],
        model: Option<&str>,
        temperature: Option<f32>,
    ) -> Result<String>;

    /// Streaming completion with optional tool schemas attached.
    async fn stream(
        &self,
        messages: &[Message],
        model: Option<&str>,
        temperature: Option<f32>,
        tool_schemas: &[ToolSchema],
    ) -> Result<ChunkStream>;

    /// Cheap liveness probe.
    async fn health_check(&self) -> bool;
}

/// Converts orchestrator `Message`s into OpenAI wire messages, dropping
/// content from sanitized assistant tool-call messages per spec §4.6
/// (content already stripped by `Message::strip_tool_call_content`).
pub(crate) fn to_wire_messages(messages: &[Message]) -> Vec<wire::OpenAiMessage> {
    messages
        .iter()
        .map(|m| match m.role {
            MessageRole::System => wire::OpenAiMessage::system(&m.content),
            MessageRole::User => wire::OpenAiMessage::user(&m.content),
            MessageRole::Assistant => {
                let tool_calls = m.tool_calls.as_ref().map(|calls| {
                    calls
                        .iter()
                        .map(|c| wire::OpenAiToolCall {
                            id: c.id.clone(),
                            call_type: "function".to_string(),
                            function: wire::OpenAiFunction {
                                name: c.name.clone(),
                                arguments: c.arguments.to_string(),
                            },
                        })
                        .collect()
                });
                wire::OpenAiMessage::assistant(&m.content, tool_calls)
            }
            MessageRole::Tool => {
                wire::OpenAiMessage::tool(m.tool_call_id.clone().unwrap_or_default(), &m.content)
            }
        })
        .collect()
}

pub(crate) fn tool_schemas_to_wire(schemas: &[ToolSchema]) -> Option<Vec<serde_json::Value>> {
    if schemas.is_empty() {
        None
    } else {
        Some(schemas.iter().map(ToolSchema::to_wire_format).collect())
    }
}

pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(Error::Http)
}

/// Shared request-building/HTTP/SSE plumbing used by both
/// [`local::LocalInferenceProvider`] and [`hosted::HostedProvider`],
/// generalized from the teacher's `client.rs::query()`.
#[derive(Debug)]
pub(crate) struct WireTransport {
    pub http: reqwest::Client,
    pub base_url: String,
    pub auth_header: Option<&'static str>,
    pub api_key: Option<String>,
}

impl WireTransport {
    fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (self.auth_header, &self.api_key) {
            (Some(header), Some(key)) => builder.header(header, format!("Bearer {key}")),
            _ => builder,
        }
    }

    pub async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        temperature: Option<f32>,
    ) -> Result<String> {
        let request = wire::OpenAiRequest {
            model: model.to_string(),
            messages: to_wire_messages(messages),
            stream: false,
            max_tokens: None,
            temperature,
            tools: None,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .apply_auth(self.http.post(&url))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(Error::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider_unavailable(format!(
                "{status}: {body}"
            )));
        }

        let completion: wire::OpenAiCompletion = response.json().await.map_err(Error::Http)?;
        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        Ok(text)
    }

    pub async fn stream(
        &self,
        model: &str,
        messages: &[Message],
        temperature: Option<f32>,
        tool_schemas: &[ToolSchema],
    ) -> Result<ChunkStream> {
        use futures::stream::StreamExt;

        let request = wire::OpenAiRequest {
            model: model.to_string(),
            messages: to_wire_messages(messages),
            stream: true,
            max_tokens: None,
            temperature,
            tools: tool_schemas_to_wire(tool_schemas),
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .apply_auth(self.http.post(&url))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(Error::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider_unavailable(format!(
                "{status}: {body}"
            )));
        }

        let sse_stream = streaming::parse_sse_stream(response);
        let mut aggregator = streaming::ChunkAggregator::new();

        let flattened = sse_stream
            .scan((), move |(), chunk_result| {
                let outcome = match chunk_result {
                    Ok(chunk) => aggregator.process_chunk(chunk),
                    Err(e) => Err(e),
                };
                futures::future::ready(Some(outcome))
            })
            .flat_map(|outcome| {
                let mut frames = Vec::new();
                match outcome {
                    Ok((immediate, finished)) => {
                        frames.extend(immediate.into_iter().map(Ok));
                        if finished.is_some() {
                            frames.push(Ok(StreamChunk {
                                done: Some(true),
                                ..Default::default()
                            }));
                        }
                    }
                    Err(e) => frames.push(Err(e)),
                }
                futures::stream::iter(frames)
            });

        Ok(Box::pin(flattened))
    }

    pub async fn health_check(&self) -> bool {
        let url = format!("{}/models", self.base_url);
        match self.apply_auth(self.http.get(&url)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

/// Selects and constructs the configured [`Provider`] (spec §4.1
/// "selected by configuration name").
pub struct ProviderFactory;

impl ProviderFactory {
    /// Build the provider named by `config.default_provider`.
    pub fn build(
        config: &OrchestratorConfig,
        base_url: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<Arc<dyn Provider>> {
        Self::build_kind(config.default_provider, base_url, api_key)
    }

    /// Build a specific provider kind, independent of the config's default
    /// (used when a fallback provider is configured, spec §7).
    pub fn build_kind(
        kind: ProviderKind,
        base_url: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<Arc<dyn Provider>> {
        let base_url = base_url.unwrap_or(kind.default_url()).to_string();
        match kind {
            ProviderKind::LocalInference => {
                Ok(Arc::new(LocalInferenceProvider::new(base_url, api_key)?))
            }
            ProviderKind::HostedA | ProviderKind::HostedB | ProviderKind::HostedC => Ok(Arc::new(
                HostedProvider::new(kind, base_url, api_key)?,
            )),
        }
    }
}
