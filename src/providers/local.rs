//! `LocalInferenceProvider` — a long-running local companion process
//! (LM Studio/Ollama/llama.cpp-style), speaking the shared OpenAI wire
//! protocol plus the `images[]` multimodal side-channel (spec §4.1).
//! Adapted directly from the teacher's single-provider `client.rs::query`.

use async_trait::async_trait;
use std::time::Duration;

use super::{ChunkStream, Provider, WireTransport};
use crate::error::Result;
use crate::types::{Message, ToolSchema};

pub struct LocalInferenceProvider {
    transport: WireTransport,
}

impl LocalInferenceProvider {
    pub fn new(base_url: impl Into<String>, _api_key: Option<&str>) -> Result<Self> {
        let http = super::build_http_client(Duration::from_secs(120))?;
        Ok(LocalInferenceProvider {
            transport: WireTransport {
                http,
                base_url: base_url.into(),
                auth_header: None,
                api_key: None,
            },
        })
    }

    /// Stream a turn that attaches image URLs/data-URIs as a multimodal
    /// side-channel (spec §4.1), bypassing the plain-text message path.
    pub async fn stream_with_images(
        &self,
        model: &str,
        text: &str,
        image_urls: &[String],
        tool_schemas: &[ToolSchema],
    ) -> Result<ChunkStream> {
        use crate::providers::wire::OpenAiMessage;

        let wire_message = OpenAiMessage::user_with_images(text, image_urls);
        let request = crate::providers::wire::OpenAiRequest {
            model: model.to_string(),
            messages: vec![wire_message],
            stream: true,
            max_tokens: None,
            temperature: None,
            tools: super::tool_schemas_to_wire(tool_schemas),
        };

        use futures::stream::StreamExt;
        let url = format!("{}/chat/completions", self.transport.base_url);
        let response = self
            .transport
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(crate::error::Error::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(crate::error::Error::provider_unavailable(format!(
                "{status}: {body}"
            )));
        }

        let sse_stream = crate::providers::streaming::parse_sse_stream(response);
        let mut aggregator = crate::providers::streaming::ChunkAggregator::new();

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
                            frames.push(Ok(crate::types::StreamChunk {
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
}

#[async_trait]
impl Provider for LocalInferenceProvider {
    fn name(&self) -> &str {
        "local-inference"
    }

    fn has_vision_model(&self) -> bool {
        true
    }

    async fn complete(
        &self,
        messages: &[Message],
        model: Option<&str>,
        temperature: Option<f32>,
    ) -> Result<String> {
        self.transport
            .complete(model.unwrap_or("local-default"), messages, temperature)
            .await
    }

    async fn stream(
        &self,
        messages: &[Message],
        model: Option<&str>,
        temperature: Option<f32>,
        tool_schemas: &[ToolSchema],
    ) -> Result<ChunkStream> {
        self.transport
            .stream(
                model.unwrap_or("local-default"),
                messages,
                temperature,
                tool_schemas,
            )
            .await
    }

    async fn health_check(&self) -> bool {
        self.transport.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_any_base_url_shape() {
        let provider = LocalInferenceProvider::new("http://localhost:1234/v1", None).unwrap();
        assert_eq!(provider.name(), "local-inference");
    }
}
