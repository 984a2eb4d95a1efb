//! `HostedProviderA/B/C` — thin REST clients over bearer-authenticated
//! hosted vendors, sharing the same OpenAI wire protocol as
//! [`super::local::LocalInferenceProvider`] (spec §4.1). Differ only in
//! default base URL, and whether they advertise a vision-capable model.

use async_trait::async_trait;
use std::time::Duration;

use super::{ChunkStream, Provider, WireTransport};
use crate::config::ProviderKind;
use crate::error::{Error, Result};
use crate::types::{Message, ToolSchema};

#[derive(Debug)]
pub struct HostedProvider {
    kind: ProviderKind,
    transport: WireTransport,
}

impl HostedProvider {
    pub fn new(kind: ProviderKind, base_url: impl Into<String>, api_key: Option<&str>) -> Result<Self> {
        if !matches!(kind, ProviderKind::HostedA | ProviderKind::HostedB | ProviderKind::HostedC) {
            return Err(Error::config("HostedProvider requires a hosted ProviderKind"));
        }
        let api_key = api_key
            .map(str::to_string)
            .ok_or_else(|| Error::config(format!("{} requires an API key", kind.auth_header().unwrap_or("auth"))))?;
        let http = super::build_http_client(Duration::from_secs(120))?;
        Ok(HostedProvider {
            kind,
            transport: WireTransport {
                http,
                base_url: base_url.into(),
                auth_header: kind.auth_header(),
                api_key: Some(api_key),
            },
        })
    }
}

#[async_trait]
impl Provider for HostedProvider {
    fn name(&self) -> &str {
        match self.kind {
            ProviderKind::HostedA => "hosted-a",
            ProviderKind::HostedB => "hosted-b",
            ProviderKind::HostedC => "hosted-c",
            ProviderKind::LocalInference => unreachable!("validated in new()"),
        }
    }

    fn has_vision_model(&self) -> bool {
        self.kind.has_vision_model()
    }

    async fn complete(
        &self,
        messages: &[Message],
        model: Option<&str>,
        temperature: Option<f32>,
    ) -> Result<String> {
        self.transport
            .complete(model.unwrap_or("hosted-default"), messages, temperature)
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
                model.unwrap_or("hosted-default"),
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
