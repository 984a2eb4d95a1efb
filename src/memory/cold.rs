//! Cold memory tier — nearest-neighbor recall over a user's past messages
//! by embedding similarity (spec §4.4, default top-K = 5).
//!
//! `LocalEmbeddingProvider` is grounded on `providers::local::LocalInferenceProvider`:
//! same `WireTransport`-over-HTTP shape, pointed at an `/embeddings` endpoint
//! instead of `/chat/completions`. Kept local even when the chat provider is
//! hosted, per spec §4.4's privacy note.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Message;

/// Default per spec §4.4 "top-K (default 5)".
pub const DEFAULT_TOP_K: usize = 5;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

pub struct LocalEmbeddingProvider {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl LocalEmbeddingProvider {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(Error::Http)?;
        Ok(LocalEmbeddingProvider {
            http,
            base_url: base_url.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
        };
        let url = format!("{}/embeddings", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(Error::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider_unavailable(format!("{status}: {body}")));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(Error::Http)?;
        parsed
            .data
            .pop()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::provider_bad_output("embeddings response had no data"))
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

pub struct ColdMemory {
    top_k: usize,
}

impl ColdMemory {
    pub fn new(top_k: usize) -> Self {
        ColdMemory { top_k }
    }

    /// Embed `query_text`, then rank `candidates` (already excluding the
    /// hot window — spec §4.4) by cosine similarity, returning the
    /// `top_k` most similar. Candidates without an embedding, or whose
    /// embedding dimensionality disagrees with the query's, are skipped
    /// rather than coerced (spec §3 invariant).
    pub async fn retrieve<'a>(
        &self,
        embedder: &dyn EmbeddingProvider,
        query_text: &str,
        candidates: &'a [Message],
    ) -> Result<Vec<&'a Message>> {
        let query_embedding = embedder.embed(query_text).await?;

        let mut scored: Vec<(f32, &Message)> = candidates
            .iter()
            .filter_map(|m| {
                let embedding = m.embedding.as_ref()?;
                if embedding.len() != query_embedding.len() {
                    return None;
                }
                Some((cosine_similarity(&query_embedding, embedding), m))
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored.into_iter().take(self.top_k).map(|(_, m)| m).collect())
    }
}
