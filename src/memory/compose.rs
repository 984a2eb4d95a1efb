//! Joins the three memory tiers into the single ordered message list the
//! reasoning loop hands to a provider (spec §4.4): `[persona] + [warm
//! summary, if any] + [cold memories, each tagged with timestamp] +
//! [hot window]`. This is the only place the tiers meet.

use crate::types::{ConversationId, Message};

use super::cold::{ColdMemory, EmbeddingProvider};
use super::hot::HotWindow;

pub struct MemoryComposer {
    pub persona: String,
    pub hot: HotWindow,
    pub cold: ColdMemory,
}

impl MemoryComposer {
    pub fn new(persona: impl Into<String>, hot_window_size: usize, cold_top_k: usize) -> Self {
        MemoryComposer {
            persona: persona.into(),
            hot: HotWindow::new(hot_window_size),
            cold: ColdMemory::new(cold_top_k),
        }
    }

    /// `history` is the full conversation so far; `archive` is the pool of
    /// past messages eligible for cold retrieval (typically the same
    /// conversation's earlier turns, possibly spanning prior sessions).
    /// `warm_summary` comes from `Conversation::summary`.
    pub async fn compose(
        &self,
        conversation_id: ConversationId,
        history: &[Message],
        archive: &[Message],
        warm_summary: Option<&str>,
        embedder: &dyn EmbeddingProvider,
        query_text: &str,
    ) -> crate::error::Result<Vec<Message>> {
        let hot = self.hot.select(history);
        let hot_ids: std::collections::HashSet<_> = hot.iter().map(|m| m.id).collect();

        let eligible: Vec<Message> = archive
            .iter()
            .filter(|m| !hot_ids.contains(&m.id))
            .cloned()
            .collect();
        let cold = self.cold.retrieve(embedder, query_text, &eligible).await?;

        let mut composed = Vec::with_capacity(1 + 1 + cold.len() + hot.len());
        composed.push(Message::system(conversation_id, &self.persona));

        if let Some(summary) = warm_summary {
            if !summary.is_empty() {
                composed.push(Message::system(
                    conversation_id,
                    format!("Conversation summary so far: {summary}"),
                ));
            }
        }

        for memory in cold {
            composed.push(Message::system(
                conversation_id,
                format!("[recalled {}] {}", memory.created_at.to_rfc3339(), memory.content),
            ));
        }

        composed.extend(hot.into_iter().cloned());
        Ok(composed)
    }
}
