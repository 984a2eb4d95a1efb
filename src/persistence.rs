//! Persistence boundary (supplement — spec §6 "the core only consumes
//! repository interfaces", never a concrete store). Grounded on the
//! teacher's own separation between `Client` (in-memory `Vec<Message>`
//! history) and the wire layer: the orchestrator keeps that separation
//! explicit as traits so the reasoning loop, warm-memory summarizer, and
//! cold-memory indexer can all depend on persistence without depending on
//! each other or on a specific backend.
//!
//! The in-memory implementations here are what the teacher's `Client`
//! effectively did for history (`Vec<Message>`, linear scan); they exist
//! for tests and the demo binaries, not as the intended production store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::types::{Conversation, ConversationId, Message, MessageId};

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn get(&self, id: ConversationId) -> Result<Conversation>;
    async fn save(&self, conversation: &Conversation) -> Result<()>;
    /// Advance `last_summarized_seq` after a warm-memory summary completes
    /// (spec §4.4), replacing `summary` atomically.
    async fn update_summary(&self, id: ConversationId, summary: String, through_seq: u64) -> Result<()>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist `message`, assigning it the next `sequence_number` for its
    /// conversation (strictly increasing, no gaps — spec §3 invariant) and
    /// a fresh `id`/`created_at`. Returns the assigned message.
    async fn append(&self, message: Message) -> Result<Message>;
    async fn list(&self, conversation_id: ConversationId) -> Result<Vec<Message>>;
    /// Write back a late-arriving embedding (spec §4.4 cold memory).
    async fn set_embedding(&self, message_id: MessageId, embedding: Vec<f32>) -> Result<()>;
}

/// In-memory `ConversationRepository`, keyed by id.
#[derive(Default)]
pub struct InMemoryConversationRepository {
    conversations: RwLock<HashMap<ConversationId, Conversation>>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn get(&self, id: ConversationId) -> Result<Conversation> {
        self.conversations
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::invalid_input(format!("unknown conversation {id}")))
    }

    async fn save(&self, conversation: &Conversation) -> Result<()> {
        self.conversations
            .write()
            .await
            .insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn update_summary(&self, id: ConversationId, summary: String, through_seq: u64) -> Result<()> {
        let mut guard = self.conversations.write().await;
        let conversation = guard
            .get_mut(&id)
            .ok_or_else(|| Error::invalid_input(format!("unknown conversation {id}")))?;
        conversation.summary = Some(summary);
        conversation.last_summarized_seq = through_seq;
        conversation.updated_at = chrono::Utc::now();
        Ok(())
    }
}

/// In-memory `MessageRepository`. Sequence numbers are assigned by a
/// per-conversation counter under the same lock as the append, so
/// concurrent appends to one conversation still serialize (spec §5).
#[derive(Default)]
pub struct InMemoryMessageRepository {
    by_conversation: RwLock<HashMap<ConversationId, Vec<Message>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(&self, mut message: Message) -> Result<Message> {
        let mut guard = self.by_conversation.write().await;
        let entry = guard.entry(message.conversation_id).or_default();
        let next_seq = entry.last().map(|m| m.sequence_number + 1).unwrap_or(0);

        message.id = uuid::Uuid::new_v4();
        message.sequence_number = next_seq;
        message.created_at = chrono::Utc::now();

        entry.push(message.clone());
        Ok(message)
    }

    async fn list(&self, conversation_id: ConversationId) -> Result<Vec<Message>> {
        Ok(self
            .by_conversation
            .read()
            .await
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_embedding(&self, message_id: MessageId, embedding: Vec<f32>) -> Result<()> {
        let mut guard = self.by_conversation.write().await;
        for messages in guard.values_mut() {
            if let Some(message) = messages.iter_mut().find(|m| m.id == message_id) {
                message.embedding = Some(embedding);
                return Ok(());
            }
        }
        Err(Error::invalid_input(format!("unknown message {message_id}")))
    }
}

/// Bundles both repositories behind `Arc` for cheap sharing into the
/// reasoning loop and background tasks (spec §5 "lifecycle-managed
/// services").
#[derive(Clone)]
pub struct PersistenceHandle {
    pub conversations: Arc<dyn ConversationRepository>,
    pub messages: Arc<dyn MessageRepository>,
}

impl PersistenceHandle {
    pub fn in_memory() -> Self {
        PersistenceHandle {
            conversations: Arc::new(InMemoryConversationRepository::new()),
            messages: Arc::new(InMemoryMessageRepository::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_assigns_sequential_sequence_numbers() {
        let repo = InMemoryMessageRepository::new();
        let cid = uuid::Uuid::new_v4();
        let m0 = repo.append(Message::user(cid, "hi")).await.unwrap();
        let m1 = repo.append(Message::user(cid, "again")).await.unwrap();
        assert_eq!(m0.sequence_number, 0);
        assert_eq!(m1.sequence_number, 1);
    }

    #[tokio::test]
    async fn test_list_returns_conversation_messages_in_append_order() {
        let repo = InMemoryMessageRepository::new();
        let cid = uuid::Uuid::new_v4();
        repo.append(Message::user(cid, "first")).await.unwrap();
        repo.append(Message::user(cid, "second")).await.unwrap();
        let messages = repo.list(cid).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "first");
    }

    #[tokio::test]
    async fn test_update_summary_advances_last_summarized_seq() {
        let repo = InMemoryConversationRepository::new();
        let convo = Conversation::new("untitled");
        repo.save(&convo).await.unwrap();
        repo.update_summary(convo.id, "a summary".to_string(), 20)
            .await
            .unwrap();
        let reloaded = repo.get(convo.id).await.unwrap();
        assert_eq!(reloaded.summary.as_deref(), Some("a summary"));
        assert_eq!(reloaded.last_summarized_seq, 20);
    }

    #[tokio::test]
    async fn test_get_unknown_conversation_errors() {
        let repo = InMemoryConversationRepository::new();
        assert!(repo.get(uuid::Uuid::new_v4()).await.is_err());
    }
}
