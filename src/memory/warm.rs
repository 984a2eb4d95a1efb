//! Warm memory tier — a rolling natural-language summary of everything
//! that has aged out of the hot window (spec §4.4, triggered once the
//! delta since `last_summarized_seq` reaches `SUMMARY_THRESHOLD`).
//!
//! Grounded on the teacher's `context::estimate_tokens`/`truncate_messages`
//! pair for the "what counts as delta" accounting, and on `client.rs`'s
//! `query()` for how to drive a single non-streaming completion — here
//! via `Provider::complete` instead of a direct HTTP call.

use std::sync::Arc;

use crate::error::Result;
use crate::providers::Provider;
use crate::types::{Conversation, Message};

/// Default per spec §6 `SUMMARY_THRESHOLD`.
pub const DEFAULT_SUMMARY_THRESHOLD: u64 = 20;

pub struct WarmSummarizer {
    pub threshold: u64,
    provider: Arc<dyn Provider>,
}

impl WarmSummarizer {
    pub fn new(provider: Arc<dyn Provider>, threshold: u64) -> Self {
        WarmSummarizer { threshold, provider }
    }

    /// True once enough new messages have accumulated past the
    /// conversation's last summarized point to justify another pass.
    pub fn needs_summary(&self, conversation: &Conversation, latest_seq: u64) -> bool {
        latest_seq.saturating_sub(conversation.last_summarized_seq) >= self.threshold
    }

    /// Fold `delta` (messages strictly after `last_summarized_seq`, already
    /// excluded from the hot window) into `existing_summary`, returning the
    /// new summary text. Never touches persistence itself — callers decide
    /// whether to await this inline or drive it from a background task.
    pub async fn summarize(
        &self,
        existing_summary: Option<&str>,
        delta: &[Message],
    ) -> Result<String> {
        if delta.is_empty() {
            return Ok(existing_summary.unwrap_or_default().to_string());
        }

        let mut transcript = String::new();
        for message in delta {
            transcript.push_str(&format!("{:?}: {}\n", message.role, message.content));
        }

        let instruction = match existing_summary {
            Some(prior) if !prior.is_empty() => format!(
                "Existing summary of the conversation so far:\n{prior}\n\n\
                 New messages to fold in:\n{transcript}\n\n\
                 Write an updated summary that preserves everything still \
                 relevant from the existing summary plus the new messages. \
                 Be concise. Output only the summary text.",
            ),
            _ => format!(
                "Summarize the following conversation concisely, preserving \
                 facts, decisions, and open threads:\n\n{transcript}\n\n\
                 Output only the summary text.",
            ),
        };

        let prompt_message = Message::user(delta[0].conversation_id, instruction);
        self.provider.complete(&[prompt_message], None, Some(0.0)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MessageRole, StreamChunk, ToolSchema};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct StubProvider {
        reply: String,
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl Provider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        fn has_vision_model(&self) -> bool {
            false
        }

        async fn complete(
            &self,
            _messages: &[Message],
            _model: Option<&str>,
            _temperature: Option<f32>,
        ) -> Result<String> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.reply.clone())
        }

        async fn stream(
            &self,
            _messages: &[Message],
            _model: Option<&str>,
            _temperature: Option<f32>,
            _tool_schemas: &[ToolSchema],
        ) -> Result<crate::providers::ChunkStream> {
            unimplemented!("not exercised by warm-memory tests")
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    fn msg(conversation_id: Uuid, seq: u64, role: MessageRole, content: &str) -> Message {
        let mut m = match role {
            MessageRole::User => Message::user(conversation_id, content),
            _ => Message::assistant(conversation_id, content),
        };
        m.sequence_number = seq;
        m
    }

    #[test]
    fn test_needs_summary_respects_threshold() {
        let provider = Arc::new(StubProvider {
            reply: String::new(),
            calls: Mutex::new(0),
        });
        let summarizer = WarmSummarizer::new(provider, 20);
        let mut convo = Conversation::new("t");
        convo.last_summarized_seq = 0;
        assert!(!summarizer.needs_summary(&convo, 19));
        assert!(summarizer.needs_summary(&convo, 20));
    }

    #[tokio::test]
    async fn test_summarize_empty_delta_returns_existing_summary_unchanged() {
        let provider = Arc::new(StubProvider {
            reply: "should not be used".to_string(),
            calls: Mutex::new(0),
        });
        let summarizer = WarmSummarizer::new(provider, 20);
        let result = summarizer.summarize(Some("prior summary"), &[]).await.unwrap();
        assert_eq!(result, "prior summary");
    }

    #[tokio::test]
    async fn test_summarize_calls_provider_with_delta_transcript() {
        let provider = Arc::new(StubProvider {
            reply: "updated summary".to_string(),
            calls: Mutex::new(0),
        });
        let summarizer = WarmSummarizer::new(provider.clone(), 20);
        let cid = Uuid::new_v4();
        let delta = vec![
            msg(cid, 0, MessageRole::User, "hello"),
            msg(cid, 1, MessageRole::Assistant, "hi there"),
        ];
        let result = summarizer.summarize(None, &delta).await.unwrap();
        assert_eq!(result, "updated summary");
        assert_eq!(*provider.calls.lock().unwrap(), 1);
    }
}
