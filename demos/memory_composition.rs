//! Memory composition demo: builds a hot window, a warm summary, and a
//! handful of cold-recalled messages, then prints the single composed
//! message list a provider would actually see (spec §4.4).

use async_trait::async_trait;
use chat_orchestrator::{EmbeddingProvider, Message, MessageRole, MemoryComposer};
use uuid::Uuid;

struct DemoEmbedder;

#[async_trait]
impl EmbeddingProvider for DemoEmbedder {
    async fn embed(&self, text: &str) -> chat_orchestrator::Result<Vec<f32>> {
        // Toy embedding: presence of a few keywords as a crude feature
        // vector, good enough to demonstrate ranking without a real model.
        let lower = text.to_lowercase();
        Ok(vec![
            lower.contains("deploy") as i32 as f32,
            lower.contains("database") as i32 as f32,
            lower.contains("weather") as i32 as f32,
        ])
    }
}

fn seeded_message(conversation_id: Uuid, seq: u64, role: MessageRole, content: &str, embedding: Option<Vec<f32>>) -> Message {
    let mut m = match role {
        MessageRole::User => Message::user(conversation_id, content),
        _ => Message::assistant(conversation_id, content),
    };
    m.sequence_number = seq;
    m.embedding = embedding;
    m
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let conversation_id = Uuid::new_v4();

    let archive = vec![
        seeded_message(conversation_id, 0, MessageRole::User, "How do I deploy the service to staging?", Some(vec![1.0, 0.0, 0.0])),
        seeded_message(conversation_id, 1, MessageRole::User, "What's the weather like today?", Some(vec![0.0, 0.0, 1.0])),
    ];

    let history = vec![seeded_message(
        conversation_id,
        2,
        MessageRole::User,
        "Remind me, what was that deploy command again?",
        None,
    )];

    let composer = MemoryComposer::new("You are a terse ops assistant.", 50, 3);
    let embedder = DemoEmbedder;

    let composed = composer
        .compose(
            conversation_id,
            &history,
            &archive,
            Some("User has been working on deploying the staging service."),
            &embedder,
            "deploy command",
        )
        .await?;

    for message in &composed {
        println!("[{:?}] {}", message.role, message.content);
    }

    Ok(())
}
