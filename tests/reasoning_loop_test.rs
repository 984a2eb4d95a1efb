//! End-to-end reasoning-loop tests driving `ReasoningLoop` through its
//! public API with a stub `Provider`, covering the spec §8 seed scenarios
//! that don't require a live tool-host child process: a no-tools greeting,
//! a tool call that the registry can't satisfy (recovered in-loop) that
//! still reaches an answer, the iteration ceiling, and upstream provider
//! failure surfacing as a terminal error frame.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chat_orchestrator::{
    select_path, ChunkStream, Complexity, ExecutionPath, Message, OrchestratorConfig, Provider,
    ReasoningLoop, StreamChunk, ToolCall, ToolRegistry,
};
use futures::stream::{self, StreamExt};

struct StubProvider {
    calls: AtomicUsize,
    scripted: Vec<Vec<StreamChunk>>,
}

impl StubProvider {
    fn new(scripted: Vec<Vec<StreamChunk>>) -> Self {
        StubProvider {
            calls: AtomicUsize::new(0),
            scripted,
        }
    }
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
    ) -> chat_orchestrator::Result<String> {
        Ok(String::new())
    }

    async fn stream(
        &self,
        _messages: &[Message],
        _model: Option<&str>,
        _temperature: Option<f32>,
        _tool_schemas: &[chat_orchestrator::ToolSchema],
    ) -> chat_orchestrator::Result<ChunkStream> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let chunks = self
            .scripted
            .get(call)
            .cloned()
            .unwrap_or_else(|| vec![StreamChunk::done(uuid::Uuid::nil())]);
        Ok(Box::pin(stream::iter(chunks.into_iter().map(Ok))))
    }

    async fn health_check(&self) -> bool {
        true
    }
}

fn config(max_tool_turns: usize) -> Arc<OrchestratorConfig> {
    Arc::new(
        OrchestratorConfig::builder()
            .model("stub-model")
            .max_tool_turns(max_tool_turns)
            .tool_timeout(Duration::from_millis(200))
            .llm_timeout(Duration::from_secs(5))
            .build()
            .unwrap(),
    )
}

fn registry() -> Arc<ToolRegistry> {
    Arc::new(ToolRegistry::new(Vec::new(), 5).unwrap())
}

#[tokio::test]
async fn test_fast_path_greeting_streams_content_then_done() {
    let conversation_id = uuid::Uuid::new_v4();
    let provider: Arc<dyn Provider> = Arc::new(StubProvider::new(vec![vec![
        StreamChunk::content("Hello"),
        StreamChunk::content(" there!"),
        StreamChunk::done(conversation_id),
    ]]));

    let path = select_path(Complexity::Simple, false);
    assert_eq!(path, ExecutionPath::Fast);

    let reasoning_loop = Arc::new(ReasoningLoop::new(config(5), registry()));
    let seed = vec![Message::user(conversation_id, "hi")];
    let mut stream = reasoning_loop.run(provider, path, conversation_id, seed, "GENERAL".to_string(), String::new());

    let mut content = String::new();
    let mut saw_done = false;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.unwrap();
        if let Some(c) = chunk.content {
            content.push_str(&c);
        }
        if chunk.done.unwrap_or(false) {
            saw_done = true;
            assert_eq!(chunk.conversation_id, Some(conversation_id));
        }
    }

    assert_eq!(content, "Hello there!");
    assert!(saw_done, "expected a terminal done chunk");
}

#[tokio::test]
async fn test_tool_call_recovers_and_reaches_final_answer() {
    let conversation_id = uuid::Uuid::new_v4();
    let provider: Arc<dyn Provider> = Arc::new(StubProvider::new(vec![
        vec![StreamChunk::tool_calls(vec![ToolCall::new(
            "call_1",
            "fs::read_file",
            serde_json::json!({"path": "README.md"}),
        )])],
        vec![
            StreamChunk::content("I couldn't read the file, but here's what I know."),
            StreamChunk::done(conversation_id),
        ],
    ]));

    let reasoning_loop = Arc::new(ReasoningLoop::new(config(5), registry()));
    let seed = vec![Message::user(conversation_id, "read the readme")];
    let mut stream = reasoning_loop.run(
        provider,
        ExecutionPath::Tool,
        conversation_id,
        seed,
        "CODE".to_string(),
        "read the readme".to_string(),
    );

    let mut saw_status = false;
    let mut saw_done = false;
    let mut final_text = String::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.unwrap();
        if chunk.status.is_some() {
            saw_status = true;
        }
        if let Some(c) = chunk.content {
            final_text.push_str(&c);
        }
        if chunk.done.unwrap_or(false) {
            saw_done = true;
        }
    }

    assert!(saw_status, "expected a status chunk announcing the tool call");
    assert!(saw_done);
    assert_eq!(final_text, "I couldn't read the file, but here's what I know.");
}

#[tokio::test]
async fn test_repeated_unsatisfiable_tool_calls_hit_the_turn_ceiling() {
    let conversation_id = uuid::Uuid::new_v4();
    let repeated_call = vec![StreamChunk::tool_calls(vec![ToolCall::new(
        "call_x",
        "fs::read_file",
        serde_json::json!({"path": "missing.txt"}),
    )])];
    let provider: Arc<dyn Provider> = Arc::new(StubProvider::new(vec![
        repeated_call.clone(),
        repeated_call.clone(),
        repeated_call.clone(),
        repeated_call,
    ]));

    let reasoning_loop = Arc::new(ReasoningLoop::new(config(2), registry()));
    let seed = vec![Message::user(conversation_id, "keep trying")];
    let mut stream = reasoning_loop.run(
        provider,
        ExecutionPath::Tool,
        conversation_id,
        seed,
        "CODE".to_string(),
        "read a file".to_string(),
    );

    let mut saw_ceiling_status = false;
    let mut saw_done = false;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.unwrap();
        if let Some(status) = &chunk.status {
            if status.contains("maximum") {
                saw_ceiling_status = true;
            }
        }
        if chunk.done.unwrap_or(false) {
            saw_done = true;
        }
    }

    assert!(saw_ceiling_status, "expected the ceiling status message");
    assert!(saw_done, "the loop must still terminate with a done frame");
}

#[tokio::test]
async fn test_provider_failure_surfaces_as_terminal_error() {
    struct FailingProvider;

    #[async_trait]
    impl Provider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }
        fn has_vision_model(&self) -> bool {
            false
        }
        async fn complete(
            &self,
            _messages: &[Message],
            _model: Option<&str>,
            _temperature: Option<f32>,
        ) -> chat_orchestrator::Result<String> {
            Ok(String::new())
        }
        async fn stream(
            &self,
            _messages: &[Message],
            _model: Option<&str>,
            _temperature: Option<f32>,
            _tool_schemas: &[chat_orchestrator::ToolSchema],
        ) -> chat_orchestrator::Result<ChunkStream> {
            Err(chat_orchestrator::Error::provider_unavailable("connection refused"))
        }
        async fn health_check(&self) -> bool {
            false
        }
    }

    let conversation_id = uuid::Uuid::new_v4();
    let provider: Arc<dyn Provider> = Arc::new(FailingProvider);
    let reasoning_loop = Arc::new(ReasoningLoop::new(config(5), registry()));
    let seed = vec![Message::user(conversation_id, "hi")];
    let mut stream = reasoning_loop.run(provider, ExecutionPath::Fast, conversation_id, seed, "GENERAL".to_string(), String::new());

    let first = stream.next().await.expect("expected at least one frame");
    assert!(first.is_err());
}
