//! Fast-path demo: a SIMPLE, no-tools turn streamed straight from a
//! provider through the reasoning loop to stdout.
//!
//! Requires a local OpenAI-compatible server (LM Studio/Ollama/llama.cpp)
//! listening on `ORCHESTRATOR_BASE_URL` (default `http://localhost:1234/v1`).

use std::sync::Arc;

use chat_orchestrator::{
    select_path, Complexity, ExecutionPath, Message, OrchestratorConfig, ProviderFactory,
    ReasoningLoop, ToolRegistry,
};
use futures::StreamExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Arc::new(OrchestratorConfig::builder().build()?);
    let provider = ProviderFactory::build(&config, None, None)?;
    let registry = Arc::new(ToolRegistry::new(config.tool_allowlist.clone(), config.tool_filter_max)?);

    let path = select_path(Complexity::Simple, false);
    assert_eq!(path, ExecutionPath::Fast);

    let conversation_id = uuid::Uuid::new_v4();
    let seed = vec![
        Message::system(conversation_id, "You are a concise, helpful assistant."),
        Message::user(conversation_id, "What's the capital of France, in one sentence?"),
    ];

    let reasoning_loop = Arc::new(ReasoningLoop::new(config, registry));
    let mut stream = reasoning_loop.run(provider, path, conversation_id, seed, "GENERAL".to_string(), String::new());

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if let Some(content) = chunk.content {
            print!("{content}");
        }
        if chunk.done.unwrap_or(false) {
            println!();
            break;
        }
        if let Some(error) = chunk.error {
            eprintln!("error: {error}");
            break;
        }
    }

    Ok(())
}
