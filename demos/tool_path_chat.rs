//! Tool-path demo: attaches one MCP-style tool host, lets the reasoning
//! loop decide whether to call it, and prints status/content/tool_call
//! frames as they stream.
//!
//! Requires a local OpenAI-compatible server for the provider, and a tool
//! host binary that speaks the MCP JSON-RPC contract (`initialize`,
//! `tools/list`, `tools/call`) over stdio — point `TOOL_HOST_COMMAND` at it.

use std::env;
use std::sync::Arc;

use chat_orchestrator::{
    select_path, Complexity, Message, OrchestratorConfig, ProviderFactory, ReasoningLoop,
    ToolHostClient, ToolHostSpec, ToolRegistry,
};
use futures::StreamExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Arc::new(OrchestratorConfig::builder().build()?);
    let provider = ProviderFactory::build(&config, None, None)?;

    let mut registry = ToolRegistry::new(config.tool_allowlist.clone(), config.tool_filter_max)?;

    let host_command = env::var("TOOL_HOST_COMMAND").unwrap_or_else(|_| "mcp-fs-host".to_string());
    let host = ToolHostClient::spawn(ToolHostSpec {
        name: "fs".to_string(),
        launch_command: host_command,
        args: vec![],
        env: Default::default(),
    })
    .await?;
    host.initialize().await?;
    registry.attach_host(host);
    registry.refresh().await?;

    let registry = Arc::new(registry);
    let has_tools = !registry.all_schemas().await.is_empty();
    let path = select_path(Complexity::Simple, has_tools);

    let conversation_id = uuid::Uuid::new_v4();
    let seed = vec![
        Message::system(conversation_id, "You may use the attached tools when helpful."),
        Message::user(conversation_id, "List the files in the current directory."),
    ];

    let reasoning_loop = Arc::new(ReasoningLoop::new(config, registry));
    let mut stream = reasoning_loop.run(provider, path, conversation_id, seed, "FILESYSTEM".to_string(), "list files".to_string());

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if let Some(status) = chunk.status {
            println!("[{status}]");
        }
        if let Some(content) = chunk.content {
            print!("{content}");
        }
        if let Some(calls) = chunk.tool_calls {
            for call in calls {
                println!("\n[calling {} with {}]", call.name, call.arguments);
            }
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
