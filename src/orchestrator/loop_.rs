//! Reasoning Loop (spec §4.6) — the state machine driving one turn:
//! classify → select a path → iterate LLM calls and tool executions up to
//! `MAX_TOOL_TURNS`, yielding [`StreamChunk`]s as it goes.
//!
//! Grounded on the teacher's `Client::auto_execute_loop`: same shape
//! (check the iteration ceiling *before* executing tools, append an
//! assistant message recording both text and tool calls, then a tool-role
//! message per call, then loop), generalized from an in-process buffer of
//! `ContentBlock`s to a channel of wire [`StreamChunk`]s plus the §4.7
//! sanitizer sitting in between.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_stream::wrappers::ReceiverStream;

use crate::config::OrchestratorConfig;
use crate::error::{Error, Result};
use crate::providers::{ChunkStream, Provider};
use crate::tools::ToolRegistry;
use crate::types::{ConversationId, Message, StreamChunk, ToolCall};

use super::sanitizer::{ExecutionPath, OutputSanitizer};

/// Decides Fast vs. Tool vs. Agentic (spec §4.6 path-selection table).
/// Media-attachment bypass/vision-model switching happens in the caller
/// (spec §4.5), upstream of this choice.
pub fn select_path(complexity: crate::intent::Complexity, tools_available: bool) -> ExecutionPath {
    use crate::intent::Complexity;
    match (complexity, tools_available) {
        (Complexity::Complex, _) => ExecutionPath::Agentic,
        (Complexity::Simple, true) => ExecutionPath::Tool,
        (Complexity::Simple, false) => ExecutionPath::Fast,
    }
}

pub struct ReasoningLoop {
    config: Arc<OrchestratorConfig>,
    registry: Arc<ToolRegistry>,
}

impl ReasoningLoop {
    pub fn new(config: Arc<OrchestratorConfig>, registry: Arc<ToolRegistry>) -> Self {
        ReasoningLoop { config, registry }
    }

    /// Drive one turn, returning a bounded channel of chunks (spec §5
    /// "backpressure: single-item or small buffered channel") and the
    /// final assistant/tool messages produced, for the caller to persist.
    pub fn run(
        self: Arc<Self>,
        provider: Arc<dyn Provider>,
        path: ExecutionPath,
        conversation_id: ConversationId,
        seed_messages: Vec<Message>,
        intent: String,
        query_text: String,
    ) -> ChunkStream {
        let (tx, rx) = mpsc::channel::<Result<StreamChunk>>(8);

        tokio::spawn(async move {
            let outcome = self
                .drive(&tx, &provider, path, conversation_id, seed_messages, &intent, &query_text)
                .await;
            if let Err(e) = outcome {
                let _ = tx.send(Err(e)).await;
            }
        });

        Box::pin(ReceiverStream::new(rx))
    }

    async fn drive(
        &self,
        tx: &mpsc::Sender<Result<StreamChunk>>,
        provider: &Arc<dyn Provider>,
        path: ExecutionPath,
        conversation_id: ConversationId,
        mut messages: Vec<Message>,
        intent: &str,
        query_text: &str,
    ) -> Result<()> {
        let mut sanitizer = OutputSanitizer::new(path);
        let mut iteration: usize = 0;

        loop {
            let schemas = if path == ExecutionPath::Fast {
                Vec::new()
            } else {
                self.registry.schemas_for(intent, query_text).await
            };

            let mut stream = timeout(
                self.config.llm_timeout,
                provider.stream(&messages, Some(self.config.model.as_str()), None, &schemas),
            )
            .await
            .map_err(|_| Error::Timeout)??;

            let (iteration_text, tool_calls, provider_done) =
                self.consume_iteration(&mut stream, &mut sanitizer, tx).await?;

            let flushed = sanitizer.end_iteration(!tool_calls.is_empty());
            for chunk in flushed {
                tx.send(Ok(chunk)).await.map_err(|_| Error::Cancelled)?;
            }

            if tool_calls.is_empty() {
                if !iteration_text.is_empty() {
                    messages.push(Message::assistant(conversation_id, iteration_text));
                }
                if let Some(done) = sanitizer.translate_done(provider_done, false, conversation_id) {
                    tx.send(Ok(done)).await.map_err(|_| Error::Cancelled)?;
                }
                return Ok(());
            }

            iteration += 1;
            if iteration > self.config.max_tool_turns {
                tx.send(Ok(StreamChunk::status(format!(
                    "Reached the maximum of {} tool turns; returning what I have.",
                    self.config.max_tool_turns
                ))))
                .await
                .map_err(|_| Error::Cancelled)?;
                if !iteration_text.is_empty() {
                    tx.send(Ok(StreamChunk::content(iteration_text.clone())))
                        .await
                        .map_err(|_| Error::Cancelled)?;
                    messages.push(Message::assistant(conversation_id, iteration_text));
                }
                tx.send(Ok(StreamChunk::done(conversation_id)))
                    .await
                    .map_err(|_| Error::Cancelled)?;
                return Ok(());
            }

            // Per spec §4.6: the assistant message recording a tool-calling
            // iteration carries the tool_calls but has its content stripped
            // before persisting, so raw JSON never re-enters the context on
            // the next iteration (the "correlation invariant" root fix).
            let mut assistant_message =
                Message::assistant_with_tool_calls(conversation_id, iteration_text, tool_calls.clone());
            assistant_message.strip_tool_call_content();
            messages.push(assistant_message);

            for call in &tool_calls {
                let qualified_name = call.name.clone();
                tx.send(Ok(StreamChunk::status(format!("Using {qualified_name}..."))))
                    .await
                    .map_err(|_| Error::Cancelled)?;

                let result = self
                    .registry
                    .execute(&qualified_name, call.arguments.clone(), self.config.tool_timeout)
                    .await;

                let content = match result {
                    Ok(value) => truncate(&value.to_string(), self.config.tool_result_truncation_cap),
                    Err(e) if e.is_recoverable_in_loop() => {
                        truncate(&format!("{{\"error\": \"{e}\"}}"), self.config.tool_result_truncation_cap)
                    }
                    Err(e) => return Err(e),
                };

                messages.push(Message::tool_result(conversation_id, call.id.clone(), content));
            }
        }
    }

    /// Consume one iteration's chunk stream, forwarding via the sanitizer
    /// as it goes and returning the full accumulated text, any tool calls,
    /// and whether the provider itself signaled `done`.
    async fn consume_iteration(
        &self,
        stream: &mut ChunkStream,
        sanitizer: &mut OutputSanitizer,
        tx: &mpsc::Sender<Result<StreamChunk>>,
    ) -> Result<(String, Vec<ToolCall>, bool)> {
        use futures::StreamExt;

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        let mut provider_done = false;

        while let Some(item) = stream.next().await {
            let chunk = item?;

            if let Some(content) = chunk.content {
                text.push_str(&content);
                if let Some(forwarded) = sanitizer.content(content) {
                    tx.send(Ok(forwarded)).await.map_err(|_| Error::Cancelled)?;
                }
            }

            if let Some(calls) = chunk.tool_calls {
                tool_calls = calls;
            }

            if chunk.done.unwrap_or(false) {
                provider_done = true;
            }
        }

        Ok((text, tool_calls, provider_done))
    }
}

fn truncate(s: &str, cap: usize) -> String {
    if s.len() <= cap {
        return s.to_string();
    }
    let mut boundary = cap;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }
    format!("{}... [truncated]", &s[..boundary])
}
