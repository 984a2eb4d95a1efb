//! SSE parsing and delta aggregation, adapted from the teacher SDK's
//! `src/utils.rs` (`parse_sse_stream`, `ToolCallAggregator`). The teacher
//! buffers text until `finish_reason` and emits a `ContentBlock`; the
//! orchestrator instead forwards each text delta immediately as a
//! [`StreamChunk::content`] (spec §4.1 "incremental content") while still
//! accumulating the full text and tool calls for the turn history.

use std::collections::HashMap;
use std::pin::Pin;

use futures::stream::{Stream, StreamExt};

use super::wire::OpenAiChunk;
use crate::error::{Error, Result};
use crate::types::{StreamChunk, ToolCall};

/// Parses a raw HTTP response body as an SSE stream of [`OpenAiChunk`]s.
/// Kept close to the teacher's `parse_sse_stream`: line-oriented `data: `
/// extraction, `[DONE]` sentinel skipped, lossy UTF-8 to tolerate chunk
/// boundary splits.
pub fn parse_sse_stream(
    body: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<OpenAiChunk>> + Send>> {
    let stream = body.bytes_stream().filter_map(move |result| async move {
        let bytes = match result.map_err(Error::Http) {
            Ok(b) => b,
            Err(e) => return Some(Err(e)),
        };

        let text = String::from_utf8_lossy(&bytes);

        for line in text.lines() {
            if let Some(data) = line.strip_prefix("data: ") {
                if data == "[DONE]" {
                    continue;
                }
                let chunk: OpenAiChunk = match serde_json::from_str(data) {
                    Ok(c) => c,
                    Err(e) => {
                        return Some(Err(Error::provider_bad_output(format!(
                            "failed to parse chunk: {e}"
                        ))));
                    }
                };
                return Some(Ok(chunk));
            }
        }

        None
    });

    Box::pin(stream)
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// What a completed iteration of the provider's stream produced, once a
/// `finish_reason` has been seen: the full assistant text and any
/// structured tool calls (spec §3 `ToolCall`).
#[derive(Debug, Default, Clone)]
pub struct FinishedTurn {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
}

/// Accumulates streaming deltas, immediately surfacing text as
/// [`StreamChunk::content`] frames while assembling tool calls and the
/// full text for the eventual [`FinishedTurn`].
pub struct ChunkAggregator {
    text_buffer: String,
    tool_calls: HashMap<u32, PartialToolCall>,
}

impl ChunkAggregator {
    pub fn new() -> Self {
        ChunkAggregator {
            text_buffer: String::new(),
            tool_calls: HashMap::new(),
        }
    }

    /// Process one wire chunk. Returns the `StreamChunk`s to forward
    /// immediately (content deltas, as they arrive) and, once a
    /// `finish_reason` is present, the assembled [`FinishedTurn`].
    pub fn process_chunk(
        &mut self,
        chunk: OpenAiChunk,
    ) -> Result<(Vec<StreamChunk>, Option<FinishedTurn>)> {
        let mut immediate = Vec::new();
        let mut finished = None;

        for choice in chunk.choices {
            if let Some(content) = choice.delta.content {
                if !content.is_empty() {
                    immediate.push(StreamChunk::content(content.clone()));
                    self.text_buffer.push_str(&content);
                }
            }

            if let Some(tool_calls) = choice.delta.tool_calls {
                for delta in tool_calls {
                    let entry = self.tool_calls.entry(delta.index).or_default();
                    if let Some(id) = delta.id {
                        entry.id = Some(id);
                    }
                    if let Some(function) = delta.function {
                        if let Some(name) = function.name {
                            entry.name = Some(name);
                        }
                        if let Some(args) = function.arguments {
                            entry.arguments.push_str(&args);
                        }
                    }
                }
            }

            if choice.finish_reason.is_some() {
                let text = std::mem::take(&mut self.text_buffer);
                let mut tool_calls = Vec::new();
                for (_, partial) in self.tool_calls.drain() {
                    if let (Some(id), Some(name)) = (partial.id, partial.name) {
                        let arguments: serde_json::Value = if partial.arguments.is_empty() {
                            serde_json::json!({})
                        } else {
                            serde_json::from_str(&partial.arguments).map_err(|e| {
                                Error::provider_bad_output(format!(
                                    "failed to parse tool arguments: {e}"
                                ))
                            })?
                        };
                        tool_calls.push(ToolCall::new(id, name, arguments));
                    }
                }
                if !tool_calls.is_empty() {
                    immediate.push(StreamChunk::tool_calls(tool_calls.clone()));
                }
                finished = Some(FinishedTurn { text, tool_calls });
            }
        }

        Ok((immediate, finished))
    }
}

impl Default for ChunkAggregator {
    fn default() -> Self {
        Self::new()
    }
}
