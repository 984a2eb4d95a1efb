//! Output Sanitizer (spec §4.7) — the rules governing what the reasoning
//! loop is allowed to forward to the client stream, in order:
//!
//! (a) `status` chunks always pass through.
//! (b) `content` passes through immediately on the Fast path; on the
//!     Tool/Agentic paths it is buffered per-iteration and discarded if
//!     the iteration turns out to end in a tool call (raw JSON must never
//!     leak into the visible channel).
//! (c) a provider-originated `done=true` is translated into our own
//!     terminal chunk only when no further iteration is planned.
//! (d) `conversation_id` is attached exactly once, on the final `done`.
//!
//! No teacher file performs this kind of mid-stream buffering (the SDK
//! forwards content as soon as it decodes it), so this is new, grounded on
//! `providers::streaming::ChunkAggregator`'s per-iteration accumulation
//! shape rather than copied from it.

use crate::types::{ConversationId, StreamChunk};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPath {
    Fast,
    Tool,
    Agentic,
}

impl ExecutionPath {
    fn buffers_content(self) -> bool {
        matches!(self, ExecutionPath::Tool | ExecutionPath::Agentic)
    }
}

pub struct OutputSanitizer {
    path: ExecutionPath,
    buffered_content: Vec<String>,
}

impl OutputSanitizer {
    pub fn new(path: ExecutionPath) -> Self {
        OutputSanitizer {
            path,
            buffered_content: Vec::new(),
        }
    }

    /// `status` chunks are never buffered (rule a).
    pub fn status(&self, text: impl Into<String>) -> StreamChunk {
        StreamChunk::status(text)
    }

    /// A content delta just decoded from the provider. Returns the chunk
    /// to forward now (Fast path), or `None` if it must wait for
    /// `end_iteration` to decide its fate (rule b).
    pub fn content(&mut self, text: String) -> Option<StreamChunk> {
        if self.path.buffers_content() {
            self.buffered_content.push(text);
            None
        } else {
            Some(StreamChunk::content(text))
        }
    }

    /// Called once an iteration's stream has closed. `has_tool_calls`
    /// tells the sanitizer whether this iteration produced tool calls; on
    /// the buffering paths, buffered content is discarded if so and
    /// flushed otherwise.
    pub fn end_iteration(&mut self, has_tool_calls: bool) -> Vec<StreamChunk> {
        if !self.path.buffers_content() {
            return Vec::new();
        }
        let buffered = std::mem::take(&mut self.buffered_content);
        if has_tool_calls {
            Vec::new()
        } else {
            buffered.into_iter().map(StreamChunk::content).collect()
        }
    }

    /// Translate the provider's own terminal signal (rule c). Only emits
    /// our terminal chunk when `will_continue` is false; the
    /// `conversation_id` is attached here, exactly once (rule d).
    pub fn translate_done(&self, provider_done: bool, will_continue: bool, conversation_id: ConversationId) -> Option<StreamChunk> {
        if provider_done && !will_continue {
            Some(StreamChunk::done(conversation_id))
        } else {
            None
        }
    }
}
