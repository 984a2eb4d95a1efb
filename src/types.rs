//! # Core Data Model (spec §3)
//!
//! `Message`, `ToolCall`, `Conversation`, `ToolSchema`, `ToolHostInfo` and
//! `StreamChunk` — the entities the rest of the orchestrator is built
//! around. Validated newtypes (`ModelName`, `BaseUrl`, `Temperature`) are
//! kept from the teacher SDK's configuration layer essentially unchanged;
//! everything else here replaces the teacher's chat-client-shaped
//! `AgentOptions`/`ContentBlock`/`Message` with the orchestrator's
//! conversation-and-turn-shaped entities.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

// ============================================================================
// VALIDATED NEWTYPES
// ============================================================================

/// Validated, non-empty model identifier.
///
/// # Example
///
/// ```
/// use chat_orchestrator::ModelName;
///
/// let model = ModelName::new("qwen2.5-32b-instruct").unwrap();
/// assert_eq!(model.as_str(), "qwen2.5-32b-instruct");
/// assert!(ModelName::new("").is_err());
/// assert!(ModelName::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelName(String);

impl ModelName {
    /// Creates a new `ModelName` after validation.
    pub fn new(name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::invalid_input("model name cannot be empty or whitespace"));
        }
        Ok(ModelName(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ModelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated base URL: non-empty, `http://` or `https://`.
///
/// ```
/// use chat_orchestrator::BaseUrl;
///
/// assert!(BaseUrl::new("http://localhost:1234/v1").is_ok());
/// assert!(BaseUrl::new("localhost:1234").is_err());
/// assert!(BaseUrl::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BaseUrl(String);

impl BaseUrl {
    pub fn new(url: impl Into<String>) -> crate::Result<Self> {
        let url = url.into();
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_input("base_url cannot be empty"));
        }
        if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            return Err(Error::invalid_input("base_url must start with http:// or https://"));
        }
        Ok(BaseUrl(url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated sampling temperature, `0.0..=2.0`.
///
/// ```
/// use chat_orchestrator::Temperature;
///
/// assert_eq!(Temperature::new(0.7).unwrap().value(), 0.7);
/// assert!(Temperature::new(-0.1).is_err());
/// assert!(Temperature::new(2.1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature(f32);

impl Temperature {
    pub fn new(temp: f32) -> crate::Result<Self> {
        if !(0.0..=2.0).contains(&temp) {
            return Err(Error::invalid_input("temperature must be between 0.0 and 2.0"));
        }
        Ok(Temperature(temp))
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

impl std::fmt::Display for Temperature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for Temperature {
    fn default() -> Self {
        Temperature(0.7)
    }
}

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// A conversation identifier.
pub type ConversationId = Uuid;
/// A message identifier.
pub type MessageId = Uuid;
/// A per-turn tool-call identifier. Unique and stable within a turn, may be
/// generated by the provider or synthesized by the salvage parser.
pub type ToolCallId = String;

// ============================================================================
// MESSAGE
// ============================================================================

/// `{system, user, assistant, tool}` per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

/// Per-message token/latency/provenance accounting, persisted alongside
/// the message row (spec §3, §6 `messages.metrics JSON`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub latency_ms: Option<u64>,
    pub model: Option<String>,
    pub provider: Option<String>,
}

/// A structured tool invocation requested by the model.
///
/// `id` is unique within a turn and stable across retries (spec §3
/// invariant); `arguments` is the parsed JSON object the model supplied
/// (or the registry rejects with `ToolArgsInvalid`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: ToolCallId,
    pub name: String,
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        ToolCall {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// One row of conversation history.
///
/// Content is plain UTF-8 text (spec §3) — the orchestrator does not use
/// the teacher's multi-block `ContentBlock` representation; tool calls and
/// tool-call correlation are carried in dedicated fields instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub role: MessageRole,
    pub content: String,
    /// Present on assistant messages that requested tool calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Present on tool-role messages; must match an id in the immediately
    /// preceding assistant message's `tool_calls` (spec §3 correlation
    /// invariant).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<ToolCallId>,
    /// Strictly increasing per conversation, no gaps.
    pub sequence_number: u64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub metrics: Metrics,
    /// Nullable; written late by the background embedder (cold memory).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Message {
    /// Construct a message with default metrics/embedding, leaving
    /// `id`/`sequence_number`/`created_at` to be assigned by the
    /// persistence collaborator on insert (spec §6: "the core only
    /// consumes repository interfaces").
    fn new(conversation_id: ConversationId, role: MessageRole, content: impl Into<String>) -> Self {
        Message {
            id: Uuid::nil(),
            conversation_id,
            role,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
            sequence_number: 0,
            created_at: chrono::Utc::now(),
            metrics: Metrics::default(),
            embedding: None,
        }
    }

    pub fn system(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self::new(conversation_id, MessageRole::System, content)
    }

    pub fn user(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self::new(conversation_id, MessageRole::User, content)
    }

    pub fn assistant(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self::new(conversation_id, MessageRole::Assistant, content)
    }

    pub fn assistant_with_tool_calls(
        conversation_id: ConversationId,
        content: impl Into<String>,
        tool_calls: Vec<ToolCall>,
    ) -> Self {
        let mut m = Self::new(conversation_id, MessageRole::Assistant, content);
        m.tool_calls = Some(tool_calls);
        m
    }

    pub fn tool_result(
        conversation_id: ConversationId,
        tool_call_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let mut m = Self::new(conversation_id, MessageRole::Tool, content);
        m.tool_call_id = Some(tool_call_id.into());
        m
    }

    /// Replace raw tool-call JSON content with an empty string while
    /// retaining the `tool_calls` field — the reasoning loop's context
    /// stripping for iterations ≥ 2 (spec §4.6).
    pub fn strip_tool_call_content(&mut self) {
        if self.tool_calls.is_some() {
            self.content.clear();
        }
    }
}

// ============================================================================
// CONVERSATION
// ============================================================================

/// Conversation-level state owned by the persistence collaborator; the
/// orchestrator reads/writes it through the repository traits in
/// `persistence`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub summary: Option<String>,
    pub last_summarized_seq: u64,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Conversation {
    pub fn new(title: impl Into<String>) -> Self {
        Conversation {
            id: Uuid::new_v4(),
            title: title.into(),
            summary: None,
            last_summarized_seq: 0,
            updated_at: chrono::Utc::now(),
        }
    }
}

// ============================================================================
// TOOL SCHEMA / TOOL HOST DESCRIPTOR
// ============================================================================

/// A tool's advertised schema, namespaced by the host that provides it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameter_schema: serde_json::Value,
    pub origin_host: String,
}

impl ToolSchema {
    /// The fully-qualified name the registry keys tools by: `host::name`.
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.origin_host, self.name)
    }

    /// Render as an OpenAI-style function-calling tool definition, as
    /// consumed by `providers::wire::OpenAiRequest.tools`.
    pub fn to_wire_format(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.qualified_name(),
                "description": self.description,
                "parameters": self.parameter_schema,
            }
        })
    }
}

/// Lifecycle state of a tool-host child process (spec §3, §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolHostState {
    Starting,
    Ready,
    Degraded,
    Dead,
}

/// Static launch configuration for a tool host, independent of its live
/// process handle (which lives in `tools::host::ToolHostClient`).
#[derive(Debug, Clone)]
pub struct ToolHostSpec {
    pub name: String,
    pub launch_command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

// ============================================================================
// STREAM CHUNK (wire output, spec §3 / §6)
// ============================================================================

/// The orchestrator's single outbound frame shape. Exactly one of
/// `content`/`status`/`tool_calls`/`done`/`error` is meaningfully set per
/// frame in practice, though the type does not enforce exclusivity (the
/// sanitizer in `orchestrator::sanitizer` is responsible for that).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StreamChunk {
    pub fn content(text: impl Into<String>) -> Self {
        StreamChunk {
            content: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn status(text: impl Into<String>) -> Self {
        StreamChunk {
            status: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        StreamChunk {
            tool_calls: Some(calls),
            ..Default::default()
        }
    }

    pub fn done(conversation_id: ConversationId) -> Self {
        StreamChunk {
            done: Some(true),
            conversation_id: Some(conversation_id),
            ..Default::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        StreamChunk {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    /// Whether this is a terminal frame (done or error) — no further
    /// frames should follow it for the same request (spec §6).
    pub fn is_terminal(&self) -> bool {
        self.done.unwrap_or(false) || self.error.is_some()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_name_validation() {
        assert!(ModelName::new("qwen2.5-32b").is_ok());
        assert!(ModelName::new("").is_err());
        assert!(ModelName::new("   ").is_err());
    }

    #[test]
    fn test_base_url_validation() {
        assert!(BaseUrl::new("http://localhost:1234/v1").is_ok());
        assert!(BaseUrl::new("https://api.example.com/v1").is_ok());
        assert!(BaseUrl::new("localhost:1234").is_err());
        assert!(BaseUrl::new("").is_err());
    }

    #[test]
    fn test_temperature_validation() {
        assert!(Temperature::new(0.0).is_ok());
        assert!(Temperature::new(2.0).is_ok());
        assert!(Temperature::new(-0.1).is_err());
        assert!(Temperature::new(2.1).is_err());
    }

    #[test]
    fn test_message_constructors() {
        let cid = Uuid::new_v4();
        let user = Message::user(cid, "hi");
        assert_eq!(user.role, MessageRole::User);
        assert!(user.tool_calls.is_none());

        let assistant = Message::assistant_with_tool_calls(
            cid,
            "",
            vec![ToolCall::new("t1", "fs::read_file", serde_json::json!({"path": "README.md"}))],
        );
        assert_eq!(assistant.tool_calls.as_ref().unwrap().len(), 1);

        let tool_msg = Message::tool_result(cid, "t1", "file contents");
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_strip_tool_call_content() {
        let cid = Uuid::new_v4();
        let mut assistant = Message::assistant_with_tool_calls(
            cid,
            "{\"name\":\"list_directory\"}",
            vec![ToolCall::new("t1", "list_directory", serde_json::json!({}))],
        );
        assistant.strip_tool_call_content();
        assert!(assistant.content.is_empty());
        assert!(assistant.tool_calls.is_some());
    }

    #[test]
    fn test_tool_schema_qualified_name_and_wire_format() {
        let schema = ToolSchema {
            name: "read_file".to_string(),
            description: "Read a file".to_string(),
            parameter_schema: serde_json::json!({"type": "object"}),
            origin_host: "fs".to_string(),
        };
        assert_eq!(schema.qualified_name(), "fs::read_file");
        let wire = schema.to_wire_format();
        assert_eq!(wire["function"]["name"], "fs::read_file");
    }

    #[test]
    fn test_stream_chunk_constructors_and_terminal() {
        let content = StreamChunk::content("hello");
        assert!(!content.is_terminal());

        let cid = Uuid::new_v4();
        let done = StreamChunk::done(cid);
        assert!(done.is_terminal());
        assert_eq!(done.conversation_id, Some(cid));

        let err = StreamChunk::error("boom");
        assert!(err.is_terminal());
    }

    #[test]
    fn test_conversation_new() {
        let convo = Conversation::new("untitled");
        assert_eq!(convo.last_summarized_seq, 0);
        assert!(convo.summary.is_none());
    }
}
