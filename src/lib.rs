//! # Chat Orchestrator
//!
//! A stateful, streaming, multi-turn dialog engine that mediates between
//! an end-user (over a bidirectional streaming transport), a set of
//! interchangeable LLM providers, a registry of external tool hosts
//! (MCP-style JSON-RPC-over-stdio processes), and a three-tier
//! conversational memory (hot window, warm summary, cold vector recall).
//!
//! ## Key Features
//!
//! - **Provider-agnostic**: local companion process or hosted REST vendor,
//!   selected by configuration name.
//! - **Bounded tool loop**: up to `MAX_TOOL_TURNS` iterations of
//!   LLM-call + tool-execute, with a hard ceiling and tool-call
//!   correlation to prevent infinite re-issue loops.
//! - **Salvage parsing**: recovers structured tool calls a provider only
//!   managed to emit as raw JSON in its content stream.
//! - **Three-tier memory**: recent-N sliding window, rolling summary, and
//!   embedding-similarity recall, composed into one system prompt.
//! - **Output sanitization**: never leaks raw tool-call JSON or a
//!   premature terminal signal into the client-visible stream.
//!
//! ## Example
//!
//! ```rust,no_run
//! use chat_orchestrator::{OrchestratorConfig, ProviderFactory, ToolRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OrchestratorConfig::builder().build()?;
//!     let provider = ProviderFactory::build(&config, None, None)?;
//!     let registry = ToolRegistry::new(config.tool_allowlist.clone(), config.tool_filter_max)?;
//!     let _ = (provider, registry);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **providers**: Provider trait + factory over the local/hosted variants,
//!   shared wire codec, streaming aggregation, and salvage parsing.
//! - **tools**: MCP-style JSON-RPC client per tool host, plus the
//!   aggregating, allowlisted, relevance-filtered registry.
//! - **memory**: hot/warm/cold tiers and their composition into one
//!   system prompt.
//! - **intent**: the cheap classifier deciding scope and complexity.
//! - **orchestrator**: the reasoning-loop state machine and output
//!   sanitizer — the heart of the crate.
//! - **persistence**: repository traits the core depends on, plus
//!   in-memory implementations for tests and demos.
//! - **hooks**: lifecycle events (PreToolUse/PostToolUse/UserPromptSubmit)
//!   for audit logging and policy gates.
//! - **config**: the full spec §6 configuration table.
//! - **retry**: exponential backoff shared by provider calls and tool-host
//!   restarts.

mod config;
mod error;
mod hooks;
mod intent;
mod memory;
mod orchestrator;
mod persistence;
mod providers;
mod tools;
mod types;

pub mod retry;

// --- Configuration ---

pub use config::{
    get_base_url, get_model, OrchestratorConfig, OrchestratorConfigBuilder, ProviderKind,
};

// --- Error Handling ---

pub use error::{Error, Result};

// --- Lifecycle Hooks ---

pub use hooks::{
    HookDecision, Hooks, PostToolUseEvent, PreToolUseEvent, UserPromptSubmitEvent,
    HOOK_POST_TOOL_USE, HOOK_PRE_TOOL_USE, HOOK_USER_PROMPT_SUBMIT,
};

// --- Intent Classification ---

pub use intent::{Classification, Complexity, Intent, IntentClassifier};

// --- Memory Tiers ---

pub use memory::{ColdMemory, EmbeddingProvider, HotWindow, LocalEmbeddingProvider, MemoryComposer, WarmSummarizer};

// --- Reasoning Loop & Sanitizer ---

pub use orchestrator::{select_path, ExecutionPath, OutputSanitizer, ReasoningLoop};

// --- Persistence ---

pub use persistence::{
    ConversationRepository, InMemoryConversationRepository, InMemoryMessageRepository,
    MessageRepository, PersistenceHandle,
};

// --- Provider Interface & Factory ---

pub use providers::{ChunkStream, HostedProvider, LocalInferenceProvider, Provider, ProviderFactory};

// --- Tool-Host Client & Registry ---

pub use tools::{ToolHostClient, ToolRegistry};

// --- Core Types ---

pub use types::{
    Conversation, ConversationId, Message, MessageId, MessageRole, Metrics, StreamChunk,
    ToolCall, ToolCallId, ToolHostSpec, ToolHostState, ToolSchema,
};

// ============================================================================
// CONVENIENCE PRELUDE
// ============================================================================

/// Import with `use chat_orchestrator::prelude::*;` for typical orchestrator
/// wiring: configuration, provider/registry construction, and the
/// reasoning loop itself.
pub mod prelude {
    pub use crate::{
        ColdMemory, Conversation, Error, ExecutionPath, HotWindow, IntentClassifier, Message,
        MemoryComposer, OrchestratorConfig, PersistenceHandle, Provider, ProviderFactory,
        ReasoningLoop, Result, StreamChunk, ToolHostClient, ToolRegistry, WarmSummarizer,
    };
}
