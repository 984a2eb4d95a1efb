//! Lifecycle hooks for intercepting and controlling reasoning-loop execution
//! (supplement — the teacher's `hooks.rs` provided the event/handler shapes;
//! adapted here to carry the orchestrator's own domain types instead of
//! placeholder `serde_json::Value` snapshots).
//!
//! The reasoning loop (spec §4.6) calls these at tool-call boundaries and at
//! prompt intake, giving callers an audit/compliance seam without forking
//! the loop itself.
//!
//! # Examples
//!
//! ```rust,no_run
//! use chat_orchestrator::{Hooks, HookDecision, PreToolUseEvent};
//!
//! async fn approve_tool(event: PreToolUseEvent) -> Option<HookDecision> {
//!     if event.tool_call.name == "delete_file" {
//!         return Some(HookDecision::block("destructive tool blocked"));
//!     }
//!     None
//! }
//!
//! let _hooks = Hooks::new().add_pre_tool_use(approve_tool);
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::types::{ConversationId, ToolCall};

/// Fired before a tool call from the reasoning loop is dispatched to the
/// registry (spec §4.6 step 3).
#[derive(Debug, Clone)]
pub struct PreToolUseEvent {
    pub conversation_id: ConversationId,
    /// The call about to be executed, as correlated from the assistant's
    /// `tool_calls` (spec §3 invariant).
    pub tool_call: ToolCall,
    /// Sequence number the resulting tool-role message will receive.
    pub sequence_number: u64,
}

impl PreToolUseEvent {
    pub fn new(conversation_id: ConversationId, tool_call: ToolCall, sequence_number: u64) -> Self {
        Self {
            conversation_id,
            tool_call,
            sequence_number,
        }
    }
}

/// Fired after a tool call returns, whether it succeeded or errored.
#[derive(Debug, Clone)]
pub struct PostToolUseEvent {
    pub conversation_id: ConversationId,
    pub tool_call: ToolCall,
    /// The tool's result (on success) or an error description (on
    /// recoverable failure — spec §7 "tool errors recovered locally").
    pub result: Value,
    pub sequence_number: u64,
}

impl PostToolUseEvent {
    pub fn new(
        conversation_id: ConversationId,
        tool_call: ToolCall,
        result: Value,
        sequence_number: u64,
    ) -> Self {
        Self {
            conversation_id,
            tool_call,
            result,
            sequence_number,
        }
    }
}

/// Fired before a freshly submitted user message enters the reasoning loop.
#[derive(Debug, Clone)]
pub struct UserPromptSubmitEvent {
    pub conversation_id: ConversationId,
    pub prompt: String,
    pub sequence_number: u64,
}

impl UserPromptSubmitEvent {
    pub fn new(conversation_id: ConversationId, prompt: String, sequence_number: u64) -> Self {
        Self {
            conversation_id,
            prompt,
            sequence_number,
        }
    }
}

/// Decision returned by a hook handler to control execution.
#[derive(Debug, Clone, Default)]
pub struct HookDecision {
    /// Whether to continue execution (default: true)
    pub continue_execution: bool,
    /// For PreToolUse: replace the call's arguments before dispatch
    pub modified_arguments: Option<Value>,
    /// For UserPromptSubmit: replace the prompt text before classification
    pub modified_prompt: Option<String>,
    /// Optional explanation for logging/audit
    pub reason: Option<String>,
}

impl HookDecision {
    pub fn continue_() -> Self {
        Self {
            continue_execution: true,
            modified_arguments: None,
            modified_prompt: None,
            reason: None,
        }
    }

    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            continue_execution: false,
            modified_arguments: None,
            modified_prompt: None,
            reason: Some(reason.into()),
        }
    }

    pub fn modify_arguments(arguments: Value, reason: impl Into<String>) -> Self {
        Self {
            continue_execution: true,
            modified_arguments: Some(arguments),
            modified_prompt: None,
            reason: Some(reason.into()),
        }
    }

    pub fn modify_prompt(prompt: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            continue_execution: true,
            modified_arguments: None,
            modified_prompt: Some(prompt.into()),
            reason: Some(reason.into()),
        }
    }
}

pub type PreToolUseHandler = Arc<
    dyn Fn(PreToolUseEvent) -> Pin<Box<dyn Future<Output = Option<HookDecision>> + Send>>
        + Send
        + Sync,
>;

pub type PostToolUseHandler = Arc<
    dyn Fn(PostToolUseEvent) -> Pin<Box<dyn Future<Output = Option<HookDecision>> + Send>>
        + Send
        + Sync,
>;

pub type UserPromptSubmitHandler = Arc<
    dyn Fn(UserPromptSubmitEvent) -> Pin<Box<dyn Future<Output = Option<HookDecision>> + Send>>
        + Send
        + Sync,
>;

/// Container for all hook types, threaded through the reasoning loop.
#[derive(Clone, Default)]
pub struct Hooks {
    pub pre_tool_use: Vec<PreToolUseHandler>,
    pub post_tool_use: Vec<PostToolUseHandler>,
    pub user_prompt_submit: Vec<UserPromptSubmitHandler>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pre_tool_use<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(PreToolUseEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<HookDecision>> + Send + 'static,
    {
        self.pre_tool_use
            .push(Arc::new(move |event| Box::pin(handler(event))));
        self
    }

    pub fn add_post_tool_use<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(PostToolUseEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<HookDecision>> + Send + 'static,
    {
        self.post_tool_use
            .push(Arc::new(move |event| Box::pin(handler(event))));
        self
    }

    pub fn add_user_prompt_submit<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(UserPromptSubmitEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<HookDecision>> + Send + 'static,
    {
        self.user_prompt_submit
            .push(Arc::new(move |event| Box::pin(handler(event))));
        self
    }

    /// Run PreToolUse hooks in registration order, short-circuiting on the
    /// first non-`None` decision.
    pub async fn execute_pre_tool_use(&self, event: PreToolUseEvent) -> Option<HookDecision> {
        for handler in &self.pre_tool_use {
            if let Some(decision) = handler(event.clone()).await {
                return Some(decision);
            }
        }
        None
    }

    pub async fn execute_post_tool_use(&self, event: PostToolUseEvent) -> Option<HookDecision> {
        for handler in &self.post_tool_use {
            if let Some(decision) = handler(event.clone()).await {
                return Some(decision);
            }
        }
        None
    }

    pub async fn execute_user_prompt_submit(
        &self,
        event: UserPromptSubmitEvent,
    ) -> Option<HookDecision> {
        for handler in &self.user_prompt_submit {
            if let Some(decision) = handler(event.clone()).await {
                return Some(decision);
            }
        }
        None
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field(
                "pre_tool_use",
                &format!("{} handlers", self.pre_tool_use.len()),
            )
            .field(
                "post_tool_use",
                &format!("{} handlers", self.post_tool_use.len()),
            )
            .field(
                "user_prompt_submit",
                &format!("{} handlers", self.user_prompt_submit.len()),
            )
            .finish()
    }
}

pub const HOOK_PRE_TOOL_USE: &str = "pre_tool_use";
pub const HOOK_POST_TOOL_USE: &str = "post_tool_use";
pub const HOOK_USER_PROMPT_SUBMIT: &str = "user_prompt_submit";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call() -> ToolCall {
        ToolCall::new("call_1", "dangerous", json!({}))
    }

    #[tokio::test]
    async fn test_hook_decision_builders() {
        let continue_dec = HookDecision::continue_();
        assert!(continue_dec.continue_execution);
        assert!(continue_dec.reason.is_none());

        let block_dec = HookDecision::block("test");
        assert!(!block_dec.continue_execution);
        assert_eq!(block_dec.reason, Some("test".to_string()));

        let modify_dec = HookDecision::modify_arguments(json!({"test": 1}), "modified");
        assert!(modify_dec.continue_execution);
        assert!(modify_dec.modified_arguments.is_some());
    }

    #[tokio::test]
    async fn test_pre_tool_use_hook_blocks_by_name() {
        let hooks = Hooks::new().add_pre_tool_use(|event| async move {
            if event.tool_call.name == "dangerous" {
                return Some(HookDecision::block("blocked"));
            }
            None
        });

        let event = PreToolUseEvent::new(ConversationId::new_v4(), call(), 3);

        let decision = hooks.execute_pre_tool_use(event).await;
        assert!(decision.is_some());
        assert!(!decision.unwrap().continue_execution);
    }

    #[tokio::test]
    async fn test_post_tool_use_hook() {
        let hooks = Hooks::new().add_post_tool_use(|_event| async move { None });

        let event = PostToolUseEvent::new(ConversationId::new_v4(), call(), json!({"ok": true}), 4);

        hooks.execute_post_tool_use(event).await;
    }

    #[tokio::test]
    async fn test_user_prompt_submit_hook() {
        let hooks = Hooks::new().add_user_prompt_submit(|event| async move {
            if event.prompt.contains("DELETE") {
                return Some(HookDecision::block("dangerous prompt"));
            }
            None
        });

        let event = UserPromptSubmitEvent::new(ConversationId::new_v4(), "DELETE all files".to_string(), 1);

        let decision = hooks.execute_user_prompt_submit(event).await;
        assert!(decision.is_some());
        assert!(!decision.unwrap().continue_execution);
    }
}
