//! Error taxonomy for the chat orchestrator.
//!
//! Mirrors §7 of the design: tool-level failures are recoverable (fed back
//! into the reasoning loop as an in-band tool-role message), while provider,
//! invariant and iteration-limit failures surface to the caller.

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the orchestrator.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// API error from the model server
    #[error("API error: {0}")]
    Api(String),

    /// Streaming error
    #[error("Streaming error: {0}")]
    Stream(String),

    /// Tool execution error (legacy, in-process tool closures)
    #[error("Tool execution error: {0}")]
    Tool(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Timeout error
    #[error("Request timeout")]
    Timeout,

    /// A provider is unreachable or failed health_check.
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A provider's stream could not be parsed, and salvage failed too.
    #[error("Provider returned malformed output: {0}")]
    ProviderBadOutput(String),

    /// Registry has no tool by this fully-qualified name.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool arguments failed schema validation.
    #[error("Invalid arguments for tool {tool}: {reason}")]
    ToolArgsInvalid { tool: String, reason: String },

    /// A tool call exceeded its per-call deadline.
    #[error("Tool {0} timed out")]
    ToolTimeout(String),

    /// A tool call ran but returned an error result.
    #[error("Tool {tool} failed: {reason}")]
    ToolExecutionError { tool: String, reason: String },

    /// The tool host's child process has exited.
    #[error("Tool host {0} is dead")]
    HostDead(String),

    /// The reasoning loop hit MAX_TOOL_TURNS without finishing.
    #[error("Iteration limit exceeded after {0} turns")]
    IterationLimitExceeded(usize),

    /// The request was cancelled; no frame should be emitted for this.
    #[error("Cancelled")]
    Cancelled,

    /// A data-model invariant was violated (e.g. orphaned tool message).
    #[error("Internal invariant violated: {0}")]
    InternalInvariantViolated(String),

    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

impl Error {
    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a new API error
    pub fn api(msg: impl Into<String>) -> Self {
        Error::Api(msg.into())
    }

    /// Create a new stream error
    pub fn stream(msg: impl Into<String>) -> Self {
        Error::Stream(msg.into())
    }

    /// Create a new tool error
    pub fn tool(msg: impl Into<String>) -> Self {
        Error::Tool(msg.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a new other error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Create a timeout error
    pub fn timeout() -> Self {
        Error::Timeout
    }

    /// Create a provider-unavailable error
    pub fn provider_unavailable(msg: impl Into<String>) -> Self {
        Error::ProviderUnavailable(msg.into())
    }

    /// Create a provider-bad-output error
    pub fn provider_bad_output(msg: impl Into<String>) -> Self {
        Error::ProviderBadOutput(msg.into())
    }

    /// Create a tool-not-found error
    pub fn tool_not_found(name: impl Into<String>) -> Self {
        Error::ToolNotFound(name.into())
    }

    /// Create a tool-args-invalid error
    pub fn tool_args_invalid(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ToolArgsInvalid {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Create a tool-timeout error
    pub fn tool_timeout(tool: impl Into<String>) -> Self {
        Error::ToolTimeout(tool.into())
    }

    /// Create a tool-execution error
    pub fn tool_execution_error(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ToolExecutionError {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Create a host-dead error
    pub fn host_dead(host: impl Into<String>) -> Self {
        Error::HostDead(host.into())
    }

    /// Create an iteration-limit-exceeded error
    pub fn iteration_limit_exceeded(turns: usize) -> Self {
        Error::IterationLimitExceeded(turns)
    }

    /// Create an invariant-violated error
    pub fn invariant_violated(msg: impl Into<String>) -> Self {
        Error::InternalInvariantViolated(msg.into())
    }

    /// Whether this error should be fed back to the model as an in-band
    /// tool-role message (recovered locally) rather than surfaced as a
    /// terminal `error` frame. Per spec §7: tool-level errors recover,
    /// provider/invariant/limit errors surface.
    pub fn is_recoverable_in_loop(&self) -> bool {
        matches!(
            self,
            Error::ToolNotFound(_)
                | Error::ToolArgsInvalid { .. }
                | Error::ToolTimeout(_)
                | Error::ToolExecutionError { .. }
                | Error::HostDead(_)
        )
    }
}
