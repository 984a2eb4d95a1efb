//! # Configuration for the Chat Orchestrator
//!
//! Resolves the configuration table from spec §6 using the same
//! environment-variable-first, explicit-fallback-second strategy the
//! teacher SDK used for a single base URL/model pair, generalized to every
//! orchestrator setting.
//!
//! ## Environment Variables
//!
//! All keys are namespaced `ORCHESTRATOR_<KEY>`, e.g. `ORCHESTRATOR_MODEL`,
//! `ORCHESTRATOR_MAX_TOOL_TURNS`. See [`OrchestratorConfig`] for the full set.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// PROVIDER KIND (factory selector)
// ============================================================================

/// Which `Provider` variant the factory should construct for a given
/// configuration name. One local, in-process companion server plus three
/// hosted REST vendors, all speaking the same OpenAI-compatible wire
/// protocol (see `providers::wire`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// A long-running local companion process (LM Studio/Ollama/llama.cpp-style),
    /// additionally understands the `images[]` multimodal side-channel.
    LocalInference,
    /// First hosted REST vendor.
    HostedA,
    /// Second hosted REST vendor.
    HostedB,
    /// Third hosted REST vendor.
    HostedC,
}

impl ProviderKind {
    /// Default base URL for this provider kind.
    pub fn default_url(&self) -> &'static str {
        match self {
            ProviderKind::LocalInference => "http://localhost:1234/v1",
            ProviderKind::HostedA => "https://api.hosted-a.example.com/v1",
            ProviderKind::HostedB => "https://api.hosted-b.example.com/v1",
            ProviderKind::HostedC => "https://api.hosted-c.example.com/v1",
        }
    }

    /// Whether this provider variant serves a vision-capable model by
    /// default (used by the intent classifier's media bypass, §4.5).
    pub fn has_vision_model(&self) -> bool {
        matches!(self, ProviderKind::LocalInference | ProviderKind::HostedA)
    }

    /// The bearer-auth header name this vendor expects. Hosted providers
    /// all use `Authorization`; the local companion process needs none but
    /// we keep the method uniform across variants.
    pub fn auth_header(&self) -> Option<&'static str> {
        match self {
            ProviderKind::LocalInference => None,
            _ => Some("Authorization"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    /// Case-insensitive, multiple-alias parsing, following the teacher's
    /// `Provider::from_str` convention.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "local-inference" | "local_inference" | "localinference" => {
                Ok(ProviderKind::LocalInference)
            }
            "hosted-a" | "hosted_a" | "hosteda" => Ok(ProviderKind::HostedA),
            "hosted-b" | "hosted_b" | "hostedb" => Ok(ProviderKind::HostedB),
            "hosted-c" | "hosted_c" | "hostedc" => Ok(ProviderKind::HostedC),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

// ============================================================================
// CONFIGURATION HELPER FUNCTIONS (generalized from the teacher's get_base_url/get_model)
// ============================================================================

/// Resolve a provider's base URL.
///
/// Priority: `ORCHESTRATOR_BASE_URL` env var > provider kind's default URL >
/// explicit fallback > `ProviderKind::LocalInference`'s default.
pub fn get_base_url(provider: Option<ProviderKind>, fallback: Option<&str>) -> String {
    if let Ok(url) = env::var("ORCHESTRATOR_BASE_URL") {
        return url;
    }
    if let Some(p) = provider {
        return p.default_url().to_string();
    }
    fallback
        .unwrap_or(ProviderKind::LocalInference.default_url())
        .to_string()
}

/// Resolve a model name, optionally preferring the `ORCHESTRATOR_MODEL`
/// environment variable ahead of an explicit fallback.
pub fn get_model(fallback: Option<&str>, prefer_env: bool) -> Option<String> {
    if prefer_env {
        if let Ok(model) = env::var("ORCHESTRATOR_MODEL") {
            return Some(model);
        }
    }
    fallback.map(|s| s.to_string())
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_string_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

// ============================================================================
// ORCHESTRATOR CONFIG (spec §6 configuration table)
// ============================================================================

/// The full configuration table from spec §6, each field resolvable from
/// its `ORCHESTRATOR_<KEY>` environment variable with a builder-settable
/// default, mirroring the teacher's `AgentOptions`/`AgentOptionsBuilder`
/// fluent-validating style.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// `DEFAULT_PROVIDER` — which provider variant the factory returns by default.
    pub default_provider: ProviderKind,
    /// `MODEL` — model id for chat completions.
    pub model: String,
    /// `VISION_MODEL` — model id auto-selected when image attachments are present.
    pub vision_model: String,
    /// `EMBEDDING_MODEL` — local embedding model id (cold memory).
    pub embedding_model: String,
    /// `MAX_TOOL_TURNS` — reasoning-loop iteration ceiling.
    pub max_tool_turns: usize,
    /// `HOT_WINDOW_SIZE` — N for the sliding window.
    pub hot_window_size: usize,
    /// `SUMMARY_THRESHOLD` — delta messages before warm summary refresh.
    pub summary_threshold: usize,
    /// `TOOL_ALLOWLIST` — static set of admitted tool names (≤15).
    pub tool_allowlist: Vec<String>,
    /// `TOOL_FILTER_MAX` — upper bound on tools exposed per turn.
    pub tool_filter_max: usize,
    /// `TOOL_TIMEOUT_MS` — per-tool-call deadline.
    pub tool_timeout: Duration,
    /// `LLM_TIMEOUT_MS` — per-iteration LLM call deadline.
    pub llm_timeout: Duration,
    /// `TURN_TIMEOUT_MS` — whole-turn ceiling.
    pub turn_timeout: Duration,
    /// Cap, in bytes, on a tool result's stringified content before truncation.
    pub tool_result_truncation_cap: usize,
    /// Top-K for cold memory similarity retrieval.
    pub cold_retrieval_k: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            default_provider: ProviderKind::LocalInference,
            model: env_string_or("ORCHESTRATOR_MODEL", "local-default"),
            vision_model: env_string_or("ORCHESTRATOR_VISION_MODEL", "local-vision-default"),
            embedding_model: env_string_or("ORCHESTRATOR_EMBEDDING_MODEL", "local-embedding-default"),
            max_tool_turns: env_or("ORCHESTRATOR_MAX_TOOL_TURNS", 5),
            hot_window_size: env_or("ORCHESTRATOR_HOT_WINDOW_SIZE", 50),
            summary_threshold: env_or("ORCHESTRATOR_SUMMARY_THRESHOLD", 20),
            tool_allowlist: Vec::new(),
            tool_filter_max: env_or("ORCHESTRATOR_TOOL_FILTER_MAX", 5),
            tool_timeout: Duration::from_millis(env_or("ORCHESTRATOR_TOOL_TIMEOUT_MS", 30_000)),
            llm_timeout: Duration::from_millis(env_or("ORCHESTRATOR_LLM_TIMEOUT_MS", 120_000)),
            turn_timeout: Duration::from_millis(env_or("ORCHESTRATOR_TURN_TIMEOUT_MS", 600_000)),
            tool_result_truncation_cap: env_or("ORCHESTRATOR_TOOL_RESULT_CAP", 8_000),
            cold_retrieval_k: env_or("ORCHESTRATOR_COLD_RETRIEVAL_K", 5),
        }
    }
}

impl OrchestratorConfig {
    /// Start a builder seeded with environment-resolved defaults.
    pub fn builder() -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder::new()
    }

    fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::config("model must not be empty"));
        }
        if self.max_tool_turns == 0 {
            return Err(Error::config("max_tool_turns must be at least 1"));
        }
        if self.hot_window_size == 0 {
            return Err(Error::config("hot_window_size must be at least 1"));
        }
        if self.tool_allowlist.len() > 15 {
            return Err(Error::config(format!(
                "tool_allowlist must contain at most 15 entries, got {}",
                self.tool_allowlist.len()
            )));
        }
        if self.tool_filter_max == 0 {
            return Err(Error::config("tool_filter_max must be at least 1"));
        }
        Ok(())
    }
}

/// Fluent builder for [`OrchestratorConfig`], following the teacher's
/// `AgentOptionsBuilder` pattern (`build()` validates and returns `Result`).
#[derive(Debug, Clone)]
pub struct OrchestratorConfigBuilder {
    config: OrchestratorConfig,
}

impl OrchestratorConfigBuilder {
    pub fn new() -> Self {
        OrchestratorConfigBuilder {
            config: OrchestratorConfig::default(),
        }
    }

    pub fn default_provider(mut self, provider: ProviderKind) -> Self {
        self.config.default_provider = provider;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn vision_model(mut self, model: impl Into<String>) -> Self {
        self.config.vision_model = model.into();
        self
    }

    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.config.embedding_model = model.into();
        self
    }

    pub fn max_tool_turns(mut self, n: usize) -> Self {
        self.config.max_tool_turns = n;
        self
    }

    pub fn hot_window_size(mut self, n: usize) -> Self {
        self.config.hot_window_size = n;
        self
    }

    pub fn summary_threshold(mut self, n: usize) -> Self {
        self.config.summary_threshold = n;
        self
    }

    pub fn tool_allowlist(mut self, names: Vec<String>) -> Self {
        self.config.tool_allowlist = names;
        self
    }

    pub fn tool_filter_max(mut self, n: usize) -> Self {
        self.config.tool_filter_max = n;
        self
    }

    pub fn tool_timeout(mut self, d: Duration) -> Self {
        self.config.tool_timeout = d;
        self
    }

    pub fn llm_timeout(mut self, d: Duration) -> Self {
        self.config.llm_timeout = d;
        self
    }

    pub fn turn_timeout(mut self, d: Duration) -> Self {
        self.config.turn_timeout = d;
        self
    }

    /// Validate and produce the final config.
    pub fn build(self) -> Result<OrchestratorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for OrchestratorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_default_urls() {
        assert_eq!(
            ProviderKind::LocalInference.default_url(),
            "http://localhost:1234/v1"
        );
        assert!(ProviderKind::HostedA.default_url().starts_with("https://"));
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("local".parse::<ProviderKind>(), Ok(ProviderKind::LocalInference));
        assert_eq!("Hosted-A".parse::<ProviderKind>(), Ok(ProviderKind::HostedA));
        assert_eq!("hosted_b".parse::<ProviderKind>(), Ok(ProviderKind::HostedB));
        assert_eq!("HOSTEDC".parse::<ProviderKind>(), Ok(ProviderKind::HostedC));
        assert!("unknown".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_vision_capability() {
        assert!(ProviderKind::LocalInference.has_vision_model());
        assert!(ProviderKind::HostedA.has_vision_model());
        assert!(!ProviderKind::HostedB.has_vision_model());
    }

    #[test]
    fn test_get_base_url_with_provider() {
        unsafe {
            env::remove_var("ORCHESTRATOR_BASE_URL");
        }
        let url = get_base_url(Some(ProviderKind::HostedA), None);
        assert_eq!(url, ProviderKind::HostedA.default_url());
    }

    #[test]
    fn test_get_base_url_with_fallback() {
        unsafe {
            env::remove_var("ORCHESTRATOR_BASE_URL");
        }
        let url = get_base_url(None, Some("http://custom:8080/v1"));
        assert_eq!(url, "http://custom:8080/v1");
    }

    #[test]
    fn test_default_config_passes_validation() {
        let cfg = OrchestratorConfig::builder().build().unwrap();
        assert_eq!(cfg.max_tool_turns, 5);
        assert_eq!(cfg.hot_window_size, 50);
        assert_eq!(cfg.summary_threshold, 20);
        assert_eq!(cfg.tool_filter_max, 5);
    }

    #[test]
    fn test_builder_overrides() {
        let cfg = OrchestratorConfig::builder()
            .model("qwen2.5-32b")
            .max_tool_turns(3)
            .hot_window_size(10)
            .build()
            .unwrap();
        assert_eq!(cfg.model, "qwen2.5-32b");
        assert_eq!(cfg.max_tool_turns, 3);
        assert_eq!(cfg.hot_window_size, 10);
    }

    #[test]
    fn test_empty_model_rejected() {
        let err = OrchestratorConfig::builder().model("").build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_max_tool_turns_rejected() {
        let err = OrchestratorConfig::builder()
            .max_tool_turns(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_oversized_allowlist_rejected() {
        let names: Vec<String> = (0..16).map(|i| format!("tool_{i}")).collect();
        let err = OrchestratorConfig::builder()
            .tool_allowlist(names)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
