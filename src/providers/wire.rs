//! OpenAI-compatible wire format, shared by every `Provider` variant.
//!
//! Adapted from the teacher SDK's single-vendor `src/types.rs` OpenAI
//! structs: LM Studio/Ollama/llama.cpp/vLLM were already one wire format
//! differing only by base URL, so `LocalInferenceProvider` and
//! `HostedProviderA/B/C` (spec §4.1) share this module and differ only in
//! base URL, auth header and declared capabilities (see `providers::mod`).

use serde::{Deserialize, Serialize};

/// OpenAI content format: plain text, or an array of parts for multimodal
/// messages (the local provider's `images[]` side-channel, spec §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpenAiContent {
    Text(String),
    Parts(Vec<OpenAiContentPart>),
}

impl OpenAiContent {
    pub fn text(text: impl Into<String>) -> Self {
        OpenAiContent::Text(text.into())
    }
}

/// A single content part: text or an image URL/data-URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpenAiContentPart {
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: OpenAiImageUrl },
}

impl OpenAiContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        OpenAiContentPart::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>, detail: impl Into<String>) -> Self {
        OpenAiContentPart::ImageUrl {
            image_url: OpenAiImageUrl {
                url: url.into(),
                detail: Some(detail.into()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiImageUrl {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A single request message in OpenAI wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<OpenAiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl OpenAiMessage {
    pub fn system(text: impl Into<String>) -> Self {
        OpenAiMessage {
            role: "system".to_string(),
            content: Some(OpenAiContent::text(text)),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        OpenAiMessage {
            role: "user".to_string(),
            content: Some(OpenAiContent::text(text)),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user_with_images(text: impl Into<String>, image_urls: &[String]) -> Self {
        let mut parts = vec![OpenAiContentPart::text(text)];
        parts.extend(
            image_urls
                .iter()
                .map(|url| OpenAiContentPart::image_url(url.clone(), "auto")),
        );
        OpenAiMessage {
            role: "user".to_string(),
            content: Some(OpenAiContent::Parts(parts)),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant(text: impl Into<String>, tool_calls: Option<Vec<OpenAiToolCall>>) -> Self {
        OpenAiMessage {
            role: "assistant".to_string(),
            content: Some(OpenAiContent::text(text)),
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        OpenAiMessage {
            role: "tool".to_string(),
            content: Some(OpenAiContent::text(content)),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: OpenAiFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiFunction {
    pub name: String,
    /// JSON-encoded arguments string (OpenAI API quirk — must be parsed).
    pub arguments: String,
}

/// Request payload for the chat completions endpoint, used both for
/// `complete` (stream: false) and `stream` (stream: true).
#[derive(Debug, Clone, Serialize)]
pub struct OpenAiRequest {
    pub model: String,
    pub messages: Vec<OpenAiMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<serde_json::Value>>,
}

/// A single chunk from a streaming chat completions response.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChunk {
    #[allow(dead_code)]
    pub id: String,
    #[allow(dead_code)]
    pub object: String,
    #[allow(dead_code)]
    pub created: i64,
    #[allow(dead_code)]
    pub model: String,
    pub choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChoice {
    #[allow(dead_code)]
    pub index: u32,
    pub delta: OpenAiDelta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiDelta {
    #[allow(dead_code)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OpenAiToolCallDelta>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiToolCallDelta {
    pub index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[allow(dead_code)]
    #[serde(skip_serializing_if = "Option::is_none", rename = "type")]
    pub call_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<OpenAiFunctionDelta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiFunctionDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// Non-streaming completion response, used by the intent classifier and
/// the warm-memory summarizer (spec §4.4, §4.5).
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiCompletion {
    pub choices: Vec<OpenAiCompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiCompletionChoice {
    pub message: OpenAiCompletionMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiCompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors_serialize_role() {
        let sys = OpenAiMessage::system("be helpful");
        assert_eq!(sys.role, "system");
        let tool = OpenAiMessage::tool("t1", "result");
        assert_eq!(tool.tool_call_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_user_with_images_builds_parts() {
        let msg = OpenAiMessage::user_with_images(
            "what is this?",
            &["data:image/png;base64,xyz".to_string()],
        );
        match msg.content.unwrap() {
            OpenAiContent::Parts(parts) => assert_eq!(parts.len(), 2),
            _ => panic!("expected parts"),
        }
    }

    #[test]
    fn test_request_omits_none_fields() {
        let req = OpenAiRequest {
            model: "m".to_string(),
            messages: vec![],
            stream: true,
            max_tokens: None,
            temperature: None,
            tools: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("tools").is_none());
    }
}
