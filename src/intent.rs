//! Intent Classifier (spec §4.5) — one cheap `provider.complete` call that
//! returns `INTENT:`/`COMPLEXITY:` lines, parsed tolerantly.
//!
//! Grounded on the teacher's `client.rs::query()` for the single-shot
//! completion call, and on `context.rs`'s tolerant-parsing posture (never
//! panics on malformed model output, always falls back to a default).

use std::sync::Arc;

use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;
use crate::providers::Provider;
use crate::types::Message;

/// Scope label. `Other` carries whatever the model said verbatim so new
/// scopes don't require a code change to be recognized, only to be acted
/// on (spec §4.5 `{GENERAL|FILESYSTEM|GIT|FETCH|...}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    General,
    Filesystem,
    Git,
    Fetch,
    Other(String),
}

impl Intent {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "GENERAL" => Intent::General,
            "FILESYSTEM" => Intent::Filesystem,
            "GIT" => Intent::Git,
            "FETCH" => Intent::Fetch,
            other if other.is_empty() => Intent::General,
            other => Intent::Other(other.to_string()),
        }
    }

    /// The bucket name used to look up keywords in `ToolRegistry`'s
    /// keyword table (spec §4.3); `Other` scopes pass their raw label
    /// through unchanged.
    pub fn as_keyword_bucket(&self) -> &str {
        match self {
            Intent::General => "GENERAL",
            Intent::Filesystem => "CODE",
            Intent::Git => "CODE",
            Intent::Fetch => "RESEARCH",
            Intent::Other(s) => s.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    Simple,
    Complex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    pub complexity: Complexity,
}

impl Classification {
    fn default_fallback() -> Self {
        Classification {
            intent: Intent::General,
            complexity: Complexity::Simple,
        }
    }
}

fn intent_line_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"(?im)^\s*INTENT:\s*([A-Za-z]+)\s*$").unwrap())
}

fn complexity_line_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"(?im)^\s*COMPLEXITY:\s*([A-Za-z]+)\s*$").unwrap())
}

const CLASSIFIER_PROMPT: &str = "Classify the user's most recent message. Respond with exactly \
two lines and nothing else:\nINTENT: <GENERAL|FILESYSTEM|GIT|FETCH>\nCOMPLEXITY: <SIMPLE|COMPLEX>";

pub struct IntentClassifier {
    provider: Arc<dyn Provider>,
    model: Option<String>,
}

impl IntentClassifier {
    pub fn new(provider: Arc<dyn Provider>, model: Option<String>) -> Self {
        IntentClassifier { provider, model }
    }

    /// Classify `turn`. `has_media_attachments` short-circuits the LLM
    /// call entirely and forces `(GENERAL, SIMPLE)` (spec §4.5 media
    /// bypass — vision-model selection happens in the caller).
    pub async fn classify(&self, turn: &Message, has_media_attachments: bool) -> Result<Classification> {
        if has_media_attachments {
            return Ok(Classification::default_fallback());
        }

        let prompt = Message::user(
            turn.conversation_id,
            format!("{CLASSIFIER_PROMPT}\n\nMessage: {}", turn.content),
        );
        let raw = self
            .provider
            .complete(&[prompt], self.model.as_deref(), Some(0.0))
            .await?;

        Ok(Self::parse_response(&raw))
    }

    fn parse_response(raw: &str) -> Classification {
        let intent = intent_line_regex()
            .captures(raw)
            .map(|c| Intent::parse(&c[1]))
            .unwrap_or(Intent::General);

        let complexity = complexity_line_regex()
            .captures(raw)
            .and_then(|c| match c[1].trim().to_uppercase().as_str() {
                "SIMPLE" => Some(Complexity::Simple),
                "COMPLEX" => Some(Complexity::Complex),
                _ => None,
            })
            .unwrap_or(Complexity::Simple);

        Classification { intent, complexity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ChunkStream;
    use crate::types::ToolSchema;
    use async_trait::async_trait;
    use uuid::Uuid;

    struct StubProvider {
        reply: String,
    }

    #[async_trait]
    impl Provider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }
        fn has_vision_model(&self) -> bool {
            false
        }
        async fn complete(&self, _m: &[Message], _model: Option<&str>, _t: Option<f32>) -> Result<String> {
            Ok(self.reply.clone())
        }
        async fn stream(
            &self,
            _m: &[Message],
            _model: Option<&str>,
            _t: Option<f32>,
            _tools: &[ToolSchema],
        ) -> Result<ChunkStream> {
            unimplemented!("not exercised by classifier tests")
        }
        async fn health_check(&self) -> bool {
            true
        }
    }

    fn turn(content: &str) -> Message {
        Message::user(Uuid::new_v4(), content)
    }

    #[tokio::test]
    async fn test_classify_parses_well_formed_response() {
        let provider = Arc::new(StubProvider {
            reply: "INTENT: FILESYSTEM\nCOMPLEXITY: COMPLEX\n".to_string(),
        });
        let classifier = IntentClassifier::new(provider, None);
        let result = classifier.classify(&turn("list my files"), false).await.unwrap();
        assert_eq!(result.intent, Intent::Filesystem);
        assert_eq!(result.complexity, Complexity::Complex);
    }

    #[tokio::test]
    async fn test_classify_is_case_and_whitespace_tolerant() {
        let provider = Arc::new(StubProvider {
            reply: "  intent:   git  \n   complexity:simple".to_string(),
        });
        let classifier = IntentClassifier::new(provider, None);
        let result = classifier.classify(&turn("git log"), false).await.unwrap();
        assert_eq!(result.intent, Intent::Git);
        assert_eq!(result.complexity, Complexity::Simple);
    }

    #[tokio::test]
    async fn test_classify_falls_back_on_unparseable_output() {
        let provider = Arc::new(StubProvider {
            reply: "I am not sure what you mean.".to_string(),
        });
        let classifier = IntentClassifier::new(provider, None);
        let result = classifier.classify(&turn("hi"), false).await.unwrap();
        assert_eq!(result.intent, Intent::General);
        assert_eq!(result.complexity, Complexity::Simple);
    }

    #[tokio::test]
    async fn test_classify_bypasses_llm_for_media_attachments() {
        let provider = Arc::new(StubProvider {
            reply: "INTENT: FETCH\nCOMPLEXITY: COMPLEX".to_string(),
        });
        let classifier = IntentClassifier::new(provider, None);
        let result = classifier.classify(&turn("describe this image"), true).await.unwrap();
        assert_eq!(result.intent, Intent::General);
        assert_eq!(result.complexity, Complexity::Simple);
    }
}
