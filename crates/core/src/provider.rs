//! Provider trait: the abstraction over hosted completion services.
//!
//! A Provider takes a system instruction, a prior-turn transcript and one
//! final prompt, and returns one complete text response. There is no
//! streaming: the caller awaits a single result.
//!
//! Implementations: Gemini (native), OpenAI-compatible endpoints.

use crate::error::ProviderError;
use crate::message::TranscriptEntry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "gemini-2.0-flash")
    pub model: String,

    /// Fixed instruction governing format and tone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,

    /// Prior turns, oldest first
    #[serde(default)]
    pub transcript: Vec<TranscriptEntry>,

    /// The final user turn (context block + pending user text)
    pub prompt: String,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.2
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The full generated text
    pub text: String,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// The completion gateway calls `complete()` without knowing which backend
/// is being used.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "gemini", "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Speaker;

    struct EchoProvider;

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            Ok(CompletionResponse {
                text: request.prompt,
                usage: None,
                model: request.model,
            })
        }
    }

    #[test]
    fn request_defaults_from_json() {
        let req: CompletionRequest =
            serde_json::from_str(r#"{"model":"gemini-2.0-flash","prompt":"Hi"}"#).unwrap();
        assert!((req.temperature - 0.2).abs() < f32::EPSILON);
        assert!(req.transcript.is_empty());
        assert!(req.system_instruction.is_none());
    }

    #[test]
    fn transcript_serializes_speakers() {
        let req = CompletionRequest {
            model: "m".into(),
            system_instruction: None,
            transcript: vec![TranscriptEntry {
                speaker: Speaker::Model,
                text: "Hello".into(),
            }],
            prompt: "Hi".into(),
            temperature: 0.2,
            max_tokens: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""speaker":"model""#));
        assert!(!json.contains("system_instruction"));
    }

    #[tokio::test]
    async fn default_health_check_is_ok() {
        let provider = EchoProvider;
        assert!(provider.health_check().await.unwrap());
        let resp = provider
            .complete(CompletionRequest {
                model: "m".into(),
                system_instruction: None,
                transcript: vec![],
                prompt: "ping".into(),
                temperature: 0.0,
                max_tokens: None,
            })
            .await
            .unwrap();
        assert_eq!(resp.text, "ping");
    }
}
