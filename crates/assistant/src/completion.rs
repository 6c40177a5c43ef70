//! Completion gateway: owns the single outbound call to the hosted model.
//!
//! One request, one awaited response. Failures are converted to
//! `ChatError::Upstream` here and never retried.

use edupilot_core::error::ChatError;
use edupilot_core::message::TranscriptEntry;
use edupilot_core::provider::{CompletionRequest, Provider};
use std::sync::Arc;
use tracing::{debug, warn};

/// Formatting and tone rules sent as the system instruction on every call.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "\
You are the academic assistant of a school dashboard. Follow these rules without exception:
1. Structure every answer as bullet points.
2. Start each section with a bold heading, for example **Attendance**.
3. Keep an objective, factual tone. Do not use emotional, motivational or judgemental language.
4. Never fabricate information. Use only facts present in the [CURRENT CONTEXT DATA] block and the conversation; if a fact is not there, say it is not available.";

pub struct CompletionGateway {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    system_instruction: String,
}

impl CompletionGateway {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.2,
            max_tokens: None,
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Replace the built-in system instruction.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Send the transcript as prior turns and `prompt` as the final turn.
    /// Returns the model's full text.
    pub async fn send(
        &self,
        transcript: &[TranscriptEntry],
        prompt: &str,
    ) -> Result<String, ChatError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            system_instruction: Some(self.system_instruction.clone()),
            transcript: transcript.to_vec(),
            prompt: prompt.to_string(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        match self.provider.complete(request).await {
            Ok(response) => {
                debug!(
                    provider = %self.provider.name(),
                    model = %response.model,
                    total_tokens = response.usage.as_ref().map(|u| u.total_tokens),
                    "Completion received"
                );
                Ok(response.text)
            }
            Err(e) => {
                warn!(provider = %self.provider.name(), error = %e, "Completion failed");
                Err(e.into())
            }
        }
    }
}
