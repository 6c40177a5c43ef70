//! Request pipeline and its per-request phase machine.

use crate::completion::CompletionGateway;
use crate::context::ContextSnapshot;
use crate::history::{HistoryPolicy, normalize_with};
use crate::prompt::compose;
use edupilot_config::AppConfig;
use edupilot_core::error::ChatError;
use edupilot_core::message::ConversationTurn;
use edupilot_core::provider::Provider;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a single chat request currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatPhase {
    Idle,
    Building,
    Composing,
    AwaitingModel,
    Completed,
    Failed,
}

impl ChatPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, ChatPhase::Completed | ChatPhase::Failed)
    }

    /// Forward-only: each phase has one successor, and any non-terminal
    /// phase may fail.
    pub fn can_transition_to(self, next: ChatPhase) -> bool {
        use ChatPhase::*;
        match (self, next) {
            (Idle, Building)
            | (Building, Composing)
            | (Composing, AwaitingModel)
            | (AwaitingModel, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Records the phases one request passes through.
struct PhaseTracker {
    current: ChatPhase,
    visited: Vec<ChatPhase>,
}

impl PhaseTracker {
    fn new() -> Self {
        Self {
            current: ChatPhase::Idle,
            visited: vec![ChatPhase::Idle],
        }
    }

    fn advance(&mut self, next: ChatPhase) {
        debug_assert!(
            self.current.can_transition_to(next),
            "illegal phase transition {:?} -> {:?}",
            self.current,
            next
        );
        debug!(from = ?self.current, to = ?next, "Chat phase");
        self.current = next;
        self.visited.push(next);
    }

    fn fail(mut self, err: ChatError) -> ChatOutcome {
        self.advance(ChatPhase::Failed);
        ChatOutcome {
            result: Err(err),
            phases: self.visited,
        }
    }

    fn complete(mut self, text: String) -> ChatOutcome {
        self.advance(ChatPhase::Completed);
        ChatOutcome {
            result: Ok(text),
            phases: self.visited,
        }
    }
}

/// Academic data attached to a request.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextInput {
    /// A record supplied by the caller or read from the profile store.
    Raw(serde_json::Value),
    /// A record was asked for but could not be obtained. Rendered as the
    /// placeholder snapshot.
    Unavailable,
}

impl ContextInput {
    pub fn snapshot(&self) -> ContextSnapshot {
        match self {
            ContextInput::Raw(raw) => ContextSnapshot::build(raw),
            ContextInput::Unavailable => ContextSnapshot::placeholder(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<ConversationTurn>,
    /// `None` sends the pending turn without a context block.
    pub context: Option<ContextInput>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ConversationTurn>) -> Self {
        Self {
            messages,
            context: None,
        }
    }

    pub fn with_context(mut self, context: ContextInput) -> Self {
        self.context = Some(context);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub result: Result<String, ChatError>,
    /// Every phase visited, starting at `Idle` and ending in a terminal phase.
    pub phases: Vec<ChatPhase>,
}

impl ChatOutcome {
    pub fn into_result(self) -> Result<String, ChatError> {
        self.result
    }

    pub fn final_phase(&self) -> ChatPhase {
        self.phases.last().copied().unwrap_or(ChatPhase::Idle)
    }
}

/// Runs chat requests end to end. Holds no per-request state, so one
/// instance is shared across all requests.
pub struct ChatPipeline {
    gateway: CompletionGateway,
    policy: HistoryPolicy,
}

impl ChatPipeline {
    pub fn new(gateway: CompletionGateway) -> Self {
        Self {
            gateway,
            policy: HistoryPolicy::default(),
        }
    }

    pub fn with_history_policy(mut self, policy: HistoryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build a pipeline from the loaded config: model, sampling settings,
    /// instruction override and history policy.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        let mut gateway = CompletionGateway::new(provider, config.active_model())
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens);
        if let Some(instruction) = &config.assistant.system_instruction_override {
            gateway = gateway.with_system_instruction(instruction.clone());
        }

        let policy = if config.assistant.strict_history {
            HistoryPolicy::Strict
        } else {
            HistoryPolicy::Lenient
        };

        Self::new(gateway).with_history_policy(policy)
    }

    pub fn gateway(&self) -> &CompletionGateway {
        &self.gateway
    }

    pub fn history_policy(&self) -> HistoryPolicy {
        self.policy
    }

    /// Run one request. Empty histories fail before any work is done and
    /// never reach the model.
    pub async fn run(&self, request: ChatRequest) -> ChatOutcome {
        let mut tracker = PhaseTracker::new();

        if request.messages.is_empty() {
            warn!("Rejected chat request with no messages");
            return tracker.fail(ChatError::NoMessages);
        }

        tracker.advance(ChatPhase::Building);
        let snapshot = request.context.as_ref().map(ContextInput::snapshot);
        let rendered = match normalize_with(&request.messages, self.policy) {
            Ok(rendered) => rendered,
            Err(e) => return tracker.fail(e),
        };

        tracker.advance(ChatPhase::Composing);
        let prompt = compose(snapshot.as_ref(), &rendered);

        tracker.advance(ChatPhase::AwaitingModel);
        info!(
            turns = request.messages.len(),
            with_context = snapshot.is_some(),
            provider = %self.gateway.provider_name(),
            model = %self.gateway.model(),
            "Sending chat request"
        );

        match self.gateway.send(&rendered.transcript, &prompt).await {
            Ok(text) => tracker.complete(text),
            Err(e) => tracker.fail(e),
        }
    }
}
