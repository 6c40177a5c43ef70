//! The contextual chat pipeline at the heart of EduPilot.
//!
//! Every request runs the same single-shot path:
//!
//! 0. **Resolve** the context source: inline data or the profile store
//! 1. **Validate** the client-held turn list (empty lists never go upstream)
//! 2. **Build** a fixed-shape context snapshot from the profile record
//! 3. **Normalize** the history into a transcript plus the pending user turn
//! 4. **Compose** the context block and pending turn into one prompt
//! 5. **Complete** with one call to the hosted model
//!
//! Nothing is cached or shared between requests; each run owns its state.

pub mod completion;
pub mod context;
pub mod history;
pub mod pipeline;
pub mod prompt;
pub mod source;

pub use completion::{CompletionGateway, DEFAULT_SYSTEM_INSTRUCTION};
pub use context::{ContextSnapshot, FieldValue, SubjectScore};
pub use history::{HistoryPolicy, normalize, normalize_with};
pub use pipeline::{ChatOutcome, ChatPhase, ChatPipeline, ChatRequest, ContextInput};
pub use prompt::compose;
pub use source::resolve_context;
