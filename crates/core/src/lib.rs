//! # EduPilot Core
//!
//! Domain types, traits, and error definitions for the EduPilot contextual
//! assistant. This crate has **zero framework dependencies**; it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The two external collaborators of the chat pipeline (the hosted completion
//! service and the profile document store) are defined as traits here.
//! Implementations live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod profile;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{ChatError, ErrorKind, ProviderError, StoreError};
pub use message::{ConversationTurn, RenderedHistory, Speaker, TranscriptEntry, TurnRole};
pub use profile::ProfileStore;
pub use provider::{CompletionRequest, CompletionResponse, Provider, Usage};
