//! Profile record sources for EduPilot.
//!
//! Every backend implements `edupilot_core::ProfileStore`. The gateway reaches
//! them through a [`StoreClient`], which constructs the configured backend
//! at most once per process.

pub mod client;
pub mod file_backend;
pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use client::StoreClient;
pub use file_backend::FileProfileStore;
pub use in_memory::InMemoryProfileStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteProfileStore;
