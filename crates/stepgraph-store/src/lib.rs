//! Stepgraph Store
//!
//! This crate provides the storage trait and implementations for persisted
//! workflow documents.
//!
//! Saves have replace semantics: each call hands over the full document, which
//! supersedes whatever was stored before. Documents are returned as raw JSON so
//! that readers can check the version marker before interpreting the rest.

mod memory;
mod sqlite;
mod types;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use types::{StoredWorkflow, WorkflowSummary};

use async_trait::async_trait;
use stepgraph_config::WorkflowDocument;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The requested record was not found.
  #[error("not found: {0}")]
  NotFound(String),

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  /// Running migrations failed.
  #[error("migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  /// A document could not be converted to or from JSON.
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Storage trait for workflow documents.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
  /// Load the stored document for a workflow, if any.
  async fn load(&self, workflow_id: &str) -> Result<Option<StoredWorkflow>, Error>;

  /// Store the full document for a workflow, replacing any previous one.
  async fn save(&self, workflow_id: &str, document: &WorkflowDocument) -> Result<(), Error>;

  /// List stored workflows, most recently updated first.
  async fn list(&self) -> Result<Vec<WorkflowSummary>, Error>;

  /// Delete a stored workflow.
  async fn delete(&self, workflow_id: &str) -> Result<(), Error>;
}
