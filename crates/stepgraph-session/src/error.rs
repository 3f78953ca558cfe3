use stepgraph_codec::CodecError;
use stepgraph_workflow::{GraphError, Violation};

/// Errors that can occur during an editing session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
  /// A graph edit was rejected. The session's graph is unchanged.
  #[error(transparent)]
  Graph(#[from] GraphError),

  /// The graph has violations and was not handed to the store.
  #[error("workflow has {} violation(s)", .0.len())]
  Invalid(Vec<Violation>),

  /// The stored document could not be decoded.
  #[error("failed to load workflow '{workflow_id}'")]
  Load {
    workflow_id: String,
    #[source]
    source: CodecError,
  },

  /// No document is stored for the workflow.
  #[error("workflow not found: {0}")]
  NotFound(String),

  #[error(transparent)]
  Store(#[from] stepgraph_store::Error),

  /// The store rejected the latest save.
  #[error("failed to save revision {revision}: {message}")]
  SaveFailed { revision: u64, message: String },

  /// The save worker is no longer running.
  #[error("save worker stopped")]
  WorkerStopped,
}
