use stepgraph_workflow::Violation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
  #[error("unsupported document version {found} (newest supported is {supported})")]
  UnsupportedVersion { found: u64, supported: u32 },

  #[error("workflow is invalid: {}", format_violations(.0))]
  InvalidWorkflow(Vec<Violation>),

  #[error("malformed step '{step_id}': {message}")]
  MalformedStep { step_id: String, message: String },

  #[error("duplicate step id: {0}")]
  DuplicateStepId(String),

  #[error("duplicate connection id: {0}")]
  DuplicateConnectionId(String),

  #[error("malformed document: {0}")]
  Json(#[from] serde_json::Error),
}

impl CodecError {
  /// Violations carried by an [`CodecError::InvalidWorkflow`] error.
  pub fn violations(&self) -> Option<&[Violation]> {
    match self {
      CodecError::InvalidWorkflow(violations) => Some(violations),
      _ => None,
    }
  }
}

fn format_violations(violations: &[Violation]) -> String {
  violations
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join("; ")
}
