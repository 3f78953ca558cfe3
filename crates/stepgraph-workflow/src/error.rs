use stepgraph_config::StepType;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
  #[error("steps of type '{0}' cannot be created or assigned")]
  InvalidStepType(StepType),

  #[error("step cannot be deleted: {step_id}")]
  StepNotDeletable { step_id: String },

  #[error("step not found: {0}")]
  UnknownStep(String),

  #[error("step cannot connect to itself: {step_id}")]
  SelfLoop { step_id: String },

  #[error("connection already exists: from={from}, to={to}")]
  DuplicateConnection { from: String, to: String },

  #[error("step '{step_id}' is of type '{expected}', got configuration for '{found}'")]
  StepTypeMismatch {
    step_id: String,
    expected: StepType,
    found: StepType,
  },
}
