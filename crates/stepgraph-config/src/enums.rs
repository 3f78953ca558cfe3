use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of step types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepType {
  Submitted,
  Approval,
  Fulfillment,
}

impl StepType {
  pub fn as_str(&self) -> &'static str {
    match self {
      StepType::Submitted => "submitted",
      StepType::Approval => "approval",
      StepType::Fulfillment => "fulfillment",
    }
  }
}

impl fmt::Display for StepType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Who is asked to approve an approval step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApprovalMode {
  /// Members of the configured approver roles.
  #[default]
  Role,
  /// The requester's line manager.
  LineManager,
  /// The head of the requester's department.
  DepartmentHead,
}

impl ApprovalMode {
  pub fn as_str(&self) -> &'static str {
    match self {
      ApprovalMode::Role => "role",
      ApprovalMode::LineManager => "lineManager",
      ApprovalMode::DepartmentHead => "departmentHead",
    }
  }
}

impl fmt::Display for ApprovalMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
