use stepgraph_config::{ApprovalMode, Position, StepType};

use crate::roles::RoleList;

/// A step (node) of the workflow graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
  pub id: String,
  pub config: StepConfig,
  pub position: Position,
  /// Editor-level deletability flag. Submitted steps are never deletable,
  /// whatever this says; see [`Step::is_deletable`].
  pub deletable: bool,
}

impl Step {
  /// Create a step. Submitted steps start out non-deletable.
  pub fn new(id: impl Into<String>, config: StepConfig, position: Position) -> Self {
    let deletable = config.step_type() != StepType::Submitted;
    Self {
      id: id.into(),
      config,
      position,
      deletable,
    }
  }

  pub fn step_type(&self) -> StepType {
    self.config.step_type()
  }

  pub fn is_submitted(&self) -> bool {
    self.step_type() == StepType::Submitted
  }

  pub fn is_deletable(&self) -> bool {
    self.deletable && !self.is_submitted()
  }
}

/// Type-specific step configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum StepConfig {
  Submitted(SubmittedConfig),
  Approval(ApprovalConfig),
  Fulfillment(FulfillmentConfig),
}

impl StepConfig {
  pub fn step_type(&self) -> StepType {
    match self {
      StepConfig::Submitted(_) => StepType::Submitted,
      StepConfig::Approval(_) => StepType::Approval,
      StepConfig::Fulfillment(_) => StepType::Fulfillment,
    }
  }

  /// Default configuration for a freshly dropped step of the given type.
  pub fn default_for(step_type: StepType) -> Self {
    match step_type {
      StepType::Submitted => StepConfig::Submitted(SubmittedConfig::default()),
      StepType::Approval => StepConfig::Approval(ApprovalConfig::default()),
      StepType::Fulfillment => StepConfig::Fulfillment(FulfillmentConfig::default()),
    }
  }

  /// Assigned roles, if this step type carries any.
  pub fn roles(&self) -> Option<&RoleList> {
    match self {
      StepConfig::Submitted(_) => None,
      StepConfig::Approval(approval) => Some(&approval.approver_roles),
      StepConfig::Fulfillment(fulfillment) => Some(&fulfillment.fulfiller_roles),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedConfig {
  pub label: String,
}

impl Default for SubmittedConfig {
  fn default() -> Self {
    Self {
      label: crate::workflow::DEFAULT_SUBMITTED_LABEL.to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalConfig {
  pub mode: ApprovalMode,
  pub approver_roles: RoleList,
  /// Number of approvals required before the step completes.
  pub min_approvals: u32,
  pub allow_delegation: bool,
  pub delegate_role: Option<String>,
}

impl ApprovalConfig {
  /// Role-based approval by any one of `roles`.
  pub fn with_roles(roles: RoleList) -> Self {
    Self {
      approver_roles: roles,
      ..Self::default()
    }
  }
}

impl Default for ApprovalConfig {
  fn default() -> Self {
    Self {
      mode: ApprovalMode::Role,
      approver_roles: RoleList::new(),
      min_approvals: 1,
      allow_delegation: false,
      delegate_role: None,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FulfillmentConfig {
  pub fulfiller_roles: RoleList,
}

impl FulfillmentConfig {
  pub fn with_roles(roles: RoleList) -> Self {
    Self {
      fulfiller_roles: roles,
    }
  }
}
