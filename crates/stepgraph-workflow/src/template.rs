//! Canonical workflow shapes used to bootstrap editing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use stepgraph_config::Position;

use crate::roles::RoleList;
use crate::step::{ApprovalConfig, FulfillmentConfig, Step, StepConfig};
use crate::workflow::{Connection, SUBMITTED_STEP_ID, Workflow, new_connection_id, new_step_id};

pub const DEFAULT_APPROVER_ROLE: &str = "approver";
pub const DEFAULT_FULFILLER_ROLE: &str = "fulfiller";

const COLUMN_WIDTH: f64 = 250.0;
const BRANCH_OFFSET: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemplateKind {
  /// submitted -> approval -> fulfillment
  SingleApproval,
  /// submitted -> approval -> approval -> fulfillment
  TwoStepApproval,
  /// submitted -> {approval, approval} -> fulfillment
  ParallelApproval,
}

impl TemplateKind {
  pub const ALL: [TemplateKind; 3] = [
    TemplateKind::SingleApproval,
    TemplateKind::TwoStepApproval,
    TemplateKind::ParallelApproval,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      TemplateKind::SingleApproval => "singleApproval",
      TemplateKind::TwoStepApproval => "twoStepApproval",
      TemplateKind::ParallelApproval => "parallelApproval",
    }
  }
}

impl fmt::Display for TemplateKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for TemplateKind {
  type Err = String;

  /// Accepts the camelCase name (`twoStepApproval`) or its kebab-case
  /// spelling (`two-step-approval`).
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let folded: String = s
      .chars()
      .filter(|c| *c != '-' && *c != '_')
      .collect::<String>()
      .to_ascii_lowercase();

    TemplateKind::ALL
      .into_iter()
      .find(|kind| kind.as_str().to_ascii_lowercase() == folded)
      .ok_or_else(|| format!("unknown template: {s}"))
  }
}

/// Roles assigned to the steps a template creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRoles {
  pub approver: String,
  pub fulfiller: String,
}

impl Default for TemplateRoles {
  fn default() -> Self {
    Self {
      approver: DEFAULT_APPROVER_ROLE.to_string(),
      fulfiller: DEFAULT_FULFILLER_ROLE.to_string(),
    }
  }
}

/// Instantiate a template with the default roles.
pub fn instantiate(kind: TemplateKind) -> Workflow {
  instantiate_with(kind, &TemplateRoles::default())
}

/// Instantiate a template.
///
/// Every call generates fresh step and connection ids; only the submitted step
/// keeps its well-known id.
pub fn instantiate_with(kind: TemplateKind, roles: &TemplateRoles) -> Workflow {
  let mut builder = Builder::new(roles);

  match kind {
    TemplateKind::SingleApproval => {
      let approval = builder.approval(column(1, 0.0));
      let fulfillment = builder.fulfillment(column(2, 0.0));
      builder.connect(SUBMITTED_STEP_ID, &approval);
      builder.connect(&approval, &fulfillment);
    }
    TemplateKind::TwoStepApproval => {
      let first = builder.approval(column(1, 0.0));
      let second = builder.approval(column(2, 0.0));
      let fulfillment = builder.fulfillment(column(3, 0.0));
      builder.connect(SUBMITTED_STEP_ID, &first);
      builder.connect(&first, &second);
      builder.connect(&second, &fulfillment);
    }
    TemplateKind::ParallelApproval => {
      let upper = builder.approval(column(1, -BRANCH_OFFSET));
      let lower = builder.approval(column(1, BRANCH_OFFSET));
      let fulfillment = builder.fulfillment(column(2, 0.0));
      builder.connect(SUBMITTED_STEP_ID, &upper);
      builder.connect(SUBMITTED_STEP_ID, &lower);
      builder.connect(&upper, &fulfillment);
      builder.connect(&lower, &fulfillment);
    }
  }

  builder.workflow.ensure_submitted()
}

fn column(index: u32, y: f64) -> Position {
  Position::new(f64::from(index) * COLUMN_WIDTH, y)
}

struct Builder<'a> {
  roles: &'a TemplateRoles,
  workflow: Workflow,
}

impl<'a> Builder<'a> {
  fn new(roles: &'a TemplateRoles) -> Self {
    Self {
      roles,
      workflow: Workflow::empty(),
    }
  }

  fn approval(&mut self, position: Position) -> String {
    let config = ApprovalConfig::with_roles(RoleList::from_selection([&self.roles.approver]));
    self.push(StepConfig::Approval(config), position)
  }

  fn fulfillment(&mut self, position: Position) -> String {
    let config = FulfillmentConfig::with_roles(RoleList::from_selection([&self.roles.fulfiller]));
    self.push(StepConfig::Fulfillment(config), position)
  }

  fn push(&mut self, config: StepConfig, position: Position) -> String {
    let id = new_step_id();
    self
      .workflow
      .steps
      .push(Step::new(id.clone(), config, position));
    id
  }

  fn connect(&mut self, source: &str, target: &str) {
    self.workflow.connections.push(Connection {
      id: new_connection_id(),
      source: source.to_string(),
      target: target.to_string(),
    });
  }
}
