use serde_json::Value;
use stepgraph_config::{EdgeDocument, NodeData, NodeDocument, WorkflowDocument};
use stepgraph_workflow::{RoleList, Step, StepConfig, Workflow};

use crate::error::CodecError;
use crate::fields::{
  ALLOW_DELEGATION, APPROVAL_MODE, APPROVER_ROLE_PREFIX, DELEGATE_ROLE, FULFILLER_ROLE_PREFIX,
  LABEL, MIN_APPROVALS, role_field,
};

/// Encode a workflow into its persisted document.
pub fn encode(workflow: &Workflow) -> WorkflowDocument {
  WorkflowDocument {
    version: workflow.version,
    nodes: workflow.steps.iter().map(encode_step).collect(),
    edges: workflow
      .connections
      .iter()
      .map(|c| EdgeDocument {
        id: c.id.clone(),
        source: c.source.clone(),
        target: c.target.clone(),
      })
      .collect(),
  }
}

/// Encode a workflow straight to a JSON value.
pub fn encode_value(workflow: &Workflow) -> Result<Value, CodecError> {
  Ok(serde_json::to_value(encode(workflow))?)
}

fn encode_step(step: &Step) -> NodeDocument {
  // Ordinary steps are deletable unless told otherwise; the submitted step
  // always states its flag.
  let deletable = if step.is_submitted() || !step.deletable {
    Some(step.deletable)
  } else {
    None
  };

  NodeDocument {
    id: step.id.clone(),
    node_type: step.step_type(),
    data: encode_config(&step.config),
    position: step.position,
    deletable,
  }
}

fn encode_config(config: &StepConfig) -> NodeData {
  let mut data = NodeData::new();

  match config {
    StepConfig::Submitted(submitted) => {
      data.insert(LABEL.to_string(), Value::from(submitted.label.clone()));
    }
    StepConfig::Approval(approval) => {
      data.insert(
        APPROVAL_MODE.to_string(),
        Value::from(approval.mode.as_str()),
      );
      insert_roles(&mut data, APPROVER_ROLE_PREFIX, &approval.approver_roles);
      data.insert(
        MIN_APPROVALS.to_string(),
        Value::from(approval.min_approvals),
      );
      data.insert(
        ALLOW_DELEGATION.to_string(),
        Value::from(approval.allow_delegation),
      );
      if let Some(delegate) = &approval.delegate_role {
        data.insert(DELEGATE_ROLE.to_string(), Value::from(delegate.clone()));
      }
    }
    StepConfig::Fulfillment(fulfillment) => {
      insert_roles(&mut data, FULFILLER_ROLE_PREFIX, &fulfillment.fulfiller_roles);
    }
  }

  data
}

fn insert_roles(data: &mut NodeData, prefix: &str, roles: &RoleList) {
  for (index, role) in roles.slots() {
    data.insert(role_field(prefix, index), Value::from(role));
  }
}
