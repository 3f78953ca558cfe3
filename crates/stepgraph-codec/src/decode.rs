use std::collections::HashSet;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use stepgraph_config::{
  ApprovalMode, NodeData, NodeDocument, StepType, VersionMarker, WorkflowDocument,
};
use stepgraph_workflow::{
  ApprovalConfig, Connection, DEFAULT_SUBMITTED_LABEL, FulfillmentConfig, RoleList, Step,
  StepConfig, SubmittedConfig, Workflow,
};
use tracing::debug;

use crate::SUPPORTED_VERSION;
use crate::error::CodecError;
use crate::fields::{
  ALLOW_DELEGATION, APPROVAL_MODE, APPROVER_ROLE_PREFIX, DELEGATE_ROLE, FULFILLER_ROLE_PREFIX,
  LABEL, MIN_APPROVALS, parse_role_field,
};

/// Decode a persisted document.
///
/// The version marker is checked before the rest of the document is parsed, so
/// a newer document fails with [`CodecError::UnsupportedVersion`] even when its
/// shape has changed.
pub fn decode(value: &Value) -> Result<Workflow, CodecError> {
  check_document_version(value)?;

  let document = WorkflowDocument::deserialize(value)?;
  decode_document(&document)
}

/// Check only the version marker of a raw document.
///
/// Any integer marker newer than [`SUPPORTED_VERSION`] is rejected, including
/// ones too large to fit the document's own version field. A marker that is
/// not a non-negative integer is left for the full parse to report.
pub fn check_document_version(value: &Value) -> Result<(), CodecError> {
  let marker = VersionMarker::deserialize(value)?;
  match marker.as_u64() {
    Some(found) => check_version(found),
    None => Ok(()),
  }
}

/// Decode a persisted document from its JSON text.
pub fn decode_str(json: &str) -> Result<Workflow, CodecError> {
  let value: Value = serde_json::from_str(json)?;
  decode(&value)
}

/// Decode an already parsed document.
pub fn decode_document(document: &WorkflowDocument) -> Result<Workflow, CodecError> {
  check_version(u64::from(document.version))?;

  let workflow = reconstruct(document)?.ensure_submitted();
  let violations = workflow.validate();
  if !violations.is_empty() {
    debug!(
      violations = violations.len(),
      "rejecting workflow document"
    );
    return Err(CodecError::InvalidWorkflow(violations));
  }

  debug!(
    steps = workflow.steps.len(),
    connections = workflow.connections.len(),
    "decoded workflow document"
  );
  Ok(workflow)
}

/// Rebuild the graph described by a document, without validating it.
///
/// Steps and connections are taken over as they are; only data fields outside
/// the contract are dropped. Duplicate ids and ill-typed contract fields are
/// still errors, since there is no graph to report them on.
pub fn reconstruct(document: &WorkflowDocument) -> Result<Workflow, CodecError> {
  let mut step_ids = HashSet::new();
  let mut steps = Vec::with_capacity(document.nodes.len());
  for node in &document.nodes {
    if !step_ids.insert(node.id.as_str()) {
      return Err(CodecError::DuplicateStepId(node.id.clone()));
    }
    steps.push(decode_step(node)?);
  }

  let mut connection_ids = HashSet::new();
  let mut connections = Vec::with_capacity(document.edges.len());
  for edge in &document.edges {
    if !connection_ids.insert(edge.id.as_str()) {
      return Err(CodecError::DuplicateConnectionId(edge.id.clone()));
    }
    connections.push(Connection {
      id: edge.id.clone(),
      source: edge.source.clone(),
      target: edge.target.clone(),
    });
  }

  Ok(Workflow {
    version: document.version,
    steps,
    connections,
  })
}

fn check_version(found: u64) -> Result<(), CodecError> {
  if found > u64::from(SUPPORTED_VERSION) {
    return Err(CodecError::UnsupportedVersion {
      found,
      supported: SUPPORTED_VERSION,
    });
  }
  Ok(())
}

fn decode_step(node: &NodeDocument) -> Result<Step, CodecError> {
  let fields = Fields {
    step_id: &node.id,
    data: &node.data,
  };

  let config = match node.node_type {
    StepType::Submitted => StepConfig::Submitted(SubmittedConfig {
      label: fields
        .optional::<String>(LABEL)?
        .unwrap_or_else(|| DEFAULT_SUBMITTED_LABEL.to_string()),
    }),
    StepType::Approval => StepConfig::Approval(ApprovalConfig {
      mode: fields.required::<ApprovalMode>(APPROVAL_MODE)?,
      approver_roles: fields.roles(APPROVER_ROLE_PREFIX)?,
      min_approvals: fields.required::<u32>(MIN_APPROVALS)?,
      allow_delegation: fields.optional::<bool>(ALLOW_DELEGATION)?.unwrap_or(false),
      delegate_role: fields.optional::<String>(DELEGATE_ROLE)?,
    }),
    StepType::Fulfillment => StepConfig::Fulfillment(FulfillmentConfig {
      fulfiller_roles: fields.roles(FULFILLER_ROLE_PREFIX)?,
    }),
  };

  let deletable = node
    .deletable
    .unwrap_or(node.node_type != StepType::Submitted);

  Ok(Step {
    id: node.id.clone(),
    config,
    position: node.position,
    deletable,
  })
}

/// Typed access to a node's data map.
struct Fields<'a> {
  step_id: &'a str,
  data: &'a NodeData,
}

impl Fields<'_> {
  /// A field that may be absent. `null` counts as absent.
  fn optional<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CodecError> {
    match self.data.get(key) {
      None | Some(Value::Null) => Ok(None),
      Some(value) => T::deserialize(value)
        .map(Some)
        .map_err(|e| self.malformed(format!("field '{key}': {e}"))),
    }
  }

  fn required<T: DeserializeOwned>(&self, key: &str) -> Result<T, CodecError> {
    self
      .optional(key)?
      .ok_or_else(|| self.malformed(format!("missing field '{key}'")))
  }

  /// Collect the role slots named `<prefix><N>`, keeping their indices.
  ///
  /// Only canonically written indices are accepted, so no two fields can name
  /// the same slot.
  fn roles(&self, prefix: &str) -> Result<RoleList, CodecError> {
    let mut slots = Vec::new();
    for (key, value) in self.data {
      let index = match parse_role_field(key, prefix) {
        None => continue,
        Some(Ok(index)) => index,
        Some(Err(message)) => {
          return Err(self.malformed(format!("field '{key}': {message}")));
        }
      };
      match value {
        Value::Null => {}
        Value::String(role) => slots.push((index, role.clone())),
        other => {
          return Err(self.malformed(format!(
            "field '{key}': expected a role id string, got {other}"
          )));
        }
      }
    }
    Ok(RoleList::from_slots(slots))
  }

  fn malformed(&self, message: String) -> CodecError {
    CodecError::MalformedStep {
      step_id: self.step_id.to_string(),
      message,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use stepgraph_workflow::{SUBMITTED_STEP_ID, ViolationCode};

  fn approval_node(id: &str, data: Value) -> Value {
    json!({
      "id": id,
      "type": "approval",
      "data": data,
      "position": { "x": 250, "y": 0 }
    })
  }

  #[test]
  fn test_newer_version_is_rejected_before_parsing() {
    let value = json!({ "version": SUPPORTED_VERSION + 1, "nodes": "not-a-list" });
    let result = decode(&value);
    assert!(matches!(
      result,
      Err(CodecError::UnsupportedVersion { found, supported })
        if found == u64::from(SUPPORTED_VERSION) + 1 && supported == SUPPORTED_VERSION
    ));
  }

  #[test]
  fn test_version_beyond_u32_is_unsupported() {
    let value = json!({ "version": 4294967296u64, "nodes": [], "edges": [] });
    assert!(matches!(
      decode(&value),
      Err(CodecError::UnsupportedVersion { found: 4_294_967_296, .. })
    ));

    let result = decode_str(r#"{ "version": 1e30, "nodes": [], "edges": [] }"#);
    assert!(matches!(
      result,
      Err(CodecError::UnsupportedVersion { found: u64::MAX, .. })
    ));
  }

  #[test]
  fn test_non_integer_version_is_malformed() {
    for text in [
      r#"{ "version": -1, "nodes": [], "edges": [] }"#,
      r#"{ "version": 1.5, "nodes": [], "edges": [] }"#,
      r#"{ "version": "1", "nodes": [], "edges": [] }"#,
    ] {
      assert!(matches!(decode_str(text), Err(CodecError::Json(_))), "{text}");
    }
  }

  #[test]
  fn test_missing_version_is_malformed() {
    let result = decode(&json!({ "nodes": [], "edges": [] }));
    assert!(matches!(result, Err(CodecError::Json(_))));
  }

  #[test]
  fn test_missing_submitted_is_synthesized() {
    let workflow = decode(&json!({ "version": 1, "nodes": [], "edges": [] })).unwrap();
    assert_eq!(workflow.steps.len(), 1);
    assert_eq!(workflow.steps[0].id, SUBMITTED_STEP_ID);
    assert!(!workflow.steps[0].deletable);
  }

  #[test]
  fn test_synthesized_submitted_still_needs_connections() {
    let value = json!({
      "version": 1,
      "nodes": [approval_node("a1", json!({
        "approvalMode": "role", "approverRole1": "hr", "minApprovals": 1
      }))],
      "edges": []
    });

    let err = decode(&value).unwrap_err();
    let violations = err.violations().unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].code, ViolationCode::UnreachableStep);
    assert!(violations[0].concerns("a1"));
  }

  #[test]
  fn test_non_contiguous_roles_are_reported_not_repaired() {
    let value = json!({
      "version": 1,
      "nodes": [
        { "id": "submitted", "type": "submitted", "data": { "label": "Submitted" },
          "position": { "x": 0, "y": 0 }, "deletable": false },
        approval_node("a1", json!({
          "approvalMode": "role",
          "approverRole1": "hr",
          "approverRole3": "it",
          "minApprovals": 1
        }))
      ],
      "edges": [{ "id": "e1", "source": "submitted", "target": "a1" }]
    });

    let err = decode(&value).unwrap_err();
    let codes: Vec<ViolationCode> = err.violations().unwrap().iter().map(|v| v.code).collect();
    assert_eq!(codes, vec![ViolationCode::NonContiguousRoleIndex]);

    let workflow = reconstruct(&serde_json::from_value(value).unwrap()).unwrap();
    let roles = workflow.steps[1].config.roles().unwrap();
    assert_eq!(roles.get(3), Some("it"));
  }

  #[test]
  fn test_repeated_role_does_not_satisfy_min_approvals() {
    let value = json!({
      "version": 1,
      "nodes": [
        { "id": "submitted", "type": "submitted", "data": { "label": "Submitted" },
          "position": { "x": 0, "y": 0 }, "deletable": false },
        approval_node("a1", json!({
          "approvalMode": "role",
          "approverRole1": "hr",
          "approverRole2": "hr",
          "minApprovals": 2
        }))
      ],
      "edges": [{ "id": "e1", "source": "submitted", "target": "a1" }]
    });

    let err = decode(&value).unwrap_err();
    let violations = err.violations().unwrap();
    assert!(violations.iter().any(|v| v.code == ViolationCode::DuplicateRole
      && v.entity_ids == vec!["a1".to_string(), "hr".to_string()]));
    assert!(violations.iter().any(|v| v.code == ViolationCode::InvalidMinApprovals));
  }

  #[test]
  fn test_stray_data_fields_are_dropped() {
    let value = json!({
      "version": 1,
      "nodes": [
        { "id": "submitted", "type": "submitted",
          "data": { "label": "Start", "selected": true, "approverRole1": "hr" },
          "position": { "x": 0, "y": 0 } },
        approval_node("a1", json!({
          "approvalMode": "departmentHead",
          "approverRole1": "hr",
          "approverRole2": null,
          "fulfillerRole1": "ops",
          "minApprovals": 1,
          "dragging": false
        }))
      ],
      "edges": [{ "id": "e1", "source": "submitted", "target": "a1" }]
    });

    let workflow = decode(&value).unwrap();
    let StepConfig::Submitted(submitted) = &workflow.steps[0].config else {
      panic!("expected submitted config");
    };
    assert_eq!(submitted.label, "Start");
    assert!(!workflow.steps[0].deletable);

    let StepConfig::Approval(approval) = &workflow.steps[1].config else {
      panic!("expected approval config");
    };
    assert_eq!(approval.mode, ApprovalMode::DepartmentHead);
    assert_eq!(approval.approver_roles.to_vec(), vec!["hr"]);
    assert!(workflow.steps[1].deletable);
  }

  #[test]
  fn test_missing_required_field() {
    let value = json!({
      "version": 1,
      "nodes": [approval_node("a1", json!({ "approverRole1": "hr", "minApprovals": 1 }))],
      "edges": []
    });
    let err = decode(&value).unwrap_err();
    assert!(matches!(
      err,
      CodecError::MalformedStep { ref step_id, .. } if step_id == "a1"
    ));
  }

  #[test]
  fn test_ill_typed_fields() {
    for data in [
      json!({ "approvalMode": "role", "approverRole1": 7, "minApprovals": 1 }),
      json!({ "approvalMode": "role", "approverRole1": "hr", "minApprovals": -1 }),
      json!({ "approvalMode": "everyone", "approverRole1": "hr", "minApprovals": 1 }),
    ] {
      let value = json!({ "version": 1, "nodes": [approval_node("a1", data)], "edges": [] });
      assert!(matches!(
        decode(&value),
        Err(CodecError::MalformedStep { .. })
      ));
    }
  }

  #[test]
  fn test_non_canonical_role_fields_are_malformed() {
    for data in [
      json!({
        "approvalMode": "role", "approverRole1": "hr", "approverRole01": "it", "minApprovals": 1
      }),
      json!({
        "approvalMode": "role", "approverRole1": "hr", "approverRole4294967297": "it",
        "minApprovals": 1
      }),
    ] {
      let value = json!({ "version": 1, "nodes": [approval_node("a1", data)], "edges": [] });
      let err = decode(&value).unwrap_err();
      assert!(
        matches!(err, CodecError::MalformedStep { ref step_id, .. } if step_id == "a1"),
        "{err}"
      );
    }
  }

  #[test]
  fn test_duplicate_ids() {
    let submitted = json!({ "id": "submitted", "type": "submitted",
      "data": {}, "position": { "x": 0, "y": 0 } });
    let value = json!({ "version": 1, "nodes": [submitted.clone(), submitted], "edges": [] });
    assert!(matches!(
      decode(&value),
      Err(CodecError::DuplicateStepId(id)) if id == "submitted"
    ));

    let value = json!({
      "version": 1,
      "nodes": [],
      "edges": [
        { "id": "e1", "source": "a", "target": "b" },
        { "id": "e1", "source": "b", "target": "c" }
      ]
    });
    assert!(matches!(
      decode(&value),
      Err(CodecError::DuplicateConnectionId(_))
    ));
  }

  #[test]
  fn test_decode_str_rejects_garbage() {
    assert!(matches!(decode_str("{ not json"), Err(CodecError::Json(_))));
  }
}
