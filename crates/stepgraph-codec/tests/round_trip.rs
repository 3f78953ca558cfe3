//! Round-trip and load-boundary behavior of the codec.

use serde_json::json;
use stepgraph_codec::{CodecError, SUPPORTED_VERSION, decode, decode_document, encode, encode_value};
use stepgraph_workflow::{
  ApprovalConfig, ApprovalMode, FulfillmentConfig, Position, RoleList, SUBMITTED_STEP_ID,
  StepConfig, TemplateKind, ViolationCode, Workflow, instantiate, normalize_roles,
};

fn edited_workflow() -> Workflow {
  let workflow = instantiate(TemplateKind::ParallelApproval);

  let approval_id = workflow.steps[1].id.clone();
  let config = normalize_roles(&workflow.steps[1].config, &["finance", "legal", "finance"]);
  let config = match config {
    StepConfig::Approval(approval) => StepConfig::Approval(ApprovalConfig {
      mode: ApprovalMode::DepartmentHead,
      min_approvals: 2,
      allow_delegation: true,
      delegate_role: Some("deputy".to_string()),
      ..approval
    }),
    other => other,
  };
  let workflow = workflow.update_step_config(&approval_id, config).unwrap();

  let (workflow, extra) = workflow
    .add_step(
      Position::new(750.5, -42.25),
      StepConfig::Fulfillment(FulfillmentConfig::with_roles(RoleList::from_selection([
        "archive",
      ]))),
    )
    .unwrap();
  let fulfillment = workflow.steps[3].id.clone();
  let (mut workflow, _) = workflow.add_connection(&fulfillment, &extra).unwrap();

  // An explicitly pinned step.
  workflow.steps[4].deletable = false;
  workflow
}

#[test]
fn templates_round_trip() {
  for kind in TemplateKind::ALL {
    let workflow = instantiate(kind);
    let value = encode_value(&workflow).unwrap();
    assert_eq!(decode(&value).unwrap(), workflow, "template {kind}");
  }
}

#[test]
fn edited_workflow_round_trips() {
  let workflow = edited_workflow();
  assert!(workflow.validate().is_empty());

  let document = encode(&workflow);
  assert_eq!(decode_document(&document).unwrap(), workflow);

  let text = serde_json::to_string(&document).unwrap();
  assert_eq!(stepgraph_codec::decode_str(&text).unwrap(), workflow);
}

#[test]
fn encoded_document_has_contract_fields_only() {
  let value = encode_value(&edited_workflow()).unwrap();

  let top: Vec<&String> = value.as_object().unwrap().keys().collect();
  assert_eq!(top.len(), 3);
  for node in value["nodes"].as_array().unwrap() {
    for key in node.as_object().unwrap().keys() {
      assert!(
        ["id", "type", "data", "position", "deletable"].contains(&key.as_str()),
        "unexpected node field {key}"
      );
    }
  }
  for edge in value["edges"].as_array().unwrap() {
    assert_eq!(edge.as_object().unwrap().len(), 3);
  }
}

#[test]
fn newer_version_fails_before_construction() {
  let mut value = encode_value(&instantiate(TemplateKind::SingleApproval)).unwrap();
  value["version"] = json!(SUPPORTED_VERSION + 1);

  match decode(&value) {
    Err(CodecError::UnsupportedVersion { found, .. }) => {
      assert_eq!(found, u64::from(SUPPORTED_VERSION) + 1)
    }
    other => panic!("expected UnsupportedVersion, got {other:?}"),
  }
}

#[test]
fn invalid_document_carries_every_violation() {
  let value = json!({
    "version": 1,
    "nodes": [
      { "id": "submitted", "type": "submitted", "data": { "label": "Submitted" },
        "position": { "x": 0, "y": 0 }, "deletable": false },
      { "id": "a1", "type": "approval",
        "data": { "approvalMode": "role", "approverRole1": "hr", "approverRole2": "it",
                  "minApprovals": 3 },
        "position": { "x": 250, "y": 0 } },
      { "id": "f1", "type": "fulfillment", "data": { "fulfillerRole1": "ops" },
        "position": { "x": 500, "y": 0 } }
    ],
    "edges": [
      { "id": "e1", "source": "submitted", "target": "a1" },
      { "id": "e2", "source": "a1", "target": "ghost" }
    ]
  });

  let err = decode(&value).unwrap_err();
  let violations = err.violations().unwrap();
  let codes: Vec<ViolationCode> = violations.iter().map(|v| v.code).collect();
  assert_eq!(
    codes,
    vec![
      ViolationCode::DanglingConnection,
      ViolationCode::UnreachableStep,
      ViolationCode::InvalidMinApprovals,
    ]
  );
  assert!(violations[1].concerns("f1"));
  assert!(violations[2].concerns("a1"));
  assert!(err.to_string().contains("INVALID_MIN_APPROVALS: a1"));
}

#[test]
fn empty_workflow_round_trips() {
  let workflow = Workflow::empty();
  let decoded = decode(&encode_value(&workflow).unwrap()).unwrap();
  assert_eq!(decoded, workflow);
  assert_eq!(decoded.steps[0].id, SUBMITTED_STEP_ID);
}
