//! Structural validation.
//!
//! [`validate`] is a read-only pass that reports every structural problem it
//! finds. It never fails: an empty list is the only success signal, and a
//! degenerate graph (for example one without a submitted step) still gets a
//! list back.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::roles::RoleList;
use crate::step::StepConfig;
use crate::workflow::Workflow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
  MissingSubmitted,
  MultipleSubmitted,
  DanglingConnection,
  SelfLoop,
  DuplicateConnection,
  SubmittedHasIncoming,
  UnreachableStep,
  InvalidMinApprovals,
  MissingDelegateRole,
  EmptyRoleList,
  NonContiguousRoleIndex,
  DuplicateRole,
}

impl ViolationCode {
  pub fn as_str(&self) -> &'static str {
    match self {
      ViolationCode::MissingSubmitted => "MISSING_SUBMITTED",
      ViolationCode::MultipleSubmitted => "MULTIPLE_SUBMITTED",
      ViolationCode::DanglingConnection => "DANGLING_CONNECTION",
      ViolationCode::SelfLoop => "SELF_LOOP",
      ViolationCode::DuplicateConnection => "DUPLICATE_CONNECTION",
      ViolationCode::SubmittedHasIncoming => "SUBMITTED_HAS_INCOMING",
      ViolationCode::UnreachableStep => "UNREACHABLE_STEP",
      ViolationCode::InvalidMinApprovals => "INVALID_MIN_APPROVALS",
      ViolationCode::MissingDelegateRole => "MISSING_DELEGATE_ROLE",
      ViolationCode::EmptyRoleList => "EMPTY_ROLE_LIST",
      ViolationCode::NonContiguousRoleIndex => "NON_CONTIGUOUS_ROLE_INDEX",
      ViolationCode::DuplicateRole => "DUPLICATE_ROLE",
    }
  }
}

impl fmt::Display for ViolationCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A structural inconsistency and the ids of the entities involved.
///
/// Connection violations list the connection id first, followed by the step
/// ids it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
  pub code: ViolationCode,
  pub entity_ids: Vec<String>,
}

impl Violation {
  pub fn new<I, S>(code: ViolationCode, entity_ids: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      code,
      entity_ids: entity_ids.into_iter().map(Into::into).collect(),
    }
  }

  /// Whether this violation names the given entity.
  pub fn concerns(&self, entity_id: &str) -> bool {
    self.entity_ids.iter().any(|id| id == entity_id)
  }
}

impl fmt::Display for Violation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.entity_ids.is_empty() {
      write!(f, "{}", self.code)
    } else {
      write!(f, "{}: {}", self.code, self.entity_ids.join(", "))
    }
  }
}

/// Validate a workflow graph.
pub fn validate(workflow: &Workflow) -> Vec<Violation> {
  let mut violations = Vec::new();

  let submitted: Vec<&str> = workflow
    .steps
    .iter()
    .filter(|s| s.is_submitted())
    .map(|s| s.id.as_str())
    .collect();

  match submitted.len() {
    0 => violations.push(Violation::new(ViolationCode::MissingSubmitted, [] as [&str; 0])),
    1 => {}
    _ => violations.push(Violation::new(
      ViolationCode::MultipleSubmitted,
      submitted.iter().copied(),
    )),
  }

  check_connections(workflow, &submitted, &mut violations);

  // Without a submitted step there is nothing to measure reachability from;
  // MISSING_SUBMITTED already covers it.
  if !submitted.is_empty() {
    let reached = workflow.graph().reachable_from(submitted.iter().copied());
    for step in &workflow.steps {
      if !step.is_submitted() && !reached.contains(&step.id) {
        violations.push(Violation::new(ViolationCode::UnreachableStep, [&step.id]));
      }
    }
  }

  for step in &workflow.steps {
    match &step.config {
      StepConfig::Submitted(_) => {}
      StepConfig::Approval(approval) => {
        check_roles(&step.id, &approval.approver_roles, &mut violations);

        // A role listed twice still approves once.
        let max = distinct_roles(&approval.approver_roles).len();
        if approval.min_approvals < 1 || approval.min_approvals as usize > max {
          violations.push(Violation::new(
            ViolationCode::InvalidMinApprovals,
            [&step.id],
          ));
        }

        let has_delegate = approval
          .delegate_role
          .as_deref()
          .is_some_and(|r| !r.trim().is_empty());
        if approval.allow_delegation && !has_delegate {
          violations.push(Violation::new(
            ViolationCode::MissingDelegateRole,
            [&step.id],
          ));
        }
      }
      StepConfig::Fulfillment(fulfillment) => {
        check_roles(&step.id, &fulfillment.fulfiller_roles, &mut violations);
      }
    }
  }

  violations
}

fn check_connections(workflow: &Workflow, submitted: &[&str], violations: &mut Vec<Violation>) {
  let step_ids: HashSet<&str> = workflow.steps.iter().map(|s| s.id.as_str()).collect();
  let mut seen_pairs: HashSet<(&str, &str)> = HashSet::new();

  for connection in &workflow.connections {
    let source = connection.source.as_str();
    let target = connection.target.as_str();

    let mut missing: Vec<&str> = Vec::new();
    for endpoint in [source, target] {
      if !step_ids.contains(endpoint) && !missing.contains(&endpoint) {
        missing.push(endpoint);
      }
    }
    if !missing.is_empty() {
      violations.push(Violation::new(
        ViolationCode::DanglingConnection,
        std::iter::once(connection.id.as_str()).chain(missing),
      ));
      continue;
    }

    if source == target {
      violations.push(Violation::new(
        ViolationCode::SelfLoop,
        [connection.id.as_str(), source],
      ));
      continue;
    }

    if !seen_pairs.insert((source, target)) {
      violations.push(Violation::new(
        ViolationCode::DuplicateConnection,
        [connection.id.as_str(), source, target],
      ));
    }

    if submitted.contains(&target) {
      violations.push(Violation::new(
        ViolationCode::SubmittedHasIncoming,
        [connection.id.as_str(), target],
      ));
    }
  }
}

fn check_roles(step_id: &str, roles: &RoleList, violations: &mut Vec<Violation>) {
  if roles.is_empty() {
    violations.push(Violation::new(ViolationCode::EmptyRoleList, [step_id]));
  } else if !roles.is_contiguous() {
    violations.push(Violation::new(
      ViolationCode::NonContiguousRoleIndex,
      [step_id],
    ));
  }

  let mut reported = HashSet::new();
  let mut seen = HashSet::new();
  for role in roles.iter() {
    if !seen.insert(role) && reported.insert(role) {
      violations.push(Violation::new(ViolationCode::DuplicateRole, [step_id, role]));
    }
  }
}

fn distinct_roles(roles: &RoleList) -> HashSet<&str> {
  roles.iter().collect()
}
