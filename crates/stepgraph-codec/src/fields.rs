//! Names of the data fields that make up the document contract.

use stepgraph_config::StepType;

pub(crate) const LABEL: &str = "label";
pub(crate) const APPROVAL_MODE: &str = "approvalMode";
pub(crate) const MIN_APPROVALS: &str = "minApprovals";
pub(crate) const ALLOW_DELEGATION: &str = "allowDelegation";
pub(crate) const DELEGATE_ROLE: &str = "delegateRole";

pub const APPROVER_ROLE_PREFIX: &str = "approverRole";
pub const FULFILLER_ROLE_PREFIX: &str = "fulfillerRole";

/// Wire name of the role slot at `index`, e.g. `approverRole2`.
pub fn role_field(prefix: &str, index: u32) -> String {
  format!("{prefix}{index}")
}

/// Parse the index out of a role field name. `approverRole3` gives
/// `Some(Ok(3))` for the approver prefix.
///
/// `None` means `key` is not a role field for `prefix` at all. A role field
/// whose index is not written the way [`role_field`] writes it (leading zeros,
/// or too large for `u32`) gives an error, so that every index has exactly one
/// field name.
pub(crate) fn parse_role_field(key: &str, prefix: &str) -> Option<Result<u32, String>> {
  let digits = key.strip_prefix(prefix)?;
  if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  if digits.len() > 1 && digits.starts_with('0') {
    return Some(Err(format!("role index '{digits}' has leading zeros")));
  }
  Some(
    digits
      .parse()
      .map_err(|_| format!("role index '{digits}' is out of range")),
  )
}

/// Whether `key` is part of the data schema for `step_type`.
pub fn is_schema_field(step_type: StepType, key: &str) -> bool {
  match step_type {
    StepType::Submitted => key == LABEL,
    StepType::Approval => {
      matches!(
        key,
        APPROVAL_MODE | MIN_APPROVALS | ALLOW_DELEGATION | DELEGATE_ROLE
      ) || parse_role_field(key, APPROVER_ROLE_PREFIX).is_some()
    }
    StepType::Fulfillment => parse_role_field(key, FULFILLER_ROLE_PREFIX).is_some(),
  }
}
