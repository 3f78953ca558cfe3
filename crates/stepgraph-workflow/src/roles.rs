//! Role assignment.
//!
//! Approval and fulfillment steps carry a list of role identifiers. On the wire
//! each role is a numbered field (`approverRole1`, `approverRole2`, ...), so a
//! persisted document can describe a list with holes in it. [`RoleList`] keeps
//! the index of every slot so such a document is reconstructed as-is and the
//! validator can report it. Lists built from an editor selection are always
//! dense.

use std::collections::{BTreeMap, HashSet};

use crate::step::StepConfig;

/// An index-keyed list of role identifiers. Indices start at 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleList {
  slots: BTreeMap<u32, String>,
}

impl RoleList {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build a dense list from a selection, keeping the first occurrence of each
  /// role identifier.
  pub fn from_selection<I, S>(selection: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut seen = HashSet::new();
    let mut slots = BTreeMap::new();
    for role in selection {
      let role = role.as_ref();
      if seen.insert(role.to_string()) {
        let index = slots.len() as u32 + 1;
        slots.insert(index, role.to_string());
      }
    }
    Self { slots }
  }

  /// Build a list from explicit `(index, role)` slots, exactly as given.
  pub fn from_slots<I>(slots: I) -> Self
  where
    I: IntoIterator<Item = (u32, String)>,
  {
    Self {
      slots: slots.into_iter().collect(),
    }
  }

  pub fn len(&self) -> usize {
    self.slots.len()
  }

  pub fn is_empty(&self) -> bool {
    self.slots.is_empty()
  }

  /// Get the role at a 1-based index.
  pub fn get(&self, index: u32) -> Option<&str> {
    self.slots.get(&index).map(String::as_str)
  }

  pub fn contains(&self, role: &str) -> bool {
    self.slots.values().any(|r| r == role)
  }

  /// Role identifiers in index order.
  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.slots.values().map(String::as_str)
  }

  /// `(index, role)` pairs in index order.
  pub fn slots(&self) -> impl Iterator<Item = (u32, &str)> {
    self.slots.iter().map(|(i, r)| (*i, r.as_str()))
  }

  /// True when the indices are exactly `1..=len`.
  pub fn is_contiguous(&self) -> bool {
    self.slots.keys().copied().eq(1..=self.slots.len() as u32)
  }

  pub fn to_vec(&self) -> Vec<String> {
    self.slots.values().cloned().collect()
  }
}

impl<S: AsRef<str>> FromIterator<S> for RoleList {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    Self::from_selection(iter)
  }
}

/// Replace every role slot of `config` with the dense list built from
/// `selection`.
///
/// The selection is in interaction order and may repeat identifiers (a role
/// toggled on, off and on again); the first occurrence wins. Other fields of
/// the configuration are kept. Submitted steps have no roles and are returned
/// unchanged.
pub fn normalize_roles<S: AsRef<str>>(config: &StepConfig, selection: &[S]) -> StepConfig {
  let roles = RoleList::from_selection(selection);
  let mut next = config.clone();
  match &mut next {
    StepConfig::Submitted(_) => {}
    StepConfig::Approval(approval) => approval.approver_roles = roles,
    StepConfig::Fulfillment(fulfillment) => fulfillment.fulfiller_roles = roles,
  }
  next
}

/// Toggle `role` in an editor selection: append it when absent, remove every
/// occurrence when present.
pub fn toggle_role(selection: &[String], role: &str) -> Vec<String> {
  if selection.iter().any(|r| r == role) {
    selection.iter().filter(|r| *r != role).cloned().collect()
  } else {
    let mut next = selection.to_vec();
    next.push(role.to_string());
    next
  }
}
