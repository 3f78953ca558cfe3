//! Role directory collaborator.
//!
//! The directory supplies the roles an editor can pick from. Role ids held by
//! a workflow are opaque strings: a role that has since disappeared from the
//! directory is not a structural violation. [`stale_roles`] lets a caller find
//! such roles and reconcile them.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stepgraph_workflow::{RoleList, StepConfig, Workflow};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
  pub id: String,
  pub name: String,
  pub slug: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
  #[error("role directory unavailable: {0}")]
  Unavailable(String),
}

/// Source of selectable roles.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
  async fn list_roles(&self) -> Result<Vec<Role>, DirectoryError>;
}

/// A fixed list of roles.
#[derive(Debug, Clone, Default)]
pub struct StaticRoleDirectory {
  roles: Vec<Role>,
}

impl StaticRoleDirectory {
  pub fn new(roles: Vec<Role>) -> Self {
    Self { roles }
  }
}

#[async_trait]
impl RoleDirectory for StaticRoleDirectory {
  async fn list_roles(&self) -> Result<Vec<Role>, DirectoryError> {
    Ok(self.roles.clone())
  }
}

/// A directory role and whether a step currently has it assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleOption {
  pub role: Role,
  pub selected: bool,
}

/// Directory roles in directory order, marked with the step's selection.
pub fn role_options(roles: &[Role], assigned: &RoleList) -> Vec<RoleOption> {
  roles
    .iter()
    .map(|role| RoleOption {
      role: role.clone(),
      selected: assigned.contains(&role.id),
    })
    .collect()
}

/// A role id assigned to a step but absent from the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleRole {
  pub step_id: String,
  pub role_id: String,
}

/// Find role ids in `workflow` that the directory no longer lists.
///
/// Assigned roles and approval delegates are both checked. Each role is
/// reported at most once per step.
pub fn stale_roles(workflow: &Workflow, roles: &[Role]) -> Vec<StaleRole> {
  let known: HashSet<&str> = roles.iter().map(|r| r.id.as_str()).collect();
  let mut stale = Vec::new();

  for step in &workflow.steps {
    let assigned = step.config.roles().into_iter().flat_map(|list| list.iter());
    let delegate = match &step.config {
      StepConfig::Approval(approval) => approval
        .delegate_role
        .as_deref()
        .filter(|role_id| !role_id.trim().is_empty()),
      _ => None,
    };

    let mut reported = HashSet::new();
    for role_id in assigned.chain(delegate) {
      if !known.contains(role_id) && reported.insert(role_id) {
        stale.push(StaleRole {
          step_id: step.id.clone(),
          role_id: role_id.to_string(),
        });
      }
    }
  }

  stale
}
