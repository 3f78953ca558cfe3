//! Stepgraph Workflow
//!
//! This crate provides the in-memory workflow graph for stepgraph: approval
//! and fulfillment processes assembled as a directed graph of typed steps.
//!
//! - [`Workflow`] is value-like. Every mutation returns a new graph and leaves
//!   the receiver untouched, including when it fails.
//! - The model keeps the cheap invariants itself (the submitted step cannot be
//!   created or deleted, removing a step cascades to its connections).
//!   Everything else is reported by [`validate`], which never fails.
//! - [`normalize_roles`] turns an editor's role selection into the dense role
//!   list carried by approval and fulfillment steps.
//! - [`instantiate`] builds the canonical graph for each [`TemplateKind`].

mod error;
mod graph;
mod roles;
mod step;
mod template;
mod validate;
mod workflow;

pub use error::GraphError;
pub use graph::Graph;
pub use roles::{RoleList, normalize_roles, toggle_role};
pub use step::{ApprovalConfig, FulfillmentConfig, Step, StepConfig, SubmittedConfig};
pub use template::{
  DEFAULT_APPROVER_ROLE, DEFAULT_FULFILLER_ROLE, TemplateKind, TemplateRoles, instantiate,
  instantiate_with,
};
pub use validate::{Violation, ViolationCode, validate};
pub use workflow::{
  Connection, DEFAULT_SUBMITTED_LABEL, SCHEMA_VERSION, SUBMITTED_STEP_ID, Workflow,
};

pub use stepgraph_config::{ApprovalMode, Position, StepType};
