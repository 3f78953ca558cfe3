use stepgraph_config::{Position, StepType};

use crate::error::GraphError;
use crate::graph::Graph;
use crate::step::{Step, StepConfig, SubmittedConfig};
use crate::validate::{Violation, validate};

/// Current schema version written by this crate.
pub const SCHEMA_VERSION: u32 = 1;

/// Id given to a synthesized submitted step.
pub const SUBMITTED_STEP_ID: &str = "submitted";

pub const DEFAULT_SUBMITTED_LABEL: &str = "Submitted";

/// A connection (edge) between two steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
  pub id: String,
  pub source: String,
  pub target: String,
}

/// A workflow graph: a version marker, ordered steps and ordered connections.
///
/// Mutations return a new graph. On error the receiver is left as it was, so
/// callers can keep using it.
#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
  pub version: u32,
  pub steps: Vec<Step>,
  pub connections: Vec<Connection>,
}

impl Default for Workflow {
  fn default() -> Self {
    Self::empty()
  }
}

impl Workflow {
  /// A graph containing only the submitted step.
  pub fn empty() -> Self {
    Self {
      version: SCHEMA_VERSION,
      steps: vec![submitted_step(SUBMITTED_STEP_ID.to_string())],
      connections: Vec::new(),
    }
  }

  /// Build the graph structure for traversal.
  pub fn graph(&self) -> Graph {
    Graph::new(&self.steps, &self.connections)
  }

  /// Run the structural validator over this graph.
  pub fn validate(&self) -> Vec<Violation> {
    validate(self)
  }

  /// Get a step by ID.
  pub fn get_step(&self, step_id: &str) -> Option<&Step> {
    self.steps.iter().find(|s| s.id == step_id)
  }

  pub fn get_connection(&self, connection_id: &str) -> Option<&Connection> {
    self.connections.iter().find(|c| c.id == connection_id)
  }

  /// The first submitted step, if any.
  pub fn submitted_step(&self) -> Option<&Step> {
    self.steps.iter().find(|s| s.is_submitted())
  }

  /// Return a graph that has a submitted step.
  ///
  /// When none is present a non-deletable one is prepended at the origin;
  /// otherwise the graph is returned unchanged. Applying this twice is the
  /// same as applying it once.
  pub fn ensure_submitted(&self) -> Self {
    if self.submitted_step().is_some() {
      return self.clone();
    }

    let id = if self.get_step(SUBMITTED_STEP_ID).is_some() {
      new_step_id()
    } else {
      SUBMITTED_STEP_ID.to_string()
    };

    let mut next = self.clone();
    next.steps.insert(0, submitted_step(id));
    next
  }

  /// Append a step with a freshly generated id.
  ///
  /// Submitted steps cannot be created this way.
  pub fn add_step(
    &self,
    position: Position,
    config: StepConfig,
  ) -> Result<(Self, String), GraphError> {
    if config.step_type() == StepType::Submitted {
      return Err(GraphError::InvalidStepType(StepType::Submitted));
    }

    let id = new_step_id();
    let mut next = self.clone();
    next.steps.push(Step::new(id.clone(), config, position));
    Ok((next, id))
  }

  /// Append a step of the given type with its default configuration.
  pub fn add_step_of_type(
    &self,
    step_type: StepType,
    position: Position,
  ) -> Result<(Self, String), GraphError> {
    self.add_step(position, StepConfig::default_for(step_type))
  }

  /// Remove a step together with every connection touching it.
  pub fn remove_step(&self, step_id: &str) -> Result<Self, GraphError> {
    let step = self
      .get_step(step_id)
      .ok_or_else(|| GraphError::UnknownStep(step_id.to_string()))?;

    if !step.is_deletable() {
      return Err(GraphError::StepNotDeletable {
        step_id: step_id.to_string(),
      });
    }

    let mut next = self.clone();
    next.steps.retain(|s| s.id != step_id);
    next
      .connections
      .retain(|c| c.source != step_id && c.target != step_id);
    Ok(next)
  }

  /// Connect two existing steps.
  pub fn add_connection(&self, source: &str, target: &str) -> Result<(Self, String), GraphError> {
    for step_id in [source, target] {
      if self.get_step(step_id).is_none() {
        return Err(GraphError::UnknownStep(step_id.to_string()));
      }
    }

    if source == target {
      return Err(GraphError::SelfLoop {
        step_id: source.to_string(),
      });
    }

    if self
      .connections
      .iter()
      .any(|c| c.source == source && c.target == target)
    {
      return Err(GraphError::DuplicateConnection {
        from: source.to_string(),
        to: target.to_string(),
      });
    }

    let id = new_connection_id();
    let mut next = self.clone();
    next.connections.push(Connection {
      id: id.clone(),
      source: source.to_string(),
      target: target.to_string(),
    });
    Ok((next, id))
  }

  /// Remove a connection. Removing an absent connection is a no-op.
  pub fn remove_connection(&self, connection_id: &str) -> Self {
    let mut next = self.clone();
    next.connections.retain(|c| c.id != connection_id);
    next
  }

  /// Replace the configuration of a step. The step keeps its type.
  pub fn update_step_config(&self, step_id: &str, config: StepConfig) -> Result<Self, GraphError> {
    let index = self.step_index(step_id)?;
    let expected = self.steps[index].step_type();
    let found = config.step_type();

    if expected != found {
      return Err(GraphError::StepTypeMismatch {
        step_id: step_id.to_string(),
        expected,
        found,
      });
    }

    let mut next = self.clone();
    next.steps[index].config = config;
    Ok(next)
  }

  /// Move a step on the canvas.
  pub fn move_step(&self, step_id: &str, position: Position) -> Result<Self, GraphError> {
    let index = self.step_index(step_id)?;
    let mut next = self.clone();
    next.steps[index].position = position;
    Ok(next)
  }

  fn step_index(&self, step_id: &str) -> Result<usize, GraphError> {
    self
      .steps
      .iter()
      .position(|s| s.id == step_id)
      .ok_or_else(|| GraphError::UnknownStep(step_id.to_string()))
  }
}

fn submitted_step(id: String) -> Step {
  Step::new(
    id,
    StepConfig::Submitted(SubmittedConfig::default()),
    Position::default(),
  )
}

pub(crate) fn new_step_id() -> String {
  format!("step-{}", uuid::Uuid::new_v4())
}

pub(crate) fn new_connection_id() -> String {
  format!("edge-{}", uuid::Uuid::new_v4())
}
