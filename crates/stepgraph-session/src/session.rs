use std::sync::Arc;

use stepgraph_codec::{decode, encode};
use stepgraph_store::WorkflowStore;
use stepgraph_workflow::{
  GraphError, Position, StepConfig, TemplateKind, Violation, Workflow, instantiate,
  normalize_roles,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::saver::{SaveQueue, save_channel};

/// An editing session over one workflow.
///
/// The session owns the current graph. Edits replace it with the graph
/// returned by the model; a rejected edit leaves it as it was. Saves are
/// validated first and then handed to the session's save queue.
#[derive(Debug)]
pub struct EditorSession {
  workflow_id: String,
  workflow: Workflow,
  queue: SaveQueue,
  autosave: bool,
}

impl EditorSession {
  /// Create a session over `workflow`, saving through `queue`.
  pub fn new(workflow_id: impl Into<String>, workflow: Workflow, queue: SaveQueue) -> Self {
    Self {
      workflow_id: workflow_id.into(),
      workflow: workflow.ensure_submitted(),
      queue,
      autosave: false,
    }
  }

  /// Create a session and spawn its save worker on the current runtime.
  pub fn spawn(
    workflow_id: impl Into<String>,
    workflow: Workflow,
    store: Arc<dyn WorkflowStore>,
    cancel: CancellationToken,
  ) -> (Self, JoinHandle<()>) {
    let workflow_id = workflow_id.into();
    let (queue, worker) = save_channel(workflow_id.clone(), store);
    let handle = tokio::spawn(worker.run(cancel));
    (Self::new(workflow_id, workflow, queue), handle)
  }

  /// Start a session from a template.
  pub fn from_template(workflow_id: impl Into<String>, kind: TemplateKind, queue: SaveQueue) -> Self {
    Self::new(workflow_id, instantiate(kind), queue)
  }

  /// Load a stored workflow and start a session over it.
  ///
  /// A document that cannot be decoded fails the load as a whole; no partial
  /// graph is offered.
  pub async fn open(
    workflow_id: impl Into<String>,
    store: &dyn WorkflowStore,
    queue: SaveQueue,
  ) -> Result<Self, SessionError> {
    let workflow_id = workflow_id.into();
    let stored = store
      .load(&workflow_id)
      .await?
      .ok_or_else(|| SessionError::NotFound(workflow_id.clone()))?;

    let workflow = decode(&stored.document.0).map_err(|source| {
      warn!(workflow_id = %workflow_id, error = %source, "failed to decode stored workflow");
      SessionError::Load {
        workflow_id: workflow_id.clone(),
        source,
      }
    })?;

    info!(
        workflow_id = %workflow_id,
        steps = workflow.steps.len(),
        connections = workflow.connections.len(),
        "opened workflow"
    );
    Ok(Self::new(workflow_id, workflow, queue))
  }

  pub fn workflow_id(&self) -> &str {
    &self.workflow_id
  }

  /// The current graph.
  pub fn workflow(&self) -> &Workflow {
    &self.workflow
  }

  /// Save after every successful edit that leaves the graph valid.
  pub fn set_autosave(&mut self, autosave: bool) {
    self.autosave = autosave;
  }

  /// Replace the graph with a template instance.
  pub fn reset_to_template(&mut self, kind: TemplateKind) {
    self.workflow = instantiate(kind);
    self.after_edit();
  }

  /// Apply an edit expressed as a graph operation.
  pub fn apply<F>(&mut self, edit: F) -> Result<(), SessionError>
  where
    F: FnOnce(&Workflow) -> Result<Workflow, GraphError>,
  {
    self.workflow = edit(&self.workflow)?;
    self.after_edit();
    Ok(())
  }

  pub fn add_step(&mut self, position: Position, config: StepConfig) -> Result<String, SessionError> {
    let (workflow, step_id) = self.workflow.add_step(position, config)?;
    self.workflow = workflow;
    self.after_edit();
    Ok(step_id)
  }

  pub fn remove_step(&mut self, step_id: &str) -> Result<(), SessionError> {
    self.apply(|w| w.remove_step(step_id))
  }

  pub fn add_connection(&mut self, source: &str, target: &str) -> Result<String, SessionError> {
    let (workflow, connection_id) = self.workflow.add_connection(source, target)?;
    self.workflow = workflow;
    self.after_edit();
    Ok(connection_id)
  }

  pub fn remove_connection(&mut self, connection_id: &str) {
    self.workflow = self.workflow.remove_connection(connection_id);
    self.after_edit();
  }

  pub fn move_step(&mut self, step_id: &str, position: Position) -> Result<(), SessionError> {
    self.apply(|w| w.move_step(step_id, position))
  }

  pub fn update_step_config(&mut self, step_id: &str, config: StepConfig) -> Result<(), SessionError> {
    self.apply(|w| w.update_step_config(step_id, config))
  }

  /// Assign the roles selected in the editor to a step.
  pub fn assign_roles<S: AsRef<str>>(
    &mut self,
    step_id: &str,
    selection: &[S],
  ) -> Result<(), SessionError> {
    let step = self
      .workflow
      .get_step(step_id)
      .ok_or_else(|| GraphError::UnknownStep(step_id.to_string()))?;
    let config = normalize_roles(&step.config, selection);
    self.update_step_config(step_id, config)
  }

  /// Violations of the current graph.
  pub fn violations(&self) -> Vec<Violation> {
    self.workflow.validate()
  }

  /// Validate the graph and, if it is valid, enqueue it for saving.
  ///
  /// Returns the revision assigned to the save. An invalid graph is never
  /// handed to the store; its violations are returned instead.
  pub fn save(&mut self) -> Result<u64, SessionError> {
    let violations = self.workflow.validate();
    if !violations.is_empty() {
      debug!(
          workflow_id = %self.workflow_id,
          violations = violations.len(),
          "refusing to save invalid workflow"
      );
      return Err(SessionError::Invalid(violations));
    }

    Ok(self.queue.enqueue(encode(&self.workflow)))
  }

  /// Wait until the latest save has been attempted.
  pub async fn flush(&self) -> Result<(), SessionError> {
    self.queue.flush().await
  }

  /// The session's save queue.
  pub fn queue(&self) -> &SaveQueue {
    &self.queue
  }

  fn after_edit(&mut self) {
    if !self.autosave {
      return;
    }
    // Intermediate invalid states are normal while editing; they are simply
    // not persisted.
    if let Err(SessionError::Invalid(violations)) = self.save() {
      debug!(
          workflow_id = %self.workflow_id,
          violations = violations.len(),
          "skipping autosave"
      );
    }
  }
}
