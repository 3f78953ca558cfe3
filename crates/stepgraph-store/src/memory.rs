use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use stepgraph_config::WorkflowDocument;
use tokio::sync::RwLock;

use crate::{Error, StoredWorkflow, WorkflowStore, WorkflowSummary};

/// In-memory store, for tests and short-lived sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
  workflows: RwLock<HashMap<String, StoredWorkflow>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert a raw JSON document, bypassing the typed contract.
  pub async fn insert_raw(&self, workflow_id: &str, document: serde_json::Value) {
    let stored = StoredWorkflow {
      workflow_id: workflow_id.to_string(),
      document: Json(document),
      updated_at: Utc::now(),
    };
    self
      .workflows
      .write()
      .await
      .insert(workflow_id.to_string(), stored);
  }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
  async fn load(&self, workflow_id: &str) -> Result<Option<StoredWorkflow>, Error> {
    Ok(self.workflows.read().await.get(workflow_id).cloned())
  }

  async fn save(&self, workflow_id: &str, document: &WorkflowDocument) -> Result<(), Error> {
    let document = serde_json::to_value(document)?;
    self.insert_raw(workflow_id, document).await;
    Ok(())
  }

  async fn list(&self) -> Result<Vec<WorkflowSummary>, Error> {
    let mut summaries: Vec<WorkflowSummary> = self
      .workflows
      .read()
      .await
      .values()
      .map(|w| WorkflowSummary {
        workflow_id: w.workflow_id.clone(),
        updated_at: w.updated_at,
      })
      .collect();
    summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(summaries)
  }

  async fn delete(&self, workflow_id: &str) -> Result<(), Error> {
    match self.workflows.write().await.remove(workflow_id) {
      Some(_) => Ok(()),
      None => Err(Error::NotFound(workflow_id.to_string())),
    }
  }
}
