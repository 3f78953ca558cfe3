//! Serialized, coalescing persistence.
//!
//! Each workflow gets one [`SaveWorker`]. The [`SaveQueue`] publishes the
//! latest encoded document on a watch channel; the worker saves whatever is
//! newest, one save at a time. Documents enqueued while a save is in flight
//! replace each other, so only the newest of them is written next and writes
//! can never reach the store out of order.

use std::sync::Arc;

use stepgraph_config::WorkflowDocument;
use stepgraph_store::WorkflowStore;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::SessionError;

/// A document waiting to be saved.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
  pub revision: u64,
  pub document: WorkflowDocument,
}

/// Progress reported by the save worker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveStatus {
  /// Newest revision the worker has finished trying to save.
  pub attempted_revision: u64,
  /// Newest revision that reached the store.
  pub saved_revision: u64,
  /// Number of store calls made.
  pub saves: u64,
  /// Error of the last attempt, if it failed.
  pub last_error: Option<String>,
}

/// Create the queue and worker pair for one workflow.
pub fn save_channel(
  workflow_id: impl Into<String>,
  store: Arc<dyn WorkflowStore>,
) -> (SaveQueue, SaveWorker) {
  let workflow_id = workflow_id.into();
  let (pending_tx, pending_rx) = watch::channel(None);
  let (status_tx, status_rx) = watch::channel(SaveStatus::default());

  let queue = SaveQueue {
    workflow_id: workflow_id.clone(),
    pending: pending_tx,
    status: status_rx,
    revision: 0,
  };
  let worker = SaveWorker {
    workflow_id,
    store,
    pending: pending_rx,
    status: status_tx,
  };
  (queue, worker)
}

/// Producer side: hands documents to the worker.
#[derive(Debug)]
pub struct SaveQueue {
  workflow_id: String,
  pending: watch::Sender<Option<PendingSave>>,
  status: watch::Receiver<SaveStatus>,
  revision: u64,
}

impl SaveQueue {
  /// Enqueue a document, superseding any document not yet picked up.
  ///
  /// Returns the revision assigned to it.
  pub fn enqueue(&mut self, document: WorkflowDocument) -> u64 {
    self.revision += 1;
    let revision = self.revision;
    let superseded = self
      .pending
      .send_replace(Some(PendingSave { revision, document }));

    debug!(
      workflow_id = %self.workflow_id,
      revision,
      superseded = ?superseded.map(|p| p.revision),
      "enqueued workflow save"
    );
    revision
  }

  /// Revision of the newest enqueued document (0 before the first save).
  pub fn revision(&self) -> u64 {
    self.revision
  }

  pub fn status(&self) -> SaveStatus {
    self.status.borrow().clone()
  }

  /// Wait until the newest enqueued revision has been attempted.
  pub async fn flush(&self) -> Result<(), SessionError> {
    let target = self.revision;
    let mut status = self.status.clone();
    let status = status
      .wait_for(|s| s.attempted_revision >= target)
      .await
      .map_err(|_| SessionError::WorkerStopped)?
      .clone();

    if status.saved_revision >= target {
      Ok(())
    } else {
      Err(SessionError::SaveFailed {
        revision: status.attempted_revision,
        message: status.last_error.unwrap_or_default(),
      })
    }
  }
}

/// Consumer side: performs the saves.
pub struct SaveWorker {
  workflow_id: String,
  store: Arc<dyn WorkflowStore>,
  pending: watch::Receiver<Option<PendingSave>>,
  status: watch::Sender<SaveStatus>,
}

impl SaveWorker {
  /// Run the save loop.
  ///
  /// Returns when the cancellation token is triggered or the queue is
  /// dropped. A document enqueued right before the queue was dropped is still
  /// saved. A save that has started is always allowed to finish.
  pub async fn run(mut self, cancel: CancellationToken) {
    info!(workflow_id = %self.workflow_id, "starting save worker");

    loop {
      tokio::select! {
          _ = cancel.cancelled() => {
              info!(workflow_id = %self.workflow_id, "save worker cancelled");
              break;
          }
          changed = self.pending.changed() => {
              if changed.is_err() {
                  info!(workflow_id = %self.workflow_id, "save queue closed");
                  break;
              }

              let pending = self.pending.borrow_and_update().clone();
              if let Some(pending) = pending {
                  self.save(pending).await;
              }
          }
      }
    }
  }

  async fn save(&self, pending: PendingSave) {
    let result = self
      .store
      .save(&self.workflow_id, &pending.document)
      .await;

    match &result {
      Ok(()) => {
        info!(
            workflow_id = %self.workflow_id,
            revision = pending.revision,
            "workflow saved"
        );
      }
      Err(e) => {
        error!(
            workflow_id = %self.workflow_id,
            revision = pending.revision,
            error = %e,
            "workflow save failed"
        );
      }
    }

    self.status.send_modify(|status| {
      status.attempted_revision = pending.revision;
      status.saves += 1;
      match result {
        Ok(()) => {
          status.saved_revision = pending.revision;
          status.last_error = None;
        }
        Err(e) => status.last_error = Some(e.to_string()),
      }
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;
  use stepgraph_store::MemoryStore;

  fn document(version: u32) -> WorkflowDocument {
    WorkflowDocument {
      version,
      nodes: vec![],
      edges: vec![],
    }
  }

  #[tokio::test]
  async fn test_flush_without_saves() {
    let store = Arc::new(MemoryStore::new());
    let (queue, _worker) = save_channel("wf", store);
    queue.flush().await.unwrap();
    assert_eq!(queue.status(), SaveStatus::default());
  }

  #[tokio::test]
  async fn test_enqueue_and_flush() {
    let store = Arc::new(MemoryStore::new());
    let (mut queue, worker) = save_channel("wf", store.clone());
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(worker.run(cancel.clone()));

    let revision = queue.enqueue(document(1));
    assert_eq!(revision, 1);
    queue.flush().await.unwrap();

    assert_eq!(queue.status().saved_revision, 1);
    assert!(store.load("wf").await.unwrap().is_some());

    cancel.cancel();
    handle.await.unwrap();
  }

  #[tokio::test]
  async fn test_worker_stops_when_queue_dropped() {
    let store = Arc::new(MemoryStore::new());
    let (mut queue, worker) = save_channel("wf", store.clone());
    let handle = tokio::spawn(worker.run(CancellationToken::new()));

    queue.enqueue(document(1));
    drop(queue);

    tokio::time::timeout(Duration::from_secs(5), handle)
      .await
      .unwrap()
      .unwrap();
    // The last document is saved before the worker exits.
    assert!(store.load("wf").await.unwrap().is_some());
  }

  #[tokio::test]
  async fn test_flush_reports_stopped_worker() {
    let store = Arc::new(MemoryStore::new());
    let (mut queue, worker) = save_channel("wf", store);
    drop(worker);

    queue.enqueue(document(1));
    assert!(matches!(
      queue.flush().await,
      Err(SessionError::WorkerStopped)
    ));
  }
}
