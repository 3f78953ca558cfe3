//! Stepgraph Session
//!
//! This crate ties the workflow model to persistence for one editing session.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      EditorSession                          │
//! │  - owns the current Workflow exclusively                    │
//! │  - graph edits, role assignment, templates                  │
//! │  - save(): validate → encode → enqueue                      │
//! └─────────────────────────────────────────────────────────────┘
//!                               │ watch channel (latest value)
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       SaveWorker                            │
//! │  - one save in flight at a time                             │
//! │  - edits made during a save are coalesced into the next one │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      WorkflowStore                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let store: Arc<dyn WorkflowStore> = Arc::new(MemoryStore::new());
//! let cancel = CancellationToken::new();
//!
//! let (mut session, worker) = EditorSession::spawn(
//!     "purchase-request",
//!     instantiate(TemplateKind::SingleApproval),
//!     store,
//!     cancel.clone(),
//! );
//!
//! session.assign_roles(&approval_id, &["finance", "legal"])?;
//! session.save()?;
//! session.flush().await?;
//! ```

mod directory;
mod error;
mod saver;
mod session;

pub use directory::{
  DirectoryError, Role, RoleDirectory, RoleOption, StaleRole, StaticRoleDirectory, role_options,
  stale_roles,
};
pub use error::SessionError;
pub use saver::{PendingSave, SaveQueue, SaveStatus, SaveWorker, save_channel};
pub use session::EditorSession;
