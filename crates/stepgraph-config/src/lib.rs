//! Stepgraph Config
//!
//! This crate contains the serializable document types for stepgraph.
//! A [`WorkflowDocument`] is the exact shape handed to (and read back from)
//! the persistence endpoint:
//!
//! ```json
//! {
//!   "version": 1,
//!   "nodes": [
//!     { "id": "submitted", "type": "submitted",
//!       "data": { "label": "Submitted" },
//!       "position": { "x": 0, "y": 0 }, "deletable": false }
//!   ],
//!   "edges": []
//! }
//! ```
//!
//! Node `data` is kept as an open JSON map because that is what editors send.
//! Turning it into typed step configuration (and dropping anything that is not
//! part of the contract) is the job of `stepgraph-codec`.

mod document;
mod edge;
mod enums;
mod node;

pub use document::{VersionMarker, WorkflowDocument};
pub use edge::EdgeDocument;
pub use enums::{ApprovalMode, StepType};
pub use node::{NodeData, NodeDocument, Position};
