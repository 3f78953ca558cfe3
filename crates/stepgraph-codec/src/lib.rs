//! Stepgraph Codec
//!
//! Bidirectional mapping between a [`Workflow`](stepgraph_workflow::Workflow)
//! and the persisted [`WorkflowDocument`](stepgraph_config::WorkflowDocument).
//!
//! - [`encode`] emits only contract fields.
//! - [`decode`] checks the version marker before anything else, reconstructs
//!   the graph, synthesizes a missing submitted step and rejects the document
//!   if the validator reports any violation.
//! - [`sanitize`] strips non-contract data fields from a raw editor document.
//!
//! For any graph that passes validation, `decode(encode(g)) == g`.

mod decode;
mod encode;
mod error;
mod fields;
mod sanitize;

pub use decode::{check_document_version, decode, decode_document, decode_str, reconstruct};
pub use encode::{encode, encode_value};
pub use error::CodecError;
pub use fields::{APPROVER_ROLE_PREFIX, FULFILLER_ROLE_PREFIX, is_schema_field, role_field};
pub use sanitize::sanitize;

/// Newest document version this reader understands.
pub const SUPPORTED_VERSION: u32 = stepgraph_workflow::SCHEMA_VERSION;
