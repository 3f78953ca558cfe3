use stepgraph_config::WorkflowDocument;

use crate::fields::is_schema_field;

/// Drop every data field that is not part of the contract for its node type.
///
/// Node ids, types, positions and edges are left alone; this does not build or
/// validate a graph.
pub fn sanitize(document: &WorkflowDocument) -> WorkflowDocument {
  let mut sanitized = document.clone();
  for node in &mut sanitized.nodes {
    let node_type = node.node_type;
    node.data.retain(|key, _| is_schema_field(node_type, key));
  }
  sanitized
}
