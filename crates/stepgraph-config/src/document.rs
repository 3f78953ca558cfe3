use serde::{Deserialize, Serialize};

use crate::edge::EdgeDocument;
use crate::node::NodeDocument;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
  pub version: u32,
  pub nodes: Vec<NodeDocument>,
  pub edges: Vec<EdgeDocument>,
}

/// Reads only the version marker of a document.
///
/// Readers check the version before committing to the rest of the shape, which
/// may differ in newer schema versions. The marker is kept as a raw JSON
/// number so that versions too large for the document's own field can still
/// be compared.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionMarker {
  pub version: serde_json::Number,
}

impl VersionMarker {
  /// The version as a non-negative integer.
  ///
  /// Integers beyond `u64` (which JSON parsers hand over as floats) saturate
  /// to `u64::MAX`. Negative or fractional markers give `None`.
  pub fn as_u64(&self) -> Option<u64> {
    if let Some(version) = self.version.as_u64() {
      return Some(version);
    }
    match self.version.as_f64() {
      Some(version) if version >= 0.0 && version.fract() == 0.0 => Some(version as u64),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{Position, StepType};
  use serde_json::json;

  #[test]
  fn test_parse_document() {
    let doc: WorkflowDocument = serde_json::from_value(json!({
      "version": 1,
      "nodes": [
        {
          "id": "submitted",
          "type": "submitted",
          "data": { "label": "Submitted" },
          "position": { "x": 0, "y": 0 },
          "deletable": false
        },
        {
          "id": "a1",
          "type": "approval",
          "data": { "approvalMode": "role", "approverRole1": "finance", "minApprovals": 1 },
          "position": { "x": 250.5, "y": -10 }
        }
      ],
      "edges": [{ "id": "e1", "source": "submitted", "target": "a1" }]
    }))
    .unwrap();

    assert_eq!(doc.nodes.len(), 2);
    assert_eq!(doc.nodes[0].node_type, StepType::Submitted);
    assert_eq!(doc.nodes[0].deletable, Some(false));
    assert_eq!(doc.nodes[1].deletable, None);
    assert_eq!(doc.nodes[1].position, Position::new(250.5, -10.0));
    assert_eq!(doc.edges[0].target, "a1");
  }

  #[test]
  fn test_unknown_node_fields_are_ignored() {
    let doc: WorkflowDocument = serde_json::from_value(json!({
      "version": 1,
      "nodes": [{
        "id": "submitted",
        "type": "submitted",
        "position": { "x": 0, "y": 0 },
        "selected": true,
        "width": 180
      }],
      "edges": []
    }))
    .unwrap();

    assert!(doc.nodes[0].data.is_empty());
    let out = serde_json::to_value(&doc).unwrap();
    assert!(out["nodes"][0].get("selected").is_none());
    assert!(out["nodes"][0].get("deletable").is_none());
  }

  #[test]
  fn test_unknown_step_type_is_rejected() {
    let result: Result<WorkflowDocument, _> = serde_json::from_value(json!({
      "version": 1,
      "nodes": [{ "id": "x", "type": "notification", "position": { "x": 0, "y": 0 } }],
      "edges": []
    }));
    assert!(result.is_err());
  }

  #[test]
  fn test_version_marker_ignores_rest_of_document() {
    let marker: VersionMarker =
      serde_json::from_value(json!({ "version": 7, "nodes": "whatever" })).unwrap();
    assert_eq!(marker.as_u64(), Some(7));
  }

  #[test]
  fn test_version_marker_beyond_u32() {
    let marker: VersionMarker = serde_json::from_value(json!({ "version": 4294967296u64 })).unwrap();
    assert_eq!(marker.as_u64(), Some(4_294_967_296));

    let marker: VersionMarker = serde_json::from_str(r#"{ "version": 1e30 }"#).unwrap();
    assert_eq!(marker.as_u64(), Some(u64::MAX));

    let marker: VersionMarker =
      serde_json::from_str(r#"{ "version": 100000000000000000000000 }"#).unwrap();
    assert_eq!(marker.as_u64(), Some(u64::MAX));
  }

  #[test]
  fn test_version_marker_rejects_non_integers() {
    for text in [r#"{ "version": -1 }"#, r#"{ "version": 1.5 }"#] {
      let marker: VersionMarker = serde_json::from_str(text).unwrap();
      assert_eq!(marker.as_u64(), None, "{text}");
    }
  }
}
