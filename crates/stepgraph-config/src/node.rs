use serde::{Deserialize, Serialize};

use crate::enums::StepType;

/// Raw node data as sent by the editor.
pub type NodeData = serde_json::Map<String, serde_json::Value>;

/// Display position of a node on the canvas. Opaque to validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
  pub x: f64,
  pub y: f64,
}

impl Position {
  pub const fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
  pub id: String,
  #[serde(rename = "type")]
  pub node_type: StepType,
  #[serde(default)]
  pub data: NodeData,
  pub position: Position,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub deletable: Option<bool>,
}
