use std::collections::{HashMap, HashSet, VecDeque};

use crate::step::Step;
use crate::workflow::Connection;

/// Graph structure for traversal and analysis.
///
/// Connections whose endpoints are not both present are left out, so a graph
/// can be built for any workflow, including one the validator would reject.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Adjacency list: step_id -> list of downstream step_ids.
  adjacency: HashMap<String, Vec<String>>,
}

impl Graph {
  /// Build a graph from steps and connections.
  pub fn new(steps: &[Step], connections: &[Connection]) -> Self {
    let mut adjacency: HashMap<String, Vec<String>> = steps
      .iter()
      .map(|step| (step.id.clone(), Vec::new()))
      .collect();

    for connection in connections {
      if !adjacency.contains_key(&connection.target) {
        continue;
      }
      if let Some(downstream) = adjacency.get_mut(&connection.source) {
        downstream.push(connection.target.clone());
      }
    }

    Self { adjacency }
  }

  /// Get downstream steps for a given step.
  pub fn downstream(&self, step_id: &str) -> &[String] {
    self
      .adjacency
      .get(step_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Breadth-first forward traversal. The roots themselves are included.
  pub fn reachable_from<'a, I>(&self, roots: I) -> HashSet<String>
  where
    I: IntoIterator<Item = &'a str>,
  {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();

    for root in roots {
      if self.adjacency.contains_key(root) && visited.insert(root.to_string()) {
        queue.push_back(root.to_string());
      }
    }

    while let Some(current) = queue.pop_front() {
      for next in self.downstream(&current) {
        if visited.insert(next.clone()) {
          queue.push_back(next.clone());
        }
      }
    }

    visited
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::step::{FulfillmentConfig, StepConfig, SubmittedConfig};
  use stepgraph_config::Position;

  fn step(id: &str) -> Step {
    Step::new(
      id,
      StepConfig::Fulfillment(FulfillmentConfig::default()),
      Position::default(),
    )
  }

  fn connection(source: &str, target: &str) -> Connection {
    Connection {
      id: format!("{source}->{target}"),
      source: source.to_string(),
      target: target.to_string(),
    }
  }

  #[test]
  fn test_downstream_follows_connection_order() {
    let steps = vec![
      Step::new(
        "submitted",
        StepConfig::Submitted(SubmittedConfig::default()),
        Position::default(),
      ),
      step("a"),
      step("b"),
      step("c"),
    ];
    let connections = vec![
      connection("submitted", "a"),
      connection("submitted", "b"),
      connection("a", "c"),
      connection("b", "c"),
    ];

    let graph = Graph::new(&steps, &connections);
    assert_eq!(graph.downstream("submitted"), &["a".to_string(), "b".to_string()]);
    assert_eq!(graph.downstream("a"), &["c".to_string()]);
    assert!(graph.downstream("c").is_empty());
    assert!(graph.downstream("missing").is_empty());
  }

  #[test]
  fn test_dangling_connections_are_ignored() {
    let steps = vec![step("a"), step("b")];
    let connections = vec![connection("a", "ghost"), connection("ghost", "b")];

    let graph = Graph::new(&steps, &connections);
    assert!(graph.downstream("a").is_empty());
    assert!(graph.downstream("ghost").is_empty());
    assert!(!graph.reachable_from(["a"]).contains("b"));
  }

  #[test]
  fn test_reachable_from() {
    let steps = vec![step("a"), step("b"), step("c"), step("d")];
    let connections = vec![connection("a", "b"), connection("b", "c"), connection("d", "c")];

    let graph = Graph::new(&steps, &connections);
    let reached = graph.reachable_from(["a"]);
    assert!(reached.contains("a"));
    assert!(reached.contains("b"));
    assert!(reached.contains("c"));
    assert!(!reached.contains("d"));
  }

  #[test]
  fn test_reachable_from_unknown_root() {
    let graph = Graph::new(&[step("a")], &[]);
    assert!(graph.reachable_from(["missing"]).is_empty());
  }
}
