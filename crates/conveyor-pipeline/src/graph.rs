use std::collections::{HashMap, HashSet};

use crate::state::State;

/// Graph structure over the state machine for traversal and analysis.
///
/// Edges are the `next` and `on_failure` references of each state.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Adjacency list: state name -> list of downstream state names.
  adjacency: HashMap<String, Vec<String>>,
}

impl Graph {
  /// Build a graph from locked states.
  pub fn new(states: &HashMap<String, State>) -> Self {
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();

    for (name, state) in states {
      let entry = adjacency.entry(name.clone()).or_default();
      if let Some(next) = &state.next {
        entry.push(next.clone());
      }
      if let Some(on_failure) = &state.on_failure {
        entry.push(on_failure.clone());
      }
    }

    Self { adjacency }
  }

  /// Get downstream states for a given state.
  pub fn downstream(&self, name: &str) -> &[String] {
    self
      .adjacency
      .get(name)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// All states reachable from `from`, including `from` itself.
  pub fn reachable_from(&self, from: &str) -> HashSet<String> {
    let mut seen = HashSet::new();
    let mut stack = vec![from.to_string()];

    while let Some(name) = stack.pop() {
      if !seen.insert(name.clone()) {
        continue;
      }
      for target in self.downstream(&name) {
        if !seen.contains(target) {
          stack.push(target.clone());
        }
      }
    }

    seen
  }
}
