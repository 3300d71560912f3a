use std::collections::HashMap;

use crate::error::PipelineError;
use crate::graph::Graph;
use crate::state::{State, StateAction};

/// A locked pipeline ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
  pub pipeline_id: String,
  pub name: String,
  pub initial_state: String,
  pub states: HashMap<String, State>,
}

impl Pipeline {
  /// Build the graph structure for traversal.
  pub fn graph(&self) -> Graph {
    Graph::new(&self.states)
  }

  /// Get a state by name.
  pub fn get_state(&self, name: &str) -> Option<&State> {
    self.states.get(name)
  }

  /// Validate the state graph independently of execution.
  ///
  /// Checks, in order: the pipeline has states, the initial state exists
  /// and is not terminal, every edge targets an existing state, terminal
  /// states have no outgoing edges, non-terminal states have both edges,
  /// failure edges target failure-notify states, job templates carry the
  /// fields the backend requires, and every state is reachable from the
  /// initial state.
  pub fn validate(&self) -> Result<(), PipelineError> {
    if self.states.is_empty() {
      return Err(PipelineError::Empty {
        pipeline_id: self.pipeline_id.clone(),
      });
    }

    let initial = self.states.get(&self.initial_state).ok_or_else(|| {
      PipelineError::InitialStateMissing {
        name: self.initial_state.clone(),
      }
    })?;
    if initial.is_terminal() {
      return Err(PipelineError::InitialStateTerminal {
        name: self.initial_state.clone(),
      });
    }

    for state in self.states.values() {
      self.validate_edges(state)?;

      if let StateAction::RunJob(template) = &state.action {
        let missing = template.missing_fields();
        if !missing.is_empty() {
          return Err(PipelineError::IncompleteJobTemplate {
            state: state.name.clone(),
            missing,
          });
        }
      }
    }

    let reachable = self.graph().reachable_from(&self.initial_state);
    let mut names: Vec<&String> = self.states.keys().collect();
    names.sort();
    for name in names {
      if !reachable.contains(name) {
        return Err(PipelineError::UnreachableState { name: name.clone() });
      }
    }

    Ok(())
  }

  fn validate_edges(&self, state: &State) -> Result<(), PipelineError> {
    if state.is_terminal() {
      if state.next.is_some() || state.on_failure.is_some() {
        return Err(PipelineError::TerminalWithEdge {
          state: state.name.clone(),
        });
      }
      return Ok(());
    }

    for (edge, target) in [("next", &state.next), ("on_failure", &state.on_failure)] {
      let target = target.as_ref().ok_or_else(|| PipelineError::MissingEdge {
        state: state.name.clone(),
        edge,
      })?;
      if !self.states.contains_key(target) {
        return Err(PipelineError::UnknownEdgeTarget {
          state: state.name.clone(),
          edge,
          target: target.clone(),
        });
      }
    }

    // Checked above: on_failure is present for non-terminal states.
    let failure_target = state.on_failure.as_ref().unwrap();
    let target_state = &self.states[failure_target];
    if !matches!(target_state.action, StateAction::NotifyFailure(_)) {
      return Err(PipelineError::FailureTargetNotNotify {
        state: state.name.clone(),
        target: failure_target.clone(),
      });
    }

    Ok(())
  }
}
