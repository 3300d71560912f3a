use thiserror::Error;

/// Errors found while resolving or validating a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
  /// Two states share a name.
  #[error("duplicate state name: {name}")]
  DuplicateState { name: String },

  /// The declared initial state does not exist.
  #[error("initial state '{name}' not found")]
  InitialStateMissing { name: String },

  /// The initial state is a terminal notify state.
  #[error("initial state '{name}' is terminal")]
  InitialStateTerminal { name: String },

  /// An edge references a state that does not exist.
  #[error("state '{state}' has {edge} edge to unknown state '{target}'")]
  UnknownEdgeTarget {
    state: String,
    edge: &'static str,
    target: String,
  },

  /// A non-terminal state is missing a required edge.
  #[error("state '{state}' is missing its {edge} edge")]
  MissingEdge { state: String, edge: &'static str },

  /// A terminal notify state has an outgoing edge.
  #[error("terminal state '{state}' must not have outgoing edges")]
  TerminalWithEdge { state: String },

  /// A failure edge targets a state that is not a failure-notify state.
  #[error("state '{state}' routes failures to '{target}', which is not a notify_failure state")]
  FailureTargetNotNotify { state: String, target: String },

  /// A state is unreachable from the initial state.
  #[error("state '{name}' is unreachable from the initial state")]
  UnreachableState { name: String },

  /// A job template is missing fields the execution backend requires.
  #[error("state '{state}' has an incomplete job template: missing {}", missing.join(", "))]
  IncompleteJobTemplate {
    state: String,
    missing: Vec<&'static str>,
  },

  /// The pipeline declares no states at all.
  #[error("pipeline '{pipeline_id}' has no states")]
  Empty { pipeline_id: String },
}
