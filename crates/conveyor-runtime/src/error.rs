//! Runtime errors.

use std::time::Duration;

use conveyor_backend::BackendError;
use conveyor_pipeline::PipelineError;
use thiserror::Error;

/// Failure to start an external job.
#[derive(Debug, Error)]
pub enum LaunchError {
  /// The template lacks fields the execution backend requires. Detected
  /// locally, before any network call.
  #[error("job template is missing required fields: {}", missing.join(", "))]
  IncompleteTemplate { missing: Vec<String> },

  /// The backend refused or could not schedule the job.
  #[error(transparent)]
  Backend(#[from] BackendError),
}

/// A stage failure. Terminal for the run: the orchestrator routes it to
/// the stage's failure state and never retries the same run.
#[derive(Debug, Error)]
pub enum StageError {
  /// The job could not be launched.
  #[error("could not launch job for stage '{stage}': {source}")]
  Launch {
    stage: String,
    #[source]
    source: LaunchError,
  },

  /// The job ran and reported a structured failure.
  #[error("job for stage '{stage}' failed: {cause}")]
  JobFailed {
    stage: String,
    cause: String,
    details: Option<serde_json::Value>,
  },

  /// No terminal job state was observed within the wait bound.
  #[error("stage '{stage}' saw no terminal job state within {}s", max_wait.as_secs())]
  Timeout { stage: String, max_wait: Duration },

  /// The confirmation signal never arrived.
  #[error("stage '{stage}' received no confirmation for '{subject}' within {}s", timeout.as_secs())]
  Verification {
    stage: String,
    subject: String,
    timeout: Duration,
    detail: Option<String>,
  },
}

/// Errors that abort a run without reaching a failure-notify state.
///
/// These indicate a broken pipeline, not a failed stage; a validated
/// pipeline never produces them.
#[derive(Debug, Error)]
pub enum RunError {
  #[error("invalid pipeline: {source}")]
  InvalidPipeline {
    #[source]
    source: PipelineError,
  },

  #[error("state '{name}' not found in pipeline")]
  UnknownState { name: String },

  #[error("state '{state}' is missing its {edge} edge")]
  MissingEdge { state: String, edge: &'static str },
}
