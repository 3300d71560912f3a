use thiserror::Error;

/// Errors surfaced by the job execution backend or the event bus.
#[derive(Debug, Error)]
pub enum BackendError {
  /// The backend refused to schedule the job.
  #[error("launch rejected: {message}")]
  LaunchRejected { message: String },

  /// The backend could not be reached or answered with a transient fault.
  #[error("backend unavailable: {message}")]
  Unavailable { message: String },

  /// The backend does not recognize the given job handle.
  #[error("unknown job: {job_id}")]
  UnknownJob { job_id: String },
}

/// Failure to deliver a terminal notification. Best-effort: logged by the
/// caller, never retried, never alters the run's terminal state.
#[derive(Debug, Error)]
#[error("failed to publish notification '{subject}': {message}")]
pub struct NotifyError {
  pub subject: String,
  pub message: String,
}
