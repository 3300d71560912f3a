use async_trait::async_trait;
use chrono::{DateTime, Utc};
use conveyor_pipeline::JobTemplate;

use crate::error::BackendError;

/// Opaque reference to a launched job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobHandle {
  pub job_id: String,
  pub launched_at: DateTime<Utc>,
}

impl JobHandle {
  pub fn new(job_id: impl Into<String>) -> Self {
    Self {
      job_id: job_id.into(),
      launched_at: Utc::now(),
    }
  }
}

/// Current status of a launched job as reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
  Running,
  Succeeded,
  /// The job ran and reported a structured failure.
  Failed {
    cause: String,
    details: Option<serde_json::Value>,
  },
}

/// The job execution backend.
///
/// Implementations must tolerate concurrent use: independent pipeline runs
/// share one backend instance.
#[async_trait]
pub trait JobBackend: Send + Sync {
  /// Schedule exactly one remote execution of the template. Returns as
  /// soon as the job is accepted; never waits for completion and never
  /// retries internally.
  async fn launch(&self, template: &JobTemplate) -> Result<JobHandle, BackendError>;

  /// Report the current status of a launched job.
  async fn status(&self, handle: &JobHandle) -> Result<JobStatus, BackendError>;
}
