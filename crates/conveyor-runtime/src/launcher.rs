//! Job launcher.

use std::sync::Arc;

use conveyor_backend::{JobBackend, JobHandle};
use conveyor_pipeline::JobTemplate;
use tracing::{info, instrument};

use crate::error::LaunchError;

/// Starts external batch jobs. Does not wait for completion.
pub struct JobLauncher {
  backend: Arc<dyn JobBackend>,
}

impl JobLauncher {
  pub fn new(backend: Arc<dyn JobBackend>) -> Self {
    Self { backend }
  }

  /// Validate the template locally, then schedule exactly one remote
  /// execution.
  ///
  /// Every missing required field is reported in one error, before any
  /// backend call. Retries, if any, are the orchestrator's decision; the
  /// launcher never retries internally.
  #[instrument(name = "job_launch", skip(self, template), fields(stage = %stage))]
  pub async fn launch(&self, stage: &str, template: &JobTemplate) -> Result<JobHandle, LaunchError> {
    let missing = template.missing_fields();
    if !missing.is_empty() {
      return Err(LaunchError::IncompleteTemplate {
        missing: missing.into_iter().map(String::from).collect(),
      });
    }

    let handle = self.backend.launch(template).await?;
    info!(
      job_id = %handle.job_id,
      task_definition = %template.task_definition,
      "job launched"
    );
    Ok(handle)
  }
}
