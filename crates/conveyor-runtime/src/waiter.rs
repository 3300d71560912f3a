//! Completion waiter.

use std::sync::Arc;
use std::time::Duration;

use conveyor_backend::{JobBackend, JobHandle, JobStatus};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// How a completion wait is bounded.
#[derive(Debug, Clone, Copy)]
pub struct WaitSettings {
  /// Fixed interval between status polls.
  pub poll_interval: Duration,
  /// Upper bound on the whole wait.
  pub max_wait: Duration,
}

/// Terminal result of waiting on one job.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
  Succeeded,
  /// The job ran and reported a structured failure.
  Failed {
    cause: String,
    details: Option<serde_json::Value>,
  },
  /// No terminal state within `max_wait`. Distinct from a job-reported
  /// failure.
  TimedOut,
  /// The run was cancelled at a suspension point.
  Cancelled,
}

/// Blocks (cooperatively) until a launched job reaches a terminal state.
pub struct CompletionWaiter {
  backend: Arc<dyn JobBackend>,
}

impl CompletionWaiter {
  pub fn new(backend: Arc<dyn JobBackend>) -> Self {
    Self { backend }
  }

  /// Poll the job at a fixed interval until it reaches a terminal state,
  /// the wait bound passes, or the run is cancelled.
  ///
  /// A failed status poll is logged and polling continues: transient
  /// backend faults are tolerated inside the wait bound, and a
  /// persistently unreachable backend surfaces as `TimedOut`.
  #[instrument(
    name = "await_completion",
    skip(self, handle, settings, cancel),
    fields(stage = %stage, job_id = %handle.job_id)
  )]
  pub async fn await_completion(
    &self,
    stage: &str,
    handle: &JobHandle,
    settings: WaitSettings,
    cancel: &CancellationToken,
  ) -> WaitOutcome {
    let deadline = Instant::now() + settings.max_wait;

    loop {
      if cancel.is_cancelled() {
        return WaitOutcome::Cancelled;
      }

      match self.backend.status(handle).await {
        Ok(JobStatus::Succeeded) => {
          info!("job completed");
          return WaitOutcome::Succeeded;
        }
        Ok(JobStatus::Failed { cause, details }) => {
          warn!(cause = %cause, "job reported failure");
          return WaitOutcome::Failed { cause, details };
        }
        Ok(JobStatus::Running) => {}
        Err(e) => {
          warn!(error = %e, "status poll failed, will retry");
        }
      }

      if Instant::now() >= deadline {
        warn!(max_wait_s = settings.max_wait.as_secs(), "completion wait timed out");
        return WaitOutcome::TimedOut;
      }

      tokio::select! {
        _ = cancel.cancelled() => return WaitOutcome::Cancelled,
        _ = tokio::time::sleep(settings.poll_interval) => {}
      }
    }
  }
}
