//! Run execution.

use chrono::Utc;
use conveyor_pipeline::{FailureNotice, JobTemplate, State, StateAction, SuccessNotice, VerifySpec};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::bridge::VerifyOutcome;
use crate::error::{RunError, StageError};
use crate::events::{RunEvent, RunObserver};
use crate::notifier::{cancelled_notification, failure_notification, success_notification};
use crate::run::{ErrorContext, FailureKind, PipelineRun, RunOutcome, RunReport};
use crate::runtime::PipelineRuntime;
use crate::waiter::{WaitOutcome, WaitSettings};

/// How one stage resolved.
enum StepOutcome {
  Advanced,
  Failed(StageError),
  Cancelled,
}

/// A handle to one pipeline run.
///
/// Call `.wait()` to drive the run to a terminal state and get the report.
pub struct RunExecution<'a, O: RunObserver> {
  runtime: &'a PipelineRuntime<O>,
  run: PipelineRun,
  cancel: CancellationToken,
}

impl<'a, O: RunObserver> RunExecution<'a, O> {
  pub(crate) fn new(runtime: &'a PipelineRuntime<O>, run_id: String, cancel: CancellationToken) -> Self {
    let run = PipelineRun::new(run_id, &runtime.pipeline.initial_state);
    Self {
      runtime,
      run,
      cancel,
    }
  }

  pub fn run_id(&self) -> &str {
    &self.run.run_id
  }

  /// Drive the run to a terminal state.
  ///
  /// Every path through here ends in exactly one terminal notification:
  /// success, one typed failure, or cancellation.
  #[instrument(
    name = "pipeline_run",
    skip(self),
    fields(
      pipeline_id = %self.runtime.pipeline.pipeline_id,
      run_id = %self.run.run_id,
    )
  )]
  pub async fn wait(mut self) -> Result<RunReport, RunError> {
    self
      .runtime
      .pipeline
      .validate()
      .map_err(|source| RunError::InvalidPipeline { source })?;

    info!(initial_state = %self.run.state, "run_started");
    self.runtime.observer.observe(RunEvent::RunStarted {
      run_id: self.run.run_id.clone(),
      pipeline_id: self.runtime.pipeline.pipeline_id.clone(),
    });

    loop {
      let state = self
        .runtime
        .pipeline
        .get_state(&self.run.state)
        .cloned()
        .ok_or_else(|| RunError::UnknownState {
          name: self.run.state.clone(),
        })?;

      let step = match &state.action {
        StateAction::NotifySuccess(notice) => {
          return Ok(self.finish_success(notice).await);
        }
        StateAction::NotifyFailure(notice) => {
          return Ok(self.finish_failure(&state, notice).await);
        }
        StateAction::RunJob(template) => self.run_job_stage(&state, template).await,
        StateAction::Verify(spec) => self.verify_stage(&state, spec).await,
      };

      match step {
        StepOutcome::Advanced => {
          info!(state = %state.name, "stage_completed");
          self.runtime.observer.observe(RunEvent::StageCompleted {
            run_id: self.run.run_id.clone(),
            state: state.name.clone(),
          });

          let next = state.next.clone().ok_or(RunError::MissingEdge {
            state: state.name.clone(),
            edge: "next",
          })?;
          self.run.transition_to(&next);
        }
        StepOutcome::Failed(stage_error) => {
          warn!(state = %state.name, error = %stage_error, "stage_failed");
          self.runtime.observer.observe(RunEvent::StageFailed {
            run_id: self.run.run_id.clone(),
            state: state.name.clone(),
            error: stage_error.to_string(),
          });

          let failure_state = state.on_failure.clone().ok_or(RunError::MissingEdge {
            state: state.name.clone(),
            edge: "on_failure",
          })?;
          let notice = match self.runtime.pipeline.get_state(&failure_state).map(|s| &s.action) {
            Some(StateAction::NotifyFailure(notice)) => notice.clone(),
            _ => {
              return Err(RunError::UnknownState {
                name: failure_state,
              });
            }
          };

          self
            .run
            .fail(build_error_context(&state.name, &stage_error, &notice));
          self.run.transition_to(&failure_state);
        }
        StepOutcome::Cancelled => {
          return Ok(self.finish_cancelled().await);
        }
      }
    }
  }

  /// Launch the stage's job and wait for it to complete.
  async fn run_job_stage(&mut self, state: &State, template: &JobTemplate) -> StepOutcome {
    self.stage_started(state);
    if self.cancel.is_cancelled() {
      return StepOutcome::Cancelled;
    }

    let handle = match self.runtime.launcher.launch(&state.name, template).await {
      Ok(handle) => handle,
      Err(source) => {
        return StepOutcome::Failed(StageError::Launch {
          stage: state.name.clone(),
          source,
        });
      }
    };

    let settings = WaitSettings {
      poll_interval: state.poll_interval.unwrap_or(self.runtime.config.poll_interval),
      max_wait: state.max_wait.unwrap_or(self.runtime.config.max_wait),
    };

    match self
      .runtime
      .waiter
      .await_completion(&state.name, &handle, settings, &self.cancel)
      .await
    {
      WaitOutcome::Succeeded => StepOutcome::Advanced,
      WaitOutcome::Failed { cause, details } => StepOutcome::Failed(StageError::JobFailed {
        stage: state.name.clone(),
        cause,
        details,
      }),
      WaitOutcome::TimedOut => StepOutcome::Failed(StageError::Timeout {
        stage: state.name.clone(),
        max_wait: settings.max_wait,
      }),
      WaitOutcome::Cancelled => StepOutcome::Cancelled,
    }
  }

  /// Publish the check event and wait for confirmation.
  async fn verify_stage(&mut self, state: &State, spec: &VerifySpec) -> StepOutcome {
    self.stage_started(state);
    if self.cancel.is_cancelled() {
      return StepOutcome::Cancelled;
    }

    let poll_interval = state.poll_interval.unwrap_or(self.runtime.config.poll_interval);

    match self
      .runtime
      .bridge
      .verify(&state.name, spec, poll_interval, &self.cancel)
      .await
    {
      VerifyOutcome::Confirmed => StepOutcome::Advanced,
      VerifyOutcome::Unconfirmed { detail } => StepOutcome::Failed(StageError::Verification {
        stage: state.name.clone(),
        subject: spec.check_subject.clone(),
        timeout: spec.confirm_timeout,
        detail,
      }),
      VerifyOutcome::Cancelled => StepOutcome::Cancelled,
    }
  }

  fn stage_started(&self, state: &State) {
    info!(state = %state.name, "stage_started");
    self.runtime.observer.observe(RunEvent::StageStarted {
      run_id: self.run.run_id.clone(),
      state: state.name.clone(),
    });
  }

  async fn finish_success(&mut self, notice: &SuccessNotice) -> RunReport {
    self.run.finish();
    let finished_at = self.run.finished_at.unwrap_or_else(Utc::now);

    let notification =
      success_notification(&notice.subject, &self.runtime.pipeline.name, finished_at);
    self.runtime.notifier.notify(&mut self.run, notification).await;

    info!("run_completed");
    self.runtime.observer.observe(RunEvent::RunCompleted {
      run_id: self.run.run_id.clone(),
    });

    RunReport {
      outcome: RunOutcome::Succeeded,
      run: self.run.clone(),
    }
  }

  async fn finish_failure(&mut self, state: &State, notice: &FailureNotice) -> RunReport {
    self.run.finish();

    // A validated pipeline only enters a failure state through the fail
    // route, so the context is present; fall back to the notice's fixed
    // message if a hand-built pipeline got here another way.
    let context = self.run.error.clone().unwrap_or_else(|| ErrorContext {
      stage: state.name.clone(),
      error: notice.error.clone(),
      cause: notice.cause.clone(),
      kind: FailureKind::JobFailure,
      details: None,
    });

    let notification = failure_notification(&notice.error, &context);
    self.runtime.notifier.notify(&mut self.run, notification).await;

    error!(
      stage = %context.stage,
      cause = %context.cause,
      "run_failed"
    );
    self.runtime.observer.observe(RunEvent::RunFailed {
      run_id: self.run.run_id.clone(),
      state: state.name.clone(),
    });

    RunReport {
      outcome: RunOutcome::Failed,
      run: self.run.clone(),
    }
  }

  async fn finish_cancelled(&mut self) -> RunReport {
    self.run.finish();
    let at = self.run.finished_at.unwrap_or_else(Utc::now);

    warn!(state = %self.run.state, "run_cancelled");
    let notification = cancelled_notification(&self.run, at);
    self.runtime.notifier.notify(&mut self.run, notification).await;

    self.runtime.observer.observe(RunEvent::RunCancelled {
      run_id: self.run.run_id.clone(),
      state: self.run.state.clone(),
    });

    RunReport {
      outcome: RunOutcome::Cancelled,
      run: self.run.clone(),
    }
  }
}

/// Build the failure context attached to the run.
///
/// Launch and job-reported failures carry the failure state's fixed cause;
/// timeouts and missing confirmations produce their own cause strings so
/// the kinds stay distinguishable within one stage. The underlying detail
/// always rides in `details`.
fn build_error_context(stage: &str, error: &StageError, notice: &FailureNotice) -> ErrorContext {
  match error {
    StageError::Launch { source, .. } => ErrorContext {
      stage: stage.to_string(),
      error: notice.error.clone(),
      cause: notice.cause.clone(),
      kind: FailureKind::Launch,
      details: Some(json!(source.to_string())),
    },
    StageError::JobFailed { cause, details, .. } => ErrorContext {
      stage: stage.to_string(),
      error: notice.error.clone(),
      cause: notice.cause.clone(),
      kind: FailureKind::JobFailure,
      details: Some(json!({ "cause": cause, "details": details })),
    },
    StageError::Timeout { max_wait, .. } => ErrorContext {
      stage: stage.to_string(),
      error: notice.error.clone(),
      cause: format!("No terminal job state within {}s", max_wait.as_secs()),
      kind: FailureKind::Timeout,
      details: None,
    },
    StageError::Verification {
      subject,
      timeout,
      detail,
      ..
    } => ErrorContext {
      stage: stage.to_string(),
      error: notice.error.clone(),
      cause: format!(
        "Confirmation for '{}' never arrived within {}s",
        subject,
        timeout.as_secs()
      ),
      kind: FailureKind::Verification,
      details: detail.clone().map(|d| json!(d)),
    },
  }
}
