//! The `PipelineRun` value: one execution of the full workflow.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Machine-readable classification of a stage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
  Launch,
  JobFailure,
  Timeout,
  Verification,
}

/// Structured failure detail attached to a run when a stage fails.
///
/// Propagated unchanged into the failure notification body. Once set it is
/// never overwritten: a run fails at most once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorContext {
  /// Name of the stage that failed.
  pub stage: String,
  /// Fixed human-readable headline, e.g. "Data loading failed".
  pub error: String,
  pub cause: String,
  pub kind: FailureKind,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub details: Option<serde_json::Value>,
}

/// One recorded state transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
  pub from: String,
  pub to: String,
  pub at: DateTime<Utc>,
}

/// One execution of the full workflow.
///
/// Owned by its `RunExecution` and mutated only by the run loop; a run
/// occupies exactly one state at any time and every transition is recorded.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
  pub run_id: String,
  /// Name of the currently active state.
  pub state: String,
  pub error: Option<ErrorContext>,
  pub started_at: DateTime<Utc>,
  pub finished_at: Option<DateTime<Utc>>,
  transitions: Vec<Transition>,
  notified: bool,
}

impl PipelineRun {
  pub(crate) fn new(run_id: String, initial_state: &str) -> Self {
    Self {
      run_id,
      state: initial_state.to_string(),
      error: None,
      started_at: Utc::now(),
      finished_at: None,
      transitions: Vec::new(),
      notified: false,
    }
  }

  /// Move the run to `next`, recording the transition.
  pub(crate) fn transition_to(&mut self, next: &str) {
    self.transitions.push(Transition {
      from: self.state.clone(),
      to: next.to_string(),
      at: Utc::now(),
    });
    self.state = next.to_string();
  }

  /// Attach failure context. The first failure wins: the run halts
  /// further stage execution after it, so a later context is discarded.
  pub(crate) fn fail(&mut self, context: ErrorContext) {
    if self.error.is_none() {
      self.error = Some(context);
    }
  }

  /// Claim the run's single notification slot. Returns `true` exactly
  /// once; a replayed terminal transition gets `false`.
  pub(crate) fn mark_notified(&mut self) -> bool {
    if self.notified {
      return false;
    }
    self.notified = true;
    true
  }

  pub(crate) fn finish(&mut self) {
    self.finished_at = Some(Utc::now());
  }

  pub fn notified(&self) -> bool {
    self.notified
  }

  pub fn transitions(&self) -> &[Transition] {
    &self.transitions
  }
}

/// Terminal outcome of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
  Succeeded,
  Failed,
  Cancelled,
}

/// Summary returned once a run reaches a terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub outcome: RunOutcome,
  pub run: PipelineRun,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn context(stage: &str) -> ErrorContext {
    ErrorContext {
      stage: stage.to_string(),
      error: "Data loading failed".to_string(),
      cause: "Error loading data to S3".to_string(),
      kind: FailureKind::Launch,
      details: None,
    }
  }

  #[test]
  fn transitions_are_recorded_in_order() {
    let mut run = PipelineRun::new("run-1".to_string(), "LoadData");
    run.transition_to("VerifyLoaded");
    run.transition_to("Validate");

    assert_eq!(run.state, "Validate");
    let trail: Vec<(&str, &str)> = run
      .transitions()
      .iter()
      .map(|t| (t.from.as_str(), t.to.as_str()))
      .collect();
    assert_eq!(
      trail,
      vec![("LoadData", "VerifyLoaded"), ("VerifyLoaded", "Validate")]
    );
  }

  #[test]
  fn first_failure_context_wins() {
    let mut run = PipelineRun::new("run-1".to_string(), "LoadData");
    run.fail(context("LoadData"));
    run.fail(context("Validate"));

    assert_eq!(run.error.as_ref().unwrap().stage, "LoadData");
  }

  #[test]
  fn notification_slot_is_claimed_once() {
    let mut run = PipelineRun::new("run-1".to_string(), "LoadData");
    assert!(run.mark_notified());
    assert!(!run.mark_notified());
    assert!(run.notified());
  }
}
