use std::collections::HashMap;
use std::time::Duration;

/// One locked state of the pipeline: an action plus its success and
/// failure edges.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
  pub name: String,
  pub action: StateAction,
  /// State entered on success. `None` only for terminal states.
  pub next: Option<String>,
  /// State entered on failure. `None` only for terminal states.
  pub on_failure: Option<String>,
  /// Per-state override of the runtime's poll interval.
  pub poll_interval: Option<Duration>,
  /// Per-state override of the runtime's completion wait bound.
  pub max_wait: Option<Duration>,
}

impl State {
  /// Terminal states deliver a notification and end the run.
  pub fn is_terminal(&self) -> bool {
    matches!(
      self.action,
      StateAction::NotifySuccess(_) | StateAction::NotifyFailure(_)
    )
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StateAction {
  /// Launch an external batch job and await its completion.
  RunJob(JobTemplate),
  /// Publish a check event and wait for the confirmation signal.
  Verify(VerifySpec),
  /// Terminal: deliver the success notification.
  NotifySuccess(SuccessNotice),
  /// Terminal: deliver a failure notification.
  NotifyFailure(FailureNotice),
}

/// Fully-resolved launch parameters for one external batch job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobTemplate {
  pub cluster: String,
  pub task_definition: String,
  pub launch_type: Option<String>,
  pub subnets: Vec<String>,
  pub security_groups: Vec<String>,
  pub assign_public_ip: bool,
  pub environment: HashMap<String, String>,
}

impl JobTemplate {
  /// Names of required backend fields that are absent.
  pub fn missing_fields(&self) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if self.cluster.is_empty() {
      missing.push("cluster");
    }
    if self.task_definition.is_empty() {
      missing.push("task_definition");
    }
    if self.subnets.is_empty() {
      missing.push("subnets");
    }
    missing
  }
}

/// Settings for the eventual-consistency verification stage.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifySpec {
  /// Subject of the check event and of the confirmation signal.
  pub check_subject: String,
  /// Fixed settle period before the first confirmation read.
  pub settle: Duration,
  /// Bound on waiting for the confirmation signal after settling.
  pub confirm_timeout: Duration,
  /// Skip verification entirely (strongly consistent backends).
  pub skip: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuccessNotice {
  pub subject: String,
}

/// Fixed failure message for one failure-notify state.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureNotice {
  /// Human-readable headline, e.g. "Data loading failed".
  pub error: String,
  /// Default cause attached to launch and job-reported failures.
  pub cause: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn template() -> JobTemplate {
    JobTemplate {
      cluster: "batch".to_string(),
      task_definition: "ingest:7".to_string(),
      launch_type: None,
      subnets: vec!["subnet-a".to_string()],
      security_groups: vec![],
      assign_public_ip: false,
      environment: HashMap::new(),
    }
  }

  #[test]
  fn complete_template_has_no_missing_fields() {
    assert!(template().missing_fields().is_empty());
  }

  #[test]
  fn missing_fields_are_all_reported() {
    let mut t = template();
    t.cluster.clear();
    t.subnets.clear();
    assert_eq!(t.missing_fields(), vec!["cluster", "subnets"]);
  }
}
