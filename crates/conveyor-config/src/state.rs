use serde::{Deserialize, Serialize};

use crate::job::JobTemplateDef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDef {
  pub name: String,
  #[serde(flatten)]
  pub action: ActionDef,
  /// State entered when this state's action succeeds.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next: Option<String>,
  /// State entered when this state's action fails. Must reference a
  /// `notify_failure` state.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub on_failure: Option<String>,
  /// Per-state override of the pipeline's poll interval.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub poll_interval_ms: Option<u64>,
  /// Per-state override of the pipeline's completion wait bound.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_wait_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionDef {
  /// Launch an external batch job and wait for it to complete.
  RunJob { job: JobTemplateDef },
  /// Publish a check event and wait out eventual consistency before the
  /// next read-dependent stage.
  Verify {
    /// Subject of the check event and of the confirmation signal.
    check_subject: String,
    /// Fixed settle period before the first confirmation read, in
    /// milliseconds.
    settle_ms: u64,
    /// Upper bound on waiting for the confirmation signal after the
    /// settle period, in milliseconds.
    confirm_timeout_ms: u64,
    /// Skip verification entirely (strongly consistent backends).
    #[serde(default)]
    skip: bool,
  },
  /// Terminal state: deliver the success notification.
  NotifySuccess { subject: String },
  /// Terminal state: deliver a failure notification with the fixed
  /// headline and default cause for the stage that routed here.
  NotifyFailure { error: String, cause: String },
}
