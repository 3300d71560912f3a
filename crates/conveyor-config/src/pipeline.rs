use serde::{Deserialize, Serialize};

use crate::state::StateDef;

/// As-authored description of one pipeline state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDef {
  pub pipeline_id: String,
  pub name: String,
  /// Name of the state a run starts in.
  pub initial_state: String,
  /// Default interval between completion polls, in milliseconds.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub poll_interval_ms: Option<u64>,
  /// Default upper bound on waiting for one job to reach a terminal
  /// state, in milliseconds.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_wait_ms: Option<u64>,
  pub states: Vec<StateDef>,
}
