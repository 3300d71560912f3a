use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Template for one external batch job launch.
///
/// `cluster`, `task_definition` and at least one subnet are required by the
/// execution backend; their absence is a configuration error caught before
/// any network call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobTemplateDef {
  pub cluster: String,
  pub task_definition: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub launch_type: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub subnets: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub security_groups: Vec<String>,
  #[serde(default)]
  pub assign_public_ip: bool,
  #[serde(default, skip_serializing_if = "HashMap::is_empty")]
  pub environment: HashMap<String, String>,
}
