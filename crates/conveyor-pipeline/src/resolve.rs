use std::collections::HashMap;
use std::time::Duration;

use conveyor_config::{ActionDef, PipelineDef, StateDef};

use crate::error::PipelineError;
use crate::pipeline::Pipeline;
use crate::state::{FailureNotice, JobTemplate, State, StateAction, SuccessNotice, VerifySpec};

/// Resolve a pipeline definition into a locked, validated `Pipeline`.
///
/// Fails fast on malformed configuration: duplicate state names, dangling
/// edges, unreachable states and incomplete job templates are all rejected
/// here, before any run starts.
pub fn resolve(def: PipelineDef) -> Result<Pipeline, PipelineError> {
  let mut states = HashMap::with_capacity(def.states.len());

  // Pipeline-level wait settings apply to every state that does not
  // override them; the runtime's own defaults are the last resort.
  let poll_interval = def.poll_interval_ms;
  let max_wait = def.max_wait_ms;

  for state_def in def.states {
    let name = state_def.name.clone();
    let state = resolve_state(state_def, poll_interval, max_wait);
    if states.insert(name.clone(), state).is_some() {
      return Err(PipelineError::DuplicateState { name });
    }
  }

  let pipeline = Pipeline {
    pipeline_id: def.pipeline_id,
    name: def.name,
    initial_state: def.initial_state,
    states,
  };
  pipeline.validate()?;
  Ok(pipeline)
}

fn resolve_state(def: StateDef, poll_interval_ms: Option<u64>, max_wait_ms: Option<u64>) -> State {
  let action = match def.action {
    ActionDef::RunJob { job } => StateAction::RunJob(JobTemplate {
      cluster: job.cluster,
      task_definition: job.task_definition,
      launch_type: job.launch_type,
      subnets: job.subnets,
      security_groups: job.security_groups,
      assign_public_ip: job.assign_public_ip,
      environment: job.environment,
    }),
    ActionDef::Verify {
      check_subject,
      settle_ms,
      confirm_timeout_ms,
      skip,
    } => StateAction::Verify(VerifySpec {
      check_subject,
      settle: Duration::from_millis(settle_ms),
      confirm_timeout: Duration::from_millis(confirm_timeout_ms),
      skip,
    }),
    ActionDef::NotifySuccess { subject } => StateAction::NotifySuccess(SuccessNotice { subject }),
    ActionDef::NotifyFailure { error, cause } => {
      StateAction::NotifyFailure(FailureNotice { error, cause })
    }
  };

  State {
    name: def.name,
    action,
    next: def.next,
    on_failure: def.on_failure,
    poll_interval: def
      .poll_interval_ms
      .or(poll_interval_ms)
      .map(Duration::from_millis),
    max_wait: def.max_wait_ms.or(max_wait_ms).map(Duration::from_millis),
  }
}
