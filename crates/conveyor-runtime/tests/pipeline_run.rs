//! End-to-end pipeline run scenarios against the in-memory backends.

use std::sync::Arc;
use std::time::Duration;

use conveyor_backend::memory::{
  InMemoryEventBus, InMemoryJobBackend, InMemoryNotificationChannel, JobScript,
};
use conveyor_backend::Channel;
use conveyor_config::PipelineDef;
use conveyor_pipeline::Pipeline;
use conveyor_runtime::{Backends, PipelineRuntime, RunOutcome, RuntimeConfig};
use serde_json::json;
use tokio_util::sync::CancellationToken;

/// The standard four-stage pipeline, with task definitions namespaced by
/// `prefix` so concurrent runs against shared backends stay tellable
/// apart. Wait durations are millisecond-scale to keep the tests fast.
fn pipeline(prefix: &str) -> Pipeline {
  let def: PipelineDef = serde_json::from_value(json!({
    "pipeline_id": format!("{prefix}-sales-kpi"),
    "name": "Sales KPI Pipeline",
    "initial_state": "LoadData",
    "states": [
      {
        "name": "LoadData",
        "type": "run_job",
        "job": {
          "cluster": format!("{prefix}-cluster"),
          "task_definition": format!("{prefix}-ingest"),
          "subnets": ["subnet-a"]
        },
        "next": "VerifyLoaded",
        "on_failure": "NotifyLoadFailure"
      },
      {
        "name": "VerifyLoaded",
        "type": "verify",
        "check_subject": format!("{prefix}/raw/orders"),
        "settle_ms": 10,
        "confirm_timeout_ms": 50,
        "next": "Validate",
        "on_failure": "NotifyVerifyFailure"
      },
      {
        "name": "Validate",
        "type": "run_job",
        "job": {
          "cluster": format!("{prefix}-cluster"),
          "task_definition": format!("{prefix}-validate"),
          "subnets": ["subnet-a"]
        },
        "next": "ComputeMetrics",
        "on_failure": "NotifyValidateFailure"
      },
      {
        "name": "ComputeMetrics",
        "type": "run_job",
        "job": {
          "cluster": format!("{prefix}-cluster"),
          "task_definition": format!("{prefix}-compute-kpi"),
          "subnets": ["subnet-a"]
        },
        "next": "NotifySuccess",
        "on_failure": "NotifyComputeFailure"
      },
      {
        "name": "NotifySuccess",
        "type": "notify_success",
        "subject": "Pipeline Success Notification"
      },
      {
        "name": "NotifyLoadFailure",
        "type": "notify_failure",
        "error": "Data loading failed",
        "cause": "Error loading data to S3"
      },
      {
        "name": "NotifyVerifyFailure",
        "type": "notify_failure",
        "error": "Data verification failed",
        "cause": "Error verifying data in S3"
      },
      {
        "name": "NotifyValidateFailure",
        "type": "notify_failure",
        "error": "Data validation failed",
        "cause": "Error validating cleaned data"
      },
      {
        "name": "NotifyComputeFailure",
        "type": "notify_failure",
        "error": "KPI computation failed",
        "cause": "Error computing KPIs"
      }
    ]
  }))
  .unwrap();

  conveyor_pipeline::resolve(def).unwrap()
}

struct Harness {
  jobs: Arc<InMemoryJobBackend>,
  bus: Arc<InMemoryEventBus>,
  channel: Arc<InMemoryNotificationChannel>,
}

impl Harness {
  fn new() -> Self {
    Self {
      jobs: Arc::new(InMemoryJobBackend::new()),
      bus: Arc::new(InMemoryEventBus::new()),
      channel: Arc::new(InMemoryNotificationChannel::new()),
    }
  }

  fn runtime(&self, prefix: &str) -> PipelineRuntime {
    let config = RuntimeConfig {
      poll_interval: Duration::from_millis(5),
      max_wait: Duration::from_millis(100),
    };
    let backends = Backends {
      jobs: self.jobs.clone(),
      events: self.bus.clone(),
      notifications: self.channel.clone(),
    };
    PipelineRuntime::new(config, pipeline(prefix), backends)
  }
}

#[tokio::test]
async fn all_stages_succeed_and_one_success_notification_is_sent() {
  let harness = Harness::new();
  harness.bus.auto_confirm(true);
  let runtime = harness.runtime("p1");

  let report = runtime
    .start_run(CancellationToken::new())
    .wait()
    .await
    .unwrap();

  assert_eq!(report.outcome, RunOutcome::Succeeded);
  assert_eq!(report.run.state, "NotifySuccess");
  assert!(report.run.error.is_none());
  assert!(report.run.finished_at.is_some());

  // All three jobs launched, one check event published.
  assert_eq!(harness.jobs.launch_count(), 3);
  assert_eq!(harness.bus.published(), vec!["p1/raw/orders"]);

  let sent = harness.channel.sent();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].channel, Channel::Success);
  assert_eq!(sent[0].subject, "Pipeline Success Notification");
  let message = sent[0].body["Message"].as_str().unwrap();
  assert!(message.contains("completed successfully at"));

  let trail: Vec<&str> = report
    .run
    .transitions()
    .iter()
    .map(|t| t.to.as_str())
    .collect();
  assert_eq!(
    trail,
    vec!["VerifyLoaded", "Validate", "ComputeMetrics", "NotifySuccess"]
  );
}

#[tokio::test]
async fn load_launch_error_notifies_load_failure_and_launches_nothing_else() {
  let harness = Harness::new();
  harness.jobs.script(
    "p2-ingest",
    JobScript::RejectLaunch {
      message: "no capacity".to_string(),
    },
  );
  let runtime = harness.runtime("p2");

  let report = runtime
    .start_run(CancellationToken::new())
    .wait()
    .await
    .unwrap();

  assert_eq!(report.outcome, RunOutcome::Failed);
  assert_eq!(report.run.state, "NotifyLoadFailure");

  // The rejected launch never scheduled anything, and no later stage ran.
  assert_eq!(harness.jobs.launch_count(), 0);
  assert!(harness.bus.published().is_empty());

  let sent = harness.channel.sent();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].channel, Channel::Failure);
  assert_eq!(sent[0].body["Error"], "Data loading failed");
  assert_eq!(sent[0].body["Cause"], "Error loading data to S3");
  assert_eq!(sent[0].body["Details"]["stage"], "LoadData");
  assert_eq!(sent[0].body["Details"]["kind"], "launch");
}

#[tokio::test]
async fn missing_confirmation_notifies_verify_failure_before_later_stages() {
  let harness = Harness::new();
  // Nothing ever confirms the check event.
  let runtime = harness.runtime("p3");

  let report = runtime
    .start_run(CancellationToken::new())
    .wait()
    .await
    .unwrap();

  assert_eq!(report.outcome, RunOutcome::Failed);
  assert_eq!(report.run.state, "NotifyVerifyFailure");

  // Only the ingest job launched; Validate and ComputeMetrics were never
  // reached.
  assert_eq!(harness.jobs.launch_count(), 1);
  assert_eq!(
    harness.jobs.launches()[0].template.task_definition,
    "p3-ingest"
  );

  let sent = harness.channel.sent();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].body["Error"], "Data verification failed");
  assert_eq!(sent[0].body["Details"]["kind"], "verification");
  let cause = sent[0].body["Cause"].as_str().unwrap();
  assert!(cause.contains("never arrived"));
}

#[tokio::test]
async fn compute_job_failure_carries_its_reported_details() {
  let harness = Harness::new();
  harness.bus.auto_confirm(true);
  harness.jobs.script(
    "p4-compute-kpi",
    JobScript::FailAfter {
      polls: 0,
      cause: "kpi overflow".to_string(),
      details: Some(json!({ "partition": 12 })),
    },
  );
  let runtime = harness.runtime("p4");

  let report = runtime
    .start_run(CancellationToken::new())
    .wait()
    .await
    .unwrap();

  assert_eq!(report.outcome, RunOutcome::Failed);
  assert_eq!(report.run.state, "NotifyComputeFailure");
  assert_eq!(harness.jobs.launch_count(), 3);

  let sent = harness.channel.sent();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].body["Error"], "KPI computation failed");
  assert_eq!(sent[0].body["Cause"], "Error computing KPIs");
  assert_eq!(sent[0].body["Details"]["kind"], "job_failure");
  assert_eq!(sent[0].body["Details"]["details"]["cause"], "kpi overflow");
  assert_eq!(
    sent[0].body["Details"]["details"]["details"]["partition"],
    12
  );
}

#[tokio::test]
async fn compute_timeout_is_distinguishable_from_a_job_failure() {
  let harness = Harness::new();
  harness.bus.auto_confirm(true);
  harness.jobs.script("p5-compute-kpi", JobScript::NeverFinish);
  let runtime = harness.runtime("p5");

  let report = runtime
    .start_run(CancellationToken::new())
    .wait()
    .await
    .unwrap();

  assert_eq!(report.outcome, RunOutcome::Failed);
  assert_eq!(report.run.state, "NotifyComputeFailure");

  let sent = harness.channel.sent();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].body["Error"], "KPI computation failed");
  assert_eq!(sent[0].body["Details"]["kind"], "timeout");
  // Same stage as a job failure, but a different cause.
  let cause = sent[0].body["Cause"].as_str().unwrap();
  assert!(cause.contains("No terminal job state"));
  assert_ne!(cause, "Error computing KPIs");
}

#[tokio::test]
async fn cancelled_run_still_delivers_exactly_one_notification() {
  let harness = Harness::new();
  let runtime = harness.runtime("p6");

  let cancel = CancellationToken::new();
  cancel.cancel();

  let report = runtime.start_run(cancel).wait().await.unwrap();

  assert_eq!(report.outcome, RunOutcome::Cancelled);
  assert!(report.run.notified());
  assert_eq!(harness.jobs.launch_count(), 0);

  let sent = harness.channel.sent();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].channel, Channel::Cancelled);
  assert_eq!(sent[0].subject, "Pipeline Cancelled Notification");
  let message = sent[0].body["Message"].as_str().unwrap();
  assert!(message.contains("cancelled in state LoadData"));
}

#[tokio::test]
async fn notification_delivery_failure_does_not_change_the_outcome() {
  let harness = Harness::new();
  harness.bus.auto_confirm(true);
  harness.channel.fail_next("broker down");
  let runtime = harness.runtime("p7");

  let report = runtime
    .start_run(CancellationToken::new())
    .wait()
    .await
    .unwrap();

  // One attempt was made and failed; the run is still terminal and
  // notified, with nothing delivered and nothing retried.
  assert_eq!(report.outcome, RunOutcome::Succeeded);
  assert!(report.run.notified());
  assert!(harness.channel.sent().is_empty());
}

#[tokio::test]
async fn concurrent_runs_keep_their_templates_apart() {
  let harness = Harness::new();
  harness.bus.auto_confirm(true);
  let runtime_a = harness.runtime("a");
  let runtime_b = harness.runtime("b");

  let (report_a, report_b) = tokio::join!(
    runtime_a.start_run(CancellationToken::new()).wait(),
    runtime_b.start_run(CancellationToken::new()).wait(),
  );
  let report_a = report_a.unwrap();
  let report_b = report_b.unwrap();

  assert_eq!(report_a.outcome, RunOutcome::Succeeded);
  assert_eq!(report_b.outcome, RunOutcome::Succeeded);
  assert_ne!(report_a.run.run_id, report_b.run.run_id);

  // Six launches total; every launch from run A used A's cluster and
  // task definitions, likewise for B, however the backends interleaved.
  let launches = harness.jobs.launches();
  assert_eq!(launches.len(), 6);
  for record in &launches {
    let cluster = record.template.cluster.as_str();
    let task = record.template.task_definition.as_str();
    match cluster {
      "a-cluster" => assert!(task.starts_with("a-")),
      "b-cluster" => assert!(task.starts_with("b-")),
      other => panic!("unexpected cluster {other}"),
    }
  }
  for prefix in ["a", "b"] {
    let count = launches
      .iter()
      .filter(|r| r.template.cluster == format!("{prefix}-cluster"))
      .count();
    assert_eq!(count, 3);
  }

  assert_eq!(harness.channel.sent().len(), 2);
}
