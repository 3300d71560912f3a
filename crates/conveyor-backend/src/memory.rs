//! In-memory backends with scripted outcomes.
//!
//! Deterministic implementations of the three collaborator contracts, used
//! by the test suites and for local development. Outcomes are scripted per
//! task definition; every launch, poll and publish is recorded.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use conveyor_pipeline::JobTemplate;

use crate::error::{BackendError, NotifyError};
use crate::events::EventBus;
use crate::job::{JobBackend, JobHandle, JobStatus};
use crate::notify::{Notification, NotificationChannel};

/// Scripted behavior for jobs launched from one task definition.
#[derive(Debug, Clone)]
pub enum JobScript {
  /// Report `Running` for the given number of polls, then `Succeeded`.
  SucceedAfter(u32),
  /// Report `Running` for the given number of polls, then a structured
  /// failure.
  FailAfter {
    polls: u32,
    cause: String,
    details: Option<serde_json::Value>,
  },
  /// Reject the launch itself.
  RejectLaunch { message: String },
  /// Never reach a terminal state.
  NeverFinish,
}

/// One recorded launch.
#[derive(Debug, Clone)]
pub struct LaunchRecord {
  pub job_id: String,
  pub template: JobTemplate,
}

#[derive(Default)]
struct JobBackendState {
  scripts: HashMap<String, JobScript>,
  launches: Vec<LaunchRecord>,
  jobs: HashMap<String, JobScript>,
  polls: HashMap<String, u32>,
}

/// In-memory job execution backend.
///
/// Jobs launched from an unscripted task definition succeed on the first
/// poll.
#[derive(Default)]
pub struct InMemoryJobBackend {
  state: Mutex<JobBackendState>,
}

impl InMemoryJobBackend {
  pub fn new() -> Self {
    Self::default()
  }

  /// Script the outcome of jobs launched from `task_definition`.
  pub fn script(&self, task_definition: &str, script: JobScript) {
    let mut state = self.state.lock().unwrap();
    state.scripts.insert(task_definition.to_string(), script);
  }

  /// All launches so far, in order.
  pub fn launches(&self) -> Vec<LaunchRecord> {
    self.state.lock().unwrap().launches.clone()
  }

  pub fn launch_count(&self) -> usize {
    self.state.lock().unwrap().launches.len()
  }
}

#[async_trait]
impl JobBackend for InMemoryJobBackend {
  async fn launch(&self, template: &JobTemplate) -> Result<JobHandle, BackendError> {
    let mut state = self.state.lock().unwrap();

    let script = state
      .scripts
      .get(&template.task_definition)
      .cloned()
      .unwrap_or(JobScript::SucceedAfter(0));

    if let JobScript::RejectLaunch { message } = &script {
      return Err(BackendError::LaunchRejected {
        message: message.clone(),
      });
    }

    let job_id = uuid::Uuid::new_v4().to_string();
    state.launches.push(LaunchRecord {
      job_id: job_id.clone(),
      template: template.clone(),
    });
    state.jobs.insert(job_id.clone(), script);
    state.polls.insert(job_id.clone(), 0);

    Ok(JobHandle::new(job_id))
  }

  async fn status(&self, handle: &JobHandle) -> Result<JobStatus, BackendError> {
    let mut state = self.state.lock().unwrap();

    let script = state
      .jobs
      .get(&handle.job_id)
      .cloned()
      .ok_or_else(|| BackendError::UnknownJob {
        job_id: handle.job_id.clone(),
      })?;

    let polls = state.polls.entry(handle.job_id.clone()).or_insert(0);
    *polls += 1;
    let polls = *polls;

    Ok(match script {
      JobScript::SucceedAfter(n) => {
        if polls > n {
          JobStatus::Succeeded
        } else {
          JobStatus::Running
        }
      }
      JobScript::FailAfter {
        polls: n,
        cause,
        details,
      } => {
        if polls > n {
          JobStatus::Failed { cause, details }
        } else {
          JobStatus::Running
        }
      }
      JobScript::NeverFinish => JobStatus::Running,
      // Rejected at launch, nothing to poll.
      JobScript::RejectLaunch { .. } => unreachable!(),
    })
  }
}

#[derive(Default)]
struct EventBusState {
  published: Vec<String>,
  confirmed: HashSet<String>,
  auto_confirm: bool,
}

/// In-memory event bus.
///
/// Confirmations are set explicitly with [`InMemoryEventBus::confirm`], or
/// automatically on publish when auto-confirm is enabled.
#[derive(Default)]
pub struct InMemoryEventBus {
  state: Mutex<EventBusState>,
}

impl InMemoryEventBus {
  pub fn new() -> Self {
    Self::default()
  }

  /// Confirm every subject as soon as its check event is published.
  pub fn auto_confirm(&self, enabled: bool) {
    self.state.lock().unwrap().auto_confirm = enabled;
  }

  /// Mark a subject as confirmed.
  pub fn confirm(&self, subject: &str) {
    let mut state = self.state.lock().unwrap();
    state.confirmed.insert(subject.to_string());
  }

  /// All check events published so far, in order.
  pub fn published(&self) -> Vec<String> {
    self.state.lock().unwrap().published.clone()
  }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
  async fn publish_check(&self, subject: &str) -> Result<(), BackendError> {
    let mut state = self.state.lock().unwrap();
    state.published.push(subject.to_string());
    if state.auto_confirm {
      state.confirmed.insert(subject.to_string());
    }
    Ok(())
  }

  async fn confirmed(&self, subject: &str) -> Result<bool, BackendError> {
    Ok(self.state.lock().unwrap().confirmed.contains(subject))
  }
}

#[derive(Default)]
struct ChannelState {
  sent: Vec<Notification>,
  fail_next: Option<String>,
}

/// In-memory notification channel recording every delivered message.
#[derive(Default)]
pub struct InMemoryNotificationChannel {
  state: Mutex<ChannelState>,
}

impl InMemoryNotificationChannel {
  pub fn new() -> Self {
    Self::default()
  }

  /// Make the next publish fail with the given message.
  pub fn fail_next(&self, message: &str) {
    self.state.lock().unwrap().fail_next = Some(message.to_string());
  }

  /// All delivered notifications, in order.
  pub fn sent(&self) -> Vec<Notification> {
    self.state.lock().unwrap().sent.clone()
  }
}

#[async_trait]
impl NotificationChannel for InMemoryNotificationChannel {
  async fn publish(&self, notification: &Notification) -> Result<(), NotifyError> {
    let mut state = self.state.lock().unwrap();
    if let Some(message) = state.fail_next.take() {
      return Err(NotifyError {
        subject: notification.subject.clone(),
        message,
      });
    }
    state.sent.push(notification.clone());
    Ok(())
  }
}
