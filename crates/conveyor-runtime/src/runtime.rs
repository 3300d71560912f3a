//! Pipeline runtime.

use std::sync::Arc;
use std::time::Duration;

use conveyor_backend::{EventBus, JobBackend, NotificationChannel};
use conveyor_pipeline::Pipeline;
use tokio_util::sync::CancellationToken;

use crate::bridge::SignalBridge;
use crate::events::{NoopObserver, RunObserver};
use crate::execution::RunExecution;
use crate::launcher::JobLauncher;
use crate::notifier::Notifier;
use crate::waiter::CompletionWaiter;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(30 * 60);

/// Configuration for the pipeline runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
  /// Interval between completion and confirmation polls, unless a state
  /// overrides it.
  pub poll_interval: Duration,
  /// Bound on waiting for one job to complete, unless a state overrides
  /// it.
  pub max_wait: Duration,
}

impl Default for RuntimeConfig {
  fn default() -> Self {
    Self {
      poll_interval: DEFAULT_POLL_INTERVAL,
      max_wait: DEFAULT_MAX_WAIT,
    }
  }
}

/// The external collaborators one runtime drives.
///
/// Shared across concurrent runs; implementations must tolerate that.
pub struct Backends {
  pub jobs: Arc<dyn JobBackend>,
  pub events: Arc<dyn EventBus>,
  pub notifications: Arc<dyn NotificationChannel>,
}

/// The pipeline runtime.
///
/// Owns a locked pipeline and starts runs over it. Independent runs may
/// execute concurrently; each owns its `PipelineRun` value and shares
/// nothing mutable with the others.
pub struct PipelineRuntime<O: RunObserver = NoopObserver> {
  pub(crate) config: RuntimeConfig,
  pub(crate) pipeline: Pipeline,
  pub(crate) launcher: JobLauncher,
  pub(crate) waiter: CompletionWaiter,
  pub(crate) bridge: SignalBridge,
  pub(crate) notifier: Notifier,
  pub(crate) observer: O,
}

impl PipelineRuntime<NoopObserver> {
  /// Create a runtime that discards run events. Use `with_observer` if
  /// you need to observe them.
  pub fn new(config: RuntimeConfig, pipeline: Pipeline, backends: Backends) -> Self {
    Self::with_observer(config, pipeline, backends, NoopObserver)
  }
}

impl<O: RunObserver> PipelineRuntime<O> {
  /// Create a runtime with a custom run observer.
  pub fn with_observer(
    config: RuntimeConfig,
    pipeline: Pipeline,
    backends: Backends,
    observer: O,
  ) -> Self {
    Self {
      launcher: JobLauncher::new(backends.jobs.clone()),
      waiter: CompletionWaiter::new(backends.jobs),
      bridge: SignalBridge::new(backends.events),
      notifier: Notifier::new(backends.notifications),
      config,
      pipeline,
      observer,
    }
  }

  /// Start one pipeline run.
  ///
  /// Returns a `RunExecution` handle. Call `.wait()` to drive the run to
  /// its terminal notification. Cancelling the token takes effect at the
  /// next suspension point and still delivers a terminal notification.
  pub fn start_run(&self, cancel: CancellationToken) -> RunExecution<'_, O> {
    let run_id = uuid::Uuid::new_v4().to_string();
    RunExecution::new(self, run_id, cancel)
  }

  /// Get a reference to the pipeline.
  pub fn pipeline(&self) -> &Pipeline {
    &self.pipeline
  }
}
