//! Run events and observers.
//!
//! Events are emitted at run and stage boundaries so consumers can observe
//! progress, persist state, stream to UIs, etc. They are diagnostic; the
//! terminal notification of a run goes through the `Notifier`, not here.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted while a run executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
  RunStarted {
    run_id: String,
    pipeline_id: String,
  },
  StageStarted {
    run_id: String,
    state: String,
  },
  StageCompleted {
    run_id: String,
    state: String,
  },
  StageFailed {
    run_id: String,
    state: String,
    error: String,
  },
  RunCompleted {
    run_id: String,
  },
  /// The run reached a failure-notify state.
  RunFailed {
    run_id: String,
    state: String,
  },
  RunCancelled {
    run_id: String,
    state: String,
  },
}

/// Trait for receiving run events.
///
/// The runtime calls `observe` for each event - implementations decide
/// what to do with them (persist, broadcast, log, ignore, etc.).
pub trait RunObserver: Send + Sync {
  fn observe(&self, event: RunEvent);
}

/// An observer that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {
  fn observe(&self, _event: RunEvent) {
    // Intentionally empty
  }
}

/// An observer that sends events to an unbounded channel.
///
/// Unbounded so a slow consumer never stalls the run loop; event volume is
/// low (a handful per stage).
#[derive(Debug, Clone)]
pub struct ChannelObserver {
  sender: mpsc::UnboundedSender<RunEvent>,
}

impl ChannelObserver {
  pub fn new(sender: mpsc::UnboundedSender<RunEvent>) -> Self {
    Self { sender }
  }
}

impl RunObserver for ChannelObserver {
  fn observe(&self, event: RunEvent) {
    // Ignore send errors - receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
