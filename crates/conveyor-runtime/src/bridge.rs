//! Event signal bridge.
//!
//! The job that writes data and the stage that next reads it may not see a
//! consistent view immediately. Rather than reading speculatively, the
//! orchestrator publishes an explicit check event, sleeps a fixed settle
//! period, then polls for the confirmation signal within a bound. The
//! confirmation is a heuristic, not a read-after-write guarantee.

use std::sync::Arc;
use std::time::Duration;

use conveyor_backend::EventBus;
use conveyor_pipeline::VerifySpec;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Result of one verification.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyOutcome {
  Confirmed,
  /// The confirmation signal never arrived within the bound. `detail`
  /// carries the publish error when the check event itself could not be
  /// sent.
  Unconfirmed { detail: Option<String> },
  /// The run was cancelled at a suspension point.
  Cancelled,
}

/// Publishes check events and waits for their confirmation.
pub struct SignalBridge {
  bus: Arc<dyn EventBus>,
}

impl SignalBridge {
  pub fn new(bus: Arc<dyn EventBus>) -> Self {
    Self { bus }
  }

  /// Run one verification: publish the check event, settle, then poll
  /// for the confirmation signal until `spec.confirm_timeout` passes.
  ///
  /// Skipped entirely when the spec says so (strongly consistent
  /// backends). A failed confirmation read is logged and polling
  /// continues, like the completion waiter's status polls.
  #[instrument(
    name = "verify",
    skip(self, spec, poll_interval, cancel),
    fields(stage = %stage, subject = %spec.check_subject)
  )]
  pub async fn verify(
    &self,
    stage: &str,
    spec: &VerifySpec,
    poll_interval: Duration,
    cancel: &CancellationToken,
  ) -> VerifyOutcome {
    if spec.skip {
      debug!("verification skipped by configuration");
      return VerifyOutcome::Confirmed;
    }

    if cancel.is_cancelled() {
      return VerifyOutcome::Cancelled;
    }

    if let Err(e) = self.bus.publish_check(&spec.check_subject).await {
      warn!(error = %e, "check event publish failed");
      return VerifyOutcome::Unconfirmed {
        detail: Some(e.to_string()),
      };
    }

    debug!(settle_s = spec.settle.as_secs(), "settling");
    tokio::select! {
      _ = cancel.cancelled() => return VerifyOutcome::Cancelled,
      _ = tokio::time::sleep(spec.settle) => {}
    }

    let deadline = Instant::now() + spec.confirm_timeout;
    loop {
      match self.bus.confirmed(&spec.check_subject).await {
        Ok(true) => {
          info!("confirmation observed");
          return VerifyOutcome::Confirmed;
        }
        Ok(false) => {}
        Err(e) => {
          warn!(error = %e, "confirmation read failed, will retry");
        }
      }

      if Instant::now() >= deadline {
        warn!(
          confirm_timeout_s = spec.confirm_timeout.as_secs(),
          "confirmation never arrived"
        );
        return VerifyOutcome::Unconfirmed { detail: None };
      }

      tokio::select! {
        _ = cancel.cancelled() => return VerifyOutcome::Cancelled,
        _ = tokio::time::sleep(poll_interval) => {}
      }
    }
  }
}
