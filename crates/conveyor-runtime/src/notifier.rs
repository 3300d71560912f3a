//! Terminal notifier.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use conveyor_backend::{Channel, Notification, NotificationChannel};
use serde_json::json;
use tracing::{debug, error, info};

use crate::run::{ErrorContext, PipelineRun};

/// Publishes the single terminal message of a run.
pub struct Notifier {
  channel: Arc<dyn NotificationChannel>,
}

impl Notifier {
  pub fn new(channel: Arc<dyn NotificationChannel>) -> Self {
    Self { channel }
  }

  /// Deliver the run's terminal message: at most one attempt, exactly
  /// once per run. A replayed terminal transition is suppressed by the
  /// run's notification slot; a delivery failure is logged and does not
  /// alter the run's terminal state.
  pub async fn notify(&self, run: &mut PipelineRun, notification: Notification) {
    if !run.mark_notified() {
      debug!(run_id = %run.run_id, "terminal notification already sent, suppressing duplicate");
      return;
    }

    match self.channel.publish(&notification).await {
      Ok(()) => {
        info!(
          run_id = %run.run_id,
          subject = %notification.subject,
          "notification delivered"
        );
      }
      Err(e) => {
        error!(run_id = %run.run_id, error = %e, "notification delivery failed");
      }
    }
  }
}

/// Success message: subject from the pipeline's success state, body with
/// the completion timestamp.
pub(crate) fn success_notification(
  subject: &str,
  pipeline_name: &str,
  finished_at: DateTime<Utc>,
) -> Notification {
  Notification {
    channel: Channel::Success,
    subject: subject.to_string(),
    body: json!({
      "Message": format!(
        "Pipeline '{}' completed successfully at {}",
        pipeline_name,
        finished_at.to_rfc3339()
      )
    }),
  }
}

/// Failure message: fixed headline and cause, full error context in
/// `Details`.
pub(crate) fn failure_notification(subject: &str, context: &ErrorContext) -> Notification {
  Notification {
    channel: Channel::Failure,
    subject: subject.to_string(),
    body: json!({
      "Error": context.error,
      "Cause": context.cause,
      "Details": context,
    }),
  }
}

pub(crate) fn cancelled_notification(run: &PipelineRun, at: DateTime<Utc>) -> Notification {
  Notification {
    channel: Channel::Cancelled,
    subject: "Pipeline Cancelled Notification".to_string(),
    body: json!({
      "Message": format!(
        "Pipeline run {} cancelled in state {} at {}",
        run.run_id,
        run.state,
        at.to_rfc3339()
      )
    }),
  }
}
