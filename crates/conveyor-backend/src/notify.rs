use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

/// Which terminal outcome a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
  Success,
  Failure,
  Cancelled,
}

/// The single terminal message produced for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
  pub channel: Channel,
  pub subject: String,
  pub body: serde_json::Value,
}

/// External notification channel.
///
/// Must support concurrent publishes from independent runs; each message is
/// self-contained.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
  /// Deliver one message. Callers make at most one attempt per run.
  async fn publish(&self, notification: &Notification) -> Result<(), NotifyError>;
}
