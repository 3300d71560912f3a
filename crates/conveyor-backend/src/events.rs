use async_trait::async_trait;

use crate::error::BackendError;

/// Asynchronous corroboration channel for eventual-consistency settling.
///
/// After a job claims completion, the orchestrator publishes an explicit
/// "please verify" event for a subject and later reads back whether a
/// confirmation signal has been observed for it. The confirmation is a
/// heuristic, not a read-after-write guarantee.
#[async_trait]
pub trait EventBus: Send + Sync {
  /// Publish a check event for the given subject.
  async fn publish_check(&self, subject: &str) -> Result<(), BackendError>;

  /// Whether a confirmation signal has been observed for the subject.
  async fn confirmed(&self, subject: &str) -> Result<bool, BackendError>;
}
