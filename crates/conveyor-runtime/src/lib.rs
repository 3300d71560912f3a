//! Conveyor Runtime
//!
//! The workflow orchestrator: drives a locked pipeline state graph, stage
//! by stage, to exactly one terminal notification per run.
//!
//! Each stage launches an external batch job (or publishes a verification
//! check event) and waits, with a bounded poll, for externally-signaled
//! completion. Any stage failure routes to that stage's failure-notify
//! state with a structured `ErrorContext`; the success path ends in the
//! success-notify state. Cancellation takes effect at the next suspension
//! point and still delivers a terminal notification.
//!
//! Stages of one run execute strictly one at a time. Independent runs may
//! execute concurrently and share only the backends.

mod bridge;
mod error;
mod events;
mod execution;
mod launcher;
mod notifier;
mod run;
mod runtime;
mod waiter;

pub use bridge::{SignalBridge, VerifyOutcome};
pub use error::{LaunchError, RunError, StageError};
pub use events::{ChannelObserver, NoopObserver, RunEvent, RunObserver};
pub use execution::RunExecution;
pub use launcher::JobLauncher;
pub use notifier::Notifier;
pub use run::{ErrorContext, FailureKind, PipelineRun, RunOutcome, RunReport, Transition};
pub use runtime::{Backends, PipelineRuntime, RuntimeConfig};
pub use waiter::{CompletionWaiter, WaitOutcome, WaitSettings};
