//! Conveyor Backend
//!
//! Narrow async contracts for the three external collaborators the
//! orchestrator depends on:
//!
//! - [`JobBackend`]: launch a batch job from a template, poll its status.
//! - [`EventBus`]: publish a "please verify" check event and read the
//!   confirmation signal.
//! - [`NotificationChannel`]: publish one terminal message per run.
//!
//! The orchestrator depends only on these traits, never on a specific
//! execution platform. [`memory`] provides deterministic in-memory
//! implementations for tests and local development.

mod error;
mod events;
mod job;
pub mod memory;
mod notify;

pub use error::{BackendError, NotifyError};
pub use events::EventBus;
pub use job::{JobBackend, JobHandle, JobStatus};
pub use notify::{Channel, Notification, NotificationChannel};
