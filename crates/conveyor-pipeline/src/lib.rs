//! Conveyor Pipeline
//!
//! The locked pipeline representation: a validated state graph ready for
//! execution by `conveyor-runtime`.
//!
//! Key differences from `conveyor-config`:
//! - The graph is validated: every edge target exists, every state is
//!   reachable from the initial state, terminal states have no outgoing
//!   edges, failure edges target failure-notify states.
//! - Wait settings are concrete `Duration`s.
//! - Job templates are checked for the fields the execution backend
//!   requires, so a malformed configuration fails before any run starts.

mod error;
mod graph;
mod pipeline;
mod resolve;
mod state;

pub use error::PipelineError;
pub use graph::Graph;
pub use pipeline::Pipeline;
pub use resolve::resolve;
pub use state::{FailureNotice, JobTemplate, State, StateAction, SuccessNotice, VerifySpec};
