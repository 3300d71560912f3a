//! Conveyor Config
//!
//! Definition types for a conveyor pipeline. A `PipelineDef` is the raw,
//! as-authored description of the state machine: named states with a
//! success edge and a failure edge, job templates for the stages that
//! launch external batch jobs, and wait settings.
//!
//! Definitions are plain data. Validation (edge targets exist, every state
//! reachable, job templates complete) happens when a `PipelineDef` is
//! resolved into a locked pipeline by `conveyor-pipeline`.

mod job;
mod pipeline;
mod state;

pub use job::JobTemplateDef;
pub use pipeline::PipelineDef;
pub use state::{ActionDef, StateDef};
