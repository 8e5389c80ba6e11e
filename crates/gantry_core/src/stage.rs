//! Stage definitions.
//!
//! Stages are the building blocks of a pipeline run. Each stage reads the
//! current [`PipelineState`] and returns a [`StateDelta`] describing the
//! changes it wants; it never mutates the state it was given.
//!
//! # Example
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use gantry_core::{CoreResult, PipelineState, Stage, StateDelta, Status};
//!
//! struct Noop;
//!
//! #[async_trait]
//! impl Stage for Noop {
//!     fn name(&self) -> &str { "noop" }
//!     fn description(&self) -> &str { "Does nothing" }
//!
//!     async fn execute(&self, _state: &PipelineState) -> CoreResult<StateDelta> {
//!         Ok(StateDelta::status(Status::Working))
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::state::{PipelineState, StateDelta};

/// Registry names of the built-in stages.
pub mod names {
    pub const INTAKE: &str = "intake";
    pub const CONTRACT: &str = "contract";
    pub const IMPLEMENT: &str = "implement";
    pub const GATE: &str = "gate";
    pub const PUBLISH: &str = "publish";

    /// Stages a full run requires.
    pub const REQUIRED: [&str; 4] = [INTAKE, CONTRACT, IMPLEMENT, GATE];
}

/// Trait for stage implementations.
///
/// Collaborators (generator, tracker, runner, workspace) are injected at
/// construction, so a stage only sees the state value at execution time.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Unique stage name used for registry lookup.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Execute the stage against the current state.
    ///
    /// An `Err` aborts the run. Expected negative outcomes (a failed gate,
    /// no work found) are expressed through the returned status instead.
    async fn execute(&self, state: &PipelineState) -> CoreResult<StateDelta>;
}
