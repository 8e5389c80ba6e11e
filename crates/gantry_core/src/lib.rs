//! # gantry_core
//!
//! Pipeline engine for Gantry.
//!
//! This crate provides the immutable pipeline state, the stage abstraction,
//! the orchestrator that drives stages through the ticket-to-code state
//! machine, the sandboxed project workspace and the publish step.
//!
//! # Architecture
//!
//! - **State**: [`PipelineState`] values merged from stage [`StateDelta`]s
//! - **Stages**: Units of work looked up by name in a [`StageRegistry`]
//! - **Orchestrator**: Runs the transition graph with a bounded repair loop
//! - **Run log**: Audit trail persisted after every stage invocation
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gantry_core::{Orchestrator, PipelineConfig, StageRegistry};
//!
//! let registry = StageRegistry::new()
//!     .with_stage(Arc::new(intake))
//!     .with_stage(Arc::new(contract))
//!     .with_stage(Arc::new(implement))
//!     .with_stage(Arc::new(gate));
//!
//! let orchestrator = Orchestrator::new(Arc::new(registry), PipelineConfig::default())
//!     .with_log_dir(project.join(".gantry/runs"));
//! let log = orchestrator.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod publish;
pub mod registry;
pub mod run_log;
pub mod stage;
pub mod state;
pub mod workspace;

// Re-export main types for convenience
pub use config::{PipelineConfig, RepairRouting, RepairTarget};
pub use error::{CoreError, CoreResult};
pub use orchestrator::Orchestrator;
pub use publish::{
    GitPublisher, NoopPublisher, PublishReceipt, PublishRequest, PublishStage, Publisher,
};
pub use registry::StageRegistry;
pub use run_log::{RunLog, RunOutcome, TransitionRecord, RUNS_DIR};
pub use stage::{names, Stage};
pub use state::{
    truncate_for_log, ErrorUpdate, FailureKind, FailureReport, Mode, PipelineState, StateDelta,
    Status,
};
pub use workspace::Workspace;
