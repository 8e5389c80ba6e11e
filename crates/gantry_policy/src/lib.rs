//! # gantry_policy
//!
//! Quality gate for the Gantry pipeline.
//!
//! The gate runs the project's static checks and then its tests through a
//! [`gantry_runner::CommandRunner`]. Failures become tagged failure reports
//! for the repair loop; a clean pass approves the work and hands the ticket
//! over in the tracker.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gantry_policy::{GateConfig, GateEvaluator};
//! use gantry_runner::{RunnerConfig, ShellRunner};
//!
//! let runner = ShellRunner::new("./my-app", RunnerConfig::default());
//! let evaluator = GateEvaluator::new(Arc::new(runner), GateConfig::default());
//! let evaluation = evaluator.evaluate().await;
//! println!("{}", evaluation.report());
//! ```

pub mod check;
pub mod config;
pub mod error;
pub mod gate;

pub use check::{CheckResult, GateEvaluation};
pub use config::GateConfig;
pub use error::{GateError, GateResult};
pub use gate::{GateEvaluator, QualityGateStage};
