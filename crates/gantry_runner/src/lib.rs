//! # gantry_runner
//!
//! Shell command execution for Gantry quality gates.
//!
//! Every static check and test suite the pipeline gates on runs through a
//! [`CommandRunner`]. Runners execute with the project root as working
//! directory and enforce a wall-clock timeout per invocation; a timeout is
//! reported as an ordinary failed [`CommandOutput`], never as an error, so a
//! hanging tool degrades into a normal gate rejection.
//!
//! # Features
//!
//! - **Shell Runner**: `sh -c` execution via `tokio::process` with kill-on-timeout
//! - **Mock Runner**: Scripted responses and captured calls for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use gantry_runner::{CommandRunner, RunnerConfig, ShellRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = ShellRunner::new("./my-project", RunnerConfig::default().timeout_secs(120));
//!
//!     let output = runner.run("npm run lint").await?;
//!     println!("success={} output={}", output.success, output.combined_output());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod mock;
pub mod runner;
pub mod shell;

pub use config::RunnerConfig;
pub use error::{RunnerError, RunnerResult};
pub use mock::{CapturedCall, MockResponse, MockRunner};
pub use runner::{CommandOutput, CommandRunner};
pub use shell::ShellRunner;
