//! # gantry_agents
//!
//! Generation-driven stages of the Gantry pipeline.
//!
//! | Stage | Role | Output |
//! |-------|------|--------|
//! | [`IntakeStage`] | Claims one ready work item | task, ticket id |
//! | [`ContractStage`] | Defines the shared interface | contract file, schema fragment |
//! | [`ImplementationStage`] | Writes backend and frontend code, repairs on failure | artifacts |
//!
//! Parsing of model output is isolated in [`parse`]; output locations come
//! from a [`RoutingTable`].

pub mod contract;
pub mod error;
pub mod implementer;
pub mod intake;
pub mod parse;
pub mod prompts;
pub mod routing;
pub mod schema;

pub use contract::{ContractConfig, ContractStage, DEFAULT_CONTRACT_PATH};
pub use error::{AgentError, AgentResult};
pub use implementer::{ImplementationConfig, ImplementationStage, DEFAULT_RULES_PATH};
pub use intake::IntakeStage;
pub use parse::{ContractDocument, ParseError, SchemaFragment, SCHEMA_MARKER};
pub use routing::RoutingTable;
pub use schema::{SchemaWriteMode, SchemaWriter, DEFAULT_SCHEMA_PATH};
