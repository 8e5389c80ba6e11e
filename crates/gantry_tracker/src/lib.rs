//! # gantry_tracker
//!
//! Work item tracker clients for Gantry.
//!
//! The pipeline only needs two operations from a tracker: list the items
//! that are ready to be picked up, and move an item to a new status.
//! [`TicketClient`] captures that surface; [`HttpTracker`] talks to a REST
//! tracker and [`InMemoryTracker`] backs tests and dry runs.

pub mod client;
pub mod error;
pub mod http;
pub mod memory;
pub mod models;

pub use client::TicketClient;
pub use error::{TrackerError, TrackerResult};
pub use http::{HttpTracker, TOKEN_ENV};
pub use memory::InMemoryTracker;
pub use models::{
    WorkItem, DEFAULT_APPROVAL_STATUS, DEFAULT_IN_PROGRESS_STATUS, DEFAULT_READY_STATUS,
};
