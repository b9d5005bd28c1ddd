//! Core types and trait definitions for Agora, a community voting service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod ballot;
pub mod error;
pub mod library;
pub mod period;
pub mod store;
pub mod tally;
pub mod voting;

pub use error::{Error, Result};
pub use period::VotingPeriod;
pub use voting::{VotingRules, VotingService};
