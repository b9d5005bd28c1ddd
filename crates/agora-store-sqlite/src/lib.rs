//! SQLite backend for Agora.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every write goes through that single
//! connection, and multi-statement invariants (vote quota, period close) run
//! inside one transaction.

mod accounts;
mod encode;
mod library;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
