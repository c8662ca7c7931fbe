//! Infrastructure layer for Paydown.
//!
//! Contains the implementations of the ports defined in `paydown-core`:
//! the SQLite ledger store, config and data-directory loading, and the
//! reminder notifiers.

pub mod config;
pub mod filesystem;
pub mod notify;
pub mod sqlite;
