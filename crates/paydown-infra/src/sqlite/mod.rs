//! SQLite storage layer.
//!
//! The ledger store backed by SQLite with WAL mode and split read/write
//! connection pools.

pub mod ledger;
pub mod pool;
