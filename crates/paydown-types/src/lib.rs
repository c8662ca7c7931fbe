//! Shared domain types for Paydown.
//!
//! Loans, monthly obligations, savings records, operation reports,
//! configuration and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod loan;
pub mod obligation;
pub mod report;
pub mod savings;
