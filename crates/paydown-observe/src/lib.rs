//! Logging and trace export setup shared by the Paydown binaries.

pub mod tracing_setup;

pub use tracing_setup::{LogOptions, init_tracing, shutdown_tracing, verbosity_filter};
