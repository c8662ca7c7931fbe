//! Allocation engine and ledger rules for Paydown.
//!
//! This crate defines the persistence port (`repository`) that the
//! infrastructure layer implements and the rules that run against it:
//! obligation tracking, deposit allocation, loan closing and the month roll.
//! It depends only on `paydown-types` -- never on `paydown-infra` or any
//! database/IO crate -- and never reads the wall clock for ledger decisions.

pub mod allocation;
pub mod calendar;
pub mod ledger;
pub mod reminder;
pub mod repository;
pub mod rollover;
pub mod service;
pub mod tracker;
