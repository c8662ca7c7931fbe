//! Persistence port for the ledger.
//!
//! Every ledger operation runs inside one [`LedgerTx`] obtained from a
//! [`LedgerStore`]. Writes made through the transaction are visible to later
//! reads on the same transaction, and nothing becomes visible to other
//! operations until [`LedgerTx::commit`]. Dropping a transaction without
//! committing discards its writes.
//!
//! Implementations live in paydown-infra (SQLite) and in [`memory`].
//! Uses native async fn in traits (Rust 2024 edition, no async_trait macro).

pub mod memory;

use chrono::NaiveDate;
use paydown_types::error::RepositoryError;
use paydown_types::loan::{Loan, LoanId};
use paydown_types::obligation::{MonthlyObligation, ObligationLine};
use paydown_types::savings::SavingsLog;

/// Which loans a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoanFilter {
    #[default]
    All,
    /// Only loans with `closed = false`.
    Open,
    /// Only loans with `closed = true`.
    Closed,
}

/// Source of ledger transactions.
pub trait LedgerStore: Send + Sync {
    type Tx: LedgerTx;

    /// Start a unit of work. Implementations serialise writers so that two
    /// transactions never interleave read-modify-write sequences.
    fn begin(&self) -> impl std::future::Future<Output = Result<Self::Tx, RepositoryError>> + Send;
}

/// A single unit of work against the ledger tables.
pub trait LedgerTx: Send {
    /// Number of loans, open or closed.
    fn count_loans(
        &mut self,
    ) -> impl std::future::Future<Output = Result<i64, RepositoryError>> + Send;

    fn insert_loan(
        &mut self,
        loan: &Loan,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_loan(
        &mut self,
        id: &LoanId,
    ) -> impl std::future::Future<Output = Result<Option<Loan>, RepositoryError>> + Send;

    /// List loans ordered by due day, then creation.
    fn list_loans(
        &mut self,
        filter: LoanFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Loan>, RepositoryError>> + Send;

    /// Persist a loan's `months_left` and `closed` flags.
    fn update_loan_state(
        &mut self,
        id: &LoanId,
        months_left: i32,
        closed: bool,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Fetch the obligation for `(loan_id, month)`.
    ///
    /// Returns `Conflict` if more than one row exists for the pair.
    fn get_obligation(
        &mut self,
        loan_id: &LoanId,
        month: NaiveDate,
    ) -> impl std::future::Future<Output = Result<Option<MonthlyObligation>, RepositoryError>> + Send;

    /// Insert a new obligation. Returns `Conflict` if one already exists for
    /// the same `(loan_id, month)`.
    fn insert_obligation(
        &mut self,
        obligation: &MonthlyObligation,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Persist an obligation's `amount_paid` and `is_paid`.
    fn update_obligation_payment(
        &mut self,
        obligation: &MonthlyObligation,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Unpaid obligations for `month` whose loan is open, ordered by the
    /// loan's due day ascending, then loan id.
    fn list_unpaid_obligations(
        &mut self,
        month: NaiveDate,
    ) -> impl std::future::Future<Output = Result<Vec<MonthlyObligation>, RepositoryError>> + Send;

    /// Every obligation for `month` joined with its loan, ordered by due day.
    fn list_month_obligations(
        &mut self,
        month: NaiveDate,
    ) -> impl std::future::Future<Output = Result<Vec<ObligationLine>, RepositoryError>> + Send;

    fn append_savings(
        &mut self,
        entry: &SavingsLog,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Record that `month` has been rolled. Returns `false` if it already was.
    fn mark_month_rolled(
        &mut self,
        month: NaiveDate,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Make every write of this unit of work durable and visible.
    fn commit(self) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
