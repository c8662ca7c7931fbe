//! Ledger use cases.
//!
//! Each public method is one unit of work: it opens a transaction on the
//! store, runs the ledger rules against it and commits. An error anywhere
//! drops the transaction, so no partial allocation or roll is ever visible.
//! The service never reads the clock; every `today` is supplied by the caller.

use chrono::NaiveDate;
use paydown_types::error::LedgerError;
use paydown_types::loan::{Loan, LoanId, NewLoan};
use paydown_types::report::{Allocation, DayStart, DepositReport, MonthPool, MonthStatus, RollSummary};

use crate::calendar::{first_of_month, previous_month_start};
use crate::ledger::MAX_AMOUNT;
use crate::repository::{LedgerStore, LedgerTx, LoanFilter};
use crate::{allocation, ledger, rollover, tracker};

/// Parse a deposit amount typed by a user.
///
/// Accepts plain integers with optional `_` or `,` digit separators
/// (`450000`, `450_000`, `450,000`). Zero, negative, non-numeric and
/// out-of-range input is rejected.
pub fn parse_amount(input: &str) -> Result<i64, LedgerError> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| *c != '_' && *c != ',')
        .collect();
    let amount: i64 = cleaned
        .parse()
        .map_err(|_| LedgerError::Validation(format!("'{}' is not a whole amount", input.trim())))?;
    validate_amount(amount)?;
    Ok(amount)
}

fn validate_amount(amount: i64) -> Result<(), LedgerError> {
    if amount <= 0 {
        return Err(LedgerError::Validation(format!(
            "deposit must be positive, got {amount}"
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(LedgerError::Validation(format!(
            "deposit cannot exceed {MAX_AMOUNT}, got {amount}"
        )));
    }
    Ok(())
}

/// Service orchestrating every ledger operation over a [`LedgerStore`].
pub struct LedgerService<S: LedgerStore> {
    store: S,
    starter_plan: Vec<NewLoan>,
}

impl<S: LedgerStore> LedgerService<S> {
    /// Create a service seeding `starter_plan` on [`bootstrap`](Self::bootstrap).
    pub fn new(store: S, starter_plan: Vec<NewLoan>) -> Self {
        Self {
            store,
            starter_plan,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Seed the starter plan if the ledger is empty. Returns the number of
    /// loans inserted (0 when the ledger already had loans).
    pub async fn bootstrap(&self) -> Result<usize, LedgerError> {
        let mut tx = self.store.begin().await?;
        let inserted = ledger::bootstrap_if_empty(&mut tx, &self.starter_plan).await?;
        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn add_loan(&self, request: NewLoan) -> Result<Loan, LedgerError> {
        let mut tx = self.store.begin().await?;
        let loan = ledger::add_loan(&mut tx, &request).await?;
        tx.commit().await?;
        Ok(loan)
    }

    pub async fn close_loan(&self, id: &LoanId) -> Result<Loan, LedgerError> {
        let mut tx = self.store.begin().await?;
        let loan = ledger::close_loan(&mut tx, id).await?;
        tx.commit().await?;
        Ok(loan)
    }

    /// Every loan, open and closed, ordered by due day.
    pub async fn list_loans(&self) -> Result<Vec<Loan>, LedgerError> {
        let mut tx = self.store.begin().await?;
        let loans = tx.list_loans(LoanFilter::All).await?;
        tx.commit().await?;
        Ok(loans)
    }

    /// Today's savings figure for the current month.
    ///
    /// Creates this month's obligations on first access. On the first of a
    /// month the pending roll runs before the pool is totalled.
    pub async fn month_pool(&self, today: NaiveDate) -> Result<MonthPool, LedgerError> {
        let mut tx = self.store.begin().await?;
        rollover::roll_at_month_start(&mut tx, today).await?;
        let pool = tracker::compute_month_pool(&mut tx, today).await?;
        tx.commit().await?;
        Ok(pool)
    }

    /// Apply the month roll for the month before `today`, unconditionally.
    ///
    /// Prefer [`begin_day`](Self::begin_day), which only rolls on the first of
    /// the month and at most once per month.
    pub async fn roll_previous_month(&self, today: NaiveDate) -> Result<RollSummary, LedgerError> {
        let mut tx = self.store.begin().await?;
        let summary = rollover::roll_previous_month(&mut tx, today).await?;
        tx.mark_month_rolled(previous_month_start(today)).await?;
        tx.commit().await?;
        Ok(summary)
    }

    /// The day-boundary sequence shared by interactive queries and the
    /// scheduled reminder.
    ///
    /// On the first of a month the previous month is rolled, unless a roll for
    /// it was already recorded. The month pool is then computed in the same
    /// unit of work, so a target is never taken from a half-rolled ledger.
    pub async fn begin_day(&self, today: NaiveDate) -> Result<DayStart, LedgerError> {
        let mut tx = self.store.begin().await?;
        let rolled = rollover::roll_at_month_start(&mut tx, today).await?;
        let pool = tracker::compute_month_pool(&mut tx, today).await?;

        tx.commit().await?;
        Ok(DayStart {
            date: today,
            rolled,
            pool,
        })
    }

    /// Run a deposit through the allocation engine.
    pub async fn deposit(&self, today: NaiveDate, amount: i64) -> Result<Allocation, LedgerError> {
        validate_amount(amount)?;
        let mut tx = self.store.begin().await?;
        rollover::roll_at_month_start(&mut tx, today).await?;
        let allocation = allocation::allocate(&mut tx, today, amount).await?;
        tx.commit().await?;
        Ok(allocation)
    }

    /// Deposit with before/after figures, as shown after a `save`.
    ///
    /// `achieved` compares the deposit with the daily target in effect
    /// before it was applied.
    pub async fn save(&self, today: NaiveDate, amount: i64) -> Result<DepositReport, LedgerError> {
        validate_amount(amount)?;
        let mut tx = self.store.begin().await?;

        let rolled = rollover::roll_at_month_start(&mut tx, today).await?;
        let before = tracker::compute_month_pool(&mut tx, today).await?;
        let allocation = allocation::allocate(&mut tx, today, amount).await?;
        let pool_after = tracker::compute_month_pool(&mut tx, today).await?;
        let closed_loans = tx.list_loans(LoanFilter::Closed).await?;

        tx.commit().await?;
        Ok(DepositReport {
            date: today,
            amount,
            target_before: before.daily_target,
            achieved: amount >= before.daily_target,
            rolled,
            allocation,
            pool_after,
            closed_loans,
        })
    }

    /// The month pool plus every obligation of the month, by due day.
    pub async fn month_status(&self, today: NaiveDate) -> Result<MonthStatus, LedgerError> {
        let month = first_of_month(today);
        let mut tx = self.store.begin().await?;
        rollover::roll_at_month_start(&mut tx, today).await?;
        let pool = tracker::compute_month_pool(&mut tx, today).await?;
        let lines = tx.list_month_obligations(month).await?;
        tx.commit().await?;
        Ok(MonthStatus { month, pool, lines })
    }
}
