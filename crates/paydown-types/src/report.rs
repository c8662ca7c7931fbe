//! Result types returned by ledger operations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::loan::{Loan, LoanId};
use crate::obligation::ObligationLine;

/// Aggregate position of the current month across all due loans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthPool {
    pub total_required: i64,
    pub total_paid: i64,
    /// `max(0, total_required - total_paid)`.
    pub remaining: i64,
    /// Days left in the month, counting today.
    pub days_left: i64,
    /// Amount to set aside today so the month is covered on time.
    pub daily_target: i64,
}

/// One slice of a deposit applied to an obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub loan_id: LoanId,
    pub amount: i64,
    /// Whether this payment settled the obligation for the month.
    pub settled: bool,
}

/// Outcome of running a deposit through the allocation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub payments: Vec<Payment>,
    /// Part of the deposit that found no unpaid obligation this month.
    pub unallocated: i64,
    /// Loans closed by the post-allocation closing check.
    pub closed: Vec<LoanId>,
}

impl Allocation {
    pub fn allocated(&self) -> i64 {
        self.payments.iter().map(|p| p.amount).sum()
    }
}

/// Full result of a `save` command: the deposit plus before/after targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReport {
    pub date: NaiveDate,
    pub amount: i64,
    /// Daily target in effect before the deposit was applied.
    pub target_before: i64,
    /// Whether the deposit met the day's target.
    pub achieved: bool,
    /// Present when this call also rolled the previous month.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolled: Option<RollSummary>,
    pub allocation: Allocation,
    pub pool_after: MonthPool,
    /// Every loan that is now closed, settled earlier or by this deposit.
    pub closed_loans: Vec<Loan>,
}

/// Counters changed by a month roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollSummary {
    /// First day of the month that was rolled.
    pub month: NaiveDate,
    pub decremented: Vec<LoanId>,
    pub closed: Vec<LoanId>,
}

/// Result of the day-boundary sequence: an optional month roll, then the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStart {
    pub date: NaiveDate,
    /// Present when this call rolled the previous month.
    pub rolled: Option<RollSummary>,
    pub pool: MonthPool,
}

/// Month pool together with every obligation of the month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthStatus {
    pub month: NaiveDate,
    pub pool: MonthPool,
    pub lines: Vec<ObligationLine>,
}

/// Payload handed to a notifier by the daily reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReminder {
    pub date: NaiveDate,
    pub daily_target: i64,
    pub remaining: i64,
    pub days_left: i64,
    pub total_required: i64,
    pub total_paid: i64,
}

impl DailyReminder {
    pub fn from_pool(date: NaiveDate, pool: &MonthPool) -> Self {
        Self {
            date,
            daily_target: pool.daily_target,
            remaining: pool.remaining,
            days_left: pool.days_left,
            total_required: pool.total_required,
            total_paid: pool.total_paid,
        }
    }
}
