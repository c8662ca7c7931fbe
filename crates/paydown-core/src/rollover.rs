//! Month roll: count down loans whose previous month was paid in full.

use chrono::{Datelike, NaiveDate};
use paydown_types::error::LedgerError;
use paydown_types::report::RollSummary;

use crate::calendar::previous_month_start;
use crate::repository::{LedgerTx, LoanFilter};

/// Apply the month roll for the month before `today`.
///
/// For each open loan with a fully paid obligation last month and months
/// remaining, `months_left` drops by one and the loan closes at zero.
/// Single-month borrows are exempt; they close through the allocation
/// closing check instead. Loans without an obligation for last month, or
/// with an unpaid one, are left alone.
///
/// This does not check whether `today` is the first of the month or whether
/// the month was already rolled; [`roll_at_month_start`] owns both checks.
pub async fn roll_previous_month<T: LedgerTx>(
    tx: &mut T,
    today: NaiveDate,
) -> Result<RollSummary, LedgerError> {
    let prev_month = previous_month_start(today);
    let mut summary = RollSummary {
        month: prev_month,
        decremented: Vec::new(),
        closed: Vec::new(),
    };

    for loan in tx.list_loans(LoanFilter::Open).await? {
        if !loan.kind.decrements_on_roll() || loan.months_left <= 0 {
            continue;
        }
        let Some(obligation) = tx.get_obligation(&loan.id, prev_month).await? else {
            continue;
        };
        if !obligation.is_paid {
            continue;
        }

        let months_left = loan.months_left - 1;
        let closed = months_left <= 0;
        tx.update_loan_state(&loan.id, months_left, closed).await?;
        summary.decremented.push(loan.id);
        if closed {
            summary.closed.push(loan.id);
            tracing::info!(loan_id = %loan.id, name = %loan.name, "final month paid, loan closed");
        }
    }

    tracing::info!(
        month = %prev_month,
        decremented = summary.decremented.len(),
        closed = summary.closed.len(),
        "rolled previous month"
    );
    Ok(summary)
}

/// Roll the previous month if `today` is the first of a month and no roll
/// for that month has been recorded yet.
///
/// Runs first in every unit of work that reads or changes the current month.
pub async fn roll_at_month_start<T: LedgerTx>(
    tx: &mut T,
    today: NaiveDate,
) -> Result<Option<RollSummary>, LedgerError> {
    if today.day() != 1 {
        return Ok(None);
    }
    if !tx.mark_month_rolled(previous_month_start(today)).await? {
        return Ok(None);
    }
    roll_previous_month(tx, today).await.map(Some)
}
