//! Deposit allocation across the month's unpaid obligations.
//!
//! Priority is the owning loan's due day: earlier due days are funded first,
//! regardless of obligation size. Progress is never reverted; an amount that
//! cannot be placed comes back as the unallocated remainder.

use chrono::NaiveDate;
use paydown_types::error::LedgerError;
use paydown_types::loan::LoanId;
use paydown_types::report::{Allocation, Payment};
use paydown_types::savings::SavingsLog;

use crate::calendar::first_of_month;
use crate::repository::{LedgerTx, LoanFilter};
use crate::tracker::compute_month_pool;

/// Record a deposit and spread it over this month's unpaid obligations.
///
/// The deposit is logged before anything else. This month's obligations are
/// then materialised through the tracker so every due loan can be funded.
pub async fn allocate<T: LedgerTx>(
    tx: &mut T,
    today: NaiveDate,
    amount: i64,
) -> Result<Allocation, LedgerError> {
    tx.append_savings(&SavingsLog::new(today, amount)).await?;
    compute_month_pool(tx, today).await?;

    let month_start = first_of_month(today);
    let unpaid = tx.list_unpaid_obligations(month_start).await?;

    let mut remaining = amount;
    let mut payments = Vec::new();
    for mut obligation in unpaid {
        if remaining <= 0 {
            break;
        }

        let need = obligation.amount_required - obligation.amount_paid;
        if need <= 0 {
            obligation.is_paid = true;
            tx.update_obligation_payment(&obligation).await?;
            continue;
        }

        let pay = need.min(remaining);
        obligation.amount_paid += pay;
        remaining -= pay;
        if obligation.amount_paid >= obligation.amount_required {
            obligation.is_paid = true;
        }
        tx.update_obligation_payment(&obligation).await?;

        tracing::debug!(
            loan_id = %obligation.loan_id,
            month = %month_start,
            pay,
            settled = obligation.is_paid,
            "applied deposit to obligation"
        );
        payments.push(Payment {
            loan_id: obligation.loan_id,
            amount: pay,
            settled: obligation.is_paid,
        });
    }

    let closed = close_settled_borrows(tx, today).await?;

    tracing::info!(
        amount,
        allocated = amount - remaining,
        unallocated = remaining,
        "deposit allocated"
    );
    Ok(Allocation {
        payments,
        unallocated: remaining,
        closed,
    })
}

/// Close every open single-month borrow whose obligation for the current
/// month is fully paid. Safe to run any number of times.
pub async fn close_settled_borrows<T: LedgerTx>(
    tx: &mut T,
    today: NaiveDate,
) -> Result<Vec<LoanId>, LedgerError> {
    let month_start = first_of_month(today);
    let mut closed = Vec::new();

    for loan in tx.list_loans(LoanFilter::Open).await? {
        if !loan.kind.closes_when_month_paid() {
            continue;
        }
        let paid = tx
            .get_obligation(&loan.id, month_start)
            .await?
            .is_some_and(|o| o.is_paid);
        if paid {
            tx.update_loan_state(&loan.id, 0, true).await?;
            tracing::info!(loan_id = %loan.id, name = %loan.name, "borrow repaid, loan closed");
            closed.push(loan.id);
        }
    }

    Ok(closed)
}
