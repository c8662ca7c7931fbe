//! Loan records and their lifecycle.
//!
//! Functions here take an open [`LedgerTx`] so the caller decides the unit of
//! work; they never commit.

use chrono::{NaiveDate, Utc};
use paydown_types::error::LedgerError;
use paydown_types::loan::{Loan, LoanId, LoanKind, NewLoan};

use crate::calendar::first_of_month;
use crate::repository::{LedgerTx, LoanFilter};

/// Largest accepted monthly amount or deposit.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// The built-in starter plan: five regular loans beginning at `plan_start`
/// and three interest-free borrows, two of them held back until October 2025.
pub fn starter_plan(plan_start: NaiveDate) -> Vec<NewLoan> {
    let october = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap_or(plan_start);
    let regular = |name: &str, monthly_amount: i64, due_day: u8, months_left: i32, kind| NewLoan {
        name: name.to_string(),
        monthly_amount,
        due_day,
        months_left,
        start_month: plan_start,
        kind,
        must_start_month: None,
    };
    let borrow = |name: &str, monthly_amount: i64, start: NaiveDate, gated: bool| NewLoan {
        name: name.to_string(),
        monthly_amount,
        due_day: 31,
        months_left: 1,
        start_month: start,
        kind: LoanKind::SingleMonthBorrow,
        must_start_month: gated.then_some(start),
    };

    vec![
        regular("Loan #1", 2_000_000, 17, 3, LoanKind::Installment),
        regular("Loan #2", 1_200_000, 10, 4, LoanKind::Installment),
        regular("Loan #3", 2_650_000, 10, 9, LoanKind::Installment),
        regular("Loan #4", 2_100_000, 22, 15, LoanKind::Installment),
        regular("Loan #5 (interest)", 700_000, 10, 15, LoanKind::InterestOnly),
        borrow("Borrow 2.8M (repay this month)", 2_800_000, plan_start, false),
        borrow("Borrow 2.36M (from Oct 2025)", 2_360_000, october, true),
        borrow("Borrow 5M (from Oct 2025)", 5_000_000, october, true),
    ]
}

/// Check a loan request and turn it into a storable [`Loan`].
///
/// Dates are normalised to the first of their month. A `must_start_month`
/// that names a different month than `start_month` is rejected: both fields
/// gate the same thing and neither is treated as authoritative.
pub fn prepare_loan(request: &NewLoan) -> Result<Loan, LedgerError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(LedgerError::Validation("loan name cannot be empty".to_string()));
    }
    if request.monthly_amount <= 0 {
        return Err(LedgerError::Validation(format!(
            "monthly amount must be positive, got {}",
            request.monthly_amount
        )));
    }
    if request.monthly_amount > MAX_AMOUNT {
        return Err(LedgerError::Validation(format!(
            "monthly amount cannot exceed {MAX_AMOUNT}, got {}",
            request.monthly_amount
        )));
    }
    if !(1..=31).contains(&request.due_day) {
        return Err(LedgerError::Validation(format!(
            "due day must be between 1 and 31, got {}",
            request.due_day
        )));
    }
    if request.months_left < 0 {
        return Err(LedgerError::Validation(format!(
            "months left cannot be negative, got {}",
            request.months_left
        )));
    }

    let start_month = first_of_month(request.start_month);
    let must_start_month = request.must_start_month.map(first_of_month);
    if let Some(gate) = must_start_month {
        if gate != start_month {
            return Err(LedgerError::Consistency(format!(
                "loan '{name}' starts {start_month} but must start {gate}"
            )));
        }
    }

    Ok(Loan {
        id: LoanId::new(),
        name: name.to_string(),
        monthly_amount: request.monthly_amount,
        due_day: request.due_day,
        months_left: request.months_left,
        start_month,
        kind: request.kind,
        must_start_month,
        closed: false,
        created_at: Utc::now(),
    })
}

/// Insert `plan` if the ledger holds no loans. Returns how many were inserted.
pub async fn bootstrap_if_empty<T: LedgerTx>(
    tx: &mut T,
    plan: &[NewLoan],
) -> Result<usize, LedgerError> {
    if tx.count_loans().await? > 0 {
        return Ok(0);
    }

    let loans = plan
        .iter()
        .map(prepare_loan)
        .collect::<Result<Vec<_>, _>>()?;
    for loan in &loans {
        tx.insert_loan(loan).await?;
    }

    tracing::info!(count = loans.len(), "seeded starter plan");
    Ok(loans.len())
}

/// Validate and insert a single loan.
pub async fn add_loan<T: LedgerTx>(tx: &mut T, request: &NewLoan) -> Result<Loan, LedgerError> {
    let loan = prepare_loan(request)?;
    tx.insert_loan(&loan).await?;
    tracing::info!(loan_id = %loan.id, name = %loan.name, kind = %loan.kind, "loan added");
    Ok(loan)
}

/// Close a loan by hand. Closing an already closed loan is a no-op.
pub async fn close_loan<T: LedgerTx>(tx: &mut T, id: &LoanId) -> Result<Loan, LedgerError> {
    let mut loan = tx
        .get_loan(id)
        .await?
        .ok_or(LedgerError::LoanNotFound(*id))?;
    if !loan.closed {
        loan.closed = true;
        tx.update_loan_state(&loan.id, loan.months_left, true).await?;
        tracing::info!(loan_id = %loan.id, "loan closed manually");
    }
    Ok(loan)
}

/// Open loans with months remaining.
///
/// Lists open loans, then reconciles: any with `months_left <= 0` is marked
/// closed in the same transaction and left out of the result.
pub async fn active_loans<T: LedgerTx>(tx: &mut T) -> Result<Vec<Loan>, LedgerError> {
    let open = tx.list_loans(LoanFilter::Open).await?;
    let (active, exhausted): (Vec<Loan>, Vec<Loan>) =
        open.into_iter().partition(|l| l.months_left > 0);

    for loan in &exhausted {
        tx.update_loan_state(&loan.id, loan.months_left, true).await?;
        tracing::info!(loan_id = %loan.id, "closed loan with no months left");
    }

    Ok(active)
}
