//! Monthly obligation tracker and daily target.

use chrono::NaiveDate;
use paydown_types::error::LedgerError;
use paydown_types::loan::Loan;
use paydown_types::obligation::MonthlyObligation;
use paydown_types::report::MonthPool;

use crate::calendar::{days_remaining_in_month, first_of_month};
use crate::ledger::active_loans;
use crate::repository::LedgerTx;

/// Savings needed per day to cover `remaining` over `days_left` days.
///
/// Rounds up, so `target * days_left >= remaining` always holds.
pub fn daily_target(remaining: i64, days_left: i64) -> i64 {
    if days_left > 0 {
        remaining / days_left + i64::from(remaining % days_left != 0)
    } else {
        remaining
    }
}

/// Fetch the loan's obligation for `month_start`, creating it on first access.
pub async fn ensure_obligation<T: LedgerTx>(
    tx: &mut T,
    loan: &Loan,
    month_start: NaiveDate,
) -> Result<MonthlyObligation, LedgerError> {
    if let Some(existing) = tx.get_obligation(&loan.id, month_start).await? {
        return Ok(existing);
    }

    let obligation = MonthlyObligation::new(loan.id, month_start, loan.monthly_amount);
    tx.insert_obligation(&obligation).await?;
    tracing::debug!(
        loan_id = %loan.id,
        month = %month_start,
        required = obligation.amount_required,
        "created monthly obligation"
    );
    Ok(obligation)
}

/// Materialise this month's obligations and total them.
///
/// Loans not yet started (by `start_month` or `must_start_month`) are
/// skipped. Besides obligation creation, the only write is the lazy close
/// performed by [`active_loans`].
pub async fn compute_month_pool<T: LedgerTx>(
    tx: &mut T,
    today: NaiveDate,
) -> Result<MonthPool, LedgerError> {
    let month_start = first_of_month(today);

    let mut total_required = 0_i64;
    let mut total_paid = 0_i64;
    for loan in active_loans(tx).await? {
        if !loan.is_due_in(month_start) {
            continue;
        }
        let obligation = ensure_obligation(tx, &loan, month_start).await?;
        total_required = checked_total(total_required, obligation.amount_required, month_start)?;
        total_paid = checked_total(total_paid, obligation.amount_paid, month_start)?;
    }

    let remaining = (total_required - total_paid).max(0);
    let days_left = days_remaining_in_month(today);

    Ok(MonthPool {
        total_required,
        total_paid,
        remaining,
        days_left,
        daily_target: daily_target(remaining, days_left),
    })
}

fn checked_total(total: i64, amount: i64, month_start: NaiveDate) -> Result<i64, LedgerError> {
    total.checked_add(amount).ok_or_else(|| {
        LedgerError::Consistency(format!("obligation totals for {month_start} overflow"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{add_loan, prepare_loan};
    use crate::repository::LedgerStore;
    use crate::repository::memory::InMemoryLedgerStore;
    use paydown_types::loan::{LoanKind, NewLoan};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(name: &str, amount: i64, start: NaiveDate) -> NewLoan {
        NewLoan {
            name: name.to_string(),
            monthly_amount: amount,
            due_day: 10,
            months_left: 3,
            start_month: start,
            kind: LoanKind::Installment,
            must_start_month: None,
        }
    }

    #[test]
    fn test_daily_target_rounds_up() {
        assert_eq!(daily_target(100, 3), 34);
        assert_eq!(daily_target(99, 3), 33);
        assert_eq!(daily_target(0, 10), 0);
        assert_eq!(daily_target(1, 31), 1);
        assert_eq!(daily_target(i64::MAX, 2), i64::MAX / 2 + 1);
    }

    #[test]
    fn test_daily_target_without_days_is_remaining() {
        assert_eq!(daily_target(500, 0), 500);
    }

    #[tokio::test]
    async fn test_pool_sums_due_loans() {
        let store = InMemoryLedgerStore::new();
        let mut tx = store.begin().await.unwrap();
        add_loan(&mut tx, &request("A", 2_000_000, date(2025, 8, 1))).await.unwrap();
        add_loan(&mut tx, &request("B", 1_200_000, date(2025, 8, 1))).await.unwrap();
        add_loan(&mut tx, &request("Later", 900_000, date(2025, 9, 1))).await.unwrap();

        let pool = compute_month_pool(&mut tx, date(2025, 8, 2)).await.unwrap();
        assert_eq!(pool.total_required, 3_200_000);
        assert_eq!(pool.total_paid, 0);
        assert_eq!(pool.remaining, 3_200_000);
        assert_eq!(pool.days_left, 30);
        assert_eq!(pool.daily_target, 106_667);
    }

    #[tokio::test]
    async fn test_pool_is_idempotent_on_obligations() {
        let store = InMemoryLedgerStore::new();
        let mut tx = store.begin().await.unwrap();
        add_loan(&mut tx, &request("A", 2_000_000, date(2025, 8, 1))).await.unwrap();
        compute_month_pool(&mut tx, date(2025, 8, 5)).await.unwrap();
        compute_month_pool(&mut tx, date(2025, 8, 6)).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.obligations().await.len(), 1);
    }

    #[tokio::test]
    async fn test_must_start_month_gates_pool() {
        let store = InMemoryLedgerStore::new();
        let mut tx = store.begin().await.unwrap();
        let mut gated = request("Borrow 5M", 5_000_000, date(2025, 10, 1));
        gated.kind = LoanKind::SingleMonthBorrow;
        gated.months_left = 1;
        gated.must_start_month = Some(date(2025, 10, 1));
        add_loan(&mut tx, &gated).await.unwrap();

        let september = compute_month_pool(&mut tx, date(2025, 9, 10)).await.unwrap();
        assert_eq!(september.total_required, 0);
        assert_eq!(september.daily_target, 0);

        let october = compute_month_pool(&mut tx, date(2025, 10, 1)).await.unwrap();
        assert_eq!(october.total_required, 5_000_000);
    }

    #[tokio::test]
    async fn test_obligation_snapshots_monthly_amount() {
        let store = InMemoryLedgerStore::new();
        let mut tx = store.begin().await.unwrap();
        let loan = add_loan(&mut tx, &request("A", 1_000, date(2025, 8, 1))).await.unwrap();
        let first = ensure_obligation(&mut tx, &loan, date(2025, 8, 1)).await.unwrap();

        let mut raised = loan.clone();
        raised.monthly_amount = 5_000;
        let again = ensure_obligation(&mut tx, &raised, date(2025, 8, 1)).await.unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(again.amount_required, 1_000);
    }

    #[tokio::test]
    async fn test_duplicate_obligation_is_consistency_error() {
        let store = InMemoryLedgerStore::new();
        let mut tx = store.begin().await.unwrap();
        let loan = add_loan(&mut tx, &request("A", 1_000, date(2025, 8, 1))).await.unwrap();
        tx.commit().await.unwrap();

        let month = date(2025, 8, 1);
        store.force_obligation(MonthlyObligation::new(loan.id, month, 1_000)).await;
        store.force_obligation(MonthlyObligation::new(loan.id, month, 1_000)).await;

        let mut tx = store.begin().await.unwrap();
        let err = compute_month_pool(&mut tx, date(2025, 8, 3)).await.unwrap_err();
        assert!(matches!(err, LedgerError::Consistency(_)));
    }

    #[tokio::test]
    async fn test_overflowing_totals_are_an_error() {
        let store = InMemoryLedgerStore::new();
        let mut tx = store.begin().await.unwrap();
        // Stored rows that bypassed entry validation.
        for name in ["A", "B"] {
            let mut loan = prepare_loan(&request(name, 1, date(2025, 8, 1))).unwrap();
            loan.monthly_amount = i64::MAX;
            tx.insert_loan(&loan).await.unwrap();
        }

        let err = compute_month_pool(&mut tx, date(2025, 8, 2)).await.unwrap_err();
        assert!(matches!(err, LedgerError::Consistency(_)));
    }
}
