use chrono::NaiveDate;
use paydown_core::repository::memory::InMemoryLedgerStore;
use paydown_core::service::LedgerService;
use paydown_core::tracker::daily_target;
use paydown_types::loan::{LoanKind, NewLoan};
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn august() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
}

fn loan_requests(specs: &[(i64, u8)]) -> Vec<NewLoan> {
    specs
        .iter()
        .enumerate()
        .map(|(i, (amount, due_day))| NewLoan {
            name: format!("Loan {i}"),
            monthly_amount: *amount,
            due_day: *due_day,
            months_left: 3,
            start_month: august(),
            kind: LoanKind::Installment,
            must_start_month: None,
        })
        .collect()
}

async fn seeded(specs: &[(i64, u8)]) -> LedgerService<InMemoryLedgerStore> {
    let svc = LedgerService::new(InMemoryLedgerStore::new(), loan_requests(specs));
    svc.bootstrap().await.unwrap();
    svc
}

proptest! {
    /// Saving the target every remaining day covers the month, and one unit
    /// less per day would not.
    #[test]
    fn daily_target_is_smallest_covering_amount(remaining in 1i64..100_000_000, days in 1i64..32) {
        let target = daily_target(remaining, days);
        prop_assert!(target * days >= remaining);
        prop_assert!((target - 1) * days < remaining);
    }

    /// Every unit of a deposit is either applied or reported unallocated, and
    /// no obligation is ever funded beyond its requirement.
    #[test]
    fn allocation_conserves_deposit(
        loans in prop::collection::vec((1i64..5_000_000, 1u8..=31), 1..8),
        deposits in prop::collection::vec(1i64..8_000_000, 1..6),
    ) {
        runtime().block_on(async {
            let svc = seeded(&loans).await;
            let today = NaiveDate::from_ymd_opt(2025, 8, 12).unwrap();
            let required: i64 = loans.iter().map(|(a, _)| a).sum();

            let mut deposited = 0i64;
            for amount in &deposits {
                let allocation = svc.deposit(today, *amount).await.unwrap();
                prop_assert_eq!(allocation.allocated() + allocation.unallocated, *amount);
                prop_assert!(allocation.payments.iter().all(|p| p.amount > 0));
                deposited += amount;
            }

            let status = svc.month_status(today).await.unwrap();
            for line in &status.lines {
                let o = &line.obligation;
                prop_assert!(o.amount_paid <= o.amount_required);
                prop_assert_eq!(o.is_paid, o.amount_paid >= o.amount_required);
            }
            prop_assert_eq!(status.pool.total_required, required);
            prop_assert_eq!(status.pool.total_paid, deposited.min(required));
            prop_assert_eq!(status.pool.remaining, (required - deposited).max(0));
            Ok(())
        })?;
    }

    /// Funding follows due day: in (due day, loan id) order the obligations
    /// are fully paid, then at most one partly paid, then untouched.
    #[test]
    fn earlier_due_days_are_funded_first(
        loans in prop::collection::vec((1i64..2_000_000, 1u8..=31), 2..8),
        deposits in prop::collection::vec(1i64..3_000_000, 1..4),
    ) {
        runtime().block_on(async {
            let svc = seeded(&loans).await;
            let today = NaiveDate::from_ymd_opt(2025, 8, 5).unwrap();
            for amount in &deposits {
                svc.deposit(today, *amount).await.unwrap();
            }

            let mut lines = svc.month_status(today).await.unwrap().lines;
            lines.sort_by_key(|l| (l.due_day, l.obligation.loan_id));

            let mut seen_unfunded = false;
            for line in &lines {
                let o = &line.obligation;
                if seen_unfunded {
                    prop_assert_eq!(o.amount_paid, 0);
                }
                if !o.is_paid {
                    seen_unfunded = true;
                }
            }
            Ok(())
        })?;
    }

    /// A paid month decrements every regular loan once on the first of the
    /// next month; an underpaid loan keeps its counter.
    #[test]
    fn roll_decrements_exactly_the_paid_loans(
        loans in prop::collection::vec((1i64..1_000_000, 1u8..=31), 1..6),
        deposit in 1i64..6_000_000,
    ) {
        runtime().block_on(async {
            let svc = seeded(&loans).await;
            let mid = NaiveDate::from_ymd_opt(2025, 8, 15).unwrap();
            svc.deposit(mid, deposit).await.unwrap();

            let paid: Vec<_> = svc
                .month_status(mid)
                .await
                .unwrap()
                .lines
                .into_iter()
                .filter(|l| l.obligation.is_paid)
                .map(|l| l.obligation.loan_id)
                .collect();

            let sept = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
            let start = svc.begin_day(sept).await.unwrap();
            let rolled = start.rolled.unwrap();
            prop_assert_eq!(rolled.decremented.len(), paid.len());

            for loan in svc.list_loans().await.unwrap() {
                let expected = if paid.contains(&loan.id) { 2 } else { 3 };
                prop_assert_eq!(loan.months_left, expected);
            }

            // The same day boundary never rolls twice.
            let again = svc.begin_day(sept).await.unwrap();
            prop_assert!(again.rolled.is_none());
            Ok(())
        })?;
    }

    /// A borrow gated to a later month contributes nothing before that month.
    #[test]
    fn gated_borrow_is_excluded_before_its_month(day in 1u32..=30) {
        runtime().block_on(async {
            let gated = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
            let svc = LedgerService::new(
                InMemoryLedgerStore::new(),
                vec![NewLoan {
                    name: "Borrow 5M".to_string(),
                    monthly_amount: 5_000_000,
                    due_day: 31,
                    months_left: 1,
                    start_month: gated,
                    kind: LoanKind::SingleMonthBorrow,
                    must_start_month: Some(gated),
                }],
            );
            svc.bootstrap().await.unwrap();

            let september = NaiveDate::from_ymd_opt(2025, 9, day).unwrap();
            let pool = svc.month_pool(september).await.unwrap();
            prop_assert_eq!(pool.total_required, 0);
            prop_assert_eq!(pool.daily_target, 0);

            let october = NaiveDate::from_ymd_opt(2025, 10, day).unwrap();
            let pool = svc.month_pool(october).await.unwrap();
            prop_assert_eq!(pool.total_required, 5_000_000);
            Ok(())
        })?;
    }
}

#[tokio::test]
async fn borrow_paid_in_full_closes_and_leaves_the_pool() {
    let svc = LedgerService::new(
        InMemoryLedgerStore::new(),
        vec![NewLoan {
            name: "Borrow 2.8M".to_string(),
            monthly_amount: 2_800_000,
            due_day: 31,
            months_left: 1,
            start_month: august(),
            kind: LoanKind::SingleMonthBorrow,
            must_start_month: None,
        }],
    );
    svc.bootstrap().await.unwrap();

    let today = NaiveDate::from_ymd_opt(2025, 8, 20).unwrap();
    let report = svc.save(today, 2_800_000).await.unwrap();
    assert_eq!(report.allocation.closed.len(), 1);
    assert_eq!(report.allocation.unallocated, 0);
    assert_eq!(report.pool_after.total_required, 0);
    assert_eq!(report.closed_loans.len(), 1);
    assert_eq!(report.closed_loans[0].months_left, 0);

    // Borrows are exempt from the roll, so September does not touch it.
    let start = svc
        .begin_day(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap())
        .await
        .unwrap();
    assert!(start.rolled.unwrap().decremented.is_empty());
}
