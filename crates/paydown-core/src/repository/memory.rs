//! In-memory ledger store.
//!
//! A transaction takes an owned lock on the whole ledger and works on a
//! private copy; `commit` swaps the copy in. Dropping the transaction releases
//! the lock and discards the copy, which gives the same rollback behaviour as
//! the SQLite store.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use paydown_types::error::RepositoryError;
use paydown_types::loan::{Loan, LoanId};
use paydown_types::obligation::{MonthlyObligation, ObligationLine};
use paydown_types::savings::SavingsLog;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{LedgerStore, LedgerTx, LoanFilter};

#[derive(Debug, Clone, Default)]
struct LedgerState {
    loans: Vec<Loan>,
    obligations: Vec<MonthlyObligation>,
    savings: Vec<SavingsLog>,
    rolled_months: BTreeSet<NaiveDate>,
}

/// Ledger store holding everything in process memory.
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<LedgerState>>,
    fail_payment_writes: Arc<AtomicBool>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent obligation payment update fail with a query error.
    pub fn fail_payment_writes(&self, fail: bool) {
        self.fail_payment_writes.store(fail, Ordering::SeqCst);
    }

    /// Committed savings log entries, oldest first.
    pub async fn savings(&self) -> Vec<SavingsLog> {
        self.state.lock().await.savings.clone()
    }

    /// Committed obligations in insertion order.
    pub async fn obligations(&self) -> Vec<MonthlyObligation> {
        self.state.lock().await.obligations.clone()
    }

    /// Committed loans in insertion order.
    pub async fn loans(&self) -> Vec<Loan> {
        self.state.lock().await.loans.clone()
    }

    /// Insert an obligation row directly, bypassing the fetch-or-create path.
    pub async fn force_obligation(&self, obligation: MonthlyObligation) {
        self.state.lock().await.obligations.push(obligation);
    }
}

impl LedgerStore for InMemoryLedgerStore {
    type Tx = InMemoryLedgerTx;

    async fn begin(&self) -> Result<InMemoryLedgerTx, RepositoryError> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(InMemoryLedgerTx {
            guard,
            work,
            fail_payment_writes: self.fail_payment_writes.load(Ordering::SeqCst),
        })
    }
}

/// Transaction over [`InMemoryLedgerStore`].
pub struct InMemoryLedgerTx {
    guard: OwnedMutexGuard<LedgerState>,
    work: LedgerState,
    fail_payment_writes: bool,
}

impl InMemoryLedgerTx {
    fn loan_due_day(&self, loan_id: &LoanId) -> Option<(u8, bool, &str)> {
        self.work
            .loans
            .iter()
            .find(|l| l.id == *loan_id)
            .map(|l| (l.due_day, l.closed, l.name.as_str()))
    }
}

impl LedgerTx for InMemoryLedgerTx {
    async fn count_loans(&mut self) -> Result<i64, RepositoryError> {
        Ok(self.work.loans.len() as i64)
    }

    async fn insert_loan(&mut self, loan: &Loan) -> Result<(), RepositoryError> {
        if self.work.loans.iter().any(|l| l.id == loan.id) {
            return Err(RepositoryError::Conflict(format!(
                "loan {} already exists",
                loan.id
            )));
        }
        self.work.loans.push(loan.clone());
        Ok(())
    }

    async fn get_loan(&mut self, id: &LoanId) -> Result<Option<Loan>, RepositoryError> {
        Ok(self.work.loans.iter().find(|l| l.id == *id).cloned())
    }

    async fn list_loans(&mut self, filter: LoanFilter) -> Result<Vec<Loan>, RepositoryError> {
        let mut loans: Vec<Loan> = self
            .work
            .loans
            .iter()
            .filter(|l| match filter {
                LoanFilter::All => true,
                LoanFilter::Open => !l.closed,
                LoanFilter::Closed => l.closed,
            })
            .cloned()
            .collect();
        loans.sort_by_key(|l| (l.due_day, l.id));
        Ok(loans)
    }

    async fn update_loan_state(
        &mut self,
        id: &LoanId,
        months_left: i32,
        closed: bool,
    ) -> Result<(), RepositoryError> {
        let loan = self
            .work
            .loans
            .iter_mut()
            .find(|l| l.id == *id)
            .ok_or(RepositoryError::NotFound)?;
        loan.months_left = months_left;
        loan.closed = closed;
        Ok(())
    }

    async fn get_obligation(
        &mut self,
        loan_id: &LoanId,
        month: NaiveDate,
    ) -> Result<Option<MonthlyObligation>, RepositoryError> {
        let mut matches = self
            .work
            .obligations
            .iter()
            .filter(|o| o.loan_id == *loan_id && o.month == month);
        let first = matches.next().cloned();
        if matches.next().is_some() {
            return Err(RepositoryError::Conflict(format!(
                "duplicate obligation for loan {loan_id} in {month}"
            )));
        }
        Ok(first)
    }

    async fn insert_obligation(
        &mut self,
        obligation: &MonthlyObligation,
    ) -> Result<(), RepositoryError> {
        if self
            .work
            .obligations
            .iter()
            .any(|o| o.loan_id == obligation.loan_id && o.month == obligation.month)
        {
            return Err(RepositoryError::Conflict(format!(
                "obligation for loan {} in {} already exists",
                obligation.loan_id, obligation.month
            )));
        }
        self.work.obligations.push(obligation.clone());
        Ok(())
    }

    async fn update_obligation_payment(
        &mut self,
        obligation: &MonthlyObligation,
    ) -> Result<(), RepositoryError> {
        if self.fail_payment_writes {
            return Err(RepositoryError::Query("injected write failure".to_string()));
        }
        let stored = self
            .work
            .obligations
            .iter_mut()
            .find(|o| o.id == obligation.id)
            .ok_or(RepositoryError::NotFound)?;
        stored.amount_paid = obligation.amount_paid;
        stored.is_paid = obligation.is_paid;
        Ok(())
    }

    async fn list_unpaid_obligations(
        &mut self,
        month: NaiveDate,
    ) -> Result<Vec<MonthlyObligation>, RepositoryError> {
        let mut rows: Vec<(u8, LoanId, MonthlyObligation)> = self
            .work
            .obligations
            .iter()
            .filter(|o| o.month == month && !o.is_paid)
            .filter_map(|o| match self.loan_due_day(&o.loan_id) {
                Some((due_day, false, _)) => Some((due_day, o.loan_id, o.clone())),
                _ => None,
            })
            .collect();
        rows.sort_by_key(|(due_day, loan_id, _)| (*due_day, *loan_id));
        Ok(rows.into_iter().map(|(_, _, o)| o).collect())
    }

    async fn list_month_obligations(
        &mut self,
        month: NaiveDate,
    ) -> Result<Vec<ObligationLine>, RepositoryError> {
        let mut lines: Vec<ObligationLine> = self
            .work
            .obligations
            .iter()
            .filter(|o| o.month == month)
            .filter_map(|o| {
                self.loan_due_day(&o.loan_id)
                    .map(|(due_day, _, name)| ObligationLine {
                        obligation: o.clone(),
                        loan_name: name.to_string(),
                        due_day,
                    })
            })
            .collect();
        lines.sort_by_key(|l| (l.due_day, l.obligation.loan_id));
        Ok(lines)
    }

    async fn append_savings(&mut self, entry: &SavingsLog) -> Result<(), RepositoryError> {
        self.work.savings.push(entry.clone());
        Ok(())
    }

    async fn mark_month_rolled(&mut self, month: NaiveDate) -> Result<bool, RepositoryError> {
        Ok(self.work.rolled_months.insert(month))
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        let InMemoryLedgerTx {
            mut guard, work, ..
        } = self;
        *guard = work;
        Ok(())
    }
}
