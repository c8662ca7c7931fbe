//! SQLite ledger store.
//!
//! Implements `LedgerStore`/`LedgerTx` from `paydown-core`. Every unit of work
//! is one sqlx transaction on the single-connection writer pool; dropping a
//! [`SqliteLedgerTx`] without committing rolls it back.
//!
//! Transactions start with `BEGIN IMMEDIATE` so the write lock is taken up
//! front. A second process (the reminder daemon next to an interactive
//! command) then waits on the busy timeout instead of failing with a stale
//! read snapshot halfway through a unit of work.

use chrono::{DateTime, NaiveDate, Utc};
use paydown_core::repository::{LedgerStore, LedgerTx, LoanFilter};
use paydown_types::error::RepositoryError;
use paydown_types::loan::{Loan, LoanId, LoanKind};
use paydown_types::obligation::{MonthlyObligation, ObligationLine};
use paydown_types::savings::SavingsLog;
use sqlx::{Row, Sqlite, Transaction};
use uuid::Uuid;

use super::pool::DatabasePool;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed implementation of `LedgerStore`.
#[derive(Clone)]
pub struct SqliteLedgerStore {
    pool: DatabasePool,
}

impl SqliteLedgerStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

impl LedgerStore for SqliteLedgerStore {
    type Tx = SqliteLedgerTx;

    async fn begin(&self) -> Result<SqliteLedgerTx, RepositoryError> {
        let tx = self
            .pool
            .writer
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(SqliteLedgerTx { tx })
    }
}

/// One open ledger transaction.
pub struct SqliteLedgerTx {
    tx: Transaction<'static, Sqlite>,
}

/// Internal row type for mapping SQLite rows to a domain Loan.
struct LoanRow {
    id: String,
    name: String,
    monthly_amount: i64,
    due_day: i64,
    months_left: i32,
    start_month: String,
    kind: String,
    must_start_month: Option<String>,
    closed: bool,
    created_at: String,
}

impl LoanRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            monthly_amount: row.try_get("monthly_amount")?,
            due_day: row.try_get("due_day")?,
            months_left: row.try_get("months_left")?,
            start_month: row.try_get("start_month")?,
            kind: row.try_get("kind")?,
            must_start_month: row.try_get("must_start_month")?,
            closed: row.try_get("closed")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_loan(self) -> Result<Loan, RepositoryError> {
        let id = self
            .id
            .parse::<LoanId>()
            .map_err(|e| RepositoryError::Query(format!("invalid loan id: {e}")))?;

        let kind: LoanKind = self.kind.parse().map_err(RepositoryError::Query)?;

        let due_day = u8::try_from(self.due_day)
            .map_err(|_| RepositoryError::Query(format!("invalid due day: {}", self.due_day)))?;

        Ok(Loan {
            id,
            name: self.name,
            monthly_amount: self.monthly_amount,
            due_day,
            months_left: self.months_left,
            start_month: parse_date(&self.start_month)?,
            kind,
            must_start_month: self.must_start_month.as_deref().map(parse_date).transpose()?,
            closed: self.closed,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn obligation_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<MonthlyObligation, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_err)?;
    let loan_id: String = row.try_get("loan_id").map_err(query_err)?;
    let month: String = row.try_get("month").map_err(query_err)?;

    Ok(MonthlyObligation {
        id: Uuid::parse_str(&id)
            .map_err(|e| RepositoryError::Query(format!("invalid obligation id: {e}")))?,
        loan_id: loan_id
            .parse::<LoanId>()
            .map_err(|e| RepositoryError::Query(format!("invalid loan id: {e}")))?,
        month: parse_date(&month)?,
        amount_required: row.try_get("amount_required").map_err(query_err)?,
        amount_paid: row.try_get("amount_paid").map_err(query_err)?,
        is_paid: row.try_get("is_paid").map_err(query_err)?,
    })
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

/// Map a UNIQUE violation to `Conflict`, anything else to `Query`.
fn write_err(e: sqlx::Error, what: impl FnOnce() -> String) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.message().contains("UNIQUE") {
            return RepositoryError::Conflict(what());
        }
    }
    RepositoryError::Query(e.to_string())
}

fn parse_date(s: &str) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| RepositoryError::Query(format!("invalid date '{s}': {e}")))
}

fn format_date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

impl LedgerTx for SqliteLedgerTx {
    async fn count_loans(&mut self) -> Result<i64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM loans")
            .fetch_one(&mut *self.tx)
            .await
            .map_err(query_err)?;
        row.try_get("n").map_err(query_err)
    }

    async fn insert_loan(&mut self, loan: &Loan) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO loans (id, name, monthly_amount, due_day, months_left, start_month, kind, must_start_month, closed, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(loan.id.to_string())
        .bind(&loan.name)
        .bind(loan.monthly_amount)
        .bind(i64::from(loan.due_day))
        .bind(loan.months_left)
        .bind(format_date(loan.start_month))
        .bind(loan.kind.to_string())
        .bind(loan.must_start_month.map(format_date))
        .bind(loan.closed)
        .bind(loan.created_at.to_rfc3339())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| write_err(e, || format!("loan {} already exists", loan.id)))?;
        Ok(())
    }

    async fn get_loan(&mut self, id: &LoanId) -> Result<Option<Loan>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM loans WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => Ok(Some(LoanRow::from_row(&row).map_err(query_err)?.into_loan()?)),
            None => Ok(None),
        }
    }

    async fn list_loans(&mut self, filter: LoanFilter) -> Result<Vec<Loan>, RepositoryError> {
        let sql = match filter {
            LoanFilter::All => "SELECT * FROM loans ORDER BY due_day ASC, id ASC",
            LoanFilter::Open => "SELECT * FROM loans WHERE closed = 0 ORDER BY due_day ASC, id ASC",
            LoanFilter::Closed => {
                "SELECT * FROM loans WHERE closed = 1 ORDER BY due_day ASC, id ASC"
            }
        };

        let rows = sqlx::query(sql)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(query_err)?;

        rows.iter()
            .map(|row| LoanRow::from_row(row).map_err(query_err)?.into_loan())
            .collect()
    }

    async fn update_loan_state(
        &mut self,
        id: &LoanId,
        months_left: i32,
        closed: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE loans SET months_left = ?, closed = ? WHERE id = ?")
            .bind(months_left)
            .bind(closed)
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn get_obligation(
        &mut self,
        loan_id: &LoanId,
        month: NaiveDate,
    ) -> Result<Option<MonthlyObligation>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM monthly_obligations WHERE loan_id = ? AND month = ?")
            .bind(loan_id.to_string())
            .bind(format_date(month))
            .fetch_all(&mut *self.tx)
            .await
            .map_err(query_err)?;

        match rows.as_slice() {
            [] => Ok(None),
            [row] => Ok(Some(obligation_from_row(row)?)),
            _ => Err(RepositoryError::Conflict(format!(
                "{} obligations for loan {loan_id} in {month}",
                rows.len()
            ))),
        }
    }

    async fn insert_obligation(
        &mut self,
        obligation: &MonthlyObligation,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO monthly_obligations (id, loan_id, month, amount_required, amount_paid, is_paid)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(obligation.id.to_string())
        .bind(obligation.loan_id.to_string())
        .bind(format_date(obligation.month))
        .bind(obligation.amount_required)
        .bind(obligation.amount_paid)
        .bind(obligation.is_paid)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            write_err(e, || {
                format!(
                    "obligation for loan {} in {} already exists",
                    obligation.loan_id, obligation.month
                )
            })
        })?;
        Ok(())
    }

    async fn update_obligation_payment(
        &mut self,
        obligation: &MonthlyObligation,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE monthly_obligations SET amount_paid = ?, is_paid = ? WHERE id = ?")
                .bind(obligation.amount_paid)
                .bind(obligation.is_paid)
                .bind(obligation.id.to_string())
                .execute(&mut *self.tx)
                .await
                .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_unpaid_obligations(
        &mut self,
        month: NaiveDate,
    ) -> Result<Vec<MonthlyObligation>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT o.* FROM monthly_obligations o
             JOIN loans l ON l.id = o.loan_id
             WHERE o.month = ? AND o.is_paid = 0 AND l.closed = 0
             ORDER BY l.due_day ASC, l.id ASC",
        )
        .bind(format_date(month))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(query_err)?;

        rows.iter().map(obligation_from_row).collect()
    }

    async fn list_month_obligations(
        &mut self,
        month: NaiveDate,
    ) -> Result<Vec<ObligationLine>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT o.*, l.name AS loan_name, l.due_day AS loan_due_day
             FROM monthly_obligations o
             JOIN loans l ON l.id = o.loan_id
             WHERE o.month = ?
             ORDER BY l.due_day ASC, l.id ASC",
        )
        .bind(format_date(month))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(query_err)?;

        rows.iter()
            .map(|row| {
                let due_day: i64 = row.try_get("loan_due_day").map_err(query_err)?;
                Ok(ObligationLine {
                    obligation: obligation_from_row(row)?,
                    loan_name: row.try_get("loan_name").map_err(query_err)?,
                    due_day: u8::try_from(due_day)
                        .map_err(|_| RepositoryError::Query(format!("invalid due day: {due_day}")))?,
                })
            })
            .collect()
    }

    async fn append_savings(&mut self, entry: &SavingsLog) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO savings_logs (id, date, amount, created_at) VALUES (?, ?, ?, ?)")
            .bind(entry.id.to_string())
            .bind(format_date(entry.date))
            .bind(entry.amount)
            .bind(entry.created_at.to_rfc3339())
            .execute(&mut *self.tx)
            .await
            .map_err(query_err)?;
        Ok(())
    }

    async fn mark_month_rolled(&mut self, month: NaiveDate) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO month_rollovers (month, rolled_at) VALUES (?, ?)")
                .bind(format_date(month))
                .bind(Utc::now().to_rfc3339())
                .execute(&mut *self.tx)
                .await
                .map_err(query_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await.map_err(query_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paydown_core::ledger::{prepare_loan, starter_plan};
    use paydown_core::service::LedgerService;
    use paydown_types::error::LedgerError;
    use paydown_types::loan::NewLoan;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn test_store() -> (SqliteLedgerStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let pool = DatabasePool::open_in(dir.path()).await.unwrap();
        (SqliteLedgerStore::new(pool), dir)
    }

    fn request(name: &str, amount: i64, due_day: u8, months_left: i32) -> NewLoan {
        NewLoan {
            name: name.to_string(),
            monthly_amount: amount,
            due_day,
            months_left,
            start_month: date(2025, 8, 1),
            kind: LoanKind::Installment,
            must_start_month: None,
        }
    }

    #[tokio::test]
    async fn test_loan_round_trips_through_rows() {
        let (store, _dir) = test_store().await;
        let svc = LedgerService::new(store.clone(), Vec::new());
        let mut req = request("Borrow", 5_000_000, 31, 1);
        req.kind = LoanKind::SingleMonthBorrow;
        req.start_month = date(2025, 10, 1);
        req.must_start_month = Some(date(2025, 10, 1));
        let loan = svc.add_loan(req).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let fetched = tx.get_loan(&loan.id).await.unwrap().unwrap();
        assert_eq!(fetched, loan);
        assert_eq!(fetched.must_start_month, Some(date(2025, 10, 1)));
    }

    #[tokio::test]
    async fn test_starter_plan_first_day_target() {
        let (store, _dir) = test_store().await;
        let svc = LedgerService::new(store, starter_plan(date(2025, 8, 1)));
        assert_eq!(svc.bootstrap().await.unwrap(), 8);
        assert_eq!(svc.bootstrap().await.unwrap(), 0);

        let start = svc.begin_day(date(2025, 8, 1)).await.unwrap();
        assert_eq!(start.pool.total_required, 11_450_000);
        assert_eq!(start.pool.days_left, 31);
        assert_eq!(start.pool.daily_target, 369_355);
    }

    #[tokio::test]
    async fn test_allocation_orders_by_due_day() {
        let (store, _dir) = test_store().await;
        let svc = LedgerService::new(store, Vec::new());
        let late = svc.add_loan(request("Late", 1_000, 25, 3)).await.unwrap();
        let early = svc.add_loan(request("Early", 1_000, 5, 3)).await.unwrap();

        let allocation = svc.deposit(date(2025, 8, 3), 1_500).await.unwrap();
        assert_eq!(allocation.payments.len(), 2);
        assert_eq!(allocation.payments[0].loan_id, early.id);
        assert!(allocation.payments[0].settled);
        assert_eq!(allocation.payments[1].loan_id, late.id);
        assert_eq!(allocation.payments[1].amount, 500);

        let status = svc.month_status(date(2025, 8, 3)).await.unwrap();
        assert_eq!(status.lines[0].loan_name, "Early");
        assert_eq!(status.lines[1].obligation.amount_paid, 500);
        assert_eq!(status.pool.remaining, 500);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let (store, _dir) = test_store().await;
        let loan = paydown_core::ledger::prepare_loan(&request("Car", 3_000, 10, 3)).unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.insert_loan(&loan).await.unwrap();
        assert_eq!(tx.count_loans().await.unwrap(), 1);
        drop(tx);

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.count_loans().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_obligation_is_conflict() {
        let (store, _dir) = test_store().await;
        let loan = paydown_core::ledger::prepare_loan(&request("Car", 3_000, 10, 3)).unwrap();
        let month = date(2025, 8, 1);

        let mut tx = store.begin().await.unwrap();
        tx.insert_loan(&loan).await.unwrap();
        tx.insert_obligation(&MonthlyObligation::new(loan.id, month, 3_000))
            .await
            .unwrap();
        let err = tx
            .insert_obligation(&MonthlyObligation::new(loan.id, month, 3_000))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_month_rolled_marker_is_set_once() {
        let (store, _dir) = test_store().await;
        let mut tx = store.begin().await.unwrap();
        assert!(tx.mark_month_rolled(date(2025, 8, 1)).await.unwrap());
        assert!(!tx.mark_month_rolled(date(2025, 8, 1)).await.unwrap());
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(!tx.mark_month_rolled(date(2025, 8, 1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_roll_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let loan_id = {
            let pool = DatabasePool::open_in(dir.path()).await.unwrap();
            let svc = LedgerService::new(SqliteLedgerStore::new(pool.clone()), Vec::new());
            let loan = svc.add_loan(request("Car", 3_000, 10, 1)).await.unwrap();
            svc.deposit(date(2025, 8, 9), 3_000).await.unwrap();
            let start = svc.begin_day(date(2025, 9, 1)).await.unwrap();
            assert_eq!(start.rolled.unwrap().closed, vec![loan.id]);
            pool.close().await;
            loan.id
        };

        let pool = DatabasePool::open_in(dir.path()).await.unwrap();
        let svc = LedgerService::new(SqliteLedgerStore::new(pool), Vec::new());
        let loans = svc.list_loans().await.unwrap();
        assert_eq!(loans[0].id, loan_id);
        assert!(loans[0].closed);
        assert_eq!(loans[0].months_left, 0);

        // Reopening does not roll the same month again.
        let again = svc.begin_day(date(2025, 9, 1)).await.unwrap();
        assert!(again.rolled.is_none());
        assert_eq!(again.pool.total_required, 0);
    }

    #[tokio::test]
    async fn test_close_unknown_loan() {
        let (store, _dir) = test_store().await;
        let svc = LedgerService::new(store, Vec::new());
        let err = svc.close_loan(&LoanId::new()).await.unwrap_err();
        assert!(matches!(err, LedgerError::LoanNotFound(_)));
    }

    #[tokio::test]
    async fn test_transaction_takes_write_lock_at_begin() {
        let dir = TempDir::new().unwrap();
        let first = SqliteLedgerStore::new(DatabasePool::open_in(dir.path()).await.unwrap());
        let second = SqliteLedgerStore::new(DatabasePool::open_in(dir.path()).await.unwrap());

        let loan = prepare_loan(&request("Late", 1_000, 5, 1)).unwrap();
        let held = first.begin().await.unwrap();
        let waiting = tokio::spawn(async move {
            let mut tx = second.begin().await?;
            tx.insert_loan(&loan).await?;
            tx.commit().await
        });

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert!(!waiting.is_finished(), "second writer should wait for the lock");

        held.commit().await.unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(4), waiting)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        let mut tx = first.begin().await.unwrap();
        assert_eq!(tx.list_loans(LoanFilter::All).await.unwrap().len(), 1);
    }
}
