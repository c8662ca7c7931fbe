use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only audit record of a deposit.
///
/// Written before allocation runs, whether or not the amount can be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsLog {
    pub id: Uuid,
    /// Local calendar date the deposit was made on.
    pub date: NaiveDate,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl SavingsLog {
    pub fn new(date: NaiveDate, amount: i64) -> Self {
        Self {
            id: Uuid::now_v7(),
            date,
            amount,
            created_at: Utc::now(),
        }
    }
}
