use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::loan::LoanId;

/// The requirement for one loan in one calendar month.
///
/// Created lazily the first time the month is evaluated and unique per
/// `(loan_id, month)`. `amount_required` is a snapshot of the loan's monthly
/// amount at creation and does not follow later changes to the loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyObligation {
    pub id: Uuid,
    pub loan_id: LoanId,
    /// First day of the month this obligation covers.
    pub month: NaiveDate,
    pub amount_required: i64,
    pub amount_paid: i64,
    pub is_paid: bool,
}

impl MonthlyObligation {
    /// A fresh, unpaid obligation for `loan_id` in `month`.
    pub fn new(loan_id: LoanId, month: NaiveDate, amount_required: i64) -> Self {
        Self {
            id: Uuid::now_v7(),
            loan_id,
            month,
            amount_required,
            amount_paid: 0,
            is_paid: false,
        }
    }

    /// Amount still needed to settle this month. Never negative.
    pub fn outstanding(&self) -> i64 {
        (self.amount_required - self.amount_paid).max(0)
    }
}

/// An obligation joined with the owning loan's display fields.
///
/// Produced by month listings, which order by `due_day` ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationLine {
    pub obligation: MonthlyObligation,
    pub loan_name: String,
    pub due_day: u8,
}
