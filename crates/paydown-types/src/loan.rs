use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Unique identifier for a loan, wrapping a UUID v7 (time-sortable).
///
/// Ordering by id is ordering by creation time, which the allocation engine
/// uses as the tie-break between loans sharing a due day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LoanId(pub Uuid);

impl LoanId {
    /// Create a new LoanId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for LoanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LoanId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Repayment category of a loan.
///
/// - Installment: fixed monthly amount for a known number of months
/// - InterestOnly: recurring interest payment, open-ended until closed by hand
///   or until its counter runs out
/// - SingleMonthBorrow: interest-free borrow repaid in full within the month it
///   starts; closes as soon as that month's obligation is paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanKind {
    Installment,
    InterestOnly,
    SingleMonthBorrow,
}

impl LoanKind {
    pub fn is_interest_only(self) -> bool {
        matches!(self, LoanKind::InterestOnly)
    }

    pub fn is_interest_free_borrow(self) -> bool {
        matches!(self, LoanKind::SingleMonthBorrow)
    }

    pub fn pays_in_full_single_month(self) -> bool {
        matches!(self, LoanKind::SingleMonthBorrow)
    }

    /// Whether a fully paid month counts down `months_left` at month roll.
    pub fn decrements_on_roll(self) -> bool {
        !self.is_interest_free_borrow()
    }

    /// Whether paying the current month in full closes the loan at once.
    pub fn closes_when_month_paid(self) -> bool {
        self.is_interest_free_borrow() && self.pays_in_full_single_month()
    }
}

impl fmt::Display for LoanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoanKind::Installment => write!(f, "installment"),
            LoanKind::InterestOnly => write!(f, "interest_only"),
            LoanKind::SingleMonthBorrow => write!(f, "single_month_borrow"),
        }
    }
}

impl FromStr for LoanKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "installment" => Ok(LoanKind::Installment),
            "interest_only" => Ok(LoanKind::InterestOnly),
            "single_month_borrow" | "borrow" => Ok(LoanKind::SingleMonthBorrow),
            other => Err(format!("invalid loan kind: '{other}'")),
        }
    }
}

impl Default for LoanKind {
    fn default() -> Self {
        LoanKind::Installment
    }
}

/// A recurring repayment obligation tracked by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    /// Display label.
    pub name: String,
    /// Required contribution per active month.
    pub monthly_amount: i64,
    /// Day of month (1-31). Orders allocation priority; not a hard deadline.
    pub due_day: u8,
    /// Remaining obligation months. The loan is finished at 0.
    pub months_left: i32,
    /// First month (first-of-month date) in which the loan is counted.
    pub start_month: NaiveDate,
    pub kind: LoanKind,
    /// When set, no obligation is produced before this month.
    pub must_start_month: Option<NaiveDate>,
    pub closed: bool,
    pub created_at: DateTime<Utc>,
}

impl Loan {
    /// Whether the loan produces an obligation for the month starting at `month_start`.
    ///
    /// Only the gating dates are considered here; closed and exhausted loans are
    /// filtered out by the ledger before this is asked.
    pub fn is_due_in(&self, month_start: NaiveDate) -> bool {
        if month_start < self.start_month {
            return false;
        }
        match self.must_start_month {
            Some(gate) => month_start >= gate,
            None => true,
        }
    }
}

/// Request to add a loan to the ledger.
///
/// Dates may be any day of the month; the ledger normalises them to the
/// first of the month before storing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLoan {
    pub name: String,
    pub monthly_amount: i64,
    pub due_day: u8,
    pub months_left: i32,
    pub start_month: NaiveDate,
    #[serde(default)]
    pub kind: LoanKind,
    #[serde(default)]
    pub must_start_month: Option<NaiveDate>,
}
