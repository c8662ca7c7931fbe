//! Month boundary arithmetic.

use chrono::{Datelike, Days, Months, NaiveDate};

/// `d` with the day set to 1.
pub fn first_of_month(d: NaiveDate) -> NaiveDate {
    d - Days::new(u64::from(d.day0()))
}

/// Final calendar day of `d`'s month.
pub fn last_of_month(d: NaiveDate) -> NaiveDate {
    first_of_month(d) + Months::new(1) - Days::new(1)
}

/// Days from `d` to the end of its month, counting `d` itself.
pub fn days_remaining_in_month(d: NaiveDate) -> i64 {
    (last_of_month(d) - d).num_days() + 1
}

/// First day of the month before the one containing `d`.
pub fn previous_month_start(d: NaiveDate) -> NaiveDate {
    first_of_month(first_of_month(d) - Days::new(1))
}
