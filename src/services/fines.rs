//! Late-return fine policy

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

/// Flat rate per started day past the due date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinePolicy {
    per_day: Decimal,
}

impl FinePolicy {
    pub fn new(per_day: Decimal) -> Self {
        Self { per_day }
    }

    /// Started days between the due date and `at`; 0 when not late
    pub fn days_overdue(due_date: DateTime<Utc>, at: DateTime<Utc>) -> i64 {
        let late = at - due_date;
        if late <= Duration::zero() {
            return 0;
        }
        let whole_days = late.num_days();
        whole_days + i64::from(late > Duration::days(whole_days))
    }

    pub fn assess(&self, due_date: DateTime<Utc>, at: DateTime<Utc>) -> Decimal {
        self.per_day * Decimal::from(Self::days_overdue(due_date, at))
    }
}
