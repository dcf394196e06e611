//! Paid / pending state of a transaction.
//!
//! Nothing is stored for the date-driven transition: a transaction dated
//! today or earlier is effectuated, whatever its `effectuated_at`. The stored
//! override only matters while the date is still in the future.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effectuation {
    Pending,
    Effectuated,
}

impl Effectuation {
    #[must_use]
    pub fn of(
        effectuated_at: Option<DateTime<Utc>>,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Self {
        if effectuated_at.is_some() || date <= today {
            Self::Effectuated
        } else {
            Self::Pending
        }
    }

    #[must_use]
    pub fn is_pending(self) -> bool {
        self == Self::Pending
    }
}

/// `true` while the date alone still leaves the transaction pending.
#[must_use]
pub fn pending_by_date(date: NaiveDate, today: NaiveDate) -> bool {
    date > today
}

/// Outcome of "mark as paid": the new `effectuated_at`, or `None` when the
/// transaction is already effectuated and nothing changes.
#[must_use]
pub fn mark_paid(
    effectuated_at: Option<DateTime<Utc>>,
    date: NaiveDate,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> Option<DateTime<Utc>> {
    match Effectuation::of(effectuated_at, date, today) {
        Effectuation::Effectuated => None,
        Effectuation::Pending => Some(now),
    }
}

/// `true` when "unmark as paid" clears the override: it must have been set
/// explicitly and the date must still be in the future.
#[must_use]
pub fn can_unmark(effectuated_at: Option<DateTime<Utc>>, date: NaiveDate, today: NaiveDate) -> bool {
    effectuated_at.is_some() && pending_by_date(date, today)
}
