//! Recurrence rules for template transactions.
//!
//! A template repeats every `frequency` starting at `start_date`. The dates it
//! expands to are computed here; persisting the instances is done by the
//! engine.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// How far ahead of today instances are materialised, regardless of the
/// template's end date.
pub const LOOKAHEAD_MONTHS: u32 = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Monthly,
    Bimonthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl Frequency {
    pub const ALL: [Frequency; 5] = [
        Self::Monthly,
        Self::Bimonthly,
        Self::Quarterly,
        Self::Semiannual,
        Self::Annual,
    ];

    /// Calendar months between two occurrences.
    #[must_use]
    pub const fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Bimonthly => 2,
            Self::Quarterly => 3,
            Self::Semiannual => 6,
            Self::Annual => 12,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Bimonthly => "bimonthly",
            Self::Quarterly => "quarterly",
            Self::Semiannual => "semiannual",
            Self::Annual => "annual",
        }
    }
}

impl TryFrom<&str> for Frequency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "monthly" => Ok(Self::Monthly),
            "bimonthly" => Ok(Self::Bimonthly),
            "quarterly" => Ok(Self::Quarterly),
            "semiannual" => Ok(Self::Semiannual),
            "annual" => Ok(Self::Annual),
            other => Err(EngineError::invalid(
                "frequency",
                format!("is not included in the list: {other}"),
            )),
        }
    }
}

/// The schedule of a template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl Recurrence {
    /// Builds a recurrence, rejecting an `end_date` that is not strictly
    /// after `start_date`.
    pub fn new(
        frequency: Frequency,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> ResultEngine<Self> {
        if let Some(end) = end_date
            && end <= start_date
        {
            return Err(EngineError::invalid(
                "end_date",
                format!("must be greater than {start_date}"),
            ));
        }
        Ok(Self {
            frequency,
            start_date,
            end_date,
        })
    }

    /// First day past the look-ahead window.
    #[must_use]
    pub fn horizon(today: NaiveDate) -> NaiveDate {
        today
            .checked_add_months(Months::new(LOOKAHEAD_MONTHS))
            .unwrap_or(NaiveDate::MAX)
    }

    /// The `n`-th occurrence (0-based), counted from `start_date`.
    ///
    /// Steps are taken from the start date rather than chained from the
    /// previous occurrence, so a start on the 31st lands on the last day of
    /// shorter months and comes back to the 31st afterwards.
    #[must_use]
    pub fn nth(&self, n: u32) -> Option<NaiveDate> {
        let months = n.checked_mul(self.frequency.months())?;
        self.start_date.checked_add_months(Months::new(months))
    }

    /// Every date an instance must exist on, in increasing order.
    ///
    /// Dates run from `start_date` in `frequency` steps, up to `end_date`
    /// (inclusive) and strictly before [`Recurrence::horizon`].
    #[must_use]
    pub fn occurrences(&self, today: NaiveDate) -> Vec<NaiveDate> {
        let horizon = Self::horizon(today);
        let mut dates = Vec::new();
        let mut n = 0;
        while let Some(date) = self.nth(n) {
            if date >= horizon || self.end_date.is_some_and(|end| date > end) {
                break;
            }
            dates.push(date);
            n += 1;
        }
        dates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monthly_without_end_date_is_capped_at_one_year() {
        let recurrence = Recurrence::new(Frequency::Monthly, date(2025, 1, 1), None).unwrap();
        let dates = recurrence.occurrences(date(2025, 1, 1));

        assert_eq!(dates.len(), 12);
        for (i, d) in dates.iter().enumerate() {
            assert_eq!(*d, date(2025, i as u32 + 1, 1));
        }
    }

    #[test]
    fn end_date_is_inclusive() {
        let recurrence =
            Recurrence::new(Frequency::Monthly, date(2025, 1, 15), Some(date(2025, 4, 15)))
                .unwrap();
        assert_eq!(
            recurrence.occurrences(date(2025, 1, 1)),
            vec![
                date(2025, 1, 15),
                date(2025, 2, 15),
                date(2025, 3, 15),
                date(2025, 4, 15)
            ]
        );
    }

    #[test]
    fn later_end_date_is_still_capped() {
        let recurrence =
            Recurrence::new(Frequency::Quarterly, date(2025, 1, 1), Some(date(2030, 1, 1)))
                .unwrap();
        assert_eq!(
            recurrence.occurrences(date(2025, 1, 1)),
            vec![
                date(2025, 1, 1),
                date(2025, 4, 1),
                date(2025, 7, 1),
                date(2025, 10, 1)
            ]
        );
    }

    #[test]
    fn every_frequency_steps_by_its_months() {
        let today = date(2025, 1, 1);
        let expected = [12, 6, 4, 2, 1];
        for (frequency, count) in Frequency::ALL.into_iter().zip(expected) {
            let recurrence = Recurrence::new(frequency, today, None).unwrap();
            let dates = recurrence.occurrences(today);
            assert_eq!(dates.len(), count, "{}", frequency.as_str());
            assert!(dates.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn month_end_start_clamps_without_drifting() {
        let recurrence = Recurrence::new(Frequency::Monthly, date(2025, 1, 31), None).unwrap();
        let dates = recurrence.occurrences(date(2025, 1, 1));
        assert_eq!(dates[0], date(2025, 1, 31));
        assert_eq!(dates[1], date(2025, 2, 28));
        assert_eq!(dates[2], date(2025, 3, 31));
        assert_eq!(dates[3], date(2025, 4, 30));
    }

    #[test]
    fn start_after_horizon_yields_nothing() {
        let recurrence = Recurrence::new(Frequency::Monthly, date(2027, 1, 1), None).unwrap();
        assert!(recurrence.occurrences(date(2025, 1, 1)).is_empty());
    }

    #[test]
    fn end_date_must_follow_start_date() {
        let err = Recurrence::new(Frequency::Monthly, date(2025, 1, 1), Some(date(2025, 1, 1)))
            .unwrap_err();
        match err {
            EngineError::Validation(errors) => assert!(errors.has("end_date")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_frequency_is_rejected() {
        assert!(Frequency::try_from("weekly").is_err());
        assert_eq!(Frequency::try_from("annual").unwrap(), Frequency::Annual);
    }
}
