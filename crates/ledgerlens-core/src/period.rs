use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    Custom,
}

impl PeriodKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
            Self::Custom => "custom",
        }
    }
}

/// An inclusive date range scoping every computation.
///
/// Bounds are whole days; containment compares the date component only,
/// which is equivalent to normalizing the bounds to 00:00:00–23:59:59.999.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub kind: PeriodKind,
    pub label: String,
}

impl TimePeriod {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, kind: PeriodKind) -> CoreResult<Self> {
        if start_date > end_date {
            return Err(CoreError::InvalidPeriod {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            start_date,
            end_date,
            kind,
            label: format!("{start_date} – {end_date}"),
        })
    }

    pub fn custom(start_date: NaiveDate, end_date: NaiveDate) -> CoreResult<Self> {
        Self::new(start_date, end_date, PeriodKind::Custom)
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let start = month_start(date);
        let end = month_end(date);
        Self {
            start_date: start,
            end_date: end,
            kind: PeriodKind::Monthly,
            label: start.format("%B %Y").to_string(),
        }
    }

    /// The calendar month immediately before this period's start.
    pub fn prior_month(&self) -> Self {
        Self::month_of(add_months_clamped(month_start(self.start_date), -1))
    }

    /// The calendar month `count` months before this period's start.
    pub fn months_back(&self, count: i32) -> Self {
        Self::month_of(add_months_clamped(month_start(self.start_date), -count))
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        let date = at.date();
        date >= self.start_date && date <= self.end_date
    }

    /// Inclusive day count: 2024-01-08..2024-01-17 spans 10 days.
    pub fn day_count(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

pub fn month_end(date: NaiveDate) -> NaiveDate {
    let day = days_in_month(date.year(), date.month());
    NaiveDate::from_ymd_opt(date.year(), date.month(), day).unwrap_or(date)
}

pub fn add_months_clamped(date: NaiveDate, months: i32) -> NaiveDate {
    let current_month = i32::try_from(date.month()).unwrap_or(1);
    let mut raw_month = current_month + months;
    let mut year = date.year();

    while raw_month > 12 {
        raw_month -= 12;
        year += 1;
    }
    while raw_month < 1 {
        raw_month += 12;
        year -= 1;
    }

    let month = u32::try_from(raw_month).unwrap_or(1);
    let day = date.day().min(days_in_month(year, month));
    if let Some(result) = NaiveDate::from_ymd_opt(year, month, day) {
        return result;
    }
    date
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 31,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{PeriodKind, TimePeriod, add_months_clamped, month_end, month_start};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
    }

    #[test]
    fn inclusive_day_count_matches_calendar_span() {
        let period = TimePeriod::custom(date(2024, 1, 8), date(2024, 1, 17));
        assert!(period.is_ok());
        if let Ok(value) = period {
            assert_eq!(value.day_count(), 10);
        }
    }

    #[test]
    fn construction_rejects_inverted_ranges() {
        let period = TimePeriod::new(date(2024, 2, 1), date(2024, 1, 1), PeriodKind::Custom);
        assert!(period.is_err());
    }

    #[test]
    fn month_of_covers_whole_calendar_month() {
        let period = TimePeriod::month_of(date(2024, 2, 14));
        assert_eq!(period.start_date, date(2024, 2, 1));
        assert_eq!(period.end_date, date(2024, 2, 29));
        assert_eq!(period.kind, PeriodKind::Monthly);
    }

    #[test]
    fn prior_month_crosses_year_boundaries() {
        let period = TimePeriod::month_of(date(2024, 1, 20)).prior_month();
        assert_eq!(period.start_date, date(2023, 12, 1));
        assert_eq!(period.end_date, date(2023, 12, 31));
    }

    #[test]
    fn month_clamping_handles_end_of_month_transitions() {
        let jan_31 = date(2026, 1, 31);
        let feb = add_months_clamped(jan_31, 1);
        assert_eq!(feb, date(2026, 2, 28));
        let back = add_months_clamped(date(2026, 3, 31), -1);
        assert_eq!(back, date(2026, 2, 28));
    }

    #[test]
    fn month_bounds_helpers_agree() {
        assert_eq!(month_start(date(2024, 6, 17)), date(2024, 6, 1));
        assert_eq!(month_end(date(2024, 6, 17)), date(2024, 6, 30));
    }
}
