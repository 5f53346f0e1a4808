//! Spending-pattern analysis: weekday/weekend split, time-of-day buckets,
//! category visit frequency, and combined trend alerts.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::analytics::filter;
use crate::insight::{Insight, InsightKind, Severity, slug};
use crate::model::Transaction;
use crate::period::TimePeriod;
use crate::policy::{PATTERN_POLICY_V1, PatternPolicy};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DayBucketStats {
    pub total: f64,
    pub transaction_count: usize,
    pub unique_days: usize,
    pub daily_average: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekendSplit {
    pub weekday: DayBucketStats,
    pub weekend: DayBucketStats,
    /// Percent by which the weekend daily average exceeds the weekday one;
    /// defined as 0 when the weekday average is 0.
    pub weekend_premium_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    EarlyMorning,
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeBucket {
    pub const ALL: [TimeBucket; 5] = [
        Self::EarlyMorning,
        Self::Morning,
        Self::Afternoon,
        Self::Evening,
        Self::Night,
    ];

    /// Fixed buckets: early morning [5,8), morning [8,12), afternoon
    /// [12,17), evening [17,21), night [21,5) wrapping midnight.
    pub const fn from_hour(hour: u32) -> Self {
        match hour {
            5..=7 => Self::EarlyMorning,
            8..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            _ => Self::Night,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EarlyMorning => "early_morning",
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeOfDaySlot {
    pub bucket: TimeBucket,
    pub total: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeOfDayBreakdown {
    /// One slot per bucket, in fixed bucket order.
    pub slots: Vec<TimeOfDaySlot>,
    /// Bucket with the highest total; earlier fixed-order bucket wins ties.
    pub peak: Option<TimeBucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryFrequency {
    pub category: String,
    pub visit_days: usize,
    pub visits_per_week: f64,
    pub total_spend: f64,
    pub average_per_visit: f64,
    pub most_common_weekday: Option<String>,
    pub most_common_hour: Option<u32>,
    pub high_frequency: bool,
    pub high_spend_per_visit: bool,
}

pub fn weekday_weekend_split(
    transactions: &[Transaction],
    period: Option<&TimePeriod>,
) -> WeekendSplit {
    let expenses = scoped_expenses(transactions, period);

    let mut weekday_total = 0.0;
    let mut weekend_total = 0.0;
    let mut weekday_count = 0usize;
    let mut weekend_count = 0usize;
    let mut weekday_days: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut weekend_days: BTreeSet<NaiveDate> = BTreeSet::new();

    for transaction in &expenses {
        let date = transaction.date();
        if is_weekend(date.weekday()) {
            weekend_total += transaction.magnitude();
            weekend_count += 1;
            weekend_days.insert(date);
        } else {
            weekday_total += transaction.magnitude();
            weekday_count += 1;
            weekday_days.insert(date);
        }
    }

    let weekday = bucket_stats(weekday_total, weekday_count, weekday_days.len());
    let weekend = bucket_stats(weekend_total, weekend_count, weekend_days.len());
    let premium = if weekday.daily_average > 0.0 {
        (weekend.daily_average - weekday.daily_average) / weekday.daily_average * 100.0
    } else {
        0.0
    };

    WeekendSplit {
        weekday,
        weekend,
        weekend_premium_pct: premium,
    }
}

pub fn time_of_day_breakdown(
    transactions: &[Transaction],
    period: Option<&TimePeriod>,
) -> TimeOfDayBreakdown {
    let expenses = scoped_expenses(transactions, period);

    let mut totals: BTreeMap<usize, (f64, usize)> = BTreeMap::new();
    for transaction in &expenses {
        let bucket = TimeBucket::from_hour(transaction.hour());
        let index = TimeBucket::ALL
            .iter()
            .position(|candidate| *candidate == bucket)
            .unwrap_or(0);
        let entry = totals.entry(index).or_insert((0.0, 0));
        entry.0 += transaction.magnitude();
        entry.1 += 1;
    }

    let slots: Vec<TimeOfDaySlot> = TimeBucket::ALL
        .iter()
        .enumerate()
        .map(|(index, bucket)| {
            let (total, count) = totals.get(&index).copied().unwrap_or((0.0, 0));
            TimeOfDaySlot {
                bucket: *bucket,
                total,
                transaction_count: count,
            }
        })
        .collect();

    let mut peak: Option<TimeBucket> = None;
    let mut peak_total = 0.0;
    for slot in &slots {
        if slot.transaction_count > 0 && slot.total > peak_total {
            peak_total = slot.total;
            peak = Some(slot.bucket);
        }
    }

    TimeOfDayBreakdown { slots, peak }
}

/// Visit frequency per category: unique spending days scaled to a weekly
/// rate, with weekday and hour modes for the habitual slot.
pub fn category_frequencies(
    transactions: &[Transaction],
    period: &TimePeriod,
    categories: Option<&[String]>,
) -> Vec<CategoryFrequency> {
    category_frequencies_with_policy(transactions, period, categories, PATTERN_POLICY_V1)
}

fn category_frequencies_with_policy(
    transactions: &[Transaction],
    period: &TimePeriod,
    categories: Option<&[String]>,
    policy: PatternPolicy,
) -> Vec<CategoryFrequency> {
    let expenses = scoped_expenses(transactions, Some(period));
    let period_days = period.day_count();

    let mut names: BTreeSet<String> = BTreeSet::new();
    match categories {
        Some(explicit) if !explicit.is_empty() => {
            names.extend(explicit.iter().cloned());
        }
        _ => {
            names.extend(
                expenses
                    .iter()
                    .map(|transaction| transaction.category_label().to_string()),
            );
        }
    }

    let mut results: Vec<CategoryFrequency> = names
        .into_iter()
        .map(|category| {
            let members: Vec<&Transaction> = expenses
                .iter()
                .filter(|transaction| transaction.category_label() == category)
                .collect();

            let days: BTreeSet<NaiveDate> =
                members.iter().map(|transaction| transaction.date()).collect();
            let total_spend: f64 = members.iter().map(|row| row.magnitude()).sum();
            let visit_days = days.len();
            let visits_per_week = if period_days > 0 {
                (visit_days as f64) / (period_days as f64) * 7.0
            } else {
                0.0
            };
            let average_per_visit = if visit_days > 0 {
                total_spend / (visit_days as f64)
            } else {
                0.0
            };

            let weekday_mode = mode_by_count(
                members
                    .iter()
                    .map(|transaction| weekday_order(transaction.date().weekday())),
            )
            .map(|index| WEEKDAY_NAMES[index].to_string());
            let hour_mode = mode_by_count(members.iter().map(|transaction| transaction.hour()));

            CategoryFrequency {
                category,
                visit_days,
                visits_per_week,
                total_spend,
                average_per_visit,
                most_common_weekday: weekday_mode,
                most_common_hour: hour_mode,
                high_frequency: visits_per_week > policy.high_frequency_visits_per_week,
                high_spend_per_visit: average_per_visit > policy.high_spend_per_visit,
            }
        })
        .collect();

    results.sort_by(|left, right| {
        right
            .visits_per_week
            .total_cmp(&left.visits_per_week)
            .then_with(|| left.category.cmp(&right.category))
    });
    results
}

/// Combines weekend premium, night spending, and prior-period frequency and
/// spend deltas into warning/positive insights.
pub fn trend_alerts(
    transactions: &[Transaction],
    period: &TimePeriod,
    prior: Option<&TimePeriod>,
) -> Vec<Insight> {
    trend_alerts_with_policy(transactions, period, prior, PATTERN_POLICY_V1)
}

fn trend_alerts_with_policy(
    transactions: &[Transaction],
    period: &TimePeriod,
    prior: Option<&TimePeriod>,
    policy: PatternPolicy,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    let split = weekday_weekend_split(transactions, Some(period));
    if split.weekend_premium_pct > policy.weekend_premium_alert_pct {
        insights.push(
            Insight::new(
                "pattern-weekend-premium",
                InsightKind::Warning,
                Severity::Medium,
                format!(
                    "Weekend days average {:.0}% more spending than weekdays",
                    split.weekend_premium_pct
                ),
            )
            .with_metadata(json!({
                "weekend_daily_average": round_to(split.weekend.daily_average, 2),
                "weekday_daily_average": round_to(split.weekday.daily_average, 2),
            })),
        );
    } else if split.weekday.daily_average > 0.0
        && split.weekend.daily_average <= split.weekday.daily_average * policy.balanced_weekend_ratio
    {
        insights.push(Insight::new(
            "pattern-weekend-balanced",
            InsightKind::Positive,
            Severity::Low,
            "Weekend spending stays close to your weekday level",
        ));
    }

    let time_of_day = time_of_day_breakdown(transactions, Some(period));
    let night_total = time_of_day
        .slots
        .iter()
        .find(|slot| slot.bucket == TimeBucket::Night)
        .map(|slot| slot.total)
        .unwrap_or(0.0);
    if night_total > policy.night_spend_alert {
        insights.push(
            Insight::new(
                "pattern-night-spending",
                InsightKind::Warning,
                Severity::Low,
                format!("{night_total:.2} spent between 21:00 and 05:00 this period"),
            )
            .with_metadata(json!({ "night_total": round_to(night_total, 2) })),
        );
    }

    if let Some(previous) = prior {
        let current_frequencies = category_frequencies(transactions, period, None);
        let previous_frequencies = category_frequencies(transactions, previous, None);
        let previous_by_name: BTreeMap<&str, &CategoryFrequency> = previous_frequencies
            .iter()
            .map(|frequency| (frequency.category.as_str(), frequency))
            .collect();

        for frequency in &current_frequencies {
            let Some(before) = previous_by_name.get(frequency.category.as_str()) else {
                continue;
            };

            let visit_delta = frequency.visits_per_week - before.visits_per_week;
            if visit_delta > policy.frequency_increase_alert {
                insights.push(
                    Insight::new(
                        format!("pattern-frequency-{}", slug(&frequency.category)),
                        InsightKind::Warning,
                        Severity::Medium,
                        format!(
                            "{} visits rose to {:.1}/week from {:.1}/week",
                            frequency.category,
                            frequency.visits_per_week,
                            before.visits_per_week
                        ),
                    )
                    .with_metadata(json!({ "visits_per_week_delta": round_to(visit_delta, 2) })),
                );
            }

            let spend_delta = frequency.total_spend - before.total_spend;
            if spend_delta > policy.spend_increase_alert {
                insights.push(
                    Insight::new(
                        format!("pattern-spend-{}", slug(&frequency.category)),
                        InsightKind::Increase,
                        Severity::Medium,
                        format!(
                            "{} spending rose by {:.2} vs the prior period",
                            frequency.category, spend_delta
                        ),
                    )
                    .with_metadata(json!({ "spend_delta": round_to(spend_delta, 2) })),
                );
            }
        }
    }

    insights
}

fn scoped_expenses(transactions: &[Transaction], period: Option<&TimePeriod>) -> Vec<Transaction> {
    filter::by_period(transactions, period)
        .into_iter()
        .filter(Transaction::is_expense)
        .collect()
}

fn bucket_stats(total: f64, count: usize, unique_days: usize) -> DayBucketStats {
    DayBucketStats {
        total,
        transaction_count: count,
        unique_days,
        daily_average: if unique_days > 0 {
            total / (unique_days as f64)
        } else {
            0.0
        },
    }
}

fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

fn weekday_order(weekday: Weekday) -> usize {
    weekday.num_days_from_monday() as usize
}

/// Most frequent key; the smallest key wins ties so output is stable.
fn mode_by_count<K: Ord + Copy>(keys: impl Iterator<Item = K>) -> Option<K> {
    let mut counts: BTreeMap<K, usize> = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|left, right| left.1.cmp(&right.1).then_with(|| right.0.cmp(&left.0)))
        .map(|(key, _)| key)
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let exponent = i32::try_from(decimals).unwrap_or(2);
    let factor = 10_f64.powi(exponent);
    (value * factor).round() / factor
}
