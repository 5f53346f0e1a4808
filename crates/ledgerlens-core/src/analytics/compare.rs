//! Period-over-period comparison: overall metric deltas, per-category
//! deltas with significance tiers, and behavioral (frequency, timing,
//! size) changes, each feeding a ranked insight list.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::analytics::{filter, metrics};
use crate::insight::{Insight, InsightKind, Severity, slug};
use crate::model::Transaction;
use crate::period::TimePeriod;
use crate::policy::{COMPARISON_POLICY_V1, ComparisonPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increased,
    Decreased,
    Improved,
    Worsened,
    Stable,
}

impl Trend {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Increased => "increased",
            Self::Decreased => "decreased",
            Self::Improved => "improved",
            Self::Worsened => "worsened",
            Self::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Significance {
    Low,
    Medium,
    High,
}

impl Significance {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricChange {
    pub metric: String,
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    pub percent_change: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryPresence {
    Matched,
    New,
    Disappeared,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryChange {
    pub category: String,
    pub current_amount: f64,
    pub previous_amount: f64,
    pub change: f64,
    pub percent_change: f64,
    /// Delta of the category's share of total expense, in percentage points.
    pub share_point_change: f64,
    pub significance: Significance,
    pub presence: CategoryPresence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateChange {
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    pub significance: Significance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingShift {
    pub weekday: String,
    pub current_share: f64,
    pub previous_share: f64,
    pub shift_points: f64,
    pub significant: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorComparison {
    /// Transactions per day.
    pub frequency: RateChange,
    pub timing: Vec<TimingShift>,
    pub mean_size: RateChange,
    pub median_size: RateChange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallComparison {
    pub income: MetricChange,
    pub expenses: MetricChange,
    pub net_balance: MetricChange,
    pub transaction_count: MetricChange,
    pub average_transaction: MetricChange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub current_period: TimePeriod,
    pub comparison_period: TimePeriod,
    pub overall: OverallComparison,
    pub categories: Vec<CategoryChange>,
    pub behavior: BehaviorComparison,
    pub insights: Vec<Insight>,
}

pub fn compare_periods(
    transactions: &[Transaction],
    current: &TimePeriod,
    comparison: &TimePeriod,
) -> PeriodComparison {
    compare_periods_with_policy(transactions, current, comparison, COMPARISON_POLICY_V1)
}

fn compare_periods_with_policy(
    transactions: &[Transaction],
    current: &TimePeriod,
    comparison: &TimePeriod,
    policy: ComparisonPolicy,
) -> PeriodComparison {
    let overall = overall_comparison(transactions, current, comparison, policy);
    let categories = category_comparison(transactions, current, comparison, policy);
    let behavior = behavior_comparison(transactions, current, comparison, policy);
    let insights = ranked_insights(&overall, &categories, policy);

    PeriodComparison {
        current_period: current.clone(),
        comparison_period: comparison.clone(),
        overall,
        categories,
        behavior,
        insights,
    }
}

fn overall_comparison(
    transactions: &[Transaction],
    current: &TimePeriod,
    comparison: &TimePeriod,
    policy: ComparisonPolicy,
) -> OverallComparison {
    let now = metrics::income_vs_expenses(transactions, Some(current));
    let then = metrics::income_vs_expenses(transactions, Some(comparison));

    let current_rows = filter::by_period(transactions, Some(current));
    let previous_rows = filter::by_period(transactions, Some(comparison));
    let current_count = current_rows.len() as f64;
    let previous_count = previous_rows.len() as f64;
    let current_average = mean_magnitude(&current_rows);
    let previous_average = mean_magnitude(&previous_rows);

    OverallComparison {
        income: directional_change("income", now.total_income, then.total_income, policy),
        expenses: directional_change("expenses", now.total_expenses, then.total_expenses, policy),
        net_balance: balance_change(now.net_balance, then.net_balance, policy),
        transaction_count: directional_change(
            "transaction_count",
            current_count,
            previous_count,
            policy,
        ),
        average_transaction: directional_change(
            "average_transaction",
            current_average,
            previous_average,
            policy,
        ),
    }
}

fn category_comparison(
    transactions: &[Transaction],
    current: &TimePeriod,
    comparison: &TimePeriod,
    policy: ComparisonPolicy,
) -> Vec<CategoryChange> {
    let now: BTreeMap<String, (f64, f64)> = metrics::category_breakdown(transactions, Some(current))
        .into_iter()
        .map(|slice| (slice.category, (slice.amount, slice.percentage)))
        .collect();
    let then: BTreeMap<String, (f64, f64)> =
        metrics::category_breakdown(transactions, Some(comparison))
            .into_iter()
            .map(|slice| (slice.category, (slice.amount, slice.percentage)))
            .collect();

    let mut names: BTreeSet<&String> = BTreeSet::new();
    names.extend(now.keys());
    names.extend(then.keys());

    let mut changes: Vec<CategoryChange> = names
        .into_iter()
        .map(|category| {
            let (current_amount, current_share) = now.get(category).copied().unwrap_or((0.0, 0.0));
            let (previous_amount, previous_share) =
                then.get(category).copied().unwrap_or((0.0, 0.0));
            let presence = match (now.contains_key(category), then.contains_key(category)) {
                (true, false) => CategoryPresence::New,
                (false, true) => CategoryPresence::Disappeared,
                _ => CategoryPresence::Matched,
            };
            let percent_change = percent_change(current_amount, previous_amount);
            CategoryChange {
                category: category.clone(),
                current_amount,
                previous_amount,
                change: current_amount - previous_amount,
                percent_change,
                share_point_change: current_share - previous_share,
                significance: significance_for(percent_change.abs(), policy),
                presence,
            }
        })
        .collect();

    changes.sort_by(compare_category_changes);
    changes
}

fn behavior_comparison(
    transactions: &[Transaction],
    current: &TimePeriod,
    comparison: &TimePeriod,
    policy: ComparisonPolicy,
) -> BehaviorComparison {
    let current_rows = filter::by_period(transactions, Some(current));
    let previous_rows = filter::by_period(transactions, Some(comparison));

    let current_frequency = per_day(current_rows.len(), current.day_count());
    let previous_frequency = per_day(previous_rows.len(), comparison.day_count());
    let frequency = RateChange {
        current: current_frequency,
        previous: previous_frequency,
        change: current_frequency - previous_frequency,
        significance: significance_for(
            percent_change(current_frequency, previous_frequency).abs(),
            policy,
        ),
    };

    let current_shares = weekday_shares(&current_rows);
    let previous_shares = weekday_shares(&previous_rows);
    let timing = WEEKDAYS
        .iter()
        .map(|weekday| {
            let current_share = current_shares.get(weekday).copied().unwrap_or(0.0);
            let previous_share = previous_shares.get(weekday).copied().unwrap_or(0.0);
            let shift = current_share - previous_share;
            TimingShift {
                weekday: weekday_name(*weekday).to_string(),
                current_share,
                previous_share,
                shift_points: shift,
                significant: shift.abs() > policy.timing_shift_points,
            }
        })
        .collect();

    let current_expense_sizes = expense_magnitudes(&current_rows);
    let previous_expense_sizes = expense_magnitudes(&previous_rows);
    let mean_size = size_change(
        mean(&current_expense_sizes),
        mean(&previous_expense_sizes),
        policy,
    );
    let median_size = size_change(
        median(&current_expense_sizes),
        median(&previous_expense_sizes),
        policy,
    );

    BehaviorComparison {
        frequency,
        timing,
        mean_size,
        median_size,
    }
}

/// Category changes sorted significance-first then by magnitude; overall
/// balance and expense changes appended when they cross the policy gates.
fn ranked_insights(
    overall: &OverallComparison,
    categories: &[CategoryChange],
    policy: ComparisonPolicy,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    for change in categories {
        if change.presence != CategoryPresence::Matched {
            continue;
        }
        if change.significance == Significance::Low {
            continue;
        }
        let kind = if change.change > 0.0 {
            InsightKind::Increase
        } else {
            InsightKind::Decrease
        };
        let severity = match change.significance {
            Significance::High => Severity::Medium,
            _ => Severity::Low,
        };
        let direction = if change.change > 0.0 { "up" } else { "down" };
        insights.push(
            Insight::new(
                format!("comparison-category-{}", slug(&change.category)),
                kind,
                severity,
                format!(
                    "{} spending {direction} {:.0}% ({:+.2}) vs the comparison period",
                    change.category,
                    change.percent_change.abs(),
                    change.change
                ),
            )
            .with_metadata(json!({
                "significance": change.significance.as_str(),
                "percent_change": round_to(change.percent_change, 2),
            })),
        );
    }

    if overall.net_balance.percent_change.abs() > policy.net_balance_alert_pct {
        let improved = overall.net_balance.trend == Trend::Improved;
        insights.push(Insight::new(
            "comparison-net-balance",
            if improved {
                InsightKind::Positive
            } else {
                InsightKind::Warning
            },
            Severity::Medium,
            format!(
                "Net balance {} by {:.0}% vs the comparison period",
                overall.net_balance.trend.as_str(),
                overall.net_balance.percent_change.abs()
            ),
        ));
    }

    if overall.expenses.percent_change.abs() > policy.expense_alert_pct {
        let rose = overall.expenses.change > 0.0;
        insights.push(Insight::new(
            "comparison-expenses",
            if rose {
                InsightKind::Increase
            } else {
                InsightKind::Decrease
            },
            Severity::Medium,
            format!(
                "Total expenses {} by {:.0}% vs the comparison period",
                overall.expenses.trend.as_str(),
                overall.expenses.percent_change.abs()
            ),
        ));
    }

    insights
}

fn compare_category_changes(left: &CategoryChange, right: &CategoryChange) -> Ordering {
    right
        .significance
        .cmp(&left.significance)
        .then_with(|| right.change.abs().total_cmp(&left.change.abs()))
        .then_with(|| left.category.cmp(&right.category))
}

fn directional_change(
    metric: &str,
    current: f64,
    previous: f64,
    policy: ComparisonPolicy,
) -> MetricChange {
    let percent = percent_change(current, previous);
    let trend = if percent.abs() < policy.stability_band_pct {
        Trend::Stable
    } else if current > previous {
        Trend::Increased
    } else {
        Trend::Decreased
    };
    MetricChange {
        metric: metric.to_string(),
        current,
        previous,
        change: current - previous,
        percent_change: percent,
        trend,
    }
}

fn balance_change(current: f64, previous: f64, policy: ComparisonPolicy) -> MetricChange {
    let percent = percent_change(current, previous);
    let trend = if percent.abs() < policy.stability_band_pct {
        Trend::Stable
    } else if current > previous {
        Trend::Improved
    } else {
        Trend::Worsened
    };
    MetricChange {
        metric: "net_balance".to_string(),
        current,
        previous,
        change: current - previous,
        percent_change: percent,
        trend,
    }
}

fn size_change(current: f64, previous: f64, policy: ComparisonPolicy) -> RateChange {
    RateChange {
        current,
        previous,
        change: current - previous,
        significance: significance_for(percent_change(current, previous).abs(), policy),
    }
}

fn significance_for(percent_magnitude: f64, policy: ComparisonPolicy) -> Significance {
    if percent_magnitude > policy.significance_high_pct {
        return Significance::High;
    }
    if percent_magnitude > policy.significance_medium_pct {
        return Significance::Medium;
    }
    Significance::Low
}

/// A zero baseline with a nonzero current value reads as a 100% change.
fn percent_change(current: f64, previous: f64) -> f64 {
    if previous.abs() < f64::EPSILON {
        if current.abs() < f64::EPSILON {
            return 0.0;
        }
        return if current > 0.0 { 100.0 } else { -100.0 };
    }
    (current - previous) / previous.abs() * 100.0
}

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn weekday_shares(rows: &[Transaction]) -> HashMap<Weekday, f64> {
    let expenses: Vec<&Transaction> = rows.iter().filter(|row| row.is_expense()).collect();
    let mut counts: HashMap<Weekday, usize> = HashMap::new();
    for transaction in &expenses {
        *counts.entry(transaction.date().weekday()).or_default() += 1;
    }
    let total = expenses.len();
    counts
        .into_iter()
        .map(|(weekday, count)| {
            let share = if total == 0 {
                0.0
            } else {
                (count as f64) / (total as f64) * 100.0
            };
            (weekday, share)
        })
        .collect()
}

fn expense_magnitudes(rows: &[Transaction]) -> Vec<f64> {
    let mut values: Vec<f64> = rows
        .iter()
        .filter(|row| row.is_expense())
        .map(Transaction::magnitude)
        .collect();
    values.sort_by(|left, right| left.total_cmp(right));
    values
}

fn mean_magnitude(rows: &[Transaction]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(Transaction::magnitude).sum::<f64>() / (rows.len() as f64)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / (values.len() as f64)
}

fn median(sorted_values: &[f64]) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    let middle = sorted_values.len() / 2;
    if sorted_values.len() % 2 == 0 {
        return (sorted_values[middle - 1] + sorted_values[middle]) / 2.0;
    }
    sorted_values[middle]
}

fn per_day(count: usize, days: i64) -> f64 {
    if days <= 0 {
        return 0.0;
    }
    (count as f64) / (days as f64)
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let exponent = i32::try_from(decimals).unwrap_or(2);
    let factor = 10_f64.powi(exponent);
    (value * factor).round() / factor
}
