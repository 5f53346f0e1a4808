//! Budget recommendations derived from the caller's own history: benchmark
//! deltas against the prior month, per-category distributions, suggested
//! limits with confidence, and seasonal factors.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::analytics::metrics;
use crate::model::Transaction;
use crate::period::TimePeriod;
use crate::policy::{RECOMMENDATION_POLICY_V1, RecommendationPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkTrend {
    Increasing,
    Decreasing,
    Stable,
    /// No prior-month data for this category.
    New,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryBenchmark {
    pub category: String,
    pub current: f64,
    pub previous: Option<f64>,
    pub change: f64,
    pub percent_change: Option<f64>,
    pub trend: BenchmarkTrend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDistribution {
    pub category: String,
    pub total: f64,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    Normal,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetRecommendation {
    pub category: String,
    pub current_spend: f64,
    pub historical_average: f64,
    /// Months of history that actually had spending for this category.
    pub months_observed: usize,
    pub recommended_limit: f64,
    /// Percent by which current spend deviates from the historical average.
    pub deviation_pct: f64,
    /// 0–100; shrinks as current spend drifts from the average.
    pub confidence: f64,
    pub priority: RecommendationPriority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalAdjustment {
    pub category: String,
    pub month: u32,
    /// Requested month's average over the all-month average; 1.0 when the
    /// month was never observed.
    pub factor: f64,
    /// Factor per observed calendar month (1–12).
    pub factors: BTreeMap<u32, f64>,
}

/// Current-period category totals against the single prior calendar month,
/// sorted by absolute change descending.
pub fn personal_benchmarks(
    transactions: &[Transaction],
    period: &TimePeriod,
) -> Vec<CategoryBenchmark> {
    personal_benchmarks_with_policy(transactions, period, RECOMMENDATION_POLICY_V1)
}

fn personal_benchmarks_with_policy(
    transactions: &[Transaction],
    period: &TimePeriod,
    policy: RecommendationPolicy,
) -> Vec<CategoryBenchmark> {
    let current = category_totals(transactions, period);
    let previous = category_totals(transactions, &period.prior_month());

    let mut benchmarks: Vec<CategoryBenchmark> = current
        .into_iter()
        .map(|(category, amount)| {
            let prior = previous.get(&category).copied();
            match prior {
                Some(baseline) if baseline > 0.0 => {
                    let change = amount - baseline;
                    let percent = change / baseline * 100.0;
                    let trend = if percent.abs() <= policy.stable_band_pct {
                        BenchmarkTrend::Stable
                    } else if percent > 0.0 {
                        BenchmarkTrend::Increasing
                    } else {
                        BenchmarkTrend::Decreasing
                    };
                    CategoryBenchmark {
                        category,
                        current: amount,
                        previous: Some(baseline),
                        change,
                        percent_change: Some(percent),
                        trend,
                    }
                }
                _ => CategoryBenchmark {
                    category,
                    current: amount,
                    previous: None,
                    change: amount,
                    percent_change: None,
                    trend: BenchmarkTrend::New,
                },
            }
        })
        .collect();

    benchmarks.sort_by(|left, right| {
        right
            .change
            .abs()
            .total_cmp(&left.change.abs())
            .then_with(|| left.category.cmp(&right.category))
    });
    benchmarks
}

/// Per-category expense distribution over the period.
pub fn category_distributions(
    transactions: &[Transaction],
    period: &TimePeriod,
) -> Vec<CategoryDistribution> {
    let details = metrics::top_categories(transactions, Some(period), usize::MAX);

    details
        .into_iter()
        .map(|detail| {
            let mut magnitudes: Vec<f64> =
                detail.transactions.iter().map(Transaction::magnitude).collect();
            magnitudes.sort_by(f64::total_cmp);
            CategoryDistribution {
                category: detail.category,
                total: detail.amount,
                mean: detail.average,
                median: median(&magnitudes),
                min: detail.min,
                max: detail.max,
                transaction_count: detail.transaction_count,
            }
        })
        .collect()
}

/// Suggests a limit per currently-active category from up to three prior
/// calendar months of history. Categories with no history are skipped;
/// there is nothing defensible to anchor a limit to.
pub fn recommend_budgets(
    transactions: &[Transaction],
    period: &TimePeriod,
) -> Vec<BudgetRecommendation> {
    recommend_budgets_with_policy(transactions, period, RECOMMENDATION_POLICY_V1)
}

fn recommend_budgets_with_policy(
    transactions: &[Transaction],
    period: &TimePeriod,
    policy: RecommendationPolicy,
) -> Vec<BudgetRecommendation> {
    let current = category_totals(transactions, period);
    let history: Vec<BTreeMap<String, f64>> = (1..=policy.history_months)
        .map(|offset| category_totals(transactions, &period.months_back(offset)))
        .collect();

    let mut recommendations: Vec<BudgetRecommendation> = current
        .into_iter()
        .filter_map(|(category, current_spend)| {
            let observed: Vec<f64> = history
                .iter()
                .filter_map(|month| month.get(&category).copied())
                .filter(|amount| *amount > 0.0)
                .collect();
            if observed.is_empty() {
                return None;
            }

            let historical_average = observed.iter().sum::<f64>() / (observed.len() as f64);
            let deviation_pct =
                (current_spend - historical_average) / historical_average * 100.0;
            let confidence = (100.0
                - (current_spend - historical_average).abs() / historical_average
                    * policy.confidence_slope)
                .clamp(0.0, 100.0);

            Some(BudgetRecommendation {
                category,
                current_spend,
                historical_average,
                months_observed: observed.len(),
                recommended_limit: historical_average * policy.headroom_ratio,
                deviation_pct,
                confidence,
                priority: if deviation_pct.abs() > policy.high_priority_deviation_pct {
                    RecommendationPriority::High
                } else {
                    RecommendationPriority::Normal
                },
            })
        })
        .collect();

    recommendations.sort_by(|left, right| {
        priority_rank(right.priority)
            .cmp(&priority_rank(left.priority))
            .then_with(|| right.deviation_pct.abs().total_cmp(&left.deviation_pct.abs()))
            .then_with(|| left.category.cmp(&right.category))
    });
    recommendations
}

/// Seasonal factor for one category and calendar month, from all of the
/// category's history in `transactions`.
pub fn seasonal_adjustment(
    transactions: &[Transaction],
    category: &str,
    month: u32,
) -> SeasonalAdjustment {
    // Total per (year, month) the category was active in.
    let mut monthly_totals: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for transaction in transactions {
        if transaction.is_ghost
            || !transaction.is_expense()
            || !transaction.category_label().eq_ignore_ascii_case(category)
        {
            continue;
        }
        let date = transaction.date();
        *monthly_totals.entry((date.year(), date.month())).or_default() +=
            transaction.magnitude();
    }

    let mut by_calendar_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for ((_, month_of_year), total) in &monthly_totals {
        by_calendar_month.entry(*month_of_year).or_default().push(*total);
    }

    let overall_average = if monthly_totals.is_empty() {
        0.0
    } else {
        monthly_totals.values().sum::<f64>() / (monthly_totals.len() as f64)
    };

    let factors: BTreeMap<u32, f64> = by_calendar_month
        .into_iter()
        .map(|(month_of_year, totals)| {
            let month_average = totals.iter().sum::<f64>() / (totals.len() as f64);
            let factor = if overall_average > 0.0 {
                month_average / overall_average
            } else {
                1.0
            };
            (month_of_year, factor)
        })
        .collect();

    SeasonalAdjustment {
        category: category.to_string(),
        month,
        factor: factors.get(&month).copied().unwrap_or(1.0),
        factors,
    }
}

fn category_totals(transactions: &[Transaction], period: &TimePeriod) -> BTreeMap<String, f64> {
    metrics::category_breakdown(transactions, Some(period))
        .into_iter()
        .map(|slice| (slice.category, slice.amount))
        .collect()
}

const fn priority_rank(priority: RecommendationPriority) -> u8 {
    match priority {
        RecommendationPriority::Normal => 0,
        RecommendationPriority::High => 1,
    }
}

fn median(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    } else {
        sorted[middle]
    }
}
