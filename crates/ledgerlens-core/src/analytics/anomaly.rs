//! Statistical anomaly detection over one period's expense set: spending
//! spikes, category concentration, and single-day spending surges.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::json;

use crate::analytics::filter;
use crate::insight::{Insight, InsightKind, Severity, slug};
use crate::model::Transaction;
use crate::period::TimePeriod;
use crate::policy::{ANOMALY_POLICY_V1, AnomalyPolicy};

pub fn detect_anomalies(transactions: &[Transaction], period: Option<&TimePeriod>) -> Vec<Insight> {
    detect_anomalies_with_policy(transactions, period, ANOMALY_POLICY_V1)
}

fn detect_anomalies_with_policy(
    transactions: &[Transaction],
    period: Option<&TimePeriod>,
    policy: AnomalyPolicy,
) -> Vec<Insight> {
    let expenses: Vec<Transaction> = filter::by_period(transactions, period)
        .into_iter()
        .filter(Transaction::is_expense)
        .collect();

    if expenses.len() < policy.min_sample_size {
        return Vec::new();
    }

    let mut insights = Vec::new();
    insights.extend(spike_insights(&expenses, policy));
    insights.extend(concentration_insights(&expenses, policy));
    insights.extend(timing_insights(&expenses, policy));
    insights
}

/// Threshold is `mean + sigma * population std dev`; a transaction on the
/// threshold is not a spike (strict greater-than).
fn spike_insights(expenses: &[Transaction], policy: AnomalyPolicy) -> Vec<Insight> {
    let magnitudes: Vec<f64> = expenses.iter().map(Transaction::magnitude).collect();
    let mean = mean(&magnitudes);
    let threshold = policy.spike_threshold(mean, population_std_dev(&magnitudes, mean));

    let mut by_category: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
    for transaction in expenses {
        if transaction.magnitude() > threshold {
            by_category
                .entry(transaction.category_label())
                .or_default()
                .push(transaction);
        }
    }

    if by_category.is_empty() {
        return Vec::new();
    }

    let mut category_totals: BTreeMap<&str, f64> = BTreeMap::new();
    for transaction in expenses {
        *category_totals
            .entry(transaction.category_label())
            .or_default() += transaction.magnitude();
    }

    let mut insights = Vec::new();
    let spiked_categories = by_category.len();
    let mut total_spiked = 0usize;
    for (category, spikes) in &by_category {
        let spike_total: f64 = spikes.iter().map(|row| row.magnitude()).sum();
        let category_total = category_totals.get(category).copied().unwrap_or(0.0);
        let severity = if category_total > 0.0
            && spike_total / category_total * 100.0 > policy.category_spike_share_high
        {
            Severity::High
        } else {
            Severity::Medium
        };
        total_spiked += spikes.len();

        let ids: Vec<&str> = spikes.iter().map(|row| row.id.as_str()).collect();
        insights.push(
            Insight::new(
                format!("anomaly-spike-{}", slug(category)),
                InsightKind::Anomaly,
                severity,
                format!(
                    "{} unusually large {category} transaction(s) above {:.2}",
                    spikes.len(),
                    threshold
                ),
            )
            .with_metadata(json!({
                "transaction_ids": ids,
                "threshold": round_to(threshold, 2),
                "spike_total": round_to(spike_total, 2),
            })),
        );
    }

    if spiked_categories > 1 {
        insights.push(
            Insight::new(
                "anomaly-spike-multi",
                InsightKind::Anomaly,
                Severity::Medium,
                format!(
                    "Unusually large transactions found across {spiked_categories} categories ({total_spiked} in total)"
                ),
            )
            .with_metadata(json!({
                "category_count": spiked_categories,
                "spike_count": total_spiked,
            })),
        );
    }

    insights
}

fn concentration_insights(expenses: &[Transaction], policy: AnomalyPolicy) -> Vec<Insight> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    let mut grand_total = 0.0;
    for transaction in expenses {
        *totals.entry(transaction.category_label()).or_default() += transaction.magnitude();
        grand_total += transaction.magnitude();
    }
    if grand_total <= 0.0 {
        return Vec::new();
    }

    let mut insights = Vec::new();
    for (category, total) in &totals {
        let share = total / grand_total * 100.0;
        if share > policy.concentration_share {
            insights.push(
                Insight::new(
                    format!("anomaly-concentration-{}", slug(category)),
                    InsightKind::Anomaly,
                    Severity::High,
                    format!(
                        "{category} accounts for {share:.0}% of spending this period"
                    ),
                )
                .with_metadata(json!({
                    "share_pct": round_to(share, 2),
                    "amount": round_to(*total, 2),
                })),
            );
        }
    }
    insights
}

/// Flags the period when its busiest calendar day clears both the relative
/// multiplier and the absolute floor, and counts every day that did.
fn timing_insights(expenses: &[Transaction], policy: AnomalyPolicy) -> Vec<Insight> {
    let mut daily_totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for transaction in expenses {
        *daily_totals.entry(transaction.date()).or_default() += transaction.magnitude();
    }
    if daily_totals.is_empty() {
        return Vec::new();
    }

    let totals: Vec<f64> = daily_totals.values().copied().collect();
    let mean_daily = mean(&totals);
    let threshold = (mean_daily * policy.daily_spike_multiplier).max(policy.daily_spike_floor);

    let peak = totals.iter().copied().fold(0.0, f64::max);
    if peak <= mean_daily * policy.daily_spike_multiplier || peak <= policy.daily_spike_floor {
        return Vec::new();
    }

    let days_over: Vec<String> = daily_totals
        .iter()
        .filter(|(_, total)| **total > threshold)
        .map(|(day, _)| day.format("%Y-%m-%d").to_string())
        .collect();

    vec![
        Insight::new(
            "anomaly-daily-spike",
            InsightKind::Anomaly,
            Severity::Medium,
            format!(
                "{} day(s) with spending above {:.2}, over twice the daily average of {:.2}",
                days_over.len(),
                threshold,
                mean_daily
            ),
        )
        .with_metadata(json!({
            "days": days_over,
            "peak": round_to(peak, 2),
            "daily_average": round_to(mean_daily, 2),
        })),
    ]
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / (values.len() as f64)
}

fn population_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (values.len() as f64);
    variance.sqrt()
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let exponent = i32::try_from(decimals).unwrap_or(2);
    let factor = 10_f64.powi(exponent);
    (value * factor).round() / factor
}
