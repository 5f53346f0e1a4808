//! Insight aggregation: one call assembling overview, comparison, pattern,
//! anomaly, and budget insights into a single severity-ranked list.
//!
//! Budget evaluation is the only piece backed by a collaborator, so it is
//! the only piece allowed to fail; failures degrade to a log line and the
//! rest of the report still comes back.

use serde_json::json;

use crate::analytics::{anomaly, compare, metrics, patterns};
use crate::budget::status::{self, BudgetSource};
use crate::insight::{Insight, InsightKind, Severity, slug};
use crate::model::Transaction;
use crate::period::TimePeriod;
use crate::policy::{ANOMALY_POLICY_V1, COMPARISON_POLICY_V1};

/// Ratio of mean to median expense size above which the report calls out a
/// few large purchases inflating the average.
const SIZE_SKEW_RATIO: f64 = 2.0;

pub fn generate_insights(
    transactions: &[Transaction],
    period: &TimePeriod,
    comparison: Option<&TimePeriod>,
    budget_source: Option<&dyn BudgetSource>,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    insights.extend(overview_insights(transactions, period));
    if let Some(baseline) = comparison {
        insights.extend(comparison_insights(transactions, period, baseline));
    }
    insights.extend(pattern_insights(transactions, period));
    insights.extend(anomaly::detect_anomalies(transactions, Some(period)));
    if let Some(source) = budget_source {
        insights.extend(budget_insights(transactions, period, source));
    }

    // Stable sort keeps generation order within a severity tier.
    insights.sort_by(|left, right| {
        right.severity.priority().cmp(&left.severity.priority())
    });
    insights
}

fn overview_insights(transactions: &[Transaction], period: &TimePeriod) -> Vec<Insight> {
    let mut insights = Vec::new();

    let summary = metrics::income_vs_expenses(transactions, Some(period));
    if summary.income_count + summary.expense_count + summary.refund_count > 0 {
        if summary.net_balance >= 0.0 {
            insights.push(Insight::new(
                "overview-net-balance",
                InsightKind::Positive,
                Severity::Low,
                format!("You kept {:.2} more than you spent this period", summary.net_balance),
            ));
        } else {
            insights.push(Insight::new(
                "overview-net-balance",
                InsightKind::Warning,
                Severity::Medium,
                format!(
                    "You spent {:.2} more than you earned this period",
                    summary.net_balance.abs()
                ),
            ));
        }
    }

    let breakdown = metrics::category_breakdown(transactions, Some(period));
    if let Some(top) = breakdown.first() {
        let concentrated = top.percentage > ANOMALY_POLICY_V1.concentration_share;
        let mut insight = Insight::new(
            format!("overview-top-category-{}", slug(&top.category)),
            InsightKind::Pattern,
            if concentrated { Severity::Medium } else { Severity::Low },
            format!(
                "{} is your largest expense category at {:.0}% of spending",
                top.category, top.percentage
            ),
        )
        .with_metadata(json!({
            "amount": top.amount,
            "percentage": top.percentage,
        }));
        if concentrated {
            insight = insight.with_recommendation(format!(
                "Review {} spending; it dominates this period's expenses",
                top.category
            ));
        }
        insights.push(insight);
    }

    insights
}

fn comparison_insights(
    transactions: &[Transaction],
    period: &TimePeriod,
    baseline: &TimePeriod,
) -> Vec<Insight> {
    let policy = COMPARISON_POLICY_V1;
    let result = compare::compare_periods(transactions, period, baseline);
    let mut insights = Vec::new();

    let income = &result.overall.income;
    if income.percent_change.abs() > policy.aggregate_income_alert_pct {
        let rose = income.change > 0.0;
        insights.push(Insight::new(
            "aggregate-income-change",
            if rose { InsightKind::Positive } else { InsightKind::Warning },
            Severity::Medium,
            format!(
                "Income {} {:.0}% vs the comparison period",
                income.trend.as_str(),
                income.percent_change.abs()
            ),
        ));
    }

    let expenses = &result.overall.expenses;
    if expenses.percent_change.abs() > policy.aggregate_expense_alert_pct {
        let rose = expenses.change > 0.0;
        insights.push(Insight::new(
            "aggregate-expense-change",
            if rose { InsightKind::Increase } else { InsightKind::Decrease },
            if rose { Severity::Medium } else { Severity::Low },
            format!(
                "Expenses {} {:.0}% vs the comparison period",
                expenses.trend.as_str(),
                expenses.percent_change.abs()
            ),
        ));
    }

    for change in &result.categories {
        if change.presence != compare::CategoryPresence::Matched {
            continue;
        }
        if change.percent_change.abs() <= policy.aggregate_category_alert_pct
            || change.change.abs() <= policy.aggregate_category_alert_floor
        {
            continue;
        }
        let rose = change.change > 0.0;
        insights.push(
            Insight::new(
                format!("aggregate-category-{}", slug(&change.category)),
                if rose { InsightKind::Increase } else { InsightKind::Decrease },
                if rose { Severity::Medium } else { Severity::Low },
                format!(
                    "{} spending moved {:+.2} ({:.0}%) vs the comparison period",
                    change.category,
                    change.change,
                    change.percent_change.abs()
                ),
            )
            .with_metadata(json!({ "percent_change": change.percent_change })),
        );
    }

    insights
}

fn pattern_insights(transactions: &[Transaction], period: &TimePeriod) -> Vec<Insight> {
    let mut insights = Vec::new();

    let frequencies = patterns::category_frequencies(transactions, period, None);
    for frequency in frequencies.iter().filter(|entry| entry.high_frequency) {
        insights.push(
            Insight::new(
                format!("pattern-habit-{}", slug(&frequency.category)),
                InsightKind::Pattern,
                Severity::Low,
                format!(
                    "You visit {} about {:.1} times a week, averaging {:.2} per visit",
                    frequency.category, frequency.visits_per_week, frequency.average_per_visit
                ),
            )
            .with_metadata(json!({
                "visits_per_week": frequency.visits_per_week,
                "average_per_visit": frequency.average_per_visit,
            })),
        );
    }

    let time_of_day = patterns::time_of_day_breakdown(transactions, Some(period));
    if let Some(peak) = time_of_day.peak {
        insights.push(Insight::new(
            "pattern-peak-time",
            InsightKind::Pattern,
            Severity::Low,
            format!("Most of your spending lands in the {} hours", peak.as_str()),
        ));
    }

    let expense_sizes: Vec<f64> = {
        let mut values: Vec<f64> = crate::analytics::filter::by_period(transactions, Some(period))
            .iter()
            .filter(|row| row.is_expense())
            .map(Transaction::magnitude)
            .collect();
        values.sort_by(f64::total_cmp);
        values
    };
    if expense_sizes.len() >= ANOMALY_POLICY_V1.min_sample_size {
        let mean = expense_sizes.iter().sum::<f64>() / (expense_sizes.len() as f64);
        let median = median(&expense_sizes);
        if median > 0.0 && mean / median > SIZE_SKEW_RATIO {
            insights.push(
                Insight::new(
                    "pattern-size-skew",
                    InsightKind::Pattern,
                    Severity::Low,
                    format!(
                        "A few large purchases pull your average expense to {mean:.2}, \
                         well above the typical {median:.2}"
                    ),
                )
                .with_metadata(json!({ "mean": mean, "median": median })),
            );
        }
    }

    insights.extend(patterns::trend_alerts(transactions, period, None));

    insights
}

/// Budget trouble spots. A failing source or a malformed limit never takes
/// the rest of the report down; it logs and skips.
fn budget_insights(
    transactions: &[Transaction],
    period: &TimePeriod,
    source: &dyn BudgetSource,
) -> Vec<Insight> {
    let budgets = match source.get_all() {
        Ok(budgets) => budgets,
        Err(error) => {
            tracing::warn!(%error, "budget source failed, skipping budget insights");
            return Vec::new();
        }
    };

    let valid: Vec<_> = budgets
        .into_iter()
        .filter(|budget| {
            if budget.limit.is_finite() && budget.limit > 0.0 {
                return true;
            }
            tracing::warn!(
                category = %budget.category,
                limit = budget.limit,
                "skipping budget with malformed limit"
            );
            false
        })
        .collect();

    status::evaluate_budgets(transactions, period, &valid)
        .into_iter()
        .filter_map(|entry| {
            if entry.is_exceeded {
                return Some(
                    Insight::new(
                        format!("budget-exceeded-{}", slug(&entry.category)),
                        InsightKind::Warning,
                        Severity::High,
                        format!(
                            "{} is over budget: {:.2} spent of a {:.2} limit",
                            entry.category, entry.actual, entry.limit
                        ),
                    )
                    .with_recommendation(format!(
                        "Pause {} spending for the rest of the period",
                        entry.category
                    )),
                );
            }
            if entry.is_warning {
                return Some(
                    Insight::new(
                        format!("budget-warning-{}", slug(&entry.category)),
                        InsightKind::Warning,
                        Severity::Medium,
                        format!(
                            "{} is at {:.0}% of its budget with {:.2} remaining",
                            entry.category, entry.utilization_pct, entry.remaining
                        ),
                    )
                    .actionable(),
                );
            }
            None
        })
        .collect()
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

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::budget::status::BudgetSource;
    use crate::error::{CoreError, CoreResult};
    use crate::insight::Severity;
    use crate::model::{Budget, Transaction, TransactionKind};
    use crate::period::TimePeriod;

    use super::generate_insights;

    struct FailingSource;

    impl BudgetSource for FailingSource {
        fn get_all(&self) -> CoreResult<Vec<Budget>> {
            Err(CoreError::budget_source("storage offline"))
        }
    }

    fn row(id: &str, date: &str, amount: f64, kind: TransactionKind, category: &str) -> Transaction {
        let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d");
        assert!(parsed.is_ok());
        Transaction {
            id: id.to_string(),
            posted_at: parsed
                .unwrap_or(NaiveDate::MIN)
                .and_hms_opt(12, 0, 0)
                .unwrap_or_default(),
            amount,
            kind,
            category: Some(category.to_string()),
            description: String::new(),
            account_id: "acct_main".to_string(),
            is_ghost: false,
        }
    }

    fn month(year: i32, month: u32) -> TimePeriod {
        TimePeriod::month_of(NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN))
    }

    fn sample_rows() -> Vec<Transaction> {
        vec![
            row("txn_1", "2024-01-05", 2000.0, TransactionKind::Income, "Salary"),
            row("txn_2", "2024-01-08", -400.0, TransactionKind::Expense, "Rent"),
            row("txn_3", "2024-01-10", -60.0, TransactionKind::Expense, "Groceries"),
            row("txn_4", "2024-01-15", -45.0, TransactionKind::Expense, "Groceries"),
        ]
    }

    #[test]
    fn positive_balance_yields_a_positive_overview_insight() {
        let insights = generate_insights(&sample_rows(), &month(2024, 1), None, None);
        let overview = insights.iter().find(|insight| insight.id == "overview-net-balance");
        assert!(overview.is_some());
        if let Some(insight) = overview {
            assert_eq!(insight.severity, Severity::Low);
        }
    }

    #[test]
    fn exceeded_budget_surfaces_as_high_severity_and_sorts_first() {
        let budgets = vec![Budget {
            category: "Groceries".to_string(),
            limit: 100.0,
        }];
        let insights =
            generate_insights(&sample_rows(), &month(2024, 1), None, Some(&budgets as _));
        assert!(!insights.is_empty());
        assert_eq!(insights[0].id, "budget-exceeded-groceries");
        assert_eq!(insights[0].severity, Severity::High);
        assert!(insights[0].actionable);
    }

    #[test]
    fn failing_budget_source_degrades_to_the_rest_of_the_report() {
        let insights =
            generate_insights(&sample_rows(), &month(2024, 1), None, Some(&FailingSource as _));
        assert!(!insights.is_empty());
        assert!(insights.iter().all(|insight| !insight.id.starts_with("budget-")));
    }

    #[test]
    fn malformed_limits_are_skipped_not_fatal() {
        let budgets = vec![
            Budget {
                category: "Rent".to_string(),
                limit: f64::NAN,
            },
            Budget {
                category: "Groceries".to_string(),
                limit: 100.0,
            },
        ];
        let insights =
            generate_insights(&sample_rows(), &month(2024, 1), None, Some(&budgets as _));
        assert!(insights.iter().any(|insight| insight.id == "budget-exceeded-groceries"));
        assert!(insights.iter().all(|insight| !insight.id.starts_with("budget-") || insight.id.ends_with("groceries")));
    }

    #[test]
    fn comparison_period_adds_income_and_expense_deltas() {
        let mut rows = sample_rows();
        rows.push(row("txn_5", "2023-12-05", 1000.0, TransactionKind::Income, "Salary"));
        rows.push(row("txn_6", "2023-12-08", -400.0, TransactionKind::Expense, "Rent"));
        let insights = generate_insights(&rows, &month(2024, 1), Some(&month(2023, 12)), None);
        assert!(insights.iter().any(|insight| insight.id == "aggregate-income-change"));
    }

    #[test]
    fn severity_ordering_is_monotonic() {
        let budgets = vec![Budget {
            category: "Groceries".to_string(),
            limit: 100.0,
        }];
        let insights =
            generate_insights(&sample_rows(), &month(2024, 1), None, Some(&budgets as _));
        let priorities: Vec<u8> = insights
            .iter()
            .map(|insight| insight.severity.priority())
            .collect();
        let mut sorted = priorities.clone();
        sorted.sort_by(|left, right| right.cmp(left));
        assert_eq!(priorities, sorted);
    }
}
