mod support;

use ledgerlens_core::analytics::{anomaly, filter, metrics, patterns};
use ledgerlens_core::budget::status;
use ledgerlens_core::aggregate::generate_insights;
use ledgerlens_core::insight::Severity;
use ledgerlens_core::model::Budget;

use support::fixtures::{fixture_period, fixture_rows};

#[test]
fn period_filter_excludes_the_ghost_row() {
    let rows = fixture_rows();
    let period = fixture_period();
    let kept = filter::by_period(&rows, Some(&period));
    assert_eq!(kept.len(), 11);
    assert!(kept.iter().all(|row| row.id != "txn_12"));
    assert_eq!(period.day_count(), 10);
}

#[test]
fn flow_summary_nets_refunds_and_ignores_transfers() {
    let summary = metrics::income_vs_expenses(&fixture_rows(), Some(&fixture_period()));
    assert!((summary.total_income - 2000.0).abs() < 1e-9);
    // Gross expenses 446.50 less the 20.00 refund.
    assert!((summary.total_expenses - 426.5).abs() < 1e-9);
    assert!((summary.net_balance - 1573.5).abs() < 1e-9);
    assert_eq!(summary.income_count, 1);
    assert_eq!(summary.expense_count, 8);
    assert_eq!(summary.refund_count, 1);
}

#[test]
fn breakdown_ranks_dining_first_and_sums_to_one_hundred() {
    let breakdown = metrics::category_breakdown(&fixture_rows(), Some(&fixture_period()));
    assert_eq!(breakdown[0].category, "Dining");
    assert!((breakdown[0].amount - 145.0).abs() < 1e-9);
    let percentage_sum: f64 = breakdown.iter().map(|slice| slice.percentage).sum();
    assert!((percentage_sum - 100.0).abs() < 0.01);
}

#[test]
fn cost_of_living_uses_the_ten_inclusive_days() {
    let rates = metrics::cost_of_living(&fixture_rows(), &fixture_period());
    assert_eq!(rates.period_days, 10);
    assert!((rates.daily_spend - 42.65).abs() < 1e-9);
    assert!((rates.monthly_spend - 1279.5).abs() < 1e-9);
    assert_eq!(rates.top_category.as_deref(), Some("Dining"));
}

#[test]
fn morning_and_night_purchases_land_in_their_buckets() {
    let breakdown = patterns::time_of_day_breakdown(&fixture_rows(), Some(&fixture_period()));
    let total_for = |bucket: patterns::TimeBucket| {
        breakdown
            .slots
            .iter()
            .find(|slot| slot.bucket == bucket)
            .map(|slot| (slot.total, slot.transaction_count))
    };
    // 08:30 coffee plus 10:00 rent plus 08:00 transport.
    assert_eq!(total_for(patterns::TimeBucket::Morning), Some((116.5, 3)));
    // The 23:45 dinner is the only night purchase.
    assert_eq!(total_for(patterns::TimeBucket::Night), Some((25.0, 1)));
    assert_eq!(breakdown.peak, Some(patterns::TimeBucket::Evening));
}

#[test]
fn weekend_days_outspend_weekdays_in_the_fixture() {
    let split = patterns::weekday_weekend_split(&fixture_rows(), Some(&fixture_period()));
    assert_eq!(split.weekend.unique_days, 2);
    assert_eq!(split.weekday.unique_days, 6);
    assert!((split.weekend.daily_average - 100.0).abs() < 1e-9);
    assert!(split.weekend.daily_average > split.weekday.daily_average);
    assert!(split.weekend_premium_pct > 100.0);
}

#[test]
fn the_saturday_dinner_registers_as_a_spike() {
    let insights = anomaly::detect_anomalies(&fixture_rows(), Some(&fixture_period()));
    let spike = insights.iter().find(|insight| insight.id == "anomaly-spike-dining");
    assert!(spike.is_some());
    if let Some(insight) = spike {
        // The 120.00 dinner is 83% of the category total.
        assert_eq!(insight.severity, Severity::High);
    }
}

#[test]
fn budget_join_reports_exceeded_and_warning_tiers() {
    let budgets = vec![
        Budget {
            category: "Groceries".to_string(),
            limit: 100.0,
        },
        Budget {
            category: "Dining".to_string(),
            limit: 150.0,
        },
    ];
    let statuses = status::evaluate_budgets(&fixture_rows(), &fixture_period(), &budgets);
    let find = |name: &str| statuses.iter().find(|entry| entry.category == name);

    let groceries = find("Groceries");
    assert!(groceries.is_some());
    if let Some(entry) = groceries {
        assert!(entry.is_exceeded);
        assert_eq!(entry.remaining, 0.0);
    }

    let dining = find("Dining");
    assert!(dining.is_some());
    if let Some(entry) = dining {
        assert!(entry.is_warning);
        assert!(!entry.is_exceeded);
        assert!((entry.utilization_pct - 96.666_666_666_666_67).abs() < 1e-9);
    }
}

#[test]
fn identical_inputs_reproduce_identical_reports() {
    let rows = fixture_rows();
    let period = fixture_period();
    let first = generate_insights(&rows, &period, None, None);
    let second = generate_insights(&rows, &period, None, None);
    let left = serde_json::to_string(&first);
    let right = serde_json::to_string(&second);
    assert!(left.is_ok());
    assert!(right.is_ok());
    assert_eq!(left.unwrap_or_default(), right.unwrap_or_default());
}

#[test]
fn aggregated_report_is_ranked_by_severity() {
    let budgets = vec![Budget {
        category: "Groceries".to_string(),
        limit: 100.0,
    }];
    let insights = generate_insights(
        &fixture_rows(),
        &fixture_period(),
        None,
        Some(&budgets as _),
    );
    assert!(!insights.is_empty());
    let priorities: Vec<u8> = insights
        .iter()
        .map(|insight| insight.severity.priority())
        .collect();
    assert!(priorities.windows(2).all(|pair| pair[0] >= pair[1]));
    // Both high-severity findings made it in.
    assert!(insights.iter().any(|insight| insight.id == "budget-exceeded-groceries"));
    assert!(insights.iter().any(|insight| insight.id == "anomaly-spike-dining"));
}
