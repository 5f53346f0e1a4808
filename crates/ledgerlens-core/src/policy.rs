//! Frozen analytic thresholds, versioned so future tuning stays auditable.
//!
//! Every cutoff the pipeline applies lives here; computation modules take a
//! policy value and never hard-code a number inline.

/// Deterministic anomaly-detection policy identifier.
pub const ANOMALY_POLICY_VERSION: &str = "anomaly/v1";

/// v1 anomaly policy.
///
/// Notes:
/// - The spike threshold is `mean + spike_sigma * population std dev` and a
///   transaction must exceed it strictly to count.
/// - `min_sample_size` gates the whole detector; below it no insight of any
///   kind is emitted for the period.
#[derive(Debug, Clone, Copy)]
pub struct AnomalyPolicy {
    pub min_sample_size: usize,
    pub spike_sigma: f64,
    /// Share of a category's total (percent) its spikes must exceed for the
    /// category insight to escalate to high severity.
    pub category_spike_share_high: f64,
    /// Share of total expense (percent) above which one category counts as
    /// concentrated.
    pub concentration_share: f64,
    pub daily_spike_multiplier: f64,
    /// Absolute floor (currency units) a daily total must also clear.
    pub daily_spike_floor: f64,
}

impl AnomalyPolicy {
    pub fn spike_threshold(self, mean: f64, std_dev: f64) -> f64 {
        mean + self.spike_sigma * std_dev
    }
}

pub const ANOMALY_POLICY_V1: AnomalyPolicy = AnomalyPolicy {
    min_sample_size: 5,
    spike_sigma: 1.5,
    category_spike_share_high: 50.0,
    concentration_share: 40.0,
    daily_spike_multiplier: 2.0,
    daily_spike_floor: 30.0,
};

pub const COMPARISON_POLICY_VERSION: &str = "comparison/v1";

/// v1 period-comparison policy. Percent thresholds throughout.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonPolicy {
    pub significance_high_pct: f64,
    pub significance_medium_pct: f64,
    /// Band inside which an overall metric reads as stable.
    pub stability_band_pct: f64,
    /// Day-of-week distribution shift (percentage points) that counts as
    /// significant.
    pub timing_shift_points: f64,
    /// Gates for the comparison module's own ranked insights.
    pub net_balance_alert_pct: f64,
    pub expense_alert_pct: f64,
    /// Gates the aggregation layer applies on top of a comparison.
    pub aggregate_income_alert_pct: f64,
    pub aggregate_expense_alert_pct: f64,
    pub aggregate_category_alert_pct: f64,
    pub aggregate_category_alert_floor: f64,
}

pub const COMPARISON_POLICY_V1: ComparisonPolicy = ComparisonPolicy {
    significance_high_pct: 25.0,
    significance_medium_pct: 10.0,
    stability_band_pct: 1.0,
    timing_shift_points: 10.0,
    net_balance_alert_pct: 15.0,
    expense_alert_pct: 10.0,
    aggregate_income_alert_pct: 10.0,
    aggregate_expense_alert_pct: 15.0,
    aggregate_category_alert_pct: 25.0,
    aggregate_category_alert_floor: 10.0,
};

pub const PATTERN_POLICY_VERSION: &str = "pattern/v1";

/// v1 spending-pattern policy.
#[derive(Debug, Clone, Copy)]
pub struct PatternPolicy {
    /// Weekend premium (percent over weekday daily average) that triggers a
    /// warning.
    pub weekend_premium_alert_pct: f64,
    /// Weekend daily average within this multiple of the weekday average
    /// reads as balanced.
    pub balanced_weekend_ratio: f64,
    /// Night-bucket total that triggers a warning.
    pub night_spend_alert: f64,
    pub high_frequency_visits_per_week: f64,
    pub high_spend_per_visit: f64,
    /// Prior-period deltas that trigger trend alerts.
    pub frequency_increase_alert: f64,
    pub spend_increase_alert: f64,
}

pub const PATTERN_POLICY_V1: PatternPolicy = PatternPolicy {
    weekend_premium_alert_pct: 50.0,
    balanced_weekend_ratio: 1.2,
    night_spend_alert: 100.0,
    high_frequency_visits_per_week: 5.0,
    high_spend_per_visit: 20.0,
    frequency_increase_alert: 2.0,
    spend_increase_alert: 50.0,
};

pub const RECOMMENDATION_POLICY_VERSION: &str = "recommendation/v1";

/// v1 budget-recommendation policy.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationPolicy {
    /// Dead zone (percent) inside which a benchmark trend reads as stable.
    pub stable_band_pct: f64,
    /// Calendar months of history feeding the recommended limit.
    pub history_months: i32,
    /// Recommended limit = historical average times this headroom.
    pub headroom_ratio: f64,
    /// Confidence = 100 - |deviation ratio| * slope, clamped to [0, 100].
    pub confidence_slope: f64,
    pub high_priority_deviation_pct: f64,
}

pub const RECOMMENDATION_POLICY_V1: RecommendationPolicy = RecommendationPolicy {
    stable_band_pct: 5.0,
    history_months: 3,
    headroom_ratio: 1.10,
    confidence_slope: 50.0,
    high_priority_deviation_pct: 30.0,
};

pub const BUDGET_POLICY_VERSION: &str = "budget/v1";

/// v1 budget-status policy. The warning band is inclusive on both ends:
/// exactly 100% utilization is a warning and not yet exceeded.
#[derive(Debug, Clone, Copy)]
pub struct BudgetPolicy {
    pub warning_floor_pct: f64,
    pub warning_ceiling_pct: f64,
}

pub const BUDGET_POLICY_V1: BudgetPolicy = BudgetPolicy {
    warning_floor_pct: 80.0,
    warning_ceiling_pct: 100.0,
};

pub const BALANCE_RISK_POLICY_VERSION: &str = "balance-risk/v1";

/// v1 balance-risk policy. All floors are overridable by the caller;
/// `Default` supplies the stock tiers.
#[derive(Debug, Clone, Copy)]
pub struct BalanceRiskPolicy {
    pub critical_floor: f64,
    pub warning_floor: f64,
    /// Optional third tier between warning and healthy.
    pub caution_floor: Option<f64>,
    /// Negative balance magnitude above which overdraft risk is high.
    pub overdraft_high_magnitude: f64,
    pub credit_critical_pct: f64,
    pub credit_warning_pct: f64,
}

impl Default for BalanceRiskPolicy {
    fn default() -> Self {
        BALANCE_RISK_POLICY_V1
    }
}

pub const BALANCE_RISK_POLICY_V1: BalanceRiskPolicy = BalanceRiskPolicy {
    critical_floor: 0.0,
    warning_floor: 100.0,
    caution_floor: None,
    overdraft_high_magnitude: 500.0,
    credit_critical_pct: 90.0,
    credit_warning_pct: 70.0,
};

#[cfg(test)]
mod tests {
    use super::{ANOMALY_POLICY_V1, BUDGET_POLICY_V1, COMPARISON_POLICY_V1};

    #[test]
    fn spike_threshold_combines_mean_and_scaled_deviation() {
        let threshold = ANOMALY_POLICY_V1.spike_threshold(10.0, 4.0);
        assert!((threshold - 16.0).abs() < f64::EPSILON);
    }

    #[test]
    fn warning_band_is_inclusive_of_both_bounds() {
        assert!((BUDGET_POLICY_V1.warning_floor_pct - 80.0).abs() < f64::EPSILON);
        assert!((BUDGET_POLICY_V1.warning_ceiling_pct - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn significance_tiers_are_strictly_ordered() {
        assert!(
            COMPARISON_POLICY_V1.significance_high_pct
                > COMPARISON_POLICY_V1.significance_medium_pct
        );
    }
}
