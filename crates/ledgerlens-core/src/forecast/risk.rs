//! Risk readings over balance projections: cash-flow direction, low-balance
//! tiers, overdraft exposure, and credit utilization.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::forecast::projection::{BalanceProjection, ProjectedMonth};
use crate::forecast::trend::{FlowClass, Forecast};
use crate::insight::Severity;
use crate::policy::BalanceRiskPolicy;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CashFlowView {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_cash_flow: f64,
    pub is_positive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceTier {
    Critical,
    Warning,
    Caution,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceRisk {
    pub month_index: u32,
    pub month: NaiveDate,
    pub projected_balance: f64,
    pub tier: BalanceTier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdraftRisk {
    pub month_index: u32,
    pub month: NaiveDate,
    pub projected_balance: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditRisk {
    pub month_index: u32,
    pub month: NaiveDate,
    pub utilization_pct: f64,
    pub tier: BalanceTier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatedProjection {
    pub account_count: usize,
    pub starting_balance: f64,
    pub months: Vec<ProjectedMonth>,
    /// True when any contributing account projection was a fallback.
    pub is_fallback: bool,
}

/// Total flow direction over a set of forecasts.
pub fn cash_flow_view(forecasts: &[Forecast]) -> CashFlowView {
    let mut total_income = 0.0;
    let mut total_expenses = 0.0;
    for forecast in forecasts {
        match forecast.class {
            FlowClass::Income => total_income += forecast.predicted_amount,
            FlowClass::Expenses => total_expenses += forecast.predicted_amount,
        }
    }
    let net_cash_flow = total_income - total_expenses;
    CashFlowView {
        total_income,
        total_expenses,
        net_cash_flow,
        is_positive: net_cash_flow > 0.0,
    }
}

/// Flags projected months whose balance falls through a policy floor. Each
/// month gets at most one tier, the worst that applies.
pub fn low_balance_risks(
    projection: &BalanceProjection,
    policy: BalanceRiskPolicy,
) -> Vec<BalanceRisk> {
    projection
        .months
        .iter()
        .filter_map(|month| {
            let tier = if month.projected_balance <= policy.critical_floor {
                Some(BalanceTier::Critical)
            } else if month.projected_balance <= policy.warning_floor {
                Some(BalanceTier::Warning)
            } else if let Some(caution) = policy.caution_floor
                && month.projected_balance <= caution
            {
                Some(BalanceTier::Caution)
            } else {
                None
            };
            tier.map(|tier| BalanceRisk {
                month_index: month.month_index,
                month: month.month,
                projected_balance: month.projected_balance,
                tier,
            })
        })
        .collect()
}

/// Months projected to go negative. Severity escalates once the overdraft
/// magnitude clears the policy bar.
pub fn overdraft_risks(
    projection: &BalanceProjection,
    policy: BalanceRiskPolicy,
) -> Vec<OverdraftRisk> {
    projection
        .months
        .iter()
        .filter(|month| month.projected_balance < 0.0)
        .map(|month| OverdraftRisk {
            month_index: month.month_index,
            month: month.month,
            projected_balance: month.projected_balance,
            severity: if month.projected_balance.abs() > policy.overdraft_high_magnitude {
                Severity::High
            } else {
                Severity::Low
            },
        })
        .collect()
}

/// Credit utilization per projected month, `|balance| / limit * 100`.
/// A non-positive limit yields no readings at all.
pub fn credit_limit_risks(
    projection: &BalanceProjection,
    credit_limit: f64,
    policy: BalanceRiskPolicy,
) -> Vec<CreditRisk> {
    if credit_limit <= 0.0 {
        return Vec::new();
    }
    projection
        .months
        .iter()
        .filter_map(|month| {
            let utilization_pct = month.projected_balance.abs() / credit_limit * 100.0;
            let tier = if utilization_pct >= policy.credit_critical_pct {
                Some(BalanceTier::Critical)
            } else if utilization_pct >= policy.credit_warning_pct {
                Some(BalanceTier::Warning)
            } else {
                None
            };
            tier.map(|tier| CreditRisk {
                month_index: month.month_index,
                month: month.month,
                utilization_pct,
                tier,
            })
        })
        .collect()
}

/// Sums several account projections into one household view: balances and
/// flows add per month, confidence is the minimum across accounts.
pub fn consolidate_accounts(projections: &[BalanceProjection]) -> ConsolidatedProjection {
    let mut merged: BTreeMap<u32, ProjectedMonth> = BTreeMap::new();
    for projection in projections {
        for month in &projection.months {
            merged
                .entry(month.month_index)
                .and_modify(|entry| {
                    entry.projected_income += month.projected_income;
                    entry.projected_expenses += month.projected_expenses;
                    entry.net_change += month.net_change;
                    entry.projected_balance += month.projected_balance;
                    entry.confidence = entry.confidence.min(month.confidence);
                })
                .or_insert_with(|| month.clone());
        }
    }

    ConsolidatedProjection {
        account_count: projections.len(),
        starting_balance: projections
            .iter()
            .map(|projection| projection.starting_balance)
            .sum(),
        months: merged.into_values().collect(),
        is_fallback: projections.iter().any(|projection| projection.is_fallback),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::forecast::projection::{BalanceProjection, ProjectedMonth};
    use crate::forecast::trend::{FlowClass, Forecast};
    use crate::insight::Severity;
    use crate::policy::BalanceRiskPolicy;

    use super::{
        BalanceTier, cash_flow_view, consolidate_accounts, credit_limit_risks, low_balance_risks,
        overdraft_risks,
    };

    fn month(index: u32, balance: f64, confidence: f64) -> ProjectedMonth {
        ProjectedMonth {
            month_index: index,
            month: NaiveDate::from_ymd_opt(2024, 3 + index, 1).unwrap_or(NaiveDate::MIN),
            projected_income: 0.0,
            projected_expenses: 0.0,
            net_change: 0.0,
            projected_balance: balance,
            confidence,
        }
    }

    fn projection(months: Vec<ProjectedMonth>) -> BalanceProjection {
        BalanceProjection {
            starting_balance: 0.0,
            months,
            is_fallback: false,
        }
    }

    #[test]
    fn cash_flow_nets_income_against_expenses() {
        let at = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap_or(NaiveDate::MIN);
        let forecasts = vec![
            Forecast {
                class: FlowClass::Income,
                month: at,
                predicted_amount: 900.0,
                confidence: 1.0,
            },
            Forecast {
                class: FlowClass::Expenses,
                month: at,
                predicted_amount: 400.0,
                confidence: 1.0,
            },
        ];
        let view = cash_flow_view(&forecasts);
        assert!((view.net_cash_flow - 500.0).abs() < f64::EPSILON);
        assert!(view.is_positive);
    }

    #[test]
    fn each_month_gets_its_worst_tier_only() {
        let projection = projection(vec![
            month(1, 400.0, 1.0),
            month(2, 80.0, 1.0),
            month(3, -20.0, 1.0),
        ]);
        let risks = low_balance_risks(&projection, BalanceRiskPolicy::default());
        assert_eq!(risks.len(), 2);
        assert_eq!(risks[0].tier, BalanceTier::Warning);
        assert_eq!(risks[1].tier, BalanceTier::Critical);
    }

    #[test]
    fn deep_overdrafts_escalate_to_high_severity() {
        let projection = projection(vec![month(1, -100.0, 1.0), month(2, -800.0, 1.0)]);
        let risks = overdraft_risks(&projection, BalanceRiskPolicy::default());
        assert_eq!(risks.len(), 2);
        assert_eq!(risks[0].severity, Severity::Low);
        assert_eq!(risks[1].severity, Severity::High);
    }

    #[test]
    fn credit_readings_require_a_positive_limit() {
        let months = vec![month(1, -950.0, 1.0)];
        let risky = projection(months.clone());
        assert!(credit_limit_risks(&risky, 0.0, BalanceRiskPolicy::default()).is_empty());
        let risks = credit_limit_risks(&risky, 1000.0, BalanceRiskPolicy::default());
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].tier, BalanceTier::Critical);
        assert!((risks[0].utilization_pct - 95.0).abs() < f64::EPSILON);
    }

    #[test]
    fn consolidation_sums_balances_and_takes_minimum_confidence() {
        let first = projection(vec![month(1, 500.0, 0.9)]);
        let second = projection(vec![month(1, 300.0, 0.4)]);
        let merged = consolidate_accounts(&[first, second]);
        assert_eq!(merged.account_count, 2);
        assert_eq!(merged.months.len(), 1);
        assert!((merged.months[0].projected_balance - 800.0).abs() < f64::EPSILON);
        assert!((merged.months[0].confidence - 0.4).abs() < f64::EPSILON);
    }
}
