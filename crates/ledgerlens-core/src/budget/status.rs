//! Budget status evaluation: actual spend joined to configured limits.

use serde::{Deserialize, Serialize};

use crate::analytics::metrics;
use crate::error::CoreResult;
use crate::model::{Budget, Transaction};
use crate::period::TimePeriod;
use crate::policy::{BUDGET_POLICY_V1, BudgetPolicy};

/// Collaborator seam for budget storage. The core never reads budgets
/// itself; callers hand it an implementation of this trait.
pub trait BudgetSource {
    fn get_all(&self) -> CoreResult<Vec<Budget>>;
}

impl BudgetSource for Vec<Budget> {
    fn get_all(&self) -> CoreResult<Vec<Budget>> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub category: String,
    pub limit: f64,
    pub actual: f64,
    /// `max(0, limit - actual)`; never negative even when exceeded.
    pub remaining: f64,
    /// Percent of the limit consumed; 0 when the limit is not positive.
    pub utilization_pct: f64,
    pub transaction_count: usize,
    pub is_exceeded: bool,
    pub is_warning: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BudgetPortfolio {
    pub budget_count: usize,
    pub total_limit: f64,
    pub total_actual: f64,
    pub on_track_count: usize,
    pub warning_count: usize,
    pub exceeded_count: usize,
    /// Sum of `actual - limit` across exceeded budgets.
    pub total_overspend: f64,
    /// Sum of `remaining` across all budgets.
    pub total_available: f64,
}

/// Joins the period's expense breakdown to budget limits, one status per
/// budget in the input order. Categories match case-insensitively.
pub fn evaluate_budgets(
    transactions: &[Transaction],
    period: &TimePeriod,
    budgets: &[Budget],
) -> Vec<BudgetStatus> {
    evaluate_budgets_with_policy(transactions, period, budgets, BUDGET_POLICY_V1)
}

fn evaluate_budgets_with_policy(
    transactions: &[Transaction],
    period: &TimePeriod,
    budgets: &[Budget],
    policy: BudgetPolicy,
) -> Vec<BudgetStatus> {
    let breakdown = metrics::category_breakdown(transactions, Some(period));

    budgets
        .iter()
        .map(|budget| {
            let slice = breakdown
                .iter()
                .find(|slice| slice.category.eq_ignore_ascii_case(&budget.category));
            let actual = slice.map(|slice| slice.amount).unwrap_or(0.0);
            let transaction_count = slice.map(|slice| slice.transaction_count).unwrap_or(0);
            let utilization_pct = if budget.limit > 0.0 {
                actual / budget.limit * 100.0
            } else {
                0.0
            };

            BudgetStatus {
                category: budget.category.clone(),
                limit: budget.limit,
                actual,
                remaining: (budget.limit - actual).max(0.0),
                utilization_pct,
                transaction_count,
                is_exceeded: actual > budget.limit,
                is_warning: utilization_pct >= policy.warning_floor_pct
                    && utilization_pct <= policy.warning_ceiling_pct,
            }
        })
        .collect()
}

pub fn portfolio_summary(statuses: &[BudgetStatus]) -> BudgetPortfolio {
    let mut summary = BudgetPortfolio {
        budget_count: statuses.len(),
        ..BudgetPortfolio::default()
    };

    for status in statuses {
        summary.total_limit += status.limit;
        summary.total_actual += status.actual;
        summary.total_available += status.remaining;
        if status.is_exceeded {
            summary.exceeded_count += 1;
            summary.total_overspend += status.actual - status.limit;
        } else if status.is_warning {
            summary.warning_count += 1;
        } else {
            summary.on_track_count += 1;
        }
    }

    summary
}
