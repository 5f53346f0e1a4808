//! Month-by-month balance projection driven by flow forecasts.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::forecast::trend::{FlowClass, Forecast};
use crate::period::add_months_clamped;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectedMonth {
    /// 1-based position within the projection horizon.
    pub month_index: u32,
    /// First day of the projected month.
    pub month: NaiveDate,
    pub projected_income: f64,
    pub projected_expenses: f64,
    pub net_change: f64,
    pub projected_balance: f64,
    /// Minimum confidence of the forecasts feeding this month; 0 when no
    /// forecast contributed.
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceProjection {
    pub starting_balance: f64,
    pub months: Vec<ProjectedMonth>,
    /// True when a non-finite input forced the flat fallback series.
    pub is_fallback: bool,
}

/// Projects the balance forward one month at a time:
/// `balance[i] = balance[i-1] + income[i] - expenses[i]`, with months that
/// have no forecast contributing 0. A non-finite balance or forecast amount
/// degrades to a flat series at the current balance rather than an error.
pub fn project_balances(
    current_balance: f64,
    start_month: NaiveDate,
    income: &[Forecast],
    expenses: &[Forecast],
    horizon_months: u32,
) -> BalanceProjection {
    let finite_inputs = current_balance.is_finite()
        && income
            .iter()
            .chain(expenses)
            .all(|forecast| forecast.predicted_amount.is_finite() && forecast.confidence.is_finite());
    if !finite_inputs {
        tracing::warn!(current_balance, "non-finite projection input, using flat fallback");
        return fallback_projection(current_balance, start_month, horizon_months);
    }

    let income_by_month = index_by_month(income, FlowClass::Income);
    let expenses_by_month = index_by_month(expenses, FlowClass::Expenses);

    let mut months = Vec::with_capacity(horizon_months as usize);
    let mut balance = current_balance;
    for step in 0..horizon_months {
        let month = add_months_clamped(start_month, i32::try_from(step).unwrap_or(0));
        let (month_income, income_confidence) =
            income_by_month.get(&month).copied().unwrap_or((0.0, None));
        let (month_expenses, expense_confidence) =
            expenses_by_month.get(&month).copied().unwrap_or((0.0, None));

        let net_change = month_income - month_expenses;
        balance += net_change;

        let confidence = match (income_confidence, expense_confidence) {
            (Some(left), Some(right)) => left.min(right),
            (Some(single), None) | (None, Some(single)) => single,
            (None, None) => 0.0,
        };

        months.push(ProjectedMonth {
            month_index: step + 1,
            month,
            projected_income: month_income,
            projected_expenses: month_expenses,
            net_change,
            projected_balance: balance,
            confidence,
        });
    }

    BalanceProjection {
        starting_balance: current_balance,
        months,
        is_fallback: false,
    }
}

fn fallback_projection(
    current_balance: f64,
    start_month: NaiveDate,
    horizon_months: u32,
) -> BalanceProjection {
    let balance = if current_balance.is_finite() {
        current_balance
    } else {
        0.0
    };
    let months = (0..horizon_months)
        .map(|step| ProjectedMonth {
            month_index: step + 1,
            month: add_months_clamped(start_month, i32::try_from(step).unwrap_or(0)),
            projected_income: 0.0,
            projected_expenses: 0.0,
            net_change: 0.0,
            projected_balance: balance,
            confidence: 0.0,
        })
        .collect();

    BalanceProjection {
        starting_balance: balance,
        months,
        is_fallback: true,
    }
}

/// Sums forecast amounts per month, carrying the minimum confidence when a
/// month has several entries.
fn index_by_month(
    forecasts: &[Forecast],
    class: FlowClass,
) -> BTreeMap<NaiveDate, (f64, Option<f64>)> {
    let mut indexed: BTreeMap<NaiveDate, (f64, Option<f64>)> = BTreeMap::new();
    for forecast in forecasts.iter().filter(|forecast| forecast.class == class) {
        let entry = indexed.entry(forecast.month).or_insert((0.0, None));
        entry.0 += forecast.predicted_amount;
        entry.1 = Some(match entry.1 {
            Some(existing) => existing.min(forecast.confidence),
            None => forecast.confidence,
        });
    }
    indexed
}
