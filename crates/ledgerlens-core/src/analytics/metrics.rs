//! Descriptive metrics over a filtered transaction set: category
//! breakdowns, income/expense summaries, cost-of-living rates, and
//! top-category detail.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analytics::filter;
use crate::model::{Transaction, TransactionKind};
use crate::period::TimePeriod;

/// Fixed-length month used for monthly rate projection from a daily rate.
const RATE_MONTH_DAYS: f64 = 30.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySlice {
    pub category: String,
    pub amount: f64,
    /// Share of total expense; the slices of one breakdown sum to 100
    /// (within rounding) whenever the total is positive.
    pub percentage: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FlowSummary {
    pub total_income: f64,
    /// Expense total after refunds, floored at zero.
    pub total_expenses: f64,
    pub net_balance: f64,
    pub income_count: usize,
    pub expense_count: usize,
    pub refund_count: usize,
    pub average_income: f64,
    pub average_expense: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostOfLiving {
    pub period_days: i64,
    pub daily_spend: f64,
    pub monthly_spend: f64,
    pub daily_income: f64,
    pub monthly_income: f64,
    pub top_category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDetail {
    pub category: String,
    pub amount: f64,
    pub percentage: f64,
    pub transaction_count: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub transactions: Vec<Transaction>,
}

/// Sums expense magnitudes per category, sorted amount-descending with a
/// category-name tie-break so output order is stable.
pub fn category_breakdown(
    transactions: &[Transaction],
    period: Option<&TimePeriod>,
) -> Vec<CategorySlice> {
    let scoped = filter::by_period(transactions, period);
    let mut totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for transaction in scoped.iter().filter(|row| row.is_expense()) {
        let entry = totals
            .entry(transaction.category_label().to_string())
            .or_insert((0.0, 0));
        entry.0 += transaction.magnitude();
        entry.1 += 1;
    }

    let total: f64 = totals.values().map(|(amount, _)| amount).sum();
    let mut slices: Vec<CategorySlice> = totals
        .into_iter()
        .map(|(category, (amount, count))| CategorySlice {
            category,
            amount,
            percentage: if total > 0.0 {
                amount / total * 100.0
            } else {
                0.0
            },
            transaction_count: count,
        })
        .collect();

    slices.sort_by(|left, right| {
        right
            .amount
            .total_cmp(&left.amount)
            .then_with(|| left.category.cmp(&right.category))
    });
    slices
}

/// Sums by transaction kind: income accrues to the income total, expenses
/// to the expense total, refunds subtract from expenses (floored at zero),
/// and transfers are ignored. Unknown kinds became expenses at ingestion.
pub fn income_vs_expenses(
    transactions: &[Transaction],
    period: Option<&TimePeriod>,
) -> FlowSummary {
    let scoped = filter::by_period(transactions, period);

    let mut total_income = 0.0;
    let mut gross_expenses = 0.0;
    let mut refund_total = 0.0;
    let mut income_count = 0usize;
    let mut expense_count = 0usize;
    let mut refund_count = 0usize;

    for transaction in &scoped {
        match transaction.kind {
            TransactionKind::Income => {
                total_income += transaction.magnitude();
                income_count += 1;
            }
            TransactionKind::Expense => {
                gross_expenses += transaction.magnitude();
                expense_count += 1;
            }
            TransactionKind::Refund => {
                refund_total += transaction.magnitude();
                refund_count += 1;
            }
            TransactionKind::Transfer => {}
        }
    }

    let total_expenses = (gross_expenses - refund_total).max(0.0);
    FlowSummary {
        total_income,
        total_expenses,
        net_balance: total_income - total_expenses,
        income_count,
        expense_count,
        refund_count,
        average_income: safe_ratio(total_income, income_count),
        average_expense: safe_ratio(gross_expenses, expense_count),
    }
}

/// Daily and monthly spend/income rates over the period's inclusive day
/// count, plus the largest expense category.
pub fn cost_of_living(transactions: &[Transaction], period: &TimePeriod) -> CostOfLiving {
    let summary = income_vs_expenses(transactions, Some(period));
    let breakdown = category_breakdown(transactions, Some(period));

    let days = period.day_count();
    let daily_spend = per_day(summary.total_expenses, days);
    let daily_income = per_day(summary.total_income, days);

    CostOfLiving {
        period_days: days,
        daily_spend,
        monthly_spend: daily_spend * RATE_MONTH_DAYS,
        daily_income,
        monthly_income: daily_income * RATE_MONTH_DAYS,
        top_category: breakdown.first().map(|slice| slice.category.clone()),
    }
}

/// The top `limit` breakdown entries enriched with per-category transaction
/// statistics and the contributing transactions themselves.
pub fn top_categories(
    transactions: &[Transaction],
    period: Option<&TimePeriod>,
    limit: usize,
) -> Vec<CategoryDetail> {
    let scoped = filter::by_period(transactions, period);
    let breakdown = category_breakdown(transactions, period);

    breakdown
        .into_iter()
        .take(limit)
        .map(|slice| {
            let members: Vec<Transaction> = scoped
                .iter()
                .filter(|row| row.is_expense() && row.category_label() == slice.category)
                .cloned()
                .collect();
            let magnitudes: Vec<f64> = members.iter().map(Transaction::magnitude).collect();
            let min = magnitudes.iter().copied().fold(f64::INFINITY, f64::min);
            let max = magnitudes.iter().copied().fold(0.0, f64::max);
            CategoryDetail {
                average: safe_ratio(slice.amount, members.len()),
                min: if members.is_empty() { 0.0 } else { min },
                max,
                category: slice.category,
                amount: slice.amount,
                percentage: slice.percentage,
                transaction_count: slice.transaction_count,
                transactions: members,
            }
        })
        .collect()
}

fn safe_ratio(total: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    total / (count as f64)
}

fn per_day(total: f64, days: i64) -> f64 {
    if days <= 0 {
        return 0.0;
    }
    total / (days as f64)
}
