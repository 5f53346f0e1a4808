//! Historical-trend forecasting: monthly flow predictions from a short
//! lookback window, per flow class and per expense category.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analytics::metrics;
use crate::error::CoreResult;
use crate::model::Transaction;
use crate::period::{TimePeriod, add_months_clamped, month_start};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowClass {
    Income,
    Expenses,
}

/// A single month's prediction for one flow class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    pub class: FlowClass,
    /// First day of the forecast month.
    pub month: NaiveDate,
    pub predicted_amount: f64,
    /// 0.0–1.0; shrinks as the lookback months disagree.
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryForecast {
    pub category: String,
    pub month: NaiveDate,
    pub predicted_amount: f64,
    pub confidence: f64,
}

/// Collaborator seam for forecast models. The built-in model is
/// [`HistoricalTrendModel`]; callers may substitute their own.
pub trait ForecastSource {
    fn generate_forecast(
        &self,
        transactions: &[Transaction],
        horizon_months: u32,
    ) -> CoreResult<Vec<Forecast>>;
}

/// Projects each flow class forward as the mean of its recent monthly
/// totals. The forecast is anchored to the month after the latest
/// transaction, so identical inputs always produce identical outputs.
#[derive(Debug, Clone, Copy)]
pub struct HistoricalTrendModel {
    pub lookback_months: i32,
}

impl Default for HistoricalTrendModel {
    fn default() -> Self {
        Self { lookback_months: 3 }
    }
}

impl ForecastSource for HistoricalTrendModel {
    fn generate_forecast(
        &self,
        transactions: &[Transaction],
        horizon_months: u32,
    ) -> CoreResult<Vec<Forecast>> {
        let Some(anchor) = forecast_anchor(transactions) else {
            return Ok(Vec::new());
        };

        let mut income_totals = Vec::new();
        let mut expense_totals = Vec::new();
        for offset in (1..=self.lookback_months).rev() {
            let month = TimePeriod::month_of(add_months_clamped(anchor, -offset));
            let summary = metrics::income_vs_expenses(transactions, Some(&month));
            income_totals.push(summary.total_income);
            expense_totals.push(summary.total_expenses);
        }

        let mut forecasts = Vec::new();
        for class in [FlowClass::Income, FlowClass::Expenses] {
            let totals = match class {
                FlowClass::Income => &income_totals,
                FlowClass::Expenses => &expense_totals,
            };
            let (predicted, confidence) = predict(totals);
            for step in 0..horizon_months {
                let offset = i32::try_from(step).unwrap_or(0);
                forecasts.push(Forecast {
                    class,
                    month: add_months_clamped(anchor, offset),
                    predicted_amount: predicted,
                    confidence,
                });
            }
        }
        Ok(forecasts)
    }
}

/// Per-expense-category forecasts using the same lookback mechanics as the
/// flow-class model.
pub fn forecast_categories(
    transactions: &[Transaction],
    horizon_months: u32,
) -> Vec<CategoryForecast> {
    forecast_categories_with_lookback(transactions, horizon_months, 3)
}

fn forecast_categories_with_lookback(
    transactions: &[Transaction],
    horizon_months: u32,
    lookback_months: i32,
) -> Vec<CategoryForecast> {
    let Some(anchor) = forecast_anchor(transactions) else {
        return Vec::new();
    };

    // Category -> monthly totals in chronological order, zero-filled so
    // variability reflects silent months too.
    let mut histories: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for offset in (1..=lookback_months).rev() {
        let month = TimePeriod::month_of(add_months_clamped(anchor, -offset));
        let breakdown = metrics::category_breakdown(transactions, Some(&month));
        for slice in &breakdown {
            histories.entry(slice.category.clone()).or_default();
        }
        let index = (lookback_months - offset) as usize;
        for (category, totals) in histories.iter_mut() {
            while totals.len() <= index {
                totals.push(0.0);
            }
            if let Some(slice) = breakdown.iter().find(|slice| &slice.category == category) {
                totals[index] = slice.amount;
            }
        }
    }

    let mut forecasts = Vec::new();
    for (category, mut totals) in histories {
        while totals.len() < lookback_months as usize {
            totals.push(0.0);
        }
        let (predicted, confidence) = predict(&totals);
        if predicted <= 0.0 {
            continue;
        }
        for step in 0..horizon_months {
            let offset = i32::try_from(step).unwrap_or(0);
            forecasts.push(CategoryForecast {
                category: category.clone(),
                month: add_months_clamped(anchor, offset),
                predicted_amount: predicted,
                confidence,
            });
        }
    }
    forecasts
}

/// First day of the month after the latest transaction; `None` when there
/// is no visible history at all.
fn forecast_anchor(transactions: &[Transaction]) -> Option<NaiveDate> {
    transactions
        .iter()
        .filter(|transaction| !transaction.is_ghost)
        .map(|transaction| transaction.date())
        .max()
        .map(|latest| add_months_clamped(month_start(latest), 1))
}

/// Mean of the lookback totals, with confidence falling as the months
/// disagree. A flat history scores 1.0; dispersion at or beyond the mean
/// itself scores 0.0.
fn predict(totals: &[f64]) -> (f64, f64) {
    if totals.is_empty() {
        return (0.0, 0.0);
    }
    let mean = totals.iter().sum::<f64>() / (totals.len() as f64);
    if mean <= 0.0 {
        return (0.0, 0.0);
    }
    let variance =
        totals.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / (totals.len() as f64);
    let relative_spread = variance.sqrt() / mean;
    (mean, (1.0 - relative_spread).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::model::{Transaction, TransactionKind};

    use super::{FlowClass, ForecastSource, HistoricalTrendModel, forecast_categories, predict};

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

    #[test]
    fn empty_history_produces_no_forecast() {
        let model = HistoricalTrendModel::default();
        let forecasts = model.generate_forecast(&[], 3);
        assert!(forecasts.is_ok());
        if let Ok(values) = forecasts {
            assert!(values.is_empty());
        }
    }

    #[test]
    fn flat_history_predicts_the_mean_with_full_confidence() {
        let rows = vec![
            row("txn_1", "2024-01-10", 1000.0, TransactionKind::Income, "Salary"),
            row("txn_2", "2024-02-10", 1000.0, TransactionKind::Income, "Salary"),
            row("txn_3", "2024-03-10", 1000.0, TransactionKind::Income, "Salary"),
        ];
        let model = HistoricalTrendModel::default();
        let forecasts = model.generate_forecast(&rows, 2);
        assert!(forecasts.is_ok());
        if let Ok(values) = forecasts {
            let income: Vec<_> = values
                .iter()
                .filter(|forecast| forecast.class == FlowClass::Income)
                .collect();
            assert_eq!(income.len(), 2);
            assert!((income[0].predicted_amount - 1000.0).abs() < f64::EPSILON);
            assert!((income[0].confidence - 1.0).abs() < f64::EPSILON);
            // Anchored to the month after the latest transaction.
            assert_eq!(
                income[0].month,
                NaiveDate::from_ymd_opt(2024, 4, 1).unwrap_or(NaiveDate::MIN)
            );
            assert_eq!(
                income[1].month,
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap_or(NaiveDate::MIN)
            );
        }
    }

    #[test]
    fn volatile_history_erodes_confidence() {
        // Months of 0, 0, 300: mean 100, heavy spread.
        let (predicted, confidence) = predict(&[0.0, 0.0, 300.0]);
        assert!((predicted - 100.0).abs() < f64::EPSILON);
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn category_forecasts_zero_fill_silent_months() {
        // Groceries in two of three lookback months.
        let rows = vec![
            row("txn_1", "2024-01-10", -90.0, TransactionKind::Expense, "Groceries"),
            row("txn_2", "2024-03-10", -90.0, TransactionKind::Expense, "Groceries"),
        ];
        let forecasts = forecast_categories(&rows, 1);
        assert_eq!(forecasts.len(), 1);
        // Mean over {90, 0, 90} = 60.
        assert!((forecasts[0].predicted_amount - 60.0).abs() < f64::EPSILON);
        assert!(forecasts[0].confidence < 1.0);
    }
}
