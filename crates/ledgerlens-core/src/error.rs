use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("invalid period: start {start} is after end {end}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },

    #[error("budget source unavailable: {0}")]
    BudgetSource(String),

    #[error("forecast input rejected: {0}")]
    Forecast(String),
}

impl CoreError {
    pub fn budget_source(detail: &str) -> Self {
        Self::BudgetSource(detail.to_string())
    }

    pub fn forecast(detail: &str) -> Self {
        Self::Forecast(detail.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
