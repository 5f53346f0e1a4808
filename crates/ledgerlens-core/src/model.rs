use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Label applied wherever a transaction carries no category.
///
/// Normalization happens once, through [`Transaction::category_label`];
/// downstream components never default the field themselves.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Transfer,
    Refund,
    /// Catch-all: unrecognized kinds are treated as expenses at ingestion.
    #[default]
    #[serde(other)]
    Expense,
}

impl TransactionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Transfer => "transfer",
            Self::Refund => "refund",
            Self::Expense => "expense",
        }
    }
}

/// A single ledger row as handed over by the storage layer.
///
/// Timestamps are naive civil time; callers normalize to one zone (UTC
/// recommended) before ingestion so identical inputs always reproduce
/// identical outputs. Amounts may arrive signed; aggregation always works
/// on [`Transaction::magnitude`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub posted_at: NaiveDateTime,
    pub amount: f64,
    #[serde(default)]
    pub kind: TransactionKind,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub account_id: String,
    /// Moved or duplicated elsewhere; excluded from every aggregate.
    #[serde(default)]
    pub is_ghost: bool,
}

impl Transaction {
    pub fn magnitude(&self) -> f64 {
        self.amount.abs()
    }

    pub fn category_label(&self) -> &str {
        match self.category.as_deref() {
            Some(value) if !value.trim().is_empty() => value,
            _ => UNCATEGORIZED,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.posted_at.date()
    }

    pub fn hour(&self) -> u32 {
        self.posted_at.hour()
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }
}

/// A configured spending limit for one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub category: String,
    pub limit: f64,
}
