//! Pure transaction filters. Every function excludes ghost transactions,
//! so downstream aggregates can never double-count a moved row.

use crate::model::{Transaction, TransactionKind};
use crate::period::TimePeriod;

/// Composable filter; `None` (or an empty list) is a no-op for that field.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub period: Option<TimePeriod>,
    pub categories: Option<Vec<String>>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub kinds: Option<Vec<TransactionKind>>,
    pub accounts: Option<Vec<String>>,
    pub text: Option<String>,
}

pub fn by_period(transactions: &[Transaction], period: Option<&TimePeriod>) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|transaction| is_visible(transaction))
        .filter(|transaction| match period {
            Some(range) => range.contains(transaction.posted_at),
            None => true,
        })
        .cloned()
        .collect()
}

pub fn by_categories(transactions: &[Transaction], categories: &[String]) -> Vec<Transaction> {
    if categories.is_empty() {
        return by_period(transactions, None);
    }
    transactions
        .iter()
        .filter(|transaction| is_visible(transaction))
        .filter(|transaction| matches_category(transaction, categories))
        .cloned()
        .collect()
}

pub fn by_amount_range(
    transactions: &[Transaction],
    min_amount: Option<f64>,
    max_amount: Option<f64>,
) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|transaction| is_visible(transaction))
        .filter(|transaction| matches_amount(transaction, min_amount, max_amount))
        .cloned()
        .collect()
}

pub fn by_kinds(transactions: &[Transaction], kinds: &[TransactionKind]) -> Vec<Transaction> {
    if kinds.is_empty() {
        return by_period(transactions, None);
    }
    transactions
        .iter()
        .filter(|transaction| is_visible(transaction))
        .filter(|transaction| kinds.contains(&transaction.kind))
        .cloned()
        .collect()
}

pub fn by_accounts(transactions: &[Transaction], accounts: &[String]) -> Vec<Transaction> {
    if accounts.is_empty() {
        return by_period(transactions, None);
    }
    transactions
        .iter()
        .filter(|transaction| is_visible(transaction))
        .filter(|transaction| accounts.iter().any(|account| account == &transaction.account_id))
        .cloned()
        .collect()
}

pub fn by_text(transactions: &[Transaction], needle: &str) -> Vec<Transaction> {
    let trimmed = needle.trim();
    if trimmed.is_empty() {
        return by_period(transactions, None);
    }
    let lowered = trimmed.to_lowercase();
    transactions
        .iter()
        .filter(|transaction| is_visible(transaction))
        .filter(|transaction| matches_text(transaction, &lowered))
        .cloned()
        .collect()
}

/// Applies every populated field of `filter` in one pass.
pub fn apply(transactions: &[Transaction], filter: &TransactionFilter) -> Vec<Transaction> {
    let text = filter
        .text
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase);

    transactions
        .iter()
        .filter(|transaction| is_visible(transaction))
        .filter(|transaction| match filter.period.as_ref() {
            Some(range) => range.contains(transaction.posted_at),
            None => true,
        })
        .filter(|transaction| match filter.categories.as_deref() {
            Some(categories) if !categories.is_empty() => {
                matches_category(transaction, categories)
            }
            _ => true,
        })
        .filter(|transaction| matches_amount(transaction, filter.min_amount, filter.max_amount))
        .filter(|transaction| match filter.kinds.as_deref() {
            Some(kinds) if !kinds.is_empty() => kinds.contains(&transaction.kind),
            _ => true,
        })
        .filter(|transaction| match filter.accounts.as_deref() {
            Some(accounts) if !accounts.is_empty() => {
                accounts.iter().any(|account| account == &transaction.account_id)
            }
            _ => true,
        })
        .filter(|transaction| match text.as_deref() {
            Some(needle) => matches_text(transaction, needle),
            None => true,
        })
        .cloned()
        .collect()
}

fn is_visible(transaction: &Transaction) -> bool {
    !transaction.is_ghost
}

fn matches_category(transaction: &Transaction, categories: &[String]) -> bool {
    categories
        .iter()
        .any(|category| category.eq_ignore_ascii_case(transaction.category_label()))
}

fn matches_amount(transaction: &Transaction, min_amount: Option<f64>, max_amount: Option<f64>) -> bool {
    let magnitude = transaction.magnitude();
    if let Some(min) = min_amount
        && magnitude < min
    {
        return false;
    }
    if let Some(max) = max_amount
        && magnitude > max
    {
        return false;
    }
    true
}

fn matches_text(transaction: &Transaction, lowered_needle: &str) -> bool {
    transaction.description.to_lowercase().contains(lowered_needle)
        || transaction
            .category_label()
            .to_lowercase()
            .contains(lowered_needle)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::model::{Transaction, TransactionKind};
    use crate::period::TimePeriod;

    use super::{TransactionFilter, apply, by_amount_range, by_period, by_text};

    fn row(id: &str, date: &str, amount: f64, category: &str, ghost: bool) -> Transaction {
        let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d");
        assert!(parsed.is_ok());
        Transaction {
            id: id.to_string(),
            posted_at: parsed
                .unwrap_or(NaiveDate::MIN)
                .and_hms_opt(12, 0, 0)
                .unwrap_or_default(),
            amount,
            kind: TransactionKind::Expense,
            category: Some(category.to_string()),
            description: format!("{category} purchase"),
            account_id: "acct_main".to_string(),
            is_ghost: ghost,
        }
    }

    fn period(start: &str, end: &str) -> TimePeriod {
        let parse = |value: &str| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap_or(NaiveDate::MIN)
        };
        let built = TimePeriod::custom(parse(start), parse(end));
        assert!(built.is_ok());
        built.unwrap_or_else(|_| TimePeriod::month_of(NaiveDate::MIN))
    }

    #[test]
    fn ghosts_are_excluded_even_without_a_period() {
        let rows = vec![
            row("txn_1", "2024-01-10", -20.0, "Groceries", false),
            row("txn_2", "2024-01-11", -30.0, "Groceries", true),
        ];
        let kept = by_period(&rows, None);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "txn_1");
    }

    #[test]
    fn period_bounds_are_inclusive_of_both_days() {
        let rows = vec![
            row("txn_1", "2024-01-08", -10.0, "Groceries", false),
            row("txn_2", "2024-01-17", -10.0, "Groceries", false),
            row("txn_3", "2024-01-18", -10.0, "Groceries", false),
        ];
        let kept = by_period(&rows, Some(&period("2024-01-08", "2024-01-17")));
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn amount_range_uses_magnitudes() {
        let rows = vec![
            row("txn_1", "2024-01-10", -15.0, "Groceries", false),
            row("txn_2", "2024-01-10", -45.0, "Groceries", false),
        ];
        let kept = by_amount_range(&rows, Some(20.0), Some(50.0));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "txn_2");
    }

    #[test]
    fn text_search_is_case_insensitive_over_description_and_category() {
        let rows = vec![
            row("txn_1", "2024-01-10", -15.0, "Groceries", false),
            row("txn_2", "2024-01-10", -45.0, "Transport", false),
        ];
        assert_eq!(by_text(&rows, "GROCER").len(), 1);
        assert_eq!(by_text(&rows, "  ").len(), 2);
    }

    #[test]
    fn composed_filter_treats_empty_fields_as_no_ops() {
        let rows = vec![
            row("txn_1", "2024-01-10", -15.0, "Groceries", false),
            row("txn_2", "2024-02-10", -45.0, "Groceries", false),
        ];
        let filter = TransactionFilter {
            period: Some(period("2024-01-01", "2024-01-31")),
            categories: Some(Vec::new()),
            ..TransactionFilter::default()
        };
        let kept = apply(&rows, &filter);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "txn_1");
    }
}
