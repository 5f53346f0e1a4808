use chrono::NaiveDate;
use ledgerlens_core::model::{Transaction, TransactionKind};
use ledgerlens_core::period::TimePeriod;

pub fn transaction(
    id: &str,
    posted_at: &str,
    amount: f64,
    kind: TransactionKind,
    category: &str,
    is_ghost: bool,
) -> Transaction {
    let parsed = chrono::NaiveDateTime::parse_from_str(posted_at, "%Y-%m-%d %H:%M");
    assert!(parsed.is_ok());
    Transaction {
        id: id.to_string(),
        posted_at: parsed.unwrap_or_default(),
        amount,
        kind,
        category: Some(category.to_string()),
        description: format!("{category} purchase"),
        account_id: "acct_main".to_string(),
        is_ghost,
    }
}

/// Ten inclusive days, Monday 2024-01-08 through Wednesday 2024-01-17,
/// covering one weekend (the 13th and 14th).
pub fn fixture_period() -> TimePeriod {
    let start = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap_or(NaiveDate::MIN);
    let end = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap_or(NaiveDate::MIN);
    let period = TimePeriod::custom(start, end);
    assert!(period.is_ok());
    period.unwrap_or_else(|_| TimePeriod::month_of(start))
}

/// Twelve transactions spanning the fixture period: salary, eight expenses
/// (one at 08:30, one at 23:45, weekend dining and entertainment), a
/// refund, a transfer, and one ghost row that every computation must skip.
pub fn fixture_rows() -> Vec<Transaction> {
    vec![
        transaction("txn_01", "2024-01-08 09:00", 2000.0, TransactionKind::Income, "Salary", false),
        transaction("txn_02", "2024-01-08 10:00", -100.0, TransactionKind::Expense, "Rent", false),
        transaction("txn_03", "2024-01-09 18:00", -60.0, TransactionKind::Expense, "Groceries", false),
        transaction("txn_04", "2024-01-10 08:30", -4.5, TransactionKind::Expense, "Coffee", false),
        transaction("txn_05", "2024-01-11 17:30", -45.0, TransactionKind::Expense, "Groceries", false),
        transaction("txn_06", "2024-01-12 23:45", -25.0, TransactionKind::Expense, "Dining", false),
        transaction("txn_07", "2024-01-13 20:00", -120.0, TransactionKind::Expense, "Dining", false),
        transaction("txn_08", "2024-01-14 15:00", -80.0, TransactionKind::Expense, "Entertainment", false),
        transaction("txn_09", "2024-01-15 08:00", -12.0, TransactionKind::Expense, "Transport", false),
        transaction("txn_10", "2024-01-16 12:00", 20.0, TransactionKind::Refund, "Clothing", false),
        transaction("txn_11", "2024-01-16 09:00", -500.0, TransactionKind::Transfer, "Savings", false),
        transaction("txn_12", "2024-01-17 12:00", -999.0, TransactionKind::Expense, "Misc", true),
    ]
}
