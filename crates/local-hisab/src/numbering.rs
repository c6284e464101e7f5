//! Daily transaction numbers (`YYYYMMDD-NNN`)

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::store::{TransactionQuery, TransactionStore};

/// Next number for `date` given the numbers already used that day.
///
/// Only numbers starting with the day's `YYYYMMDD` prefix count. The sequence is
/// the leading digits after the first `-`; numbers without one are ignored.
pub fn next_transaction_no<'a>(existing: impl IntoIterator<Item = &'a str>, date: NaiveDate) -> String {
    let prefix = date.format("%Y%m%d").to_string();

    let highest = existing
        .into_iter()
        .filter(|no| no.starts_with(&prefix))
        .filter_map(sequence_of)
        .max();

    let next = highest.map(|n| n + 1).unwrap_or(1);
    format!("{}-{:03}", prefix, next)
}

/// Ask the store for the day's transactions and compute the next number.
///
/// Callers creating several transactions must await each create before asking
/// for the next number, otherwise two rows can be handed the same sequence.
pub async fn generate_transaction_no<S: TransactionStore>(store: &S, date: NaiveDate) -> Result<String> {
    let page = store
        .list_transactions(&TransactionQuery::on_date(date))
        .await
        .with_context(|| format!("Failed to load transactions for {}", date))?;

    Ok(next_transaction_no(
        page.data.iter().map(|t| t.transaction_no.as_str()),
        date,
    ))
}

/// Leading digits of the part after the first dash ("007abc" -> 7)
fn sequence_of(no: &str) -> Option<u64> {
    let (_, rest) = no.split_once('-')?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;
    use crate::models::{Transaction, TransactionType};
    use crate::store::testing::MemoryStore;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 4).unwrap()
    }

    fn stored(no: &str, date: &str) -> Transaction {
        fixtures::transaction(date, 100.0, None, TransactionType::Credit).with_no(no)
    }

    #[test]
    fn test_first_number_of_day() {
        assert_eq!(next_transaction_no(Vec::<&str>::new(), date()), "20250804-001");
    }

    #[test]
    fn test_increments_highest_sequence() {
        let existing = ["20250804-001", "20250804-007", "20250804-003"];
        assert_eq!(next_transaction_no(existing, date()), "20250804-008");
    }

    #[test]
    fn test_ignores_other_days_and_garbage() {
        let existing = ["20250803-050", "20250804", "20250804-abc", "MANUAL-9", "20250804-002x"];
        assert_eq!(next_transaction_no(existing, date()), "20250804-003");
    }

    #[test]
    fn test_sequence_grows_past_three_digits() {
        assert_eq!(next_transaction_no(["20250804-999"], date()), "20250804-1000");
    }

    #[tokio::test]
    async fn test_generate_uses_same_day_rows_only() {
        let store = MemoryStore::with_transactions(vec![
            stored("20250804-001", "2025-08-04"),
            stored("20250804-002", "2025-08-04"),
            stored("20250803-009", "2025-08-03"),
        ]);

        let no = generate_transaction_no(&store, date()).await.unwrap();
        assert_eq!(no, "20250804-003");
    }
}
