//! CSV export and console summaries

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use csv::{QuoteStyle, Writer, WriterBuilder};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::aggregation::ReportData;
use crate::constants;
use crate::format::{format_date, format_inr};
use crate::models::Transaction;

/// Transaction as written to CSV. Column names match the import headers so an
/// exported file can be imported again.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionCsvRow {
    #[serde(rename = "Transaction No")]
    pub transaction_no: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "Commission")]
    pub commission: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Account Name")]
    pub account_name: String,
    #[serde(rename = "Location Name")]
    pub location_name: String,
    #[serde(rename = "Description")]
    pub description: String,
}

impl From<&Transaction> for TransactionCsvRow {
    fn from(t: &Transaction) -> Self {
        Self {
            transaction_no: t.transaction_no.clone(),
            date: t.date.format("%Y-%m-%d").to_string(),
            amount: t.amount.to_string(),
            commission: t.commission_or_zero().to_string(),
            kind: t.kind.to_string(),
            account_name: t.account_name().to_string(),
            location_name: t.location_name().to_string(),
            description: t.description.clone().unwrap_or_default(),
        }
    }
}

/// Serialize rows to CSV text. The header comes from the row type's field
/// names. Returns `None` when there are no rows.
pub fn to_csv_string<T: Serialize>(rows: &[T]) -> Result<Option<String>> {
    if rows.is_empty() {
        return Ok(None);
    }

    let mut wtr = Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row).context("Failed to serialize CSV row")?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV output: {}", e.error()))?;

    Ok(Some(String::from_utf8(bytes).context("CSV output is not UTF-8")?))
}

/// Write `<report_name>-<yyyy-MM-dd>.csv` into `output_dir`.
///
/// Nothing is written for an empty list; the caller gets `None` back.
pub fn export_csv<T: Serialize>(
    rows: &[T],
    output_dir: &Path,
    report_name: &str,
    today: NaiveDate,
) -> Result<Option<PathBuf>> {
    let Some(text) = to_csv_string(rows)? else {
        log::info!("Nothing to export for {}", report_name);
        return Ok(None);
    };

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    let path = output_dir.join(format!("{}-{}.csv", report_name, today.format("%Y-%m-%d")));
    std::fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    log::debug!("Exported {} rows to {}", rows.len(), path.display());

    Ok(Some(path))
}

/// Export a transaction list in the importable layout
pub fn export_transactions(
    transactions: &[Transaction],
    output_dir: &Path,
    today: NaiveDate,
) -> Result<Option<PathBuf>> {
    let rows: Vec<TransactionCsvRow> = transactions.iter().map(TransactionCsvRow::from).collect();
    export_csv(&rows, output_dir, "transactions", today)
}

/// Export the four summary tables. Empty tables are skipped.
pub fn export_report(data: &ReportData, output_dir: &Path, today: NaiveDate) -> Result<Vec<PathBuf>> {
    let written = [
        export_csv(&data.daily, output_dir, "daily-summary", today)?,
        export_csv(&data.accounts, output_dir, "account-summary", today)?,
        export_csv(&data.locations, output_dir, "location-summary", today)?,
        export_csv(&data.commissions, output_dir, "commission-summary", today)?,
    ];

    Ok(written.into_iter().flatten().collect())
}

// =============================================================================
// Sample Import File
// =============================================================================

fn sample_rows() -> Vec<TransactionCsvRow> {
    let row = |no: &str, date: &str, amount: &str, commission: &str, kind: &str, account: &str, location: &str, description: &str| {
        TransactionCsvRow {
            transaction_no: no.to_string(),
            date: date.to_string(),
            amount: amount.to_string(),
            commission: commission.to_string(),
            kind: kind.to_string(),
            account_name: account.to_string(),
            location_name: location.to_string(),
            description: description.to_string(),
        }
    };

    vec![
        row("20250804-001", "2025-08-04", "5000", "50", "credit", "Amit Patel", "Mumbai Branch", "Payment received from client"),
        row("20250804-002", "2025-08-04", "1500", "0", "debit", "Neha Joshi", "Delhi Branch", "Office supplies purchase"),
        row("20250803-001", "2025-08-03", "25000", "250.50", "credit", "Rajesh Kumar", "Bangalore Branch", "Monthly rent payment"),
    ]
}

/// Sample import file: bare header, every data value double-quoted
pub fn sample_csv() -> Result<String> {
    let mut header = Writer::from_writer(Vec::new());
    header.write_record([
        "Transaction No",
        "Date",
        "Amount",
        "Commission",
        "Type",
        "Account Name",
        "Location Name",
        "Description",
    ])?;
    let buf = header
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV header: {}", e.error()))?;

    let mut body = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .from_writer(buf);
    for row in sample_rows() {
        body.serialize(row)?;
    }
    let bytes = body
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV rows: {}", e.error()))?;

    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

/// Write the sample import file into `output_dir`
pub fn write_sample(output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    let path = output_dir.join(constants::SAMPLE_CSV_FILENAME);
    std::fs::write(&path, sample_csv()?).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

// =============================================================================
// Console Summary
// =============================================================================

/// Normalize -0.0 to 0.0 for cleaner display
fn normalize_zero(val: f64) -> f64 {
    if val == 0.0 { 0.0 } else { val }
}

/// Print the report to the console
pub fn print_summary(data: &ReportData, business_name: &str) {
    let totals = &data.totals;

    println!("\n============================================================");
    println!("                {} REPORT", business_name.to_uppercase());
    println!("============================================================\n");

    println!("TOTALS:");
    println!("  Credits:            {:>20}", format_inr(totals.total_credits));
    println!("  Debits:             {:>20}", format_inr(totals.total_debits));
    println!("  ─────────────────────────────────────────────");
    println!("  Net Balance:        {:>20}", format_inr(normalize_zero(totals.net_balance)));
    println!("  Commissions:        {:>20}", format_inr(totals.total_commissions));
    println!("  Transactions:       {:>20}", totals.total_transactions);

    if !data.daily.is_empty() {
        println!("\nDAILY:");
        for day in &data.daily {
            println!(
                "  {}  in {:>16}  out {:>16}  net {:>16}  ({} txns)",
                format_date(day.date),
                format_inr(day.credits),
                format_inr(day.debits),
                format_inr(normalize_zero(day.net)),
                day.count
            );
        }
    }

    if !data.accounts.is_empty() {
        println!("\nBY ACCOUNT:");
        for account in &data.accounts {
            println!(
                "  {:<24} net {:>16}  ({} txns)",
                account.account_name,
                format_inr(normalize_zero(account.net)),
                account.count
            );
        }
    }

    if !data.locations.is_empty() {
        println!("\nBY LOCATION:");
        for location in &data.locations {
            println!(
                "  {:<24} net {:>16}  ({} txns)",
                location.location_name,
                format_inr(normalize_zero(location.net)),
                location.count
            );
        }
    }

    if !data.commissions.is_empty() {
        println!("\nCOMMISSIONS:");
        for entry in &data.commissions {
            println!(
                "  {:<24} {:>16}  avg {:>12}  ({} txns)",
                entry.account_name,
                format_inr(entry.total_commission),
                format_inr(entry.avg_commission),
                entry.transaction_count
            );
        }
    }

    println!("============================================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{build_report, daily_summary};
    use crate::models::TransactionType::{Credit, Debit};
    use crate::models::fixtures::transaction;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 8).unwrap()
    }

    #[test]
    fn test_empty_rows_produce_nothing() {
        let rows: Vec<TransactionCsvRow> = Vec::new();
        assert!(to_csv_string(&rows).unwrap().is_none());

        let dir = tempfile::tempdir().unwrap();
        assert!(export_csv(&rows, dir.path(), "transactions", today()).unwrap().is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_header_follows_field_order() {
        let daily = daily_summary(&[transaction("2025-01-08", 1000.0, Some(50.0), Credit)]);
        let text = to_csv_string(&daily).unwrap().unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("date,credits,debits,net,count,commission"));
        assert!(lines.next().unwrap().starts_with("2025-01-08,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_transaction_rows_use_import_headers() {
        let t = transaction("2025-01-08", 1500.5, None, Debit).with_no("20250108-001");
        let text = to_csv_string(&[TransactionCsvRow::from(&t)]).unwrap().unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Transaction No,Date,Amount,Commission,Type,Account Name,Location Name,Description"
        );
        assert_eq!(lines[1], "20250108-001,2025-01-08,1500.5,0,debit,Amit Patel,Mumbai Branch,");
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let mut t = transaction("2025-01-08", 10.0, Some(1.0), Credit);
        t.description = Some("rent, january".to_string());
        let text = to_csv_string(&[TransactionCsvRow::from(&t)]).unwrap().unwrap();
        assert!(text.lines().nth(1).unwrap().ends_with(",\"rent, january\""));
    }

    #[test]
    fn test_export_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let list = vec![transaction("2025-01-08", 10.0, None, Credit)];
        let path = export_transactions(&list, dir.path(), today()).unwrap().unwrap();
        assert_eq!(path.file_name().unwrap(), "transactions-2025-01-08.csv");
        assert!(std::fs::read_to_string(path).unwrap().starts_with("Transaction No,"));
    }

    #[test]
    fn test_export_report_skips_empty_tables() {
        let dir = tempfile::tempdir().unwrap();
        // no commission anywhere, so the commission table is empty
        let report = build_report(&[transaction("2025-01-08", 10.0, None, Credit)]);
        let written = export_report(&report, dir.path(), today()).unwrap();
        assert_eq!(written.len(), 3);
        assert!(!dir.path().join("commission-summary-2025-01-08.csv").exists());
    }

    #[test]
    fn test_sample_quotes_values_not_header() {
        let text = sample_csv().unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(!lines[0].contains('"'));
        assert!(lines[0].contains("Commission"));
        assert!(lines[1].starts_with("\"20250804-001\",\"2025-08-04\",\"5000\""));
    }
}
