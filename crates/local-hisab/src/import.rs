//! CSV transaction import
//!
//! File-level problems (unreadable CSV, missing columns, no data) abort the
//! whole import before anything is written. Row-level problems (unknown
//! account, bad amount, rejected commission) skip only that row. Rows are
//! created one at a time, in file order, each create awaited before the next
//! row is looked at, so generated transaction numbers never collide.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

use crate::constants;
use crate::models::{Account, Location, NewTransaction, RecordError, Transaction, TransactionType, parse_date};
use crate::numbering::generate_transaction_no;
use crate::store::TransactionStore;
use crate::validation::{AmountError, CommissionError, parse_amount, validate_commission};

/// Columns every import file must have (exact, case-sensitive)
pub const REQUIRED_HEADERS: [&str; 7] = [
    "Transaction No",
    "Date",
    "Amount",
    "Type",
    "Account Name",
    "Location Name",
    "Description",
];

/// Optional column; absent or blank means zero
pub const COMMISSION_HEADER: &str = "Commission";

/// Reasons the whole file is rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    #[error("CSV file must have at least a header and one data row")]
    NoDataRows,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingHeaders(Vec<String>),

    #[error("Failed to read CSV: {0}")]
    Malformed(String),
}

/// Reasons a single row is skipped
#[derive(Debug, Error)]
pub enum RowError {
    #[error("Account not found: {0}")]
    UnknownAccount(String),

    #[error("Location not found: {0}")]
    UnknownLocation(String),

    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error(transparent)]
    Commission(#[from] CommissionError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("Failed to generate transaction number: {0}")]
    Numbering(String),

    #[error("Failed to create transaction: {0}")]
    Create(String),
}

/// One data row, trimmed but not yet resolved or validated
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    /// Line in the source file (1-based)
    pub line: u64,
    pub transaction_no: String,
    pub date: String,
    pub amount: String,
    /// `None` when the file has no Commission column
    pub commission: Option<String>,
    pub kind: String,
    pub account_name: String,
    pub location_name: String,
    pub description: String,
}

/// A parsed import file whose header passed the column check
#[derive(Debug, Clone)]
pub struct ImportFile {
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
}

impl ImportFile {
    /// First few rows, shown before the import is committed
    pub fn preview(&self) -> &[CsvRow] {
        &self.rows[..self.rows.len().min(constants::IMPORT_PREVIEW_ROWS)]
    }
}

/// Parse import text and check the header.
///
/// Blank lines are ignored. Fields are trimmed and unquoted by the CSV reader.
/// Rows shorter than the header get empty strings for the missing fields.
pub fn parse_import(text: &str) -> Result<ImportFile, ImportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut records: Vec<StringRecord> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| ImportError::Malformed(e.to_string()))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        records.push(record);
    }

    if records.len() < 2 {
        return Err(ImportError::NoDataRows);
    }

    let headers: Vec<String> = records[0].iter().map(str::to_string).collect();
    let missing: Vec<String> = REQUIRED_HEADERS
        .iter()
        .filter(|h| !headers.iter().any(|have| have == *h))
        .map(|h| h.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingHeaders(missing));
    }

    let column = |name: &str| headers.iter().position(|h| h == name);
    let field = |record: &StringRecord, name: &str| -> String {
        column(name)
            .and_then(|i| record.get(i))
            .unwrap_or_default()
            .to_string()
    };
    let has_commission = column(COMMISSION_HEADER).is_some();

    let rows = records[1..]
        .iter()
        .map(|record| CsvRow {
            line: record.position().map(|p| line_at(text, p.byte())).unwrap_or_default(),
            transaction_no: field(record, "Transaction No"),
            date: field(record, "Date"),
            amount: field(record, "Amount"),
            commission: has_commission.then(|| field(record, COMMISSION_HEADER)),
            kind: field(record, "Type"),
            account_name: field(record, "Account Name"),
            location_name: field(record, "Location Name"),
            description: field(record, "Description"),
        })
        .collect();

    Ok(ImportFile { headers, rows })
}

/// 1-based file line of the record starting at `byte`.
///
/// The reader's own line counter skips blank lines, and a record's offset can
/// still point at the terminators before it, so those are stepped over first.
fn line_at(text: &str, byte: u64) -> u64 {
    let bytes = text.as_bytes();
    let mut start = usize::try_from(byte).unwrap_or(usize::MAX).min(bytes.len());
    while start < bytes.len() && matches!(bytes[start], b'\r' | b'\n') {
        start += 1;
    }
    bytes[..start].iter().filter(|b| **b == b'\n').count() as u64 + 1
}

/// A row with names resolved to ids and every field validated
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRow {
    /// `None` when the file left the number blank
    pub transaction_no: Option<String>,
    pub date: NaiveDate,
    pub amount: f64,
    pub commission: f64,
    pub kind: TransactionType,
    pub account_id: String,
    pub location_id: String,
    pub description: String,
}

/// Resolve names against the loaded lists and validate the row's fields
pub fn resolve_row(row: &CsvRow, accounts: &[Account], locations: &[Location]) -> Result<ResolvedRow, RowError> {
    let account = accounts
        .iter()
        .find(|a| a.name == row.account_name)
        .ok_or_else(|| RowError::UnknownAccount(row.account_name.clone()))?;
    let location = locations
        .iter()
        .find(|l| l.name == row.location_name)
        .ok_or_else(|| RowError::UnknownLocation(row.location_name.clone()))?;

    let amount = parse_amount(&row.amount)?;
    let commission = validate_commission(row.commission.as_deref().unwrap_or(""))?;
    let kind: TransactionType = row.kind.to_lowercase().parse()?;
    let date = parse_date(&row.date)?;

    Ok(ResolvedRow {
        transaction_no: Some(row.transaction_no.clone()).filter(|no| !no.is_empty()),
        date,
        amount,
        commission,
        kind,
        account_id: account.id.clone(),
        location_id: location.id.clone(),
        description: row.description.clone(),
    })
}

/// A row that was not imported
#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    pub line: u64,
    pub error: String,
}

/// Outcome of an import run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub success_count: usize,
    pub error_count: usize,
    pub failures: Vec<RowFailure>,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        format!(
            "Successfully imported {} transactions. {} errors occurred.",
            self.success_count, self.error_count
        )
    }
}

/// Create one transaction per valid row, strictly in file order.
///
/// Failing rows are logged and counted; they never stop the run.
pub async fn import_transactions<S: TransactionStore>(
    store: &S,
    file: &ImportFile,
    accounts: &[Account],
    locations: &[Location],
) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for row in &file.rows {
        match import_row(store, row, accounts, locations).await {
            Ok(created) => {
                log::debug!("Imported line {} as {}", row.line, created.transaction_no);
                summary.success_count += 1;
            }
            Err(e) => {
                log::warn!("Skipping import line {}: {}", row.line, e);
                summary.error_count += 1;
                summary.failures.push(RowFailure {
                    line: row.line,
                    error: e.to_string(),
                });
            }
        }
    }

    log::info!("{}", summary.message());
    summary
}

async fn import_row<S: TransactionStore>(
    store: &S,
    row: &CsvRow,
    accounts: &[Account],
    locations: &[Location],
) -> Result<Transaction, RowError> {
    let resolved = resolve_row(row, accounts, locations)?;

    let transaction_no = match resolved.transaction_no {
        Some(no) => no,
        None => generate_transaction_no(store, resolved.date)
            .await
            .map_err(|e| RowError::Numbering(format!("{:#}", e)))?,
    };

    let new = NewTransaction {
        transaction_no,
        date: resolved.date,
        amount: resolved.amount,
        commission: resolved.commission,
        kind: resolved.kind,
        account_id: resolved.account_id,
        location_id: resolved.location_id,
        description: resolved.description,
    };

    store
        .create_transaction(&new)
        .await
        .map_err(|e| RowError::Create(format!("{:#}", e)))
}
