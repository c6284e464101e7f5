//! Typed records for transactions, accounts and locations
//!
//! Rows fetched from the store are decoded one at a time. A row that does not
//! satisfy the record invariants is logged and dropped here, so aggregation only
//! ever sees well-formed transactions.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::constants;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money in
    Credit,
    /// Money out
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(TransactionType::Credit),
            "debit" => Ok(TransactionType::Debit),
            other => Err(RecordError::InvalidType(other.to_string())),
        }
    }
}

/// Errors raised while turning raw field values into a record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("Type must be 'credit' or 'debit' (got '{0}')")]
    InvalidType(String),

    #[error("Date must be in YYYY-MM-DD format (got '{0}')")]
    InvalidDate(String),

    #[error("{field} is not a number (got '{value}')")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} cannot be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
}

/// Parse an ISO calendar date (`yyyy-MM-dd`)
pub fn parse_date(s: &str) -> Result<NaiveDate, RecordError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| RecordError::InvalidDate(s.to_string()))
}

/// Account (counterparty) record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Business location record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A recorded credit or debit
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub transaction_no: String,
    pub date: NaiveDate,
    pub amount: f64,
    /// Absent commission counts as zero everywhere
    pub commission: Option<f64>,
    pub kind: TransactionType,
    pub account_id: String,
    pub location_id: String,
    pub description: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    /// Embedded account relation (may be missing)
    pub account: Option<Account>,
    /// Embedded location relation (may be missing)
    pub location: Option<Location>,
}

impl Transaction {
    pub fn commission_or_zero(&self) -> f64 {
        self.commission.unwrap_or(0.0)
    }

    pub fn is_credit(&self) -> bool {
        self.kind == TransactionType::Credit
    }

    /// Amount with sign applied: credits positive, debits negative
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionType::Credit => self.amount,
            TransactionType::Debit => -self.amount,
        }
    }

    pub fn account_name(&self) -> &str {
        self.account
            .as_ref()
            .map(|a| a.name.as_str())
            .unwrap_or(constants::UNKNOWN_LABEL)
    }

    pub fn location_name(&self) -> &str {
        self.location
            .as_ref()
            .map(|l| l.name.as_str())
            .unwrap_or(constants::UNKNOWN_LABEL)
    }
}

// =============================================================================
// Wire Types
// =============================================================================

/// Numeric column as delivered by the store: JSON number or numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    /// Coerce to f64; blank text counts as zero
    fn coerce(&self, field: &'static str) -> Result<f64, RecordError> {
        let value = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) if s.trim().is_empty() => 0.0,
            Numeric::Text(s) => s.trim().parse::<f64>().map_err(|_| RecordError::NotANumber {
                field,
                value: s.clone(),
            })?,
        };

        if !value.is_finite() {
            return Err(RecordError::NotANumber {
                field,
                value: value.to_string(),
            });
        }
        if value < 0.0 {
            return Err(RecordError::Negative { field, value });
        }
        Ok(value)
    }
}

/// Transaction row exactly as returned by the store
#[derive(Debug, Deserialize)]
pub struct TransactionRow {
    pub id: String,
    pub transaction_no: String,
    pub date: String,
    pub amount: Numeric,
    #[serde(default)]
    pub commission: Option<Numeric>,
    #[serde(rename = "type")]
    pub kind: String,
    pub account_id: String,
    pub location_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub accounts: Option<Account>,
    #[serde(default)]
    pub locations: Option<Location>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = RecordError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let commission = row
            .commission
            .as_ref()
            .map(|c| c.coerce("commission"))
            .transpose()?;

        Ok(Transaction {
            date: parse_date(&row.date)?,
            amount: row.amount.coerce("amount")?,
            commission,
            kind: row.kind.parse()?,
            id: row.id,
            transaction_no: row.transaction_no,
            account_id: row.account_id,
            location_id: row.location_id,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
            account: row.accounts,
            location: row.locations,
        })
    }
}

/// Decode store rows into transactions, dropping malformed ones
pub fn decode_transactions(rows: Vec<serde_json::Value>) -> Vec<Transaction> {
    rows.into_iter()
        .filter_map(|value| {
            let row: TransactionRow = match serde_json::from_value(value) {
                Ok(row) => row,
                Err(e) => {
                    log::warn!("Skipping undecodable transaction row: {}", e);
                    return None;
                }
            };
            let id = row.id.clone();
            match Transaction::try_from(row) {
                Ok(t) => Some(t),
                Err(e) => {
                    log::warn!("Skipping malformed transaction {}: {}", id, e);
                    None
                }
            }
        })
        .collect()
}

/// Decode rows of a simple record type (accounts, locations), dropping malformed ones
pub fn decode_records<T: DeserializeOwned>(rows: Vec<serde_json::Value>, kind: &str) -> Vec<T> {
    rows.into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Skipping malformed {} row: {}", kind, e);
                None
            }
        })
        .collect()
}

// =============================================================================
// Write Payloads
// =============================================================================

/// Insert payload for a transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTransaction {
    pub transaction_no: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub commission: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub account_id: String,
    pub location_id: String,
    pub description: String,
}

/// Partial update for a transaction; unset fields are left untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransactionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission: Option<f64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Insert or update payload for an account
#[derive(Debug, Clone, Default, Serialize)]
pub struct AccountInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Insert or update payload for a location
#[derive(Debug, Clone, Default, Serialize)]
pub struct LocationInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}
