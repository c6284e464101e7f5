//! Transaction store abstraction
//!
//! The import pipeline and transaction numbering only need to list and create
//! transactions. They are written against this trait so the hosted store and
//! the in-memory test store are interchangeable.

use anyhow::Result;
use chrono::NaiveDate;

use crate::constants;
use crate::models::{NewTransaction, Transaction, TransactionType};

/// Filters and pagination for a transaction listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionQuery {
    /// 1-based page number (default 1)
    pub page: Option<usize>,
    /// Page size (default 20)
    pub limit: Option<usize>,
    pub location_id: Option<String>,
    pub account_id: Option<String>,
    pub kind: Option<TransactionType>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Free-text match against transaction number or description
    pub search: Option<String>,
}

impl TransactionQuery {
    /// Everything recorded on one day
    pub fn on_date(date: NaiveDate) -> Self {
        Self {
            date_from: Some(date),
            date_to: Some(date),
            limit: Some(constants::BULK_FETCH_LIMIT),
            ..Default::default()
        }
    }

    /// Bulk listing for reports and dashboards
    pub fn bulk() -> Self {
        Self {
            limit: Some(constants::BULK_FETCH_LIMIT),
            ..Default::default()
        }
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(constants::DEFAULT_PAGE_LIMIT).max(1)
    }

    /// Zero-based offset of the first row on the requested page
    pub fn offset(&self) -> usize {
        (self.page.unwrap_or(1).max(1) - 1) * self.limit()
    }
}

/// One page of results plus the total number of matching rows
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub count: usize,
}

impl<T> Page<T> {
    /// More rows matched than were returned
    pub fn is_truncated(&self) -> bool {
        self.count > self.data.len()
    }
}

/// Minimal transaction access used by import and numbering
#[allow(async_fn_in_trait)]
pub trait TransactionStore {
    /// List transactions matching `query`, newest first
    async fn list_transactions(&self, query: &TransactionQuery) -> Result<Page<Transaction>>;

    /// Insert a transaction and return the stored row
    async fn create_transaction(&self, transaction: &NewTransaction) -> Result<Transaction>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let query = TransactionQuery::default();
        assert_eq!(query.limit(), 20);
        assert_eq!(query.offset(), 0);

        let query = TransactionQuery {
            page: Some(3),
            limit: Some(10),
            ..Default::default()
        };
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn test_page_truncation() {
        let full = Page { data: vec![1, 2], count: 2 };
        assert!(!full.is_truncated());

        let partial = Page { data: vec![1, 2], count: 1500 };
        assert!(partial.is_truncated());
    }

    #[test]
    fn test_on_date_bounds() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
        let query = TransactionQuery::on_date(date);
        assert_eq!(query.date_from, Some(date));
        assert_eq!(query.date_to, Some(date));
        assert_eq!(query.limit(), 1000);
    }
}
