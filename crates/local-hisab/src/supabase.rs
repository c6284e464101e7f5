//! Hosted data store client (Supabase / PostgREST REST API)
//!
//! Every call is a single request with no retry. Rows coming back are decoded
//! through `models`, which drops anything malformed.

use anyhow::{Context, Result, bail};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Config;
use crate::constants;
use crate::models::{
    Account, AccountInput, Location, LocationInput, NewTransaction, Transaction, TransactionPatch,
    decode_records, decode_transactions,
};
use crate::store::{Page, TransactionQuery, TransactionStore};

const TRANSACTIONS: &str = "transactions";
const ACCOUNTS: &str = "accounts";
const LOCATIONS: &str = "locations";

/// REST client bound to one project URL and API key
pub struct RemoteStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RemoteStore {
    pub fn new(config: &Config) -> Self {
        Self::with_credentials(&config.store_url, &config.store_key)
    }

    pub fn with_credentials(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self, table: &str, params: &[(String, String)]) -> Result<Url> {
        let base = format!("{}{}/{}", self.base_url, constants::REST_PATH, table);
        Url::parse_with_params(&base, params).with_context(|| format!("Invalid store URL: {}", base))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Fail on non-2xx with the status and response body
    async fn check(response: Response, action: &str) -> Result<Response> {
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            bail!("Store API error {} ({}): {}", status, action, text);
        }
        Ok(response)
    }

    async fn rows(response: Response, action: &str) -> Result<Vec<Value>> {
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse store response ({})", action))
    }

    // =========================================================================
    // Generic table access
    // =========================================================================

    async fn select(&self, table: &str, params: &[(String, String)], action: &str) -> Result<Vec<Value>> {
        let url = self.table_url(table, params)?;
        log::debug!("GET {}", url);

        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .with_context(|| format!("Failed to {}", action))?;
        let response = Self::check(response, action).await?;
        Self::rows(response, action).await
    }

    /// Send a body that returns the affected rows
    async fn write<B: Serialize + ?Sized>(
        &self,
        method: Method,
        table: &str,
        params: &[(String, String)],
        body: &B,
        action: &str,
    ) -> Result<Vec<Value>> {
        let url = self.table_url(table, params)?;
        log::debug!("{} {}", method, url);

        let response = self
            .request(method, url)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to {}", action))?;
        let response = Self::check(response, action).await?;
        Self::rows(response, action).await
    }

    async fn remove(&self, table: &str, id: &str, action: &str) -> Result<()> {
        let url = self.table_url(table, &[id_filter(id)])?;
        log::debug!("DELETE {}", url);

        let response = self
            .request(Method::DELETE, url)
            .send()
            .await
            .with_context(|| format!("Failed to {}", action))?;
        Self::check(response, action).await?;
        Ok(())
    }

    async fn list_records<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>> {
        let params = [param("select", "*"), param("order", "name.asc")];
        let rows = self.select(table, &params, &format!("list {}", table)).await?;
        Ok(decode_records(rows, table))
    }

    async fn get_record<T: DeserializeOwned>(&self, table: &str, id: &str) -> Result<T> {
        let params = [param("select", "*"), id_filter(id)];
        let rows = self.select(table, &params, &format!("load {} {}", table, id)).await?;
        first(decode_records(rows, table), table, id)
    }

    async fn insert_record<T: DeserializeOwned, B: Serialize>(&self, table: &str, body: &B) -> Result<T> {
        let rows = self
            .write(Method::POST, table, &[], body, &format!("create {}", table))
            .await?;
        first(decode_records(rows, table), table, "(new)")
    }

    async fn update_record<T: DeserializeOwned, B: Serialize>(&self, table: &str, id: &str, body: &B) -> Result<T> {
        let rows = self
            .write(Method::PATCH, table, &[id_filter(id)], body, &format!("update {} {}", table, id))
            .await?;
        first(decode_records(rows, table), table, id)
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    pub async fn get_transaction(&self, id: &str) -> Result<Transaction> {
        let params = [param("select", constants::TRANSACTION_SELECT), id_filter(id)];
        let rows = self.select(TRANSACTIONS, &params, "load transaction").await?;
        first(decode_transactions(rows), "transaction", id)
    }

    pub async fn update_transaction(&self, id: &str, patch: &TransactionPatch) -> Result<Transaction> {
        let patch = TransactionPatch {
            updated_at: Some(now()),
            ..patch.clone()
        };
        self.write(Method::PATCH, TRANSACTIONS, &[id_filter(id)], &patch, "update transaction")
            .await?;
        // Re-read so the embedded account and location come back too
        self.get_transaction(id).await
    }

    pub async fn delete_transaction(&self, id: &str) -> Result<()> {
        self.remove(TRANSACTIONS, id, "delete transaction").await
    }

    /// Exact number of stored transactions
    pub async fn count_transactions(&self) -> Result<usize> {
        let query = TransactionQuery {
            limit: Some(1),
            ..Default::default()
        };
        Ok(self.list_transactions(&query).await?.count)
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.list_records(ACCOUNTS).await
    }

    pub async fn get_account(&self, id: &str) -> Result<Account> {
        self.get_record(ACCOUNTS, id).await
    }

    pub async fn create_account(&self, input: &AccountInput) -> Result<Account> {
        self.insert_record(ACCOUNTS, input).await
    }

    pub async fn update_account(&self, id: &str, input: &AccountInput) -> Result<Account> {
        let input = AccountInput {
            updated_at: Some(now()),
            ..input.clone()
        };
        self.update_record(ACCOUNTS, id, &input).await
    }

    pub async fn delete_account(&self, id: &str) -> Result<()> {
        self.remove(ACCOUNTS, id, "delete account").await
    }

    // =========================================================================
    // Locations
    // =========================================================================

    pub async fn list_locations(&self) -> Result<Vec<Location>> {
        self.list_records(LOCATIONS).await
    }

    pub async fn get_location(&self, id: &str) -> Result<Location> {
        self.get_record(LOCATIONS, id).await
    }

    pub async fn create_location(&self, input: &LocationInput) -> Result<Location> {
        self.insert_record(LOCATIONS, input).await
    }

    pub async fn update_location(&self, id: &str, input: &LocationInput) -> Result<Location> {
        let input = LocationInput {
            updated_at: Some(now()),
            ..input.clone()
        };
        self.update_record(LOCATIONS, id, &input).await
    }

    pub async fn delete_location(&self, id: &str) -> Result<()> {
        self.remove(LOCATIONS, id, "delete location").await
    }

    // =========================================================================
    // Connection
    // =========================================================================

    /// Minimal query to check the URL and key
    pub async fn test_connection(&self) -> Result<()> {
        let params = [param("select", "id"), param("limit", "1")];
        self.select(ACCOUNTS, &params, "test connection").await?;
        Ok(())
    }
}

impl TransactionStore for RemoteStore {
    async fn list_transactions(&self, query: &TransactionQuery) -> Result<Page<Transaction>> {
        let url = self.table_url(TRANSACTIONS, &transaction_params(query))?;
        log::debug!("GET {}", url);

        let response = self
            .request(Method::GET, url)
            .header("Prefer", "count=exact")
            .send()
            .await
            .context("Failed to list transactions")?;
        let response = Self::check(response, "list transactions").await?;

        let count = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range);
        let data = decode_transactions(Self::rows(response, "list transactions").await?);

        Ok(Page {
            count: count.unwrap_or(data.len()),
            data,
        })
    }

    async fn create_transaction(&self, transaction: &NewTransaction) -> Result<Transaction> {
        let params = [param("select", constants::TRANSACTION_SELECT)];
        let rows = self
            .write(Method::POST, TRANSACTIONS, &params, transaction, "create transaction")
            .await?;
        first(decode_transactions(rows), "transaction", &transaction.transaction_no)
    }
}

// =============================================================================
// Query Building
// =============================================================================

fn param(key: &str, value: &str) -> (String, String) {
    (key.to_string(), value.to_string())
}

fn id_filter(id: &str) -> (String, String) {
    ("id".to_string(), format!("eq.{}", id))
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn first<T>(records: Vec<T>, what: &str, id: &str) -> Result<T> {
    match records.into_iter().next() {
        Some(record) => Ok(record),
        None => bail!("No {} returned for {}", what, id),
    }
}

/// PostgREST query parameters for a transaction listing
pub fn transaction_params(query: &TransactionQuery) -> Vec<(String, String)> {
    let mut params = vec![
        param("select", constants::TRANSACTION_SELECT),
        param("order", "date.desc,created_at.desc"),
    ];

    if let Some(id) = &query.location_id {
        params.push(("location_id".to_string(), format!("eq.{}", id)));
    }
    if let Some(id) = &query.account_id {
        params.push(("account_id".to_string(), format!("eq.{}", id)));
    }
    if let Some(kind) = query.kind {
        params.push(("type".to_string(), format!("eq.{}", kind)));
    }
    if let Some(from) = query.date_from {
        params.push(("date".to_string(), format!("gte.{}", from)));
    }
    if let Some(to) = query.date_to {
        params.push(("date".to_string(), format!("lte.{}", to)));
    }
    if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("\"*{}*\"", term.replace('\\', "\\\\").replace('"', "\\\""));
        params.push((
            "or".to_string(),
            format!("(transaction_no.ilike.{0},description.ilike.{0})", pattern),
        ));
    }

    params.push(("offset".to_string(), query.offset().to_string()));
    params.push(("limit".to_string(), query.limit().to_string()));
    params
}

/// Total from a `Content-Range` header such as `0-19/57` or `*/0`
fn parse_content_range(value: &str) -> Option<usize> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;
    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use serde_json::json;

    fn find<'a>(params: &'a [(String, String)], key: &str) -> Vec<&'a str> {
        params
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    fn row(id: &str, no: &str) -> Value {
        json!({
            "id": id,
            "transaction_no": no,
            "date": "2025-01-08",
            "amount": "1000.00",
            "commission": 50,
            "type": "credit",
            "account_id": "a-1",
            "location_id": "l-1",
            "description": null,
            "accounts": { "id": "a-1", "name": "Amit Patel" },
            "locations": { "id": "l-1", "name": "Mumbai Branch" }
        })
    }

    #[test]
    fn test_default_listing_params() {
        let params = transaction_params(&TransactionQuery::default());
        assert_eq!(find(&params, "order"), ["date.desc,created_at.desc"]);
        assert_eq!(find(&params, "offset"), ["0"]);
        assert_eq!(find(&params, "limit"), ["20"]);
        assert!(find(&params, "or").is_empty());
    }

    #[test]
    fn test_filter_params() {
        let query = TransactionQuery {
            page: Some(2),
            limit: Some(10),
            location_id: Some("l-1".to_string()),
            kind: Some(TransactionType::Debit),
            date_from: NaiveDate::from_ymd_opt(2025, 1, 1),
            date_to: NaiveDate::from_ymd_opt(2025, 1, 31),
            search: Some(" rent ".to_string()),
            ..Default::default()
        };
        let params = transaction_params(&query);

        assert_eq!(find(&params, "location_id"), ["eq.l-1"]);
        assert_eq!(find(&params, "type"), ["eq.debit"]);
        assert_eq!(find(&params, "date"), ["gte.2025-01-01", "lte.2025-01-31"]);
        assert_eq!(
            find(&params, "or"),
            ["(transaction_no.ilike.\"*rent*\",description.ilike.\"*rent*\")"]
        );
        assert_eq!(find(&params, "offset"), ["10"]);
        assert!(find(&params, "account_id").is_empty());
    }

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range("0-19/57"), Some(57));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-19/*"), None);
    }

    #[tokio::test]
    async fn test_list_transactions_sends_key_and_reads_count() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/rest/v1/transactions")
                    .header("apikey", "anon")
                    .header("authorization", "Bearer anon")
                    .query_param("limit", "20");
                then.status(200)
                    .header("content-type", "application/json")
                    .header("content-range", "0-1/42")
                    .json_body(json!([row("t-1", "20250108-001"), { "id": "broken" }]));
            })
            .await;

        let store = RemoteStore::with_credentials(&server.base_url(), "anon");
        let page = store.list_transactions(&TransactionQuery::default()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(page.count, 42);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].commission, Some(50.0));
        assert_eq!(page.data[0].location_name(), "Mumbai Branch");
    }

    #[tokio::test]
    async fn test_error_status_carries_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rest/v1/accounts");
                then.status(401).body("{\"message\":\"Invalid API key\"}");
            })
            .await;

        let store = RemoteStore::with_credentials(&server.base_url(), "bad");
        let err = store.test_connection().await.unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("401"));
        assert!(message.contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_create_transaction_returns_row() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/rest/v1/transactions")
                    .header("prefer", "return=representation");
                then.status(201)
                    .header("content-type", "application/json")
                    .json_body(json!([row("t-9", "20250108-001")]));
            })
            .await;

        let store = RemoteStore::with_credentials(&server.base_url(), "anon");
        let created = store
            .create_transaction(&NewTransaction {
                transaction_no: "20250108-001".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 1, 8).unwrap(),
                amount: 1000.0,
                commission: 50.0,
                kind: TransactionType::Credit,
                account_id: "a-1".to_string(),
                location_id: "l-1".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(created.id, "t-9");
        assert_eq!(created.amount, 1000.0);
    }

    #[tokio::test]
    async fn test_list_accounts_ordered_by_name() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/rest/v1/accounts")
                    .query_param("order", "name.asc");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!([
                        { "id": "a-1", "name": "Amit Patel", "phone_number": "98200 00000" },
                        { "id": "a-2", "name": "Neha Joshi" }
                    ]));
            })
            .await;

        let store = RemoteStore::with_credentials(&server.base_url(), "anon");
        let accounts = store.list_accounts().await.unwrap();

        mock.assert_async().await;
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[1].phone_number, None);
    }
}
