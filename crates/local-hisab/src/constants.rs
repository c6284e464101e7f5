//! Centralized constants for the bookkeeping tool
//!
//! Deployment-specific values (store URL, API key, login) are loaded from config.toml.

/// Display name used when config.toml has no [business] name
pub const APP_NAME: &str = "Local Hisab";

// =============================================================================
// Remote Store
// =============================================================================

/// REST path prefix appended to the store base URL
pub const REST_PATH: &str = "/rest/v1";

/// Relational select used for every transaction query (embeds account and location)
pub const TRANSACTION_SELECT: &str =
    "*,accounts(id,name,phone_number),locations(id,name,address)";

/// Default page size for transaction listings
pub const DEFAULT_PAGE_LIMIT: usize = 20;

/// Page size used when a command needs "everything" (reports, dashboard, numbering)
pub const BULK_FETCH_LIMIT: usize = 1000;

// =============================================================================
// Local Client State
// =============================================================================

/// Local state database filename (inside the data directory)
pub const STATE_FILENAME: &str = "state.sqlite";

/// Key holding the placeholder authentication flag
pub const AUTH_FLAG_KEY: &str = "isAuthenticated";

/// Key holding an overridden store URL
pub const STORE_URL_KEY: &str = "supabase_url";

/// Key holding an overridden store API key
pub const STORE_KEY_KEY: &str = "supabase_key";

/// Default placeholder login
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin123";

// =============================================================================
// Commission Rules
// =============================================================================

/// Largest commission accepted on entry or import
pub const COMMISSION_MAX_VALUE: f64 = 999_999_999.99;

/// Commission precision (currency subunits)
pub const COMMISSION_MAX_DECIMAL_PLACES: usize = 2;

// =============================================================================
// Dashboard
// =============================================================================

/// Length of the trailing window used for active accounts and weekly average
pub const TRAILING_WINDOW_DAYS: i64 = 7;

/// Number of accounts shown in the dashboard's recent-activity breakdown
pub const RECENT_ACCOUNTS_SHOWN: usize = 4;

// =============================================================================
// CSV
// =============================================================================

/// Number of data rows shown before committing an import
pub const IMPORT_PREVIEW_ROWS: usize = 5;

/// Sample import file name
pub const SAMPLE_CSV_FILENAME: &str = "sample-transactions.csv";

/// Label used when a relation name is missing from a record
pub const UNKNOWN_LABEL: &str = "Unknown";
