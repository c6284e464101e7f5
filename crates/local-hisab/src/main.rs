//! Local Hisab: bookkeeping for a small multi-location business
//!
//! Records credits, debits and commissions against accounts and locations in
//! a hosted store, and produces dashboards, reports and CSV exports from them.

mod aggregation;
mod config;
mod constants;
mod format;
mod import;
mod local_state;
mod models;
mod numbering;
mod reports;
mod state;
mod store;
mod supabase;
mod validation;

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use config::{Config, FileConfig};
use local_state::LocalState;
use models::{AccountInput, LocationInput, NewTransaction, Transaction, TransactionPatch, TransactionType};
use state::AppState;
use store::{TransactionQuery, TransactionStore};
use supabase::RemoteStore;

/// Default config file path
const CONFIG_FILE: &str = "config.toml";

#[derive(Parser, Debug)]
#[command(name = "local-hisab")]
#[command(about = "Bookkeeping for credits, debits and commissions across accounts and locations")]
struct Args {
    /// Data directory for local state (login flag, saved settings)
    #[arg(short, long, default_value = "./data", global = true)]
    data_dir: PathBuf,

    /// Output directory for CSV exports
    #[arg(short, long, default_value = "./output", global = true)]
    output_dir: PathBuf,

    /// Config file path
    #[arg(long, default_value = CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in with the configured credentials
    Login {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,
    },

    /// Log out
    Logout,

    /// Manage store connection settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },

    /// Show today's figures (or another day's)
    Dashboard {
        /// Day to show (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,

        /// Only this location (by name)
        #[arg(long)]
        location: Option<String>,
    },

    /// Manage transactions
    Transaction {
        #[command(subcommand)]
        action: TransactionCommand,
    },

    /// Manage accounts
    Account {
        #[command(subcommand)]
        action: AccountCommand,
    },

    /// Manage locations
    Location {
        #[command(subcommand)]
        action: LocationCommand,
    },

    /// Print summaries by day, account, location and commission
    Report {
        #[command(flatten)]
        filters: Filters,

        /// Also write each summary to a CSV file
        #[arg(long)]
        export: bool,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    /// Show the store URL and masked key in use
    Show,

    /// Save a store URL and key (overrides config.toml)
    Set {
        #[arg(long)]
        url: String,

        #[arg(long)]
        key: String,
    },

    /// Check that the store answers with the current settings
    Test,

    /// Forget saved settings and fall back to config.toml
    Reset,
}

#[derive(Subcommand, Debug)]
enum TransactionCommand {
    /// List transactions, newest first
    List {
        #[command(flatten)]
        filters: Filters,

        /// Page number
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Rows per page
        #[arg(long, default_value_t = constants::DEFAULT_PAGE_LIMIT)]
        limit: usize,
    },

    /// Record a transaction
    Add {
        /// Date (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,

        /// Amount, e.g. 1500 or ₹1,500.50
        #[arg(long)]
        amount: String,

        /// Commission (up to 2 decimal places)
        #[arg(long)]
        commission: Option<String>,

        /// credit or debit
        #[arg(long = "type")]
        kind: String,

        /// Account name
        #[arg(long)]
        account: String,

        /// Location name
        #[arg(long)]
        location: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Transaction number (generated as YYYYMMDD-NNN when omitted)
        #[arg(long)]
        no: Option<String>,
    },

    /// Change fields of a transaction
    Edit {
        /// Transaction ID
        id: String,

        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        amount: Option<String>,

        #[arg(long)]
        commission: Option<String>,

        #[arg(long = "type")]
        kind: Option<String>,

        #[arg(long)]
        account: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        no: Option<String>,
    },

    /// Delete a transaction by ID
    Delete {
        /// Transaction ID
        id: String,
    },

    /// Export transactions to CSV (importable layout)
    Export {
        #[command(flatten)]
        filters: Filters,
    },

    /// Write a sample import file
    Sample,

    /// Import transactions from a CSV file
    Import {
        /// Path to CSV file
        file: PathBuf,

        /// Only show the preview, create nothing
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// List accounts
    List,

    /// Add an account
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        phone: Option<String>,
    },

    /// Change an account
    Edit {
        /// Account ID
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        phone: Option<String>,
    },

    /// Delete an account by ID
    Delete {
        /// Account ID
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum LocationCommand {
    /// List locations
    List,

    /// Add a location
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        address: Option<String>,
    },

    /// Change a location
    Edit {
        /// Location ID
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },

    /// Delete a location by ID
    Delete {
        /// Location ID
        id: String,
    },
}

/// Transaction filters shared by list, export and report
#[derive(clap::Args, Debug)]
struct Filters {
    /// Location name
    #[arg(long)]
    location: Option<String>,

    /// Account name
    #[arg(long)]
    account: Option<String>,

    /// credit or debit
    #[arg(long = "type")]
    kind: Option<String>,

    /// First day (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,

    /// Last day (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,

    /// Text to find in the transaction number or description
    #[arg(long)]
    search: Option<String>,
}

/// Everything a command handler needs besides its own arguments
struct Session {
    local: LocalState,
    file_config: FileConfig,
    output_dir: PathBuf,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // Open local state (in data directory)
    let local = LocalState::open_in(&args.data_dir).await?;
    let file_config = config::load_config_file(&args.config)?;

    let session = Session {
        local,
        file_config,
        output_dir: args.output_dir,
    };

    handle_command(args.command, &session).await
}

async fn handle_command(command: Command, session: &Session) -> Result<()> {
    match command {
        Command::Login { username, password } => {
            if !config::login_matches(&session.file_config, &username, &password) {
                bail!("Invalid username or password");
            }
            session.local.set_authenticated(true).await?;
            println!("Logged in as {}", username);
            Ok(())
        }
        Command::Logout => {
            session.local.set_authenticated(false).await?;
            println!("Logged out");
            Ok(())
        }
        Command::Settings { action } => handle_settings_command(action, session).await,
        Command::Dashboard { date, location } => handle_dashboard(date, location, session).await,
        Command::Transaction { action } => handle_transaction_command(action, session).await,
        Command::Account { action } => handle_account_command(action, session).await,
        Command::Location { action } => handle_location_command(action, session).await,
        Command::Report { filters, export } => handle_report(filters, export, session).await,
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Fail unless the login flag is set
async fn require_login(local: &LocalState) -> Result<AppState> {
    let app = AppState::new(local.is_authenticated().await?);
    if !app.is_authenticated() {
        bail!(
            "Not logged in.\n\n\
            Run: local-hisab login --username <USER> --password <PASS>"
        );
    }
    Ok(app)
}

/// Resolve config and open a store client
async fn connect(session: &Session) -> Result<(RemoteStore, Config)> {
    let overrides = session.local.store_overrides().await?;
    let config = Config::resolve(&session.file_config, &overrides)?;
    Ok((RemoteStore::new(&config), config))
}

/// Log-in check, store client and loaded accounts/locations
async fn open_app(session: &Session) -> Result<(RemoteStore, Config, AppState)> {
    let mut app = require_login(&session.local).await?;
    let (store, config) = connect(session).await?;

    app.set_accounts(store.list_accounts().await?);
    app.set_locations(store.list_locations().await?);

    Ok((store, config, app))
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn parse_day(value: &str) -> Result<NaiveDate> {
    Ok(models::parse_date(value)?)
}

fn parse_kind(value: &str) -> Result<TransactionType> {
    Ok(value.trim().to_lowercase().parse()?)
}

fn account_id_for(app: &AppState, name: &str) -> Result<String> {
    app.find_account_by_name(name)
        .map(|a| a.id.clone())
        .ok_or_else(|| anyhow!("Account not found: {}", name))
}

fn location_id_for(app: &AppState, name: &str) -> Result<String> {
    app.find_location_by_name(name)
        .map(|l| l.id.clone())
        .ok_or_else(|| anyhow!("Location not found: {}", name))
}

/// Turn filter flags into a store query; the location becomes the selected one
fn build_query(filters: &Filters, app: &mut AppState) -> Result<TransactionQuery> {
    let location_id = filters
        .location
        .as_deref()
        .map(|name| location_id_for(app, name))
        .transpose()?;
    app.set_selected_location_id(location_id);

    Ok(TransactionQuery {
        location_id: app.selected_location_id().map(str::to_string),
        account_id: filters
            .account
            .as_deref()
            .map(|name| account_id_for(app, name))
            .transpose()?,
        kind: filters.kind.as_deref().map(parse_kind).transpose()?,
        date_from: filters.from.as_deref().map(parse_day).transpose()?,
        date_to: filters.to.as_deref().map(parse_day).transpose()?,
        search: filters.search.clone(),
        ..Default::default()
    })
}

/// Account name from the embedded relation, else from the loaded list
fn account_label<'a>(app: &'a AppState, t: &'a Transaction) -> &'a str {
    match &t.account {
        Some(account) => &account.name,
        None => app.account_name(&t.account_id),
    }
}

fn location_label<'a>(app: &'a AppState, t: &'a Transaction) -> &'a str {
    match &t.location {
        Some(location) => &location.name,
        None => app.location_name(&t.location_id),
    }
}

/// Trimmed transaction number; blank means none was given
fn clean_transaction_no(no: Option<String>) -> Option<String> {
    no.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table.with(Style::psql());
    println!("{}", table);
}

// =============================================================================
// Settings
// =============================================================================

async fn handle_settings_command(action: SettingsCommand, session: &Session) -> Result<()> {
    require_login(&session.local).await?;

    match action {
        SettingsCommand::Show => {
            let overrides = session.local.store_overrides().await?;
            let file_store = session.file_config.store.as_ref();

            println!("Store Settings");
            println!("==============\n");

            match (&overrides.url, file_store) {
                (Some(url), _) => println!("  URL: {}  (saved)", url),
                (None, Some(store)) => println!("  URL: {}  (config.toml)", store.url),
                (None, None) => println!("  URL: not set"),
            }
            match (&overrides.key, file_store) {
                (Some(key), _) => println!("  Key: {}  (saved)", config::mask_key(key)),
                (None, Some(store)) => println!("  Key: {}  (config.toml)", config::mask_key(&store.anon_key)),
                (None, None) => println!("  Key: not set"),
            }
            println!("\n  Business: {}", config::business_name(&session.file_config));
            Ok(())
        }

        SettingsCommand::Set { url, key } => {
            session.local.set_store_overrides(url.trim(), key.trim()).await?;
            println!("Saved store settings. Run 'local-hisab settings test' to check them.");
            Ok(())
        }

        SettingsCommand::Test => {
            let (store, config) = connect(session).await?;
            println!("Testing connection to {}...", config.store_url);
            store.test_connection().await?;
            println!("Connection successful");
            Ok(())
        }

        SettingsCommand::Reset => {
            session.local.clear_store_overrides().await?;
            println!("Saved store settings cleared; using config.toml");
            Ok(())
        }
    }
}

// =============================================================================
// Dashboard
// =============================================================================

async fn handle_dashboard(date: Option<String>, location: Option<String>, session: &Session) -> Result<()> {
    let (store, config, mut app) = open_app(session).await?;

    let target = date.as_deref().map(parse_day).transpose()?.unwrap_or_else(today);
    let location_id = location.as_deref().map(|name| location_id_for(&app, name)).transpose()?;
    app.set_selected_location_id(location_id);

    // Enough history for the trailing window and the month to date
    let query = TransactionQuery {
        location_id: app.selected_location_id().map(str::to_string),
        date_from: Some(aggregation::month_start(target).min(aggregation::window_start(target))),
        date_to: Some(target),
        ..TransactionQuery::bulk()
    };
    let page = store.list_transactions(&query).await?;
    if page.is_truncated() {
        log::warn!(
            "Dashboard covers the latest {} of {} transactions since {}; older ones are left out",
            page.data.len(),
            page.count,
            query.date_from.map(format::format_date).unwrap_or_default()
        );
    }
    let stats = aggregation::dashboard_stats(&page.data, target);
    let total_transactions = store.count_transactions().await?;

    println!("\n============================================================");
    println!("  {} DASHBOARD  {}", config.business_name.to_uppercase(), format::format_date(stats.date));
    if let Some(id) = app.selected_location_id() {
        println!("  Location: {}", app.location_name(id));
    }
    println!("============================================================\n");

    println!("TODAY:");
    println!("  Credits:            {:>20}", format::format_inr(stats.today_credits));
    println!("  Debits:             {:>20}", format::format_inr(stats.today_debits));
    println!("  Net Balance:        {:>20}", format::format_inr(stats.net_balance));
    println!("  Commissions:        {:>20}", format::format_inr(stats.today_commissions));
    println!("  Avg Transaction:    {:>20}", format::format_inr(stats.avg_transaction_amount));
    match &stats.top_account {
        aggregation::TopAccount::Account { name, amount } => {
            println!("  Top Account:        {} ({})", name, format::format_inr(*amount))
        }
        aggregation::TopAccount::NoTransactions => println!("  Top Account:        No transactions"),
    }

    println!("\nTRENDS:");
    println!("  Month to Date:      {:>20}", format::format_inr_compact(stats.monthly_total));
    println!("  Weekly Average:     {:>20}", format::format_inr_compact(stats.weekly_average));
    println!("  Active Accounts:    {:>20}", stats.active_accounts);
    println!("  Total Transactions: {:>20}", total_transactions);
    println!("  Locations:          {:>20}", app.locations().len());

    if !stats.recent_accounts.is_empty() {
        println!("\nLAST 7 DAYS BY ACCOUNT:");
        for entry in &stats.recent_accounts {
            println!("  {:<24} {:>16}", truncate(&entry.name, 24), format::format_inr(entry.total));
        }
    }

    println!("============================================================");
    Ok(())
}

// =============================================================================
// Transactions
// =============================================================================

#[derive(Tabled)]
struct TransactionLine {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "No")]
    no: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Commission")]
    commission: String,
    #[tabled(rename = "Account")]
    account: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Description")]
    description: String,
}

async fn handle_transaction_command(action: TransactionCommand, session: &Session) -> Result<()> {
    match action {
        TransactionCommand::List { filters, page, limit } => {
            let (store, _, mut app) = open_app(session).await?;
            let query = TransactionQuery {
                page: Some(page),
                limit: Some(limit),
                ..build_query(&filters, &mut app)?
            };

            let result = store.list_transactions(&query).await?;
            if result.data.is_empty() {
                println!("No transactions found.");
                println!("\nUse 'local-hisab transaction add' to record one");
                println!("Or 'local-hisab transaction import <file.csv>' to import from CSV");
                return Ok(());
            }

            let lines: Vec<TransactionLine> = result
                .data
                .iter()
                .map(|t| TransactionLine {
                    id: t.id.clone(),
                    no: t.transaction_no.clone(),
                    date: format::format_date(t.date),
                    kind: t.kind.to_string(),
                    amount: format::format_inr(t.amount),
                    commission: format::format_inr(t.commission_or_zero()),
                    account: account_label(&app, t).to_string(),
                    location: location_label(&app, t).to_string(),
                    description: truncate(t.description.as_deref().unwrap_or(""), 30),
                })
                .collect();
            print_table(lines);

            let pages = result.count.div_ceil(query.limit());
            println!("\nPage {} of {} ({} transactions)", page.max(1), pages.max(1), result.count);
            Ok(())
        }

        TransactionCommand::Add {
            date,
            amount,
            commission,
            kind,
            account,
            location,
            description,
            no,
        } => {
            let (store, _, app) = open_app(session).await?;

            let date = date.as_deref().map(parse_day).transpose()?.unwrap_or_else(today);
            let amount = validation::parse_amount(&amount)?;
            let commission = validation::validate_commission(commission.as_deref().unwrap_or(""))?;
            let kind = parse_kind(&kind)?;
            let account_id = account_id_for(&app, &account)?;
            let location_id = location_id_for(&app, &location)?;

            let transaction_no = match clean_transaction_no(no) {
                Some(no) => no,
                None => numbering::generate_transaction_no(&store, date).await?,
            };

            let created = store
                .create_transaction(&NewTransaction {
                    transaction_no,
                    date,
                    amount,
                    commission,
                    kind,
                    account_id,
                    location_id,
                    description,
                })
                .await?;

            println!(
                "Added transaction {}: {} {} ({} / {})",
                created.transaction_no,
                created.kind,
                format::format_inr(created.amount),
                account_label(&app, &created),
                location_label(&app, &created)
            );
            Ok(())
        }

        TransactionCommand::Edit {
            id,
            date,
            amount,
            commission,
            kind,
            account,
            location,
            description,
            no,
        } => {
            let no = clean_transaction_no(no);
            let nothing_to_change = date.is_none()
                && amount.is_none()
                && commission.is_none()
                && kind.is_none()
                && account.is_none()
                && location.is_none()
                && description.is_none()
                && no.is_none();
            if nothing_to_change {
                bail!("Nothing to change. Pass at least one field, e.g. --amount 500");
            }

            let (store, _, app) = open_app(session).await?;

            let patch = TransactionPatch {
                transaction_no: no,
                date: date.as_deref().map(parse_day).transpose()?,
                amount: amount.as_deref().map(validation::parse_amount).transpose()?,
                commission: commission
                    .as_deref()
                    .map(validation::validate_commission)
                    .transpose()?,
                kind: kind.as_deref().map(parse_kind).transpose()?,
                account_id: account.as_deref().map(|n| account_id_for(&app, n)).transpose()?,
                location_id: location.as_deref().map(|n| location_id_for(&app, n)).transpose()?,
                description,
                updated_at: None,
            };

            let updated = store.update_transaction(&id, &patch).await?;
            println!(
                "Updated transaction {}: {} {} on {}",
                updated.transaction_no,
                updated.kind,
                format::format_inr(updated.amount),
                format::format_date(updated.date)
            );
            Ok(())
        }

        TransactionCommand::Delete { id } => {
            require_login(&session.local).await?;
            let (store, _) = connect(session).await?;

            let existing = store.get_transaction(&id).await?;
            store.delete_transaction(&id).await?;
            println!(
                "Deleted transaction {} ({} {})",
                existing.transaction_no,
                existing.kind,
                format::format_inr(existing.amount)
            );
            Ok(())
        }

        TransactionCommand::Export { filters } => {
            let (store, _, mut app) = open_app(session).await?;
            let query = TransactionQuery {
                limit: Some(constants::BULK_FETCH_LIMIT),
                ..build_query(&filters, &mut app)?
            };

            let result = store.list_transactions(&query).await?;
            match reports::export_transactions(&result.data, &session.output_dir, today())? {
                Some(path) => println!("Exported {} transactions to {}", result.data.len(), path.display()),
                None => println!("No transactions to export."),
            }
            if result.is_truncated() {
                log::warn!(
                    "Only the first {} of {} matching transactions were exported",
                    result.data.len(),
                    result.count
                );
            }
            Ok(())
        }

        TransactionCommand::Sample => {
            let path = reports::write_sample(&session.output_dir)?;
            println!("Sample import file written to {}", path.display());
            Ok(())
        }

        TransactionCommand::Import { file, dry_run } => {
            require_login(&session.local).await?;

            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read import file: {}", file.display()))?;
            let parsed = import::parse_import(&text)?;
            print_import_preview(&parsed);

            if dry_run {
                println!("\nDry run: nothing imported.");
                return Ok(());
            }

            let (store, _, app) = open_app(session).await?;
            println!("\nImporting {} rows...", parsed.rows.len());
            let summary = import::import_transactions(&store, &parsed, app.accounts(), app.locations()).await;

            println!("\n=============================================");
            println!("Import Summary:");
            println!("=============================================");
            println!("  {}", summary.message());
            for failure in &summary.failures {
                println!("  Line {}: {}", failure.line, failure.error);
            }
            Ok(())
        }
    }
}

fn print_import_preview(parsed: &import::ImportFile) {
    let preview = parsed.preview();

    println!("Columns: {}", parsed.headers.join(", "));
    println!("Preview ({} of {} rows):\n", preview.len(), parsed.rows.len());
    println!(
        "{:<6} {:<14} {:<12} {:>12} {:>10} {:<8} {:<18} {:<18}",
        "Line", "No", "Date", "Amount", "Comm.", "Type", "Account", "Location"
    );
    println!("{}", "-".repeat(104));
    for row in preview {
        println!(
            "{:<6} {:<14} {:<12} {:>12} {:>10} {:<8} {:<18} {:<18}",
            row.line,
            truncate(&row.transaction_no, 14),
            truncate(&row.date, 12),
            truncate(&row.amount, 12),
            truncate(row.commission.as_deref().unwrap_or(""), 10),
            truncate(&row.kind, 8),
            truncate(&row.account_name, 18),
            truncate(&row.location_name, 18),
        );
    }
}

// =============================================================================
// Accounts and Locations
// =============================================================================

#[derive(Tabled)]
struct RecordLine {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Details")]
    details: String,
}

async fn handle_account_command(action: AccountCommand, session: &Session) -> Result<()> {
    require_login(&session.local).await?;
    let (store, _) = connect(session).await?;

    match action {
        AccountCommand::List => {
            let accounts = store.list_accounts().await?;
            if accounts.is_empty() {
                println!("No accounts yet.");
                println!("\nUse 'local-hisab account add --name <NAME>' to add one");
                return Ok(());
            }

            let count = accounts.len();
            print_table(
                accounts
                    .into_iter()
                    .map(|a| RecordLine {
                        id: a.id,
                        name: a.name,
                        details: a.phone_number.unwrap_or_default(),
                    })
                    .collect(),
            );
            println!("\n{} account(s)", count);
            Ok(())
        }

        AccountCommand::Add { name, phone } => {
            let created = store
                .create_account(&AccountInput {
                    name: Some(name),
                    phone_number: phone,
                    updated_at: None,
                })
                .await?;
            println!("Added account {} ({})", created.name, created.id);
            Ok(())
        }

        AccountCommand::Edit { id, name, phone } => {
            if name.is_none() && phone.is_none() {
                bail!("Nothing to change. Pass --name or --phone");
            }
            let updated = store
                .update_account(
                    &id,
                    &AccountInput {
                        name,
                        phone_number: phone,
                        updated_at: None,
                    },
                )
                .await?;
            println!("Updated account {} ({})", updated.name, updated.id);
            Ok(())
        }

        AccountCommand::Delete { id } => {
            let existing = store.get_account(&id).await?;
            store.delete_account(&id).await?;
            println!("Deleted account {}", existing.name);
            Ok(())
        }
    }
}

async fn handle_location_command(action: LocationCommand, session: &Session) -> Result<()> {
    require_login(&session.local).await?;
    let (store, _) = connect(session).await?;

    match action {
        LocationCommand::List => {
            let locations = store.list_locations().await?;
            if locations.is_empty() {
                println!("No locations yet.");
                println!("\nUse 'local-hisab location add --name <NAME>' to add one");
                return Ok(());
            }

            let count = locations.len();
            print_table(
                locations
                    .into_iter()
                    .map(|l| RecordLine {
                        id: l.id,
                        name: l.name,
                        details: l.address.unwrap_or_default(),
                    })
                    .collect(),
            );
            println!("\n{} location(s)", count);
            Ok(())
        }

        LocationCommand::Add { name, address } => {
            let created = store
                .create_location(&LocationInput {
                    name: Some(name),
                    address,
                    updated_at: None,
                })
                .await?;
            println!("Added location {} ({})", created.name, created.id);
            Ok(())
        }

        LocationCommand::Edit { id, name, address } => {
            if name.is_none() && address.is_none() {
                bail!("Nothing to change. Pass --name or --address");
            }
            let updated = store
                .update_location(
                    &id,
                    &LocationInput {
                        name,
                        address,
                        updated_at: None,
                    },
                )
                .await?;
            println!("Updated location {} ({})", updated.name, updated.id);
            Ok(())
        }

        LocationCommand::Delete { id } => {
            let existing = store.get_location(&id).await?;
            store.delete_location(&id).await?;
            println!("Deleted location {}", existing.name);
            Ok(())
        }
    }
}

// =============================================================================
// Report
// =============================================================================

async fn handle_report(filters: Filters, export: bool, session: &Session) -> Result<()> {
    let (store, config, mut app) = open_app(session).await?;
    let query = TransactionQuery {
        limit: Some(constants::BULK_FETCH_LIMIT),
        ..build_query(&filters, &mut app)?
    };

    let result = store.list_transactions(&query).await?;
    if result.is_truncated() {
        log::warn!(
            "Report covers the first {} of {} matching transactions",
            result.data.len(),
            result.count
        );
    }
    app.set_transactions(result.data);

    let report = aggregation::build_report(app.transactions());
    reports::print_summary(&report, &config.business_name);

    if export {
        println!("\nWriting CSV files...");
        let written = reports::export_report(&report, &session.output_dir, today())?;
        if written.is_empty() {
            println!("  Nothing to export.");
        }
        for path in written {
            println!("  Generated: {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_transaction_no() {
        assert_eq!(clean_transaction_no(Some(" 20250804-007 ".to_string())).as_deref(), Some("20250804-007"));
        assert_eq!(clean_transaction_no(Some("   ".to_string())), None);
        assert_eq!(clean_transaction_no(Some(String::new())), None);
        assert_eq!(clean_transaction_no(None), None);
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("Amit Patel", 24), "Amit Patel");
        assert_eq!(truncate("₹₹₹₹₹₹₹₹", 6), "₹₹₹...");
    }
}
