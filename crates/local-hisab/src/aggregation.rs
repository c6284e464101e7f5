//! Summaries over a list of transactions
//!
//! Everything here is a pure function of the input slice. Grouped outputs keep
//! the order in which a group first appeared before sorting, and all sorts are
//! stable, so equal keys come out in input order.

use chrono::{Datelike, Duration as ChronoDuration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::constants;
use crate::models::Transaction;

/// Credit/debit flows for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: NaiveDate,
    pub credits: f64,
    pub debits: f64,
    pub net: f64,
    pub count: usize,
    pub commission: f64,
}

/// Credit/debit flows for one account
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub account_id: String,
    pub account_name: String,
    pub credits: f64,
    pub debits: f64,
    pub net: f64,
    pub count: usize,
}

/// Credit/debit flows for one location
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSummary {
    pub location_id: String,
    pub location_name: String,
    pub credits: f64,
    pub debits: f64,
    pub net: f64,
    pub count: usize,
}

/// Commission earned through one account (only accounts with commission > 0)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionSummary {
    pub account_id: String,
    pub account_name: String,
    pub total_commission: f64,
    pub transaction_count: usize,
    pub avg_commission: f64,
}

/// Whole-list totals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Totals {
    pub total_credits: f64,
    pub total_debits: f64,
    pub net_balance: f64,
    pub total_commissions: f64,
    pub total_transactions: usize,
}

/// Everything the report command shows
#[derive(Debug, Clone)]
pub struct ReportData {
    pub daily: Vec<DailySummary>,
    pub accounts: Vec<AccountSummary>,
    pub locations: Vec<LocationSummary>,
    pub commissions: Vec<CommissionSummary>,
    pub totals: Totals,
}

/// Build all report views from one list
pub fn build_report(transactions: &[Transaction]) -> ReportData {
    ReportData {
        daily: daily_summary(transactions),
        accounts: account_summary(transactions),
        locations: location_summary(transactions),
        commissions: commission_summary(transactions),
        totals: totals(transactions),
    }
}

/// Add one transaction's amount to the matching side
fn accumulate(credits: &mut f64, debits: &mut f64, transaction: &Transaction) {
    if transaction.is_credit() {
        *credits += transaction.amount;
    } else {
        *debits += transaction.amount;
    }
}

/// Per-day summary, ascending by date
pub fn daily_summary(transactions: &[Transaction]) -> Vec<DailySummary> {
    let mut days: BTreeMap<NaiveDate, DailySummary> = BTreeMap::new();

    for t in transactions {
        let day = days.entry(t.date).or_insert_with(|| DailySummary {
            date: t.date,
            credits: 0.0,
            debits: 0.0,
            net: 0.0,
            count: 0,
            commission: 0.0,
        });
        accumulate(&mut day.credits, &mut day.debits, t);
        day.net = day.credits - day.debits;
        day.count += 1;
        day.commission += t.commission_or_zero();
    }

    days.into_values().collect()
}

/// Per-account summary, descending by net
pub fn account_summary(transactions: &[Transaction]) -> Vec<AccountSummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<AccountSummary> = Vec::new();

    for t in transactions {
        let i = *index.entry(t.account_id.as_str()).or_insert_with(|| {
            rows.push(AccountSummary {
                account_id: t.account_id.clone(),
                account_name: t.account_name().to_string(),
                credits: 0.0,
                debits: 0.0,
                net: 0.0,
                count: 0,
            });
            rows.len() - 1
        });
        let row = &mut rows[i];
        accumulate(&mut row.credits, &mut row.debits, t);
        row.net = row.credits - row.debits;
        row.count += 1;
    }

    rows.sort_by(|a, b| b.net.total_cmp(&a.net));
    rows
}

/// Per-location summary, descending by net
pub fn location_summary(transactions: &[Transaction]) -> Vec<LocationSummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<LocationSummary> = Vec::new();

    for t in transactions {
        let i = *index.entry(t.location_id.as_str()).or_insert_with(|| {
            rows.push(LocationSummary {
                location_id: t.location_id.clone(),
                location_name: t.location_name().to_string(),
                credits: 0.0,
                debits: 0.0,
                net: 0.0,
                count: 0,
            });
            rows.len() - 1
        });
        let row = &mut rows[i];
        accumulate(&mut row.credits, &mut row.debits, t);
        row.net = row.credits - row.debits;
        row.count += 1;
    }

    rows.sort_by(|a, b| b.net.total_cmp(&a.net));
    rows
}

/// Commission per account, descending by total. Zero-commission rows are skipped,
/// so every entry has at least one transaction and a positive total.
pub fn commission_summary(transactions: &[Transaction]) -> Vec<CommissionSummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<CommissionSummary> = Vec::new();

    for t in transactions {
        let commission = t.commission_or_zero();
        if commission <= 0.0 {
            continue;
        }

        let i = *index.entry(t.account_id.as_str()).or_insert_with(|| {
            rows.push(CommissionSummary {
                account_id: t.account_id.clone(),
                account_name: t.account_name().to_string(),
                total_commission: 0.0,
                transaction_count: 0,
                avg_commission: 0.0,
            });
            rows.len() - 1
        });
        let row = &mut rows[i];
        row.total_commission += commission;
        row.transaction_count += 1;
        row.avg_commission = row.total_commission / row.transaction_count as f64;
    }

    rows.sort_by(|a, b| b.total_commission.total_cmp(&a.total_commission));
    rows
}

/// Totals across the whole list
pub fn totals(transactions: &[Transaction]) -> Totals {
    let mut totals = Totals {
        total_transactions: transactions.len(),
        ..Default::default()
    };

    for t in transactions {
        accumulate(&mut totals.total_credits, &mut totals.total_debits, t);
        totals.total_commissions += t.commission_or_zero();
    }
    totals.net_balance = totals.total_credits - totals.total_debits;

    totals
}

// =============================================================================
// Dashboard
// =============================================================================

/// Account with the largest turnover on the dashboard date
#[derive(Debug, Clone, PartialEq)]
pub enum TopAccount {
    NoTransactions,
    Account { name: String, amount: f64 },
}

/// Summed amount for one account name
#[derive(Debug, Clone, PartialEq)]
pub struct AccountTotal {
    pub name: String,
    pub total: f64,
}

/// Dashboard figures for one target date
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub date: NaiveDate,
    pub today_credits: f64,
    pub today_debits: f64,
    pub net_balance: f64,
    pub today_commissions: f64,
    /// Distinct accounts over the trailing 7 days
    pub active_accounts: usize,
    /// Net from the first of the month through the target date
    pub monthly_total: f64,
    /// Net over the trailing 7 days divided by 7
    pub weekly_average: f64,
    pub avg_transaction_amount: f64,
    pub top_account: TopAccount,
    /// Largest accounts by amount over the trailing 7 days
    pub recent_accounts: Vec<AccountTotal>,
}

/// First day of the trailing window ending on `target` (inclusive)
pub fn window_start(target: NaiveDate) -> NaiveDate {
    target - ChronoDuration::days(constants::TRAILING_WINDOW_DAYS - 1)
}

/// First day of the month containing `target`
pub fn month_start(target: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(target.year(), target.month(), 1).unwrap_or(target)
}

/// Compute dashboard figures. Transactions dated after `target` are ignored.
pub fn dashboard_stats(transactions: &[Transaction], target: NaiveDate) -> DashboardStats {
    let today: Vec<&Transaction> = transactions.iter().filter(|t| t.date == target).collect();
    let window_from = window_start(target);
    let recent: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.date >= window_from && t.date <= target)
        .collect();
    let month_from = month_start(target);

    let mut today_credits = 0.0;
    let mut today_debits = 0.0;
    for t in &today {
        accumulate(&mut today_credits, &mut today_debits, t);
    }
    let today_commissions: f64 = today.iter().map(|t| t.commission_or_zero()).sum();

    let avg_transaction_amount = if today.is_empty() {
        0.0
    } else {
        today.iter().map(|t| t.amount).sum::<f64>() / today.len() as f64
    };

    let monthly_total: f64 = transactions
        .iter()
        .filter(|t| t.date >= month_from && t.date <= target)
        .map(|t| t.signed_amount())
        .sum();

    let weekly_net: f64 = recent.iter().map(|t| t.signed_amount()).sum();

    let mut active: Vec<&str> = recent.iter().map(|t| t.account_id.as_str()).collect();
    active.sort_unstable();
    active.dedup();

    DashboardStats {
        date: target,
        today_credits,
        today_debits,
        net_balance: today_credits - today_debits,
        today_commissions,
        active_accounts: active.len(),
        monthly_total,
        weekly_average: weekly_net / constants::TRAILING_WINDOW_DAYS as f64,
        avg_transaction_amount,
        top_account: top_account(&today),
        recent_accounts: recent_accounts(&recent),
    }
}

/// Highest summed amount per account id; first-seen account wins ties
fn top_account(transactions: &[&Transaction]) -> TopAccount {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut sums: Vec<(&str, f64)> = Vec::new();

    for t in transactions {
        let i = *index.entry(t.account_id.as_str()).or_insert_with(|| {
            sums.push((t.account_name(), 0.0));
            sums.len() - 1
        });
        sums[i].1 += t.amount;
    }

    sums.into_iter()
        .fold(None, |best: Option<(&str, f64)>, (name, amount)| match best {
            Some((_, top)) if top >= amount => best,
            _ => Some((name, amount)),
        })
        .map(|(name, amount)| TopAccount::Account {
            name: name.to_string(),
            amount,
        })
        .unwrap_or(TopAccount::NoTransactions)
}

/// Largest accounts by summed amount, grouped by display name
fn recent_accounts(transactions: &[&Transaction]) -> Vec<AccountTotal> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<AccountTotal> = Vec::new();

    for t in transactions {
        let i = *index.entry(t.account_name()).or_insert_with(|| {
            totals.push(AccountTotal {
                name: t.account_name().to_string(),
                total: 0.0,
            });
            totals.len() - 1
        });
        totals[i].total += t.amount;
    }

    totals.sort_by(|a, b| b.total.total_cmp(&a.total));
    totals.truncate(constants::RECENT_ACCOUNTS_SHOWN);
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType::{Credit, Debit};
    use crate::models::fixtures::transaction;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    /// Four transactions over two days, all on account a-1
    fn scenario() -> Vec<Transaction> {
        vec![
            transaction("2025-01-08", 1000.0, Some(50.0), Credit),
            transaction("2025-01-08", 500.0, Some(25.0), Credit),
            transaction("2025-01-08", 200.0, Some(0.0), Debit),
            transaction("2025-01-07", 300.0, Some(15.0), Credit),
        ]
    }

    #[test]
    fn test_daily_summary_scenario() {
        let daily = daily_summary(&scenario());
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, date("2025-01-07"));

        let jan8 = &daily[1];
        assert_eq!(jan8.date, date("2025-01-08"));
        assert_eq!(jan8.credits, 1500.0);
        assert_eq!(jan8.debits, 200.0);
        assert_eq!(jan8.net, 1300.0);
        assert_eq!(jan8.count, 3);
        assert_eq!(jan8.commission, 75.0);
    }

    #[test]
    fn test_daily_sums_match_totals() {
        let mut list = scenario();
        list.push(transaction("2025-01-05", 42.5, None, Debit));
        list.push(transaction("2025-01-09", 10.25, Some(1.0), Credit));

        let daily = daily_summary(&list);
        let totals = totals(&list);

        let credits: f64 = daily.iter().map(|d| d.credits).sum();
        let debits: f64 = daily.iter().map(|d| d.debits).sum();
        assert_eq!(credits, totals.total_credits);
        assert_eq!(debits, totals.total_debits);
        assert_eq!(totals.total_transactions, 6);
        assert_eq!(totals.net_balance, totals.total_credits - totals.total_debits);
    }

    #[test]
    fn test_null_commission_counts_as_zero() {
        let list = vec![
            transaction("2025-01-08", 100.0, None, Credit),
            transaction("2025-01-08", 100.0, Some(2.5), Credit),
        ];
        let daily = daily_summary(&list);
        assert_eq!(daily[0].commission, 2.5);
        assert!(!daily[0].commission.is_nan());
        assert_eq!(totals(&list).total_commissions, 2.5);
    }

    #[test]
    fn test_account_summary_sorted_by_net_with_unknown_fallback() {
        let list = vec![
            transaction("2025-01-08", 100.0, None, Credit).with_account("a-1", Some("Amit Patel")),
            transaction("2025-01-08", 900.0, None, Credit).with_account("a-2", None),
            transaction("2025-01-08", 50.0, None, Debit).with_account("a-1", Some("Amit Patel")),
            transaction("2025-01-08", 500.0, None, Debit).with_account("a-3", Some("Neha Joshi")),
        ];

        let accounts = account_summary(&list);
        let names: Vec<&str> = accounts.iter().map(|a| a.account_name.as_str()).collect();
        assert_eq!(names, ["Unknown", "Amit Patel", "Neha Joshi"]);
        assert_eq!(accounts[1].credits, 100.0);
        assert_eq!(accounts[1].debits, 50.0);
        assert_eq!(accounts[1].net, 50.0);
        assert_eq!(accounts[1].count, 2);
        assert_eq!(accounts[2].net, -500.0);
    }

    #[test]
    fn test_location_summary_groups_by_location() {
        let list = vec![
            transaction("2025-01-08", 100.0, None, Credit).with_location("l-1", Some("Mumbai Branch")),
            transaction("2025-01-08", 300.0, None, Credit).with_location("l-2", Some("Delhi Branch")),
            transaction("2025-01-09", 100.0, None, Credit).with_location("l-1", Some("Mumbai Branch")),
        ];

        let locations = location_summary(&list);
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].location_name, "Delhi Branch");
        assert_eq!(locations[1].location_name, "Mumbai Branch");
        assert_eq!(locations[1].net, 200.0);
        assert_eq!(locations[1].count, 2);
    }

    #[test]
    fn test_commission_summary_skips_zero_and_averages() {
        let list = vec![
            transaction("2025-01-08", 100.0, Some(10.0), Credit).with_account("a-1", Some("Amit Patel")),
            transaction("2025-01-08", 100.0, Some(0.0), Credit).with_account("a-1", Some("Amit Patel")),
            transaction("2025-01-08", 100.0, Some(5.0), Debit).with_account("a-1", Some("Amit Patel")),
            transaction("2025-01-08", 100.0, None, Credit).with_account("a-2", Some("Neha Joshi")),
            transaction("2025-01-08", 100.0, Some(40.0), Credit).with_account("a-3", Some("Rajesh Kumar")),
        ];

        let commissions = commission_summary(&list);
        assert_eq!(commissions.len(), 2);
        assert_eq!(commissions[0].account_name, "Rajesh Kumar");

        let amit = &commissions[1];
        assert_eq!(amit.total_commission, 15.0);
        assert_eq!(amit.transaction_count, 2);
        assert_eq!(amit.avg_commission, 7.5);

        for entry in &commissions {
            assert!(entry.transaction_count >= 1);
            assert!(entry.total_commission > 0.0);
            assert_eq!(entry.avg_commission, entry.total_commission / entry.transaction_count as f64);
        }
    }

    #[test]
    fn test_empty_input() {
        let report = build_report(&[]);
        assert!(report.daily.is_empty());
        assert!(report.accounts.is_empty());
        assert!(report.commissions.is_empty());
        assert_eq!(report.totals, Totals::default());
    }

    #[test]
    fn test_dashboard_for_target_date() {
        let list = vec![
            transaction("2025-01-08", 1000.0, Some(50.0), Credit).with_account("a-1", Some("Amit Patel")),
            transaction("2025-01-08", 500.0, Some(25.0), Credit).with_account("a-2", Some("Neha Joshi")),
            transaction("2025-01-08", 800.0, None, Debit).with_account("a-2", Some("Neha Joshi")),
            transaction("2025-01-03", 300.0, None, Credit).with_account("a-3", Some("Rajesh Kumar")),
            // outside the 7-day window but inside the month
            transaction("2025-01-01", 700.0, None, Credit).with_account("a-4", Some("Priya Shah")),
            // previous month
            transaction("2024-12-31", 5000.0, None, Credit).with_account("a-5", Some("Old Account")),
        ];

        let stats = dashboard_stats(&list, date("2025-01-08"));
        assert_eq!(stats.today_credits, 1500.0);
        assert_eq!(stats.today_debits, 800.0);
        assert_eq!(stats.net_balance, 700.0);
        assert_eq!(stats.today_commissions, 75.0);
        assert_eq!(stats.avg_transaction_amount, 2300.0 / 3.0);
        assert_eq!(stats.active_accounts, 3);
        assert_eq!(stats.monthly_total, 1000.0 + 500.0 - 800.0 + 300.0 + 700.0);
        assert_eq!(stats.weekly_average, (1000.0 + 500.0 - 800.0 + 300.0) / 7.0);
        assert_eq!(
            stats.top_account,
            TopAccount::Account {
                name: "Neha Joshi".to_string(),
                amount: 1300.0
            }
        );
        assert_eq!(stats.recent_accounts[0].name, "Neha Joshi");
        assert_eq!(stats.recent_accounts.len(), 3);
    }

    #[test]
    fn test_dashboard_without_transactions_today() {
        let list = vec![transaction("2025-01-07", 100.0, None, Credit)];
        let stats = dashboard_stats(&list, date("2025-01-08"));
        assert_eq!(stats.top_account, TopAccount::NoTransactions);
        assert_eq!(stats.avg_transaction_amount, 0.0);
        assert_eq!(stats.today_credits, 0.0);
        assert_eq!(stats.active_accounts, 1);
    }

    #[test]
    fn test_window_and_month_bounds() {
        assert_eq!(window_start(date("2025-03-03")), date("2025-02-25"));
        assert_eq!(month_start(date("2025-03-03")), date("2025-03-01"));
    }
}
