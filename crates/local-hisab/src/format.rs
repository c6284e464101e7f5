//! Indian currency and date display helpers

use chrono::NaiveDate;

const THOUSAND: f64 = 1_000.0;
const LAKH: f64 = 100_000.0;
const CRORE: f64 = 10_000_000.0;

/// Format as rupees with Indian digit grouping, e.g. `₹1,00,000.00`
pub fn format_inr(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    // -0.001 rounds to 0.00 and should not print a sign
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };

    format!("{}₹{}.{}", sign, group_indian(int_part), frac_part)
}

/// Short form for dashboard cards: crores, lakhs, thousands
pub fn format_inr_compact(amount: f64) -> String {
    if amount >= CRORE {
        format!("₹{:.1}Cr", amount / CRORE)
    } else if amount >= LAKH {
        format!("₹{:.1}L", amount / LAKH)
    } else if amount >= THOUSAND {
        format!("₹{:.1}K", amount / THOUSAND)
    } else {
        format_inr(amount)
    }
}

/// Remove the rupee symbol, grouping commas and whitespace from user input
pub fn strip_currency(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '₹' && *c != ',' && !c.is_whitespace())
        .collect()
}

/// Display date as `dd/MM/yyyy`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Group digits as 12,34,56,789: last three, then pairs
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (mut head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    while head.len() > 2 {
        let (rest, pair) = head.split_at(head.len() - 2);
        groups.push(pair);
        head = rest;
    }
    groups.push(head);
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}
