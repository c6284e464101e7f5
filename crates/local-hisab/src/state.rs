//! In-memory application state for one command run

use crate::models::{Account, Location, Transaction};

const UNKNOWN_ACCOUNT: &str = "Unknown Account";
const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Loaded reference data plus the session flags a command works with
#[derive(Debug, Default)]
pub struct AppState {
    authenticated: bool,
    selected_location_id: Option<String>,
    accounts: Vec<Account>,
    locations: Vec<Location>,
    transactions: Vec<Transaction>,
}

impl AppState {
    pub fn new(authenticated: bool) -> Self {
        Self {
            authenticated,
            ..Default::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Location filter applied to transaction listings
    pub fn selected_location_id(&self) -> Option<&str> {
        self.selected_location_id.as_deref()
    }

    pub fn set_selected_location_id(&mut self, id: Option<String>) {
        self.selected_location_id = id;
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn set_accounts(&mut self, accounts: Vec<Account>) {
        self.accounts = accounts;
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn set_locations(&mut self, locations: Vec<Location>) {
        self.locations = locations;
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn set_transactions(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
    }

    pub fn account_name(&self, id: &str) -> &str {
        self.accounts
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.name.as_str())
            .unwrap_or(UNKNOWN_ACCOUNT)
    }

    pub fn location_name(&self, id: &str) -> &str {
        self.locations
            .iter()
            .find(|l| l.id == id)
            .map(|l| l.name.as_str())
            .unwrap_or(UNKNOWN_LOCATION)
    }

    /// Exact, case-sensitive name lookup
    pub fn find_account_by_name(&self, name: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.name == name)
    }

    /// Exact, case-sensitive name lookup
    pub fn find_location_by_name(&self, name: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{account, location};

    fn loaded() -> AppState {
        let mut state = AppState::new(true);
        state.set_accounts(vec![account("a-1", "Amit Patel"), account("a-2", "Neha Joshi")]);
        state.set_locations(vec![location("l-1", "Mumbai Branch")]);
        state
    }

    #[test]
    fn test_name_lookup_with_fallback() {
        let state = loaded();
        assert_eq!(state.account_name("a-2"), "Neha Joshi");
        assert_eq!(state.account_name("a-9"), "Unknown Account");
        assert_eq!(state.location_name("l-1"), "Mumbai Branch");
        assert_eq!(state.location_name("l-9"), "Unknown Location");
    }

    #[test]
    fn test_find_by_name_is_exact() {
        let state = loaded();
        assert_eq!(state.find_account_by_name("Amit Patel").map(|a| a.id.as_str()), Some("a-1"));
        assert!(state.find_account_by_name("amit patel").is_none());
        assert!(state.find_location_by_name("Mumbai").is_none());
    }

    #[test]
    fn test_flags() {
        assert!(!AppState::default().is_authenticated());
        let mut state = AppState::new(true);
        assert!(state.is_authenticated());

        assert_eq!(state.selected_location_id(), None);
        state.set_selected_location_id(Some("l-1".to_string()));
        assert_eq!(state.selected_location_id(), Some("l-1"));
    }
}
