//! Configuration for the bookkeeping tool

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;

use crate::constants;
use crate::local_state::StoreOverrides;

// =============================================================================
// File-based Configuration (config.toml)
// =============================================================================

/// Configuration loaded from config.toml
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub store: Option<StoreSection>,
    #[serde(default)]
    pub auth: Option<AuthSection>,
    #[serde(default)]
    pub business: Option<BusinessSection>,
}

/// Hosted store connection
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    /// Project URL, e.g. https://xyz.supabase.co
    pub url: String,
    /// Anonymous (public) API key
    pub anon_key: String,
}

/// Placeholder login credentials
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSection {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusinessSection {
    pub name: String,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content).with_context(|| {
            "Failed to parse config.toml. Check for:\n\
             - Invalid TOML syntax (missing quotes, brackets, etc.)\n\
             - Both url and anon_key set under [store]\n\
             - Both username and password set under [auth]\n\n\
             See config.toml.example for the expected format."
        })
    }
}

/// Load the config file if present; a missing file yields an empty config
/// because store credentials may come from `settings set` instead.
pub fn load_config_file(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        log::debug!("No config file at {}, using defaults", path.display());
        return Ok(FileConfig::default());
    }

    FileConfig::load(path)
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Resolved configuration used by the commands
#[derive(Debug, Clone)]
pub struct Config {
    /// Store base URL without trailing slash
    pub store_url: String,
    pub store_key: String,
    pub business_name: String,
}

impl Config {
    /// Merge the file config with saved overrides. Saved overrides win.
    pub fn resolve(file_config: &FileConfig, overrides: &StoreOverrides) -> Result<Self> {
        let store = file_config.store.as_ref();

        let store_url = overrides
            .url
            .clone()
            .or_else(|| store.map(|s| s.url.clone()))
            .filter(|u| !u.trim().is_empty());
        let store_key = overrides
            .key
            .clone()
            .or_else(|| store.map(|s| s.anon_key.clone()))
            .filter(|k| !k.trim().is_empty());

        let (Some(store_url), Some(store_key)) = (store_url, store_key) else {
            bail!(
                "Store credentials are not configured.\n\n\
                To get started, either:\n\
                1. Copy config.toml.example to config.toml and fill in [store] url and anon_key, or\n\
                2. Run: local-hisab settings set --url <URL> --key <ANON_KEY>"
            );
        };

        Ok(Self {
            store_url: store_url.trim().trim_end_matches('/').to_string(),
            store_key: store_key.trim().to_string(),
            business_name: business_name(file_config),
        })
    }
}

/// Display name of the business, falling back to the app name
pub fn business_name(file_config: &FileConfig) -> String {
    file_config
        .business
        .as_ref()
        .map(|b| b.name.clone())
        .unwrap_or_else(|| constants::APP_NAME.to_string())
}

/// Check a login attempt against the configured (or default) credentials.
/// Login does not need store credentials, so it reads the file config directly.
pub fn login_matches(file_config: &FileConfig, username: &str, password: &str) -> bool {
    match &file_config.auth {
        Some(auth) => auth.username == username && auth.password == password,
        None => username == constants::DEFAULT_USERNAME && password == constants::DEFAULT_PASSWORD,
    }
}

/// Mask an API key for display ("eyJhbGci****")
pub fn mask_key(key: &str) -> String {
    let visible: String = key.chars().take(8).collect();
    format!("{}****", visible)
}
