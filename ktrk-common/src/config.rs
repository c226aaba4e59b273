//! Configuration loading and root folder resolution
//!
//! The tracker keeps its database and config under a single root folder,
//! resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable `KTRK_ROOT_FOLDER`
//! 3. `root_folder` key in the platform config file
//! 4. OS-dependent default (fallback)
//!
//! Service behavior (access control, refresh cadence, tab routing, source
//! credentials) lives in `<root>/ktrk.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Request-scoped caller identity
///
/// Passed explicitly into the loader and handlers; there is no ambient
/// session state. `developer` is set when the request presented the
/// developer key and implies super-user visibility.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub actor: String,
    pub developer: bool,
}

impl RequestContext {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            developer: false,
        }
    }
}

/// Tracker service configuration (`<root>/ktrk.toml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// HTTP listen port for ktrk-web
    pub port: u16,
    /// When true, only allowlisted identifiers may use the API
    pub allowlist_enabled: bool,
    /// Allowlisted identifiers managed from config (synced into the
    /// allowed_users table at startup; the table can hold more)
    pub allowlist_ids: Vec<String>,
    /// Identifiers that see every data tab, not just the kitchen tabs
    pub super_user_ids: Vec<String>,
    /// Secret that unlocks developer mode for a request
    pub developer_key: String,
    pub auto_refresh: AutoRefreshConfig,
    pub tabs: TabConfig,
    pub sources: SourceConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            port: 8750,
            allowlist_enabled: false,
            allowlist_ids: Vec::new(),
            super_user_ids: Vec::new(),
            developer_key: String::new(),
            auto_refresh: AutoRefreshConfig::default(),
            tabs: TabConfig::default(),
            sources: SourceConfig::default(),
        }
    }
}

/// Opportunistic refresh cadence (checked on request, no scheduler thread)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoRefreshConfig {
    pub enabled: bool,
    pub minutes: u32,
}

impl Default for AutoRefreshConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            minutes: 15,
        }
    }
}

/// Tab routing: which incoming tab names mean the canonical tracker,
/// which generic tabs are expected, and which are dropped outright
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TabConfig {
    /// Canonical tab id the tracker rows live under
    pub canonical_tab: String,
    /// Sheet/workbook names that mean the canonical tab
    pub canonical_aliases: Vec<String>,
    /// Known generic tab ids (matched case/whitespace-insensitively)
    pub known_tabs: Vec<String>,
    /// Tabs dropped during load (historical feature removals)
    pub excluded_tabs: Vec<String>,
    /// Generic tabs visible to non-super users
    pub kitchen_tabs: Vec<String>,
}

impl Default for TabConfig {
    fn default() -> Self {
        Self {
            canonical_tab: "Tracker".to_string(),
            canonical_aliases: vec![
                "Kitchen Tracker".to_string(),
                "Smart Tracker".to_string(),
                "Tracker".to_string(),
                "KitchenTracker".to_string(),
                "KSA Kitchen Tracker".to_string(),
            ],
            known_tabs: vec![
                "SF Kitchen Data".to_string(),
                "Sellable No Status".to_string(),
                "All no status kitchens".to_string(),
                "LF Comp".to_string(),
                "Pivot Table 10".to_string(),
                "Area Data".to_string(),
                "SF Churn Data".to_string(),
                "KSA Facility details".to_string(),
                "Inflation FPx".to_string(),
                "Price Multipliers".to_string(),
                "Occupancy".to_string(),
                "Pivot Table 4".to_string(),
            ],
            excluded_tabs: vec!["Auto Refresh Execution Log".to_string()],
            kitchen_tabs: vec![
                "SF Kitchen Data".to_string(),
                "SF Churn Data".to_string(),
                "KSA Facility details".to_string(),
                "Sellable No Status".to_string(),
                "All no status kitchens".to_string(),
            ],
        }
    }
}

/// Credentials and identifiers for the external sources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Online spreadsheet id the refresh pulls from
    pub sheet_id: String,
    /// Spreadsheet API key
    pub sheets_api_key: String,
    /// CRM API base URL
    pub crm_base_url: String,
    /// CRM bearer token
    pub crm_token: String,
}

impl TrackerConfig {
    /// Load `<root>/ktrk.toml`, falling back to defaults when absent
    pub fn load(root_folder: &Path) -> Result<Self> {
        let path = root_folder.join("ktrk.toml");
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    pub fn is_super_user(&self, ctx: &RequestContext) -> bool {
        if ctx.developer {
            return true;
        }
        let id = ctx.actor.trim().to_lowercase();
        self.super_user_ids.iter().any(|s| s.trim().to_lowercase() == id)
    }
}

/// Resolve the tracker root folder (see module docs for priority order)
pub fn resolve_root_folder(cli_arg: Option<&str>) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }
    if let Ok(path) = std::env::var("KTRK_ROOT_FOLDER") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join("ktrk").join("config.toml");
        if let Ok(content) = std::fs::read_to_string(&config_path) {
            if let Ok(value) = toml::from_str::<toml::Value>(&content) {
                if let Some(root) = value.get("root_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(root);
                }
            }
        }
    }
    default_root_folder()
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ktrk"))
        .unwrap_or_else(|| PathBuf::from("./ktrk_data"))
}

/// Ensure the root folder exists and return the database path inside it
pub fn database_path(root_folder: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(root_folder)?;
    Ok(root_folder.join("tracker.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_arg_wins() {
        let root = resolve_root_folder(Some("/tmp/ktrk-test"));
        assert_eq!(root, PathBuf::from("/tmp/ktrk-test"));
    }

    #[test]
    fn test_default_config_routing() {
        let config = TrackerConfig::default();
        assert_eq!(config.tabs.canonical_tab, "Tracker");
        assert!(config.tabs.canonical_aliases.contains(&"Kitchen Tracker".to_string()));
        assert!(config.tabs.excluded_tabs.contains(&"Auto Refresh Execution Log".to_string()));
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: TrackerConfig = toml::from_str(
            r#"
            port = 9000
            allowlist_enabled = true
            allowlist_ids = ["ops@example.com"]

            [auto_refresh]
            minutes = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 9000);
        assert!(config.allowlist_enabled);
        assert_eq!(config.auto_refresh.minutes, 5);
        assert!(config.auto_refresh.enabled); // default survives
        assert_eq!(config.tabs.canonical_tab, "Tracker");
    }

    #[test]
    fn test_super_user_check() {
        let mut config = TrackerConfig::default();
        config.super_user_ids = vec!["Lead@Example.com".to_string()];
        assert!(config.is_super_user(&RequestContext::new("lead@example.com")));
        assert!(!config.is_super_user(&RequestContext::new("viewer@example.com")));
        let mut dev = RequestContext::new("anyone");
        dev.developer = true;
        assert!(config.is_super_user(&dev));
    }
}
