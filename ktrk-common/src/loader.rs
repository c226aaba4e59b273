//! Reconciliation loader
//!
//! Takes a workbook (tab name → raw rows) and routes each tab either to
//! the canonical tracker (normalize, require mandatory fields, upsert by
//! record key) or to a generic tab snapshot replacement. Tab names are
//! resolved through an explicit alias table with a single fallback rule:
//! case/whitespace-insensitive equality against the known tab list. No
//! substring matching. Unknown names become new generic tabs, so ad hoc
//! workbook sheets load without configuration.
//!
//! A failure in one tab never aborts the others; errors are collected
//! into the summary and the load reports partial failure.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::config::{RequestContext, TabConfig};
use crate::db::{log_activity, replace_tab, upsert_record, TrackedRecord};
use crate::normalize::normalize_row;
use crate::rows::Row;
use crate::time::now_iso;
use crate::Result;

/// Where an incoming tab name routes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabRoute {
    /// The canonical tracker tab
    Canonical,
    /// A generic snapshot tab, under the resolved id
    Generic(String),
    /// Dropped without logging (configured exclusion)
    Excluded,
}

/// Per-tab result of a load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedTab {
    pub tab_id: String,
    /// Rows stored (upserted or snapshotted)
    pub loaded: usize,
    /// Canonical rows dropped by the required-field gate. Generic tabs
    /// store every row, so this is always 0 for them.
    pub skipped: usize,
}

/// Error against one tab (adapter fetch or store write)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabError {
    pub tab_id: String,
    pub message: String,
}

/// Outcome of one workbook load
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadSummary {
    pub tabs: Vec<LoadedTab>,
    pub errors: Vec<TabError>,
}

impl LoadSummary {
    /// Success: no errors and at least one tab produced output
    pub fn success(&self) -> bool {
        self.errors.is_empty() && !self.tabs.is_empty()
    }

    pub fn add_error(&mut self, tab_id: impl Into<String>, message: impl Into<String>) {
        self.errors.push(TabError {
            tab_id: tab_id.into(),
            message: message.into(),
        });
    }

    /// One-line description for the refresh response
    pub fn describe(&self) -> String {
        if self.tabs.is_empty() && self.errors.is_empty() {
            return "No tabs with data found.".to_string();
        }
        let loaded: Vec<String> = self
            .tabs
            .iter()
            .map(|t| format!("{} ({} rows)", t.tab_id, t.loaded))
            .collect();
        let mut out = format!("Loaded: {}", loaded.join("; "));
        if !self.errors.is_empty() {
            let failed: Vec<String> = self
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.tab_id, e.message))
                .collect();
            out.push_str(&format!("; failed: {}", failed.join("; ")));
        }
        out
    }
}

fn fold(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Resolve a raw tab name to its route
pub fn resolve_tab(tabs: &TabConfig, name: &str) -> TabRoute {
    let folded = fold(name);

    let resolved = if folded == fold(&tabs.canonical_tab)
        || tabs.canonical_aliases.iter().any(|a| fold(a) == folded)
    {
        TabRoute::Canonical
    } else if let Some(known) = tabs.known_tabs.iter().find(|k| fold(k) == folded) {
        TabRoute::Generic(known.clone())
    } else {
        // New ad hoc tab: keep the raw name as its id
        TabRoute::Generic(name.trim().to_string())
    };

    let excluded = match &resolved {
        TabRoute::Canonical => tabs
            .excluded_tabs
            .iter()
            .any(|e| fold(e) == fold(&tabs.canonical_tab)),
        TabRoute::Generic(id) => tabs.excluded_tabs.iter().any(|e| fold(e) == fold(id)),
        TabRoute::Excluded => true,
    };
    if excluded {
        TabRoute::Excluded
    } else {
        resolved
    }
}

/// Load a workbook into the store
///
/// Tabs with no rows are skipped. Each canonical batch and each generic
/// replacement runs in its own transaction; a tab that fails is recorded
/// in the summary and processing continues with the next tab.
pub async fn load_workbook(
    pool: &SqlitePool,
    ctx: &RequestContext,
    tabs: &TabConfig,
    workbook: Vec<(String, Vec<Row>)>,
) -> LoadSummary {
    let mut summary = LoadSummary::default();

    for (name, rows) in workbook {
        if rows.is_empty() {
            continue;
        }
        match resolve_tab(tabs, &name) {
            TabRoute::Excluded => continue,
            TabRoute::Canonical => {
                match load_canonical_tab(pool, ctx, &rows).await {
                    Ok((loaded, skipped)) => {
                        info!(tab = %tabs.canonical_tab, loaded, skipped, "loaded tracker tab");
                        summary.tabs.push(LoadedTab {
                            tab_id: tabs.canonical_tab.clone(),
                            loaded,
                            skipped,
                        });
                    }
                    Err(e) => {
                        warn!(tab = %name, error = %e, "tracker tab load failed");
                        summary.add_error(tabs.canonical_tab.clone(), e.to_string());
                    }
                }
            }
            TabRoute::Generic(tab_id) => match replace_tab(pool, &tab_id, &rows).await {
                Ok(()) => {
                    info!(tab = %tab_id, rows = rows.len(), "replaced tab snapshot");
                    summary.tabs.push(LoadedTab {
                        tab_id,
                        loaded: rows.len(),
                        skipped: 0,
                    });
                }
                Err(e) => {
                    warn!(tab = %tab_id, error = %e, "tab snapshot replace failed");
                    summary.add_error(tab_id, e.to_string());
                }
            },
        }
    }

    summary
}

/// Upsert canonical rows in one transaction; returns (loaded, skipped)
///
/// Rows failing the required-field gate are counted and dropped, not
/// errored; the batch ETL path is the one that quarantines them.
async fn load_canonical_tab(
    pool: &SqlitePool,
    ctx: &RequestContext,
    rows: &[Row],
) -> Result<(usize, usize)> {
    let now = now_iso();
    let mut loaded = 0usize;
    let mut skipped = 0usize;

    let mut tx = pool.begin().await?;
    for raw in rows {
        let normalized = normalize_row(raw);
        let Some(record) = TrackedRecord::from_normalized(&normalized) else {
            skipped += 1;
            continue;
        };
        let outcome = upsert_record(&mut tx, &record, &now).await?;
        log_activity(&mut tx, &record.record_key, outcome.action(), &ctx.actor, "", &now).await?;
        loaded += 1;
    }
    tx.commit().await?;

    Ok((loaded, skipped))
}
