//! Source refresh: pull every live tab and reconcile
//!
//! POST kicks a refresh immediately; GET reports the last run and
//! whether the opportunistic cadence says another one is due. There is
//! no scheduler thread, callers poll the status and trigger when due.

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;

use ktrk_common::config::{RequestContext, SourceConfig, TabConfig};
use ktrk_common::db::{last_refresh, log_refresh, refresh_due};
use ktrk_common::loader::{load_workbook, resolve_tab, LoadSummary, TabRoute};
use ktrk_common::time::humanize_ago;
use ktrk_common::Error;
use ktrk_sync::{fetch_workbook, sheets::SheetsClient, SourceSpec};

use crate::api::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RefreshQuery {
    /// Recorded in the refresh log ("manual" when absent)
    pub source: Option<String>,
}

/// POST /api/refresh
pub async fn run_refresh(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sources = &state.config.sources;
    if sources.sheet_id.is_empty() {
        return Err(Error::Config("no sheet source configured".to_string()).into());
    }

    let client = SheetsClient::new(&sources.sheet_id, &sources.sheets_api_key)?;
    let titles = client.list_tabs().await?;
    let specs = sheet_tab_specs(&state.config.tabs, sources, titles);
    info!(tabs = specs.len(), actor = %ctx.actor, "refresh started");

    let (workbook, fetch_errors) = fetch_workbook(&specs).await;
    let mut summary = load_workbook(&state.db, &ctx, &state.config.tabs, workbook).await;
    for e in fetch_errors {
        summary.add_error(e.tab_id, e.message);
    }

    let trigger = query.source.as_deref().unwrap_or("manual");
    record_refresh(&state.db, trigger, &summary).await?;
    info!(result = %summary.describe(), "refresh finished");

    Ok(Json(json!({
        "success": summary.success(),
        "message": summary.describe(),
        "tabs": summary.tabs,
        "errors": summary.errors,
    })))
}

/// GET /api/refresh/status
pub async fn refresh_status(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let last = last_refresh(&state.db).await?;
    let due = refresh_due(
        &state.db,
        state.config.auto_refresh.enabled,
        state.config.auto_refresh.minutes,
    )
    .await?;

    let last = last.map(|entry| {
        json!({
            "refreshed_at": entry.refreshed_at,
            "ago": humanize_ago(&entry.refreshed_at),
            "source": entry.source,
            "tabs_count": entry.tabs_count,
        })
    });

    Ok(Json(json!({
        "last_refresh": last,
        "due": due,
        "auto_refresh_enabled": state.config.auto_refresh.enabled,
        "interval_minutes": state.config.auto_refresh.minutes,
    })))
}

/// One sheets spec per live worksheet, excluded names left out
///
/// Titles come from the workbook itself, so a canonical tab named by
/// any of its aliases is still fetched. Alias and exclusion matching
/// go through the same routing the loader applies.
fn sheet_tab_specs(
    tabs: &TabConfig,
    sources: &SourceConfig,
    titles: Vec<String>,
) -> Vec<(String, SourceSpec)> {
    titles
        .into_iter()
        .filter(|title| resolve_tab(tabs, title) != TabRoute::Excluded)
        .map(|name| {
            let spec = SourceSpec::Sheets {
                sheet_id: sources.sheet_id.clone(),
                tab: name.clone(),
                api_key: sources.sheets_api_key.clone(),
            };
            (name, spec)
        })
        .collect()
}

/// Record the run in the refresh log, counting the tabs that actually
/// loaded. A refresh that stored nothing is not logged, so the next
/// cadence check still reports it as due.
async fn record_refresh(
    pool: &SqlitePool,
    trigger: &str,
    summary: &LoadSummary,
) -> ktrk_common::Result<()> {
    if summary.tabs.is_empty() {
        return Ok(());
    }
    log_refresh(pool, trigger, summary.tabs.len() as i64).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use ktrk_common::db::init_memory_database;
    use ktrk_common::loader::LoadedTab;

    #[test]
    fn test_sheet_tab_specs_keeps_alias_and_drops_excluded() {
        let tabs = TabConfig::default();
        let sources = SourceConfig {
            sheet_id: "sheet1".to_string(),
            sheets_api_key: "k".to_string(),
            ..SourceConfig::default()
        };
        let titles = vec![
            "Kitchen Tracker".to_string(),
            "Area Data".to_string(),
            "auto refresh execution log".to_string(),
        ];

        let specs = sheet_tab_specs(&tabs, &sources, titles);
        let names: Vec<&str> = specs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Kitchen Tracker", "Area Data"]);
        assert!(matches!(specs[0].1, SourceSpec::Sheets { ref tab, .. } if tab == "Kitchen Tracker"));
    }

    #[tokio::test]
    async fn test_failed_refresh_stays_due() {
        let pool = init_memory_database().await.unwrap();
        let mut summary = LoadSummary::default();
        summary.add_error("Tracker", "spreadsheet API returned 503");

        record_refresh(&pool, "manual", &summary).await.unwrap();

        assert!(last_refresh(&pool).await.unwrap().is_none());
        assert!(refresh_due(&pool, true, 15).await.unwrap());
    }

    #[tokio::test]
    async fn test_refresh_log_counts_loaded_tabs() {
        let pool = init_memory_database().await.unwrap();
        let mut summary = LoadSummary::default();
        summary.tabs.push(LoadedTab {
            tab_id: "Tracker".to_string(),
            loaded: 12,
            skipped: 1,
        });
        summary.tabs.push(LoadedTab {
            tab_id: "Area Data".to_string(),
            loaded: 4,
            skipped: 0,
        });
        summary.add_error("LF Comp", "store write failed");

        record_refresh(&pool, "auto", &summary).await.unwrap();

        let entry = last_refresh(&pool).await.unwrap().unwrap();
        assert_eq!(entry.tabs_count, Some(2));
        assert_eq!(entry.source, "auto");
    }
}
