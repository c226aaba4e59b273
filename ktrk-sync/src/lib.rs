//! Source adapters for the tracker
//!
//! Every adapter fetches raw rows from one external source and returns
//! the same shape: `Vec<Row>`, first-class ordered string pairs. Source
//! peculiarities (pagination, header rows, dynamic SQL columns) stay
//! inside the adapter. Network adapters use bounded timeouts and turn
//! failures into `Error::Source` / `Error::Payload` values; nothing here
//! panics on bad input.

pub mod crm;
pub mod file;
pub mod sheets;
pub mod sqlite;

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use ktrk_common::loader::TabError;
use ktrk_common::rows::Row;
use ktrk_common::{Error, Result};

/// Declarative description of one source
///
/// This is the shape the ETL config file and the refresh configuration
/// both deserialize into.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceSpec {
    /// Flat CSV file on disk
    File { path: PathBuf },
    /// One tab of an online spreadsheet
    Sheets {
        sheet_id: String,
        tab: String,
        api_key: String,
    },
    /// CRM table query or saved report
    Crm {
        base_url: String,
        token: String,
        #[serde(default)]
        table: Option<String>,
        #[serde(default)]
        report: Option<String>,
        #[serde(default)]
        field_mapping: Option<HashMap<String, String>>,
    },
    /// Table or ad hoc query against an embedded SQLite database
    Sqlite {
        db_path: PathBuf,
        #[serde(default)]
        table: Option<String>,
        #[serde(default)]
        query: Option<String>,
    },
}

/// Fetch all rows from one source
pub async fn fetch_source(spec: &SourceSpec) -> Result<Vec<Row>> {
    match spec {
        SourceSpec::File { path } => file::read_csv_file(path),
        SourceSpec::Sheets {
            sheet_id,
            tab,
            api_key,
        } => {
            let client = sheets::SheetsClient::new(sheet_id, api_key)?;
            client.fetch_tab(tab).await
        }
        SourceSpec::Crm {
            base_url,
            token,
            table,
            report,
            field_mapping,
        } => {
            let client = crm::CrmClient::new(base_url, token)?;
            match (table, report) {
                (Some(table), _) => client.query(table, field_mapping.as_ref()).await,
                (None, Some(report)) => client.report(report, field_mapping.as_ref()).await,
                (None, None) => Err(Error::Config(
                    "crm source needs either table or report".to_string(),
                )),
            }
        }
        SourceSpec::Sqlite {
            db_path,
            table,
            query,
        } => match query {
            Some(query) => sqlite::extract_query(db_path, query).await,
            None => {
                let table = table.as_deref().unwrap_or("tracker_records");
                sqlite::extract_table(db_path, table).await
            }
        },
    }
}

/// Fetch several named tabs, isolating per-tab failures
///
/// A tab whose fetch fails is recorded in the error list and the rest
/// continue; the caller folds the errors into its load summary.
pub async fn fetch_workbook(tabs: &[(String, SourceSpec)]) -> (Vec<(String, Vec<Row>)>, Vec<TabError>) {
    let mut workbook = Vec::new();
    let mut errors = Vec::new();

    for (name, spec) in tabs {
        match fetch_source(spec).await {
            Ok(rows) => workbook.push((name.clone(), rows)),
            Err(e) => {
                warn!(tab = %name, error = %e, "tab fetch failed");
                errors.push(TabError {
                    tab_id: name.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    (workbook, errors)
}
