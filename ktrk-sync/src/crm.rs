//! CRM API adapter
//!
//! Bearer-token client for the CRM's REST surface. Two fetch shapes:
//! `query` lists a table with offset pagination (100 records per page),
//! `report` pulls a saved report in one response. Record fields arrive as
//! JSON objects and are flattened to string-valued pairs; an optional
//! field mapping renames CRM column names to schema names on the way out.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use ktrk_common::rows::{json_value_to_string, Row};
use ktrk_common::{Error, Result};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
/// 100 records per page, so this caps a table at 100k records
const MAX_QUERY_PAGES: usize = 1000;

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    records: Vec<CrmRecord>,
    /// Present while more pages remain
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrmRecord {
    #[serde(default)]
    fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ReportResponse {
    #[serde(default)]
    rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug)]
pub struct CrmClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl CrmClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(Error::Config("CRM token must not be empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| Error::Internal(format!("http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Fetch every record of a table, following offset pagination
    pub async fn query(
        &self,
        table: &str,
        field_mapping: Option<&HashMap<String, String>>,
    ) -> Result<Vec<Row>> {
        let url = format!("{}/{}", self.base_url, table);
        let mut rows = Vec::new();
        let mut offset: Option<String> = None;
        let mut pages = 0;

        loop {
            let mut request = self.http.get(&url).bearer_auth(&self.token);
            if let Some(offset) = &offset {
                request = request.query(&[("offset", offset.as_str())]);
            }
            let page: QueryResponse = self.fetch_json(request, table).await?;
            pages += 1;

            for record in page.records {
                let row = record_to_row(&record.fields, field_mapping);
                if !row.is_empty() {
                    rows.push(row);
                }
            }

            match page.offset {
                Some(next) => offset = next_offset(table, offset, next, pages)?,
                None => break,
            }
        }

        Ok(rows)
    }

    /// Fetch a saved report's rows
    pub async fn report(
        &self,
        report_id: &str,
        field_mapping: Option<&HashMap<String, String>>,
    ) -> Result<Vec<Row>> {
        let url = format!("{}/reports/{}", self.base_url, report_id);
        let request = self.http.get(&url).bearer_auth(&self.token);
        let payload: ReportResponse = self.fetch_json(request, report_id).await?;

        Ok(payload
            .rows
            .iter()
            .map(|fields| record_to_row(fields, field_mapping))
            .filter(|row| !row.is_empty())
            .collect())
    }

    async fn fetch_json<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Source(format!("CRM fetch for '{what}': {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Source(format!(
                "CRM API returned {} for '{}': {}",
                status,
                what,
                body.chars().take(200).collect::<String>()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Payload(format!("CRM response for '{what}': {e}")))
    }
}

/// Validate the next pagination cursor before following it
///
/// A server that never stops returning offsets, or echoes the same
/// offset back, would otherwise page forever.
fn next_offset(
    table: &str,
    current: Option<String>,
    next: String,
    pages_fetched: usize,
) -> Result<Option<String>> {
    if pages_fetched >= MAX_QUERY_PAGES {
        return Err(Error::Payload(format!(
            "CRM pagination for '{table}' did not terminate after {MAX_QUERY_PAGES} pages"
        )));
    }
    if current.as_deref() == Some(next.as_str()) {
        return Err(Error::Payload(format!(
            "CRM pagination for '{table}' repeated offset '{next}'"
        )));
    }
    Ok(Some(next))
}

/// Flatten one record's fields, applying the optional rename mapping
fn record_to_row(
    fields: &serde_json::Map<String, serde_json::Value>,
    field_mapping: Option<&HashMap<String, String>>,
) -> Row {
    let mut row = Row::new();
    for (key, value) in fields {
        let name = field_mapping
            .and_then(|m| m.get(key))
            .cloned()
            .unwrap_or_else(|| key.clone());
        row.set(name, json_value_to_string(value));
    }
    row
}
