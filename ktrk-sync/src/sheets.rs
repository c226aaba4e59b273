//! Spreadsheet API adapter
//!
//! Reads one tab of an online spreadsheet through the values endpoint
//! (API key auth). The first returned row is the header row; short rows
//! are padded so every `Row` has a value for every header.

use std::time::Duration;

use serde::Deserialize;

use ktrk_common::rows::{json_value_to_string, Row};
use ktrk_common::{Error, Result};

const VALUES_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Values-endpoint response: rows of cell values
#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Metadata-endpoint response, trimmed to worksheet titles
#[derive(Debug, Deserialize)]
struct MetadataResponse {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

/// Client for one spreadsheet
pub struct SheetsClient {
    http: reqwest::Client,
    sheet_id: String,
    api_key: String,
}

impl SheetsClient {
    pub fn new(sheet_id: &str, api_key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| Error::Internal(format!("http client: {e}")))?;
        Ok(Self {
            http,
            sheet_id: sheet_id.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Worksheet titles, in sheet order
    ///
    /// Tab names in a live workbook drift (renames, seasonal copies),
    /// so refresh enumerates what is actually there instead of guessing
    /// ranges from configuration.
    pub async fn list_tabs(&self) -> Result<Vec<String>> {
        let mut url = reqwest::Url::parse(VALUES_BASE_URL)
            .map_err(|e| Error::Internal(format!("base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| Error::Internal("base url cannot be a base".to_string()))?
            .push(&self.sheet_id);
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title")
            .append_pair("key", &self.api_key);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Source(format!("spreadsheet metadata fetch: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Source(format!(
                "spreadsheet API returned {} for metadata: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let payload: MetadataResponse = response
            .json()
            .await
            .map_err(|e| Error::Payload(format!("spreadsheet metadata response: {e}")))?;

        Ok(payload
            .sheets
            .into_iter()
            .map(|entry| entry.properties.title)
            .collect())
    }

    /// Fetch all rows of one tab (tab name is the A1 range)
    pub async fn fetch_tab(&self, tab: &str) -> Result<Vec<Row>> {
        let mut url = reqwest::Url::parse(VALUES_BASE_URL)
            .map_err(|e| Error::Internal(format!("base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| Error::Internal("base url cannot be a base".to_string()))?
            .push(&self.sheet_id)
            .push("values")
            .push(tab);
        url.query_pairs_mut().append_pair("key", &self.api_key);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Source(format!("spreadsheet fetch for tab '{tab}': {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Source(format!(
                "spreadsheet API returned {} for tab '{}': {}",
                status,
                tab,
                body.chars().take(200).collect::<String>()
            )));
        }

        let payload: ValuesResponse = response
            .json()
            .await
            .map_err(|e| Error::Payload(format!("spreadsheet response for tab '{tab}': {e}")))?;

        Ok(rows_from_values(payload.values))
    }
}

/// Turn the values grid into rows: first row is headers, blanks padded
fn rows_from_values(values: Vec<Vec<serde_json::Value>>) -> Vec<Row> {
    let mut iter = values.into_iter();
    let Some(header_cells) = iter.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let name = json_value_to_string(cell).trim().to_string();
            if name.is_empty() {
                format!("_col{i}")
            } else {
                name
            }
        })
        .collect();

    iter.map(|cells| {
        let mut row = Row::new();
        for (i, header) in headers.iter().enumerate() {
            let value = cells.get(i).map(json_value_to_string).unwrap_or_default();
            row.set(header.clone(), value);
        }
        row
    })
    .collect()
}
