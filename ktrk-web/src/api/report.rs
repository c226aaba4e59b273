//! Summary report
//!
//! Self-contained HTML snapshot of the tracker: totals, freshness, and
//! record counts grouped by region and by metric. Meant for pasting
//! into a status email or opening directly in a browser.

use std::collections::BTreeMap;

use axum::{extract::State, response::Html};

use ktrk_common::db::{count_records, count_updated_today, last_refresh, list_records};
use ktrk_common::time::{humanize_ago, today};

use crate::api::ApiError;
use crate::AppState;

/// GET /api/report
pub async fn summary_report(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let total = count_records(&state.db).await?;
    let updated_today = count_updated_today(&state.db).await?;
    let records = list_records(&state.db).await?;
    let freshness = match last_refresh(&state.db).await? {
        Some(entry) => format!("{} ({})", entry.refreshed_at, humanize_ago(&entry.refreshed_at)),
        None => "never refreshed".to_string(),
    };

    let mut by_region: BTreeMap<String, i64> = BTreeMap::new();
    let mut by_metric: BTreeMap<String, i64> = BTreeMap::new();
    for record in &records {
        *by_region.entry(record.region.clone()).or_default() += 1;
        *by_metric.entry(record.metric_name.clone()).or_default() += 1;
    }

    let mut html = String::new();
    html.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    html.push_str("<title>Tracker Summary</title></head><body>");
    html.push_str(&format!("<h1>Tracker Summary - {}</h1>", escape(&today())));
    html.push_str("<ul>");
    html.push_str(&format!("<li>Total records: {}</li>", total));
    html.push_str(&format!("<li>Updated today: {}</li>", updated_today));
    html.push_str(&format!("<li>Last refresh: {}</li>", escape(&freshness)));
    html.push_str("</ul>");

    html.push_str("<h2>Records by region</h2>");
    push_count_table(&mut html, "Region", &by_region);
    html.push_str("<h2>Records by metric</h2>");
    push_count_table(&mut html, "Metric", &by_metric);

    html.push_str("</body></html>");
    Ok(Html(html))
}

fn push_count_table(html: &mut String, label: &str, counts: &BTreeMap<String, i64>) {
    html.push_str("<table border=\"1\" cellpadding=\"4\"><tr>");
    html.push_str(&format!("<th>{}</th><th>Count</th></tr>", escape(label)));
    for (key, count) in counts {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>",
            escape(key),
            count
        ));
    }
    html.push_str("</table>");
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_handles_markup() {
        assert_eq!(escape("<b>&"), "&lt;b&gt;&amp;");
    }

    #[test]
    fn test_count_table_rows() {
        let mut counts = BTreeMap::new();
        counts.insert("KSA".to_string(), 3i64);
        counts.insert("UAE".to_string(), 1i64);
        let mut html = String::new();
        push_count_table(&mut html, "Region", &counts);
        assert!(html.contains("<td>KSA</td><td>3</td>"));
        assert!(html.contains("<td>UAE</td><td>1</td>"));
    }
}
