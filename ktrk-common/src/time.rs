//! Timestamp utilities
//!
//! All persisted timestamps use second-precision UTC ISO-8601 with a `Z`
//! suffix, matching the format the tracker has always stored.

use chrono::{DateTime, Utc};

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Current UTC timestamp as stored in the database
pub fn now_iso() -> String {
    Utc::now().format(ISO_FORMAT).to_string()
}

/// Current UTC date (`YYYY-MM-DD`), used for "today" queries
pub fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Parse a stored timestamp back into a `DateTime<Utc>`
pub fn parse_iso(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&ts.replace('Z', "+00:00"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Humanized "how long ago" string for dashboard freshness display
pub fn humanize_ago(ts: &str) -> String {
    let Some(then) = parse_iso(ts) else {
        return "unknown".to_string();
    };
    let secs = (Utc::now() - then).num_seconds();
    if secs < 60 {
        return "just now".to_string();
    }
    if secs < 3600 {
        return format!("{}m ago", secs / 60);
    }
    if secs < 86_400 {
        return format!("{}h ago", secs / 3600);
    }
    if secs < 604_800 {
        let d = secs / 86_400;
        return format!("{} day{} ago", d, if d > 1 { "s" } else { "" });
    }
    let w = secs / 604_800;
    format!("{} week{} ago", w, if w > 1 { "s" } else { "" })
}

/// Seconds elapsed since a stored timestamp, or None if it does not parse
pub fn seconds_since(ts: &str) -> Option<i64> {
    parse_iso(ts).map(|then| (Utc::now() - then).num_seconds())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_iso_round_trips() {
        let ts = now_iso();
        assert!(ts.ends_with('Z'));
        let parsed = parse_iso(&ts).expect("should parse");
        assert!(parsed.timestamp() > 946_684_800); // after 2000-01-01
    }

    #[test]
    fn test_parse_iso_rejects_garbage() {
        assert!(parse_iso("not a timestamp").is_none());
        assert!(parse_iso("").is_none());
    }

    #[test]
    fn test_humanize_ago_recent() {
        assert_eq!(humanize_ago(&now_iso()), "just now");
    }

    #[test]
    fn test_humanize_ago_hours() {
        let then = (Utc::now() - chrono::Duration::hours(3)).format(ISO_FORMAT).to_string();
        assert_eq!(humanize_ago(&then), "3h ago");
    }

    #[test]
    fn test_humanize_ago_days_plural() {
        let then = (Utc::now() - chrono::Duration::days(3)).format(ISO_FORMAT).to_string();
        assert_eq!(humanize_ago(&then), "3 days ago");
    }

    #[test]
    fn test_humanize_ago_unparseable() {
        assert_eq!(humanize_ago("bogus"), "unknown");
    }

    #[test]
    fn test_seconds_since() {
        let then = (Utc::now() - chrono::Duration::minutes(20)).format(ISO_FORMAT).to_string();
        let secs = seconds_since(&then).expect("should parse");
        assert!((1195..=1205).contains(&secs));
    }
}
