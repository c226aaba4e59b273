//! Header normalization for tracker imports
//!
//! Spreadsheet exports, CRM payloads, and hand-edited CSV uploads disagree
//! on header spelling ("Record ID", "record_id", "record-id", ...). This
//! module maps any of the known variants onto the tracker's canonical
//! field names. Mapping is best effort: unrecognized columns are dropped,
//! never an error.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::rows::Row;

/// Canonical tracker fields, in the standardized export column order
/// (stakeholder CSV export and ETL output use this order)
pub const CANONICAL_FIELDS: [&str; 9] = [
    "record_key",
    "report_date",
    "site_id",
    "site_name",
    "region",
    "metric_name",
    "value",
    "status",
    "notes",
];

/// Known header variants, lower-cased. The fallback rule below covers the
/// underscore forms, so only space/dash/fused spellings need entries.
static HEADER_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("record id", "record_key"),
        ("record_id", "record_key"),
        ("recordid", "record_key"),
        ("record-id", "record_key"),
        ("record key", "record_key"),
        ("recordkey", "record_key"),
        ("record-key", "record_key"),
        ("report date", "report_date"),
        ("reportdate", "report_date"),
        ("report-date", "report_date"),
        ("site id", "site_id"),
        ("siteid", "site_id"),
        ("site-id", "site_id"),
        ("site name", "site_name"),
        ("sitename", "site_name"),
        ("site-name", "site_name"),
        ("metric name", "metric_name"),
        ("metricname", "metric_name"),
        ("metric-name", "metric_name"),
    ])
});

/// Map one raw header to its canonical field name, if recognized
pub fn canonical_field(raw: &str) -> Option<&'static str> {
    let key = raw.trim().to_lowercase();
    if let Some(&canonical) = HEADER_ALIASES.get(key.as_str()) {
        return Some(canonical);
    }
    // Fallback: underscore the separators and accept only names that are
    // already canonical ("Report_Date" -> report_date, "Region" -> region).
    let underscored = key.replace([' ', '-'], "_");
    CANONICAL_FIELDS.iter().copied().find(|f| *f == underscored)
}

/// Restrict a raw row to the canonical field set
///
/// Output keys are canonical names; columns with no canonical mapping are
/// dropped. Later duplicates overwrite earlier ones, matching how the
/// sheet exports behaved.
pub fn normalize_row(raw: &Row) -> Row {
    let mut out = Row::new();
    for (key, value) in raw.iter() {
        if let Some(canonical) = canonical_field(key) {
            out.set(canonical, value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_variants_map_to_record_key() {
        for raw in ["Record ID", "record_id", "RECORDID", "record-id", " record id "] {
            assert_eq!(canonical_field(raw), Some("record_key"), "variant: {raw}");
        }
    }

    #[test]
    fn test_all_canonical_fields_have_spacing_variants() {
        // Every canonical field normalizes from its space, dash, and
        // underscore spellings, in any casing.
        for field in CANONICAL_FIELDS {
            let spaced = field.replace('_', " ");
            let dashed = field.replace('_', "-");
            for variant in [
                field.to_string(),
                field.to_uppercase(),
                spaced.clone(),
                titlecase(&spaced),
                dashed,
            ] {
                assert_eq!(canonical_field(&variant), Some(field), "variant: {variant}");
            }
        }
    }

    #[test]
    fn test_unknown_headers_dropped() {
        let raw = Row::from([
            ("Record ID", "R1"),
            ("Favorite Color", "teal"),
            ("Region", "KSA"),
        ]);
        let row = normalize_row(&raw);
        assert_eq!(row.get("record_key"), Some("R1"));
        assert_eq!(row.get("region"), Some("KSA"));
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_normalize_never_invents_fields() {
        let row = normalize_row(&Row::new());
        assert!(row.is_empty());
    }

    fn titlecase(s: &str) -> String {
        s.split(' ')
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
