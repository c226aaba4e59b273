//! Extract, validate, quarantine, load
//!
//! One run walks the configured sources in order. A failed extract
//! aborts the run; validation failures never do, they quarantine.

use serde::Serialize;
use tracing::{info, warn};

use ktrk_common::rows::Row;
use ktrk_common::Result;
use ktrk_sync::fetch_source;

use crate::config::{EtlConfig, OutputSpec};
use crate::output::{write_csv, write_quarantine};
use crate::schema::{validate_rows, Schema};

/// Optional per-row rewrite applied between extract and validate
pub type Transform = fn(Row) -> Row;

/// Per-source counts for the run report
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub id: String,
    pub extracted: usize,
    pub valid: usize,
    pub invalid: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub sources: Vec<SourceSummary>,
    pub total_extracted: usize,
    pub total_valid: usize,
    pub total_invalid: usize,
}

impl RunSummary {
    fn add(&mut self, source: SourceSummary) {
        self.total_extracted += source.extracted;
        self.total_valid += source.valid;
        self.total_invalid += source.invalid;
        self.sources.push(source);
    }
}

/// Run the full pipeline over every configured source
pub async fn run_pipeline(config: &EtlConfig, transform: Option<Transform>) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    for source in &config.sources {
        info!("extracting source '{}'", source.id);
        let mut rows = fetch_source(&source.spec).await?;
        if let Some(transform) = transform {
            rows = rows.into_iter().map(transform).collect();
        }

        let schema = Schema::load(&config.schemas_dir, &source.schema_ref)?;
        let (valid, invalid) = validate_rows(&rows, &schema);
        if !invalid.is_empty() {
            let quarantine_path = config
                .quarantine_dir
                .join(format!("{}_invalid.csv", source.id));
            warn!(
                "source '{}': {} rows quarantined to {}",
                source.id,
                invalid.len(),
                quarantine_path.display()
            );
            write_quarantine(&quarantine_path, &invalid)?;
        }

        let OutputSpec::File { path } = &config.output;
        let output_path = path.join(format!("{}.csv", source.id));
        write_csv(&output_path, &valid)?;
        info!(
            "source '{}': {} extracted, {} valid, {} invalid",
            source.id,
            rows.len(),
            valid.len(),
            invalid.len()
        );

        summary.add(SourceSummary {
            id: source.id.clone(),
            extracted: rows.len(),
            valid: valid.len(),
            invalid: invalid.len(),
        });
    }

    Ok(summary)
}
