//! Standalone CSV validator
//!
//! Checks one CSV file against a schema without running the full
//! pipeline. Valid rows go to the output file, invalid rows to the
//! quarantine file with reasons. Exits non-zero when any row fails,
//! so it can gate a data drop in a shell script.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use ktrk_etl::output::{write_csv, write_quarantine};
use ktrk_etl::schema::{validate_rows, Schema};
use ktrk_sync::file::read_csv_file;

#[derive(Parser, Debug)]
#[command(name = "validate", about = "Validate a CSV file against a schema")]
struct Cli {
    /// CSV file to validate
    #[arg(default_value = "tracker.csv")]
    input: PathBuf,

    /// Directory holding schema JSON files
    #[arg(long, default_value = "schemas")]
    schemas_dir: PathBuf,

    /// Schema name (file stem under the schemas directory)
    #[arg(long, default_value = "tracker")]
    schema: String,

    /// Where to write rows that passed
    #[arg(long, default_value = "validated.csv")]
    output: PathBuf,

    /// Where to write rows that failed
    #[arg(long, default_value = "invalid.csv")]
    quarantine: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let rows = read_csv_file(&cli.input)?;
    let schema = Schema::load(&cli.schemas_dir, &cli.schema)?;
    let (valid, invalid) = validate_rows(&rows, &schema);

    write_csv(&cli.output, &valid)?;
    write_quarantine(&cli.quarantine, &invalid)?;

    println!(
        "{}: {} rows, {} valid, {} invalid",
        cli.input.display(),
        rows.len(),
        valid.len(),
        invalid.len()
    );
    for inv in &invalid {
        println!("  row {}: {}", inv.index, inv.error_text());
    }

    if !invalid.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}
