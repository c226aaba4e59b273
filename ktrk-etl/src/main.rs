//! ktrk-etl - Schema-validating extract/load pipeline
//!
//! Pulls rows from the configured sources, checks each against its
//! declared schema, writes validated rows to the output location and
//! quarantines the rest with reasons attached.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use ktrk_etl::config::EtlConfig;
use ktrk_etl::pipeline::run_pipeline;

#[derive(Parser, Debug)]
#[command(name = "ktrk-etl", about = "Run the tracker ETL pipeline")]
struct Cli {
    /// Path to the pipeline config file
    #[arg(default_value = "etl.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting ktrk-etl v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = EtlConfig::load(&cli.config)?;
    info!("Loaded config from {}", cli.config.display());

    let summary = run_pipeline(&config, None).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
