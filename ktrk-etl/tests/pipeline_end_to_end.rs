//! End-to-end pipeline run against a file fixture

use std::path::Path;

use tempfile::TempDir;

use ktrk_etl::config::EtlConfig;
use ktrk_etl::pipeline::run_pipeline;

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

#[tokio::test]
async fn test_config_to_output_round() {
    let dir = TempDir::new().unwrap();
    write_file(
        &dir.path().join("schemas/orders.json"),
        r#"{
            "required": ["id", "amount"],
            "properties": {
                "status": {"enum": ["open", "closed"]}
            }
        }"#,
    );
    write_file(
        &dir.path().join("data/orders.csv"),
        "id,amount,status\n1,5,open\n,3,open\n2,9,bogus\n",
    );
    write_file(
        &dir.path().join("etl.toml"),
        r#"
schemas_dir = "schemas"
quarantine_dir = "quarantine"

[[sources]]
id = "orders"
schema_ref = "orders"
type = "file"
path = "data/orders.csv"

[output]
type = "file"
path = "out"
"#,
    );

    let config = EtlConfig::load(&dir.path().join("etl.toml")).unwrap();
    let summary = run_pipeline(&config, None).await.unwrap();

    assert_eq!(summary.sources.len(), 1);
    assert_eq!(summary.sources[0].id, "orders");
    assert_eq!(summary.total_extracted, 3);
    assert_eq!(summary.total_valid, 1);
    assert_eq!(summary.total_invalid, 2);

    let out = std::fs::read_to_string(dir.path().join("out/orders.csv")).unwrap();
    assert_eq!(out, "id,amount,status\n1,5,open\n");

    let quarantine =
        std::fs::read_to_string(dir.path().join("quarantine/orders_invalid.csv")).unwrap();
    assert!(quarantine.contains("missing required field: id"));
    assert!(quarantine.contains("must be one of [open, closed], got 'bogus'"));
    assert!(quarantine.lines().next().unwrap().ends_with("_error,_row_index"));
}
