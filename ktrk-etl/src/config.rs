//! Pipeline run configuration
//!
//! Loaded from a TOML file; relative paths inside it resolve against the
//! directory containing the file, so a config can travel with its
//! schemas and fixtures.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use ktrk_common::{Error, Result};
use ktrk_sync::SourceSpec;

/// One extract source and its validation contract
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    /// Stable identifier, used for output and quarantine file names
    pub id: String,
    /// Name of the schema file (without extension) under `schemas_dir`
    pub schema_ref: String,
    #[serde(flatten)]
    pub spec: SourceSpec,
}

/// Where validated rows land
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputSpec {
    /// CSV files under a directory, one per source id
    File { path: PathBuf },
}

#[derive(Debug, Clone, Deserialize)]
pub struct EtlConfig {
    #[serde(default = "default_schemas_dir")]
    pub schemas_dir: PathBuf,
    #[serde(default = "default_quarantine_dir")]
    pub quarantine_dir: PathBuf,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
    pub output: OutputSpec,
}

fn default_schemas_dir() -> PathBuf {
    PathBuf::from("schemas")
}

fn default_quarantine_dir() -> PathBuf {
    PathBuf::from("quarantine")
}

impl EtlConfig {
    /// Read and parse the config file, resolving relative paths
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let mut config: EtlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid config {}: {}", path.display(), e)))?;

        let base = path.parent().unwrap_or(Path::new("."));
        config.schemas_dir = resolve(base, &config.schemas_dir);
        config.quarantine_dir = resolve(base, &config.quarantine_dir);
        let OutputSpec::File { path } = &mut config.output;
        *path = resolve(base, path);
        for source in &mut config.sources {
            if let SourceSpec::File { path } = &mut source.spec {
                *path = resolve(base, path);
            }
        }

        Ok(config)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("etl.toml");
        let mut f = std::fs::File::create(&config_path).unwrap();
        write!(
            f,
            r#"
schemas_dir = "schemas"
quarantine_dir = "bad"

[[sources]]
id = "tracker"
schema_ref = "tracker"
type = "file"
path = "input/tracker.csv"

[output]
type = "file"
path = "out"
"#
        )
        .unwrap();

        let config = EtlConfig::load(&config_path).unwrap();
        assert_eq!(config.schemas_dir, dir.path().join("schemas"));
        assert_eq!(config.quarantine_dir, dir.path().join("bad"));
        let OutputSpec::File { path } = &config.output;
        assert_eq!(path, &dir.path().join("out"));
        match &config.sources[0].spec {
            SourceSpec::File { path } => assert_eq!(path, &dir.path().join("input/tracker.csv")),
            other => panic!("unexpected spec: {other:?}"),
        }
    }

    #[test]
    fn test_defaults_apply() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("etl.toml");
        std::fs::write(&config_path, "[output]\ntype = \"file\"\npath = \"out\"\n").unwrap();
        let config = EtlConfig::load(&config_path).unwrap();
        assert_eq!(config.schemas_dir, dir.path().join("schemas"));
        assert_eq!(config.quarantine_dir, dir.path().join("quarantine"));
        assert!(config.sources.is_empty());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = EtlConfig::load(Path::new("/nonexistent/etl.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
