use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use octofhir_cosmos_search::QueryBuilderConfig;
use serde::{Deserialize, Serialize};

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "octofhir-cosmos.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub query: QueryBuilderConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.query.validate()?;
        if self.logging.level.trim().is_empty() {
            return Err("logging.level must not be empty".into());
        }
        Ok(())
    }
}

/// Load the config file layered under environment overrides,
/// e.g. `OCTOFHIR_COSMOS__QUERY__MAX_PARAMETERS=64`.
///
/// An explicit `path` must exist; the default file is optional.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, String> {
    let mut builder = Config::builder();
    match path {
        Some(p) => {
            if !p.exists() {
                return Err(format!("config file not found: {}", p.display()));
            }
            builder = builder.add_source(File::from(p.to_path_buf()));
        }
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                builder = builder.add_source(File::from(default_path));
            }
        }
    }
    builder = builder.add_source(
        Environment::with_prefix("OCTOFHIR_COSMOS")
            .try_parsing(true)
            .separator("__"),
    );
    let cfg = builder
        .build()
        .map_err(|e| format!("config build error: {e}"))?;
    let merged: AppConfig = cfg
        .try_deserialize()
        .map_err(|e| format!("config deserialize error: {e}"))?;
    merged.validate()?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_explicit_missing_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();

        assert!(err.starts_with("config file not found"), "{err}");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("octofhir-cosmos.toml");
        fs::write(&path, "").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.query, QueryBuilderConfig::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("octofhir-cosmos.toml");
        fs::write(
            &path,
            "[query]\nmax_parameters = 64\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.query.max_parameters, 64);
        assert_eq!(config.query.max_expression_depth, 32);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("octofhir-cosmos.toml");
        fs::write(&path, "[query]\nmax_expression_depth = 0\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.contains("max_expression_depth"), "{err}");
    }

    #[test]
    fn test_malformed_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("octofhir-cosmos.toml");
        fs::write(&path, "[query\nmax_parameters = ").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.starts_with("config build error"), "{err}");
    }
}
