use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pravasi::registry::error::{RegistryError, Result};
use crate::pravasi::registry::persistence::STORAGE_KEY;
use crate::pravasi::registry::sync::SyncPolicy;
use crate::pravasi::registry::validation::Validate;

/// Process configuration, read from an optional TOML file. Every field has a
/// default so an empty file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub namespace: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            namespace: STORAGE_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            retry_attempts: 3,
            retry_delay_ms: 500,
        }
    }
}

impl SyncConfig {
    pub fn policy(&self) -> SyncPolicy {
        SyncPolicy {
            timeout: Duration::from_secs(self.timeout_seconds),
            max_attempts: self.retry_attempts,
            initial_backoff: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

impl RegistryConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RegistryError::MissingInput(path.to_path_buf()));
        }
        let source = std::fs::read_to_string(path)?;
        Self::from_toml(&source)
    }

    pub fn from_toml(source: &str) -> Result<Self> {
        let config: RegistryConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }
}

impl Validate for RegistryConfig {
    fn validate(&self) -> Result<()> {
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(RegistryError::Config("storage.data_dir cannot be empty".into()));
        }
        if self.storage.namespace.trim().is_empty() {
            return Err(RegistryError::Config("storage.namespace cannot be empty".into()));
        }
        if self.sync.timeout_seconds == 0 {
            return Err(RegistryError::Config(
                "sync.timeout_seconds must be at least 1".into(),
            ));
        }
        if self.sync.retry_attempts == 0 {
            return Err(RegistryError::Config(
                "sync.retry_attempts must be at least 1".into(),
            ));
        }
        if self.report.output_dir.as_os_str().is_empty() {
            return Err(RegistryError::Config("report.output_dir cannot be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = RegistryConfig::from_toml("").expect("empty config parses");
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(config.storage.namespace, STORAGE_KEY);
        assert_eq!(config.sync.policy(), SyncPolicy::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = RegistryConfig::from_toml(
            r#"
[sync]
retry_attempts = 5
"#,
        )
        .expect("config parses");
        assert_eq!(config.sync.retry_attempts, 5);
        assert_eq!(config.sync.timeout_seconds, 10);
        assert_eq!(config.storage.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn zero_attempts_rejected() {
        let result = RegistryConfig::from_toml("[sync]\nretry_attempts = 0\n");
        assert!(matches!(result, Err(RegistryError::Config(_))));
    }
}
