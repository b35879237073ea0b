use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::constants::{DEFAULT_STORE_TIMEOUT_SECS, PLACEHOLDER_PHOTO};
use crate::error::{PortalError, Result};
use crate::processing::quality_gate::ImportPolicy;

pub const CONFIG_PATH: &str = "roster.toml";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the NDJSON child collections
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub import: ImportConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportConfig {
    pub placeholder_photo: String,
    pub policy: ImportPolicy,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            log_dir: PathBuf::from("logs"),
            import: ImportConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            placeholder_photo: PLACEHOLDER_PHOTO.to_string(),
            policy: ImportPolicy::Lenient,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_STORE_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load `roster.toml` (if present), then apply environment overrides.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        let mut config = Self::from_file(Path::new(CONFIG_PATH))?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            PortalError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Overrides: ROSTER_DATA_DIR, ROSTER_LOG_DIR, ROSTER_PLACEHOLDER_PHOTO,
    /// ROSTER_STORE_TIMEOUT_SECS, ROSTER_STRICT_IMPORT.
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = var("ROSTER_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("ROSTER_LOG_DIR") {
            self.log_dir = PathBuf::from(dir);
        }
        if let Some(photo) = var("ROSTER_PLACEHOLDER_PHOTO") {
            self.import.placeholder_photo = photo;
        }
        if let Some(secs) = var("ROSTER_STORE_TIMEOUT_SECS") {
            self.store.timeout_seconds = secs.trim().parse().map_err(|e| {
                PortalError::Config(format!("Invalid ROSTER_STORE_TIMEOUT_SECS '{}': {}", secs, e))
            })?;
        }
        if let Some(strict) = var("ROSTER_STRICT_IMPORT") {
            self.import.policy = match strict.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => ImportPolicy::Strict,
                "0" | "false" | "no" | "" => ImportPolicy::Lenient,
                other => {
                    return Err(PortalError::Config(format!(
                        "Invalid ROSTER_STRICT_IMPORT '{}'",
                        other
                    )))
                }
            };
        }
        if self.store.timeout_seconds == 0 {
            return Err(PortalError::Config("store timeout must be at least one second".to_string()));
        }
        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store.timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::from_file(&dir.path().join("roster.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.store_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.toml");
        fs::write(
            &path,
            "data_dir = \"/srv/roster\"\n\n[import]\npolicy = \"strict\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/roster"));
        assert_eq!(config.import.policy, ImportPolicy::Strict);
        assert_eq!(config.import.placeholder_photo, PLACEHOLDER_PHOTO);
        assert_eq!(config.store.timeout_seconds, DEFAULT_STORE_TIMEOUT_SECS);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("ROSTER_DATA_DIR", "/tmp/kids"),
            ("ROSTER_STORE_TIMEOUT_SECS", "30"),
            ("ROSTER_STRICT_IMPORT", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/kids"));
        assert_eq!(config.store.timeout_seconds, 30);
        assert_eq!(config.import.policy, ImportPolicy::Strict);
    }

    #[test]
    fn test_bad_env_values_are_errors() {
        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == "ROSTER_STORE_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, PortalError::Config(_)));

        let mut config = Config::default();
        assert!(config
            .apply_env(|key| (key == "ROSTER_STORE_TIMEOUT_SECS").then(|| "0".to_string()))
            .is_err());
    }
}
