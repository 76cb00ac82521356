use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use domain::EngineConfig;

pub const CONFIG_ENV: &str = "TOPOCAUSE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "topocause.toml";

/// Service configuration: `[engine]`, `[engine.silent]` and `[data]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Root of the `<tenant>/networks/<network>/` tree.
    pub tenants_root: PathBuf,
    /// Historical incidents for the Bayesian engine.
    pub dataset: Option<PathBuf>,
    /// Scenario catalog replacing the built-in one.
    pub scenarios: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            tenants_root: PathBuf::from("tenants"),
            dataset: None,
            scenarios: None,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content).context("Failed to parse configuration")?;
        config.engine.validate().context("Invalid [engine] settings")?;
        Ok(config)
    }

    /// Load from `explicit`, else `$TOPOCAUSE_CONFIG`, else `./topocause.toml`.
    ///
    /// Only the implicit default file may be absent; it then yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => match std::env::var_os(CONFIG_ENV) {
                Some(value) => (PathBuf::from(value), true),
                None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
            },
        };

        if !path.exists() {
            if required {
                bail!("Configuration file {} does not exist", path.display());
            }
            tracing::info!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Resolve relative data paths against the directory of the config file.
    pub fn rebase(mut self, base: &Path) -> Self {
        let join = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        self.data.tenants_root = join(self.data.tenants_root);
        self.data.dataset = self.data.dataset.map(join);
        self.data.scenarios = self.data.scenarios.map(join);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
[engine]
root_cause_threshold = 0.85

[engine.silent]
min_affected = 3
patterns = ["connection lost"]

[data]
tenants_root = "/srv/noc/tenants"
dataset = "history.json"
"#,
        )
        .unwrap();

        assert_eq!(config.engine.root_cause_threshold, 0.85);
        assert_eq!(config.engine.secondary_confidence, 0.5);
        assert_eq!(config.engine.silent.min_affected, 3);
        assert_eq!(config.engine.silent.min_ratio, 0.5);
        assert_eq!(config.data.tenants_root, PathBuf::from("/srv/noc/tenants"));
        assert_eq!(config.data.dataset, Some(PathBuf::from("history.json")));
    }

    #[test]
    fn test_invalid_engine_rejected() {
        let err = AppConfig::from_toml_str("[engine]\nsecondary_confidence = 0.9\n").unwrap_err();
        assert!(format!("{err:#}").contains("secondary_confidence"));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        assert!(AppConfig::load(Some(&tmp.path().join("nope.toml"))).is_err());

        let path = tmp.path().join("topocause.toml");
        fs::write(&path, "[data]\ntenants_root = \"t\"\n").unwrap();
        let config = AppConfig::load(Some(&path)).unwrap().rebase(tmp.path());
        assert_eq!(config.data.tenants_root, tmp.path().join("t"));
    }
}
