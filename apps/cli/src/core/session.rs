use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use topocause::application::AppConfig;
use topocause::domain::{Alarm, BayesModel, ScenarioCatalog, Topology};
use topocause::infrastructure::{load_alarms, load_dataset, load_scenarios, load_topology};

use super::CliError;

/// Per-invocation state shared by every command.
pub struct Session {
    pub config: AppConfig,
    pub json: bool,
}

impl Session {
    pub fn load(config_path: Option<&Path>, json: bool) -> Result<Self> {
        let config = AppConfig::load(config_path).map_err(|e| CliError::Config(format!("{e:#}")))?;
        // data paths in an explicit config file are relative to that file
        let config = match config_path.and_then(Path::parent) {
            Some(base) if !base.as_os_str().is_empty() => config.rebase(base),
            _ => config,
        };
        Ok(Self { config, json })
    }

    pub fn topology(&self, path: &Path) -> Result<Topology> {
        Ok(load_topology(path).map_err(|e| CliError::Input(format!("{e:#}")))?)
    }

    pub fn alarms(&self, path: &Path) -> Result<Vec<Alarm>> {
        Ok(load_alarms(path).map_err(|e| CliError::Input(format!("{e:#}")))?)
    }

    /// The `[data] scenarios` catalog, or the built-in one.
    pub fn catalog(&self) -> Result<ScenarioCatalog> {
        match &self.config.data.scenarios {
            Some(path) => Ok(load_scenarios(path).map_err(|e| CliError::Input(format!("{e:#}")))?),
            None => Ok(ScenarioCatalog::builtin()),
        }
    }

    pub fn dataset_path(&self, explicit: Option<&Path>) -> Option<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.config.data.dataset.clone())
    }

    /// Train on `explicit`, else on `[data] dataset`; `None` when neither is set.
    pub fn bayes_model(&self, explicit: Option<&Path>) -> Result<Option<Arc<BayesModel>>> {
        let Some(path) = self.dataset_path(explicit) else {
            return Ok(None);
        };
        let records = load_dataset(&path).map_err(|e| CliError::Input(format!("{e:#}")))?;
        let model = BayesModel::train(&records)
            .map_err(|e| CliError::Input(format!("{}: {e}", path.display())))?;
        tracing::info!(
            path = %path.display(),
            causes = model.causes().len(),
            evidence = model.vocabulary(),
            "bayesian model trained"
        );
        Ok(Some(Arc::new(model)))
    }

    pub fn emit_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}
