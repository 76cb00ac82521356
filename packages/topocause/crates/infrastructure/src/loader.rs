//! File loaders for topology, alarm, dataset and scenario documents.
//!
//! The format follows the file extension: `.json`, `.yaml`/`.yml` or `.toml`.

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use domain::bayes::TrainingRecord;
use domain::scenario::{ScenarioCatalog, ScenarioFile};
use domain::topology::DeviceRecord;
use domain::{Alarm, AlarmRecord, Topology};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
    Toml,
}

impl Format {
    pub const EXTENSIONS: [&'static str; 4] = ["json", "yaml", "yml", "toml"];

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            "toml" => Ok(Format::Toml),
            _ => bail!(
                "Unsupported file extension for {} (expected .json, .yaml, .yml or .toml)",
                path.display()
            ),
        }
    }

    pub fn decode<T: DeserializeOwned>(self, content: &str) -> Result<T> {
        match self {
            Format::Json => serde_json::from_str(content).context("Failed to parse JSON"),
            Format::Yaml => serde_yaml::from_str(content).context("Failed to parse YAML"),
            Format::Toml => toml::from_str(content).context("Failed to parse TOML"),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => write!(f, "json"),
            Format::Yaml => write!(f, "yaml"),
            Format::Toml => write!(f, "toml"),
        }
    }
}

fn read(path: &Path) -> Result<(String, Format)> {
    let format = Format::from_path(path)?;
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok((content, format))
}

// TOML has no top-level arrays, so list documents live under a named table array.

#[derive(Deserialize)]
struct AlarmTable {
    #[serde(default)]
    alarm: Vec<AlarmRecord>,
}

#[derive(Deserialize)]
struct DatasetTable {
    #[serde(default)]
    record: Vec<TrainingRecord>,
}

pub fn parse_topology(content: &str, format: Format) -> Result<Topology> {
    let records: BTreeMap<String, DeviceRecord> = format.decode(content)?;
    let topology = Topology::from_records(records)?;
    Ok(topology)
}

pub fn load_topology(path: &Path) -> Result<Topology> {
    let (content, format) = read(path)?;
    let topology = parse_topology(&content, format)
        .with_context(|| format!("Invalid topology in {}", path.display()))?;
    tracing::debug!(path = %path.display(), devices = topology.len(), "loaded topology");
    Ok(topology)
}

pub fn parse_alarms(content: &str, format: Format) -> Result<Vec<Alarm>> {
    let records: Vec<AlarmRecord> = match format {
        Format::Toml => format.decode::<AlarmTable>(content)?.alarm,
        _ => format.decode(content)?,
    };
    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| Alarm::try_from(record).with_context(|| format!("alarm #{}", i + 1)))
        .collect()
}

pub fn load_alarms(path: &Path) -> Result<Vec<Alarm>> {
    let (content, format) = read(path)?;
    let alarms = parse_alarms(&content, format)
        .with_context(|| format!("Invalid alarms in {}", path.display()))?;
    tracing::debug!(path = %path.display(), alarms = alarms.len(), "loaded alarms");
    Ok(alarms)
}

pub fn parse_dataset(content: &str, format: Format) -> Result<Vec<TrainingRecord>> {
    match format {
        Format::Toml => Ok(format.decode::<DatasetTable>(content)?.record),
        _ => format.decode(content),
    }
}

pub fn load_dataset(path: &Path) -> Result<Vec<TrainingRecord>> {
    let (content, format) = read(path)?;
    parse_dataset(&content, format)
        .with_context(|| format!("Invalid training dataset in {}", path.display()))
}

pub fn load_scenarios(path: &Path) -> Result<ScenarioCatalog> {
    let (content, format) = read(path)?;
    let file: ScenarioFile = format
        .decode(&content)
        .with_context(|| format!("Invalid scenario file {}", path.display()))?;
    let catalog = ScenarioCatalog::new(file.scenarios)
        .with_context(|| format!("Invalid scenario file {}", path.display()))?;
    Ok(catalog)
}
