use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must lie within [0, 1], got {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("inconsistent thresholds: {0}")]
    Inconsistent(String),
    #[error("silent-failure detection needs at least one connection-loss pattern")]
    NoPatterns,
}

/// Tunables of the rule-based engine.
///
/// Immutable once an engine is built from it; every tenant gets its own copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Confidence strictly above which a candidate is a confirmed root cause.
    pub root_cause_threshold: f64,
    /// Confidence given to propagated (secondary / unreachable) impact.
    pub secondary_confidence: f64,
    /// Cap for degraded-but-serving devices in a partially alarmed redundancy set.
    pub warning_ceiling: f64,
    /// Floor for members of a redundancy group whose every member is alarmed.
    pub critical_floor: f64,
    /// Added per corroborating alarm beyond the first on the same device.
    pub corroboration_bonus: f64,
    /// Confidence of alarms that match no signature.
    pub unknown_confidence: f64,
    pub silent: SilentConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root_cause_threshold: 0.8,
            secondary_confidence: 0.5,
            warning_ceiling: 0.8,
            critical_floor: 0.95,
            corroboration_bonus: 0.02,
            unknown_confidence: 0.3,
            silent: SilentConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilentConfig {
    /// Absolute floor of affected children.
    pub min_affected: usize,
    /// Floor of affected children over all children of the parent.
    pub min_ratio: f64,
    pub confidence_floor: f64,
    pub confidence_ceiling: f64,
    /// Cap applied to affected children of a confirmed silent parent.
    pub symptom_cap: f64,
    /// Lower-case substrings marking a child as cut off.
    pub patterns: Vec<String>,
}

impl Default for SilentConfig {
    fn default() -> Self {
        Self {
            min_affected: 2,
            min_ratio: 0.5,
            confidence_floor: 0.8,
            confidence_ceiling: 0.99,
            symptom_cap: 0.4,
            patterns: ["connection lost", "link down", "port down", "unreachable", "interface down"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit_fields = [
            ("root_cause_threshold", self.root_cause_threshold),
            ("secondary_confidence", self.secondary_confidence),
            ("warning_ceiling", self.warning_ceiling),
            ("critical_floor", self.critical_floor),
            ("corroboration_bonus", self.corroboration_bonus),
            ("unknown_confidence", self.unknown_confidence),
            ("silent.min_ratio", self.silent.min_ratio),
            ("silent.confidence_floor", self.silent.confidence_floor),
            ("silent.confidence_ceiling", self.silent.confidence_ceiling),
            ("silent.symptom_cap", self.silent.symptom_cap),
        ];
        for (field, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }

        if self.secondary_confidence > self.root_cause_threshold {
            return Err(ConfigError::Inconsistent(
                "secondary_confidence exceeds root_cause_threshold".into(),
            ));
        }
        if self.warning_ceiling > self.root_cause_threshold {
            return Err(ConfigError::Inconsistent(
                "warning_ceiling exceeds root_cause_threshold".into(),
            ));
        }
        if self.critical_floor <= self.root_cause_threshold {
            return Err(ConfigError::Inconsistent(
                "critical_floor must exceed root_cause_threshold".into(),
            ));
        }
        if self.silent.confidence_floor > self.silent.confidence_ceiling {
            return Err(ConfigError::Inconsistent(
                "silent.confidence_floor exceeds silent.confidence_ceiling".into(),
            ));
        }
        if self.silent.min_affected == 0 {
            return Err(ConfigError::Inconsistent("silent.min_affected must be >= 1".into()));
        }
        if self.silent.patterns.iter().all(|p| p.trim().is_empty()) {
            return Err(ConfigError::NoPatterns);
        }
        Ok(())
    }
}
