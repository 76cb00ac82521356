use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use super::session::BayesSession;

/// Additive smoothing constant.
pub const LAPLACE_ALPHA: f64 = 1.0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BayesError {
    #[error("training dataset is empty")]
    EmptyDataset,
    #[error("training record {0} has an empty root cause")]
    BlankRootCause(usize),
}

/// One row of historical incident data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRecord {
    #[serde(alias = "RootCause")]
    pub root_cause: String,
    #[serde(alias = "EvidenceType")]
    pub evidence_type: String,
    #[serde(alias = "EvidenceValue")]
    pub evidence_value: String,
}

impl TrainingRecord {
    pub fn new(root_cause: &str, evidence_type: &str, evidence_value: &str) -> Self {
        Self {
            root_cause: root_cause.to_string(),
            evidence_type: evidence_type.to_string(),
            evidence_value: evidence_value.to_string(),
        }
    }
}

/// An observed `(type, value)` pair, e.g. `("alarm", "Heartbeat Loss")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Evidence {
    pub kind: String,
    pub value: String,
}

impl Evidence {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind, self.value)
    }
}

/// Priors and smoothed likelihoods learned from a dataset.
///
/// Causes are indexed in the order they first appear in the training data;
/// that order breaks ranking ties.
#[derive(Debug, Clone)]
pub struct BayesModel {
    causes: Vec<String>,
    priors: Vec<f64>,
    likelihoods: HashMap<Evidence, Vec<f64>>,
}

impl BayesModel {
    /// Learn priors and Laplace-smoothed likelihoods from `records`.
    ///
    /// `P(e | c) = (n(e, c) + 1) / (n(c) + V)`, where `V` is the number of
    /// distinct `(evidence_type, evidence_value)` pairs in the dataset, so the
    /// same value under two types counts twice. `V` is shared by every
    /// evidence type rather than taken per type.
    pub fn train(records: &[TrainingRecord]) -> Result<Self, BayesError> {
        if records.is_empty() {
            return Err(BayesError::EmptyDataset);
        }

        let mut causes: Vec<String> = Vec::new();
        let mut cause_index: HashMap<&str, usize> = HashMap::new();
        let mut cause_counts: Vec<f64> = Vec::new();
        let mut joint: HashMap<Evidence, Vec<f64>> = HashMap::new();

        for (row, record) in records.iter().enumerate() {
            let cause = record.root_cause.trim();
            if cause.is_empty() {
                return Err(BayesError::BlankRootCause(row));
            }
            let idx = *cause_index.entry(cause).or_insert_with(|| {
                causes.push(cause.to_string());
                cause_counts.push(0.0);
                causes.len() - 1
            });
            cause_counts[idx] += 1.0;

            let evidence = Evidence::new(record.evidence_type.trim(), record.evidence_value.trim());
            let counts = joint.entry(evidence).or_default();
            if counts.len() < causes.len() {
                counts.resize(causes.len(), 0.0);
            }
            counts[idx] += 1.0;
        }

        let total = records.len() as f64;
        let priors = cause_counts.iter().map(|n| n / total).collect();

        let vocabulary = joint.len() as f64;
        let likelihoods = joint
            .into_iter()
            .map(|(evidence, mut counts)| {
                counts.resize(causes.len(), 0.0);
                let smoothed = counts
                    .iter()
                    .zip(&cause_counts)
                    .map(|(n_ec, n_c)| (n_ec + LAPLACE_ALPHA) / (n_c + LAPLACE_ALPHA * vocabulary))
                    .collect();
                (evidence, smoothed)
            })
            .collect();

        tracing::info!(
            records = records.len(),
            causes = causes.len(),
            evidence_keys = vocabulary as usize,
            "trained bayesian model"
        );

        Ok(Self {
            causes,
            priors,
            likelihoods,
        })
    }

    /// Root-cause labels in training order.
    pub fn causes(&self) -> &[String] {
        &self.causes
    }

    pub fn priors(&self) -> &[f64] {
        &self.priors
    }

    pub fn prior(&self, cause: &str) -> Option<f64> {
        self.causes
            .iter()
            .position(|c| c == cause)
            .map(|idx| self.priors[idx])
    }

    /// P(evidence | cause) for every cause, or `None` for unseen evidence.
    pub fn likelihoods(&self, evidence: &Evidence) -> Option<&[f64]> {
        self.likelihoods.get(evidence).map(Vec::as_slice)
    }

    pub fn knows(&self, evidence: &Evidence) -> bool {
        self.likelihoods.contains_key(evidence)
    }

    /// Number of distinct evidence keys seen in training.
    pub fn vocabulary(&self) -> usize {
        self.likelihoods.len()
    }

    /// Start an investigation with posteriors equal to the priors.
    pub fn session(&self) -> BayesSession<'_> {
        BayesSession::new(self)
    }
}
