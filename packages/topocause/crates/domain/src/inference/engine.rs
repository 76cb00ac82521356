use std::sync::Arc;

use crate::alarm::{Alarm, AlarmBatch};
use crate::candidate::{Candidate, CandidateSet};
use crate::topology::Topology;

use super::classifier::Classifier;
use super::config::{ConfigError, EngineConfig};
use super::propagation::ImpactPropagator;
use super::signatures::SignatureTable;
use super::silent::SilentDetector;

/// Rule-based root-cause engine bound to one topology snapshot.
///
/// Holds no per-cycle state: `analyze` can be called repeatedly and from
/// several threads on the same instance.
#[derive(Debug, Clone)]
pub struct LogicalEngine {
    topology: Arc<Topology>,
    config: EngineConfig,
    signatures: SignatureTable,
}

impl LogicalEngine {
    pub fn new(topology: Arc<Topology>, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            topology,
            config,
            signatures: SignatureTable::default(),
        })
    }

    pub fn with_signatures(mut self, signatures: SignatureTable) -> Self {
        self.signatures = signatures;
        self
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Signature classification only, ranked.
    pub fn classify(&self, alarms: &[Alarm]) -> Vec<Candidate> {
        let batch = AlarmBatch::ingest(alarms);
        let mut set = CandidateSet::new();
        Classifier::new(&self.config, &self.signatures).classify(&batch, &self.topology, &mut set);
        set.into_ranked()
    }

    /// Classification, silent-failure detection and impact propagation.
    ///
    /// Never empty: a quiet cycle yields the single `Normal` sentinel.
    pub fn analyze(&self, alarms: &[Alarm]) -> Vec<Candidate> {
        let batch = AlarmBatch::ingest(alarms);
        let mut set = CandidateSet::new();

        Classifier::new(&self.config, &self.signatures).classify(&batch, &self.topology, &mut set);
        SilentDetector::new(&self.config.silent).detect(&batch, &self.topology, &mut set);
        ImpactPropagator::new(self.config.root_cause_threshold, self.config.secondary_confidence)
            .propagate(&mut set, &self.topology);

        let ranked = set.into_ranked();
        tracing::info!(
            alarms = alarms.len(),
            devices = batch.len(),
            candidates = ranked.len(),
            top = ranked.first().map(|c| c.device_id.as_str()).unwrap_or_default(),
            "analysis complete"
        );
        ranked
    }
}
