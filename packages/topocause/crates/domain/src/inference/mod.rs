//! Rule-based inference: signatures, redundancy, silent failures, propagation.

pub mod classifier;
pub mod config;
pub mod engine;
pub mod propagation;
pub mod signatures;
pub mod silent;

pub use classifier::{Classifier, Redundancy};
pub use config::{ConfigError, EngineConfig, SilentConfig};
pub use engine::LogicalEngine;
pub use propagation::ImpactPropagator;
pub use signatures::{KeywordRule, Signature, SignatureMatch, SignatureTable};
pub use silent::{SilentDetector, SilentFinding};

use crate::alarm::{Alarm, AlarmBatch};
use crate::candidate::{Candidate, CandidateSet};
use crate::topology::Topology;

/// Classify a batch with default tunables and signatures, without silent
/// detection or propagation.
pub fn classify(alarms: &[Alarm], topology: &Topology) -> Vec<Candidate> {
    let config = EngineConfig::default();
    let signatures = SignatureTable::default();
    let batch = AlarmBatch::ingest(alarms);
    let mut set = CandidateSet::new();
    Classifier::new(&config, &signatures).classify(&batch, topology, &mut set);
    set.into_ranked()
}
