pub mod alarm;
pub mod bayes;
pub mod candidate;
pub mod cascade;
pub mod inference;
pub mod scenario;
pub mod status;
pub mod strategy;
pub mod topology;

pub use alarm::{Alarm, AlarmBatch, AlarmError, AlarmRecord, Severity};
pub use bayes::{BayesError, BayesModel, BayesSession, Evidence, TrainingRecord};
pub use candidate::{Candidate, CandidateKind, CandidateRole, CandidateSet};
pub use cascade::{simulate_cascade, SimulationError, DEFAULT_CASCADE_MESSAGE};
pub use inference::{classify, ConfigError, EngineConfig, LogicalEngine, SignatureTable};
pub use scenario::{Scenario, ScenarioCatalog, ScenarioError};
pub use status::CycleStatus;
pub use strategy::RootCauseStrategy;
pub use topology::{DeviceNode, DeviceRecord, DeviceType, Topology, TopologyError};
