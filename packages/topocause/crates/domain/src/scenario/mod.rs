//! Named failure scenarios and the alarms they produce.

mod catalog;
mod generator;

pub use catalog::{
    AlarmTemplate, Fault, ImpactScope, Scenario, ScenarioCatalog, ScenarioError, ScenarioFile,
    TargetHints,
};
pub use generator::generate_alarms;
