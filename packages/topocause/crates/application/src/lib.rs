pub mod analysis_service;
pub mod config;

pub use analysis_service::{analyze_fleet, AnalysisService, CycleReport, FleetEntry};
pub use config::{AppConfig, DataConfig};
