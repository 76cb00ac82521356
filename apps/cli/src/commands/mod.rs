pub mod analyze;
pub mod bayes;
pub mod scenarios;
pub mod simulate;
pub mod status;

pub use analyze::AnalyzeCommand;
pub use bayes::BayesCommand;
pub use scenarios::ScenariosCommand;
pub use simulate::SimulateCommand;
pub use status::StatusCommand;
