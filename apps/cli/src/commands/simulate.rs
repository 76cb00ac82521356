use anyhow::Result;
use clap::{ArgGroup, Parser};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use topocause::domain::scenario::generate_alarms;
use topocause::domain::{
    simulate_cascade, Alarm, Candidate, CycleStatus, LogicalEngine, SimulationError,
    DEFAULT_CASCADE_MESSAGE,
};

use crate::core::{CliError, Session};
use crate::ui::{self, table, Icon, Theme};

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["root", "scenario"])))]
pub struct SimulateCommand {
    /// Topology file (.json, .yaml or .toml)
    #[arg(short, long)]
    pub topology: PathBuf,

    /// Device whose outage cascades down the tree
    #[arg(long)]
    pub root: Option<String>,

    /// Scenario id from the catalog
    #[arg(long)]
    pub scenario: Option<String>,

    /// Pin the scenario to this device instead of resolving its target hints
    #[arg(long, requires = "scenario")]
    pub target: Option<String>,

    /// Alarm message raised at the cascade root
    #[arg(long, default_value = DEFAULT_CASCADE_MESSAGE)]
    pub message: String,

    /// Feed the generated alarms through the rule-based engine
    #[arg(long)]
    pub analyze: bool,
}

#[derive(Serialize)]
struct SimulationOutput<'a> {
    alarms: &'a [Alarm],
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<CycleStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    candidates: Option<&'a [Candidate]>,
}

impl SimulateCommand {
    pub fn execute(self, session: &Session) -> Result<()> {
        let topology = session.topology(&self.topology)?;

        let alarms = match (&self.root, &self.scenario) {
            (Some(root), _) => simulate_cascade(root, &topology, &self.message).map_err(unknown_device)?,
            (None, Some(id)) => {
                let catalog = session.catalog()?;
                let scenario = catalog
                    .get(id)
                    .ok_or_else(|| CliError::UnknownScenario(id.clone()))?;
                generate_alarms(scenario, &topology, self.target.as_deref()).map_err(unknown_device)?
            }
            (None, None) => return Err(CliError::Input("either --root or --scenario is required".into()).into()),
        };

        let analysis = if self.analyze {
            let engine = LogicalEngine::new(Arc::new(topology), session.config.engine.clone())
                .map_err(|e| CliError::Config(e.to_string()))?;
            let ranked = engine.analyze(&alarms);
            let status = CycleStatus::assess(&ranked, engine.config());
            Some((status, ranked))
        } else {
            None
        };

        if session.json {
            return session.emit_json(&SimulationOutput {
                alarms: &alarms,
                status: analysis.as_ref().map(|(status, _)| *status),
                candidates: analysis.as_ref().map(|(_, ranked)| ranked.as_slice()),
            });
        }

        let origin = match (&self.root, &self.scenario) {
            (Some(root), _) => format!("outage at {}", Theme::primary(root)),
            (None, Some(id)) => format!("scenario {}", Theme::secondary(id)),
            (None, None) => String::new(),
        };
        ui::heading(Icon::Scenario, format!("Simulated {origin}: {} alarm(s)", alarms.len()));
        if alarms.is_empty() {
            ui::info("The scenario produces no alarms on this topology.");
        } else {
            println!("{}", table::alarms(&alarms));
        }

        if let Some((status, ranked)) = analysis {
            ui::heading(Icon::for_status(status), format!("Status: {}", Theme::status(status)));
            if let Some(top) = ranked.first() {
                ui::verdict(top);
            }
            println!("{}", table::candidates(&ranked, &session.config.engine, false));
        }
        Ok(())
    }
}

fn unknown_device(err: SimulationError) -> CliError {
    match err {
        SimulationError::UnknownRoot(id) => CliError::UnknownDevice(id),
    }
}
