use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use topocause::domain::{Candidate, CycleStatus, LogicalEngine, RootCauseStrategy};

use crate::core::{CliError, Session};
use crate::ui::{self, table, Icon, Theme};

#[derive(Parser, Debug)]
pub struct AnalyzeCommand {
    /// Topology file (.json, .yaml or .toml)
    #[arg(short, long)]
    pub topology: PathBuf,

    /// Alarm file for this cycle
    #[arg(short, long)]
    pub alarms: PathBuf,

    /// Also rank with the Bayesian engine trained on this dataset
    #[arg(short, long)]
    pub dataset: Option<PathBuf>,

    /// List the evidence behind every candidate
    #[arg(short, long)]
    pub evidence: bool,
}

#[derive(Serialize)]
struct AnalysisOutput<'a> {
    status: CycleStatus,
    candidates: &'a [Candidate],
    #[serde(skip_serializing_if = "Option::is_none")]
    alternative: Option<&'a [Candidate]>,
}

impl AnalyzeCommand {
    pub fn execute(self, session: &Session) -> Result<()> {
        let topology = session.topology(&self.topology)?;
        let alarms = session.alarms(&self.alarms)?;

        let engine = LogicalEngine::new(Arc::new(topology), session.config.engine.clone())
            .map_err(|e| CliError::Config(e.to_string()))?;
        let ranked = engine.rank(&alarms);
        let status = CycleStatus::assess(&ranked, engine.config());

        let alternative = session
            .bayes_model(self.dataset.as_deref())?
            .map(|model| model.rank(&alarms));

        if session.json {
            return session.emit_json(&AnalysisOutput {
                status,
                candidates: &ranked,
                alternative: alternative.as_deref(),
            });
        }

        ui::heading(
            Icon::Network,
            format!(
                "{} alarm(s) on {} device(s)",
                alarms.len(),
                engine.topology().len()
            ),
        );
        println!("{} Status: {}", Icon::for_status(status), Theme::status(status));
        if let Some(top) = ranked.first() {
            ui::verdict(top);
        }
        println!("{}", table::candidates(&ranked, &session.config.engine, self.evidence));

        if let Some(alternative) = alternative {
            ui::heading(Icon::Info, "Bayesian alternative");
            println!("{}", table::candidates(&alternative, &session.config.engine, self.evidence));
        }
        Ok(())
    }
}
