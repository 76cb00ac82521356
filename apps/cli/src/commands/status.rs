use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use topocause::application::{analyze_fleet, FleetEntry};
use topocause::domain::CycleStatus;
use topocause::infrastructure::TenantRegistry;

use crate::core::Session;
use crate::ui::{self, table, Icon, Theme};

#[derive(Parser, Debug)]
pub struct StatusCommand {
    /// Tenants directory (defaults to `[data] tenants_root`)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Also rank with the Bayesian engine trained on this dataset
    #[arg(short, long)]
    pub dataset: Option<PathBuf>,
}

impl StatusCommand {
    pub async fn execute(self, session: &Session) -> Result<()> {
        let root = self
            .root
            .unwrap_or_else(|| session.config.data.tenants_root.clone());
        let registry = TenantRegistry::new(&root);
        let bayes = session.bayes_model(self.dataset.as_deref())?;

        let entries = analyze_fleet(registry, session.config.engine.clone(), bayes).await?;

        if session.json {
            return session.emit_json(&entries);
        }

        if entries.is_empty() {
            ui::info(format!("No tenant networks under {}.", root.display()));
            return Ok(());
        }

        let worst = entries
            .iter()
            .filter_map(|entry| match entry {
                FleetEntry::Report(report) => Some(report.status),
                FleetEntry::Failed { .. } => None,
            })
            .max()
            .unwrap_or(CycleStatus::Normal);
        ui::heading(
            Icon::Network,
            format!("{} network(s), worst status {}", entries.len(), Theme::status(worst)),
        );
        println!("{}", table::fleet(&entries));

        for entry in &entries {
            if let FleetEntry::Report(report) = entry {
                if let Some(error) = &report.reload_error {
                    ui::warn(format!(
                        "{}/{}: topology reload failed, analyzed previous snapshot: {error}",
                        report.tenant, report.network
                    ));
                }
            }
        }
        Ok(())
    }
}
