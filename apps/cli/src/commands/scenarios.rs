use anyhow::Result;
use clap::{Parser, Subcommand};

use topocause::domain::scenario::{ImpactScope, Scenario};
use topocause::domain::Severity;

use crate::core::{CliError, Session};
use crate::ui::{self, table, Icon, Theme};

#[derive(Parser, Debug)]
pub struct ScenariosCommand {
    #[command(subcommand)]
    pub action: ScenarioAction,
}

#[derive(Subcommand, Debug)]
pub enum ScenarioAction {
    /// List the catalog, optionally filtered
    List {
        /// CRITICAL, WARNING or INFO
        #[arg(long, value_parser = parse_severity)]
        severity: Option<Severity>,
        /// single, cascade, multi or silent
        #[arg(long, value_parser = parse_scope)]
        scope: Option<ImpactScope>,
    },
    /// Rank scenarios against a free-text query
    Search {
        query: String,
        #[arg(short = 'k', long, default_value_t = 5)]
        top: usize,
    },
    /// Show one scenario in full
    Show { id: String },
}

fn parse_severity(raw: &str) -> Result<Severity, String> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "CRITICAL" => Ok(Severity::Critical),
        "WARNING" => Ok(Severity::Warning),
        "INFO" => Ok(Severity::Info),
        _ => Err(format!("unknown severity '{raw}'")),
    }
}

fn parse_scope(raw: &str) -> Result<ImpactScope, String> {
    ImpactScope::parse(raw).ok_or_else(|| format!("unknown impact scope '{raw}'"))
}

impl ScenariosCommand {
    pub fn execute(self, session: &Session) -> Result<()> {
        let catalog = session.catalog()?;

        match self.action {
            ScenarioAction::List { severity, scope } => {
                let listed: Vec<&Scenario> = catalog
                    .iter()
                    .filter(|s| severity.map_or(true, |sev| s.severity == sev))
                    .filter(|s| scope.map_or(true, |sc| s.impact_scope == sc))
                    .collect();
                if session.json {
                    return session.emit_json(&listed);
                }
                ui::heading(Icon::Scenario, format!("{} scenario(s)", listed.len()));
                println!("{}", table::scenarios(listed.into_iter().map(|s| (s, None))));
            }
            ScenarioAction::Search { query, top } => {
                let hits = catalog.search(&query, top);
                if session.json {
                    let rows: Vec<serde_json::Value> = hits
                        .iter()
                        .map(|(s, score)| serde_json::json!({ "id": s.id, "name": s.name, "score": score }))
                        .collect();
                    return session.emit_json(&rows);
                }
                if hits.is_empty() {
                    ui::info(format!("No scenario matches '{query}'."));
                    return Ok(());
                }
                println!("{}", table::scenarios(hits.into_iter().map(|(s, score)| (s, Some(score)))));
            }
            ScenarioAction::Show { id } => {
                let scenario = catalog
                    .get(&id)
                    .ok_or_else(|| CliError::UnknownScenario(id.clone()))?;
                if session.json {
                    return session.emit_json(scenario);
                }
                show(scenario);
            }
        }
        Ok(())
    }
}

fn show(scenario: &Scenario) {
    ui::heading(Icon::Scenario, format!("{} ({})", scenario.name, Theme::secondary(&scenario.id)));
    println!("  {}", scenario.description);
    println!(
        "  scope: {}  severity: {}",
        Theme::bold(scenario.impact_scope),
        Theme::severity(scenario.severity)
    );
    let lists = [
        ("symptoms", &scenario.symptoms),
        ("services", &scenario.affected_services),
        ("tags", &scenario.tags),
    ];
    for (name, values) in lists {
        if !values.is_empty() {
            println!("  {}: {}", Theme::muted(name), values.join(", "));
        }
    }
    if let Some(sop) = &scenario.related_sop {
        println!("  {}: {}", Theme::muted("sop"), sop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_parsers() {
        assert_eq!(parse_severity("critical"), Ok(Severity::Critical));
        assert!(parse_severity("major").is_err());
        assert_eq!(parse_scope("SILENT"), Ok(ImpactScope::Silent));
    }
}
