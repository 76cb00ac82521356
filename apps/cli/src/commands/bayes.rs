use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use topocause::domain::bayes::EvidenceUpdate;
use topocause::domain::strategy::ALARM_EVIDENCE;
use topocause::domain::Candidate;

use crate::core::{CliError, Session};
use crate::ui::{self, table, Icon, Theme};

#[derive(Parser, Debug)]
pub struct BayesCommand {
    /// Historical incident dataset (defaults to `[data] dataset`)
    #[arg(short, long)]
    pub dataset: Option<PathBuf>,

    /// Evidence as TYPE=VALUE, applied in order
    #[arg(short, long = "evidence", value_parser = parse_evidence)]
    pub evidence: Vec<(String, String)>,

    /// Apply every alarm message in this file as `alarm` evidence
    #[arg(short, long)]
    pub alarms: Option<PathBuf>,
}

#[derive(Serialize)]
struct PosteriorRow<'a> {
    root_cause: &'a str,
    posterior: f64,
}

#[derive(Serialize)]
struct BayesOutput<'a> {
    applied: Vec<String>,
    skipped: Vec<String>,
    posteriors: Vec<PosteriorRow<'a>>,
    ranking: Vec<Candidate>,
}

fn parse_evidence(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((kind, value)) if !kind.trim().is_empty() && !value.trim().is_empty() => {
            Ok((kind.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected TYPE=VALUE, got '{raw}'")),
    }
}

impl BayesCommand {
    pub fn execute(self, session: &Session) -> Result<()> {
        let model = session.bayes_model(self.dataset.as_deref())?.ok_or_else(|| {
            CliError::Config("no dataset given; pass --dataset or set [data] dataset".into())
        })?;

        let mut pairs = self.evidence;
        if let Some(path) = &self.alarms {
            for alarm in session.alarms(path)? {
                pairs.push((ALARM_EVIDENCE.to_string(), alarm.message));
            }
        }

        let mut posterior = model.session();
        let mut applied = Vec::new();
        let mut skipped = Vec::new();
        for (kind, value) in &pairs {
            let label = format!("{kind}={value}");
            match posterior.update_evidence(kind, value) {
                EvidenceUpdate::Applied => applied.push(label),
                EvidenceUpdate::Unknown | EvidenceUpdate::Duplicate => skipped.push(label),
            }
        }

        let posteriors = posterior.posteriors();
        if session.json {
            return session.emit_json(&BayesOutput {
                applied,
                skipped,
                posteriors: posteriors
                    .iter()
                    .map(|(root_cause, p)| PosteriorRow {
                        root_cause,
                        posterior: *p,
                    })
                    .collect(),
                ranking: posterior.ranking(),
            });
        }

        ui::heading(
            Icon::Info,
            format!(
                "{} root cause(s), {} evidence key(s) learned",
                model.causes().len(),
                model.vocabulary()
            ),
        );
        for label in &applied {
            println!("  {} {}", Theme::success(Icon::Check), Theme::secondary(label));
        }
        for label in &skipped {
            println!("  {} {} {}", Theme::muted(Icon::Cross), label, Theme::muted("(skipped)"));
        }
        if pairs.is_empty() {
            ui::info("No evidence given; showing priors.");
        }
        println!("{}", table::posteriors(&posteriors));

        let ranking = posterior.ranking();
        if let Some(top) = ranking.first() {
            println!(
                "{} Most likely: {} {}",
                Icon::Root,
                Theme::primary(&top.device_id),
                Theme::bold(format!("{} ({:.1}%)", top.kind, top.confidence * 100.0))
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_evidence() {
        assert_eq!(
            parse_evidence("alarm = Fan Fail").unwrap(),
            ("alarm".to_string(), "Fan Fail".to_string())
        );
        assert!(parse_evidence("Fan Fail").is_err());
        assert!(parse_evidence("alarm=").is_err());
    }
}
