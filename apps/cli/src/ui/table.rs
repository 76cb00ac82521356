use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use topocause::application::FleetEntry;
use topocause::domain::scenario::Scenario;
use topocause::domain::{Alarm, Candidate, CandidateRole, CycleStatus, EngineConfig, Severity};

fn base(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn confidence_cell(confidence: f64, config: &EngineConfig) -> Cell {
    let color = if confidence > config.root_cause_threshold {
        Color::Red
    } else if confidence >= config.secondary_confidence {
        Color::Yellow
    } else {
        Color::DarkGrey
    };
    Cell::new(format!("{confidence:.2}"))
        .fg(color)
        .set_alignment(CellAlignment::Right)
}

fn role_cell(role: CandidateRole) -> Cell {
    match role {
        CandidateRole::Cause => Cell::new("cause").add_attribute(Attribute::Bold),
        CandidateRole::Impact => Cell::new("impact").fg(Color::DarkGrey),
        CandidateRole::Unclassified => Cell::new("unclassified").fg(Color::Magenta),
        CandidateRole::Normal => Cell::new("normal").fg(Color::Green),
    }
}

fn severity_cell(severity: Severity) -> Cell {
    let color = match severity {
        Severity::Critical => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Info => Color::DarkGrey,
    };
    Cell::new(severity).fg(color)
}

/// Ranked candidates, one row each; evidence is listed under the label.
pub fn candidates(ranked: &[Candidate], config: &EngineConfig, with_evidence: bool) -> Table {
    let mut table = base(vec!["#", "Device", "Type", "Role", "Confidence", "Label"]);
    for (i, candidate) in ranked.iter().enumerate() {
        let mut label = candidate.label.clone();
        if with_evidence {
            for line in &candidate.evidence {
                label.push_str("\n  ");
                label.push_str(line);
            }
        }
        table.add_row(vec![
            Cell::new(i + 1).set_alignment(CellAlignment::Right),
            Cell::new(&candidate.device_id),
            Cell::new(candidate.kind.tag()),
            role_cell(candidate.role()),
            confidence_cell(candidate.confidence, config),
            Cell::new(label),
        ]);
    }
    table
}

pub fn alarms(alarms: &[Alarm]) -> Table {
    let mut table = base(vec!["#", "Device", "Severity", "Message"]);
    for (i, alarm) in alarms.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1).set_alignment(CellAlignment::Right),
            Cell::new(&alarm.device_id),
            severity_cell(alarm.severity),
            Cell::new(&alarm.message),
        ]);
    }
    table
}

pub fn posteriors(posteriors: &[(&str, f64)]) -> Table {
    let mut table = base(vec!["Root cause", "Posterior"]);
    for (cause, posterior) in posteriors {
        table.add_row(vec![
            Cell::new(cause),
            Cell::new(format!("{posterior:.4}")).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn scenarios<'a>(rows: impl IntoIterator<Item = (&'a Scenario, Option<f64>)>) -> Table {
    let mut table = base(vec!["Id", "Name", "Scope", "Severity", "Score"]);
    for (scenario, score) in rows {
        table.add_row(vec![
            Cell::new(&scenario.id).add_attribute(Attribute::Bold),
            Cell::new(&scenario.name),
            Cell::new(scenario.impact_scope.as_str()),
            severity_cell(scenario.severity),
            Cell::new(score.map(|s| format!("{s:.1}")).unwrap_or_default()),
        ]);
    }
    table
}

pub fn fleet(entries: &[FleetEntry]) -> Table {
    let mut table = base(vec!["Tenant", "Network", "Status", "Top candidate", "Confidence"]);
    for entry in entries {
        match entry {
            FleetEntry::Report(report) => {
                let top = report.candidates.first();
                let status_color = match report.status {
                    CycleStatus::Down => Color::Red,
                    CycleStatus::ActionRequired => Color::Yellow,
                    CycleStatus::Caution => Color::Magenta,
                    CycleStatus::Normal => Color::Green,
                };
                let mut status = report.status.to_string();
                if report.reload_error.is_some() {
                    status.push_str(" (stale topology)");
                }
                table.add_row(vec![
                    Cell::new(&report.tenant),
                    Cell::new(&report.network),
                    Cell::new(status).fg(status_color).add_attribute(Attribute::Bold),
                    Cell::new(
                        top.map(|c| format!("{} {}", c.device_id, c.kind.tag()))
                            .unwrap_or_default(),
                    ),
                    Cell::new(top.map(|c| format!("{:.2}", c.confidence)).unwrap_or_default())
                        .set_alignment(CellAlignment::Right),
                ]);
            }
            FleetEntry::Failed { tenant, network, error } => {
                table.add_row(vec![
                    Cell::new(tenant),
                    Cell::new(network),
                    Cell::new("Failed").fg(Color::Red).add_attribute(Attribute::Bold),
                    Cell::new(error),
                    Cell::new(""),
                ]);
            }
        }
    }
    table
}
