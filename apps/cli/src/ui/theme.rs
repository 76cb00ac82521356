use owo_colors::OwoColorize;
use std::fmt;

use topocause::domain::{CycleStatus, Severity};

/// The central theme definition for the topocause CLI.
/// Defines the official color palette and iconography.
pub struct Theme;

impl Theme {
    /// Primary "Topology" Color (Cyan) - Devices, structure.
    pub fn primary(text: impl fmt::Display) -> String {
        format!("{}", text.cyan().bold())
    }

    pub fn bold(text: impl fmt::Display) -> String {
        format!("{}", text.bold())
    }

    /// Secondary Color (Magenta) - Scenario ids, evidence keys.
    pub fn secondary(text: impl fmt::Display) -> String {
        format!("{}", text.magenta().bold())
    }

    pub fn success(text: impl fmt::Display) -> String {
        format!("{}", text.green().bold())
    }

    pub fn warning(text: impl fmt::Display) -> String {
        format!("{}", text.yellow().bold())
    }

    pub fn error(text: impl fmt::Display) -> String {
        format!("{}", text.red().bold())
    }

    /// Muted/Dimmed Color - Metadata, evidence lines.
    pub fn muted(text: impl fmt::Display) -> String {
        format!("{}", text.dimmed())
    }

    pub fn status(status: CycleStatus) -> String {
        match status {
            CycleStatus::Down => Self::error(status),
            CycleStatus::ActionRequired => Self::warning(status),
            CycleStatus::Caution => Self::secondary(status),
            CycleStatus::Normal => Self::success(status),
        }
    }

    pub fn severity(severity: Severity) -> String {
        match severity {
            Severity::Critical => Self::error(severity),
            Severity::Warning => Self::warning(severity),
            Severity::Info => Self::muted(severity),
        }
    }
}

/// Status-board icons.
/// Usage: `println!("{} Analyzing...", Icon::Network)`
pub enum Icon {
    Network,
    Alarm,
    Root,
    Silent,
    Impact,
    Scenario,
    Check,
    Cross,
    Info,
}

impl Icon {
    pub fn for_status(status: CycleStatus) -> Self {
        match status {
            CycleStatus::Down => Icon::Root,
            CycleStatus::ActionRequired => Icon::Alarm,
            CycleStatus::Caution => Icon::Info,
            CycleStatus::Normal => Icon::Check,
        }
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icon = match self {
            Icon::Network => "🌐",
            Icon::Alarm => "🚨",
            Icon::Root => "🔥",
            Icon::Silent => "🔇",
            Icon::Impact => "↳",
            Icon::Scenario => "🧪",
            Icon::Check => "✔",
            Icon::Cross => "✖",
            Icon::Info => "ℹ️ ",
        };
        write!(f, "{}", icon)
    }
}
