use serde::{Deserialize, Serialize};
use std::fmt;

use crate::candidate::Candidate;
use crate::inference::EngineConfig;

/// Status-board level of one analysis cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    Normal,
    Caution,
    ActionRequired,
    Down,
}

impl CycleStatus {
    pub fn assess(ranked: &[Candidate], config: &EngineConfig) -> Self {
        if ranked.iter().any(|c| c.confidence > config.root_cause_threshold) {
            return CycleStatus::Down;
        }
        let top = ranked.iter().map(|c| c.confidence).fold(0.0, f64::max);
        if top >= config.secondary_confidence {
            CycleStatus::ActionRequired
        } else if top > 0.0 {
            CycleStatus::Caution
        } else {
            CycleStatus::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CycleStatus::Normal => "Normal",
            CycleStatus::Caution => "Caution",
            CycleStatus::ActionRequired => "Action Required",
            CycleStatus::Down => "Down",
        }
    }
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::CandidateKind;

    fn at(confidence: f64) -> Vec<Candidate> {
        vec![Candidate::new("D", CandidateKind::Unknown, "d", confidence)]
    }

    #[test]
    fn test_levels() {
        let config = EngineConfig::default();
        assert_eq!(CycleStatus::assess(&at(0.95), &config), CycleStatus::Down);
        assert_eq!(CycleStatus::assess(&at(0.8), &config), CycleStatus::ActionRequired);
        assert_eq!(CycleStatus::assess(&at(0.3), &config), CycleStatus::Caution);
        assert_eq!(CycleStatus::assess(&[Candidate::normal()], &config), CycleStatus::Normal);
    }
}
