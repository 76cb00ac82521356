use crate::alarm::Alarm;
use crate::bayes::BayesModel;
use crate::candidate::{rank, Candidate};
use crate::inference::LogicalEngine;

/// Evidence type the Bayesian strategy files alarm messages under.
pub const ALARM_EVIDENCE: &str = "alarm";

/// A way of turning a cycle's alarms into ranked candidates.
///
/// Strategies are independent; callers compare their outputs side by side.
pub trait RootCauseStrategy {
    fn name(&self) -> &str;
    fn rank(&self, alarms: &[Alarm]) -> Vec<Candidate>;
}

impl RootCauseStrategy for LogicalEngine {
    fn name(&self) -> &str {
        "rule-based"
    }

    fn rank(&self, alarms: &[Alarm]) -> Vec<Candidate> {
        self.analyze(alarms)
    }
}

impl RootCauseStrategy for BayesModel {
    fn name(&self) -> &str {
        "bayesian"
    }

    fn rank(&self, alarms: &[Alarm]) -> Vec<Candidate> {
        if alarms.is_empty() {
            return rank(Vec::new());
        }
        let mut session = self.session();
        for alarm in alarms {
            session.update_evidence(ALARM_EVIDENCE, &alarm.message);
        }
        session.ranking()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::Severity;
    use crate::bayes::TrainingRecord;
    use crate::inference::EngineConfig;
    use crate::topology::{DeviceNode, DeviceType, Topology};
    use std::sync::Arc;

    #[test]
    fn test_strategies_share_one_interface() {
        let topology = Topology::from_nodes(vec![DeviceNode::new("FW_01", DeviceType::Firewall, 2)]).unwrap();
        let logical = LogicalEngine::new(Arc::new(topology), EngineConfig::default()).unwrap();
        let bayes = BayesModel::train(&[
            TrainingRecord::new("FW_01:Hardware/Physical", "alarm", "Heartbeat Loss"),
            TrainingRecord::new("WAN_01:Config/Software", "alarm", "BGP Flapping"),
        ])
        .unwrap();

        let alarms = vec![Alarm::new("FW_01", "Heartbeat Loss", Severity::Critical)];
        let strategies: Vec<&dyn RootCauseStrategy> = vec![&logical, &bayes];
        for strategy in strategies {
            let ranked = strategy.rank(&alarms);
            assert_eq!(ranked[0].device_id, "FW_01", "{}", strategy.name());
        }
    }

    #[test]
    fn test_bayesian_quiet_cycle_is_normal() {
        let bayes = BayesModel::train(&[TrainingRecord::new("X", "alarm", "y")]).unwrap();
        assert_eq!(bayes.rank(&[]), vec![Candidate::normal()]);
    }
}
