use std::collections::{HashSet, VecDeque};
use thiserror::Error;

use crate::alarm::{Alarm, Severity};
use crate::topology::Topology;

pub const DEFAULT_CASCADE_MESSAGE: &str = "Interface Down";
pub const UNREACHABLE_MESSAGE: &str = "Unreachable";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    #[error("device '{0}' not found in topology")]
    UnknownRoot(String),
}

/// Synthesize the alarms a real outage at `root_id` would raise.
///
/// One CRITICAL alarm carrying `message` at the root, then one WARNING
/// "Unreachable" alarm per transitive descendant in breadth-first order.
pub fn simulate_cascade(
    root_id: &str,
    topology: &Topology,
    message: &str,
) -> Result<Vec<Alarm>, SimulationError> {
    if !topology.contains(root_id) {
        return Err(SimulationError::UnknownRoot(root_id.to_string()));
    }

    let mut alarms = vec![Alarm::new(root_id, message, Severity::Critical)];
    let mut queue = VecDeque::from([root_id.to_string()]);
    let mut processed: HashSet<String> = HashSet::from([root_id.to_string()]);

    while let Some(current) = queue.pop_front() {
        for child in topology.children(&current) {
            if processed.insert(child.id.clone()) {
                alarms.push(Alarm::new(
                    child.id.as_str(),
                    UNREACHABLE_MESSAGE,
                    Severity::Warning,
                ));
                queue.push_back(child.id.clone());
            }
        }
    }

    tracing::debug!(root = root_id, alarms = alarms.len(), "simulated cascade");
    Ok(alarms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{DeviceNode, DeviceType};

    fn topo() -> Topology {
        Topology::from_nodes(vec![
            DeviceNode::new("WAN", DeviceType::Router, 1),
            DeviceNode::new("FW", DeviceType::Firewall, 2).with_parent("WAN"),
            DeviceNode::new("CORE", DeviceType::Switch, 3).with_parent("FW"),
            DeviceNode::new("L2", DeviceType::Switch, 4).with_parent("CORE"),
            DeviceNode::new("AP1", DeviceType::AccessPoint, 5).with_parent("L2"),
            DeviceNode::new("LAB", DeviceType::Router, 1),
        ])
        .unwrap()
    }

    #[test]
    fn test_cascade_from_core() {
        let alarms = simulate_cascade("CORE", &topo(), "Power Supply: Dual Loss").unwrap();

        assert_eq!(alarms[0], Alarm::new("CORE", "Power Supply: Dual Loss", Severity::Critical));
        let rest: Vec<(&str, &str, Severity)> = alarms[1..]
            .iter()
            .map(|a| (a.device_id.as_str(), a.message.as_str(), a.severity))
            .collect();
        assert_eq!(
            rest,
            vec![
                ("L2", "Unreachable", Severity::Warning),
                ("AP1", "Unreachable", Severity::Warning),
            ]
        );
    }

    #[test]
    fn test_cascade_leaf_only_root_alarm() {
        let alarms = simulate_cascade("LAB", &topo(), DEFAULT_CASCADE_MESSAGE).unwrap();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].message, "Interface Down");
    }

    #[test]
    fn test_cascade_unknown_root() {
        let err = simulate_cascade("NOPE", &topo(), DEFAULT_CASCADE_MESSAGE).unwrap_err();
        assert_eq!(err, SimulationError::UnknownRoot("NOPE".into()));
    }
}
