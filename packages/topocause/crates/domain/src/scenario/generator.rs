use crate::alarm::{Alarm, Severity};
use crate::cascade::{simulate_cascade, SimulationError};
use crate::topology::{DeviceNode, DeviceType, Topology};

use super::catalog::{Fault, Scenario, TargetHints};

/// Upper bound on access points used when a silent target has no children.
const SILENT_FALLBACK_LIMIT: usize = 4;
const SILENT_CHILD_MESSAGE: &str = "Connection Lost";

impl TargetHints {
    /// Every constraint except the keyword holds for `node`.
    pub fn admits(&self, node: &DeviceNode) -> bool {
        self.device_type.map_or(true, |t| node.device_type == t)
            && self.layer.map_or(true, |l| node.layer == l)
            && self
                .redundancy_group
                .as_deref()
                .map_or(true, |g| node.redundancy_group.as_deref() == Some(g))
    }

    /// First device in load order that fits, preferring a keyword match.
    pub fn resolve<'t>(&self, topology: &'t Topology) -> Option<&'t DeviceNode> {
        if let Some(keyword) = self.keyword.as_deref() {
            let keyword = keyword.to_lowercase();
            let by_keyword = topology
                .nodes()
                .filter(|n| n.id.to_lowercase().contains(&keyword))
                .find(|n| self.admits(n))
                .or_else(|| topology.nodes().find(|n| n.id.to_lowercase().contains(&keyword)));
            if by_keyword.is_some() {
                return by_keyword;
            }
        }
        topology.nodes().find(|n| self.admits(n))
    }
}

/// Alarms the scenario would raise on `topology`.
///
/// `target` pins the device instead of resolving it from the hints. A
/// scenario whose target cannot be found produces no alarms.
pub fn generate_alarms(
    scenario: &Scenario,
    topology: &Topology,
    target: Option<&str>,
) -> Result<Vec<Alarm>, SimulationError> {
    let pinned = match target {
        Some(id) => Some(
            topology
                .get(id)
                .ok_or_else(|| SimulationError::UnknownRoot(id.to_string()))?,
        ),
        None => None,
    };
    let primary = pinned.or_else(|| scenario.target_hints.as_ref().and_then(|h| h.resolve(topology)));

    let alarms = match &scenario.fault {
        Fault::None => Vec::new(),
        Fault::Cascade { message } => match primary {
            Some(node) => simulate_cascade(&node.id, topology, message)?,
            None => Vec::new(),
        },
        Fault::SilentUpstream => match primary {
            Some(node) => silent_children(node, topology),
            None => Vec::new(),
        },
        Fault::Alarms { alarms } => alarms
            .iter()
            .filter_map(|template| {
                let device = match &template.target {
                    Some(hints) => hints.resolve(topology),
                    None => primary,
                }?;
                Some(Alarm::new(device.id.as_str(), template.message.as_str(), template.severity))
            })
            .collect(),
    };

    if alarms.is_empty() && scenario.fault != Fault::None {
        tracing::debug!(scenario = scenario.id.as_str(), "no target device in topology");
    }
    Ok(alarms)
}

fn silent_children(parent: &DeviceNode, topology: &Topology) -> Vec<Alarm> {
    let children = topology.children(&parent.id);
    let affected: Vec<&DeviceNode> = if children.is_empty() {
        topology
            .nodes()
            .filter(|n| n.device_type == DeviceType::AccessPoint)
            .take(SILENT_FALLBACK_LIMIT)
            .collect()
    } else {
        children
    };
    affected
        .into_iter()
        .map(|n| Alarm::new(n.id.as_str(), SILENT_CHILD_MESSAGE, Severity::Critical))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioCatalog;
    use pretty_assertions::assert_eq;

    fn campus() -> Topology {
        Topology::from_nodes(vec![
            DeviceNode::new("WAN_ROUTER_01", DeviceType::Router, 1),
            DeviceNode::new("FW_01_PRIMARY", DeviceType::Firewall, 2)
                .with_parent("WAN_ROUTER_01")
                .in_group("FW_HA"),
            DeviceNode::new("FW_01_SECONDARY", DeviceType::Firewall, 2)
                .with_parent("WAN_ROUTER_01")
                .in_group("FW_HA"),
            DeviceNode::new("CORE_SW_01", DeviceType::Switch, 3).with_parent("FW_01_PRIMARY"),
            DeviceNode::new("L2_SW_01", DeviceType::Switch, 4).with_parent("CORE_SW_01"),
            DeviceNode::new("AP_01", DeviceType::AccessPoint, 5).with_parent("L2_SW_01"),
            DeviceNode::new("AP_02", DeviceType::AccessPoint, 5).with_parent("L2_SW_01"),
        ])
        .unwrap()
    }

    fn ids(alarms: &[Alarm]) -> Vec<&str> {
        alarms.iter().map(|a| a.device_id.as_str()).collect()
    }

    #[test]
    fn test_wan_outage_cascades_from_edge_router() {
        let catalog = ScenarioCatalog::builtin();
        let alarms = generate_alarms(catalog.get("wan_outage").unwrap(), &campus(), None).unwrap();
        assert_eq!(alarms.len(), 7);
        assert_eq!(alarms[0].device_id, "WAN_ROUTER_01");
        assert_eq!(alarms[0].severity, Severity::Critical);
    }

    #[test]
    fn test_silent_scenario_alarms_only_children() {
        let catalog = ScenarioCatalog::builtin();
        let alarms = generate_alarms(catalog.get("l2sw_silent").unwrap(), &campus(), None).unwrap();
        assert_eq!(ids(&alarms), vec!["AP_01", "AP_02"]);
        assert!(alarms.iter().all(|a| a.message == "Connection Lost"));
    }

    #[test]
    fn test_simultaneous_uses_per_alarm_targets() {
        let catalog = ScenarioCatalog::builtin();
        let alarms = generate_alarms(catalog.get("simultaneous").unwrap(), &campus(), None).unwrap();
        assert_eq!(ids(&alarms), vec!["FW_01_PRIMARY", "AP_01"]);
    }

    #[test]
    fn test_pinned_target() {
        let catalog = ScenarioCatalog::builtin();
        let scenario = catalog.get("psu_single").unwrap();

        let alarms = generate_alarms(scenario, &campus(), Some("FW_01_PRIMARY")).unwrap();
        assert_eq!(ids(&alarms), vec!["FW_01_PRIMARY", "FW_01_PRIMARY"]);

        let err = generate_alarms(scenario, &campus(), Some("NOPE")).unwrap_err();
        assert_eq!(err, SimulationError::UnknownRoot("NOPE".into()));
    }

    #[test]
    fn test_missing_target_yields_nothing() {
        let topology = Topology::from_nodes(vec![DeviceNode::new("SRV", DeviceType::Server, 1)]).unwrap();
        let catalog = ScenarioCatalog::builtin();
        for id in ["wan_outage", "fw_ha_partial", "normal"] {
            let alarms = generate_alarms(catalog.get(id).unwrap(), &topology, None).unwrap();
            assert!(alarms.is_empty(), "{id}");
        }
    }
}
