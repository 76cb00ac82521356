use crate::alarm::{AlarmBatch, DeviceAlarms};
use crate::candidate::{Candidate, CandidateKind, CandidateSet};
use crate::topology::{DeviceNode, Topology};

use super::config::EngineConfig;
use super::signatures::SignatureTable;

pub const UNKNOWN_LABEL: &str = "Unclassified anomaly";

/// Redundancy position of an alarmed device within the current batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redundancy {
    /// No spare unit or peer.
    None,
    /// Chassis with several interchangeable units, no group.
    Units(u32),
    /// Group member with at least one unalarmed peer.
    GroupDegraded {
        group: String,
        alarmed: usize,
        members: usize,
    },
    /// Every member of the group is alarmed.
    GroupDown { group: String, members: usize },
}

impl Redundancy {
    pub fn assess(node: &DeviceNode, topology: &Topology, batch: &AlarmBatch<'_>) -> Self {
        match &node.redundancy_group {
            Some(group) => {
                let members = topology.group_members(group);
                let alarmed = members.iter().filter(|m| batch.is_alarmed(&m.id)).count();
                if alarmed == members.len() {
                    Redundancy::GroupDown {
                        group: group.clone(),
                        members: members.len(),
                    }
                } else {
                    Redundancy::GroupDegraded {
                        group: group.clone(),
                        alarmed,
                        members: members.len(),
                    }
                }
            }
            None => match node.unit_count() {
                n if n >= 2 => Redundancy::Units(n),
                _ => Redundancy::None,
            },
        }
    }
}

/// Signature-based scoring of every alarmed device.
pub struct Classifier<'a> {
    config: &'a EngineConfig,
    signatures: &'a SignatureTable,
}

impl<'a> Classifier<'a> {
    pub fn new(config: &'a EngineConfig, signatures: &'a SignatureTable) -> Self {
        Self { config, signatures }
    }

    /// Add one candidate per alarmed device, in discovery order.
    ///
    /// Unclassified alarms keep the unknown confidence, except on a group
    /// whose members are all alarmed with no alarmed ancestor above them.
    pub fn classify(&self, batch: &AlarmBatch<'_>, topology: &Topology, out: &mut CandidateSet) {
        for device in batch.devices() {
            let candidate = self.classify_device(device, batch, topology);
            tracing::debug!(
                device = device.device_id,
                kind = %candidate.kind,
                confidence = candidate.confidence,
                "classified"
            );
            out.insert(candidate);
        }
    }

    fn classify_device(
        &self,
        device: &DeviceAlarms<'_>,
        batch: &AlarmBatch<'_>,
        topology: &Topology,
    ) -> Candidate {
        let evidence = device.messages();
        let Some(best) = self.signatures.best_match(device, self.config.corroboration_bonus) else {
            return self.unclassified(device, batch, topology, evidence);
        };
        let signature = best.signature;
        let (label, score) = (signature.label.clone(), best.score);

        let Some(node) = topology.get(device.device_id) else {
            tracing::warn!(device = device.device_id, "alarm for device missing from topology");
            return Candidate::new(device.device_id, signature.kind.clone(), label, score)
                .with_evidence(evidence);
        };

        let (confidence, label) = match Redundancy::assess(node, topology, batch) {
            Redundancy::GroupDown { group, members } => (
                score.max(self.config.critical_floor),
                format!("{label} - redundancy group '{group}' down ({members}/{members} members alarmed)"),
            ),
            Redundancy::GroupDegraded {
                group,
                alarmed,
                members,
            } => (
                score.min(self.config.warning_ceiling),
                format!(
                    "{label} - degraded, service held by '{group}' ({alarmed}/{members} members alarmed)"
                ),
            ),
            Redundancy::Units(units)
                if signature.redundancy_sensitive && !self.signatures.reports_total_loss(device) =>
            {
                (
                    score.min(self.config.warning_ceiling),
                    format!("{label} - single unit of {units}, degraded"),
                )
            }
            _ => (score, label),
        };

        Candidate::new(device.device_id, signature.kind.clone(), label, confidence).with_evidence(evidence)
    }

    fn unclassified(
        &self,
        device: &DeviceAlarms<'_>,
        batch: &AlarmBatch<'_>,
        topology: &Topology,
        evidence: Vec<String>,
    ) -> Candidate {
        let group_down = topology.get(device.device_id).and_then(|node| {
            match Redundancy::assess(node, topology, batch) {
                // an alarmed upstream device explains the whole group going dark
                Redundancy::GroupDown { group, members } if !has_alarmed_ancestor(node, topology, batch) => {
                    Some((group, members))
                }
                _ => None,
            }
        });

        let (label, confidence) = match group_down {
            Some((group, members)) => (
                format!("{UNKNOWN_LABEL} - redundancy group '{group}' down ({members}/{members} members alarmed)"),
                self.config.critical_floor,
            ),
            None => (UNKNOWN_LABEL.to_string(), self.config.unknown_confidence),
        };
        Candidate::new(device.device_id, CandidateKind::Unknown, label, confidence).with_evidence(evidence)
    }
}

fn has_alarmed_ancestor(node: &DeviceNode, topology: &Topology, batch: &AlarmBatch<'_>) -> bool {
    let mut parent = node.parent_id.as_deref();
    while let Some(id) = parent {
        if batch.is_alarmed(id) {
            return true;
        }
        parent = topology.get(id).and_then(|p| p.parent_id.as_deref());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{Alarm, Severity};
    use crate::topology::{DeviceType, UNIT_COUNT_KEY};
    use serde_json::json;

    fn topo() -> Topology {
        Topology::from_nodes(vec![
            DeviceNode::new("WAN", DeviceType::Router, 1).with_metadata(UNIT_COUNT_KEY, json!(2)),
            DeviceNode::new("FW_A", DeviceType::Firewall, 2)
                .with_parent("WAN")
                .in_group("fw-ha"),
            DeviceNode::new("FW_B", DeviceType::Firewall, 2)
                .with_parent("WAN")
                .in_group("fw-ha"),
            DeviceNode::new("SW", DeviceType::Switch, 3).with_parent("FW_A"),
        ])
        .unwrap()
    }

    fn run(alarms: &[Alarm]) -> CandidateSet {
        let config = EngineConfig::default();
        let table = SignatureTable::default();
        let topology = topo();
        let batch = AlarmBatch::ingest(alarms);
        let mut set = CandidateSet::new();
        Classifier::new(&config, &table).classify(&batch, &topology, &mut set);
        set
    }

    #[test]
    fn test_unmatched_alarm_is_kept_as_unknown() {
        let set = run(&[Alarm::new("SW", "Temperature Rising", Severity::Info)]);
        let c = set.get("SW").unwrap();
        assert_eq!(c.kind, CandidateKind::Unknown);
        assert_eq!(c.confidence, 0.3);
        assert_eq!(c.evidence, vec!["Temperature Rising".to_string()]);
    }

    #[test]
    fn test_partial_group_capped_at_warning() {
        let set = run(&[
            Alarm::new("FW_A", "Heartbeat Loss", Severity::Warning),
            Alarm::new("FW_A", "HA State: Degraded", Severity::Warning),
        ]);
        let c = set.get("FW_A").unwrap();
        assert_eq!(c.kind, CandidateKind::NetworkLink);
        assert_eq!(c.confidence, 0.8);
        assert!(c.label.contains("degraded"));
    }

    #[test]
    fn test_full_group_escalates_to_critical() {
        let set = run(&[
            Alarm::new("FW_A", "Heartbeat Loss", Severity::Critical),
            Alarm::new("FW_B", "Heartbeat Loss", Severity::Critical),
        ]);
        for id in ["FW_A", "FW_B"] {
            assert!(set.get(id).unwrap().confidence >= 0.95);
        }
    }

    #[test]
    fn test_single_psu_on_dual_psu_chassis_is_degraded() {
        let set = run(&[Alarm::new("WAN", "Power Supply 1 Failed", Severity::Warning)]);
        assert_eq!(set.get("WAN").unwrap().confidence, 0.8);

        let set = run(&[Alarm::new(
            "WAN",
            "Power Supply: Dual Loss (Device Down)",
            Severity::Critical,
        )]);
        assert_eq!(set.get("WAN").unwrap().confidence, 0.95);
    }

    #[test]
    fn test_unclassified_group_down_escalates() {
        let set = run(&[
            Alarm::new("FW_A", "Device Unresponsive", Severity::Critical),
            Alarm::new("FW_B", "Device Unresponsive", Severity::Critical),
        ]);
        for id in ["FW_A", "FW_B"] {
            let c = set.get(id).unwrap();
            assert_eq!(c.kind, CandidateKind::Unknown);
            assert_eq!(c.confidence, 0.95);
            assert!(c.label.contains("'fw-ha' down"));
        }
    }

    #[test]
    fn test_unclassified_group_below_alarmed_parent_not_escalated() {
        let set = run(&[
            Alarm::new("WAN", "Interface Down", Severity::Critical),
            Alarm::new("FW_A", "Unreachable", Severity::Warning),
            Alarm::new("FW_B", "Unreachable", Severity::Warning),
        ]);
        assert_eq!(set.get("FW_A").unwrap().kind, CandidateKind::Unknown);
        assert_eq!(set.get("FW_B").unwrap().confidence, 0.3);
    }

    #[test]
    fn test_spare_psu_does_not_cap_link_loss() {
        let set = run(&[Alarm::new("WAN", "Interface Down", Severity::Critical)]);
        let c = set.get("WAN").unwrap();
        assert_eq!(c.kind, CandidateKind::NetworkLink);
        assert_eq!(c.confidence, 0.9);
    }

    #[test]
    fn test_device_outside_topology_still_classified() {
        let set = run(&[Alarm::new("GHOST", "Interface Down", Severity::Critical)]);
        assert_eq!(set.get("GHOST").unwrap().kind, CandidateKind::NetworkLink);
    }
}
