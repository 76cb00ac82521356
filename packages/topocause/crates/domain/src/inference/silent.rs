//! Detection of upstream devices that fail without raising alarms.
//!
//! A parent that stays quiet while most of its children report loss of
//! connectivity is the likeliest single point of failure. The children are
//! then symptoms, not causes.

use crate::alarm::AlarmBatch;
use crate::candidate::{Candidate, CandidateKind, CandidateSet};
use crate::topology::{DeviceNode, Topology};

use super::config::SilentConfig;

pub const SILENT_LABEL: &str = "Silent failure (downstream devices lost together)";
pub const SYMPTOM_LABEL: &str = "Downstream symptom of silent upstream failure";

/// A quiet parent with enough cut-off children.
#[derive(Debug, Clone, PartialEq)]
pub struct SilentFinding {
    pub parent_id: String,
    pub affected: Vec<String>,
    pub total_children: usize,
}

impl SilentFinding {
    pub fn ratio(&self) -> f64 {
        self.affected.len() as f64 / self.total_children as f64
    }
}

pub struct SilentDetector<'a> {
    config: &'a SilentConfig,
    patterns: Vec<String>,
}

impl<'a> SilentDetector<'a> {
    pub fn new(config: &'a SilentConfig) -> Self {
        let patterns = config
            .patterns
            .iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { config, patterns }
    }

    /// Parents meeting both the absolute and the ratio floor, in load order.
    pub fn findings(&self, batch: &AlarmBatch<'_>, topology: &Topology) -> Vec<SilentFinding> {
        topology
            .parents()
            .filter(|parent| !batch.is_alarmed(&parent.id))
            .filter_map(|parent| self.inspect(parent, batch, topology))
            .collect()
    }

    fn inspect(
        &self,
        parent: &DeviceNode,
        batch: &AlarmBatch<'_>,
        topology: &Topology,
    ) -> Option<SilentFinding> {
        let children = topology.children(&parent.id);
        let patterns: Vec<&str> = self.patterns.iter().map(String::as_str).collect();
        let affected: Vec<String> = children
            .iter()
            .filter(|child| {
                batch
                    .get(&child.id)
                    .is_some_and(|alarms| alarms.mentions_any(&patterns))
            })
            .map(|child| child.id.clone())
            .collect();

        let finding = SilentFinding {
            parent_id: parent.id.clone(),
            affected,
            total_children: children.len(),
        };
        if finding.affected.len() >= self.config.min_affected && finding.ratio() >= self.config.min_ratio {
            Some(finding)
        } else {
            None
        }
    }

    /// Emit silent-failure candidates and demote the children they explain.
    pub fn detect(&self, batch: &AlarmBatch<'_>, topology: &Topology, out: &mut CandidateSet) {
        for finding in self.findings(batch, topology) {
            let confidence = self.config.confidence_floor
                + (self.config.confidence_ceiling - self.config.confidence_floor) * finding.ratio();
            tracing::debug!(
                parent = finding.parent_id.as_str(),
                affected = finding.affected.len(),
                children = finding.total_children,
                confidence,
                "silent upstream failure"
            );

            let mut evidence = vec![format!(
                "Downstream impact: {} of {} children lost",
                finding.affected.len(),
                finding.total_children
            )];
            evidence.extend(finding.affected.iter().map(|c| format!("{c}: connection lost")));

            let candidate = Candidate::new(
                finding.parent_id.as_str(),
                CandidateKind::SilentFailure,
                SILENT_LABEL,
                confidence,
            )
            .with_evidence(evidence)
            .with_diagnostic(diagnostic(&finding, topology));

            if !out.insert(candidate) {
                // already scored in this cycle
                continue;
            }

            for child in &finding.affected {
                self.demote(child, batch, out);
            }
        }
    }

    fn demote(&self, child: &str, batch: &AlarmBatch<'_>, out: &mut CandidateSet) {
        let cap = self.config.symptom_cap;
        match out.get_mut(child) {
            Some(existing) => {
                existing.kind = CandidateKind::DownstreamSymptom;
                existing.label = SYMPTOM_LABEL.to_string();
                let capped = existing.confidence.min(cap);
                existing.set_confidence(capped);
            }
            None => {
                let evidence = batch.get(child).map(|d| d.messages()).unwrap_or_default();
                out.insert(
                    Candidate::new(child, CandidateKind::DownstreamSymptom, SYMPTOM_LABEL, cap)
                        .with_evidence(evidence),
                );
            }
        }
    }
}

fn diagnostic(finding: &SilentFinding, topology: &Topology) -> String {
    let parent = finding.parent_id.as_str();
    let probe_from = topology
        .get(parent)
        .and_then(|n| n.parent_id.as_deref())
        .unwrap_or("the management network");

    let mut lines = vec![
        format!(
            "{} of {} devices behind {parent} lost connectivity while {parent} raised no alarm.",
            finding.affected.len(),
            finding.total_children
        ),
        format!("Probe {parent} management reachability from {probe_from}."),
        format!("Check uplink interface counters on {parent} (CRC, input errors, discards)."),
        format!("Check spanning-tree state and topology-change count on {parent}."),
        format!(
            "Correlate syslog around the first loss on: {}.",
            finding.affected.join(", ")
        ),
    ];
    if finding.affected.len() == finding.total_children {
        lines.push(format!("Every port towards the children of {parent} is affected."));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{Alarm, Severity};
    use crate::topology::DeviceType;

    fn topo() -> Topology {
        Topology::from_nodes(vec![
            DeviceNode::new("CORE", DeviceType::Switch, 3),
            DeviceNode::new("L2", DeviceType::Switch, 4).with_parent("CORE"),
            DeviceNode::new("AP1", DeviceType::AccessPoint, 5).with_parent("L2"),
            DeviceNode::new("AP2", DeviceType::AccessPoint, 5).with_parent("L2"),
            DeviceNode::new("AP3", DeviceType::AccessPoint, 5).with_parent("L2"),
            DeviceNode::new("AP4", DeviceType::AccessPoint, 5).with_parent("L2"),
        ])
        .unwrap()
    }

    fn lost(ids: &[&str]) -> Vec<Alarm> {
        ids.iter()
            .map(|id| Alarm::new(*id, "Connection Lost", Severity::Critical))
            .collect()
    }

    #[test]
    fn test_thresholds() {
        let config = SilentConfig::default();
        let detector = SilentDetector::new(&config);
        let topology = topo();

        let one = lost(&["AP1"]);
        assert!(detector.findings(&AlarmBatch::ingest(&one), &topology).is_empty());

        let two = lost(&["AP1", "AP2"]);
        let findings = detector.findings(&AlarmBatch::ingest(&two), &topology);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].parent_id, "L2");
        assert_eq!(findings[0].ratio(), 0.5);
    }

    #[test]
    fn test_ratio_floor_blocks_sparse_loss() {
        let config = SilentConfig {
            min_ratio: 0.75,
            ..SilentConfig::default()
        };
        let alarms = lost(&["AP1", "AP2"]);
        let findings = SilentDetector::new(&config).findings(&AlarmBatch::ingest(&alarms), &topo());
        assert!(findings.is_empty());
    }

    #[test]
    fn test_alarmed_parent_is_skipped() {
        let config = SilentConfig::default();
        let mut alarms = lost(&["AP1", "AP2", "AP3"]);
        alarms.push(Alarm::new("L2", "CPU High", Severity::Warning));
        let findings = SilentDetector::new(&config).findings(&AlarmBatch::ingest(&alarms), &topo());
        assert!(findings.is_empty());
    }

    #[test]
    fn test_children_demoted_below_parent() {
        let config = SilentConfig::default();
        let alarms = lost(&["AP1", "AP2", "AP3", "AP4"]);
        let batch = AlarmBatch::ingest(&alarms);
        let mut set = CandidateSet::new();
        for id in ["AP1", "AP2", "AP3", "AP4"] {
            set.insert(Candidate::new(id, CandidateKind::NetworkLink, "link", 0.9));
        }

        SilentDetector::new(&config).detect(&batch, &topo(), &mut set);

        let parent = set.get("L2").unwrap();
        assert_eq!(parent.kind, CandidateKind::SilentFailure);
        assert!((parent.confidence - 0.99).abs() < 1e-9);
        assert!(parent.diagnostic.as_deref().unwrap().contains("CORE"));
        for id in ["AP1", "AP2", "AP3", "AP4"] {
            let child = set.get(id).unwrap();
            assert_eq!(child.kind, CandidateKind::DownstreamSymptom);
            assert_eq!(child.confidence, 0.4);
        }
    }
}
