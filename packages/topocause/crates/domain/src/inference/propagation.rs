use crate::candidate::{Candidate, CandidateKind, CandidateSet};
use crate::topology::Topology;

pub const SECONDARY_LABEL: &str = "Impacted by upstream failure";
pub const UNREACHABLE_LABEL: &str = "Unreachable behind upstream failure";

/// Marks everything below a confirmed root cause as downstream impact.
pub struct ImpactPropagator {
    threshold: f64,
    secondary_confidence: f64,
}

impl ImpactPropagator {
    pub fn new(threshold: f64, secondary_confidence: f64) -> Self {
        Self {
            threshold,
            secondary_confidence,
        }
    }

    /// Ids of confirmed roots, shallowest first, discovery order among peers.
    pub fn roots(&self, set: &CandidateSet, topology: &Topology) -> Vec<String> {
        let mut roots: Vec<(usize, &str)> = set
            .iter()
            .filter(|c| c.confidence > self.threshold)
            .map(|c| {
                let depth = topology.depth(&c.device_id).unwrap_or(0);
                (depth, c.device_id.as_str())
            })
            .collect();
        roots.sort_by_key(|(depth, _)| *depth);
        roots.into_iter().map(|(_, id)| id.to_string()).collect()
    }

    pub fn propagate(&self, set: &mut CandidateSet, topology: &Topology) {
        let roots = self.roots(set, topology);

        for root in &roots {
            let Some(root_confidence) = set.get(root).map(|c| c.confidence) else {
                continue;
            };
            let descendants = topology.descendants(root);
            tracing::debug!(root = root.as_str(), descendants = descendants.len(), "propagating impact");

            for node in descendants {
                let id = node.id.as_str();
                if roots.iter().any(|r| r == id) {
                    // nested root keeps its tag but never outranks its ancestor
                    if let Some(nested) = set.get_mut(id) {
                        let clamped = nested.confidence.min(root_confidence);
                        nested.set_confidence(clamped);
                    }
                    continue;
                }

                match set.get_mut(id) {
                    Some(existing) if existing.kind.is_impact() => {}
                    Some(existing) => {
                        existing.kind = CandidateKind::Secondary;
                        existing.label = SECONDARY_LABEL.to_string();
                        existing.set_confidence(self.secondary_confidence);
                        existing.evidence.push(upstream_evidence(root));
                    }
                    None => {
                        set.insert(
                            Candidate::new(
                                id,
                                CandidateKind::Unreachable,
                                UNREACHABLE_LABEL,
                                self.secondary_confidence,
                            )
                            .with_evidence(vec![upstream_evidence(root)]),
                        );
                    }
                }
            }
        }
    }
}

fn upstream_evidence(root: &str) -> String {
    format!("Upstream root cause: {root}")
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
            DeviceNode::new("AP", DeviceType::AccessPoint, 4).with_parent("CORE"),
        ])
        .unwrap()
    }

    #[test]
    fn test_descendants_become_secondary_or_unreachable() {
        let mut set = CandidateSet::new();
        set.insert(Candidate::new("WAN", CandidateKind::NetworkLink, "link", 0.92));
        set.insert(Candidate::new("CORE", CandidateKind::ResourceCapacity, "cpu", 0.5));

        ImpactPropagator::new(0.8, 0.5).propagate(&mut set, &topo());

        assert_eq!(set.get("WAN").unwrap().confidence, 0.92);
        let core = set.get("CORE").unwrap();
        assert_eq!(core.kind, CandidateKind::Secondary);
        assert_eq!(core.evidence.last().unwrap(), "Upstream root cause: WAN");
        for id in ["FW", "AP"] {
            let c = set.get(id).unwrap();
            assert_eq!(c.kind, CandidateKind::Unreachable);
            assert_eq!(c.confidence, 0.5);
        }
    }

    #[test]
    fn test_nested_root_clamped_to_ancestor() {
        let mut set = CandidateSet::new();
        set.insert(Candidate::new("FW", CandidateKind::NetworkLink, "link", 0.9));
        set.insert(Candidate::new("CORE", CandidateKind::HardwarePhysical, "psu", 0.97));

        ImpactPropagator::new(0.8, 0.5).propagate(&mut set, &topo());

        let core = set.get("CORE").unwrap();
        assert_eq!(core.kind, CandidateKind::HardwarePhysical);
        assert_eq!(core.confidence, 0.9);
        assert_eq!(set.get("AP").unwrap().kind, CandidateKind::Unreachable);
    }

    #[test]
    fn test_existing_impact_untouched() {
        let mut set = CandidateSet::new();
        set.insert(Candidate::new("CORE", CandidateKind::SilentFailure, "silent", 0.99));
        set.insert(Candidate::new("AP", CandidateKind::DownstreamSymptom, "symptom", 0.4));

        ImpactPropagator::new(0.8, 0.5).propagate(&mut set, &topo());

        let ap = set.get("AP").unwrap();
        assert_eq!(ap.kind, CandidateKind::DownstreamSymptom);
        assert_eq!(ap.confidence, 0.4);
    }
}
