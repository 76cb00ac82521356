//! Keyword signatures mapping alarm text to failure types.
//!
//! Matching is a case-insensitive substring test. The table is a plain value
//! so a tenant can swap in its own vocabulary without touching the engine.

use crate::alarm::DeviceAlarms;
use crate::candidate::CandidateKind;

/// Keyword predicate over the alarms of one device.
#[derive(Debug, Clone, PartialEq)]
pub enum KeywordRule {
    /// Some alarm mentions any of the keywords.
    AnyOf(Vec<String>),
    /// Every keyword group is mentioned by some alarm (not necessarily the same one).
    AllOf(Vec<Vec<String>>),
}

impl KeywordRule {
    pub fn any_of(keywords: &[&str]) -> Self {
        KeywordRule::AnyOf(lowercase(keywords))
    }

    pub fn all_of(groups: &[&[&str]]) -> Self {
        KeywordRule::AllOf(groups.iter().map(|g| lowercase(g)).collect())
    }

    pub fn matches(&self, alarms: &DeviceAlarms<'_>) -> bool {
        match self {
            KeywordRule::AnyOf(keywords) => mentions(alarms, keywords),
            KeywordRule::AllOf(groups) => groups.iter().all(|g| mentions(alarms, g)),
        }
    }
}

fn lowercase(keywords: &[&str]) -> Vec<String> {
    keywords.iter().map(|k| k.to_lowercase()).collect()
}

fn mentions(alarms: &DeviceAlarms<'_>, keywords: &[String]) -> bool {
    alarms.alarms.iter().any(|a| {
        let message = a.message.to_lowercase();
        keywords.iter().any(|k| message.contains(k.as_str()))
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub kind: CandidateKind,
    pub label: String,
    pub rule: KeywordRule,
    pub base_score: f64,
    /// Loss of one power unit, which a spare supply in the same chassis
    /// absorbs. Only consulted for devices outside a redundancy group.
    pub redundancy_sensitive: bool,
}

impl Signature {
    pub fn new(kind: CandidateKind, label: &str, rule: KeywordRule, base_score: f64) -> Self {
        Self {
            kind,
            label: label.to_string(),
            rule,
            base_score,
            redundancy_sensitive: false,
        }
    }

    pub fn redundancy_sensitive(mut self) -> Self {
        self.redundancy_sensitive = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignatureMatch<'t> {
    pub signature: &'t Signature,
    pub score: f64,
}

/// Ordered signature list plus the markers of whole-device loss.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureTable {
    signatures: Vec<Signature>,
    total_loss_markers: Vec<String>,
}

impl Default for SignatureTable {
    fn default() -> Self {
        Self::new(
            vec![
                Signature::new(
                    CandidateKind::CompositeHardware,
                    "Composite hardware failure",
                    KeywordRule::all_of(&[&["power supply"], &["fan"]]),
                    1.0,
                ),
                Signature::new(
                    CandidateKind::HardwarePhysical,
                    "Hardware failure (power/device)",
                    KeywordRule::any_of(&["power supply", "device down"]),
                    0.95,
                )
                .redundancy_sensitive(),
                Signature::new(
                    CandidateKind::NetworkLink,
                    "Physical link/interface failure",
                    KeywordRule::any_of(&["interface down", "connection lost", "heartbeat loss"]),
                    0.90,
                ),
                Signature::new(
                    CandidateKind::HardwareFan,
                    "Cooling fan failure",
                    KeywordRule::any_of(&["fan fail"]),
                    0.70,
                ),
                Signature::new(
                    CandidateKind::ConfigSoftware,
                    "Misconfiguration/protocol failure",
                    KeywordRule::any_of(&["bgp", "ospf", "config"]),
                    0.60,
                ),
                Signature::new(
                    CandidateKind::ResourceCapacity,
                    "Resource exhaustion (CPU/memory)",
                    KeywordRule::any_of(&["cpu", "memory", "high"]),
                    0.50,
                ),
            ],
            &["device down", "dual loss"],
        )
    }
}

impl SignatureTable {
    pub fn new(signatures: Vec<Signature>, total_loss_markers: &[&str]) -> Self {
        Self {
            signatures,
            total_loss_markers: lowercase(total_loss_markers),
        }
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Highest-scoring signature for a device; declaration order breaks ties.
    ///
    /// Every signature earns `bonus` per alarm beyond the first, capped at 1.0.
    pub fn best_match(&self, alarms: &DeviceAlarms<'_>, bonus: f64) -> Option<SignatureMatch<'_>> {
        let extra = alarms.alarms.len().saturating_sub(1) as f64;
        let mut best: Option<SignatureMatch<'_>> = None;

        for signature in &self.signatures {
            if !signature.rule.matches(alarms) {
                continue;
            }
            let score = (signature.base_score + extra * bonus).min(1.0);
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(SignatureMatch { signature, score });
            }
        }
        best
    }

    /// Some alarm reports the loss of the whole device rather than one unit.
    pub fn reports_total_loss(&self, alarms: &DeviceAlarms<'_>) -> bool {
        mentions(alarms, &self.total_loss_markers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{Alarm, AlarmBatch, Severity};

    fn best(messages: &[&str]) -> Option<(CandidateKind, f64)> {
        let alarms: Vec<Alarm> = messages
            .iter()
            .map(|m| Alarm::new("DEV", *m, Severity::Warning))
            .collect();
        let batch = AlarmBatch::ingest(&alarms);
        let device = batch.get("DEV").unwrap();
        SignatureTable::default()
            .best_match(device, 0.02)
            .map(|m| (m.signature.kind.clone(), m.score))
    }

    #[test]
    fn test_composite_hardware_needs_both_keywords() {
        let (kind, score) = best(&["Power Supply 1 Failed", "Fan Module Failed"]).unwrap();
        assert_eq!(kind, CandidateKind::CompositeHardware);
        assert_eq!(score, 1.0);

        let (kind, _) = best(&["Power Supply 1 Failed"]).unwrap();
        assert_eq!(kind, CandidateKind::HardwarePhysical);
    }

    #[test]
    fn test_corroboration_bonus() {
        let (kind, score) = best(&["BGP Neighbor Down/Up Flapping", "Routing Table Unstable"]).unwrap();
        assert_eq!(kind, CandidateKind::ConfigSoftware);
        assert!((score - 0.62).abs() < 1e-9);

        let (kind, score) = best(&["Heartbeat Loss"]).unwrap();
        assert_eq!(kind, CandidateKind::NetworkLink);
        assert!((score - 0.90).abs() < 1e-9);
    }

    #[test]
    fn test_highest_score_wins_over_order() {
        // Fan fail (0.70) and memory (0.50) both match; the higher base wins.
        let (kind, _) = best(&["Memory High", "Fan Fail"]).unwrap();
        assert_eq!(kind, CandidateKind::HardwareFan);
    }

    #[test]
    fn test_tie_at_cap_keeps_declaration_order() {
        // Physical reaches 1.0 through corroboration; the composite signature
        // is declared first and also scores 1.0.
        let (kind, score) = best(&[
            "power supply a",
            "power supply b",
            "power supply c",
            "fan tray",
        ])
        .unwrap();
        assert_eq!(kind, CandidateKind::CompositeHardware);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_no_match() {
        assert!(best(&["Temperature Rising"]).is_none());
    }

    #[test]
    fn test_total_loss_markers() {
        let alarms = vec![Alarm::new("R", "Power Supply: Dual Loss (Device Down)", Severity::Critical)];
        let batch = AlarmBatch::ingest(&alarms);
        assert!(SignatureTable::default().reports_total_loss(batch.get("R").unwrap()));
    }
}
