use std::collections::HashSet;

use crate::candidate::{Candidate, CandidateKind};

use super::model::{BayesModel, Evidence};

/// What a single `update_evidence` call did to the posterior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceUpdate {
    Applied,
    /// Never seen in training; posterior left as is.
    Unknown,
    /// Already part of this session.
    Duplicate,
}

/// One investigation: evidence accumulates, posteriors follow.
#[derive(Debug, Clone)]
pub struct BayesSession<'m> {
    model: &'m BayesModel,
    scores: Vec<f64>,
    evidence: Vec<Evidence>,
    seen: HashSet<Evidence>,
}

impl<'m> BayesSession<'m> {
    pub(crate) fn new(model: &'m BayesModel) -> Self {
        Self {
            model,
            scores: model.priors().to_vec(),
            evidence: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Multiply every posterior by P(evidence | cause) and renormalize.
    pub fn update_evidence(&mut self, kind: &str, value: &str) -> EvidenceUpdate {
        let evidence = Evidence::new(kind, value);
        if !self.seen.insert(evidence.clone()) {
            return EvidenceUpdate::Duplicate;
        }
        self.evidence.push(evidence.clone());

        let Some(likelihoods) = self.model.likelihoods(&evidence) else {
            tracing::debug!(%evidence, "unknown evidence skipped");
            return EvidenceUpdate::Unknown;
        };

        let updated: Vec<f64> = self
            .scores
            .iter()
            .zip(likelihoods)
            .map(|(score, lik)| score * lik)
            .collect();
        let total: f64 = updated.iter().sum();
        if total > 0.0 && total.is_finite() {
            self.scores = updated.into_iter().map(|s| s / total).collect();
        } else {
            tracing::warn!(%evidence, "posterior underflow, update ignored");
        }
        EvidenceUpdate::Applied
    }

    /// Evidence in submission order, unknown pairs included.
    pub fn evidence(&self) -> &[Evidence] {
        &self.evidence
    }

    /// `(cause, posterior)` in training order; sums to 1.
    pub fn posteriors(&self) -> Vec<(&'m str, f64)> {
        self.model
            .causes()
            .iter()
            .map(String::as_str)
            .zip(self.scores.iter().copied())
            .collect()
    }

    /// Causes by descending posterior, training order among equals.
    pub fn ranking(&self) -> Vec<Candidate> {
        let matched: Vec<String> = self
            .evidence
            .iter()
            .filter(|e| self.model.knows(e))
            .map(|e| e.to_string())
            .collect();

        let mut ranked: Vec<Candidate> = self
            .posteriors()
            .into_iter()
            .map(|(cause, posterior)| {
                let (device, kind) = split_label(cause);
                Candidate::new(device, kind, format!("Posterior for {cause}"), posterior)
                    .with_evidence(matched.clone())
            })
            .collect();
        ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        ranked
    }
}

/// `DEVICE:Type/Tag` splits into device and tag; anything else is a bare
/// device reference.
fn split_label(label: &str) -> (&str, CandidateKind) {
    match label.split_once(':') {
        Some((device, tag)) if !device.is_empty() && !tag.is_empty() => {
            (device, CandidateKind::from(tag.to_string()))
        }
        _ => (label, CandidateKind::Unknown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bayes::TrainingRecord;
    use proptest::prelude::*;

    fn model() -> BayesModel {
        BayesModel::train(&[
            TrainingRecord::new("FW_01:Hardware/Physical", "alarm", "Heartbeat Loss"),
            TrainingRecord::new("FW_01:Hardware/Physical", "alarm", "HA Failover"),
            TrainingRecord::new("FW_01:Hardware/Physical", "ping", "NG"),
            TrainingRecord::new("WAN_01:Config/Software", "alarm", "BGP Flapping"),
            TrainingRecord::new("WAN_01:Config/Software", "log", "Config Error"),
            TrainingRecord::new("AP_01:Network/Connection", "alarm", "Connection Lost"),
            TrainingRecord::new("AP_01:Network/Connection", "ping", "NG"),
            TrainingRecord::new("External_ISP", "alarm", "BGP Flapping"),
        ])
        .unwrap()
    }

    fn total(session: &BayesSession<'_>) -> f64 {
        session.posteriors().iter().map(|(_, p)| p).sum()
    }

    #[test]
    fn test_fresh_session_ranks_by_prior() {
        let model = model();
        let ranking = model.session().ranking();
        assert_eq!(ranking[0].device_id, "FW_01");
        assert_eq!(ranking[0].kind, CandidateKind::HardwarePhysical);
        assert!((ranking[0].confidence - 3.0 / 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_evidence_shifts_posterior() {
        let model = model();
        let mut session = model.session();
        assert_eq!(session.update_evidence("alarm", "BGP Flapping"), EvidenceUpdate::Applied);
        assert_eq!(session.update_evidence("log", "Config Error"), EvidenceUpdate::Applied);

        let ranking = session.ranking();
        assert_eq!(ranking[0].device_id, "WAN_01");
        assert_eq!(ranking[0].kind, CandidateKind::ConfigSoftware);
        assert_eq!(
            ranking[0].evidence,
            vec!["alarm=BGP Flapping".to_string(), "log=Config Error".to_string()]
        );
        assert!((total(&session) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_and_duplicate_evidence_are_no_ops() {
        let model = model();
        let mut session = model.session();
        session.update_evidence("alarm", "Heartbeat Loss");
        let before = session.posteriors();

        assert_eq!(session.update_evidence("alarm", "Solar Flare"), EvidenceUpdate::Unknown);
        assert_eq!(session.update_evidence("alarm", "Heartbeat Loss"), EvidenceUpdate::Duplicate);
        assert_eq!(session.posteriors(), before);
        assert_eq!(session.evidence().len(), 2);
    }

    #[test]
    fn test_plain_label_becomes_unknown_kind() {
        assert_eq!(split_label("External_ISP"), ("External_ISP", CandidateKind::Unknown));
        assert_eq!(
            split_label("AP_01:Network/Connection"),
            ("AP_01", CandidateKind::Custom("Network/Connection".into()))
        );
    }

    fn known_evidence() -> impl Strategy<Value = (String, String)> {
        prop_oneof![
            Just(("alarm".to_string(), "Heartbeat Loss".to_string())),
            Just(("alarm".to_string(), "HA Failover".to_string())),
            Just(("ping".to_string(), "NG".to_string())),
            Just(("alarm".to_string(), "BGP Flapping".to_string())),
            Just(("log".to_string(), "Config Error".to_string())),
            Just(("alarm".to_string(), "Connection Lost".to_string())),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_posterior_sums_to_one(updates in proptest::collection::vec(known_evidence(), 0..12)) {
            let model = model();
            let mut session = model.session();
            for (kind, value) in &updates {
                session.update_evidence(kind, value);
            }
            prop_assert!((total(&session) - 1.0).abs() < 1e-9);
            for (_, p) in session.posteriors() {
                prop_assert!((0.0..=1.0).contains(&p));
            }
        }

        #[test]
        fn prop_unknown_evidence_leaves_posterior(
            updates in proptest::collection::vec(known_evidence(), 0..6),
            noise in "[a-z]{12}",
        ) {
            let model = model();
            let mut session = model.session();
            for (kind, value) in &updates {
                session.update_evidence(kind, value);
            }
            let before = session.posteriors();
            session.update_evidence("unseen", &noise);
            prop_assert_eq!(session.posteriors(), before);
        }
    }
}
