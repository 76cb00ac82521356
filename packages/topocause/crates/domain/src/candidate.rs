use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Device reference used by the sentinel "nothing is wrong" candidate.
pub const SYSTEM_DEVICE: &str = "System";

/// Classification tag of a candidate.
///
/// Serialized as the slash-separated tag (`Hardware/Physical`, ...). Tags the
/// engine does not know, e.g. labels coming from a training dataset, are kept
/// verbatim in [`CandidateKind::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CandidateKind {
    CompositeHardware,
    HardwarePhysical,
    NetworkLink,
    HardwareFan,
    ConfigSoftware,
    ResourceCapacity,
    SilentFailure,
    DownstreamSymptom,
    Secondary,
    Unreachable,
    Unknown,
    Normal,
    Custom(String),
}

/// How a consumer should treat a candidate, derived purely from its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateRole {
    /// A failure hypothesis about the device itself.
    Cause,
    /// Effect of a failure elsewhere in the topology.
    Impact,
    Unclassified,
    Normal,
}

impl CandidateKind {
    pub fn tag(&self) -> &str {
        match self {
            CandidateKind::CompositeHardware => "Hardware/Critical_Multi_Fail",
            CandidateKind::HardwarePhysical => "Hardware/Physical",
            CandidateKind::NetworkLink => "Network/Link",
            CandidateKind::HardwareFan => "Hardware/Fan",
            CandidateKind::ConfigSoftware => "Config/Software",
            CandidateKind::ResourceCapacity => "Resource/Capacity",
            CandidateKind::SilentFailure => "Network/SilentFailure",
            CandidateKind::DownstreamSymptom => "Network/DownstreamSymptom",
            CandidateKind::Secondary => "Network/Secondary",
            CandidateKind::Unreachable => "Network/Unreachable",
            CandidateKind::Unknown => "Unknown/Other",
            CandidateKind::Normal => "Normal",
            CandidateKind::Custom(tag) => tag,
        }
    }

    pub fn role(&self) -> CandidateRole {
        match self {
            CandidateKind::DownstreamSymptom
            | CandidateKind::Secondary
            | CandidateKind::Unreachable => CandidateRole::Impact,
            CandidateKind::Unknown => CandidateRole::Unclassified,
            CandidateKind::Normal => CandidateRole::Normal,
            _ => CandidateRole::Cause,
        }
    }

    /// Kinds that record the downstream effect of a failure elsewhere.
    pub fn is_impact(&self) -> bool {
        self.role() == CandidateRole::Impact
    }
}

impl From<String> for CandidateKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "Hardware/Critical_Multi_Fail" => CandidateKind::CompositeHardware,
            "Hardware/Physical" => CandidateKind::HardwarePhysical,
            "Network/Link" => CandidateKind::NetworkLink,
            "Hardware/Fan" => CandidateKind::HardwareFan,
            "Config/Software" => CandidateKind::ConfigSoftware,
            "Resource/Capacity" => CandidateKind::ResourceCapacity,
            "Network/SilentFailure" | "Network/Silent" => CandidateKind::SilentFailure,
            "Network/DownstreamSymptom" => CandidateKind::DownstreamSymptom,
            "Network/Secondary" => CandidateKind::Secondary,
            "Network/Unreachable" => CandidateKind::Unreachable,
            "Unknown/Other" | "Unknown" => CandidateKind::Unknown,
            "Normal" => CandidateKind::Normal,
            _ => CandidateKind::Custom(tag),
        }
    }
}

impl From<CandidateKind> for String {
    fn from(kind: CandidateKind) -> Self {
        match kind {
            CandidateKind::Custom(tag) => tag,
            other => other.tag().to_string(),
        }
    }
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// One scored hypothesis about the cause of an incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub device_id: String,
    pub kind: CandidateKind,
    pub label: String,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl Candidate {
    pub fn new(
        device_id: impl Into<String>,
        kind: CandidateKind,
        label: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            kind,
            label: label.into(),
            confidence: clamp_unit(confidence),
            evidence: Vec::new(),
            diagnostic: None,
        }
    }

    /// The sentinel returned when a cycle carries no alarms at all.
    pub fn normal() -> Self {
        Self::new(SYSTEM_DEVICE, CandidateKind::Normal, "Normal operation", 0.0)
    }

    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn with_diagnostic(mut self, diagnostic: impl Into<String>) -> Self {
        self.diagnostic = Some(diagnostic.into());
        self
    }

    pub fn set_confidence(&mut self, confidence: f64) {
        self.confidence = clamp_unit(confidence);
    }

    pub fn role(&self) -> CandidateRole {
        self.kind.role()
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Sort by descending confidence, keeping discovery order among equals.
///
/// Never returns an empty list: no candidates means the sentinel
/// [`Candidate::normal`].
pub fn rank(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    if candidates.is_empty() {
        return vec![Candidate::normal()];
    }
    // `sort_by` is stable
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    candidates
}

/// Working set of candidates for one cycle, at most one per device.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    items: Vec<Candidate>,
    index: HashMap<String, usize>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a candidate for a device that has none yet.
    ///
    /// Returns `false` and leaves the set untouched when the device is already
    /// present; callers upgrade or downgrade through [`CandidateSet::get_mut`].
    pub fn insert(&mut self, candidate: Candidate) -> bool {
        if self.index.contains_key(&candidate.device_id) {
            return false;
        }
        self.index
            .insert(candidate.device_id.clone(), self.items.len());
        self.items.push(candidate);
        true
    }

    pub fn get(&self, device_id: &str) -> Option<&Candidate> {
        self.index.get(device_id).map(|&i| &self.items[i])
    }

    pub fn get_mut(&mut self, device_id: &str) -> Option<&mut Candidate> {
        self.index.get(device_id).map(|&i| &mut self.items[i])
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.index.contains_key(device_id)
    }

    /// Candidates in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_ranked(self) -> Vec<Candidate> {
        rank(self.items)
    }
}
