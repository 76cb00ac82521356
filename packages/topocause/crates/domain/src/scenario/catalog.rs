use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::alarm::Severity;
use crate::topology::DeviceType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("scenario id must not be empty")]
    MissingId,
    #[error("scenario '{0}' has no name")]
    MissingName(String),
    #[error("duplicate scenario id '{0}'")]
    Duplicate(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactScope {
    /// One device.
    Single,
    /// A parent and everything below it.
    Cascade,
    /// Several unrelated devices at once.
    Multi,
    /// Quiet parent, noisy children.
    Silent,
}

impl ImpactScope {
    pub const ALL: [ImpactScope; 4] = [
        ImpactScope::Single,
        ImpactScope::Cascade,
        ImpactScope::Multi,
        ImpactScope::Silent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactScope::Single => "single",
            ImpactScope::Cascade => "cascade",
            ImpactScope::Multi => "multi",
            ImpactScope::Silent => "silent",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|scope| scope.as_str() == raw)
    }
}

impl fmt::Display for ImpactScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to pick the device a scenario acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetHints {
    pub device_type: Option<DeviceType>,
    pub layer: Option<u32>,
    /// Substring of the device id, preferred when several devices fit.
    pub keyword: Option<String>,
    pub redundancy_group: Option<String>,
}

impl TargetHints {
    pub fn of_type(device_type: DeviceType) -> Self {
        Self {
            device_type: Some(device_type),
            ..Self::default()
        }
    }

    pub fn at_layer(mut self, layer: u32) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn with_keyword(mut self, keyword: &str) -> Self {
        self.keyword = Some(keyword.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmTemplate {
    pub message: String,
    #[serde(default = "default_severity")]
    pub severity: Severity,
    /// Overrides the scenario target for this alarm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetHints>,
}

fn default_severity() -> Severity {
    Severity::Warning
}

impl AlarmTemplate {
    pub fn new(message: &str, severity: Severity) -> Self {
        Self {
            message: message.to_string(),
            severity,
            target: None,
        }
    }

    pub fn at(mut self, target: TargetHints) -> Self {
        self.target = Some(target);
        self
    }
}

/// Alarm pattern a scenario produces on a topology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fault {
    /// Healthy network.
    #[default]
    None,
    /// Full outage of the target and everything behind it.
    Cascade { message: String },
    /// The target stays silent while its children lose connectivity.
    SilentUpstream,
    Alarms { alarms: Vec<AlarmTemplate> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_scope")]
    pub impact_scope: ImpactScope,
    #[serde(default = "default_severity")]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_hints: Option<TargetHints>,
    #[serde(default)]
    pub fault: Fault,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub affected_services: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_sop: Option<String>,
}

fn default_scope() -> ImpactScope {
    ImpactScope::Single
}

impl Scenario {
    pub fn new(id: &str, name: &str, description: &str, impact_scope: ImpactScope, severity: Severity) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            impact_scope,
            severity,
            target_hints: None,
            fault: Fault::None,
            symptoms: Vec::new(),
            affected_services: Vec::new(),
            tags: Vec::new(),
            related_sop: None,
        }
    }

    pub fn targeting(mut self, hints: TargetHints) -> Self {
        self.target_hints = Some(hints);
        self
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = fault;
        self
    }

    pub fn with_symptoms(mut self, symptoms: &[&str]) -> Self {
        self.symptoms = symptoms.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_services(mut self, services: &[&str]) -> Self {
        self.affected_services = services.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.id.trim().is_empty() {
            return Err(ScenarioError::MissingId);
        }
        if self.name.trim().is_empty() {
            return Err(ScenarioError::MissingName(self.id.clone()));
        }
        Ok(())
    }

    /// Relevance of this scenario to a free-text query, in `[0, 1]`.
    pub fn matches(&self, query: &str) -> f64 {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return 0.0;
        }
        let name = self.name.to_lowercase();

        if self.id.to_lowercase() == query {
            1.0
        } else if name == query {
            0.9
        } else if name.contains(&query) || query.contains(&name) {
            0.7
        } else if self.tags.iter().any(|t| t.to_lowercase() == query) {
            0.6
        } else if self.description.to_lowercase().contains(&query) {
            0.4
        } else {
            0.0
        }
    }
}

/// Scenario file layout: `{ scenarios: [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioFile {
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioCatalog {
    scenarios: Vec<Scenario>,
    index: HashMap<String, usize>,
}

impl ScenarioCatalog {
    pub fn new(scenarios: Vec<Scenario>) -> Result<Self, ScenarioError> {
        let mut catalog = Self::default();
        for scenario in scenarios {
            catalog.add(scenario)?;
        }
        Ok(catalog)
    }

    pub fn add(&mut self, scenario: Scenario) -> Result<(), ScenarioError> {
        scenario.validate()?;
        if self.index.contains_key(&scenario.id) {
            return Err(ScenarioError::Duplicate(scenario.id));
        }
        self.index.insert(scenario.id.clone(), self.scenarios.len());
        self.scenarios.push(scenario);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Scenario> {
        self.index.get(id).map(|&i| &self.scenarios[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Best `top_k` matches with a positive score, catalog order among equals.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<(&Scenario, f64)> {
        let mut scored: Vec<(&Scenario, f64)> = self
            .scenarios
            .iter()
            .map(|s| (s, s.matches(query)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);
        scored
    }

    /// Exact id first, then the best search hit.
    pub fn find(&self, query: &str) -> Option<&Scenario> {
        self.get(query)
            .or_else(|| self.search(query, 1).into_iter().next().map(|(s, _)| s))
    }

    pub fn filter_by_severity(&self, severity: Severity) -> Vec<&Scenario> {
        self.scenarios.iter().filter(|s| s.severity == severity).collect()
    }

    pub fn filter_by_scope(&self, scope: ImpactScope) -> Vec<&Scenario> {
        self.scenarios.iter().filter(|s| s.impact_scope == scope).collect()
    }

    /// The failure patterns a small campus network is usually drilled on.
    pub fn builtin() -> Self {
        use DeviceType::*;
        use Severity::*;

        let total_loss = "Power Supply: Dual Loss (Device Down)";
        let scenarios = vec![
            Scenario::new(
                "wan_outage",
                "WAN outage",
                "Edge router experiences complete link failure, affecting all downstream devices",
                ImpactScope::Cascade,
                Critical,
            )
            .targeting(TargetHints::of_type(Router).at_layer(1))
            .with_fault(Fault::Cascade {
                message: total_loss.to_string(),
            })
            .with_symptoms(&["Link Down", "BGP Session Lost", "No Route to Host"])
            .with_services(&["Internet Access", "VPN", "Cloud Services"])
            .with_tags(&["wan", "outage", "critical"]),
            Scenario::new(
                "fw_ha_partial",
                "Firewall HA partial failure",
                "One firewall in HA pair fails, but redundant unit maintains service",
                ImpactScope::Single,
                Warning,
            )
            .targeting(TargetHints::of_type(Firewall).at_layer(2))
            .with_fault(Fault::Alarms {
                alarms: vec![
                    AlarmTemplate::new("Heartbeat Loss", Warning),
                    AlarmTemplate::new("HA State: Degraded (Single Point of Failure)", Warning),
                    AlarmTemplate::new("Redundancy Lost - Immediate Action Required", Warning),
                ],
            })
            .with_symptoms(&["Heartbeat Loss", "HA Failover Triggered"])
            .with_tags(&["firewall", "ha", "warning"]),
            Scenario::new(
                "l2sw_silent",
                "L2 switch silent failure",
                "L2 switch appears online but all downstream APs report connection loss",
                ImpactScope::Silent,
                Critical,
            )
            .targeting(TargetHints::of_type(Switch).at_layer(4).with_keyword("L2"))
            .with_fault(Fault::SilentUpstream)
            .with_symptoms(&["Connection Lost (on children)", "Ping OK (on parent)"])
            .with_services(&["WiFi Access"])
            .with_tags(&["switch", "silent", "ap"]),
            Scenario::new(
                "psu_single",
                "Power supply failure: single unit",
                "Single PSU failure in redundant power supply configuration",
                ImpactScope::Single,
                Warning,
            )
            .targeting(TargetHints::of_type(Router))
            .with_fault(Fault::Alarms {
                alarms: vec![
                    AlarmTemplate::new("Power Supply 1 Failed", Warning),
                    AlarmTemplate::new("Redundancy Degraded", Warning),
                ],
            })
            .with_symptoms(&["Power Supply 1 Failed", "PSU Redundancy Lost"])
            .with_tags(&["power", "psu", "warning"]),
            Scenario::new(
                "psu_dual",
                "Power supply failure: both units",
                "Dual PSU failure causing complete device shutdown",
                ImpactScope::Cascade,
                Critical,
            )
            .targeting(TargetHints::of_type(Router))
            .with_fault(Fault::Cascade {
                message: total_loss.to_string(),
            })
            .with_symptoms(&["Dual PSU Loss", "Device Down", "System Shutdown"])
            .with_tags(&["power", "psu", "critical", "outage"]),
            Scenario::new(
                "bgp_flap",
                "BGP flapping",
                "BGP session instability causing route flapping",
                ImpactScope::Single,
                Warning,
            )
            .targeting(TargetHints::of_type(Router))
            .with_fault(Fault::Alarms {
                alarms: vec![
                    AlarmTemplate::new("BGP Neighbor Down/Up Flapping", Warning),
                    AlarmTemplate::new("Routing Table Unstable", Warning),
                ],
            })
            .with_symptoms(&["BGP Flapping", "Route Changes", "Peer Down/Up"])
            .with_services(&["Routing Stability"])
            .with_tags(&["bgp", "routing", "warning"]),
            Scenario::new(
                "fan_failure",
                "Fan failure",
                "Cooling fan failure with potential thermal escalation risk",
                ImpactScope::Single,
                Warning,
            )
            .targeting(TargetHints::of_type(Switch))
            .with_fault(Fault::Alarms {
                alarms: vec![
                    AlarmTemplate::new("Fan Fail", Warning),
                    AlarmTemplate::new("Temperature Rising", Warning),
                ],
            })
            .with_symptoms(&["Fan Fail", "High Temperature", "Thermal Warning"])
            .with_tags(&["fan", "thermal", "warning"]),
            Scenario::new(
                "memory_leak",
                "Memory leak",
                "Memory leak causing gradual performance degradation",
                ImpactScope::Single,
                Warning,
            )
            .targeting(TargetHints::of_type(Router))
            .with_fault(Fault::Alarms {
                alarms: vec![
                    AlarmTemplate::new("Memory High (85% utilized)", Warning),
                    AlarmTemplate::new("Process: bgpd consuming excessive memory", Warning),
                ],
            })
            .with_symptoms(&["Memory High", "Process Restart", "Slow Response"])
            .with_tags(&["memory", "resource", "warning"]),
            Scenario::new(
                "complex_hw",
                "Composite hardware failure",
                "Power supply and fan fail together on the same chassis",
                ImpactScope::Single,
                Critical,
            )
            .targeting(TargetHints::of_type(Router))
            .with_fault(Fault::Alarms {
                alarms: vec![
                    AlarmTemplate::new("Power Supply 1 Failed", Critical),
                    AlarmTemplate::new("Fan Module Failed", Warning),
                    AlarmTemplate::new("Temperature Critical", Warning),
                ],
            })
            .with_symptoms(&["Power Supply Failed", "Fan Fail", "System Overheat"])
            .with_tags(&["hardware", "power", "fan", "critical"]),
            Scenario::new(
                "simultaneous",
                "Simultaneous independent failures",
                "Unrelated firewall and access point faults in the same window",
                ImpactScope::Multi,
                Critical,
            )
            .with_fault(Fault::Alarms {
                alarms: vec![
                    AlarmTemplate::new("Heartbeat Loss", Warning).at(TargetHints::of_type(Firewall)),
                    AlarmTemplate::new("Connection Lost", Critical).at(TargetHints::of_type(AccessPoint)),
                ],
            })
            .with_tags(&["multi", "simultaneous"]),
            Scenario::new(
                "normal",
                "Normal operation",
                "All systems operational, no issues detected",
                ImpactScope::Single,
                Info,
            )
            .with_tags(&["normal", "healthy"]),
        ];

        let mut catalog = Self::default();
        for scenario in scenarios {
            catalog.index.insert(scenario.id.clone(), catalog.scenarios.len());
            catalog.scenarios.push(scenario);
        }
        catalog
    }
}
