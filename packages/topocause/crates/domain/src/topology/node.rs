use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Metadata key holding the number of interchangeable power units in a chassis.
pub const UNIT_COUNT_KEY: &str = "psu_count";

/// Kind of network device.
///
/// Unknown strings map to [`DeviceType::Other`] so that a topology export from
/// a newer inventory never fails to load over a type we do not reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceType {
    Router,
    Firewall,
    Switch,
    AccessPoint,
    Server,
    LoadBalancer,
    Other,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Router => "ROUTER",
            DeviceType::Firewall => "FIREWALL",
            DeviceType::Switch => "SWITCH",
            DeviceType::AccessPoint => "ACCESS_POINT",
            DeviceType::Server => "SERVER",
            DeviceType::LoadBalancer => "LOAD_BALANCER",
            DeviceType::Other => "OTHER",
        }
    }
}

impl From<String> for DeviceType {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ROUTER" => DeviceType::Router,
            "FIREWALL" | "FW" => DeviceType::Firewall,
            "SWITCH" | "L2_SWITCH" | "L3_SWITCH" => DeviceType::Switch,
            "ACCESS_POINT" | "AP" => DeviceType::AccessPoint,
            "SERVER" => DeviceType::Server,
            "LOAD_BALANCER" | "LB" => DeviceType::LoadBalancer,
            _ => DeviceType::Other,
        }
    }
}

impl From<DeviceType> for String {
    fn from(value: DeviceType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A device in the network model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceNode {
    pub id: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    /// Hierarchy depth as declared by the inventory (smaller = more central).
    pub layer: u32,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub redundancy_group: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl DeviceNode {
    pub fn new(id: impl Into<String>, device_type: DeviceType, layer: u32) -> Self {
        Self {
            id: id.into(),
            device_type,
            layer,
            parent_id: None,
            redundancy_group: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.redundancy_group = Some(group.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Number of interchangeable units (power supplies) the device carries.
    ///
    /// Defaults to 1. Group membership implies at least 2, since the peer
    /// itself is a spare unit of the service.
    pub fn unit_count(&self) -> u32 {
        let declared = self
            .metadata
            .get(UNIT_COUNT_KEY)
            .and_then(|v| match v {
                serde_json::Value::Number(n) => n.as_u64(),
                serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
                _ => None,
            })
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(1)
            .max(1);

        if self.redundancy_group.is_some() {
            declared.max(2)
        } else {
            declared
        }
    }
}

/// Topology entry as it appears in a source file, keyed by device id.
///
/// The `id` field is optional since the map key already carries it; when
/// present it must agree with the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub layer: u32,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub redundancy_group: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl DeviceRecord {
    pub(crate) fn into_node(self, key: &str) -> DeviceNode {
        DeviceNode {
            id: key.to_string(),
            device_type: self.device_type,
            layer: self.layer,
            parent_id: non_blank(self.parent_id),
            redundancy_group: non_blank(self.redundancy_group),
            metadata: self.metadata,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_device_type_parsing() {
        assert_eq!(DeviceType::from("router".to_string()), DeviceType::Router);
        assert_eq!(DeviceType::from("ACCESS_POINT".to_string()), DeviceType::AccessPoint);
        assert_eq!(DeviceType::from("toaster".to_string()), DeviceType::Other);
    }

    #[test]
    fn test_unit_count_defaults() {
        let plain = DeviceNode::new("R1", DeviceType::Router, 1);
        assert_eq!(plain.unit_count(), 1);

        let dual_psu = plain.clone().with_metadata(UNIT_COUNT_KEY, json!(2));
        assert_eq!(dual_psu.unit_count(), 2);

        let text_count = plain.clone().with_metadata(UNIT_COUNT_KEY, json!("4"));
        assert_eq!(text_count.unit_count(), 4);

        let grouped = DeviceNode::new("FW_A", DeviceType::Firewall, 2).in_group("fw-ha");
        assert_eq!(grouped.unit_count(), 2);
    }

    #[test]
    fn test_record_blank_parent_is_root() {
        let record: DeviceRecord = serde_json::from_value(json!({
            "type": "SWITCH",
            "layer": 3,
            "parent_id": "",
        }))
        .unwrap();
        let node = record.into_node("SW1");
        assert_eq!(node.id, "SW1");
        assert_eq!(node.parent_id, None);
    }
}
