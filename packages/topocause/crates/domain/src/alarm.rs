use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Parse a feed-provided severity, coercing anything unrecognised to
    /// `Warning`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Severity::Critical,
            "WARNING" => Severity::Warning,
            "INFO" => Severity::Info,
            other => {
                tracing::warn!(severity = other, "unrecognised alarm severity, using WARNING");
                Severity::Warning
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single alarm raised by (or on behalf of) a device during one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub device_id: String,
    pub message: String,
    pub severity: Severity,
    /// Seconds since the epoch, when the feed provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl Alarm {
    pub fn new(device_id: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            device_id: device_id.into(),
            message: message.into(),
            severity,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Case-insensitive substring match against any of `keywords`.
    ///
    /// Keywords are expected in lower case.
    pub fn mentions_any(&self, keywords: &[&str]) -> bool {
        let message = self.message.to_lowercase();
        keywords.iter().any(|k| message.contains(k))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlarmError {
    #[error("alarm has an empty device id (message: '{0}')")]
    MissingDevice(String),
}

/// Alarm as delivered by a feed, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct AlarmRecord {
    pub device_id: String,
    pub message: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

impl TryFrom<AlarmRecord> for Alarm {
    type Error = AlarmError;

    fn try_from(record: AlarmRecord) -> Result<Self, Self::Error> {
        let device_id = record.device_id.trim();
        if device_id.is_empty() {
            return Err(AlarmError::MissingDevice(record.message));
        }
        Ok(Alarm {
            device_id: device_id.to_string(),
            severity: Severity::parse_lenient(&record.severity),
            message: record.message,
            timestamp: record.timestamp,
        })
    }
}

/// The alarms of one device within a batch.
#[derive(Debug, Clone)]
pub struct DeviceAlarms<'a> {
    pub device_id: &'a str,
    pub alarms: Vec<&'a Alarm>,
}

impl DeviceAlarms<'_> {
    pub fn messages(&self) -> Vec<String> {
        self.alarms.iter().map(|a| a.message.clone()).collect()
    }

    pub fn mentions_any(&self, keywords: &[&str]) -> bool {
        self.alarms.iter().any(|a| a.mentions_any(keywords))
    }
}

/// A cycle's alarms grouped by device.
///
/// Devices are kept in the order their first alarm arrived, which is the
/// discovery order used to break ranking ties.
#[derive(Debug, Clone, Default)]
pub struct AlarmBatch<'a> {
    groups: Vec<DeviceAlarms<'a>>,
    index: HashMap<&'a str, usize>,
}

impl<'a> AlarmBatch<'a> {
    pub fn ingest(alarms: &'a [Alarm]) -> Self {
        let mut batch = AlarmBatch::default();
        for alarm in alarms {
            let slot = match batch.index.get(alarm.device_id.as_str()) {
                Some(&slot) => slot,
                None => {
                    batch.groups.push(DeviceAlarms {
                        device_id: alarm.device_id.as_str(),
                        alarms: Vec::new(),
                    });
                    let slot = batch.groups.len() - 1;
                    batch.index.insert(alarm.device_id.as_str(), slot);
                    slot
                }
            };
            batch.groups[slot].alarms.push(alarm);
        }
        batch
    }

    pub fn devices(&self) -> impl Iterator<Item = &DeviceAlarms<'a>> {
        self.groups.iter()
    }

    pub fn get(&self, device_id: &str) -> Option<&DeviceAlarms<'a>> {
        self.index.get(device_id).map(|&slot| &self.groups[slot])
    }

    pub fn is_alarmed(&self, device_id: &str) -> bool {
        self.index.contains_key(device_id)
    }

    /// Number of distinct alarmed devices.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_groups_in_first_seen_order() {
        let alarms = vec![
            Alarm::new("FW", "Heartbeat Loss", Severity::Warning),
            Alarm::new("AP1", "Connection Lost", Severity::Critical),
            Alarm::new("FW", "HA State: Degraded", Severity::Warning),
        ];
        let batch = AlarmBatch::ingest(&alarms);

        let order: Vec<&str> = batch.devices().map(|d| d.device_id).collect();
        assert_eq!(order, vec!["FW", "AP1"]);
        assert_eq!(batch.get("FW").unwrap().alarms.len(), 2);
        assert!(batch.is_alarmed("AP1"));
        assert!(!batch.is_alarmed("AP2"));
    }

    #[test]
    fn test_record_validation() {
        let ok = Alarm::try_from(AlarmRecord {
            device_id: " SW1 ".into(),
            message: "Port Down".into(),
            severity: "urgent".into(),
            timestamp: None,
        })
        .unwrap();
        assert_eq!(ok.device_id, "SW1");
        assert_eq!(ok.severity, Severity::Warning);

        let err = Alarm::try_from(AlarmRecord {
            device_id: "".into(),
            message: "Port Down".into(),
            severity: "CRITICAL".into(),
            timestamp: None,
        })
        .unwrap_err();
        assert_eq!(err, AlarmError::MissingDevice("Port Down".into()));
    }

    #[test]
    fn test_mentions_is_case_insensitive() {
        let alarm = Alarm::new("R1", "Power Supply 1 Failed", Severity::Critical);
        assert!(alarm.mentions_any(&["power supply"]));
        assert!(!alarm.mentions_any(&["fan"]));
    }
}
