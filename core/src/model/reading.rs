use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Origin of a reading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Source {
    Wifi,
    Ble,
    Sim,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Source::Wifi => "WIFI",
            Source::Ble => "BLE",
            Source::Sim => "SIM",
        };
        write!(f, "{}", name)
    }
}

/// Immutable raw signal-strength sample produced by a scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub source: Source,
    pub id: String,
    /// Signal strength in a dBm-like unit.
    pub rssi: i32,
    /// Seconds, on the producing scanner's clock.
    pub ts: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<HashMap<String, String>>,
}

impl Reading {
    pub fn new(source: Source, id: impl Into<String>, rssi: i32, ts: f64) -> Self {
        Self {
            source,
            id: id.into(),
            rssi,
            ts,
            meta: None,
        }
    }

    pub fn with_meta(mut self, key: &str, value: &str) -> Self {
        self.meta
            .get_or_insert_with(HashMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_carries_optional_meta() {
        let plain = Reading::new(Source::Sim, "dev-1", -60, 0.0);
        assert!(plain.meta.is_none());

        let tagged = plain.with_meta("scenario", "sweep");
        assert_eq!(
            tagged.meta.unwrap().get("scenario").map(String::as_str),
            Some("sweep")
        );
    }

    #[test]
    fn source_names_are_stable() {
        assert_eq!(Source::Wifi.to_string(), "WIFI");
        assert_eq!(Source::Sim.to_string(), "SIM");
    }
}
