use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named point queried against every provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self { name: name.into(), latitude, longitude }
    }
}

/// One hourly value sequence; `None` serializes as JSON `null`.
pub type Values = Vec<Option<f64>>;

/// Hourly time series shared by every parameter.
///
/// Every sequence in `values` has the same length as `time`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<String>,
    #[serde(flatten)]
    pub values: BTreeMap<String, Values>,
}

impl HourlySeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn get(&self, parameter: &str) -> Option<&Values> {
        self.values.get(parameter)
    }
}

/// Collected data for a single location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationResult {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub hourly: HourlySeries,
    #[serde(default)]
    pub hourly_units: BTreeMap<String, String>,
}

/// Shape of the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputLayout {
    /// `{ "lastUpdated": ..., "volcanoes": [...] }`
    #[default]
    Wrapped,
    /// A plain JSON array of results.
    Bare,
}

/// The document written to disk at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunOutput {
    Wrapped {
        #[serde(rename = "lastUpdated")]
        last_updated: DateTime<Utc>,
        volcanoes: Vec<LocationResult>,
    },
    Bare(Vec<LocationResult>),
}

impl RunOutput {
    pub fn new(layout: OutputLayout, results: Vec<LocationResult>, now: DateTime<Utc>) -> Self {
        match layout {
            OutputLayout::Wrapped => RunOutput::Wrapped { last_updated: now, volcanoes: results },
            OutputLayout::Bare => RunOutput::Bare(results),
        }
    }

    pub fn results(&self) -> &[LocationResult] {
        match self {
            RunOutput::Wrapped { volcanoes, .. } => volcanoes,
            RunOutput::Bare(results) => results,
        }
    }
}

/// Raw body returned by an Open-Meteo endpoint.
///
/// Error bodies look like `{"error": true, "reason": "..."}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub error: bool,
    pub reason: Option<String>,
    pub hourly: Option<HourlyBlock>,
    pub hourly_units: Option<BTreeMap<String, String>>,
}

/// The `hourly` object as sent by the API; nothing is guaranteed present.
///
/// A parameter may be sent as `null` instead of an array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlyBlock {
    pub time: Option<Vec<String>>,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<Values>>,
}
