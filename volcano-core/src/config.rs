use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    model::{Location, OutputLayout},
    provider::ProviderId,
};

pub const DEFAULT_AIR_QUALITY_URL: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_OUTPUT_PATH: &str = "data/air-quality.json";

/// Ordered list of parameter names without duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ParameterSet(Vec<String>);

impl ParameterSet {
    /// Append a parameter unless it is already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.0.contains(&name) {
            return false;
        }
        self.0.push(name);
        true
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|p| p == name)
    }

    /// Comma-joined form used in query strings.
    pub fn join(&self) -> String {
        self.0.join(",")
    }
}

impl Extend<String> for ParameterSet {
    fn extend<T: IntoIterator<Item = String>>(&mut self, iter: T) {
        for name in iter {
            self.insert(name);
        }
    }
}

impl From<Vec<String>> for ParameterSet {
    fn from(names: Vec<String>) -> Self {
        let mut set = ParameterSet::default();
        set.extend(names);
        set
    }
}

impl<const N: usize> From<[&str; N]> for ParameterSet {
    fn from(names: [&str; N]) -> Self {
        names.iter().map(|s| s.to_string()).collect::<Vec<_>>().into()
    }
}

impl From<ParameterSet> for Vec<String> {
    fn from(set: ParameterSet) -> Self {
        set.0
    }
}

/// Base URLs of the upstream endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub air_quality: String,
    pub forecast: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            air_quality: DEFAULT_AIR_QUALITY_URL.to_string(),
            forecast: DEFAULT_FORECAST_URL.to_string(),
        }
    }
}

impl Endpoints {
    pub fn base_url(&self, id: ProviderId) -> &str {
        match id {
            ProviderId::AirQuality => &self.air_quality,
            ProviderId::Forecast => &self.forecast,
        }
    }
}

/// Hourly parameters requested from each endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub air_quality: ParameterSet,
    pub forecast: ParameterSet,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            air_quality: ParameterSet::from([
                "sulphur_dioxide",
                "carbon_monoxide",
                "nitrogen_dioxide",
            ]),
            forecast: ParameterSet::from(["wind_speed_10m", "wind_direction_10m"]),
        }
    }
}

impl Parameters {
    pub fn for_provider(&self, id: ProviderId) -> &ParameterSet {
        match id {
            ProviderId::AirQuality => &self.air_quality,
            ProviderId::Forecast => &self.forecast,
        }
    }
}

fn default_locations() -> Vec<Location> {
    vec![
        Location::new("Kilauea", 19.4069, -155.2834),
        Location::new("Poás", 10.2, -84.23),
        Location::new("Etna", 37.75, 14.99),
    ]
}

/// Everything a collection run needs, built once at startup.
///
/// Example TOML:
/// ```toml
/// output_path = "data/air-quality.json"
/// forecast_days = 1
///
/// [[locations]]
/// name = "Kilauea"
/// latitude = 19.4069
/// longitude = -155.2834
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the JSON snapshot is written, relative to the working directory.
    pub output_path: PathBuf,

    /// Length of the forecast window in days.
    pub forecast_days: u8,

    /// Per-request timeout; unset means requests may wait forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Cap on locations collected at once; unset means all at once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_locations: Option<usize>,

    pub layout: OutputLayout,

    pub endpoints: Endpoints,

    pub parameters: Parameters,

    pub locations: Vec<Location>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            forecast_days: 1,
            timeout_secs: None,
            max_concurrent_locations: None,
            layout: OutputLayout::default(),
            endpoints: Endpoints::default(),
            parameters: Parameters::default(),
            locations: default_locations(),
        }
    }
}

impl Config {
    /// Load config from `path`, or from the platform config file.
    ///
    /// An explicit path must exist. The platform file is optional: if it is
    /// missing, built-in defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => {
                if !p.exists() {
                    bail!("Config file not found: {}", p.display());
                }
                p.to_path_buf()
            }
            None => {
                let p = Self::config_file_path()?;
                if !p.exists() {
                    return Ok(Self::default());
                }
                p
            }
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the platform config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "volcano-aq", "volcano-aq")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Reject configs that could never produce output.
    pub fn validate(&self) -> Result<()> {
        if self.locations.is_empty() {
            bail!("No locations configured");
        }

        for loc in &self.locations {
            if !(-90.0..=90.0).contains(&loc.latitude) || !(-180.0..=180.0).contains(&loc.longitude)
            {
                bail!(
                    "Invalid coordinates for '{}': latitude must be -90 to 90, longitude must be -180 to 180",
                    loc.name
                );
            }
        }

        if self.parameters.air_quality.is_empty() && self.parameters.forecast.is_empty() {
            bail!("No hourly parameters configured");
        }

        // `time` shares the flattened `hourly` object with the parameters.
        for id in ProviderId::all() {
            if self.parameters.for_provider(*id).contains("time") {
                bail!("'time' cannot be requested as an hourly parameter ({id})");
            }
        }

        if !(1..=16).contains(&self.forecast_days) {
            bail!("forecast_days must be between 1 and 16, got {}", self.forecast_days);
        }

        if self.max_concurrent_locations == Some(0) {
            bail!("max_concurrent_locations must be at least 1");
        }

        Ok(())
    }
}
