use crate::{Config, CollectError, Location, config::ParameterSet, model::ApiResponse};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod open_meteo;

pub use open_meteo::OpenMeteoProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    AirQuality,
    Forecast,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::AirQuality => "air-quality",
            ProviderId::Forecast => "forecast",
        }
    }

    /// Providers in merge order: a later provider wins on key collisions.
    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::AirQuality, ProviderId::Forecast]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An upstream endpoint serving hourly series for a location.
#[async_trait]
pub trait HourlyProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// Parameters this provider is asked for.
    fn parameters(&self) -> &ParameterSet;

    async fn fetch_hourly(&self, location: &Location) -> Result<ApiResponse, CollectError>;
}

/// Construct one provider from config.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Arc<dyn HourlyProvider>> {
    let provider = OpenMeteoProvider::new(
        id,
        config.endpoints.base_url(id).to_owned(),
        config.parameters.for_provider(id).clone(),
        config.forecast_days,
        config.timeout_secs,
    )?;

    Ok(Arc::new(provider))
}

/// Construct every provider with a non-empty parameter set, in merge order.
pub fn providers_from_config(config: &Config) -> anyhow::Result<Vec<Arc<dyn HourlyProvider>>> {
    ProviderId::all()
        .iter()
        .filter(|id| !config.parameters.for_provider(**id).is_empty())
        .map(|id| provider_from_config(*id, config))
        .collect()
}

/// Order-preserving union of every provider's parameters.
pub fn expected_parameters(providers: &[Arc<dyn HourlyProvider>]) -> ParameterSet {
    let mut expected = ParameterSet::default();
    for provider in providers {
        expected.extend(provider.parameters().iter().cloned());
    }
    expected
}
