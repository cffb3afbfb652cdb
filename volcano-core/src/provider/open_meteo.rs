use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

use crate::{
    CollectError,
    config::ParameterSet,
    model::{ApiResponse, Location},
};

use super::{HourlyProvider, ProviderId};

/// Client for one Open-Meteo endpoint (air quality or weather forecast).
///
/// Both endpoints share the same query format and response shape, so a
/// single implementation serves either, distinguished by `id`.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    id: ProviderId,
    base_url: Url,
    parameters: ParameterSet,
    forecast_days: u8,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(
        id: ProviderId,
        base_url: String,
        parameters: ParameterSet,
        forecast_days: u8,
        timeout_secs: Option<u64>,
    ) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build()?;
        let base_url = Url::parse(&base_url)
            .with_context(|| format!("Invalid {id} endpoint URL '{base_url}'"))?;

        Ok(Self { id, base_url, parameters, forecast_days, http })
    }

    /// Full query URL for `location`. Every value is percent-encoded.
    pub fn build_url(&self, location: &Location) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("latitude", &location.latitude.to_string())
            .append_pair("longitude", &location.longitude.to_string())
            .append_pair("hourly", &self.parameters.join())
            .append_pair("forecast_days", &self.forecast_days.to_string());
        url
    }
}

#[async_trait]
impl HourlyProvider for OpenMeteoProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    async fn fetch_hourly(&self, location: &Location) -> Result<ApiResponse, CollectError> {
        let url = self.build_url(location);
        debug!(provider = %self.id, location = %location.name, url = %url, "Sending request");

        let provider = self.id;
        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| CollectError::Transport { provider, source })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| CollectError::Transport { provider, source })?;

        if !status.is_success() {
            // Open-Meteo answers bad requests with a JSON error body.
            if let Ok(ApiResponse { error: true, reason, .. }) =
                serde_json::from_str::<ApiResponse>(&body)
            {
                return Err(CollectError::Api {
                    provider,
                    reason: reason.unwrap_or_else(|| format!("HTTP {status}")),
                });
            }
            return Err(CollectError::HttpStatus { provider, status, body: truncate_body(&body) });
        }

        let parsed: ApiResponse =
            serde_json::from_str(&body).map_err(|source| CollectError::Parse { provider, source })?;

        if parsed.error {
            return Err(CollectError::Api {
                provider,
                reason: parsed.reason.unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        Ok(parsed)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
