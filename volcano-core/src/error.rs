use reqwest::StatusCode;
use thiserror::Error;

use crate::provider::ProviderId;

/// Reasons a single location produces no result.
///
/// None of these abort a run; the collector logs them and drops the location.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("request to {provider} failed")]
    Transport {
        provider: ProviderId,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} request failed with status {status}: {body}")]
    HttpStatus {
        provider: ProviderId,
        status: StatusCode,
        body: String,
    },

    #[error("{provider} reported an error: {reason}")]
    Api { provider: ProviderId, reason: String },

    #[error("failed to parse {provider} response")]
    Parse {
        provider: ProviderId,
        #[source]
        source: serde_json::Error,
    },

    #[error("merged response has no usable hourly time series")]
    MissingTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_reason() {
        let err = CollectError::Api {
            provider: ProviderId::AirQuality,
            reason: "Parameter 'hourly' is invalid".into(),
        };
        let msg = err.to_string();

        assert!(msg.contains("air-quality"));
        assert!(msg.contains("Parameter 'hourly' is invalid"));
    }

    #[test]
    fn http_status_display_includes_code() {
        let err = CollectError::HttpStatus {
            provider: ProviderId::Forecast,
            status: StatusCode::BAD_GATEWAY,
            body: "upstream down".into(),
        };

        assert!(err.to_string().contains("502"));
    }
}
