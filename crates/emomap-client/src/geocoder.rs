//! Reverse geocoding adapters

use async_trait::async_trait;
use emomap_common::GeocoderConfig;
use emomap_core::{ApiResult, DomainError, LatLng, ReverseGeocoder};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{status_error, transport_error};

const GEOCODER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
}

/// Nominatim `/reverse` endpoint
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Nominatim rejects requests without a User-Agent
    pub fn new(config: &GeocoderConfig) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| DomainError::InternalError(format!("invalid user agent: {e}")))?;
        headers.insert(USER_AGENT, agent);

        let client = Client::builder()
            .timeout(GEOCODER_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn reverse_url(&self, position: LatLng) -> String {
        format!(
            "{}/reverse?format=json&lat={}&lon={}&zoom=18&addressdetails=1",
            self.base_url, position.lat, position.lng
        )
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    #[instrument(skip(self), fields(position = %position))]
    async fn reverse(&self, position: LatLng) -> ApiResult<Option<String>> {
        let response = self
            .client
            .get(self.reverse_url(position))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &body));
        }

        let parsed: ReverseResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Decode(e.to_string()))?;
        let address = parsed.display_name.filter(|name| !name.trim().is_empty());
        debug!(found = address.is_some(), "Reverse geocoding finished");
        Ok(address)
    }
}

/// Geocoder used when lookups are switched off
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGeocoder;

#[async_trait]
impl ReverseGeocoder for DisabledGeocoder {
    async fn reverse(&self, _position: LatLng) -> ApiResult<Option<String>> {
        Ok(None)
    }
}
