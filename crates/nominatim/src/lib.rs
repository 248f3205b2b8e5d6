use std::{env, error, fmt, sync::Arc};

use async_trait::async_trait;
use log::warn;
use model::shelter::RegionInfo;
use registry::geocode::ReverseGeocode;
use serde::Deserialize;

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

// Nominatim's usage policy requires an identifying agent.
const USER_AGENT: &str = concat!("shelter-registry/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub enum GeocodeError {
    RequestError(Arc<reqwest::Error>),
    InvalidResponse {
        status_code: reqwest::StatusCode,
        url: String,
    },
}

impl error::Error for GeocodeError {}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GeocodeError::RequestError(why) => {
                write!(f, "HTTP request error: {}", why)
            }
            GeocodeError::InvalidResponse { status_code, url } => {
                write!(f, "'{}' answered with status code {}", url, status_code)
            }
        }
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(why: reqwest::Error) -> Self {
        GeocodeError::RequestError(Arc::new(why))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    address: Option<ReverseAddress>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ReverseAddress {
    state: Option<String>,
    county: Option<String>,
    city: Option<String>,
}

impl ReverseResponse {
    fn into_region(self) -> RegionInfo {
        let address = self.address.unwrap_or_default();
        RegionInfo {
            state: address.state.unwrap_or_default(),
            // Nominatim reports districts as counties; fall back to the
            // city for urban coordinates without one.
            district: address.county.or(address.city).unwrap_or_default(),
            address: self.display_name.unwrap_or_default(),
        }
    }
}

/// Reverse-geocode client for the OpenStreetMap Nominatim API.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Base URL from `NOMINATIM_URL`, defaulting to the public instance.
    pub fn from_env() -> Self {
        let base_url =
            env::var("NOMINATIM_URL").unwrap_or_else(|_| NOMINATIM_URL.to_owned());
        Self::new(base_url)
    }

    async fn try_reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<RegionInfo, GeocodeError> {
        let url = format!(
            "{}/reverse?lat={}&lon={}&format=json",
            self.base_url, latitude, longitude
        );
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(GeocodeError::InvalidResponse {
                status_code: response.status(),
                url,
            });
        }
        let parsed: ReverseResponse = response.json().await?;
        Ok(parsed.into_region())
    }
}

#[async_trait]
impl ReverseGeocode for NominatimClient {
    /// Failures degrade to empty region fields; placement must not depend
    /// on the geocoder being reachable.
    async fn reverse(&self, latitude: f64, longitude: f64) -> RegionInfo {
        match self.try_reverse(latitude, longitude).await {
            Ok(region) => region,
            Err(why) => {
                warn!(
                    "reverse geocode for ({}, {}) degraded: {}",
                    latitude, longitude, why
                );
                RegionInfo::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_reverse_payload() {
        let parsed: ReverseResponse = serde_json::from_str(
            r#"{
                "display_name": "Mumbai, Maharashtra, India",
                "address": {
                    "city": "Mumbai",
                    "state": "Maharashtra",
                    "country": "India"
                }
            }"#,
        )
        .unwrap();
        let region = parsed.into_region();
        assert_eq!(region.state, "Maharashtra");
        assert_eq!(region.district, "Mumbai");
        assert_eq!(region.address, "Mumbai, Maharashtra, India");
    }

    #[test]
    fn county_takes_precedence_over_city() {
        let parsed: ReverseResponse = serde_json::from_str(
            r#"{
                "display_name": "Somewhere",
                "address": {"county": "Thane", "city": "Navi Mumbai"}
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.into_region().district, "Thane");
    }

    #[test]
    fn missing_fields_become_empty_strings() {
        let parsed: ReverseResponse = serde_json::from_str(r#"{}"#).unwrap();
        let region = parsed.into_region();
        assert_eq!(region, RegionInfo::default());
    }
}
