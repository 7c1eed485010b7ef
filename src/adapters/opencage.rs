use crate::config::toml_config::GeocodingConfig;
use crate::domain::model::CityCoordinate;
use crate::domain::ports::{Geocoder, HttpFetcher};
use crate::utils::error::{EventSearchError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    lat: f64,
    lng: f64,
}

/// OpenCage forward geocoding
pub struct OpenCageGeocoder {
    config: GeocodingConfig,
    fetcher: Arc<dyn HttpFetcher>,
}

impl OpenCageGeocoder {
    pub fn new(config: &GeocodingConfig, fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self {
            config: config.clone(),
            fetcher,
        }
    }

    fn geocoding_error(city: &str, message: impl Into<String>) -> EventSearchError {
        EventSearchError::Geocoding {
            city: city.to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Geocoder for OpenCageGeocoder {
    async fn resolve(&self, city: &str) -> Result<CityCoordinate> {
        let mut url = Url::parse(&self.config.endpoint)
            .map_err(|e| Self::geocoding_error(city, format!("invalid endpoint: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("q", city)
            .append_pair("key", &self.config.api_key)
            .append_pair("limit", "1")
            .append_pair("no_annotations", "1");

        let response = self.fetcher.get(&url).await?;
        if !response.is_success() {
            return Err(Self::geocoding_error(
                city,
                format!("HTTP {}", response.status),
            ));
        }

        let decoded: GeocodeResponse = serde_json::from_str(&response.body)
            .map_err(|e| Self::geocoding_error(city, e.to_string()))?;

        decoded
            .results
            .into_iter()
            .next()
            .map(|result| CityCoordinate {
                longitude: result.geometry.lng,
                latitude: result.geometry.lat,
            })
            .ok_or_else(|| EventSearchError::CityNotFound {
                city: city.to_string(),
            })
    }
}
