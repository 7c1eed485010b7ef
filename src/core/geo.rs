use crate::domain::model::CityCoordinate;
use crate::domain::ports::Geocoder;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCity {
    pub name: String,
    pub coordinate: CityCoordinate,
}

/// 將城市名稱轉成經緯度，只給需要座標的供應商使用
#[derive(Clone)]
pub struct GeoResolver {
    geocoder: Arc<dyn Geocoder>,
}

impl GeoResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    /// Resolves every city concurrently. Cities that fail are dropped, order is preserved.
    pub async fn resolve_all(&self, cities: &[String]) -> Vec<ResolvedCity> {
        let lookups = cities.iter().map(|city| {
            let geocoder = Arc::clone(&self.geocoder);
            async move { (city, geocoder.resolve(city).await) }
        });

        let results = futures::future::join_all(lookups).await;

        let mut resolved = Vec::with_capacity(results.len());
        for (city, result) in results {
            match result {
                Ok(coordinate) => {
                    tracing::debug!(
                        "📍 {} -> ({:.6}, {:.6})",
                        city,
                        coordinate.longitude,
                        coordinate.latitude
                    );
                    resolved.push(ResolvedCity {
                        name: city.clone(),
                        coordinate,
                    });
                }
                Err(e) => {
                    tracing::warn!("Skipping city '{}' for coordinate-based providers: {}", city, e);
                }
            }
        }
        resolved
    }
}
