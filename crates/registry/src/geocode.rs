use async_trait::async_trait;
use model::shelter::RegionInfo;

/// Coordinate-to-region lookup. Geocoding is an enrichment, not a hard
/// dependency: implementations swallow transport and parse failures and
/// return an empty [`RegionInfo`] instead of an error, so a degraded
/// geocoder can never block shelter placement.
#[async_trait]
pub trait ReverseGeocode: Send + Sync {
    async fn reverse(&self, latitude: f64, longitude: f64) -> RegionInfo;
}
