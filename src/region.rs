//! Region resolution for a coordinate
//!
//! Primary path is the OpenWeatherMap reverse-geocoding API; when that is
//! unavailable the resolver falls back to a pure bounding-box country
//! estimate. Either way the sub-national region is a coarse bucket assigned
//! by rule from the coordinates, not a precise boundary lookup.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use haversine::{Location as HaversineLocation, Units, distance};
use tracing::{debug, instrument};

use crate::cache::TtlCache;
use crate::config::GrowcastConfig;
use crate::models::{Coordinate, CountryCode, DataSource, Region, RegionResult};
use crate::zone;

/// Region lookups change rarely; cache for 30 days
const REGION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 30);
const CITY_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 30);

/// Maximum distance at which a gazetteer entry counts as the nearest city
const NEAREST_CITY_RADIUS_KM: f64 = 150.0;

/// Reverse-geocoding API response structures
mod openweather {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct GeocodeEntry {
        pub name: String,
        pub country: Option<String>,
        pub state: Option<String>,
    }
}

#[derive(Debug)]
struct GeoPlace {
    name: String,
    country: Option<String>,
    state: Option<String>,
}

/// Service resolving country/region/city for a coordinate
pub struct RegionResolver {
    client: reqwest::Client,
    cache: Arc<TtlCache>,
    geocoding_url: String,
    api_key: Option<String>,
}

impl RegionResolver {
    /// Create a resolver with a short-timeout HTTP client
    pub fn new(config: &GrowcastConfig, cache: Arc<TtlCache>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.apis.timeout_seconds.into()))
            .user_agent(concat!("GrowCast/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self {
            client,
            cache,
            geocoding_url: config.apis.geocoding_url.clone(),
            api_key: config.apis.geocoding_api_key.clone(),
        })
    }

    /// Resolve country/region/city for a coordinate.
    ///
    /// Never fails: when the geocoder is unreachable the result is estimated
    /// from coordinates and tagged accordingly. A `hint` replaces the
    /// bounding-box country estimate in the fallback path only.
    #[instrument(skip(self), fields(lat = coordinate.latitude, lng = coordinate.longitude))]
    pub async fn resolve(
        &self,
        coordinate: Coordinate,
        hint: Option<CountryCode>,
    ) -> RegionResult {
        let cache_key = coordinate.cache_key("region");
        if let Some(cached) = self.cache.get::<RegionResult>(&cache_key) {
            return cached;
        }

        let result = match self.reverse_geocode(coordinate).await {
            Ok(Some(place)) => {
                let country_code = place
                    .country
                    .as_deref()
                    .map(CountryCode::from_iso)
                    .unwrap_or(CountryCode::Us);

                let mut region = region_bucket(coordinate, country_code);
                // The geocoder's county/state name is more specific than the
                // latitude rule for the UK
                if country_code == CountryCode::Uk {
                    if let Some(state) = place.state.as_deref() {
                        if let Some(named) = uk_region_from_state(state) {
                            region = named;
                        }
                    }
                }

                RegionResult {
                    country_code,
                    country: place.country,
                    region,
                    city: Some(place.name),
                    state: place.state,
                    source: DataSource::api("OpenWeatherMap Geocoding"),
                }
            }
            Ok(None) | Err(_) => {
                let country_code = hint.unwrap_or_else(|| estimate_country(coordinate));
                RegionResult {
                    country_code,
                    country: None,
                    region: region_bucket(coordinate, country_code),
                    city: None,
                    state: None,
                    source: DataSource::estimated("Estimated Region (coordinates-based)"),
                }
            }
        };

        self.cache.set(&cache_key, &result, REGION_TTL, true);
        result
    }

    /// Find the nearest named city for a coordinate, formatted as
    /// "City, State" for US results. Used by the zone resolver's city tier.
    #[instrument(skip(self), fields(lat = coordinate.latitude, lng = coordinate.longitude))]
    pub async fn nearest_city(&self, coordinate: Coordinate) -> Option<String> {
        let cache_key = coordinate.cache_key("city");
        if let Some(cached) = self.cache.get::<String>(&cache_key) {
            return Some(cached);
        }

        let name = match self.reverse_geocode(coordinate).await {
            Ok(Some(place)) => Some(format_city(&place)),
            Ok(None) => nearest_known_city(coordinate),
            Err(e) => {
                debug!("city lookup failed: {e}, trying gazetteer");
                nearest_known_city(coordinate)
            }
        };

        if let Some(name) = &name {
            self.cache.set(&cache_key, name, CITY_TTL, true);
        }
        name
    }

    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<Option<GeoPlace>> {
        let Some(api_key) = &self.api_key else {
            debug!("no geocoding API key configured, skipping reverse geocode");
            return Ok(None);
        };

        let entries: Vec<openweather::GeocodeEntry> = self
            .client
            .get(&self.geocoding_url)
            .query(&[
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("limit", "1".to_string()),
                ("appid", api_key.clone()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| "Failed to parse reverse geocoding response")?;

        Ok(entries.into_iter().next().map(|entry| GeoPlace {
            name: entry.name,
            country: entry.country,
            state: entry.state,
        }))
    }
}

fn format_city(place: &GeoPlace) -> String {
    match (&place.country, &place.state) {
        (Some(country), Some(state)) if country == "US" => {
            format!("{}, {}", place.name, state)
        }
        _ => place.name.clone(),
    }
}

/// Nearest static gazetteer entry within [`NEAREST_CITY_RADIUS_KM`]
fn nearest_known_city(coordinate: Coordinate) -> Option<String> {
    let here = HaversineLocation {
        latitude: coordinate.latitude,
        longitude: coordinate.longitude,
    };

    zone::city_table()
        .iter()
        .map(|city| {
            let there = HaversineLocation {
                latitude: city.latitude,
                longitude: city.longitude,
            };
            (city, distance(here, there, Units::Kilometers))
        })
        .filter(|(_, km)| *km <= NEAREST_CITY_RADIUS_KM)
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(city, _)| city.name.to_string())
}

/// Assign the coarse region bucket for a coordinate within a country
#[must_use]
pub fn region_bucket(coordinate: Coordinate, country: CountryCode) -> Region {
    let lat = coordinate.latitude;
    let lng = coordinate.longitude;

    match country {
        CountryCode::Us => {
            if lng < -114.0 {
                Region::West
            } else if lng < -104.0 {
                Region::Northwest
            } else if lng < -94.0 {
                Region::Midwest
            } else if lng < -84.0 {
                if lat < 36.0 {
                    Region::Southwest
                } else {
                    Region::Midwest
                }
            } else if lat < 36.0 {
                Region::Southeast
            } else {
                Region::Northeast
            }
        }
        CountryCode::Uk => {
            if lat > 54.0 {
                Region::North
            } else if lat > 52.0 {
                Region::Midlands
            } else {
                Region::South
            }
        }
        CountryCode::Ca => {
            if lng < -125.0 {
                Region::WestCoast
            } else if lng < -95.0 {
                Region::Prairie
            } else if lng < -75.0 {
                Region::Central
            } else {
                Region::Atlantic
            }
        }
        CountryCode::Au => {
            if lat < -30.0 {
                Region::Southern
            } else if lat < -23.0 {
                Region::Central
            } else {
                Region::Northern
            }
        }
    }
}

/// Map a UK county/region name from the geocoder onto a bucket
fn uk_region_from_state(state: &str) -> Option<Region> {
    const NORTH: &[&str] = &[
        "Scotland",
        "Northumberland",
        "Cumbria",
        "Durham",
        "North Yorkshire",
    ];
    const MIDLANDS: &[&str] = &[
        "Derbyshire",
        "Nottinghamshire",
        "West Midlands",
        "Midlands",
        "Leicester",
    ];

    if NORTH.iter().any(|name| state.contains(name)) {
        Some(Region::North)
    } else if MIDLANDS.iter().any(|name| state.contains(name)) {
        Some(Region::Midlands)
    } else {
        Some(Region::South)
    }
}

/// Rough bounding-box country estimate used when geocoding is unavailable
#[must_use]
pub fn estimate_country(coordinate: Coordinate) -> CountryCode {
    let lat = coordinate.latitude;
    let lng = coordinate.longitude;

    if lat > 49.0 && lat < 61.0 && lng > -11.0 && lng < 2.0 {
        return CountryCode::Uk;
    }
    if lat < -10.0 && lat > -45.0 && lng > 110.0 && lng < 155.0 {
        return CountryCode::Au;
    }
    if lat > 48.0 && lng > -141.0 && lng < -52.0 {
        return CountryCode::Ca;
    }
    CountryCode::Us
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;
    use rstest::rstest;
    use tempfile::TempDir;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    fn offline_resolver(dir: &TempDir) -> RegionResolver {
        // No geocoding API key configured: resolve() goes straight to the
        // coordinate-based estimate
        let config = GrowcastConfig::default();
        let cache = Arc::new(TtlCache::open(dir.path()).unwrap());
        RegionResolver::new(&config, cache).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_without_geocoder_is_estimated() {
        let dir = TempDir::new().unwrap();
        let resolver = offline_resolver(&dir);

        let result = resolver.resolve(coord(51.51, -0.13), None).await;
        assert_eq!(result.country_code, CountryCode::Uk);
        assert_eq!(result.region, Region::South);
        assert_eq!(result.source.kind, SourceKind::Estimated);
        assert!(result.city.is_none());
    }

    #[tokio::test]
    async fn test_country_hint_replaces_estimate_in_fallback() {
        let dir = TempDir::new().unwrap();
        let resolver = offline_resolver(&dir);

        // Paris sits outside every country bounding box; the hint decides
        let result = resolver
            .resolve(coord(48.85, 2.35), Some(CountryCode::Uk))
            .await;
        assert_eq!(result.country_code, CountryCode::Uk);
        assert_eq!(result.region, Region::South);
        assert_eq!(result.source.kind, SourceKind::Estimated);
    }

    #[rstest]
    #[case(37.77, -122.42, Region::West)] // San Francisco
    #[case(39.74, -104.99, Region::Northwest)] // Denver
    #[case(41.26, -96.0, Region::Midwest)] // Omaha
    #[case(35.15, -90.05, Region::Southwest)] // Memphis
    #[case(33.75, -84.39, Region::Southeast)] // Atlanta
    #[case(42.36, -71.06, Region::Northeast)] // Boston
    fn test_us_region_buckets(#[case] lat: f64, #[case] lng: f64, #[case] expected: Region) {
        assert_eq!(region_bucket(coord(lat, lng), CountryCode::Us), expected);
    }

    #[rstest]
    #[case(55.95, -3.19, Region::North)] // Edinburgh
    #[case(52.95, -1.15, Region::Midlands)] // Nottingham
    #[case(51.51, -0.13, Region::South)] // London
    fn test_uk_region_buckets(#[case] lat: f64, #[case] lng: f64, #[case] expected: Region) {
        assert_eq!(region_bucket(coord(lat, lng), CountryCode::Uk), expected);
    }

    #[rstest]
    #[case(49.28, -123.12, Region::Prairie)] // Vancouver sits east of the -125 cutoff
    #[case(53.55, -113.49, Region::Prairie)] // Edmonton
    #[case(43.65, -79.38, Region::Central)] // Toronto
    #[case(44.65, -63.57, Region::Atlantic)] // Halifax
    #[case(54.0, -130.0, Region::WestCoast)]
    fn test_ca_region_buckets(#[case] lat: f64, #[case] lng: f64, #[case] expected: Region) {
        assert_eq!(region_bucket(coord(lat, lng), CountryCode::Ca), expected);
    }

    #[rstest]
    #[case(-37.81, 144.96, Region::Southern)] // Melbourne
    #[case(-27.47, 153.03, Region::Central)] // Brisbane
    #[case(-12.46, 130.84, Region::Northern)] // Darwin
    fn test_au_region_buckets(#[case] lat: f64, #[case] lng: f64, #[case] expected: Region) {
        assert_eq!(region_bucket(coord(lat, lng), CountryCode::Au), expected);
    }

    #[test]
    fn test_estimate_country_boxes() {
        assert_eq!(estimate_country(coord(51.51, -0.13)), CountryCode::Uk);
        assert_eq!(estimate_country(coord(-33.87, 151.21)), CountryCode::Au);
        assert_eq!(estimate_country(coord(53.55, -113.49)), CountryCode::Ca);
        assert_eq!(estimate_country(coord(39.74, -104.99)), CountryCode::Us);
        // Everything unmatched defaults to US
        assert_eq!(estimate_country(coord(48.85, 2.35)), CountryCode::Us);
    }

    #[test]
    fn test_uk_region_from_state() {
        assert_eq!(uk_region_from_state("Scotland"), Some(Region::North));
        assert_eq!(uk_region_from_state("Nottinghamshire"), Some(Region::Midlands));
        assert_eq!(uk_region_from_state("Kent"), Some(Region::South));
    }

    #[test]
    fn test_format_city_us_includes_state() {
        let place = GeoPlace {
            name: "Denver".to_string(),
            country: Some("US".to_string()),
            state: Some("Colorado".to_string()),
        };
        assert_eq!(format_city(&place), "Denver, Colorado");

        let abroad = GeoPlace {
            name: "London".to_string(),
            country: Some("GB".to_string()),
            state: Some("England".to_string()),
        };
        assert_eq!(format_city(&abroad), "London");
    }

    #[test]
    fn test_nearest_known_city() {
        // A point just outside Denver resolves to it
        let city = nearest_known_city(coord(39.9, -105.1));
        assert_eq!(city.as_deref(), Some("Denver"));

        // The middle of the Pacific has no city within range
        assert_eq!(nearest_known_city(coord(0.0, -150.0)), None);
    }
}
