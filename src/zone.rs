//! Hardiness zone resolution for a coordinate
//!
//! Strategies are tried in order until one produces a zone: the PHZMAPI
//! lookup, the static city table, geographic bounding boxes, and finally a
//! latitude-band estimate that cannot fail. Each tier tags its source so
//! confidence scoring can tell authoritative data from estimates.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::cache::TtlCache;
use crate::config::GrowcastConfig;
use crate::models::{Coordinate, DataSource, ZoneResult, ZoneTemperatureRange};
use crate::region::RegionResolver;

/// Hardiness zones are effectively static; cache for a week
const ZONE_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7);

/// A gazetteer entry tying a city to its hardiness zone
pub(crate) struct CityZone {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    pub zone: &'static str,
}

/// City → zone table consulted when the zone API is unreachable.
///
/// Also serves as the gazetteer for the nearest-city fallback.
const CITY_ZONES: &[CityZone] = &[
    CityZone { name: "New York", latitude: 40.71, longitude: -74.01, zone: "7b" },
    CityZone { name: "Los Angeles", latitude: 34.05, longitude: -118.24, zone: "10b" },
    CityZone { name: "Chicago", latitude: 41.88, longitude: -87.63, zone: "6a" },
    CityZone { name: "Houston", latitude: 29.76, longitude: -95.37, zone: "9a" },
    CityZone { name: "Phoenix", latitude: 33.45, longitude: -112.07, zone: "9b" },
    CityZone { name: "Denver", latitude: 39.74, longitude: -104.99, zone: "5b" },
    CityZone { name: "Seattle", latitude: 47.61, longitude: -122.33, zone: "8b" },
    CityZone { name: "Miami", latitude: 25.76, longitude: -80.19, zone: "10b" },
    CityZone { name: "Atlanta", latitude: 33.75, longitude: -84.39, zone: "8a" },
    CityZone { name: "Boston", latitude: 42.36, longitude: -71.06, zone: "6b" },
    CityZone { name: "Minneapolis", latitude: 44.98, longitude: -93.27, zone: "4b" },
    CityZone { name: "Portland", latitude: 45.52, longitude: -122.68, zone: "8b" },
    CityZone { name: "Dallas", latitude: 32.78, longitude: -96.80, zone: "8a" },
    CityZone { name: "St. Louis", latitude: 38.63, longitude: -90.20, zone: "6b" },
    CityZone { name: "Salt Lake City", latitude: 40.76, longitude: -111.89, zone: "7a" },
    CityZone { name: "London", latitude: 51.51, longitude: -0.13, zone: "9a" },
    CityZone { name: "Manchester", latitude: 53.48, longitude: -2.24, zone: "8b" },
    CityZone { name: "Edinburgh", latitude: 55.95, longitude: -3.19, zone: "8b" },
    CityZone { name: "Toronto", latitude: 43.65, longitude: -79.38, zone: "6a" },
    CityZone { name: "Vancouver", latitude: 49.28, longitude: -123.12, zone: "8b" },
    CityZone { name: "Calgary", latitude: 51.05, longitude: -114.07, zone: "4a" },
    CityZone { name: "Montreal", latitude: 45.50, longitude: -73.57, zone: "5b" },
    CityZone { name: "Sydney", latitude: -33.87, longitude: 151.21, zone: "11a" },
    CityZone { name: "Melbourne", latitude: -37.81, longitude: 144.96, zone: "10a" },
    CityZone { name: "Brisbane", latitude: -27.47, longitude: 153.03, zone: "11b" },
    CityZone { name: "Perth", latitude: -31.95, longitude: 115.86, zone: "11a" },
];

pub(crate) fn city_table() -> &'static [CityZone] {
    CITY_ZONES
}

struct GeoZone {
    lat_range: (f64, f64),
    lng_range: (f64, f64),
    zone: &'static str,
}

/// Ordered bounding boxes; the first box containing the coordinate wins,
/// so more specific boxes come before the broad ones they overlap.
const GEO_ZONES: &[GeoZone] = &[
    GeoZone { lat_range: (24.0, 29.0), lng_range: (-83.0, -79.9), zone: "10b" }, // Florida peninsula
    GeoZone { lat_range: (25.0, 31.0), lng_range: (-98.0, -80.0), zone: "9b" },  // Gulf coast
    GeoZone { lat_range: (31.0, 37.0), lng_range: (-117.0, -108.0), zone: "9a" }, // desert southwest
    GeoZone { lat_range: (32.0, 42.0), lng_range: (-124.5, -117.0), zone: "10a" }, // California coast
    GeoZone { lat_range: (42.0, 49.0), lng_range: (-124.8, -121.0), zone: "8b" }, // Pacific Northwest
    GeoZone { lat_range: (39.0, 45.0), lng_range: (-80.0, -66.0), zone: "6b" },  // northeast US
    GeoZone { lat_range: (43.0, 49.0), lng_range: (-104.0, -87.0), zone: "4b" }, // upper midwest
    GeoZone { lat_range: (49.0, 55.0), lng_range: (-115.0, -96.0), zone: "3b" }, // Canadian prairie
    GeoZone { lat_range: (43.0, 47.0), lng_range: (-80.0, -70.0), zone: "5b" },  // St. Lawrence corridor
    GeoZone { lat_range: (55.0, 59.0), lng_range: (-8.0, 0.0), zone: "8a" },     // Scotland
    GeoZone { lat_range: (50.0, 53.0), lng_range: (-6.0, 2.0), zone: "9a" },     // southern England
    GeoZone { lat_range: (-39.0, -33.0), lng_range: (140.0, 152.0), zone: "10a" }, // southeastern Australia
    GeoZone { lat_range: (-20.0, -10.0), lng_range: (120.0, 150.0), zone: "12a" }, // northern tropics
];

/// One tier of the zone fallback chain
#[async_trait]
trait ZoneStrategy: Send + Sync {
    async fn try_resolve(&self, coordinate: Coordinate) -> Option<ZoneResult>;
}

/// Tier 1: PHZMAPI lookup at 2-decimal-rounded coordinates
struct ZoneApiLookup {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ZoneApiResponse {
    zone: String,
    temperature_range: Option<String>,
}

#[async_trait]
impl ZoneStrategy for ZoneApiLookup {
    async fn try_resolve(&self, coordinate: Coordinate) -> Option<ZoneResult> {
        match self.fetch(coordinate).await {
            Ok(result) => Some(result),
            Err(e) => {
                debug!("zone API failed: {e}, trying fallbacks");
                None
            }
        }
    }
}

impl ZoneApiLookup {
    async fn fetch(&self, coordinate: Coordinate) -> Result<ZoneResult> {
        let (lat, lng) = coordinate.rounded(2);
        let url = format!("{}/{lat:.2}/{lng:.2}.json", self.base_url);

        let response: ZoneApiResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| "Failed to parse zone API response")?;

        // The API may answer "Zone 7b" or a bare "7b"
        let code = response
            .zone
            .split_whitespace()
            .last()
            .unwrap_or(response.zone.as_str())
            .to_string();

        Ok(ZoneResult {
            zone: code,
            source: DataSource::api("PHZMAPI.org"),
            city: None,
            temperature_range: response.temperature_range,
            coordinate,
        })
    }
}

/// Tier 2: nearest city matched against the static city table
struct CityTableLookup {
    regions: Arc<RegionResolver>,
}

#[async_trait]
impl ZoneStrategy for CityTableLookup {
    async fn try_resolve(&self, coordinate: Coordinate) -> Option<ZoneResult> {
        let city = self.regions.nearest_city(coordinate).await?;
        let zone = zone_for_city(&city)?;
        Some(ZoneResult {
            zone: zone.to_string(),
            source: DataSource::database("Hardiness Zones Database (City)"),
            city: Some(city),
            temperature_range: None,
            coordinate,
        })
    }
}

/// Tier 3: geographic bounding boxes
struct GeoBoxLookup;

#[async_trait]
impl ZoneStrategy for GeoBoxLookup {
    async fn try_resolve(&self, coordinate: Coordinate) -> Option<ZoneResult> {
        find_geo_zone(coordinate).map(|zone| ZoneResult {
            zone: zone.to_string(),
            source: DataSource::database("Hardiness Zones Database (Geographic)"),
            city: None,
            temperature_range: None,
            coordinate,
        })
    }
}

/// Tier 4: latitude-band estimate, hemisphere independent; never fails
struct LatitudeEstimate;

#[async_trait]
impl ZoneStrategy for LatitudeEstimate {
    async fn try_resolve(&self, coordinate: Coordinate) -> Option<ZoneResult> {
        Some(latitude_zone_result(coordinate))
    }
}

fn latitude_zone_result(coordinate: Coordinate) -> ZoneResult {
    ZoneResult {
        zone: estimate_zone_from_latitude(coordinate.latitude).to_string(),
        source: DataSource::estimated("Estimated Zone (latitude-based)"),
        city: None,
        temperature_range: None,
        coordinate,
    }
}

/// Service resolving a hardiness zone for a coordinate
pub struct ZoneResolver {
    cache: Arc<TtlCache>,
    strategies: Vec<Box<dyn ZoneStrategy>>,
}

impl ZoneResolver {
    pub fn new(
        config: &GrowcastConfig,
        cache: Arc<TtlCache>,
        regions: Arc<RegionResolver>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.apis.timeout_seconds.into()))
            .user_agent(concat!("GrowCast/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        let strategies: Vec<Box<dyn ZoneStrategy>> = vec![
            Box::new(ZoneApiLookup {
                client,
                base_url: config.apis.zone_url.clone(),
            }),
            Box::new(CityTableLookup { regions }),
            Box::new(GeoBoxLookup),
            Box::new(LatitudeEstimate),
        ];

        Ok(Self { cache, strategies })
    }

    /// Resolve the hardiness zone for a coordinate. First strategy to
    /// succeed wins; the latitude estimate guarantees a result.
    #[instrument(skip(self), fields(lat = coordinate.latitude, lng = coordinate.longitude))]
    pub async fn resolve(&self, coordinate: Coordinate) -> ZoneResult {
        let cache_key = coordinate.cache_key("zone");
        if let Some(cached) = self.cache.get::<ZoneResult>(&cache_key) {
            return cached;
        }

        for strategy in &self.strategies {
            if let Some(result) = strategy.try_resolve(coordinate).await {
                self.cache.set(&cache_key, &result, ZONE_TTL, true);
                return result;
            }
        }

        // The latitude tier always answers; this is only for completeness
        let result = latitude_zone_result(coordinate);
        self.cache.set(&cache_key, &result, ZONE_TTL, true);
        result
    }
}

/// Match a formatted city name ("Denver, Colorado" or "Denver") against the
/// city table
fn zone_for_city(city: &str) -> Option<&'static str> {
    let city_part = city.split(',').next().unwrap_or(city).trim();
    CITY_ZONES
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(city_part))
        .map(|entry| entry.zone)
}

/// First bounding box containing the coordinate
fn find_geo_zone(coordinate: Coordinate) -> Option<&'static str> {
    GEO_ZONES
        .iter()
        .find(|geo| {
            coordinate.latitude >= geo.lat_range.0
                && coordinate.latitude <= geo.lat_range.1
                && coordinate.longitude >= geo.lng_range.0
                && coordinate.longitude <= geo.lng_range.1
        })
        .map(|geo| geo.zone)
}

/// Estimate a hardiness zone from absolute latitude alone.
///
/// Monotonic: warmer zones near the equator, colder toward the poles.
/// Ignores elevation, ocean currents and everything else that makes real
/// zone maps interesting.
#[must_use]
pub fn estimate_zone_from_latitude(latitude: f64) -> &'static str {
    let abs_lat = latitude.abs();

    if abs_lat < 26.0 {
        "11a"
    } else if abs_lat < 28.0 {
        "10b"
    } else if abs_lat < 30.0 {
        "10a"
    } else if abs_lat < 32.0 {
        "9b"
    } else if abs_lat < 34.0 {
        "9a"
    } else if abs_lat < 36.0 {
        "8b"
    } else if abs_lat < 38.0 {
        "8a"
    } else if abs_lat < 40.0 {
        "7b"
    } else if abs_lat < 42.0 {
        "7a"
    } else if abs_lat < 44.0 {
        "6b"
    } else if abs_lat < 46.0 {
        "6a"
    } else if abs_lat < 48.0 {
        "5b"
    } else if abs_lat < 50.0 {
        "5a"
    } else if abs_lat < 52.0 {
        "4b"
    } else if abs_lat < 54.0 {
        "4a"
    } else if abs_lat < 56.0 {
        "3b"
    } else if abs_lat < 58.0 {
        "3a"
    } else if abs_lat < 60.0 {
        "2b"
    } else if abs_lat < 65.0 {
        "2a"
    } else {
        "1a"
    }
}

/// Parse the numeric part of a zone code ("7b" → 7). Defaults to 6 when
/// the code is missing or malformed.
#[must_use]
pub fn zone_number(zone: &str) -> u8 {
    let digits: String = zone.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(6)
}

/// Winter minimum band for a zone: zone 1 bottoms out at -60°F and each
/// zone adds 10°F
#[must_use]
pub fn temperature_range(zone: &str) -> ZoneTemperatureRange {
    let min_f = (i32::from(zone_number(zone)) - 1) * 10 - 60;
    ZoneTemperatureRange {
        min_f,
        min_c: ((f64::from(min_f) - 32.0) * 5.0 / 9.0).round() as i32,
    }
}

/// Example cities for a zone, for display alongside the zone code
#[must_use]
pub fn zone_examples(zone: &str) -> &'static [&'static str] {
    match zone_number(zone) {
        3 => &["International Falls, MN", "Fargo, ND"],
        4 => &["Minneapolis, MN", "Calgary, AB"],
        5 => &["Denver, CO", "Des Moines, IA"],
        6 => &["Chicago, IL", "St. Louis, MO"],
        7 => &["Oklahoma City, OK", "Richmond, VA"],
        8 => &["Atlanta, GA", "Seattle, WA"],
        9 => &["Houston, TX", "Orlando, FL"],
        10 => &["Miami, FL", "Los Angeles, CA"],
        11 => &["Honolulu, HI", "Key West, FL"],
        _ => &[],
    }
}
