//! Growing data report service
//!
//! Owns the cache and the three resolvers, fans resolution out concurrently,
//! and assembles the structured payloads consumed by outer layers. The
//! assembly steps are pure functions of already-resolved data so they can be
//! tested without any network.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use crate::cache::{CacheStats, TtlCache};
use crate::config::GrowcastConfig;
use crate::frost;
use crate::models::{
    Coordinate, CountryCode, FrostDates, PlantDescriptor, PlantingSuitability, PlantingWindow,
    Region, RegionResult, Season, SoilTempRange, SoilTemperature, WeatherResult, ZoneResult,
};
use crate::planting;
use crate::region::RegionResolver;
use crate::tips::{self, GrowingTip};
use crate::weather::WeatherResolver;
use crate::zone::{self, ZoneResolver};

/// Location fields echoed in every report
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LocationSummary {
    pub latitude: f64,
    pub longitude: f64,
    pub city: Option<String>,
    pub region: Region,
    pub country_code: CountryCode,
    pub country: Option<String>,
}

/// Weather fields echoed in the sowing report
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct WeatherSummary {
    pub current_temp_f: f64,
    pub current_temp_c: f64,
    pub precipitation_probability: f64,
    pub soil_temperature: SoilTemperature,
}

/// Planting-specific section of the sowing report
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PlantingData {
    pub windows: Vec<PlantingWindow>,
    pub optimal_soil_temp: SoilTempRange,
    pub current_suitability: PlantingSuitability,
}

/// Full sowing-dates payload for one plant at one location
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SowingReport {
    pub plant: PlantDescriptor,
    pub location: LocationSummary,
    pub hardiness_zone: String,
    pub weather: WeatherSummary,
    pub planting: PlantingData,
    pub growing_tips: Vec<GrowingTip>,
    pub confidence_rating: u8,
    pub data_sources: Vec<String>,
}

/// Frost-dates payload for a location
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FrostReport {
    pub location: LocationSummary,
    pub hardiness_zone: String,
    pub frost_dates: FrostDates,
    pub confidence_rating: u8,
    pub data_sources: Vec<String>,
}

/// Growing-zone payload for a location
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ZoneReport {
    pub location: LocationSummary,
    pub nearest_city: Option<String>,
    pub growing_zone: GrowingZoneInfo,
    pub region_info: RegionInfo,
    pub confidence_rating: u8,
    pub data_sources: Vec<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct GrowingZoneInfo {
    pub usda_zone: String,
    pub min_temp_f: i32,
    pub min_temp_c: i32,
    pub examples: Vec<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RegionInfo {
    pub name: Region,
    pub country_code: CountryCode,
    pub growing_season_days: i64,
}

/// Engine facade: explicitly owned cache plus the three resolvers
pub struct GrowingDataService {
    cache: Arc<TtlCache>,
    zones: ZoneResolver,
    weather: WeatherResolver,
    regions: Arc<RegionResolver>,
}

impl GrowingDataService {
    /// Build the service, restoring the cache from its backing directory
    pub fn new(config: &GrowcastConfig) -> Result<Self> {
        let cache = Arc::new(TtlCache::open(&config.cache.location)?);
        let regions = Arc::new(RegionResolver::new(config, Arc::clone(&cache))?);
        let zones = ZoneResolver::new(config, Arc::clone(&cache), Arc::clone(&regions))?;
        let weather = WeatherResolver::new(config, Arc::clone(&cache))?;

        info!("growing data service ready, cache at {}", config.cache.location);

        Ok(Self {
            cache,
            zones,
            weather,
            regions,
        })
    }

    /// Start the cache's periodic sweep and backup tasks
    pub fn start_maintenance(&self) {
        self.cache.start_maintenance();
    }

    /// Flush persistent cache entries before shutdown
    pub fn shutdown(&self) {
        self.cache.flush();
        info!("flushed persistent cache entries");
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Sowing dates, tips, suitability and confidence for a plant at a
    /// coordinate
    #[instrument(skip(self, plant))]
    pub async fn sowing_report(
        &self,
        latitude: f64,
        longitude: f64,
        plant: &PlantDescriptor,
        country_hint: Option<CountryCode>,
    ) -> crate::Result<SowingReport> {
        let coordinate = Coordinate::new(latitude, longitude)?;

        let (zone, weather, region) = futures::join!(
            self.zones.resolve(coordinate),
            self.weather.resolve(coordinate),
            self.regions.resolve(coordinate, country_hint),
        );

        Ok(assemble_sowing_report(
            plant,
            coordinate,
            zone,
            weather,
            region,
            Utc::now(),
        ))
    }

    /// Frost dates with uncertainty bounds for a coordinate
    #[instrument(skip(self))]
    pub async fn frost_report(
        &self,
        latitude: f64,
        longitude: f64,
        country_hint: Option<CountryCode>,
    ) -> crate::Result<FrostReport> {
        let coordinate = Coordinate::new(latitude, longitude)?;

        let (zone, region) = futures::join!(
            self.zones.resolve(coordinate),
            self.regions.resolve(coordinate, country_hint),
        );

        Ok(assemble_frost_report(coordinate, zone, region, Utc::now()))
    }

    /// Growing zone details and season length for a coordinate
    #[instrument(skip(self))]
    pub async fn zone_report(
        &self,
        latitude: f64,
        longitude: f64,
        country_hint: Option<CountryCode>,
    ) -> crate::Result<ZoneReport> {
        let coordinate = Coordinate::new(latitude, longitude)?;

        let (zone, region, nearest_city) = futures::join!(
            self.zones.resolve(coordinate),
            self.regions.resolve(coordinate, country_hint),
            self.regions.nearest_city(coordinate),
        );

        Ok(assemble_zone_report(
            coordinate,
            zone,
            region,
            nearest_city,
            Utc::now(),
        ))
    }
}

fn location_summary(coordinate: Coordinate, region: &RegionResult) -> LocationSummary {
    LocationSummary {
        latitude: coordinate.latitude,
        longitude: coordinate.longitude,
        city: region.city.clone(),
        region: region.region,
        country_code: region.country_code,
        country: region.country.clone(),
    }
}

fn assemble_sowing_report(
    plant: &PlantDescriptor,
    coordinate: Coordinate,
    zone: ZoneResult,
    weather: WeatherResult,
    region: RegionResult,
    now: DateTime<Utc>,
) -> SowingReport {
    let today = now.date_naive();
    let windows = planting::compute_windows(plant, &zone.zone, Some(&weather), &region, today);
    let optimal_soil_temp = planting::optimal_soil_temperature(plant);
    let current_suitability = planting::planting_suitability(plant, Some(&weather));

    let season = Season::for_month(coordinate.latitude, now.month());
    let growing_tips = tips::regional_tips(
        region.country_code,
        region.region,
        Some(plant.plant_type),
        Some(season),
    );

    let confidence_rating = frost::confidence_rating(Some(&zone), Some(&weather), Some(&region));
    let data_sources = vec![
        zone.source.label.clone(),
        weather.source.label.clone(),
        region.source.label.clone(),
    ];

    SowingReport {
        plant: plant.clone(),
        location: location_summary(coordinate, &region),
        hardiness_zone: zone.zone,
        weather: WeatherSummary {
            current_temp_f: weather.current_temp_f,
            current_temp_c: weather.current_temp_c,
            precipitation_probability: weather.precipitation_probability,
            soil_temperature: weather.soil_temperature,
        },
        planting: PlantingData {
            windows,
            optimal_soil_temp,
            current_suitability,
        },
        growing_tips,
        confidence_rating,
        data_sources,
    }
}

fn assemble_frost_report(
    coordinate: Coordinate,
    zone: ZoneResult,
    region: RegionResult,
    now: DateTime<Utc>,
) -> FrostReport {
    let frost_dates = frost::frost_dates(&zone.zone, &region, now.year());
    let confidence_rating = frost::confidence_rating(Some(&zone), None, Some(&region));
    let data_sources = vec![zone.source.label.clone(), region.source.label.clone()];

    FrostReport {
        location: location_summary(coordinate, &region),
        hardiness_zone: zone.zone,
        frost_dates,
        confidence_rating,
        data_sources,
    }
}

fn assemble_zone_report(
    coordinate: Coordinate,
    zone: ZoneResult,
    region: RegionResult,
    nearest_city: Option<String>,
    now: DateTime<Utc>,
) -> ZoneReport {
    let temp_range = zone::temperature_range(&zone.zone);
    let year = now.year();
    let growing_season_days = frost::growing_season_days(
        frost::last_frost_date(&zone.zone, &region, year),
        frost::first_frost_date(&zone.zone, &region, year),
    );

    let confidence_rating = frost::confidence_rating(Some(&zone), None, Some(&region));
    let data_sources = vec![zone.source.label.clone(), region.source.label.clone()];

    ZoneReport {
        location: location_summary(coordinate, &region),
        nearest_city,
        growing_zone: GrowingZoneInfo {
            usda_zone: zone.zone.clone(),
            min_temp_f: temp_range.min_f,
            min_temp_c: temp_range.min_c,
            examples: zone::zone_examples(&zone.zone)
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        },
        region_info: RegionInfo {
            name: region.region,
            country_code: region.country_code,
            growing_season_days,
        },
        confidence_rating,
        data_sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DataSource, PlantType, SoilReading, TemperaturePreference};
    use chrono::NaiveDate;

    fn coordinate() -> Coordinate {
        Coordinate::new(39.0, -77.0).unwrap()
    }

    fn zone_fixture() -> ZoneResult {
        ZoneResult {
            zone: "7b".to_string(),
            source: DataSource::api("PHZMAPI.org"),
            city: None,
            temperature_range: Some("5 to 10".to_string()),
            coordinate: coordinate(),
        }
    }

    fn region_fixture() -> RegionResult {
        RegionResult {
            country_code: CountryCode::Us,
            country: Some("US".to_string()),
            region: Region::Northeast,
            city: Some("Rockville".to_string()),
            state: Some("Maryland".to_string()),
            source: DataSource::api("OpenWeatherMap Geocoding"),
        }
    }

    fn weather_fixture() -> WeatherResult {
        WeatherResult {
            current_temp_f: 62.0,
            current_temp_c: 17.0,
            avg_forecast_temp_f: 60.0,
            avg_forecast_temp_c: 16.0,
            precipitation_probability: 35.0,
            soil_temperature: SoilTemperature {
                surface: SoilReading {
                    fahrenheit: 55,
                    celsius: 13,
                },
                four_inch: SoilReading {
                    fahrenheit: 52,
                    celsius: 11,
                },
                eight_inch: SoilReading {
                    fahrenheit: 49,
                    celsius: 9,
                },
                is_estimated: true,
                estimation_method: "Blended historical and current data".to_string(),
                season: Season::Spring,
            },
            source: DataSource::api("Open-Meteo API"),
            timestamp: Utc::now(),
        }
    }

    fn noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_sowing_report_assembly() {
        let plant = PlantDescriptor::new(PlantType::Vegetable, TemperaturePreference::Cool);
        let report = assemble_sowing_report(
            &plant,
            coordinate(),
            zone_fixture(),
            weather_fixture(),
            region_fixture(),
            noon(2024, 1, 10),
        );

        assert_eq!(report.hardiness_zone, "7b");
        assert_eq!(report.location.city.as_deref(), Some("Rockville"));
        assert_eq!(report.planting.windows.len(), 2);
        // All three sources were APIs: 60 + 10 + 10 + 10
        assert_eq!(report.confidence_rating, 90);
        assert_eq!(report.data_sources.len(), 3);
        assert!(report.data_sources.contains(&"Open-Meteo API".to_string()));
    }

    #[test]
    fn test_sowing_report_tips_follow_plant_and_season() {
        let plant = PlantDescriptor::new(PlantType::Vegetable, TemperaturePreference::Cool);
        let report = assemble_sowing_report(
            &plant,
            coordinate(),
            zone_fixture(),
            weather_fixture(),
            region_fixture(),
            noon(2024, 4, 10), // northern spring
        );

        assert!(!report.growing_tips.is_empty());
        for tip in &report.growing_tips {
            assert!(tip.applies_to.contains(&PlantType::Vegetable));
        }
    }

    #[test]
    fn test_frost_report_assembly() {
        let report = assemble_frost_report(
            coordinate(),
            zone_fixture(),
            region_fixture(),
            noon(2024, 6, 1),
        );

        assert_eq!(report.hardiness_zone, "7b");
        assert_eq!(report.frost_dates.growing_season_days, 214);
        // Zone + region APIs, no weather: 60 + 10 + 10
        assert_eq!(report.confidence_rating, 80);
        assert_eq!(report.data_sources.len(), 2);
    }

    #[test]
    fn test_zone_report_assembly() {
        let report = assemble_zone_report(
            coordinate(),
            zone_fixture(),
            region_fixture(),
            Some("Rockville, Maryland".to_string()),
            noon(2024, 6, 1),
        );

        assert_eq!(report.growing_zone.usda_zone, "7b");
        assert_eq!(report.growing_zone.min_temp_f, 0);
        assert!(!report.growing_zone.examples.is_empty());
        assert_eq!(report.region_info.growing_season_days, 214);
        assert_eq!(report.nearest_city.as_deref(), Some("Rockville, Maryland"));
    }

    #[tokio::test]
    async fn test_invalid_coordinate_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = GrowcastConfig::default();
        config.cache.location = dir.path().to_string_lossy().into_owned();

        let service = GrowingDataService::new(&config).unwrap();
        let plant = PlantDescriptor::new(PlantType::Herb, TemperaturePreference::Neutral);

        let result = service.sowing_report(95.0, 0.0, &plant, None).await;
        assert!(matches!(
            result,
            Err(crate::GrowcastError::Validation { .. })
        ));
    }
}
