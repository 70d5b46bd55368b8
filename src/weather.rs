//! Weather resolution and the soil temperature depth model
//!
//! Primary source is the Open-Meteo forecast API. When it is unreachable the
//! resolver substitutes a latitude-and-season temperature estimate and runs
//! it through the same soil model, so callers always get a usable result
//! tagged with its provenance.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, Utc};
use rand::Rng;
use tracing::{debug, instrument};

use crate::cache::TtlCache;
use crate::config::GrowcastConfig;
use crate::models::{
    Coordinate, CountryCode, DataSource, Region, Season, SoilReading, SoilTemperature,
    WeatherResult, fahrenheit_to_celsius,
};
use crate::region::{estimate_country, region_bucket};

/// Weather moves fast; cache for an hour
const WEATHER_TTL: Duration = Duration::from_secs(60 * 60);

/// Share of the live signal in the historical blend
pub const DEFAULT_BLEND_CURRENT_WEIGHT: f64 = 0.7;

/// Tunable constants for the soil temperature model.
///
/// The defaults are heuristics carried over from field observations, not
/// derived values; override them rather than editing in place.
#[derive(Debug, Clone, Copy)]
pub struct SoilModelParams {
    /// Weight of the live estimate when blending with historical averages
    pub blend_current_weight: f64,
    /// Thermal lag from air to the soil surface (°F)
    pub air_to_surface: f64,
    /// Thermal lag from air to 4-inch depth (°F)
    pub surface_to_four_inch: f64,
    /// Thermal lag from air to 8-inch depth (°F)
    pub surface_to_eight_inch: f64,
}

impl Default for SoilModelParams {
    fn default() -> Self {
        Self {
            blend_current_weight: DEFAULT_BLEND_CURRENT_WEIGHT,
            air_to_surface: 2.0,
            surface_to_four_inch: 5.0,
            surface_to_eight_inch: 9.0,
        }
    }
}

/// Open-Meteo API response structures
mod openmeteo {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub current_weather: Option<CurrentWeather>,
        pub daily: Option<DailyData>,
    }

    #[derive(Debug, Deserialize)]
    pub struct CurrentWeather {
        pub temperature: f64,
    }

    #[derive(Debug, Deserialize)]
    pub struct DailyData {
        #[serde(rename = "temperature_2m_max")]
        pub temperature_max: Option<Vec<Option<f64>>>,
        #[serde(rename = "temperature_2m_min")]
        pub temperature_min: Option<Vec<Option<f64>>>,
        #[serde(rename = "precipitation_probability_max")]
        pub precipitation_probability: Option<Vec<Option<f64>>>,
    }
}

/// Service resolving current weather and modeled soil temperature
pub struct WeatherResolver {
    client: reqwest::Client,
    cache: Arc<TtlCache>,
    forecast_url: String,
    soil_params: SoilModelParams,
}

impl WeatherResolver {
    pub fn new(config: &GrowcastConfig, cache: Arc<TtlCache>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.apis.timeout_seconds.into()))
            .user_agent(concat!("GrowCast/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self {
            client,
            cache,
            forecast_url: config.apis.forecast_url.clone(),
            soil_params: SoilModelParams::default(),
        })
    }

    /// Replace the default soil model constants
    #[must_use]
    pub fn with_soil_params(mut self, params: SoilModelParams) -> Self {
        self.soil_params = params;
        self
    }

    /// Resolve weather for a coordinate. Never fails: an unreachable API
    /// degrades to the latitude-based estimate.
    #[instrument(skip(self), fields(lat = coordinate.latitude, lng = coordinate.longitude))]
    pub async fn resolve(&self, coordinate: Coordinate) -> WeatherResult {
        let cache_key = coordinate.cache_key("weather");
        if let Some(cached) = self.cache.get::<WeatherResult>(&cache_key) {
            return cached;
        }

        let result = match self.fetch(coordinate).await {
            Ok(result) => result,
            Err(e) => {
                debug!("weather API failed: {e}, using latitude estimate");
                self.estimate(coordinate)
            }
        };

        self.cache.set(&cache_key, &result, WEATHER_TTL, true);
        result
    }

    async fn fetch(&self, coordinate: Coordinate) -> Result<WeatherResult> {
        let response: openmeteo::ForecastResponse = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("latitude", coordinate.latitude.to_string()),
                ("longitude", coordinate.longitude.to_string()),
                (
                    "daily",
                    "temperature_2m_max,temperature_2m_min,precipitation_probability_max"
                        .to_string(),
                ),
                ("current_weather", "true".to_string()),
                ("temperature_unit", "fahrenheit".to_string()),
                ("timezone", "auto".to_string()),
                ("forecast_days", "14".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| "Failed to parse Open-Meteo forecast response")?;

        let current_temp = response
            .current_weather
            .map(|c| c.temperature)
            .ok_or_else(|| anyhow!("forecast response missing current weather"))?;

        let (avg_forecast, precipitation) = match &response.daily {
            Some(daily) => {
                let max_avg = daily
                    .temperature_max
                    .as_deref()
                    .and_then(seven_day_average);
                let min_avg = daily
                    .temperature_min
                    .as_deref()
                    .and_then(seven_day_average);
                let avg = match (max_avg, min_avg) {
                    (Some(max), Some(min)) => (max + min) / 2.0,
                    _ => current_temp,
                };
                let precip = daily
                    .precipitation_probability
                    .as_deref()
                    .and_then(seven_day_average)
                    .unwrap_or(50.0);
                (avg, precip)
            }
            None => (current_temp, 50.0),
        };

        let month = Utc::now().month();
        let soil = estimate_soil_temperature(coordinate, Some(current_temp), month, &self.soil_params);

        Ok(WeatherResult {
            current_temp_f: current_temp,
            current_temp_c: fahrenheit_to_celsius(current_temp).round(),
            avg_forecast_temp_f: avg_forecast,
            avg_forecast_temp_c: fahrenheit_to_celsius(avg_forecast).round(),
            precipitation_probability: precipitation,
            soil_temperature: soil,
            source: DataSource::api("Open-Meteo API"),
            timestamp: Utc::now(),
        })
    }

    /// Latitude-and-season fallback when the API is unreachable
    fn estimate(&self, coordinate: Coordinate) -> WeatherResult {
        let month = Utc::now().month();
        let temp = estimate_temperature_from_latitude(coordinate.latitude, month);
        let soil = estimate_soil_temperature(coordinate, Some(temp), month, &self.soil_params);

        WeatherResult {
            current_temp_f: temp,
            current_temp_c: fahrenheit_to_celsius(temp).round(),
            avg_forecast_temp_f: temp,
            avg_forecast_temp_c: fahrenheit_to_celsius(temp).round(),
            precipitation_probability: f64::from(rand::rng().random_range(0..100)),
            soil_temperature: soil,
            source: DataSource::estimated("Estimated Weather (latitude-based)"),
            timestamp: Utc::now(),
        }
    }
}

/// Average of the first 7 present values
fn seven_day_average(values: &[Option<f64>]) -> Option<f64> {
    let window: Vec<f64> = values.iter().take(7).filter_map(|v| *v).collect();
    if window.is_empty() {
        None
    } else {
        Some(window.iter().sum::<f64>() / window.len() as f64)
    }
}

/// Estimate air temperature (°F) from latitude and the current month.
///
/// Base temperature falls off with absolute latitude; a seasonal offset is
/// added per hemisphere.
#[must_use]
pub fn estimate_temperature_from_latitude(latitude: f64, month: u32) -> f64 {
    let base = 75.0 - latitude.abs() * 0.5;
    let seasonal = match Season::for_month(latitude, month) {
        Season::Spring | Season::Fall => 10.0,
        Season::Summer => 20.0,
        Season::Winter => 0.0,
    };
    base + seasonal
}

struct SoilSeasonAverage {
    surface: f64,
    four_inch: f64,
    eight_inch: f64,
}

/// Historical seasonal soil averages (°F at surface/4in/8in) for regions
/// with observation records. Regions without records fall back to the US
/// northeast series.
fn historical_soil_average(
    country: CountryCode,
    region: Region,
    season: Season,
) -> Option<SoilSeasonAverage> {
    // [spring, summer, fall, winter] rows of [surface, 4in, 8in]
    let rows: [[f64; 3]; 4] = match (country, region) {
        (CountryCode::Us, Region::Northeast) => {
            [[52.0, 48.0, 45.0], [75.0, 70.0, 66.0], [55.0, 52.0, 50.0], [35.0, 33.0, 32.0]]
        }
        (CountryCode::Us, Region::Southeast) => {
            [[65.0, 61.0, 58.0], [85.0, 80.0, 76.0], [68.0, 65.0, 62.0], [50.0, 48.0, 46.0]]
        }
        (CountryCode::Us, Region::Midwest) => {
            [[50.0, 46.0, 43.0], [78.0, 73.0, 68.0], [54.0, 51.0, 48.0], [30.0, 29.0, 28.0]]
        }
        (CountryCode::Us, Region::Southwest) => {
            [[62.0, 58.0, 55.0], [88.0, 82.0, 78.0], [66.0, 62.0, 59.0], [48.0, 46.0, 44.0]]
        }
        (CountryCode::Us, Region::West) => {
            [[58.0, 54.0, 51.0], [72.0, 68.0, 64.0], [60.0, 57.0, 54.0], [45.0, 43.0, 42.0]]
        }
        (CountryCode::Us, Region::Northwest) => {
            [[50.0, 47.0, 44.0], [68.0, 64.0, 60.0], [53.0, 50.0, 48.0], [38.0, 36.0, 35.0]]
        }
        (CountryCode::Uk, Region::North) => {
            [[46.0, 43.0, 41.0], [60.0, 57.0, 54.0], [50.0, 48.0, 46.0], [38.0, 37.0, 36.0]]
        }
        (CountryCode::Uk, Region::Midlands) => {
            [[48.0, 45.0, 43.0], [63.0, 60.0, 57.0], [52.0, 50.0, 48.0], [40.0, 39.0, 38.0]]
        }
        (CountryCode::Uk, Region::South) => {
            [[50.0, 47.0, 45.0], [66.0, 62.0, 59.0], [54.0, 52.0, 50.0], [42.0, 41.0, 40.0]]
        }
        (CountryCode::Ca, Region::WestCoast) => {
            [[48.0, 45.0, 43.0], [62.0, 59.0, 56.0], [52.0, 50.0, 48.0], [40.0, 38.0, 37.0]]
        }
        (CountryCode::Ca, Region::Prairie) => {
            [[42.0, 39.0, 36.0], [68.0, 63.0, 59.0], [45.0, 43.0, 41.0], [22.0, 21.0, 20.0]]
        }
        (CountryCode::Ca, Region::Central) => {
            [[45.0, 42.0, 39.0], [70.0, 65.0, 61.0], [48.0, 46.0, 44.0], [26.0, 25.0, 24.0]]
        }
        (CountryCode::Ca, Region::Atlantic) => {
            [[44.0, 41.0, 39.0], [66.0, 62.0, 58.0], [50.0, 48.0, 46.0], [30.0, 29.0, 28.0]]
        }
        (CountryCode::Au, Region::Northern) => {
            [[82.0, 78.0, 75.0], [88.0, 84.0, 80.0], [80.0, 76.0, 73.0], [72.0, 69.0, 67.0]]
        }
        (CountryCode::Au, Region::Central) => {
            [[70.0, 66.0, 63.0], [82.0, 78.0, 74.0], [68.0, 65.0, 62.0], [55.0, 53.0, 51.0]]
        }
        (CountryCode::Au, Region::Southern) => {
            [[58.0, 55.0, 52.0], [72.0, 68.0, 64.0], [60.0, 57.0, 55.0], [46.0, 44.0, 43.0]]
        }
        _ => return None,
    };

    let row = match season {
        Season::Spring => rows[0],
        Season::Summer => rows[1],
        Season::Fall => rows[2],
        Season::Winter => rows[3],
    };

    Some(SoilSeasonAverage {
        surface: row[0],
        four_inch: row[1],
        eight_inch: row[2],
    })
}

/// Model soil temperature at three depths from air temperature.
///
/// Thermal-lag offsets are subtracted from the air temperature; when a
/// historical seasonal average exists for the coordinate's estimated
/// country/region, the live value is blended with it at
/// `params.blend_current_weight`.
#[must_use]
pub fn estimate_soil_temperature(
    coordinate: Coordinate,
    air_temp_f: Option<f64>,
    month: u32,
    params: &SoilModelParams,
) -> SoilTemperature {
    let air = air_temp_f
        .unwrap_or_else(|| estimate_temperature_from_latitude(coordinate.latitude, month));

    let country = estimate_country(coordinate);
    let region = region_bucket(coordinate, country);
    let season = Season::for_month(coordinate.latitude, month);

    let historical = historical_soil_average(country, region, season)
        .or_else(|| historical_soil_average(CountryCode::Us, Region::Northeast, season));

    let (surface, four_inch, eight_inch, method) = match historical {
        Some(avg) => {
            let w = params.blend_current_weight;
            (
                (air - params.air_to_surface) * w + avg.surface * (1.0 - w),
                (air - params.surface_to_four_inch) * w + avg.four_inch * (1.0 - w),
                (air - params.surface_to_eight_inch) * w + avg.eight_inch * (1.0 - w),
                "Blended historical and current data",
            )
        }
        None => (
            air - params.air_to_surface,
            air - params.surface_to_four_inch,
            air - params.surface_to_eight_inch,
            "Based on air temperature",
        ),
    };

    SoilTemperature {
        surface: SoilReading::from_fahrenheit(surface),
        four_inch: SoilReading::from_fahrenheit(four_inch),
        eight_inch: SoilReading::from_fahrenheit(eight_inch),
        is_estimated: true,
        estimation_method: method.to_string(),
        season,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;
    use tempfile::TempDir;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[tokio::test]
    async fn test_unreachable_api_degrades_to_estimate() {
        let dir = TempDir::new().unwrap();
        let mut config = GrowcastConfig::default();
        config.apis.forecast_url = "http://127.0.0.1:1".to_string();
        config.apis.timeout_seconds = 1;

        let cache = Arc::new(TtlCache::open(dir.path()).unwrap());
        let resolver = WeatherResolver::new(&config, cache).unwrap();

        let result = resolver.resolve(coord(40.71, -74.01)).await;
        assert_eq!(result.source.kind, SourceKind::Estimated);
        assert!(result.source.label.contains("latitude"));
        assert!((0.0..=100.0).contains(&result.precipitation_probability));
        assert!(result.soil_temperature.is_estimated);
    }

    #[test]
    fn test_seven_day_average_skips_nulls_and_tail() {
        let values = vec![
            Some(10.0),
            None,
            Some(20.0),
            Some(30.0),
            Some(40.0),
            Some(50.0),
            Some(60.0),
            Some(1000.0), // day 8, outside the window
        ];
        assert_eq!(seven_day_average(&values), Some(35.0));
        assert_eq!(seven_day_average(&[None, None]), None);
        assert_eq!(seven_day_average(&[]), None);
    }

    #[test]
    fn test_latitude_temperature_estimate() {
        // 40°N in July: 75 - 20 + 20
        assert_eq!(estimate_temperature_from_latitude(40.0, 7), 75.0);
        // 40°N in January: winter, no offset
        assert_eq!(estimate_temperature_from_latitude(40.0, 1), 55.0);
        // 40°S in January is summer
        assert_eq!(estimate_temperature_from_latitude(-40.0, 1), 75.0);
        // Equator is always warm
        assert_eq!(estimate_temperature_from_latitude(0.0, 7), 95.0);
    }

    #[test]
    fn test_soil_temperature_depths_get_colder() {
        let soil = estimate_soil_temperature(
            coord(40.71, -74.01),
            Some(70.0),
            5,
            &SoilModelParams::default(),
        );
        assert!(soil.surface.fahrenheit >= soil.four_inch.fahrenheit);
        assert!(soil.four_inch.fahrenheit >= soil.eight_inch.fahrenheit);
        assert!(soil.is_estimated);
        assert_eq!(soil.season, Season::Spring);
    }

    #[test]
    fn test_soil_temperature_blend_weight_override() {
        // With full weight on the live signal the historical table is moot
        let live_only = SoilModelParams {
            blend_current_weight: 1.0,
            ..SoilModelParams::default()
        };
        let soil = estimate_soil_temperature(coord(40.71, -74.01), Some(70.0), 5, &live_only);
        assert_eq!(soil.surface.fahrenheit, 68); // 70 - air_to_surface
        assert_eq!(soil.four_inch.fahrenheit, 65);
        assert_eq!(soil.eight_inch.fahrenheit, 61);
    }

    #[test]
    fn test_soil_temperature_blends_historical() {
        // New York in spring: surface = (70-2)*0.7 + 52*0.3 = 63.2
        let soil = estimate_soil_temperature(
            coord(40.71, -74.01),
            Some(70.0),
            4,
            &SoilModelParams::default(),
        );
        assert_eq!(soil.surface.fahrenheit, 63);
        assert_eq!(soil.estimation_method, "Blended historical and current data");
    }

    #[test]
    fn test_soil_temperature_without_air_reading() {
        // None air temperature falls back to the latitude estimate
        let soil = estimate_soil_temperature(
            coord(40.0, -74.0),
            None,
            7,
            &SoilModelParams::default(),
        );
        // 75°F estimated air in July, blended against summer averages
        assert!(soil.surface.fahrenheit > 60);
    }

    #[test]
    fn test_historical_fallback_region() {
        // Northern Canada has no record; callers fall back to US northeast
        assert!(historical_soil_average(CountryCode::Ca, Region::Northern, Season::Spring).is_none());
        assert!(historical_soil_average(CountryCode::Us, Region::Northeast, Season::Spring).is_some());
    }

    #[test]
    fn test_southern_hemisphere_soil_season() {
        let soil = estimate_soil_temperature(
            coord(-37.81, 144.96),
            Some(60.0),
            7,
            &SoilModelParams::default(),
        );
        assert_eq!(soil.season, Season::Winter);
    }
}
