//! Data models for climate and growing data
//!
//! This module contains the data structures shared by the resolvers and
//! calculators: coordinates, resolved zone/region/weather results, planting
//! windows, and frost dates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::GrowcastError;

/// A geographic coordinate pair in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, validating that it lies on the globe
    pub fn new(latitude: f64, longitude: f64) -> crate::Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GrowcastError::validation(format!(
                "latitude {latitude} out of range -90..=90"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GrowcastError::validation(format!(
                "longitude {longitude} out of range -180..=180"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Round both components for cache key generation
    #[must_use]
    pub fn rounded(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(precision as i32);
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lng = (self.longitude * multiplier).round() / multiplier;
        (lat, lng)
    }

    /// Generate a resolver cache key scoped to this coordinate.
    ///
    /// Keys round to 2 decimal places so nearby lookups share an entry.
    #[must_use]
    pub fn cache_key(&self, prefix: &str) -> String {
        let (lat, lng) = self.rounded(2);
        format!("{prefix}:{lat:.2},{lng:.2}")
    }

    /// True for coordinates in the northern hemisphere (equator included)
    #[must_use]
    pub fn is_northern(&self) -> bool {
        self.latitude >= 0.0
    }
}

/// Countries with dedicated planting-calendar models.
///
/// The set is fixed; anything unrecognized maps to `Us`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CountryCode {
    Us,
    Uk,
    Ca,
    Au,
}

impl CountryCode {
    /// Map an ISO 3166-1 alpha-2 code onto the supported set
    #[must_use]
    pub fn from_iso(code: &str) -> Self {
        match code.to_ascii_uppercase().as_str() {
            "GB" | "UK" => Self::Uk,
            "CA" => Self::Ca,
            "AU" => Self::Au,
            _ => Self::Us,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Us => "us",
            Self::Uk => "uk",
            Self::Ca => "ca",
            Self::Au => "au",
        }
    }
}

impl std::fmt::Display for CountryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CountryCode {
    type Err = GrowcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "us" => Ok(Self::Us),
            "uk" => Ok(Self::Uk),
            "ca" => Ok(Self::Ca),
            "au" => Ok(Self::Au),
            other => Err(GrowcastError::validation(format!(
                "unsupported country code '{other}' (expected us, uk, ca or au)"
            ))),
        }
    }
}

/// Coarse sub-national region buckets.
///
/// Assigned by rule from coordinates, not by precise boundaries; each country
/// uses its own subset of these variants.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    // United States
    Northeast,
    Southeast,
    Midwest,
    Southwest,
    Northwest,
    West,
    // United Kingdom
    North,
    Midlands,
    South,
    // Canada (Northern/Central shared with Australia)
    WestCoast,
    Prairie,
    Central,
    Atlantic,
    // Australia
    Northern,
    Southern,
}

impl Region {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Northeast => "northeast",
            Self::Southeast => "southeast",
            Self::Midwest => "midwest",
            Self::Southwest => "southwest",
            Self::Northwest => "northwest",
            Self::West => "west",
            Self::North => "north",
            Self::Midlands => "midlands",
            Self::South => "south",
            Self::WestCoast => "west_coast",
            Self::Prairie => "prairie",
            Self::Central => "central",
            Self::Atlantic => "atlantic",
            Self::Northern => "northern",
            Self::Southern => "southern",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Meteorological season, hemisphere-adjusted
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    /// Determine the season for a latitude and calendar month (1-12).
    ///
    /// The southern hemisphere is offset by half a year.
    #[must_use]
    pub fn for_month(latitude: f64, month: u32) -> Self {
        let northern = latitude >= 0.0;
        match month {
            3..=5 => {
                if northern {
                    Self::Spring
                } else {
                    Self::Fall
                }
            }
            6..=8 => {
                if northern {
                    Self::Summer
                } else {
                    Self::Winter
                }
            }
            9..=11 => {
                if northern {
                    Self::Fall
                } else {
                    Self::Spring
                }
            }
            _ => {
                if northern {
                    Self::Winter
                } else {
                    Self::Summer
                }
            }
        }
    }
}

/// How a resolved value was obtained, for confidence scoring
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Live lookup against an authoritative API
    Api,
    /// Static database/table lookup
    Database,
    /// Heuristic estimate
    Estimated,
}

/// Provenance tag carried by every resolver result
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DataSource {
    /// Human-readable source label
    pub label: String,
    /// Source quality bucket
    pub kind: SourceKind,
}

impl DataSource {
    pub fn api<S: Into<String>>(label: S) -> Self {
        Self {
            label: label.into(),
            kind: SourceKind::Api,
        }
    }

    pub fn database<S: Into<String>>(label: S) -> Self {
        Self {
            label: label.into(),
            kind: SourceKind::Database,
        }
    }

    pub fn estimated<S: Into<String>>(label: S) -> Self {
        Self {
            label: label.into(),
            kind: SourceKind::Estimated,
        }
    }
}

/// Broad plant categories with distinct sowing calendars
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlantType {
    Vegetable,
    Herb,
    Flower,
    Other,
}

impl std::str::FromStr for PlantType {
    type Err = GrowcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vegetable" => Ok(Self::Vegetable),
            "herb" => Ok(Self::Herb),
            "flower" => Ok(Self::Flower),
            "other" => Ok(Self::Other),
            other => Err(GrowcastError::validation(format!(
                "unknown plant type '{other}'"
            ))),
        }
    }
}

/// A plant's tolerance for cold or heat, shifting its sowing windows
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperaturePreference {
    Cool,
    Warm,
    #[default]
    Neutral,
}

impl std::str::FromStr for TemperaturePreference {
    type Err = GrowcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cool" => Ok(Self::Cool),
            "warm" => Ok(Self::Warm),
            "neutral" => Ok(Self::Neutral),
            other => Err(GrowcastError::validation(format!(
                "unknown temperature preference '{other}'"
            ))),
        }
    }
}

/// Minimal plant description consumed by the engine
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlantDescriptor {
    /// Display name echoed back in reports
    pub name: Option<String>,
    pub plant_type: PlantType,
    pub temperature_preference: TemperaturePreference,
}

impl PlantDescriptor {
    #[must_use]
    pub fn new(plant_type: PlantType, temperature_preference: TemperaturePreference) -> Self {
        Self {
            name: None,
            plant_type,
            temperature_preference,
        }
    }
}

/// Resolved hardiness zone for a coordinate
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ZoneResult {
    /// Zone code, e.g. "7b"
    pub zone: String,
    pub source: DataSource,
    /// Nearest city, when the zone came from the city table
    pub city: Option<String>,
    /// Winter minimum range reported by the zone API, e.g. "5 to 10"
    pub temperature_range: Option<String>,
    pub coordinate: Coordinate,
}

/// Resolved country/region/city for a coordinate
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RegionResult {
    pub country_code: CountryCode,
    /// ISO country code as returned by the geocoder
    pub country: Option<String>,
    pub region: Region,
    pub city: Option<String>,
    /// State/county name from the geocoder, when available
    pub state: Option<String>,
    pub source: DataSource,
}

/// A soil temperature reading at one depth
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SoilReading {
    pub fahrenheit: i32,
    pub celsius: i32,
}

impl SoilReading {
    /// Build a reading from a fahrenheit value, rounding both units
    #[must_use]
    pub fn from_fahrenheit(fahrenheit: f64) -> Self {
        Self {
            fahrenheit: fahrenheit.round() as i32,
            celsius: fahrenheit_to_celsius(fahrenheit).round() as i32,
        }
    }
}

/// Modeled soil temperature at three depths
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SoilTemperature {
    pub surface: SoilReading,
    #[serde(rename = "4_inches")]
    pub four_inch: SoilReading,
    #[serde(rename = "8_inches")]
    pub eight_inch: SoilReading,
    pub is_estimated: bool,
    /// Which model produced these values
    pub estimation_method: String,
    pub season: Season,
}

/// Resolved weather snapshot for a coordinate
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherResult {
    pub current_temp_f: f64,
    pub current_temp_c: f64,
    /// Average of the next 7 days of forecast highs and lows
    pub avg_forecast_temp_f: f64,
    pub avg_forecast_temp_c: f64,
    /// Average precipitation probability over the next 7 days (0-100)
    pub precipitation_probability: f64,
    pub soil_temperature: SoilTemperature,
    pub source: DataSource,
    pub timestamp: DateTime<Utc>,
}

/// Which planting season a window belongs to
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WindowSeason {
    Spring,
    Fall,
    /// Southern-hemisphere and UK naming for the fall sowing season
    Autumn,
    Winter,
}

/// Shift applied to a window from live soil temperature
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherAdjustment {
    /// Positive = delayed, negative = advanced
    pub days: i64,
    pub reason: String,
}

/// A recommended sowing/transplant date range
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlantingWindow {
    pub season: WindowSeason,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Recommended technique, e.g. "direct sow or transplant"
    pub method: String,
    pub weather_adjustment: Option<WeatherAdjustment>,
}

/// An average frost date with uncertainty bounds
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct FrostDateRange {
    pub average: NaiveDate,
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

/// First/last frost dates and the growing season between them
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct FrostDates {
    pub first_frost: FrostDateRange,
    pub last_frost: FrostDateRange,
    /// Days between last and first frost, never negative
    pub growing_season_days: i64,
}

/// Optimal soil temperature band for a plant (°F)
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SoilTempRange {
    pub min: i32,
    pub max: i32,
    pub optimal: i32,
}

/// Assessment of whether conditions currently suit planting
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlantingSuitability {
    pub suitable: bool,
    /// 0-100
    pub score: u8,
    pub reason: String,
    pub soil_temp_f: Option<i32>,
    pub optimal_range: SoilTempRange,
}

/// Winter minimum temperature band for a hardiness zone
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ZoneTemperatureRange {
    pub min_f: i32,
    pub min_c: i32,
}

/// Convert Fahrenheit to Celsius
#[must_use]
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// Convert Celsius to Fahrenheit
#[must_use]
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(45.0, -120.0).is_ok());
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(90.5, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
    }

    #[test]
    fn test_coordinate_cache_key() {
        let coord = Coordinate::new(46.818_234, 8.227_456).unwrap();
        assert_eq!(coord.cache_key("zone"), "zone:46.82,8.23");

        let negative = Coordinate::new(-33.868_8, 151.209_3).unwrap();
        assert_eq!(negative.cache_key("weather"), "weather:-33.87,151.21");
    }

    #[test]
    fn test_rounded_coordinates() {
        let coord = Coordinate::new(46.818_234, 8.227_456).unwrap();
        let (lat, lng) = coord.rounded(2);
        assert_eq!(lat, 46.82);
        assert_eq!(lng, 8.23);
    }

    #[test]
    fn test_country_code_from_iso() {
        assert_eq!(CountryCode::from_iso("GB"), CountryCode::Uk);
        assert_eq!(CountryCode::from_iso("UK"), CountryCode::Uk);
        assert_eq!(CountryCode::from_iso("CA"), CountryCode::Ca);
        assert_eq!(CountryCode::from_iso("AU"), CountryCode::Au);
        assert_eq!(CountryCode::from_iso("US"), CountryCode::Us);
        // Anything unrecognized defaults to US
        assert_eq!(CountryCode::from_iso("DE"), CountryCode::Us);
    }

    #[test]
    fn test_season_for_month_hemispheres() {
        assert_eq!(Season::for_month(45.0, 4), Season::Spring);
        assert_eq!(Season::for_month(45.0, 7), Season::Summer);
        assert_eq!(Season::for_month(45.0, 10), Season::Fall);
        assert_eq!(Season::for_month(45.0, 1), Season::Winter);

        assert_eq!(Season::for_month(-33.0, 4), Season::Fall);
        assert_eq!(Season::for_month(-33.0, 7), Season::Winter);
        assert_eq!(Season::for_month(-33.0, 10), Season::Spring);
        assert_eq!(Season::for_month(-33.0, 1), Season::Summer);
    }

    #[test]
    fn test_temperature_conversions() {
        assert_eq!(fahrenheit_to_celsius(32.0), 0.0);
        assert_eq!(fahrenheit_to_celsius(212.0), 100.0);
        assert_eq!(celsius_to_fahrenheit(100.0), 212.0);
    }

    #[test]
    fn test_soil_reading_rounds_both_units() {
        let reading = SoilReading::from_fahrenheit(59.6);
        assert_eq!(reading.fahrenheit, 60);
        assert_eq!(reading.celsius, 15);
    }
}
