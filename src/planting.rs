//! Planting window calculation
//!
//! Pure date arithmetic: no I/O, no caching. Windows are derived from the
//! country's sowing calendar, the hardiness zone or region, and the plant's
//! temperature preference, then nudged by live soil temperature when weather
//! data is available.

use chrono::{Datelike, Days, NaiveDate};

use crate::models::{
    CountryCode, PlantDescriptor, PlantType, PlantingSuitability, PlantingWindow, Region,
    RegionResult, SoilTempRange, TemperaturePreference, WeatherAdjustment, WeatherResult,
    WindowSeason,
};
use crate::zone::zone_number;

/// Tunable constants for the soil-temperature window adjustment.
///
/// The day-scaling values are heuristics preserved from field practice;
/// override rather than re-derive.
#[derive(Debug, Clone, Copy)]
pub struct AdjustmentParams {
    /// Degrees of soil-temperature deficit per day of delay
    pub cold_delay_degrees_per_day: f64,
    /// Degrees of soil-temperature surplus per day of advance
    pub warm_advance_degrees_per_day: f64,
    /// Deviation from optimal minimum (°F) tolerated without adjustment
    pub trigger_band: f64,
    /// Hard clamp on the shift in either direction
    pub max_shift_days: i64,
}

impl Default for AdjustmentParams {
    fn default() -> Self {
        Self {
            cold_delay_degrees_per_day: 3.0,
            warm_advance_degrees_per_day: 5.0,
            trigger_band: 5.0,
            max_shift_days: 14,
        }
    }
}

/// Build a date from literal month/day values known to be valid
fn md(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("calendar tables hold valid dates")
}

fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64)).unwrap_or(date)
    } else {
        date.checked_sub_days(Days::new((-days) as u64)).unwrap_or(date)
    }
}

fn window(
    season: WindowSeason,
    start_date: NaiveDate,
    end_date: NaiveDate,
    method: &str,
) -> PlantingWindow {
    PlantingWindow {
        season,
        start_date,
        end_date,
        method: method.to_string(),
        weather_adjustment: None,
    }
}

/// Compute the planting windows for a plant at a resolved location.
///
/// A plant yields 0-2 windows; warm-season vegetables skip fall, flowers add
/// a pre-season stratification window. Windows starting in the future are
/// adjusted by current soil temperature.
#[must_use]
pub fn compute_windows(
    plant: &PlantDescriptor,
    zone: &str,
    weather: Option<&WeatherResult>,
    region: &RegionResult,
    today: NaiveDate,
) -> Vec<PlantingWindow> {
    compute_windows_with(plant, zone, weather, region, today, &AdjustmentParams::default())
}

/// [`compute_windows`] with explicit adjustment constants
#[must_use]
pub fn compute_windows_with(
    plant: &PlantDescriptor,
    zone: &str,
    weather: Option<&WeatherResult>,
    region: &RegionResult,
    today: NaiveDate,
    params: &AdjustmentParams,
) -> Vec<PlantingWindow> {
    let year = today.year();
    let zn = zone_number(zone);

    let mut windows = match region.country_code {
        CountryCode::Us => us_windows(plant, zn, year),
        CountryCode::Uk => uk_windows(plant, region.region, year),
        CountryCode::Ca => ca_windows(plant, region.region, zn, year),
        CountryCode::Au => au_windows(plant, region.region, year),
    };

    if let Some(weather) = weather {
        adjust_for_weather(&mut windows, weather, plant, today, params);
    }

    windows
}

fn us_windows(plant: &PlantDescriptor, zn: u8, year: i32) -> Vec<PlantingWindow> {
    let cold = zn < 7; // colder zones start later
    match plant.plant_type {
        PlantType::Vegetable => {
            if plant.temperature_preference == TemperaturePreference::Cool {
                vec![
                    window(
                        WindowSeason::Spring,
                        md(year, if cold { 4 } else { 3 }, 1),
                        md(year, if cold { 5 } else { 4 }, 15),
                        "direct sow or transplant",
                    ),
                    window(
                        WindowSeason::Fall,
                        md(year, if cold { 8 } else { 9 }, 1),
                        md(year, if cold { 9 } else { 10 }, 15),
                        "direct sow",
                    ),
                ]
            } else {
                vec![window(
                    WindowSeason::Spring,
                    md(year, if cold { 5 } else { 4 }, 15),
                    md(year, if cold { 6 } else { 5 }, 30),
                    "direct sow or transplant",
                )]
            }
        }
        PlantType::Herb => vec![window(
            WindowSeason::Spring,
            md(year, if cold { 4 } else { 3 }, 15),
            md(year, if cold { 6 } else { 5 }, 15),
            "direct sow or transplant",
        )],
        PlantType::Flower => vec![
            window(
                WindowSeason::Spring,
                md(year, if cold { 4 } else { 3 }, 1),
                md(year, if cold { 6 } else { 5 }, 15),
                "direct sow or transplant",
            ),
            // Stratification happens the preceding autumn/winter
            window(
                WindowSeason::Winter,
                md(year - 1, if cold { 10 } else { 11 }, 1),
                md(year - 1, if cold { 11 } else { 12 }, 15),
                "stratify seeds or indoor sow",
            ),
        ],
        PlantType::Other => Vec::new(),
    }
}

fn uk_windows(plant: &PlantDescriptor, region: Region, year: i32) -> Vec<PlantingWindow> {
    let north = region == Region::North;
    match plant.plant_type {
        PlantType::Vegetable => {
            if plant.temperature_preference == TemperaturePreference::Cool {
                vec![
                    window(
                        WindowSeason::Spring,
                        md(year, if north { 4 } else { 3 }, 15),
                        md(year, if north { 5 } else { 4 }, 30),
                        "direct sow or transplant",
                    ),
                    window(
                        WindowSeason::Fall,
                        md(year, if north { 8 } else { 9 }, 1),
                        md(year, if north { 9 } else { 10 }, 15),
                        "direct sow",
                    ),
                ]
            } else {
                vec![window(
                    WindowSeason::Spring,
                    md(year, if north { 5 } else { 4 }, 15),
                    md(year, if north { 6 } else { 5 }, 30),
                    "direct sow or transplant",
                )]
            }
        }
        PlantType::Herb => vec![window(
            WindowSeason::Spring,
            md(year, if north { 4 } else { 3 }, 15),
            md(year, if north { 6 } else { 5 }, 15),
            "direct sow or transplant",
        )],
        PlantType::Flower => vec![
            window(
                WindowSeason::Spring,
                md(year, if north { 4 } else { 3 }, 15),
                md(year, if north { 6 } else { 5 }, 15),
                "direct sow or transplant",
            ),
            window(
                WindowSeason::Autumn,
                md(year, if north { 9 } else { 10 }, 1),
                md(year, if north { 10 } else { 11 }, 15),
                "stratify seeds or indoor sow",
            ),
        ],
        PlantType::Other => Vec::new(),
    }
}

/// Fixed day offset applied to Canadian windows by region
fn ca_region_offset(region: Region) -> i64 {
    match region {
        Region::WestCoast => -14,
        Region::Atlantic => 0,
        Region::Central => 7,
        Region::Prairie => 14,
        Region::Northern => 21,
        _ => 0,
    }
}

fn ca_windows(plant: &PlantDescriptor, region: Region, zn: u8, year: i32) -> Vec<PlantingWindow> {
    let offset = ca_region_offset(region);
    let cold = zn < 5;
    let mut windows = Vec::new();

    match plant.plant_type {
        PlantType::Vegetable => {
            if plant.temperature_preference == TemperaturePreference::Cool {
                windows.push(window(
                    WindowSeason::Spring,
                    shift(md(year, if cold { 5 } else { 4 }, 15), offset),
                    shift(md(year, if cold { 6 } else { 5 }, 30), offset),
                    "direct sow or transplant",
                ));
                // Fall sowing only where the season is long enough
                if zn >= 4 {
                    windows.push(window(
                        WindowSeason::Fall,
                        shift(md(year, if cold { 7 } else { 8 }, 15), offset),
                        shift(md(year, if cold { 8 } else { 9 }, 30), offset),
                        "direct sow",
                    ));
                }
            } else if zn >= 3 {
                windows.push(window(
                    WindowSeason::Spring,
                    shift(md(year, if cold { 6 } else { 5 }, 1), offset),
                    shift(md(year, if cold { 6 } else { 5 }, 30), offset),
                    "transplant only in colder regions",
                ));
            }
        }
        PlantType::Herb | PlantType::Flower => {
            windows.push(window(
                WindowSeason::Spring,
                shift(md(year, if cold { 5 } else { 4 }, 15), offset),
                shift(md(year, if cold { 6 } else { 5 }, 30), offset),
                "direct sow or transplant",
            ));
        }
        PlantType::Other => {}
    }

    windows
}

fn au_windows(plant: &PlantDescriptor, region: Region, year: i32) -> Vec<PlantingWindow> {
    let northern = region == Region::Northern;
    let southern = region == Region::Southern;

    match plant.plant_type {
        PlantType::Vegetable => {
            if plant.temperature_preference == TemperaturePreference::Cool {
                let mut windows = vec![window(
                    WindowSeason::Autumn,
                    md(year, if northern { 4 } else { 3 }, 1),
                    md(year, if northern { 5 } else { 4 }, 15),
                    "direct sow or transplant",
                )];
                // Only the south gets a cool winter and a second sowing
                if southern {
                    windows.push(window(
                        WindowSeason::Spring,
                        md(year, 9, 1),
                        md(year, 10, 15),
                        "direct sow",
                    ));
                }
                windows
            } else {
                vec![window(
                    WindowSeason::Spring,
                    md(year, if southern { 10 } else { 9 }, 1),
                    md(year, if southern { 11 } else { 10 }, 30),
                    "direct sow or transplant",
                )]
            }
        }
        PlantType::Herb | PlantType::Flower => vec![
            window(
                WindowSeason::Autumn,
                md(year, if northern { 3 } else { 2 }, 15),
                md(year, if northern { 5 } else { 4 }, 1),
                "direct sow or transplant",
            ),
            window(
                WindowSeason::Spring,
                md(year, if southern { 9 } else { 8 }, 15),
                md(year, if southern { 11 } else { 10 }, 1),
                "direct sow or transplant",
            ),
        ],
        PlantType::Other => Vec::new(),
    }
}

/// Shift in days for a soil-temperature deviation from the optimal minimum.
/// Positive = delay, negative = advance, clamped to `max_shift_days`.
fn weather_shift_days(surface_temp_f: f64, optimal_min: f64, params: &AdjustmentParams) -> i64 {
    let diff = surface_temp_f - optimal_min;

    let days = if diff < -params.trigger_band {
        (diff.abs() / params.cold_delay_degrees_per_day).ceil() as i64
    } else if diff > params.trigger_band {
        -((diff / params.warm_advance_degrees_per_day).floor() as i64)
    } else {
        0
    };

    days.clamp(-params.max_shift_days, params.max_shift_days)
}

/// Apply the soil-temperature shift to every window that has not started yet.
/// Past windows are left untouched.
fn adjust_for_weather(
    windows: &mut [PlantingWindow],
    weather: &WeatherResult,
    plant: &PlantDescriptor,
    today: NaiveDate,
    params: &AdjustmentParams,
) {
    let optimal = optimal_soil_temperature(plant);
    let surface = f64::from(weather.soil_temperature.surface.fahrenheit);
    let days = weather_shift_days(surface, f64::from(optimal.min), params);

    for w in windows.iter_mut().filter(|w| w.start_date > today) {
        w.start_date = shift(w.start_date, days);
        w.end_date = shift(w.end_date, days);
        w.weather_adjustment = Some(WeatherAdjustment {
            days,
            reason: match days {
                d if d > 0 => "Delayed due to cooler than optimal soil temperature".to_string(),
                d if d < 0 => "Earlier due to warmer than optimal soil temperature".to_string(),
                _ => "No adjustment needed".to_string(),
            },
        });
    }
}

/// Optimal soil temperature band for a plant (°F).
///
/// Base range by plant type, shifted by the temperature preference.
#[must_use]
pub fn optimal_soil_temperature(plant: &PlantDescriptor) -> SoilTempRange {
    let (base_min, base_max) = match plant.plant_type {
        PlantType::Herb => (65, 75),
        PlantType::Flower => (55, 75),
        PlantType::Vegetable | PlantType::Other => (60, 75),
    };

    let adjustment = match plant.temperature_preference {
        TemperaturePreference::Cool => -15,
        TemperaturePreference::Warm => 10,
        TemperaturePreference::Neutral => 0,
    };

    SoilTempRange {
        min: base_min + adjustment,
        max: base_max + adjustment,
        optimal: (base_min + base_max) / 2 + adjustment,
    }
}

/// Score how well current soil temperature suits planting right now
#[must_use]
pub fn planting_suitability(
    plant: &PlantDescriptor,
    weather: Option<&WeatherResult>,
) -> PlantingSuitability {
    let optimal = optimal_soil_temperature(plant);

    let Some(weather) = weather else {
        return PlantingSuitability {
            suitable: false,
            score: 0,
            reason: "Insufficient data to determine suitability".to_string(),
            soil_temp_f: None,
            optimal_range: optimal,
        };
    };

    let soil = weather.soil_temperature.surface.fahrenheit;
    let (min, max, mid) = (
        f64::from(optimal.min),
        f64::from(optimal.max),
        f64::from(optimal.optimal),
    );
    let soil_f = f64::from(soil);

    let score = if soil_f >= min && soil_f <= max {
        // Inside the band: score by distance from the optimum
        let distance = (soil_f - mid).abs();
        let half_range = (max - min) / 2.0;
        100.0 - distance / half_range * 50.0
    } else if soil_f < min {
        (50.0 - (min - soil_f) * 5.0).max(0.0)
    } else {
        (50.0 - (soil_f - max) * 5.0).max(0.0)
    };
    let score = score.round().clamp(0.0, 100.0) as u8;

    let (suitable, reason) = if score >= 80 {
        (true, "Ideal soil temperature for planting".to_string())
    } else if score >= 50 {
        (true, "Acceptable soil temperature, but not optimal".to_string())
    } else if soil_f < min {
        (
            false,
            format!("Soil temperature too low ({soil}°F vs. {}°F minimum)", optimal.min),
        )
    } else {
        (
            false,
            format!("Soil temperature too high ({soil}°F vs. {}°F maximum)", optimal.max),
        )
    };

    PlantingSuitability {
        suitable,
        score,
        reason,
        soil_temp_f: Some(soil),
        optimal_range: optimal,
    }
}
