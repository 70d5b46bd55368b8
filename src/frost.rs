//! Frost date estimation and the composite confidence rating
//!
//! Frost dates are hemisphere-aware table lookups: fixed regional tables for
//! the UK, Canada and Australia, and a zone-number step table for everything
//! else. All dates land in the current calendar year; the ±7-day range
//! expresses the uncertainty of a climatological average.

use chrono::{Days, NaiveDate};

use crate::models::{
    CountryCode, FrostDateRange, FrostDates, Region, RegionResult, SourceKind, WeatherResult,
    ZoneResult,
};
use crate::zone::zone_number;

/// Half-width of the frost date uncertainty band
pub const FROST_RANGE_DAYS: u64 = 7;

/// Confidence starts here and accrues per-resolver source bonuses
const BASE_CONFIDENCE: i32 = 60;

fn md(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("frost tables hold valid dates")
}

/// Average first frost (start of the cold season) for a zone and region
#[must_use]
pub fn first_frost_date(zone: &str, region: &RegionResult, year: i32) -> NaiveDate {
    match region.country_code {
        // Southern hemisphere: first frost arrives in autumn (April-May)
        CountryCode::Au => match region.region {
            Region::Northern => md(year, 5, 15), // tropical, may never freeze
            Region::Central => md(year, 5, 1),
            _ => md(year, 4, 15),
        },
        CountryCode::Uk => match region.region {
            Region::North => md(year, 10, 15),
            Region::Midlands => md(year, 10, 30),
            _ => md(year, 11, 15),
        },
        CountryCode::Ca => match region.region {
            Region::Northern => md(year, 9, 1),
            Region::Prairie => md(year, 9, 15),
            Region::Central => md(year, 10, 1),
            Region::Atlantic => md(year, 10, 15),
            _ => md(year, 11, 1), // west coast
        },
        CountryCode::Us => {
            let (month, day) = match zone_number(zone) {
                0..=3 => (9, 1),
                4 => (9, 15),
                5 => (10, 1),
                6 => (10, 15),
                7 => (11, 1),
                8 => (11, 15),
                9 => (12, 1),
                _ => (12, 15),
            };
            md(year, month, day)
        }
    }
}

/// Average last frost (end of the cold season) for a zone and region
#[must_use]
pub fn last_frost_date(zone: &str, region: &RegionResult, year: i32) -> NaiveDate {
    match region.country_code {
        // Southern hemisphere: last frost falls at the end of winter
        CountryCode::Au => match region.region {
            Region::Northern => md(year, 8, 1),
            Region::Central => md(year, 8, 15),
            _ => md(year, 9, 1),
        },
        CountryCode::Uk => match region.region {
            Region::North => md(year, 4, 30),
            Region::Midlands => md(year, 4, 15),
            _ => md(year, 3, 30),
        },
        CountryCode::Ca => match region.region {
            Region::Northern => md(year, 6, 15),
            Region::Prairie => md(year, 5, 31),
            Region::Central => md(year, 5, 15),
            Region::Atlantic => md(year, 5, 1),
            _ => md(year, 4, 15), // west coast
        },
        CountryCode::Us => {
            let (month, day) = match zone_number(zone) {
                0..=3 => (6, 1),
                4 => (5, 15),
                5 => (5, 1),
                6 => (4, 15),
                7 => (4, 1),
                8 => (3, 15),
                9 => (3, 1),
                _ => (2, 15),
            };
            md(year, month, day)
        }
    }
}

/// ± day bounds around a date, for uncertainty display
#[must_use]
pub fn date_range(date: NaiveDate, days: u64) -> FrostDateRange {
    FrostDateRange {
        average: date,
        earliest: date.checked_sub_days(Days::new(days)).unwrap_or(date),
        latest: date.checked_add_days(Days::new(days)).unwrap_or(date),
    }
}

/// Days between last and first frost; clamped at zero when the table dates
/// cross (as they do in the southern hemisphere's calendar year)
#[must_use]
pub fn growing_season_days(last_frost: NaiveDate, first_frost: NaiveDate) -> i64 {
    (first_frost - last_frost).num_days().max(0)
}

/// Assemble the full frost payload for a location
#[must_use]
pub fn frost_dates(zone: &str, region: &RegionResult, year: i32) -> FrostDates {
    let first = first_frost_date(zone, region, year);
    let last = last_frost_date(zone, region, year);

    FrostDates {
        first_frost: date_range(first, FROST_RANGE_DAYS),
        last_frost: date_range(last, FROST_RANGE_DAYS),
        growing_season_days: growing_season_days(last, first),
    }
}

fn source_bonus(kind: SourceKind) -> i32 {
    match kind {
        SourceKind::Api => 10,
        SourceKind::Database => 8,
        SourceKind::Estimated => 2,
    }
}

/// Composite 0-100 confidence rating from the resolvers' source quality.
///
/// Each resolver contributes independently when its result is present.
#[must_use]
pub fn confidence_rating(
    zone: Option<&ZoneResult>,
    weather: Option<&WeatherResult>,
    region: Option<&RegionResult>,
) -> u8 {
    let mut confidence = BASE_CONFIDENCE;

    if let Some(zone) = zone {
        confidence += source_bonus(zone.source.kind);
    }
    if let Some(weather) = weather {
        confidence += source_bonus(weather.source.kind);
    }
    if let Some(region) = region {
        confidence += source_bonus(region.source.kind);
    }

    confidence.clamp(0, 100) as u8
}
