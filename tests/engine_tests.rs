//! Integration tests for the growing-data engine
//!
//! Exercises the cache lifecycle with real model types and the pure
//! calculator pipeline end to end. Network-backed resolution is covered by
//! unit tests against the fallback tiers, so nothing here touches the wire.

use std::time::Duration;

use chrono::NaiveDate;
use tempfile::TempDir;

use growcast::cache::TtlCache;
use growcast::models::{
    Coordinate, CountryCode, DataSource, PlantDescriptor, PlantType, Region, RegionResult,
    SourceKind, TemperaturePreference, ZoneResult,
};
use growcast::{frost, planting, zone};

fn zone_fixture(kind: SourceKind) -> ZoneResult {
    let source = match kind {
        SourceKind::Api => DataSource::api("PHZMAPI.org"),
        SourceKind::Database => DataSource::database("Hardiness Zones Database (City)"),
        SourceKind::Estimated => DataSource::estimated("Estimated Zone (latitude-based)"),
    };
    ZoneResult {
        zone: "7b".to_string(),
        source,
        city: None,
        temperature_range: None,
        coordinate: Coordinate::new(39.0, -77.0).unwrap(),
    }
}

fn region_fixture(country: CountryCode, region: Region) -> RegionResult {
    RegionResult {
        country_code: country,
        country: None,
        region,
        city: None,
        state: None,
        source: DataSource::estimated("Estimated Region (coordinates-based)"),
    }
}

#[test]
fn cached_zone_result_survives_process_restart() {
    let dir = TempDir::new().unwrap();
    let original = zone_fixture(SourceKind::Api);
    let key = original.coordinate.cache_key("zone");

    {
        let cache = TtlCache::open(dir.path()).unwrap();
        cache.set(&key, &original, Duration::from_secs(3600), true);
        cache.flush();
    }

    // A new cache over the same directory stands in for a restarted process
    let reopened = TtlCache::open(dir.path()).unwrap();
    let restored: ZoneResult = reopened.get(&key).expect("persisted zone should be restored");
    assert_eq!(restored, original);
}

#[test]
fn short_ttl_entry_expires_for_real() {
    let dir = TempDir::new().unwrap();
    let cache = TtlCache::open(dir.path()).unwrap();
    let result = zone_fixture(SourceKind::Api);

    cache.set("zone:short", &result, Duration::from_secs(1), true);
    std::thread::sleep(Duration::from_secs(2));

    // Expired entries must not come back from memory or from disk
    assert!(cache.get::<ZoneResult>("zone:short").is_none());

    let reopened = TtlCache::open(dir.path()).unwrap();
    assert!(reopened.get::<ZoneResult>("zone:short").is_none());
}

#[test]
fn latitude_fallback_always_yields_a_zone() {
    for lat in [-89.9, -45.0, -12.3, 0.0, 23.4, 51.5, 71.2, 89.9] {
        let code = zone::estimate_zone_from_latitude(lat);
        assert!(!code.is_empty());
        let number = zone::zone_number(code);
        assert!((1..=11).contains(&number));
    }
}

#[test]
fn confidence_is_bounded_for_every_source_mix() {
    let kinds = [
        SourceKind::Api,
        SourceKind::Database,
        SourceKind::Estimated,
    ];
    for zone_kind in kinds {
        for region_kind in kinds {
            let zone = zone_fixture(zone_kind);
            let mut region = region_fixture(CountryCode::Us, Region::Northeast);
            region.source = match region_kind {
                SourceKind::Api => DataSource::api("OpenWeatherMap Geocoding"),
                SourceKind::Database => DataSource::database("table"),
                SourceKind::Estimated => {
                    DataSource::estimated("Estimated Region (coordinates-based)")
                }
            };
            let rating = frost::confidence_rating(Some(&zone), None, Some(&region));
            assert!((60..=100).contains(&i32::from(rating)));
        }
    }
}

#[test]
fn growing_season_is_non_negative_everywhere() {
    let year = 2024;
    let cases = [
        (CountryCode::Us, Region::Northeast, "3a"),
        (CountryCode::Us, Region::Southeast, "10b"),
        (CountryCode::Uk, Region::North, "8a"),
        (CountryCode::Uk, Region::South, "9a"),
        (CountryCode::Ca, Region::Prairie, "3b"),
        (CountryCode::Ca, Region::WestCoast, "8b"),
        (CountryCode::Au, Region::Southern, "9b"),
        (CountryCode::Au, Region::Northern, "11a"),
    ];

    for (country, region, zone) in cases {
        let region = region_fixture(country, region);
        let dates = frost::frost_dates(zone, &region, year);
        assert!(
            dates.growing_season_days >= 0,
            "negative season for {country} {zone}"
        );
        assert!(dates.first_frost.earliest <= dates.first_frost.latest);
    }
}

#[test]
fn cool_vegetable_pipeline_us_zone_7b() {
    let plant = PlantDescriptor::new(PlantType::Vegetable, TemperaturePreference::Cool);
    let region = region_fixture(CountryCode::Us, Region::Northeast);
    let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

    let windows = planting::compute_windows(&plant, "7b", None, &region, today);
    assert_eq!(windows.len(), 2);
    assert_eq!(
        windows[0].start_date,
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    );
    assert_eq!(
        windows[1].start_date,
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
    );

    let dates = frost::frost_dates("7b", &region, 2024);
    // Both windows sit inside the frost-free season's calendar spread
    assert!(windows[0].start_date < dates.first_frost.average);
    assert!(dates.growing_season_days > 180);
}

#[test]
fn australia_southern_cool_vegetable_gets_two_windows() {
    let plant = PlantDescriptor::new(PlantType::Vegetable, TemperaturePreference::Cool);
    let region = region_fixture(CountryCode::Au, Region::Southern);
    let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

    let windows = planting::compute_windows(&plant, "9b", None, &region, today);
    let seasons: Vec<_> = windows.iter().map(|w| w.season).collect();
    assert_eq!(windows.len(), 2);
    assert_eq!(
        seasons,
        vec![
            growcast::models::WindowSeason::Autumn,
            growcast::models::WindowSeason::Spring
        ]
    );
}
