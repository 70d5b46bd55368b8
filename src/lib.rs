//! `GrowCast` - climate and planting-window engine for garden planning
//!
//! This library resolves growing data (hardiness zone, weather, soil
//! temperature, region) for a coordinate through ordered fallback chains,
//! then derives planting windows, frost dates and a confidence score for a
//! given plant.

pub mod cache;
pub mod config;
pub mod error;
pub mod frost;
pub mod models;
pub mod planting;
pub mod region;
pub mod service;
pub mod tips;
pub mod weather;
pub mod zone;

// Re-export core types for public API
pub use cache::TtlCache;
pub use config::GrowcastConfig;
pub use error::GrowcastError;
pub use models::{
    Coordinate, CountryCode, PlantDescriptor, PlantType, Region, Season, TemperaturePreference,
};
pub use service::{FrostReport, GrowingDataService, SowingReport, ZoneReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, GrowcastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
