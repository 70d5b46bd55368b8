use anyhow::{Context, Result};
use growcast::models::{CountryCode, PlantDescriptor, PlantType, TemperaturePreference};
use growcast::{GrowcastConfig, GrowingDataService};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        eprintln!(
            "usage: growcast <latitude> <longitude> [plant_type] [temperature_preference] [country]"
        );
        std::process::exit(2);
    }

    let latitude: f64 = args[0]
        .parse()
        .with_context(|| format!("latitude '{}' is not a number", args[0]))?;
    let longitude: f64 = args[1]
        .parse()
        .with_context(|| format!("longitude '{}' is not a number", args[1]))?;
    let plant_type = args
        .get(2)
        .map(|s| s.parse::<PlantType>())
        .transpose()?
        .unwrap_or(PlantType::Vegetable);
    let preference = args
        .get(3)
        .map(|s| s.parse::<TemperaturePreference>())
        .transpose()?
        .unwrap_or_default();

    let config = GrowcastConfig::load()?;
    let country_hint = args
        .get(4)
        .or(config.defaults.country_hint.as_ref())
        .map(|s| s.parse::<CountryCode>())
        .transpose()?;

    let service = GrowingDataService::new(&config)?;
    service.start_maintenance();

    let plant = PlantDescriptor::new(plant_type, preference);
    let sowing = service
        .sowing_report(latitude, longitude, &plant, country_hint)
        .await?;
    println!("{}", serde_json::to_string_pretty(&sowing)?);

    let frost = service
        .frost_report(latitude, longitude, country_hint)
        .await?;
    println!("{}", serde_json::to_string_pretty(&frost)?);

    service.shutdown();
    Ok(())
}
