use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use transit_engine::domain::LatLon;
use transit_engine::{EngineConfig, TransitEngine};

/// Default feed refresh interval in hours.
const DEFAULT_REFRESH_HOURS: u64 = 24;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Ok(feed_dir) = std::env::var("GTFS_DIR") else {
        error!("GTFS_DIR not set; point it at a directory of extracted GTFS tables");
        std::process::exit(2);
    };
    let refresh_hours = match std::env::var("GTFS_REFRESH_HOURS") {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!(value = %value, "GTFS_REFRESH_HOURS is not a whole number, using default");
            DEFAULT_REFRESH_HOURS
        }),
        Err(_) => DEFAULT_REFRESH_HOURS,
    };

    let engine = TransitEngine::new(EngineConfig::new(PathBuf::from(feed_dir)));

    info!("loading feed");
    if let Err(err) = engine.load_feed(false).await {
        error!(error = %err, outcome = %err.kind(), "initial feed load failed");
        std::process::exit(1);
    }

    // Spawn background task to reload the feed periodically
    let refresher = engine.clone();
    let refresh = tokio::spawn(async move {
        let period = Duration::from_secs(refresh_hours.max(1) * 60 * 60);
        let mut interval = tokio::time::interval(period);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            if let Err(err) = refresher.load_feed(true).await {
                warn!(error = %err, "scheduled feed refresh failed");
            }
        }
    });

    match (coordinate_var("SUGGEST_FROM"), coordinate_var("SUGGEST_TO")) {
        (Some(origin), Some(destination)) => {
            let now = chrono::Local::now().naive_local();
            match engine.suggest_direct_routes(origin, destination, now).await {
                Ok(answer) => match serde_json::to_string_pretty(&answer) {
                    Ok(json) => println!("{json}"),
                    Err(err) => error!(error = %err, "could not serialise suggestions"),
                },
                Err(err) => error!(error = %err, outcome = %err.kind(), "suggestion failed"),
            }
        }
        (None, None) => {
            info!(refresh_hours, "feed loaded, refreshing in the background");
            if let Err(err) = refresh.await {
                error!(error = %err, "refresh task stopped");
            }
        }
        _ => error!("SUGGEST_FROM and SUGGEST_TO must both be set as \"lat,lon\""),
    }
}

/// Read a `"lat,lon"` pair from the environment.
fn coordinate_var(name: &str) -> Option<LatLon> {
    let value = std::env::var(name).ok()?;
    let parsed = value
        .split_once(',')
        .and_then(|(lat, lon)| LatLon::parse(lat.trim(), lon.trim()));
    if parsed.is_none() {
        warn!(name, value = %value, "not a valid \"lat,lon\" coordinate");
    }
    parsed
}
