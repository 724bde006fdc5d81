//! Debug harness: builds a `WeatherGrid` from a constant synthetic
//! provider and dumps the samples around its midpoint, for manually
//! eyeballing interpolation without wiring up a full route request. Plays
//! the role the teacher's `inspect_grib` plays for GRIB files.

use std::sync::Arc;

use weatherrouter::config::RequestDeadlines;
use weatherrouter::model::Coordinate;
use weatherrouter::weather::{ConstantWeatherProvider, WeatherGrid, WeatherProvider};

#[tokio::main]
async fn main() {
    env_logger::init();

    let start = Coordinate::new(50.89, -1.39);
    let end = Coordinate::new(49.63, -1.62);
    println!("Building weather grid {start:?} -> {end:?}...");

    let provider: Arc<dyn WeatherProvider> = Arc::new(ConstantWeatherProvider::new(18.0, 240.0));
    let grid = match WeatherGrid::build(start, end, chrono::Utc::now(), 13.0, provider, &RequestDeadlines::default()).await {
        Ok(grid) => grid,
        Err(err) => {
            eprintln!("failed to build weather grid: {err}");
            std::process::exit(1);
        }
    };

    println!("Grid: {}x{} points ({} total), {} hourly slices", grid.lat_count, grid.lng_count, grid.grid_points.len(), grid.times.len());
    println!("Bounds: {:?}", grid.bounds);

    let mid_idx = grid.grid_points.len() / 2;
    let mid_point = grid.grid_points[mid_idx];
    println!("\nMidpoint {mid_point:?} over time:");
    for (i, t) in grid.times.iter().enumerate() {
        let w = grid.at(mid_point, *t);
        println!(
            "  t={i} ({t}): wind {:.1}kt from {:.0}deg, waves {:.1}m, visibility {:.1}km",
            w.wind_speed_kt, w.wind_direction_deg, w.wave_height_m, w.visibility_km
        );
    }
}
