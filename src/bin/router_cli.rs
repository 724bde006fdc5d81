//! Debug harness: runs one route calculation against a constant synthetic
//! wind field and prints the ranked routes, per-wave timings, and any
//! diagnostics. Kept in the teacher's `router_cli` style — a plain `main`
//! with `env_logger::init()` and printlns, no test harness involved.

use std::sync::Arc;
use std::time::Instant;

use weatherrouter::model::{BoatClass, Coordinate};
use weatherrouter::orchestrator::{Orchestrator, RouteRequest};
use weatherrouter::weather::{ConstantWeatherProvider, WeatherProvider};

#[tokio::main]
async fn main() {
    env_logger::init();
    println!("--- Weather Routing CLI Debugger ---");

    let start = Coordinate::new(48.0, -5.0); // Off the coast of Brittany
    let destination = Coordinate::new(40.0, -10.0); // Towards the Azores

    println!("Route: {start:?} -> {destination:?}");

    // 20kt from the north-west, calm seas: a beam/broad reach for this leg.
    let provider: Arc<dyn WeatherProvider> = Arc::new(ConstantWeatherProvider::new(20.0, 315.0));
    let orchestrator = Orchestrator::new(provider);

    let request = RouteRequest {
        origin: start,
        destination,
        departure_time: chrono::Utc::now(),
        boat_class: BoatClass::Sailboat,
        boat_profile: None,
    };

    let started = Instant::now();
    match orchestrator.calculate_routes(request).await {
        Ok(response) => {
            println!("Calculation time: {:?}", started.elapsed());
            println!("Weather grid: {} points, {} hourly slices", response.grid_points.len(), response.times.len());
            println!("Routes returned: {}", response.routes.len());
            for route in &response.routes {
                println!(
                    "  [{:?}] {} - {:.1}nm, {} ({} waypoints, score {})",
                    route.route_type,
                    route.name,
                    route.distance_nm,
                    route.estimated_time_human(),
                    route.waypoints.len(),
                    route.score
                );
                for warning in &route.warnings {
                    println!("      warning: {warning}");
                }
            }
            if !response.diagnostics.is_empty() {
                println!("Diagnostics:");
                for diagnostic in &response.diagnostics {
                    println!("  {diagnostic}");
                }
            }
        }
        Err(err) => {
            eprintln!("route calculation failed: {err}");
            std::process::exit(1);
        }
    }

    println!("\nDebug completed.");
}
