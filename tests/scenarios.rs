//! End-to-end scenarios exercising the orchestrator against synthetic
//! weather, one per tactical situation the routing core is meant to handle.

use std::sync::Arc;

use weatherrouter::model::{BoatClass, Coordinate};
use weatherrouter::orchestrator::{Orchestrator, RouteRequest};
use weatherrouter::weather::{ConstantWeatherProvider, WeatherProvider};
use weatherrouter::RouterError;

fn departure() -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339("2026-06-01T00:00:00Z").unwrap().with_timezone(&chrono::Utc)
}

fn request(origin: Coordinate, destination: Coordinate, boat_class: BoatClass) -> RouteRequest {
    RouteRequest { origin, destination, departure_time: departure(), boat_class, boat_profile: None }
}

#[tokio::test]
async fn sailboat_beam_reach_scores_well_above_the_pass_bar() {
    let provider: Arc<dyn WeatherProvider> = Arc::new(ConstantWeatherProvider::new(15.0, 0.0));
    let orchestrator = Orchestrator::new(provider);
    let req = request(Coordinate::new(50.0, -2.0), Coordinate::new(50.1, -1.3), BoatClass::Sailboat);

    let response = orchestrator.calculate_routes(req).await.unwrap();
    assert!(!response.routes.is_empty());
    let best = &response.routes[0];
    assert!(best.score >= 70, "expected a well-scored beam reach, got {}", best.score);
}

#[tokio::test]
async fn dead_upwind_leg_produces_a_tacking_route_longer_than_the_great_circle() {
    let start = Coordinate::new(50.0, -2.0);
    let end = Coordinate::new(50.0, 0.0);
    // Wind blowing from due east, destination due east: dead upwind.
    let provider: Arc<dyn WeatherProvider> = Arc::new(ConstantWeatherProvider::new(16.0, 90.0));
    let orchestrator = Orchestrator::new(provider);
    let req = request(start, end, BoatClass::Sailboat);

    let response = orchestrator.calculate_routes(req).await.unwrap();
    let great_circle = weatherrouter::geo::distance(start, end).unwrap();
    let tacking = response.routes.iter().find(|r| r.name == "Tacking Route");
    assert!(tacking.is_some(), "expected a tacking route among the candidates");
    let tacking = tacking.unwrap();
    assert!(tacking.waypoints.len() >= 4);
    assert!(
        tacking.distance_nm >= great_circle * 1.1,
        "tacking route ({:.1}nm) should be meaningfully longer than the great circle ({:.1}nm)",
        tacking.distance_nm,
        great_circle
    );
}

#[tokio::test]
async fn dead_downwind_leg_biases_off_the_rhumb_line() {
    let start = Coordinate::new(50.0, -2.0);
    let end = Coordinate::new(50.0, 0.0);
    // Wind blowing from due west, destination due east: dead downwind.
    let provider: Arc<dyn WeatherProvider> = Arc::new(ConstantWeatherProvider::new(18.0, 270.0));
    let orchestrator = Orchestrator::new(provider);
    let req = request(start, end, BoatClass::Sailboat);

    let response = orchestrator.calculate_routes(req).await.unwrap();
    let weather_seeking = response.routes.iter().find(|r| r.name == "Weather-Seeking Route");
    if let Some(route) = weather_seeking {
        let bearing0 = weatherrouter::geo::bearing(start, end).unwrap();
        let first_leg_bearing = route.waypoints[1].heading.unwrap_or(bearing0);
        assert!(weatherrouter::geo::angular_diff(first_leg_bearing, bearing0) > 1.0, "weather-seeking leg should bias off the rhumb line");
    }
}

#[tokio::test]
async fn motorboat_in_heavy_weather_scores_poorly_and_warns() {
    let start = Coordinate::new(50.0, -2.0);
    let end = Coordinate::new(50.1, -1.3);
    // Wind above the motorboat's max safe wind and waves above its max safe
    // wave height, so both the wind and wave sub-scores take a hit.
    let provider: Arc<dyn WeatherProvider> =
        Arc::new(ConstantWeatherProvider { wave_height_m: 2.5, ..ConstantWeatherProvider::new(50.0, 0.0) });
    let orchestrator = Orchestrator::new(provider);
    let req = request(start, end, BoatClass::Motorboat);

    let response = orchestrator.calculate_routes(req).await.unwrap();
    let best = &response.routes[0];
    assert!(best.score < 50, "expected a depressed score in heavy weather, got {}", best.score);
    assert!(!best.warnings.is_empty(), "expected at least one warning about the conditions");
}

#[tokio::test]
async fn same_point_request_is_rejected_as_bad_request() {
    let provider: Arc<dyn WeatherProvider> = Arc::new(ConstantWeatherProvider::new(15.0, 0.0));
    let orchestrator = Orchestrator::new(provider);
    let same = Coordinate::new(50.0, -2.0);
    let req = request(same, same, BoatClass::Sailboat);

    let result = orchestrator.calculate_routes(req).await;
    assert!(matches!(result, Err(RouterError::BadRequest(_))));
}

#[tokio::test]
async fn weather_provider_failure_surfaces_as_provider_unavailable() {
    use weatherrouter::weather::WeatherProvider as _;
    struct AlwaysFails;
    #[async_trait::async_trait]
    impl WeatherProvider for AlwaysFails {
        async fn fetch_batch(
            &self,
            _bbox: weatherrouter::weather::BoundingBox,
            _points: &[(usize, Coordinate)],
            _hours: &[(usize, chrono::DateTime<chrono::Utc>)],
            _departure_time: chrono::DateTime<chrono::Utc>,
        ) -> Result<Vec<weatherrouter::weather::WeatherSample>, RouterError> {
            Err(RouterError::ProviderUnavailable("upstream outage".into()))
        }
    }

    let provider: Arc<dyn WeatherProvider> = Arc::new(AlwaysFails);
    let mut orchestrator = Orchestrator::new(provider);
    orchestrator.deadlines.provider_max_retries = 0;
    let req = request(Coordinate::new(50.0, -2.0), Coordinate::new(50.1, -1.3), BoatClass::Sailboat);

    let result = orchestrator.calculate_routes(req).await;
    assert!(matches!(result, Err(RouterError::ProviderUnavailable(_))));
}
