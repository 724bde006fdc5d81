//! Orchestrator (spec §4.7): the single entry point that turns a route
//! request into a scored, ranked set of candidate routes.
//!
//! The "validate, build one shared weather grid, then run two route
//! generators and merge their output" shape is grounded on the teacher's
//! `IsochroneRouter::calculate_route`, which drives a single engine off one
//! `WindField`. This module generalizes that into two independently-sourced
//! pipelines — the isochrone search and the hybrid tactical generator — run
//! concurrently off the one grid, since spec §5 requires the CPU-bound
//! search not to block the async runtime. `rayon::join` (the teacher's own
//! parallelism tool) does the concurrent half; `tokio::task::spawn_blocking`
//! keeps it off the async executor.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::config::{RequestDeadlines, ScorerWeights, SearchConfig, TOP_K_ROUTES};
use crate::error::RouterError;
use crate::geo;
use crate::hybrid::HybridRouter;
use crate::isochrone::{IsochroneSearch, SearchOutcome, SearchState};
use crate::model::{BoatClass, BoatProfile, Coordinate, Route, WaypointWeather};
use crate::polar::{Polar, PolarTable};
use crate::scorer::Scorer;
use crate::weather::{BoundingBox, WeatherGrid, WeatherProvider};

/// A route calculation request (spec §6).
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub departure_time: DateTime<Utc>,
    pub boat_class: BoatClass,
    /// Overrides `BoatProfile::default_for(boat_class)` when present, so a
    /// caller with a more precisely surveyed boat can supply its own
    /// envelope instead of the stand-in default.
    pub boat_profile: Option<BoatProfile>,
}

/// The full response shape (spec §6): ranked routes plus the weather grid
/// used to compute them, so a caller can render both without a second call.
#[derive(Debug, Clone)]
pub struct RouteResponse {
    pub routes: Vec<Route>,
    pub grid_points: Vec<Coordinate>,
    pub bounds: BoundingBox,
    pub times: Vec<DateTime<Utc>>,
    pub grid_point_hourly_weather: Vec<Vec<WaypointWeather>>,
    pub calculated_at: DateTime<Utc>,
    pub diagnostics: Vec<String>,
}

pub struct Orchestrator {
    pub provider: Arc<dyn WeatherProvider>,
    pub search_config: SearchConfig,
    pub deadlines: RequestDeadlines,
    pub scorer_weights: ScorerWeights,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self {
            provider,
            search_config: SearchConfig::default(),
            deadlines: RequestDeadlines::default(),
            scorer_weights: ScorerWeights::default(),
        }
    }

    /// Rejects degenerate requests before any weather fetch or search work
    /// is scheduled (spec §7: `BadRequest` is the caller's fault, not a
    /// downstream failure).
    fn validate(&self, request: &RouteRequest) -> Result<(), RouterError> {
        if !request.origin.is_valid() {
            return Err(RouterError::BadRequest(format!("invalid origin coordinate: {:?}", request.origin)));
        }
        if !request.destination.is_valid() {
            return Err(RouterError::BadRequest(format!("invalid destination coordinate: {:?}", request.destination)));
        }
        let direct_distance = geo::distance(request.origin, request.destination).map_err(|e| RouterError::BadRequest(e.to_string()))?;
        if direct_distance <= self.search_config.goal_tolerance_nm {
            return Err(RouterError::BadRequest("origin and destination are the same point".into()));
        }
        Ok(())
    }

    /// Runs the full pipeline of spec §4.7: validate, estimate, build the
    /// shared weather grid, run both route generators concurrently, merge,
    /// score, and return the top `TOP_K_ROUTES` routes by score.
    pub async fn calculate_routes(&self, request: RouteRequest) -> Result<RouteResponse, RouterError> {
        self.validate(&request)?;

        let boat = request.boat_profile.unwrap_or_else(|| BoatProfile::default_for(request.boat_class));
        let direct_distance_nm = geo::distance(request.origin, request.destination).map_err(|e| RouterError::BadRequest(e.to_string()))?;
        let estimated_duration_h = direct_distance_nm / boat.avg_cruising_speed_kt.max(0.1);

        info!(
            "calculating routes: {:.1}nm direct, ~{:.1}h estimated, boat={:?}",
            direct_distance_nm, estimated_duration_h, request.boat_class
        );

        let grid = tokio::time::timeout(
            self.deadlines.request_deadline,
            WeatherGrid::build(request.origin, request.destination, request.departure_time, estimated_duration_h, Arc::clone(&self.provider), &self.deadlines),
        )
        .await
        .map_err(|_| RouterError::ProviderTimeout(self.deadlines.request_deadline))??;
        let grid = Arc::new(grid);

        let search_config = self.search_config.with_reduced_step_for_short_route(direct_distance_nm, boat.max_cruising_speed_kt);
        let polar_table = PolarTable::default_for(request.boat_class);

        let origin = request.origin;
        let destination = request.destination;
        let departure_time = request.departure_time;
        let grid_for_blocking = Arc::clone(&grid);

        let (isochrone_result, hybrid_routes) = tokio::task::spawn_blocking(move || {
            let polar = Polar::new(polar_table);
            rayon::join(
                || IsochroneSearch::new(origin, destination, boat, &polar, &grid_for_blocking, search_config, departure_time).run(),
                || HybridRouter::new(origin, destination, boat, &polar, &grid_for_blocking, departure_time).generate(),
            )
        })
        .await
        .map_err(|e| RouterError::Internal(e.to_string()))?;

        let isochrone_result = isochrone_result?;

        let mut diagnostics = Vec::new();
        let mut candidates: Vec<Route> = Vec::new();
        candidates.extend(hybrid_routes);

        // Per spec §4.4.2/§7: EXHAUSTED and TIMEOUT "yield whatever solutions
        // were found or none" — `routes` is populated independent of the
        // final state whenever the search found at least one solution before
        // the cap fired, and that downgrade is silent (best-effort), not a
        // reason to drop the routes.
        match isochrone_result.state {
            SearchState::Reconstructed => {}
            SearchState::Timeout => {
                warn!("isochrone search timed out: {}", isochrone_result.diagnostic.as_deref().unwrap_or("no diagnostic"));
                diagnostics.push(format!("isochrone search timed out: {}", isochrone_result.diagnostic.as_deref().unwrap_or("unknown")));
            }
            SearchState::Exhausted => {
                diagnostics.push(format!("isochrone search exhausted its frontier: {}", isochrone_result.diagnostic.as_deref().unwrap_or("unknown")));
            }
            SearchState::Unreachable => {
                diagnostics.push("isochrone search found no productive heading from the origin".to_string());
            }
        }
        candidates.extend(isochrone_result.routes);

        // Per spec §7: `SearchTimeout`/`Unreachable` are non-fatal whenever
        // the companion pipeline still produced routes. An empty result set
        // is a valid (if unhelpful) response, never an error.
        if candidates.is_empty() {
            return Err(RouterError::Unreachable);
        }

        let polar_for_scoring = Polar::new(PolarTable::default_for(request.boat_class));
        let scorer = Scorer::new(&polar_for_scoring, boat, self.scorer_weights);
        for route in &mut candidates {
            scorer.score(route, direct_distance_nm);
        }

        candidates.sort_by(|a, b| b.score.cmp(&a.score));
        candidates.truncate(TOP_K_ROUTES);

        Ok(RouteResponse {
            routes: candidates,
            grid_points: grid.grid_points.clone(),
            bounds: grid.bounds,
            times: grid.times.clone(),
            grid_point_hourly_weather: grid.hourly_weather_per_point(),
            calculated_at: Utc::now(),
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::{ConstantWeatherProvider, FailingWeatherProvider};

    fn test_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-06-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn request(origin: Coordinate, destination: Coordinate, boat_class: BoatClass) -> RouteRequest {
        RouteRequest { origin, destination, departure_time: test_time(), boat_class, boat_profile: None }
    }

    #[tokio::test]
    async fn beam_reach_sailboat_produces_ranked_routes() {
        let provider: Arc<dyn WeatherProvider> = Arc::new(ConstantWeatherProvider::new(15.0, 0.0));
        let orchestrator = Orchestrator::new(provider);
        let req = request(Coordinate::new(50.0, -2.0), Coordinate::new(50.1, -1.8), BoatClass::Sailboat);
        let response = orchestrator.calculate_routes(req).await.unwrap();
        assert!(!response.routes.is_empty());
        assert!(response.routes.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(response.routes.len() <= TOP_K_ROUTES);
        assert!(!response.grid_point_hourly_weather.is_empty());
    }

    #[tokio::test]
    async fn degenerate_same_point_request_is_rejected() {
        let provider: Arc<dyn WeatherProvider> = Arc::new(ConstantWeatherProvider::new(15.0, 0.0));
        let orchestrator = Orchestrator::new(provider);
        let same = Coordinate::new(50.0, -2.0);
        let req = request(same, same, BoatClass::Sailboat);
        assert!(matches!(orchestrator.calculate_routes(req).await, Err(RouterError::BadRequest(_))));
    }

    #[tokio::test]
    async fn invalid_coordinate_is_rejected() {
        let provider: Arc<dyn WeatherProvider> = Arc::new(ConstantWeatherProvider::new(15.0, 0.0));
        let orchestrator = Orchestrator::new(provider);
        let req = request(Coordinate::new(200.0, 0.0), Coordinate::new(50.0, -1.0), BoatClass::Sailboat);
        assert!(matches!(orchestrator.calculate_routes(req).await, Err(RouterError::BadRequest(_))));
    }

    #[tokio::test]
    async fn failing_weather_provider_is_reported_as_provider_unavailable() {
        let provider: Arc<dyn WeatherProvider> = Arc::new(FailingWeatherProvider);
        let mut orchestrator = Orchestrator::new(provider);
        orchestrator.deadlines.provider_max_retries = 0;
        let req = request(Coordinate::new(50.0, -2.0), Coordinate::new(50.1, -1.8), BoatClass::Sailboat);
        assert!(matches!(orchestrator.calculate_routes(req).await, Err(RouterError::ProviderUnavailable(_))));
    }
}
