//! Tunable defaults for the search, scoring, and request-handling layers.
//! Kept as plain data so tuning a weight or cap never touches the
//! algorithm that consumes it.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    pub time_step_h: f64,
    pub angular_resolution_deg: f64,
    pub prune_cell_deg: f64,
    pub time_bucket_h: f64,
    pub cone_min_deg: f64,
    pub cone_max_deg: f64,
    pub cone_narrowing_k: f64,
    pub goal_tolerance_nm: f64,
    pub max_wall_time: Duration,
    pub max_waves: u32,
    pub max_points_per_wave: usize,
    pub extra_waves_after_first_solution: u32,
    pub min_progress_fraction: f64,
    pub min_boat_speed_kt: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_step_h: 1.0,
            angular_resolution_deg: 10.0,
            prune_cell_deg: 0.1,
            time_bucket_h: 1.0,
            cone_min_deg: 30.0,
            cone_max_deg: 90.0,
            cone_narrowing_k: 1.0,
            goal_tolerance_nm: 5.0,
            max_wall_time: Duration::from_secs(20),
            max_waves: 240,
            max_points_per_wave: 2000,
            extra_waves_after_first_solution: 2,
            min_progress_fraction: 0.05,
            min_boat_speed_kt: 0.1,
        }
    }
}

impl SearchConfig {
    /// Reduces the time step so that the direct path spans at least 8 steps,
    /// giving short routes enough resolution to produce a meaningful search.
    pub fn with_reduced_step_for_short_route(mut self, direct_distance_nm: f64, max_boat_speed_kt: f64) -> Self {
        if max_boat_speed_kt <= 0.0 {
            return self;
        }
        let direct_hours = direct_distance_nm / max_boat_speed_kt;
        let min_steps = 8.0;
        if direct_hours > 0.0 && direct_hours / self.time_step_h < min_steps {
            self.time_step_h = (direct_hours / min_steps).max(0.05);
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScorerWeights {
    pub wind: f64,
    pub waves: f64,
    pub visibility: f64,
    pub distance: f64,
}

impl Default for ScorerWeights {
    fn default() -> Self {
        Self { wind: 0.35, waves: 0.25, visibility: 0.15, distance: 0.25 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestDeadlines {
    pub isochrone_deadline: Duration,
    pub hybrid_deadline: Duration,
    pub request_deadline: Duration,
    pub provider_batch_timeout: Duration,
    pub provider_max_in_flight: usize,
    pub provider_max_retries: u32,
}

impl Default for RequestDeadlines {
    fn default() -> Self {
        Self {
            isochrone_deadline: Duration::from_secs(20),
            hybrid_deadline: Duration::from_secs(5),
            request_deadline: Duration::from_secs(30),
            provider_batch_timeout: Duration::from_secs(10),
            provider_max_in_flight: 4,
            provider_max_retries: 2,
        }
    }
}

pub const TOP_K_ROUTES: usize = 3;
pub const WEATHER_GRID_TARGET_SPACING_NM: f64 = 10.0;
pub const WEATHER_GRID_PADDING_DEG: f64 = 0.5;
pub const WEATHER_PROVIDER_BATCH_SIZE: usize = 100;
pub const GOAL_SIMILARITY_COST_FRACTION: f64 = 0.01;
