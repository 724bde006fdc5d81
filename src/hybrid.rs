//! Hybrid pattern-based route generator: deterministic tactical routes
//! (tacking, VMG, weather-seeking) that run alongside the isochrone search
//! and compete with its output.
//!
//! Each generator steps leg by leg: compute a course, look up the polar
//! speed for that course's wind, step the position forward, attach
//! weather to the resulting waypoint.

use chrono::{DateTime, Utc};

use crate::geo::{self, wrap_to_180};
use crate::model::{BoatProfile, Coordinate, Route, RouteType, Waypoint};
use crate::polar::Polar;
use crate::scenario::{self, Scenario};
use crate::weather::WeatherGrid;

/// Number of legs in the tacking generator.
const TACK_LEG_COUNT: usize = 4;
const CLOSING_LEG_THRESHOLD_NM: f64 = 10.0;
const WEATHER_SEEK_OFFSET_MIN_NM: f64 = 10.0;
const WEATHER_SEEK_OFFSET_MAX_NM: f64 = 50.0;
const WEATHER_SEEK_OFFSET_FRACTION: f64 = 0.05;

pub struct HybridRouter<'a> {
    pub origin: Coordinate,
    pub goal: Coordinate,
    pub boat: BoatProfile,
    pub polar: &'a Polar,
    pub grid: &'a WeatherGrid,
    pub departure_time: DateTime<Utc>,
}

impl<'a> HybridRouter<'a> {
    pub fn new(origin: Coordinate, goal: Coordinate, boat: BoatProfile, polar: &'a Polar, grid: &'a WeatherGrid, departure_time: DateTime<Utc>) -> Self {
        Self { origin, goal, boat, polar, grid, departure_time }
    }

    /// Generates the scenario-appropriate tactical routes. Upwind scenarios
    /// get a tacking route in addition to VMG and weather-seeking; other
    /// scenarios skip tacking since a direct-ish bearing is already
    /// productive.
    pub fn generate(&self) -> Vec<Route> {
        let origin_wind = self.grid.at(self.origin, self.departure_time);
        let bearing0 = geo::bearing(self.origin, self.goal).unwrap_or(0.0);
        let scenario = scenario::classify(bearing0, origin_wind.wind_direction_deg);

        let mut routes = Vec::new();
        if scenario == Scenario::Upwind {
            routes.push(self.tacking_route(bearing0, origin_wind.wind_direction_deg));
        }
        routes.push(self.vmg_route(bearing0, origin_wind.wind_direction_deg));
        routes.push(self.weather_seeking_route(bearing0));
        routes
    }

    /// Alternating legs at ±VMG angle off the wind, with a closing leg aimed
    /// straight at the goal once within `CLOSING_LEG_THRESHOLD_NM`.
    fn tacking_route(&self, bearing0: f64, wind_from: f64) -> Route {
        let total_distance = geo::distance(self.origin, self.goal).unwrap_or(0.0);
        let vmg_angle = self.boat.optimal_vmg_angle_deg;

        let starboard_heading = wrap_positive(wind_from + vmg_angle);
        let port_heading = wrap_positive(wind_from - vmg_angle);
        // Whichever tack heading lies closer to the rhumb bearing makes the
        // most progress; alternate starting from that one.
        let starboard_first = geo::angular_diff(starboard_heading, bearing0) <= geo::angular_diff(port_heading, bearing0);

        let leg_distance = total_distance / TACK_LEG_COUNT as f64;
        let mut legs = Vec::with_capacity(TACK_LEG_COUNT);
        for i in 0..TACK_LEG_COUNT {
            let on_starboard = if starboard_first { i % 2 == 0 } else { i % 2 == 1 };
            let heading = if on_starboard { starboard_heading } else { port_heading };
            legs.push((heading, leg_distance));
        }

        let route_type = if starboard_first { RouteType::Starboard } else { RouteType::Port };
        self.sail_legs("Tacking Route", route_type, &legs, true)
    }

    /// Monotone heading close to destination bearing, biased toward the
    /// polar's VMG peak via a two-piece bearing schedule: an initial leg
    /// biased by half the VMG deviation, then a corrective leg straight at
    /// the goal.
    fn vmg_route(&self, bearing0: f64, wind_from: f64) -> Route {
        let total_distance = geo::distance(self.origin, self.goal).unwrap_or(0.0);
        let wind_speed = self.grid.at(self.origin, self.departure_time).wind_speed_kt;
        let (vmg_heading, _) = self.polar.optimal_vmg_heading(&self.boat, wind_speed, bearing0, wind_from);

        let delta = wrap_to_180(vmg_heading - bearing0);
        let biased_heading = wrap_positive(bearing0 + delta * 0.5);

        let first_leg_fraction = 0.6;
        let legs = vec![
            (biased_heading, total_distance * first_leg_fraction),
            (bearing0, total_distance * (1.0 - first_leg_fraction)),
        ];
        self.sail_legs("VMG Route", RouteType::Direct, &legs, true)
    }

    /// Samples wind speed at points offset perpendicular to the rhumb line
    /// and curves toward the stronger-wind side by an offset of 5% of
    /// route length, capped to `[WEATHER_SEEK_OFFSET_MIN_NM, ..MAX_NM]`.
    fn weather_seeking_route(&self, bearing0: f64) -> Route {
        let total_distance = geo::distance(self.origin, self.goal).unwrap_or(0.0);
        let midpoint = geo::destination(self.origin, bearing0, total_distance / 2.0).unwrap_or(self.origin);

        let offset_nm = (total_distance * WEATHER_SEEK_OFFSET_FRACTION).clamp(WEATHER_SEEK_OFFSET_MIN_NM, WEATHER_SEEK_OFFSET_MAX_NM);
        let left_bearing = wrap_positive(bearing0 - 90.0);
        let right_bearing = wrap_positive(bearing0 + 90.0);

        let sample_offset_nm = total_distance.min(offset_nm * 2.0).max(1.0);
        let left_point = geo::destination(midpoint, left_bearing, sample_offset_nm).unwrap_or(midpoint);
        let right_point = geo::destination(midpoint, right_bearing, sample_offset_nm).unwrap_or(midpoint);

        let left_wind = self.grid.at(left_point, self.departure_time).wind_speed_kt;
        let right_wind = self.grid.at(right_point, self.departure_time).wind_speed_kt;

        let chosen_bearing = if right_wind >= left_wind { right_bearing } else { left_bearing };
        let waypoint = geo::destination(midpoint, chosen_bearing, offset_nm).unwrap_or(midpoint);

        let leg1_heading = geo::bearing(self.origin, waypoint).unwrap_or(bearing0);
        let leg1_distance = geo::distance(self.origin, waypoint).unwrap_or(total_distance / 2.0);
        let leg2_heading = geo::bearing(waypoint, self.goal).unwrap_or(bearing0);
        let leg2_distance = geo::distance(waypoint, self.goal).unwrap_or(total_distance / 2.0);

        let legs = vec![(leg1_heading, leg1_distance), (leg2_heading, leg2_distance)];
        self.sail_legs("Weather-Seeking Route", RouteType::Direct, &legs, false)
    }

    /// Steps through a list of (heading, distance) legs, deriving speed
    /// from the polar at each leg's wind, accumulating elapsed time, and
    /// attaching weather to every waypoint.
    ///
    /// When `close_on_goal` is set, once the remaining distance to the goal
    /// drops below `CLOSING_LEG_THRESHOLD_NM` the next leg steers straight
    /// at the goal instead of continuing on its nominal heading.
    fn sail_legs(&self, name: &str, route_type: RouteType, legs: &[(f64, f64)], close_on_goal: bool) -> Route {
        let mut waypoints = vec![Waypoint::origin(self.origin, self.departure_time)];
        waypoints[0].weather = Some(self.grid.at(self.origin, self.departure_time));

        let mut position = self.origin;
        let mut elapsed_h = 0.0;
        let mut distance_nm = 0.0;

        for &(nominal_heading, leg_distance) in legs {
            if leg_distance <= 0.0 {
                continue;
            }
            let remaining_to_goal = geo::distance(position, self.goal).unwrap_or(f64::MAX);
            let heading = if close_on_goal && remaining_to_goal <= CLOSING_LEG_THRESHOLD_NM {
                geo::bearing(position, self.goal).unwrap_or(nominal_heading)
            } else {
                nominal_heading
            };

            let eta = self.departure_time + chrono::Duration::milliseconds((elapsed_h * 3_600_000.0) as i64);
            let wind = self.grid.at(position, eta);
            let twa = geo::angular_diff(heading, wind.wind_direction_deg);
            let speed = self.polar.speed(&self.boat, wind.wind_speed_kt, twa).max(0.1);

            let step_distance = if close_on_goal && remaining_to_goal <= CLOSING_LEG_THRESHOLD_NM {
                remaining_to_goal.min(leg_distance)
            } else {
                leg_distance
            };

            let leg_hours = step_distance / speed;
            let next_position = geo::destination(position, heading, step_distance).unwrap_or(position);
            elapsed_h += leg_hours;
            distance_nm += step_distance;

            let eta = self.departure_time + chrono::Duration::milliseconds((elapsed_h * 3_600_000.0) as i64);
            waypoints.push(Waypoint {
                position: next_position,
                eta,
                heading: Some(heading),
                weather: Some(self.grid.at(next_position, eta)),
            });
            position = next_position;
        }

        // Final closing leg straight to the goal, if legs didn't land on it.
        let remaining = geo::distance(position, self.goal).unwrap_or(0.0);
        if remaining > 0.05 {
            let heading = geo::bearing(position, self.goal).unwrap_or(0.0);
            let eta = self.departure_time + chrono::Duration::milliseconds((elapsed_h * 3_600_000.0) as i64);
            let wind = self.grid.at(position, eta);
            let twa = geo::angular_diff(heading, wind.wind_direction_deg);
            let speed = self.polar.speed(&self.boat, wind.wind_speed_kt, twa).max(0.1);
            let leg_hours = remaining / speed;
            elapsed_h += leg_hours;
            distance_nm += remaining;
            let eta = self.departure_time + chrono::Duration::milliseconds((elapsed_h * 3_600_000.0) as i64);
            waypoints.push(Waypoint { position: self.goal, eta, heading: Some(heading), weather: Some(self.grid.at(self.goal, eta)) });
        }

        Route {
            name: name.to_string(),
            route_type,
            score: 0,
            distance_nm,
            estimated_hours: elapsed_h,
            waypoints,
            warnings: Vec::new(),
            pros: Vec::new(),
            cons: Vec::new(),
            no_go_violations: Vec::new(),
        }
    }
}

fn wrap_positive(deg: f64) -> f64 {
    geo::normalize_deg(deg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polar::PolarTable;
    use crate::weather::{ConstantWeatherProvider, WeatherProvider};
    use std::sync::Arc;

    fn test_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-06-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn flat_polar() -> Polar {
        Polar::new(PolarTable::new(
            vec![0.0, 10.0, 20.0, 40.0],
            vec![0.0, 45.0, 90.0, 135.0, 180.0],
            vec![
                vec![0.0, 0.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0, 0.0],
                vec![0.0, 5.0, 6.0, 7.0],
                vec![0.0, 6.0, 7.0, 8.0],
                vec![0.0, 4.0, 5.0, 6.0],
            ],
        ))
    }

    async fn build_grid(start: Coordinate, end: Coordinate, wind_speed: f64, wind_from: f64) -> WeatherGrid {
        let provider: Arc<dyn WeatherProvider> = Arc::new(ConstantWeatherProvider::new(wind_speed, wind_from));
        WeatherGrid::build(start, end, test_time(), 20.0, provider, &crate::config::RequestDeadlines::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn upwind_scenario_produces_a_tacking_route_with_multiple_tacks() {
        let start = Coordinate::new(50.0, -2.0);
        let end = Coordinate::new(50.0, 0.0);
        // Wind from the east (090), destination due east: dead upwind.
        let grid = build_grid(start, end, 15.0, 90.0).await;
        let polar = flat_polar();
        let router = HybridRouter::new(start, end, BoatProfile::sailboat_default(), &polar, &grid, test_time());
        let routes = router.generate();

        let tacking = routes.iter().find(|r| r.name == "Tacking Route").expect("tacking route present");
        assert!(tacking.waypoints.len() >= 4, "expected multiple tack legs, got {}", tacking.waypoints.len());
        assert!(tacking.distance_nm > geo::distance(start, end).unwrap() * 1.1);
    }

    #[tokio::test]
    async fn downwind_scenario_skips_tacking_route() {
        let start = Coordinate::new(50.0, -2.0);
        let end = Coordinate::new(50.0, 0.0);
        let grid = build_grid(start, end, 15.0, 270.0).await;
        let polar = flat_polar();
        let router = HybridRouter::new(start, end, BoatProfile::sailboat_default(), &polar, &grid, test_time());
        let routes = router.generate();
        assert!(routes.iter().all(|r| r.name != "Tacking Route"));
    }

    #[tokio::test]
    async fn weather_seeking_route_has_an_intermediate_waypoint() {
        let start = Coordinate::new(50.0, -2.0);
        let end = Coordinate::new(50.0, 0.0);
        let grid = build_grid(start, end, 15.0, 45.0).await;
        let polar = flat_polar();
        let router = HybridRouter::new(start, end, BoatProfile::sailboat_default(), &polar, &grid, test_time());
        let routes = router.generate();
        let ws = routes.iter().find(|r| r.name == "Weather-Seeking Route").unwrap();
        assert!(ws.waypoints.len() >= 3);
    }

    #[tokio::test]
    async fn waypoints_have_strictly_increasing_eta() {
        let start = Coordinate::new(50.0, -2.0);
        let end = Coordinate::new(50.0, 0.0);
        let grid = build_grid(start, end, 15.0, 90.0).await;
        let polar = flat_polar();
        let router = HybridRouter::new(start, end, BoatProfile::sailboat_default(), &polar, &grid, test_time());
        for route in router.generate() {
            for pair in route.waypoints.windows(2) {
                assert!(pair[1].eta > pair[0].eta, "eta must strictly increase in {}", route.name);
            }
        }
    }
}
