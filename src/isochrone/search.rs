//! Time-stepped isochrone search (spec §4.4): the forward propagation that
//! expands a reachable frontier wave by wave until the goal is reached, the
//! frontier collapses, or a cap fires.
//!
//! Grounded on the teacher's `IsochroneRouter::step` — the fan-of-headings
//! expansion, per-wave grid-bucket pruning, and rayon-parallel per-parent
//! expansion are all kept from there — generalized with the no-go zone,
//! directional cone, progress gate, and multi-wave goal/reconstruction
//! machinery the teacher's single-step demo doesn't need.

use std::time::Instant;

use chrono::{DateTime, Utc};
use log::{info, warn};
use rayon::prelude::*;

use crate::config::SearchConfig;
use crate::error::RouterError;
use crate::geo::{self, angular_diff};
use crate::isochrone::arena::{IsochroneArena, IsochronePoint, PointRef};
use crate::isochrone::cone::ConeState;
use crate::isochrone::prune::{prune_wave, Candidate};
use crate::model::{BoatProfile, Coordinate, Route, RouteType, Waypoint};
use crate::polar::Polar;
use crate::scenario::{self, Scenario};
use crate::weather::WeatherGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Reconstructed,
    Exhausted,
    Timeout,
    Unreachable,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub state: SearchState,
    pub routes: Vec<Route>,
    pub diagnostic: Option<String>,
}

pub struct IsochroneSearch<'a> {
    pub origin: Coordinate,
    pub goal: Coordinate,
    pub boat: BoatProfile,
    pub polar: &'a Polar,
    pub grid: &'a WeatherGrid,
    pub config: SearchConfig,
    pub departure_time: DateTime<Utc>,
}

impl<'a> IsochroneSearch<'a> {
    pub fn new(
        origin: Coordinate,
        goal: Coordinate,
        boat: BoatProfile,
        polar: &'a Polar,
        grid: &'a WeatherGrid,
        config: SearchConfig,
        departure_time: DateTime<Utc>,
    ) -> Self {
        Self { origin, goal, boat, polar, grid, config, departure_time }
    }

    pub fn run(&self) -> Result<SearchOutcome, RouterError> {
        let started = Instant::now();

        let initial_goal_dist = geo::distance(self.origin, self.goal).map_err(|e| RouterError::BadRequest(e.to_string()))?;
        if initial_goal_dist <= self.config.goal_tolerance_nm {
            return Err(RouterError::BadRequest("origin and destination are the same point".into()));
        }
        let initial_bearing = geo::bearing(self.origin, self.goal).map_err(|e| RouterError::BadRequest(e.to_string()))?;

        let origin_wind = self.grid.at(self.origin, self.departure_time);
        let scenario = scenario::classify(initial_bearing, origin_wind.wind_direction_deg);
        let mut cone = ConeState::new(initial_bearing, &self.config, scenario == Scenario::Upwind);

        let mut arena = IsochroneArena::new();
        let origin_point = IsochronePoint { position: self.origin, time_from_start_h: 0.0, cost: 0.0, parent: None, heading_taken: None };
        let mut current_wave_idx = arena.push_wave(vec![origin_point]);

        let mut solutions: Vec<PointRef> = Vec::new();
        let mut waves_since_first_solution: Option<u32> = None;
        let mut state = SearchState::Exhausted;

        for wave_no in 0..self.config.max_waves {
            if started.elapsed() > self.config.max_wall_time {
                warn!("isochrone search hit its wall-time cap after {wave_no} waves");
                state = SearchState::Timeout;
                break;
            }

            let parents: Vec<IsochronePoint> = arena.wave(current_wave_idx).to_vec();
            if parents.is_empty() {
                state = SearchState::Exhausted;
                break;
            }

            let mut candidates = self.expand_wave(&parents, current_wave_idx, &cone, initial_goal_dist);

            if candidates.is_empty() {
                if wave_no == 0 && !cone.disabled {
                    cone.disabled = true;
                    candidates = self.expand_wave(&parents, current_wave_idx, &cone, initial_goal_dist);
                }
                if candidates.is_empty() {
                    if wave_no == 0 {
                        return Ok(SearchOutcome {
                            state: SearchState::Unreachable,
                            routes: Vec::new(),
                            diagnostic: Some("no productive heading from origin".into()),
                        });
                    }
                    state = SearchState::Exhausted;
                    break;
                }
            }

            let pruned = prune_wave(candidates, &self.config);
            let next_wave_points: Vec<IsochronePoint> = pruned.iter().cloned().map(Candidate::into_point).collect();
            let next_wave_idx = arena.push_wave(next_wave_points);

            for (slot, c) in pruned.iter().enumerate() {
                if c.dist_to_goal_nm <= self.config.goal_tolerance_nm {
                    solutions.push(PointRef { wave: next_wave_idx, slot });
                }
            }

            info!("isochrone wave {wave_no}: {} survivors, {} solutions so far", arena.wave(next_wave_idx).len(), solutions.len());

            current_wave_idx = next_wave_idx;

            if !solutions.is_empty() {
                let elapsed_waves = waves_since_first_solution.unwrap_or(0);
                if elapsed_waves >= self.config.extra_waves_after_first_solution {
                    state = SearchState::Reconstructed;
                    break;
                }
                waves_since_first_solution = Some(elapsed_waves + 1);
            }
        }

        if solutions.is_empty() {
            let diagnostic = match state {
                SearchState::Timeout => Some("search hit its wave/time cap before finding a solution".to_string()),
                _ => Some("frontier exhausted without reaching the goal".to_string()),
            };
            return Ok(SearchOutcome { state, routes: Vec::new(), diagnostic });
        }

        let chains: Vec<(f64, Vec<IsochronePoint>)> =
            solutions.iter().map(|&r| (arena.get(r).cost, arena.reconstruct(r))).collect();
        let deduped = dedup_similar_solutions(chains);

        let mut routes = Vec::with_capacity(deduped.len());
        for (i, chain) in deduped.iter().enumerate() {
            let name = if i == 0 { "Isochrone Fastest".to_string() } else { format!("Isochrone Alternate {i}") };
            routes.push(self.route_from_chain(chain, &name));
        }
        routes.sort_by(|a, b| a.estimated_hours.partial_cmp(&b.estimated_hours).unwrap());

        let final_state = if matches!(state, SearchState::Exhausted | SearchState::Timeout) {
            state
        } else {
            SearchState::Reconstructed
        };

        Ok(SearchOutcome { state: final_state, routes, diagnostic: None })
    }

    fn expand_wave(&self, parents: &[IsochronePoint], wave_idx: usize, cone: &ConeState, initial_goal_dist: f64) -> Vec<Candidate> {
        parents
            .par_iter()
            .enumerate()
            .flat_map_iter(|(slot, p)| {
                let parent_ref = PointRef { wave: wave_idx, slot };
                let wind_time = self.departure_time + chrono::Duration::milliseconds((p.time_from_start_h * 3_600_000.0) as i64);
                let wind = self.grid.at(p.position, wind_time);
                self.expand_parent(p, parent_ref, wind.wind_direction_deg, wind.wind_speed_kt, cone, initial_goal_dist)
            })
            .collect()
    }

    fn expand_parent(
        &self,
        p: &IsochronePoint,
        parent_ref: PointRef,
        wind_from_deg: f64,
        wind_speed_kt: f64,
        cone: &ConeState,
        initial_goal_dist: f64,
    ) -> Vec<Candidate> {
        let parent_dist_to_goal = match geo::distance(p.position, self.goal) {
            Ok(d) => d,
            Err(_) => return Vec::new(),
        };
        let progress_fraction = if initial_goal_dist > 0.0 { (1.0 - parent_dist_to_goal / initial_goal_dist).clamp(0.0, 1.0) } else { 0.0 };

        let headings: Vec<f64> = {
            let mut v = Vec::new();
            let mut h = 0.0;
            while h < 360.0 {
                v.push(h);
                h += self.config.angular_resolution_deg;
            }
            v
        };

        let mut in_cone = Vec::new();
        for &h in &headings {
            if !cone.allows(h, progress_fraction) {
                continue;
            }
            if let Some(c) = self.try_heading(p, parent_ref, h, wind_from_deg, wind_speed_kt, parent_dist_to_goal) {
                in_cone.push(c);
            }
        }

        if !in_cone.is_empty() || cone.disabled {
            return in_cone;
        }

        // Tack exception (spec §4.4.4): the cone produced nothing, but a
        // heading outside it may still make positive progress (VMG>0)
        // toward the goal. Admit those.
        let goal_bearing = geo::bearing(p.position, self.goal).unwrap_or(cone.initial_bearing_deg);
        let mut out_of_cone = Vec::new();
        for &h in &headings {
            if cone.allows(h, progress_fraction) {
                continue;
            }
            if angular_diff(h, goal_bearing) >= 90.0 {
                continue;
            }
            if let Some(c) = self.try_heading(p, parent_ref, h, wind_from_deg, wind_speed_kt, parent_dist_to_goal) {
                out_of_cone.push(c);
            }
        }
        out_of_cone
    }

    fn try_heading(
        &self,
        p: &IsochronePoint,
        parent_ref: PointRef,
        heading_deg: f64,
        wind_from_deg: f64,
        wind_speed_kt: f64,
        parent_dist_to_goal: f64,
    ) -> Option<Candidate> {
        let twa = angular_diff(heading_deg, wind_from_deg);
        let u = self.polar.speed(&self.boat, wind_speed_kt, twa);
        if u < self.config.min_boat_speed_kt {
            return None;
        }

        let dt = self.config.time_step_h;
        let q = geo::destination(p.position, heading_deg, u * dt).ok()?;
        let new_dist = geo::distance(q, self.goal).ok()?;

        let min_progress = self.config.min_progress_fraction * u * dt;
        if parent_dist_to_goal - new_dist < min_progress {
            return None;
        }

        Some(Candidate {
            position: q,
            time_from_start_h: p.time_from_start_h + dt,
            cost: p.cost + dt,
            parent: parent_ref,
            heading_taken: heading_deg,
            dist_to_goal_nm: new_dist,
        })
    }

    fn route_from_chain(&self, chain: &[IsochronePoint], name: &str) -> Route {
        let mut waypoints = Vec::with_capacity(chain.len());
        let mut distance_nm = 0.0;
        for (i, p) in chain.iter().enumerate() {
            let eta = self.departure_time + chrono::Duration::milliseconds((p.time_from_start_h * 3_600_000.0) as i64);
            let heading = if i == 0 { None } else { p.heading_taken };
            let weather = Some(self.grid.at(p.position, eta));
            waypoints.push(Waypoint { position: p.position, eta, heading, weather });
            if i > 0 {
                if let Ok(d) = geo::distance(chain[i - 1].position, p.position) {
                    distance_nm += d;
                }
            }
        }
        let estimated_hours = chain.last().map(|p| p.time_from_start_h).unwrap_or(0.0);

        Route {
            name: name.to_string(),
            route_type: RouteType::Direct,
            score: 0,
            distance_nm,
            estimated_hours,
            waypoints,
            warnings: Vec::new(),
            pros: Vec::new(),
            cons: Vec::new(),
            no_go_violations: Vec::new(),
        }
    }
}

/// Drops solutions that differ from an already-kept one by less than 1% in
/// cost and are spatially very similar, per spec §4.4.7. Similarity is a
/// Fréchet-like proxy: mean per-index waypoint distance below a small
/// threshold.
fn dedup_similar_solutions(mut chains: Vec<(f64, Vec<IsochronePoint>)>) -> Vec<Vec<IsochronePoint>> {
    const SPATIAL_THRESHOLD_NM: f64 = 5.0;

    chains.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    let mut kept: Vec<(f64, Vec<IsochronePoint>)> = Vec::new();

    'outer: for (cost, chain) in chains {
        for (kept_cost, kept_chain) in &kept {
            let cost_close = (cost - kept_cost).abs() / kept_cost.max(1e-9) < crate::config::GOAL_SIMILARITY_COST_FRACTION;
            if cost_close && mean_waypoint_distance(&chain, kept_chain) < SPATIAL_THRESHOLD_NM {
                continue 'outer;
            }
        }
        kept.push((cost, chain));
    }

    kept.into_iter().map(|(_, c)| c).collect()
}

fn mean_waypoint_distance(a: &[IsochronePoint], b: &[IsochronePoint]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return f64::MAX;
    }
    let mut total = 0.0;
    let mut count = 0usize;
    for i in 0..n {
        if let Ok(d) = geo::distance(a[i].position, b[i].position) {
            total += d;
            count += 1;
        }
    }
    if count == 0 { f64::MAX } else { total / count as f64 }
}
