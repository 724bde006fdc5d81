//! Route scorer (spec §4.6): a weighted-voting design over four per-segment
//! sub-scores. Kept as a small config struct (`ScorerWeights`) precisely so
//! tuning never touches this scoring code (spec §9 design notes).

use crate::config::ScorerWeights;
use crate::geo;
use crate::model::{BoatClass, BoatProfile, NoGoViolation, Route};
use crate::polar::Polar;

pub struct Scorer<'a> {
    pub polar: &'a Polar,
    pub boat: BoatProfile,
    pub weights: ScorerWeights,
}

impl<'a> Scorer<'a> {
    pub fn new(polar: &'a Polar, boat: BoatProfile, weights: ScorerWeights) -> Self {
        Self { polar, boat, weights }
    }

    /// Scores a route in place: fills `score`, `warnings`, `pros`, `cons`,
    /// and `no_go_violations`. Deterministic — equal routes score equal
    /// (spec §8 invariant 9), since every sub-score is a pure function of
    /// the route's own waypoints.
    pub fn score(&self, route: &mut Route, great_circle_distance_nm: f64) {
        let mut wind_scores = Vec::new();
        let mut wave_scores = Vec::new();
        let mut visibility_scores = Vec::new();
        let mut warnings = Vec::new();
        let mut no_go_violations = Vec::new();

        for (i, window) in route.waypoints.windows(2).enumerate() {
            let from = &window[0];
            let to = &window[1];
            let Some(weather) = to.weather else { continue };
            let heading = to.heading.unwrap_or(0.0);

            wind_scores.push(self.wind_sub_score(&weather, heading, &mut warnings));
            wave_scores.push(self.wave_sub_score(&weather, &mut warnings));
            visibility_scores.push(self.visibility_sub_score(&weather));

            if self.boat.has_no_go_zone() {
                let twa = geo::angular_diff(heading, weather.wind_direction_deg);
                if twa < self.polar.table.no_go_threshold_deg {
                    no_go_violations.push(NoGoViolation { segment_index: i, heading_deg: heading, wind_angle_deg: twa });
                }
            }

            let _ = from;
        }

        let wind_avg = average(&wind_scores);
        let wave_avg = average(&wave_scores);
        let visibility_avg = average(&visibility_scores);
        let distance_score = self.distance_sub_score(route.distance_nm, great_circle_distance_nm);

        let weighted = wind_avg * self.weights.wind
            + wave_avg * self.weights.waves
            + visibility_avg * self.weights.visibility
            + distance_score * self.weights.distance;

        route.score = weighted.round().clamp(0.0, 100.0) as u8;
        route.warnings = dedup(warnings);
        route.no_go_violations = no_go_violations;

        let mut pros = Vec::new();
        let mut cons = Vec::new();
        if wind_avg >= 80.0 {
            pros.push("Favorable wind conditions throughout".to_string());
        }
        if wave_avg < 50.0 {
            cons.push("Significant wave exposure on parts of the route".to_string());
        }
        if distance_score >= 90.0 {
            pros.push("Close to the direct great-circle distance".to_string());
        } else if distance_score < 60.0 {
            cons.push("Meaningfully longer than the direct route".to_string());
        }
        if !route.no_go_violations.is_empty() {
            cons.push(format!("{} segment(s) pass through the no-go zone", route.no_go_violations.len()));
        }
        route.pros = pros;
        route.cons = cons;
    }

    fn wind_sub_score(&self, weather: &crate::model::WaypointWeather, heading_deg: f64, warnings: &mut Vec<String>) -> f64 {
        let speed = weather.wind_speed_kt;

        if speed > self.boat.max_safe_wind_kt {
            warnings.push(format!("Wind {speed:.0}kt exceeds the boat's max safe wind of {:.0}kt", self.boat.max_safe_wind_kt));
            let excess = (speed - self.boat.max_safe_wind_kt) / self.boat.max_safe_wind_kt.max(1.0);
            return (30.0 - excess * 30.0).max(0.0);
        }
        if speed < self.boat.min_usable_wind_kt {
            warnings.push(format!("Wind {speed:.0}kt is below the boat's minimum usable wind of {:.0}kt", self.boat.min_usable_wind_kt));
            return if self.boat.min_usable_wind_kt > 0.0 { 40.0 * (speed / self.boat.min_usable_wind_kt) } else { 100.0 };
        }

        let mut score = 70.0;
        if self.boat.class != BoatClass::Motorboat {
            let twa = geo::angular_diff(heading_deg, weather.wind_direction_deg);
            // Reward beam/broad angles (60-150 off the wind); close-hauled
            // and dead-downwind are less comfortable/efficient.
            if (60.0..=150.0).contains(&twa) {
                score = 100.0;
            } else if twa < 60.0 {
                score = 70.0 + (twa / 60.0) * 30.0;
            } else {
                score = 100.0 - ((twa - 150.0) / 30.0).clamp(0.0, 1.0) * 30.0;
            }
        } else {
            score = 90.0;
        }
        score.clamp(0.0, 100.0)
    }

    fn wave_sub_score(&self, weather: &crate::model::WaypointWeather, warnings: &mut Vec<String>) -> f64 {
        let max = self.boat.max_safe_wave_height_m.max(0.01);
        let ratio = weather.wave_height_m / max;
        if ratio >= 1.0 {
            warnings.push(format!("Wave height {:.1}m meets or exceeds the boat's safe limit of {:.1}m", weather.wave_height_m, max));
            0.0
        } else if ratio >= 0.7 {
            let frac = (ratio - 0.7) / 0.3;
            (70.0 - frac * 70.0).max(0.0)
        } else {
            100.0 - (ratio / 0.7) * 30.0
        }
    }

    fn visibility_sub_score(&self, weather: &crate::model::WaypointWeather) -> f64 {
        let visibility_score = (weather.visibility_km / 10.0 * 100.0).clamp(0.0, 100.0);
        let precip_penalty = (weather.precipitation_mm_h * 5.0).clamp(0.0, 40.0);
        (visibility_score - precip_penalty).clamp(0.0, 100.0)
    }

    fn distance_sub_score(&self, route_distance_nm: f64, great_circle_distance_nm: f64) -> f64 {
        if great_circle_distance_nm <= 0.0 {
            return 100.0;
        }
        let ratio = route_distance_nm / great_circle_distance_nm;
        (100.0 - (ratio - 1.0).max(0.0) * 100.0).clamp(0.0, 100.0)
    }
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        100.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn dedup(mut values: Vec<String>) -> Vec<String> {
    values.sort();
    values.dedup();
    values
}
