//! Boat performance model (spec §4.2).
//!
//! The bilinear TWS×TWA lookup is grounded on the teacher's
//! `parsers::polars::PolarData::get_speed`; this module adds the no-go zone,
//! the motorboat special case, and `optimal_vmg_heading`, none of which the
//! teacher implements.

use crate::geo::{angular_diff, normalize_deg};
use crate::model::{BoatClass, BoatProfile};

/// A no-go threshold below which the polar reports zero speed, in degrees
/// off the wind. Typical for sailing craft per spec §3.
pub const DEFAULT_NO_GO_THRESHOLD_DEG: f64 = 45.0;

/// Tabulated boat-speed samples indexed by TWS rows and TWA columns.
///
/// `speeds[twa_idx][tws_idx]` is the speed in knots, matching the teacher's
/// row/column convention in `PolarData`.
#[derive(Debug, Clone)]
pub struct PolarTable {
    pub tws: Vec<f64>,
    pub twa: Vec<f64>,
    pub speeds: Vec<Vec<f64>>,
    pub no_go_threshold_deg: f64,
}

impl Default for PolarTable {
    fn default() -> Self {
        Self { tws: Vec::new(), twa: Vec::new(), speeds: Vec::new(), no_go_threshold_deg: DEFAULT_NO_GO_THRESHOLD_DEG }
    }
}

impl PolarTable {
    pub fn new(tws: Vec<f64>, twa: Vec<f64>, speeds: Vec<Vec<f64>>) -> Self {
        Self { tws, twa, speeds, no_go_threshold_deg: DEFAULT_NO_GO_THRESHOLD_DEG }
    }

    /// Bilinear lookup of boat speed (knots) at the given TWS/TWA, with
    /// below/above-range TWS clamped to the nearest sampled row (spec §4.2).
    /// `twa` is taken as `|twa|` — the table is symmetric about 0°.
    fn lookup(&self, tws: f64, twa: f64) -> f64 {
        if self.tws.is_empty() || self.twa.is_empty() {
            return 0.0;
        }
        let twa = twa.abs();

        let tws_clamped = tws.clamp(self.tws[0], *self.tws.last().unwrap());
        let twa_clamped = twa.clamp(self.twa[0], *self.twa.last().unwrap());

        let (tws_i0, tws_i1) = bracket(&self.tws, tws_clamped);
        let (twa_i0, twa_i1) = bracket(&self.twa, twa_clamped);

        let v00 = self.speeds[twa_i0][tws_i0];
        let v01 = self.speeds[twa_i0][tws_i1];
        let v10 = self.speeds[twa_i1][tws_i0];
        let v11 = self.speeds[twa_i1][tws_i1];

        if tws_i0 == tws_i1 && twa_i0 == twa_i1 {
            return v00;
        }

        let tws0 = self.tws[tws_i0];
        let tws1 = self.tws[tws_i1];
        let twa0 = self.twa[twa_i0];
        let twa1 = self.twa[twa_i1];

        let tws_frac = if tws0 == tws1 { 0.0 } else { (tws_clamped - tws0) / (tws1 - tws0) };
        let twa_frac = if twa0 == twa1 { 0.0 } else { (twa_clamped - twa0) / (twa1 - twa0) };

        let along_tws_0 = v00 * (1.0 - tws_frac) + v01 * tws_frac;
        let along_tws_1 = v10 * (1.0 - tws_frac) + v11 * tws_frac;
        along_tws_0 * (1.0 - twa_frac) + along_tws_1 * twa_frac
    }
}

impl PolarTable {
    /// A plausible stand-in table per boat class. Spec §1 scopes the
    /// *content* of boat polar data out — only the interpolation contract
    /// is specified — so this exists to make the crate runnable, not as an
    /// authoritative performance curve.
    pub fn default_for(class: BoatClass) -> Self {
        match class {
            BoatClass::Sailboat => PolarTable::new(
                vec![0.0, 8.0, 16.0, 24.0, 32.0],
                vec![0.0, 45.0, 60.0, 90.0, 120.0, 150.0, 180.0],
                vec![
                    vec![0.0, 0.0, 0.0, 0.0, 0.0],
                    vec![0.0, 3.2, 4.8, 5.6, 5.2],
                    vec![0.0, 4.0, 5.8, 6.6, 6.1],
                    vec![0.0, 4.4, 6.4, 7.2, 6.8],
                    vec![0.0, 4.0, 6.0, 7.0, 6.9],
                    vec![0.0, 3.2, 5.0, 6.2, 6.3],
                    vec![0.0, 2.6, 4.2, 5.4, 5.8],
                ],
            ),
            BoatClass::Catamaran => PolarTable::new(
                vec![0.0, 8.0, 16.0, 24.0, 32.0],
                vec![0.0, 50.0, 70.0, 100.0, 130.0, 160.0, 180.0],
                vec![
                    vec![0.0, 0.0, 0.0, 0.0, 0.0],
                    vec![0.0, 5.0, 7.5, 9.0, 8.4],
                    vec![0.0, 6.2, 9.2, 10.8, 10.0],
                    vec![0.0, 6.8, 10.4, 12.0, 11.2],
                    vec![0.0, 6.0, 9.6, 11.2, 10.8],
                    vec![0.0, 4.8, 7.8, 9.4, 9.2],
                    vec![0.0, 4.0, 6.6, 8.0, 8.0],
                ],
            ),
            BoatClass::Motorboat => {
                PolarTable { tws: vec![0.0, 45.0], twa: vec![0.0, 180.0], speeds: vec![vec![18.0, 18.0], vec![18.0, 18.0]], no_go_threshold_deg: 0.0 }
            }
        }
    }
}

/// Reflects any angle (degrees) onto `[0, 180]`, the polar table's symmetric
/// domain: e.g. 270 and -90 both fold onto 90.
fn reflect_to_0_180(deg: f64) -> f64 {
    let a = deg.abs().rem_euclid(360.0);
    if a > 180.0 { 360.0 - a } else { a }
}

fn bracket(sorted: &[f64], value: f64) -> (usize, usize) {
    for i in 0..sorted.len().saturating_sub(1) {
        if value >= sorted[i] && value <= sorted[i + 1] {
            return (i, i + 1);
        }
    }
    (0, sorted.len() - 1)
}

/// The performance model: boat profile + tabulated polar.
#[derive(Debug, Clone)]
pub struct Polar {
    pub table: PolarTable,
}

impl Polar {
    pub fn new(table: PolarTable) -> Self {
        Self { table }
    }

    /// Boat speed in knots for a given boat, true wind speed, and off-bow
    /// angle. `twa` is reflected into `[0, 180]` first, so callers may pass
    /// any raw angle difference and still get the table's symmetric result.
    /// Returns 0 inside the no-go zone. Motorboats ignore `twa` entirely and
    /// return `min(avg_cruising_speed, speed_at_tws)`.
    pub fn speed(&self, boat: &BoatProfile, tws: f64, twa: f64) -> f64 {
        if boat.class == BoatClass::Motorboat {
            return self.table.lookup(tws.max(0.0), 0.0).min(boat.avg_cruising_speed_kt).max(0.0);
        }
        let twa = reflect_to_0_180(twa);
        if twa < self.table.no_go_threshold_deg {
            return 0.0;
        }
        self.table.lookup(tws.max(0.0), twa)
    }

    /// Scans headings at 1° resolution and returns the heading (and
    /// resulting VMG in knots) that maximizes `speed · cos(angle_to_dest)`.
    /// Ties are broken by the smaller absolute bearing deviation from
    /// `destination_bearing` (spec §4.2).
    pub fn optimal_vmg_heading(
        &self,
        boat: &BoatProfile,
        tws: f64,
        destination_bearing: f64,
        wind_from: f64,
    ) -> (f64, f64) {
        let mut best_heading = destination_bearing;
        let mut best_vmg = f64::MIN;
        let mut best_deviation = f64::MAX;

        let mut h = 0.0f64;
        while h < 360.0 {
            let twa = angular_diff(h, wind_from);
            let speed = self.speed(boat, tws, twa);
            let angle_to_dest = angular_diff(h, destination_bearing).to_radians();
            let vmg = speed * angle_to_dest.cos();
            let deviation = angular_diff(h, destination_bearing);

            if vmg > best_vmg + 1e-9 || (vmg > best_vmg - 1e-9 && deviation < best_deviation) {
                best_vmg = vmg;
                best_heading = h;
                best_deviation = deviation;
            }
            h += 1.0;
        }

        (normalize_deg(best_heading), best_vmg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_table() -> PolarTable {
        PolarTable::new(
            vec![0.0, 10.0, 20.0],
            vec![0.0, 90.0, 180.0],
            vec![vec![0.0, 5.0, 10.0], vec![0.0, 8.0, 16.0], vec![0.0, 6.0, 12.0]],
        )
    }

    #[test]
    fn no_go_zone_returns_zero() {
        let polar = Polar::new(flat_table());
        let boat = BoatProfile::sailboat_default();
        assert_eq!(polar.speed(&boat, 10.0, 20.0), 0.0);
        assert_eq!(polar.speed(&boat, 10.0, 44.9), 0.0);
    }

    #[test]
    fn symmetry_about_zero_twa() {
        let polar = Polar::new(flat_table());
        let boat = BoatProfile::sailboat_default();
        assert_eq!(polar.speed(&boat, 10.0, 90.0), polar.speed(&boat, 10.0, 360.0 - 90.0));
    }

    #[test]
    fn clamps_extrapolation_beyond_table_bounds() {
        let polar = Polar::new(flat_table());
        let boat = BoatProfile::sailboat_default();
        assert_eq!(polar.speed(&boat, 100.0, 90.0), polar.speed(&boat, 20.0, 90.0));
        assert_eq!(polar.speed(&boat, -5.0, 90.0), polar.speed(&boat, 0.0, 90.0));
    }

    #[test]
    fn motorboat_ignores_twa() {
        let polar = Polar::new(flat_table());
        let boat = BoatProfile::motorboat_default();
        let a = polar.speed(&boat, 10.0, 0.0);
        let b = polar.speed(&boat, 10.0, 170.0);
        assert_eq!(a, b);
    }

    #[test]
    fn vmg_prefers_heading_closer_to_destination_on_tie() {
        let polar = Polar::new(flat_table());
        let boat = BoatProfile::sailboat_default();
        let (heading, vmg) = polar.optimal_vmg_heading(&boat, 10.0, 0.0, 180.0);
        assert!(vmg > 0.0);
        assert!(heading.abs() < 180.0);
    }
}
