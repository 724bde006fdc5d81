//! Directional cone (spec §4.4.4): bounds headings to a window around the
//! initial destination bearing, narrowing as progress is made. Disabled
//! entirely for UPWIND scenarios so tacking away from the rhumb line is
//! possible; the tack exception that re-admits productive out-of-cone
//! headings lives in `isochrone::search` since it needs a polar lookup.

use crate::config::SearchConfig;
use crate::geo::angular_diff;

#[derive(Debug, Clone, Copy)]
pub struct ConeState {
    pub initial_bearing_deg: f64,
    pub cone_min_deg: f64,
    pub cone_max_deg: f64,
    pub narrowing_k: f64,
    pub disabled: bool,
}

impl ConeState {
    pub fn new(initial_bearing_deg: f64, config: &SearchConfig, disabled: bool) -> Self {
        Self {
            initial_bearing_deg,
            cone_min_deg: config.cone_min_deg,
            cone_max_deg: config.cone_max_deg,
            narrowing_k: config.cone_narrowing_k,
            disabled,
        }
    }

    /// `cone_half(progress) = max(cone_min, cone_max * (1 - progress*k))`.
    pub fn half_angle_deg(&self, progress_fraction: f64) -> f64 {
        if self.disabled {
            return 180.0;
        }
        let narrowed = self.cone_max_deg * (1.0 - progress_fraction * self.narrowing_k);
        narrowed.max(self.cone_min_deg)
    }

    pub fn allows(&self, heading_deg: f64, progress_fraction: f64) -> bool {
        self.disabled || angular_diff(heading_deg, self.initial_bearing_deg) <= self.half_angle_deg(progress_fraction)
    }
}
