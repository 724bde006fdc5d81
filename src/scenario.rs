//! Wind-relative scenario classification, shared by `IsochroneCore` (cone
//! gating, spec §4.4.4) and `HybridRouter` (generator selection, spec §4.5).

use crate::geo::angular_diff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Upwind,
    Beam,
    Broad,
    Downwind,
}

/// Classifies by the angle between the destination bearing and the
/// wind's "from" direction at the origin (spec §4.5).
pub fn classify(destination_bearing_deg: f64, wind_from_deg: f64) -> Scenario {
    let angle = angular_diff(destination_bearing_deg, wind_from_deg);
    if angle < 60.0 {
        Scenario::Upwind
    } else if angle < 100.0 {
        Scenario::Beam
    } else if angle < 150.0 {
        Scenario::Broad
    } else {
        Scenario::Downwind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_all_four_bands() {
        assert_eq!(classify(0.0, 0.0), Scenario::Upwind);
        assert_eq!(classify(0.0, 80.0), Scenario::Beam);
        assert_eq!(classify(0.0, 120.0), Scenario::Broad);
        assert_eq!(classify(0.0, 180.0), Scenario::Downwind);
    }
}
