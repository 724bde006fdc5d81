//! Data model: coordinates, waypoints, boat profiles, and the route/weather
//! shapes carried across the routing core and mirrored over the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geographic point. Immutable; validity is enforced by `Geo` functions,
/// not the constructor, so invalid coordinates can still flow through
/// request parsing and be rejected as `BadRequest` at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoatClass {
    Sailboat,
    Motorboat,
    Catamaran,
}

/// Static performance envelope for a boat class (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoatProfile {
    pub class: BoatClass,
    pub avg_cruising_speed_kt: f64,
    pub max_cruising_speed_kt: f64,
    pub optimal_vmg_angle_deg: f64,
    pub min_usable_wind_kt: f64,
    pub max_safe_wind_kt: f64,
    pub max_safe_wave_height_m: f64,
}

impl BoatProfile {
    pub fn has_no_go_zone(&self) -> bool {
        self.class != BoatClass::Motorboat
    }

    pub fn sailboat_default() -> Self {
        Self {
            class: BoatClass::Sailboat,
            avg_cruising_speed_kt: 6.5,
            max_cruising_speed_kt: 9.0,
            optimal_vmg_angle_deg: 42.0,
            min_usable_wind_kt: 4.0,
            max_safe_wind_kt: 35.0,
            max_safe_wave_height_m: 3.0,
        }
    }

    pub fn catamaran_default() -> Self {
        Self {
            class: BoatClass::Catamaran,
            avg_cruising_speed_kt: 9.0,
            max_cruising_speed_kt: 14.0,
            optimal_vmg_angle_deg: 50.0,
            min_usable_wind_kt: 5.0,
            max_safe_wind_kt: 30.0,
            max_safe_wave_height_m: 2.0,
        }
    }

    pub fn motorboat_default() -> Self {
        Self {
            class: BoatClass::Motorboat,
            avg_cruising_speed_kt: 18.0,
            max_cruising_speed_kt: 28.0,
            optimal_vmg_angle_deg: 0.0,
            min_usable_wind_kt: 0.0,
            max_safe_wind_kt: 45.0,
            max_safe_wave_height_m: 1.5,
        }
    }

    pub fn default_for(class: BoatClass) -> Self {
        match class {
            BoatClass::Sailboat => Self::sailboat_default(),
            BoatClass::Catamaran => Self::catamaran_default(),
            BoatClass::Motorboat => Self::motorboat_default(),
        }
    }
}

/// Weather observed/interpolated at a single waypoint (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaypointWeather {
    pub wind_speed_kt: f64,
    pub wind_sustained_kt: f64,
    pub wind_gust_kt: f64,
    /// Meteorological "from" direction, degrees.
    pub wind_direction_deg: f64,
    pub wave_height_m: f64,
    pub precipitation_mm_h: f64,
    pub visibility_km: f64,
    pub temperature_c: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Waypoint {
    pub position: Coordinate,
    pub eta: DateTime<Utc>,
    pub heading: Option<f64>,
    pub weather: Option<WaypointWeather>,
}

impl Waypoint {
    pub fn origin(position: Coordinate, eta: DateTime<Utc>) -> Self {
        Self { position, eta, heading: None, weather: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    Direct,
    Port,
    Starboard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoGoViolation {
    pub segment_index: usize,
    pub heading_deg: f64,
    pub wind_angle_deg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    #[serde(rename = "type")]
    pub route_type: RouteType,
    pub score: u8,
    pub distance_nm: f64,
    pub estimated_hours: f64,
    pub waypoints: Vec<Waypoint>,
    pub warnings: Vec<String>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    #[serde(rename = "noGoZoneViolations")]
    pub no_go_violations: Vec<NoGoViolation>,
}

impl Route {
    pub fn estimated_time_human(&self) -> String {
        let total_minutes = (self.estimated_hours * 60.0).round() as i64;
        let hours = total_minutes / 60;
        let minutes = total_minutes % 60;
        if hours > 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{minutes}m")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoatClassParseError {
    Unknown,
}

impl std::str::FromStr for BoatClass {
    type Err = BoatClassParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sailboat" => Ok(BoatClass::Sailboat),
            "motorboat" => Ok(BoatClass::Motorboat),
            "catamaran" => Ok(BoatClass::Catamaran),
            _ => Err(BoatClassParseError::Unknown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_validity() {
        assert!(Coordinate::new(45.0, 90.0).is_valid());
        assert!(!Coordinate::new(95.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 200.0).is_valid());
    }

    #[test]
    fn motorboat_has_no_no_go_zone() {
        assert!(!BoatProfile::motorboat_default().has_no_go_zone());
        assert!(BoatProfile::sailboat_default().has_no_go_zone());
    }

    #[test]
    fn estimated_time_human_formats() {
        let mut route = sample_route();
        route.estimated_hours = 13.5;
        assert_eq!(route.estimated_time_human(), "13h 30m");
        route.estimated_hours = 0.25;
        assert_eq!(route.estimated_time_human(), "15m");
    }

    fn sample_route() -> Route {
        Route {
            name: "Direct".into(),
            route_type: RouteType::Direct,
            score: 80,
            distance_nm: 10.0,
            estimated_hours: 1.0,
            waypoints: vec![],
            warnings: vec![],
            pros: vec![],
            cons: vec![],
            no_go_violations: vec![],
        }
    }
}
