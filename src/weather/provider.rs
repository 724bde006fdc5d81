//! `WeatherProvider`: the abstract collaborator of spec §6. Only the
//! interface and a deterministic in-memory adapter are in scope — real
//! provider access (GRIB/HTTP ingestion) is explicitly out of scope
//! (spec §1), which is why the teacher's GRIB/BUFR parsers and `reqwest`
//! dependency were dropped rather than carried forward (see DESIGN.md).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::RouterError;
use crate::model::{Coordinate, WaypointWeather};
use crate::weather::grid::BoundingBox;

/// One requested/returned sample: a grid point index, an hour index, and
/// the weather at that (point, hour).
#[derive(Debug, Clone, Copy)]
pub struct WeatherSample {
    pub point_idx: usize,
    pub time_idx: usize,
    pub weather: WaypointWeather,
}

/// Hourly wind/wave field access for a bounding box and time window.
/// Implementations are expected to be cheap to clone/share (e.g. an
/// `Arc`-wrapped HTTP client) since the orchestrator fans out batched calls
/// concurrently (spec §5).
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetches weather for the given `points` (by index into the caller's
    /// grid-point list) at the given `hours` (by index into the caller's
    /// time list). A provider error is fatal to the whole grid build
    /// (spec §4.3 failure policy) — partial grids are never assembled from
    /// a partially failed batch.
    async fn fetch_batch(
        &self,
        bbox: BoundingBox,
        points: &[(usize, Coordinate)],
        hours: &[(usize, DateTime<Utc>)],
        departure_time: DateTime<Utc>,
    ) -> Result<Vec<WeatherSample>, RouterError>;
}

/// Deterministic synthetic provider used by tests, the CLI, and any caller
/// that wants to exercise the routing core without network access. Wind is
/// a constant (speed, from-direction) pair; waves/visibility/etc. are held
/// at calm defaults. This plays the role the teacher's manual `wind_at`
/// closures play in `router_cli.rs`, generalized into a reusable type.
pub struct ConstantWeatherProvider {
    pub wind_speed_kt: f64,
    pub wind_from_deg: f64,
    pub wave_height_m: f64,
    pub precipitation_mm_h: f64,
    pub visibility_km: f64,
    pub temperature_c: f64,
}

impl ConstantWeatherProvider {
    pub fn new(wind_speed_kt: f64, wind_from_deg: f64) -> Self {
        Self {
            wind_speed_kt,
            wind_from_deg,
            wave_height_m: 0.5,
            precipitation_mm_h: 0.0,
            visibility_km: 20.0,
            temperature_c: 18.0,
        }
    }

    fn sample(&self) -> WaypointWeather {
        WaypointWeather {
            wind_speed_kt: self.wind_speed_kt,
            wind_sustained_kt: self.wind_speed_kt,
            wind_gust_kt: self.wind_speed_kt * 1.3,
            wind_direction_deg: self.wind_from_deg,
            wave_height_m: self.wave_height_m,
            precipitation_mm_h: self.precipitation_mm_h,
            visibility_km: self.visibility_km,
            temperature_c: self.temperature_c,
        }
    }
}

#[async_trait]
impl WeatherProvider for ConstantWeatherProvider {
    async fn fetch_batch(
        &self,
        _bbox: BoundingBox,
        points: &[(usize, Coordinate)],
        hours: &[(usize, DateTime<Utc>)],
        _departure_time: DateTime<Utc>,
    ) -> Result<Vec<WeatherSample>, RouterError> {
        let mut out = Vec::with_capacity(points.len() * hours.len());
        for &(point_idx, _) in points {
            for &(time_idx, _) in hours {
                out.push(WeatherSample { point_idx, time_idx, weather: self.sample() });
            }
        }
        Ok(out)
    }
}

/// A provider that always fails, used to exercise the `ProviderUnavailable`
/// path (spec §8 scenario 6).
pub struct FailingWeatherProvider;

#[async_trait]
impl WeatherProvider for FailingWeatherProvider {
    async fn fetch_batch(
        &self,
        _bbox: BoundingBox,
        _points: &[(usize, Coordinate)],
        _hours: &[(usize, DateTime<Utc>)],
        _departure_time: DateTime<Utc>,
    ) -> Result<Vec<WeatherSample>, RouterError> {
        Err(RouterError::ProviderUnavailable("synthetic failure".into()))
    }
}
