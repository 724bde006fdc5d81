//! `WeatherGrid`: immutable spatio-temporal wind/wave field (spec §4.3).
//!
//! The teacher's `WindField` (`engine::models`) is a nearest-neighbor lookup
//! over 1°×1° chunks with no temporal axis, built for an interactive map
//! overlay. This module keeps its "index by discretized coordinate, query by
//! nearest neighbor" shape for chunking but replaces the lookup itself with
//! the bilinear-spatial / linear-temporal interpolation spec §4.3 requires,
//! and adds the batched, concurrency-bounded provider fetch of spec §5.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{info, warn};
use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::config::{RequestDeadlines, WEATHER_GRID_PADDING_DEG, WEATHER_GRID_TARGET_SPACING_NM, WEATHER_PROVIDER_BATCH_SIZE};
use crate::error::RouterError;
use crate::model::{Coordinate, WaypointWeather};
use crate::weather::provider::WeatherProvider;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// Great-circle corridor between two points, padded by `padding_deg` on
    /// each side (spec §4.3).
    pub fn padded_corridor(a: Coordinate, b: Coordinate, padding_deg: f64) -> Self {
        let min_lat = a.lat.min(b.lat) - padding_deg;
        let max_lat = a.lat.max(b.lat) + padding_deg;
        let min_lng = a.lng.min(b.lng) - padding_deg;
        let max_lng = a.lng.max(b.lng) + padding_deg;
        Self {
            min_lat: min_lat.max(-90.0),
            max_lat: max_lat.min(90.0),
            min_lng: min_lng.max(-180.0),
            max_lng: max_lng.min(180.0),
        }
    }

    fn mid_lat(&self) -> f64 {
        (self.min_lat + self.max_lat) / 2.0
    }
}

#[derive(Debug, Clone)]
pub struct WeatherGrid {
    pub bounds: BoundingBox,
    pub grid_points: Vec<Coordinate>,
    pub lat_count: usize,
    pub lng_count: usize,
    pub times: Vec<DateTime<Utc>>,
    samples: HashMap<(usize, usize), WaypointWeather>,
}

impl WeatherGrid {
    /// Builds the grid per spec §4.3: pads the corridor, lays out a
    /// lat/lng grid spaced by `WEATHER_GRID_TARGET_SPACING_NM`, sizes the
    /// hourly forecast horizon, and fetches every (point, hour) from the
    /// provider in batches of at most `WEATHER_PROVIDER_BATCH_SIZE`, with a
    /// bounded number of batches in flight at once. Any provider error is
    /// fatal — no partial grid is ever returned.
    pub async fn build(
        start: Coordinate,
        end: Coordinate,
        departure_time: DateTime<Utc>,
        estimated_duration_h: f64,
        provider: Arc<dyn WeatherProvider>,
        deadlines: &RequestDeadlines,
    ) -> Result<Self, RouterError> {
        let bounds = BoundingBox::padded_corridor(start, end, WEATHER_GRID_PADDING_DEG);

        let lat_step_deg = WEATHER_GRID_TARGET_SPACING_NM / 60.0;
        let mid_lat_rad = bounds.mid_lat().to_radians();
        let cos_lat = mid_lat_rad.cos().max(0.05);
        let lng_step_deg = WEATHER_GRID_TARGET_SPACING_NM / (60.0 * cos_lat);

        let lat_count = (((bounds.max_lat - bounds.min_lat) / lat_step_deg).ceil() as usize + 1).max(2);
        let lng_count = (((bounds.max_lng - bounds.min_lng) / lng_step_deg).ceil() as usize + 1).max(2);

        let mut grid_points = Vec::with_capacity(lat_count * lng_count);
        for lat_i in 0..lat_count {
            let lat = bounds.min_lat + lat_i as f64 * lat_step_deg;
            for lng_i in 0..lng_count {
                let lng = bounds.min_lng + lng_i as f64 * lng_step_deg;
                grid_points.push(Coordinate::new(lat.min(bounds.max_lat), lng.min(bounds.max_lng)));
            }
        }

        let horizon_hours = (estimated_duration_h * 1.5).ceil().max(1.0) as i64;
        let times: Vec<DateTime<Utc>> = (0..=horizon_hours).map(|h| departure_time + chrono::Duration::hours(h)).collect();

        info!(
            "building weather grid: {} points ({}x{}), {} hourly slices",
            grid_points.len(),
            lat_count,
            lng_count,
            times.len()
        );

        let samples = fetch_all(&grid_points, &times, bounds, departure_time, provider, deadlines).await?;

        Ok(Self { bounds, grid_points, lat_count, lng_count, times, samples })
    }

    fn index(&self, lat_i: usize, lng_i: usize) -> usize {
        lat_i * self.lng_count + lng_i
    }

    fn lat_step(&self) -> f64 {
        if self.lat_count <= 1 {
            0.0
        } else {
            (self.bounds.max_lat - self.bounds.min_lat) / (self.lat_count - 1) as f64
        }
    }

    fn lng_step(&self) -> f64 {
        if self.lng_count <= 1 {
            0.0
        } else {
            (self.bounds.max_lng - self.bounds.min_lng) / (self.lng_count - 1) as f64
        }
    }

    fn sample_at(&self, point_idx: usize, time_idx: usize) -> WaypointWeather {
        *self.samples.get(&(point_idx, time_idx)).unwrap_or(&WaypointWeather {
            wind_speed_kt: 0.0,
            wind_sustained_kt: 0.0,
            wind_gust_kt: 0.0,
            wind_direction_deg: 0.0,
            wave_height_m: 0.0,
            precipitation_mm_h: 0.0,
            visibility_km: 20.0,
            temperature_c: 15.0,
        })
    }

    /// Bilinear spatial + linear temporal interpolation at an arbitrary
    /// (position, time). Queries outside the bbox clamp to the edge;
    /// queries outside the time range clamp to the nearest endpoint.
    /// Wind direction is interpolated circularly throughout (spec §4.3, §9).
    pub fn at(&self, position: Coordinate, t: DateTime<Utc>) -> WaypointWeather {
        let spatial_at_time = |time_idx: usize| self.spatial_interp(position, time_idx);

        if self.times.is_empty() {
            return spatial_at_time(0);
        }

        let first = self.times[0];
        let last = *self.times.last().unwrap();
        if t <= first {
            return spatial_at_time(0);
        }
        if t >= last {
            return spatial_at_time(self.times.len() - 1);
        }

        let total_span = (last - first).num_milliseconds().max(1) as f64;
        let elapsed = (t - first).num_milliseconds() as f64;
        let raw_idx = elapsed / total_span * (self.times.len() - 1) as f64;
        let idx0 = raw_idx.floor() as usize;
        let idx1 = (idx0 + 1).min(self.times.len() - 1);
        let frac = if idx0 == idx1 { 0.0 } else { raw_idx - idx0 as f64 };

        let w0 = spatial_at_time(idx0);
        let w1 = spatial_at_time(idx1);
        weighted_blend(&[(w0, 1.0 - frac), (w1, frac)])
    }

    fn spatial_interp(&self, position: Coordinate, time_idx: usize) -> WaypointWeather {
        let lat_step = self.lat_step();
        let lng_step = self.lng_step();

        let lat_clamped = position.lat.clamp(self.bounds.min_lat, self.bounds.max_lat);
        let lng_clamped = position.lng.clamp(self.bounds.min_lng, self.bounds.max_lng);

        let (lat_i0, lat_i1, lat_frac) = bracket_index(lat_clamped, self.bounds.min_lat, lat_step, self.lat_count);
        let (lng_i0, lng_i1, lng_frac) = bracket_index(lng_clamped, self.bounds.min_lng, lng_step, self.lng_count);

        let q00 = self.sample_at(self.index(lat_i0, lng_i0), time_idx);
        let q01 = self.sample_at(self.index(lat_i0, lng_i1), time_idx);
        let q10 = self.sample_at(self.index(lat_i1, lng_i0), time_idx);
        let q11 = self.sample_at(self.index(lat_i1, lng_i1), time_idx);

        weighted_blend(&[
            (q00, (1.0 - lat_frac) * (1.0 - lng_frac)),
            (q01, (1.0 - lat_frac) * lng_frac),
            (q10, lat_frac * (1.0 - lng_frac)),
            (q11, lat_frac * lng_frac),
        ])
    }

    /// Returns the weather registered at a grid node, for testing invariant
    /// 7 of spec §8 (values round-trip exactly at registered nodes).
    pub fn at_node(&self, lat_i: usize, lng_i: usize, time_idx: usize) -> WaypointWeather {
        self.sample_at(self.index(lat_i, lng_i), time_idx)
    }

    /// The full hourly series for every grid point, in the same order as
    /// `grid_points`, for the `gridPointsWithWeather` shape of spec §6.
    pub fn hourly_weather_per_point(&self) -> Vec<Vec<WaypointWeather>> {
        (0..self.grid_points.len())
            .map(|point_idx| (0..self.times.len()).map(|time_idx| self.sample_at(point_idx, time_idx)).collect())
            .collect()
    }
}

fn bracket_index(value: f64, origin: f64, step: f64, count: usize) -> (usize, usize, f64) {
    if step <= 0.0 || count <= 1 {
        return (0, 0, 0.0);
    }
    let raw = (value - origin) / step;
    let i0 = raw.floor().clamp(0.0, (count - 1) as f64) as usize;
    let i1 = (i0 + 1).min(count - 1);
    let frac = if i0 == i1 { 0.0 } else { (raw - i0 as f64).clamp(0.0, 1.0) };
    (i0, i1, frac)
}

/// Blends a set of (sample, weight) pairs. Scalars are weighted-averaged
/// directly; wind direction goes through unit-vector averaging so the
/// 0°/360° seam never produces a naive-linear-interpolation artifact
/// (spec §9).
fn weighted_blend(samples: &[(WaypointWeather, f64)]) -> WaypointWeather {
    let total: f64 = samples.iter().map(|(_, w)| w).sum();
    let norm = if total.abs() < 1e-12 { 1.0 } else { total };

    let mut wind_speed_kt = 0.0;
    let mut wind_sustained_kt = 0.0;
    let mut wind_gust_kt = 0.0;
    let mut wave_height_m = 0.0;
    let mut precipitation_mm_h = 0.0;
    let mut visibility_km = 0.0;
    let mut temperature_c = 0.0;
    let mut sin_sum = 0.0;
    let mut cos_sum = 0.0;

    for (s, w) in samples {
        let w = w / norm;
        wind_speed_kt += s.wind_speed_kt * w;
        wind_sustained_kt += s.wind_sustained_kt * w;
        wind_gust_kt += s.wind_gust_kt * w;
        wave_height_m += s.wave_height_m * w;
        precipitation_mm_h += s.precipitation_mm_h * w;
        visibility_km += s.visibility_km * w;
        temperature_c += s.temperature_c * w;
        let rad = s.wind_direction_deg.to_radians();
        sin_sum += rad.sin() * w;
        cos_sum += rad.cos() * w;
    }

    let wind_direction_deg = crate::geo::normalize_deg(sin_sum.atan2(cos_sum).to_degrees());

    WaypointWeather {
        wind_speed_kt,
        wind_sustained_kt,
        wind_gust_kt,
        wind_direction_deg,
        wave_height_m,
        precipitation_mm_h,
        visibility_km,
        temperature_c,
    }
}

async fn fetch_all(
    grid_points: &[Coordinate],
    times: &[DateTime<Utc>],
    bbox: BoundingBox,
    departure_time: DateTime<Utc>,
    provider: Arc<dyn WeatherProvider>,
    deadlines: &RequestDeadlines,
) -> Result<HashMap<(usize, usize), WaypointWeather>, RouterError> {
    let indexed_points: Vec<(usize, Coordinate)> = grid_points.iter().copied().enumerate().collect();
    let indexed_hours: Vec<(usize, DateTime<Utc>)> = times.iter().copied().enumerate().collect();

    let semaphore = Arc::new(Semaphore::new(deadlines.provider_max_in_flight));
    let mut handles = Vec::new();

    for chunk in indexed_points.chunks(WEATHER_PROVIDER_BATCH_SIZE) {
        let chunk = chunk.to_vec();
        let hours = indexed_hours.clone();
        let provider = Arc::clone(&provider);
        let semaphore = Arc::clone(&semaphore);
        let batch_timeout = deadlines.provider_batch_timeout;
        let max_retries = deadlines.provider_max_retries;

        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.map_err(|e| RouterError::Internal(e.to_string()))?;
            fetch_batch_with_retry(&*provider, bbox, &chunk, &hours, departure_time, batch_timeout, max_retries).await
        }));
    }

    let mut samples = HashMap::new();
    for handle in handles {
        let batch = handle.await.map_err(|e| RouterError::Internal(e.to_string()))??;
        for s in batch {
            samples.insert((s.point_idx, s.time_idx), s.weather);
        }
    }
    Ok(samples)
}

async fn fetch_batch_with_retry(
    provider: &dyn WeatherProvider,
    bbox: BoundingBox,
    points: &[(usize, Coordinate)],
    hours: &[(usize, DateTime<Utc>)],
    departure_time: DateTime<Utc>,
    batch_timeout: Duration,
    max_retries: u32,
) -> Result<Vec<crate::weather::provider::WeatherSample>, RouterError> {
    let mut attempt = 0;
    loop {
        let result = timeout(batch_timeout, provider.fetch_batch(bbox, points, hours, departure_time)).await;
        match result {
            Ok(Ok(samples)) => return Ok(samples),
            Ok(Err(err)) if attempt < max_retries => {
                warn!("weather provider batch failed (attempt {attempt}): {err}, retrying");
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(100 * 2u64.pow(attempt))).await;
            }
            Ok(Err(err)) => return Err(err),
            Err(_) if attempt < max_retries => {
                warn!("weather provider batch timed out (attempt {attempt}), retrying");
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(100 * 2u64.pow(attempt))).await;
            }
            Err(_) => return Err(RouterError::ProviderTimeout(batch_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::provider::ConstantWeatherProvider;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-06-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[tokio::test]
    async fn grid_returns_registered_values_at_nodes() {
        let provider: Arc<dyn WeatherProvider> = Arc::new(ConstantWeatherProvider::new(12.0, 225.0));
        let grid = WeatherGrid::build(
            Coordinate::new(50.89, -1.39),
            Coordinate::new(49.63, -1.62),
            now(),
            13.0,
            provider,
            &RequestDeadlines::default(),
        )
        .await
        .unwrap();

        let node = grid.at_node(0, 0, 0);
        assert!((node.wind_speed_kt - 12.0).abs() < 1e-9);
        assert!((node.wind_direction_deg - 225.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn grid_clamps_outside_bbox_and_time_range() {
        let provider: Arc<dyn WeatherProvider> = Arc::new(ConstantWeatherProvider::new(15.0, 90.0));
        let grid = WeatherGrid::build(
            Coordinate::new(50.0, -2.0),
            Coordinate::new(50.0, 0.0),
            now(),
            5.0,
            provider,
            &RequestDeadlines::default(),
        )
        .await
        .unwrap();

        let far_past = now() - chrono::Duration::hours(100);
        let far_future = now() + chrono::Duration::hours(1000);
        let w1 = grid.at(Coordinate::new(50.0, -1.0), far_past);
        let w2 = grid.at(Coordinate::new(50.0, -1.0), far_future);
        assert!((w1.wind_speed_kt - 15.0).abs() < 1e-6);
        assert!((w2.wind_speed_kt - 15.0).abs() < 1e-6);

        let outside = grid.at(Coordinate::new(80.0, 80.0), now());
        assert!((outside.wind_speed_kt - 15.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn provider_error_is_fatal() {
        use crate::weather::provider::FailingWeatherProvider;
        let provider: Arc<dyn WeatherProvider> = Arc::new(FailingWeatherProvider);
        let result = WeatherGrid::build(
            Coordinate::new(50.0, -2.0),
            Coordinate::new(50.0, 0.0),
            now(),
            5.0,
            provider,
            &RequestDeadlines { provider_max_retries: 0, ..Default::default() },
        )
        .await;
        assert!(matches!(result, Err(RouterError::ProviderUnavailable(_))));
    }

    #[test]
    fn circular_blend_avoids_seam_artifact() {
        let a = WaypointWeather {
            wind_speed_kt: 10.0,
            wind_sustained_kt: 10.0,
            wind_gust_kt: 12.0,
            wind_direction_deg: 350.0,
            wave_height_m: 1.0,
            precipitation_mm_h: 0.0,
            visibility_km: 10.0,
            temperature_c: 10.0,
        };
        let b = WaypointWeather { wind_direction_deg: 10.0, ..a };
        let blended = weighted_blend(&[(a, 0.5), (b, 0.5)]);
        // naive linear averaging would give 180; circular averaging gives ~0
        assert!(blended.wind_direction_deg < 5.0 || blended.wind_direction_deg > 355.0);
    }
}
