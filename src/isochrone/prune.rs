//! Wave pruning (spec §4.4.6): bucket-min, dominance sweep, then a per-wave
//! cap. Order-independent by construction — the bucket-min step is a
//! commutative minimum, so callers may feed it candidates gathered from an
//! unordered parallel expansion (spec §5).

use std::collections::HashMap;

use crate::config::SearchConfig;
use crate::isochrone::arena::{IsochronePoint, PointRef};
use crate::model::Coordinate;

#[derive(Debug, Clone)]
pub struct Candidate {
    pub position: Coordinate,
    pub time_from_start_h: f64,
    pub cost: f64,
    pub parent: PointRef,
    pub heading_taken: f64,
    pub dist_to_goal_nm: f64,
}

impl Candidate {
    pub fn into_point(self) -> IsochronePoint {
        IsochronePoint {
            position: self.position,
            time_from_start_h: self.time_from_start_h,
            cost: self.cost,
            parent: Some(self.parent),
            heading_taken: Some(self.heading_taken),
        }
    }
}

fn bucket_key(c: &Candidate, cell_deg: f64, bucket_h: f64) -> (i64, i64, i64) {
    (
        (c.position.lat / cell_deg).floor() as i64,
        (c.position.lng / cell_deg).floor() as i64,
        (c.time_from_start_h / bucket_h).floor() as i64,
    )
}

/// Applies the full §4.4.6 pruning pipeline and returns the surviving
/// candidates, which become the next frontier.
pub fn prune_wave(candidates: Vec<Candidate>, config: &SearchConfig) -> Vec<Candidate> {
    let bucketed = bucket_min(candidates, config.prune_cell_deg, config.time_bucket_h);
    let surviving = dominance_sweep(bucketed);
    cap_wave(surviving, config.max_points_per_wave)
}

/// Step 1–2: bucket by `(cell_lat, cell_lng, time_bucket)`, keep only the
/// minimum-cost candidate per bucket (ties broken by lowest distance to
/// goal).
fn bucket_min(candidates: Vec<Candidate>, cell_deg: f64, bucket_h: f64) -> Vec<Candidate> {
    let mut buckets: HashMap<(i64, i64, i64), Candidate> = HashMap::new();
    for c in candidates {
        let key = bucket_key(&c, cell_deg, bucket_h);
        buckets
            .entry(key)
            .and_modify(|existing| {
                if c.cost < existing.cost || (c.cost == existing.cost && c.dist_to_goal_nm < existing.dist_to_goal_nm) {
                    *existing = c.clone();
                }
            })
            .or_insert(c);
    }
    buckets.into_values().collect()
}

/// Step 3: drop any candidate dominated by another with both smaller
/// distance-to-goal and not-greater cost.
fn dominance_sweep(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let n = candidates.len();
    let mut dominated = vec![false; n];
    for i in 0..n {
        if dominated[i] {
            continue;
        }
        for j in 0..n {
            if i == j || dominated[i] {
                continue;
            }
            let a = &candidates[i];
            let b = &candidates[j];
            if b.dist_to_goal_nm < a.dist_to_goal_nm && b.cost <= a.cost {
                dominated[i] = true;
                break;
            }
        }
    }
    candidates.into_iter().zip(dominated).filter(|(_, d)| !d).map(|(c, _)| c).collect()
}

/// Step 4: enforce the per-wave cap by keeping the top-N by
/// `(-distance_to_goal, -cost)`, i.e. closest-to-goal and cheapest first.
fn cap_wave(mut candidates: Vec<Candidate>, cap: usize) -> Vec<Candidate> {
    if candidates.len() <= cap {
        return candidates;
    }
    candidates.sort_by(|a, b| {
        a.dist_to_goal_nm
            .partial_cmp(&b.dist_to_goal_nm)
            .unwrap()
            .then(a.cost.partial_cmp(&b.cost).unwrap())
    });
    candidates.truncate(cap);
    candidates
}
