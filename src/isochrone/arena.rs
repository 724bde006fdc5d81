//! Arena + integer-index representation of the isochrone forest (spec §9
//! design notes): one dense `Vec<IsochronePoint>` per wave, parents
//! addressed by `(wave, slot)` instead of a shared pointer/`Rc`. Dropping
//! the arena at the end of a search drops every point in it, which is the
//! whole point (cancellation is then just "stop pushing waves").

use crate::model::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointRef {
    pub wave: usize,
    pub slot: usize,
}

#[derive(Debug, Clone)]
pub struct IsochronePoint {
    pub position: Coordinate,
    pub time_from_start_h: f64,
    pub cost: f64,
    pub parent: Option<PointRef>,
    pub heading_taken: Option<f64>,
}

#[derive(Debug, Default)]
pub struct IsochroneArena {
    waves: Vec<Vec<IsochronePoint>>,
}

impl IsochroneArena {
    pub fn new() -> Self {
        Self { waves: Vec::new() }
    }

    pub fn push_wave(&mut self, wave: Vec<IsochronePoint>) -> usize {
        self.waves.push(wave);
        self.waves.len() - 1
    }

    pub fn get(&self, r: PointRef) -> &IsochronePoint {
        &self.waves[r.wave][r.slot]
    }

    pub fn wave(&self, idx: usize) -> &[IsochronePoint] {
        &self.waves[idx]
    }

    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }

    /// Walks parent pointers from `r` back to the root, then reverses so
    /// the chain reads origin-first (spec §4.4.7 reconstruction).
    pub fn reconstruct(&self, r: PointRef) -> Vec<IsochronePoint> {
        let mut chain = Vec::new();
        let mut cursor = Some(r);
        while let Some(rf) = cursor {
            let point = self.get(rf);
            chain.push(point.clone());
            cursor = point.parent;
        }
        chain.reverse();
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconstruct_walks_back_to_root_in_order() {
        let mut arena = IsochroneArena::new();
        let origin = Coordinate::new(0.0, 0.0);
        let w0 = arena.push_wave(vec![IsochronePoint {
            position: origin,
            time_from_start_h: 0.0,
            cost: 0.0,
            parent: None,
            heading_taken: None,
        }]);
        let w1 = arena.push_wave(vec![IsochronePoint {
            position: Coordinate::new(1.0, 0.0),
            time_from_start_h: 1.0,
            cost: 1.0,
            parent: Some(PointRef { wave: w0, slot: 0 }),
            heading_taken: Some(0.0),
        }]);
        let chain = arena.reconstruct(PointRef { wave: w1, slot: 0 });
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].position, origin);
        assert_eq!(chain[1].time_from_start_h, 1.0);
    }
}
