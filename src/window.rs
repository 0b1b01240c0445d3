//! Turns a raw retrieved history into the fixed-size chronological window
//! the classifier expects.

use crate::types::{TrajectoryPoint, WINDOW_SIZE};

/// A window of exactly `WINDOW_SIZE` points, ascending by timestamp.
///
/// Only [`assemble`] constructs these, so holding one means the length and
/// ordering invariants hold. Windows are transient: built per prediction
/// call, never persisted.
#[derive(Debug, Clone)]
pub struct Window {
    points: Vec<TrajectoryPoint>,
}

impl Window {
    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    /// Project the window to `(lat, lon)` pairs for the classifier.
    /// Timestamps are dropped at this boundary.
    pub fn features(&self) -> Vec<(f32, f32)> {
        self.points
            .iter()
            .map(|p| (p.lat as f32, p.lon as f32))
            .collect()
    }
}

/// Assemble a raw history (newest insertion first, possibly unordered by
/// timestamp) into a chronological window.
///
/// Returns `None` while the history holds fewer than `WINDOW_SIZE` points;
/// that is the normal state for a fresh object, not an error. Otherwise the first
/// `WINDOW_SIZE` entries are stable-sorted ascending by timestamp: points
/// with equal timestamps keep their relative order from the input sequence,
/// so replaying the same history always yields the same window.
pub fn assemble(mut raw: Vec<TrajectoryPoint>) -> Option<Window> {
    if raw.len() < WINDOW_SIZE {
        return None;
    }
    raw.truncate(WINDOW_SIZE);
    raw.sort_by_key(|p| p.timestamp);
    Some(Window { points: raw })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, timestamp: i64) -> TrajectoryPoint {
        TrajectoryPoint {
            lat,
            lon: 0.0,
            timestamp,
        }
    }

    #[test]
    fn short_history_is_incomplete() {
        let raw: Vec<_> = (0..WINDOW_SIZE as i64 - 1).map(|t| pt(0.0, t)).collect();
        assert!(assemble(raw).is_none());
    }

    #[test]
    fn empty_history_is_incomplete() {
        assert!(assemble(Vec::new()).is_none());
    }

    #[test]
    fn full_history_sorts_ascending_by_timestamp() {
        // Newest-first arrival, as the store hands it over.
        let raw: Vec<_> = (1..=WINDOW_SIZE as i64).rev().map(|t| pt(0.0, t)).collect();
        let window = assemble(raw).expect("full history");
        let timestamps: Vec<_> = window.points().iter().map(|p| p.timestamp).collect();
        let expected: Vec<_> = (1..=WINDOW_SIZE as i64).collect();
        assert_eq!(timestamps, expected);
    }

    #[test]
    fn scrambled_history_still_sorts() {
        let mut raw: Vec<_> = (1..=WINDOW_SIZE as i64).map(|t| pt(t as f64, t)).collect();
        raw.swap(0, 13);
        raw.swap(4, 19);
        raw.swap(7, 2);
        let window = assemble(raw).expect("full history");
        for pair in window.points().windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn equal_timestamps_keep_input_order() {
        // Two ties inside an otherwise full window; the stable sort must not
        // reorder them relative to each other.
        let mut raw: Vec<_> = (1..=WINDOW_SIZE as i64 - 2).map(|t| pt(t as f64, t)).collect();
        raw.push(pt(100.0, 5));
        raw.push(pt(200.0, 5));
        let window = assemble(raw).expect("full history");
        let ties: Vec<_> = window
            .points()
            .iter()
            .filter(|p| p.lat >= 100.0)
            .map(|p| p.lat)
            .collect();
        assert_eq!(ties, vec![100.0, 200.0]);
    }

    #[test]
    fn features_drop_timestamps_and_narrow() {
        let raw: Vec<_> = (1..=WINDOW_SIZE as i64)
            .map(|t| TrajectoryPoint {
                lat: t as f64,
                lon: -(t as f64),
                timestamp: t,
            })
            .collect();
        let window = assemble(raw).expect("full history");
        let features = window.features();
        assert_eq!(features.len(), WINDOW_SIZE);
        assert_eq!(features[0], (1.0, -1.0));
        assert_eq!(features[19], (20.0, -20.0));
    }
}
